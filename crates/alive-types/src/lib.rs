//! Shared domain types for Alive.
//!
//! This crate contains the declaration types (memory fields, tags,
//! selectors, agent and tool bindings), the conversation types exchanged
//! with model backends, the engine configuration, and the error taxonomy.
//!
//! Zero infrastructure dependencies -- only serde, schemars, uuid, toml, thiserror.

pub mod agent;
pub mod backend;
pub mod config;
pub mod error;
pub mod memory;
pub mod schema;
pub mod selector;
pub mod tag;
