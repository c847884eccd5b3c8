//! Model backend abstraction.
//!
//! Contains the `Backend` trait, the `BoxBackend` type-erased wrapper, the
//! `BackendRegistry` used to look backends up by reference, and two
//! in-process backends for tests and smoke runs.

pub mod box_backend;
pub mod provider;
pub mod registry;
pub mod scripted;
pub mod test_model;

pub use box_backend::BoxBackend;
pub use provider::Backend;
pub use registry::BackendRegistry;
