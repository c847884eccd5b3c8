//! Agent engine for Alive.
//!
//! Host types declare typed memory fields and methods in a per-type
//! [`TypeRegistry`](registry::TypeRegistry); some methods are agents. The
//! [`Engine`](engine::Engine) runs an agent by resolving what it may see,
//! compiling its doc into a prompt, dispatching to one or more model
//! backends, bridging their tool calls back to the host, and coercing the
//! answers to the declared return type.
//!
//! ```no_run
//! use alive_core::backend::BackendRegistry;
//! use alive_core::backend::BoxBackend;
//! use alive_core::backend::test_model::TestBackend;
//! use alive_core::engine::Engine;
//! use alive_observe::tracing_setup::{TracingOptions, init_tracing};
//!
//! init_tracing(&TracingOptions::default())?;
//! let engine = Engine::new(BackendRegistry::new().with("test", BoxBackend::new(TestBackend::new())));
//! assert_eq!(engine.backends().list_names(), ["test"]);
//! # Ok::<(), Box<dyn std::error::Error + Send + Sync>>(())
//! ```

pub mod aggregate;
pub mod backend;
pub mod dispatch;
pub mod engine;
pub mod host;
pub mod input;
pub mod prompt;
pub mod registry;
pub mod scope;
pub mod tool;
pub mod visibility;

#[cfg(test)]
pub(crate) mod testing;
