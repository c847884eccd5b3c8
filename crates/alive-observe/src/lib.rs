//! Observability for Alive: tracing subscriber setup and the operation
//! values recorded on engine spans.

pub mod attrs;
pub mod tracing_setup;
