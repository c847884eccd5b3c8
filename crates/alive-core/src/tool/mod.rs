//! Tools: sibling methods exposed to a model during an agent conversation.

pub mod bridge;
pub mod builtin;
pub mod schema;

pub use bridge::ToolBridge;
pub use schema::{ToolArgs, bind_arguments, parameter_schema};
