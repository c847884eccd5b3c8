//! Operation values recorded on Alive spans.
//!
//! Span field names follow the OpenTelemetry GenAI semantic conventions
//! (`gen_ai.operation.name`, `gen_ai.agent.name`, `gen_ai.tool.name`) and
//! are written inline at each span, since `tracing` macros take literal
//! field names. Only the values live here.

/// One agent invocation, spanning all its backend targets.
pub const OP_INVOKE_AGENT: &str = "invoke_agent";

/// One backend conversation.
pub const OP_CONVERSATION: &str = "conversation";

/// One tool call made by a model.
pub const OP_EXECUTE_TOOL: &str = "execute_tool";
