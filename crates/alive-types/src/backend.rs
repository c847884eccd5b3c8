//! Conversation types exchanged with model backends.
//!
//! These types model the backend capability contract: a conversation is
//! started with a prompt, a memory snapshot and a tool manifest; each turn
//! the backend either produces a final answer or asks for a tool call, and
//! the engine feeds tool results back into the same conversation.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::agent::ToolBinding;

/// Handle to one backend conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(pub Uuid);

impl ConversationId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Everything a backend receives when a conversation starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationRequest {
    /// Name of the agent method being invoked.
    pub agent: String,
    /// Model identifier from the target's `BackendRef` (may be empty).
    pub model: String,
    /// Instruction prompt compiled from the method documentation.
    pub instructions: String,
    /// User content parts built from the invocation arguments.
    pub user_content: Vec<String>,
    /// Snapshot of the visible memory fields.
    pub context: BTreeMap<String, Value>,
    /// Tools the model may call, sorted by name.
    pub tools: Vec<ToolBinding>,
    /// JSON schema the final answer must satisfy.
    pub output_schema: Value,
}

/// A model-initiated request to call a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Backend-assigned call id, echoed back in the [`ToolResult`].
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

impl ToolCallRequest {
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            name: name.into(),
            arguments,
        }
    }
}

/// One backend turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Turn {
    /// The conversation is finished with this raw answer.
    FinalAnswer(Value),
    /// The backend wants a tool invoked before continuing.
    ToolCall(ToolCallRequest),
}

/// The outcome of a tool call, fed back to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub call_id: String,
    pub name: String,
    /// The tool's return value, or the error message when `is_error` is set.
    pub content: Value,
    #[serde(default)]
    pub is_error: bool,
}

impl ToolResult {
    pub fn ok(request: &ToolCallRequest, content: Value) -> Self {
        Self {
            call_id: request.id.clone(),
            name: request.name.clone(),
            content,
            is_error: false,
        }
    }

    pub fn error(request: &ToolCallRequest, message: impl Into<String>) -> Self {
        Self {
            call_id: request.id.clone(),
            name: request.name.clone(),
            content: Value::String(message.into()),
            is_error: true,
        }
    }
}

/// Errors reported by a backend. Fatal to the target that produced them.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BackendError {
    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("provider overloaded: {0}")]
    Overloaded(String),

    #[error("request timed out after {0}ms")]
    Timeout(u64),

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unknown conversation: {0}")]
    UnknownConversation(ConversationId),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_turn_serde_shape() {
        let turn = Turn::ToolCall(ToolCallRequest {
            id: "c1".to_string(),
            name: "bump".to_string(),
            arguments: json!({"by": 2}),
        });
        let value = serde_json::to_value(&turn).unwrap();
        assert_eq!(value["type"], "tool_call");
        assert_eq!(value["value"]["name"], "bump");

        let final_answer: Turn =
            serde_json::from_value(json!({"type": "final_answer", "value": 7})).unwrap();
        assert_eq!(final_answer, Turn::FinalAnswer(json!(7)));
    }

    #[test]
    fn test_tool_result_echoes_call() {
        let request = ToolCallRequest::new("bump", json!({}));
        let ok = ToolResult::ok(&request, json!(1));
        assert_eq!(ok.call_id, request.id);
        assert!(!ok.is_error);

        let err = ToolResult::error(&request, "boom");
        assert!(err.is_error);
        assert_eq!(err.content, json!("boom"));
    }

    #[test]
    fn test_backend_error_display() {
        let err = BackendError::Timeout(1500);
        assert_eq!(err.to_string(), "request timed out after 1500ms");
        let err = BackendError::Provider {
            message: "down".to_string(),
        };
        assert_eq!(err.to_string(), "provider error: down");
    }
}
