//! Backend trait definition.
//!
//! A backend is an opaque model capability: it accepts a prompt, a memory
//! snapshot and a tool manifest, and then answers turn by turn with either
//! a final value or a request to call one of the tools.

use std::future::Future;

use alive_types::backend::{BackendError, ConversationId, ConversationRequest, Turn, ToolResult};

/// Trait for model backends.
///
/// Uses native async fn in traits (RPITIT). Wrap implementations in
/// [`BoxBackend`](super::box_backend::BoxBackend) to store them in a
/// [`BackendRegistry`](super::registry::BackendRegistry).
///
/// One backend instance may hold many concurrent conversations; each is
/// identified by the [`ConversationId`] returned from `start_conversation`.
pub trait Backend: Send + Sync {
    /// Provider name (e.g. "openai", "test").
    fn name(&self) -> &str;

    /// Open a conversation.
    fn start_conversation(
        &self,
        request: &ConversationRequest,
    ) -> impl Future<Output = Result<ConversationId, BackendError>> + Send;

    /// Produce the next turn of a conversation.
    fn next_turn(
        &self,
        conversation: ConversationId,
    ) -> impl Future<Output = Result<Turn, BackendError>> + Send;

    /// Feed the result of a requested tool call back into the conversation.
    fn submit_tool_result(
        &self,
        conversation: ConversationId,
        result: ToolResult,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Release any state held for a finished conversation.
    fn end_conversation(&self, conversation: ConversationId) -> impl Future<Output = ()> + Send {
        let _ = conversation;
        async {}
    }
}
