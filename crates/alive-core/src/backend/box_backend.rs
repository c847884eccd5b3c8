//! BoxBackend -- object-safe dynamic dispatch wrapper for Backend.
//!
//! 1. `BackendDyn` is an object-safe mirror of `Backend` with boxed futures
//! 2. Blanket-impl `BackendDyn` for all `T: Backend`
//! 3. `BoxBackend` wraps `Box<dyn BackendDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use alive_types::backend::{BackendError, ConversationId, ConversationRequest, Turn, ToolResult};

use super::provider::Backend;

type BoxedFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Object-safe version of [`Backend`] with boxed futures.
pub trait BackendDyn: Send + Sync {
    fn name(&self) -> &str;

    fn start_conversation_boxed<'a>(
        &'a self,
        request: &'a ConversationRequest,
    ) -> BoxedFuture<'a, Result<ConversationId, BackendError>>;

    fn next_turn_boxed(
        &self,
        conversation: ConversationId,
    ) -> BoxedFuture<'_, Result<Turn, BackendError>>;

    fn submit_tool_result_boxed(
        &self,
        conversation: ConversationId,
        result: ToolResult,
    ) -> BoxedFuture<'_, Result<(), BackendError>>;

    fn end_conversation_boxed(&self, conversation: ConversationId) -> BoxedFuture<'_, ()>;
}

impl<T: Backend> BackendDyn for T {
    fn name(&self) -> &str {
        Backend::name(self)
    }

    fn start_conversation_boxed<'a>(
        &'a self,
        request: &'a ConversationRequest,
    ) -> BoxedFuture<'a, Result<ConversationId, BackendError>> {
        Box::pin(self.start_conversation(request))
    }

    fn next_turn_boxed(
        &self,
        conversation: ConversationId,
    ) -> BoxedFuture<'_, Result<Turn, BackendError>> {
        Box::pin(self.next_turn(conversation))
    }

    fn submit_tool_result_boxed(
        &self,
        conversation: ConversationId,
        result: ToolResult,
    ) -> BoxedFuture<'_, Result<(), BackendError>> {
        Box::pin(self.submit_tool_result(conversation, result))
    }

    fn end_conversation_boxed(&self, conversation: ConversationId) -> BoxedFuture<'_, ()> {
        Box::pin(self.end_conversation(conversation))
    }
}

/// Type-erased backend for runtime selection.
///
/// Since `Backend` uses RPITIT it cannot be a trait object directly;
/// `BoxBackend` exposes the same methods over a `BackendDyn` object.
pub struct BoxBackend {
    inner: Box<dyn BackendDyn>,
}

impl BoxBackend {
    pub fn new<T: Backend + 'static>(backend: T) -> Self {
        Self {
            inner: Box::new(backend),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub async fn start_conversation(
        &self,
        request: &ConversationRequest,
    ) -> Result<ConversationId, BackendError> {
        self.inner.start_conversation_boxed(request).await
    }

    pub async fn next_turn(&self, conversation: ConversationId) -> Result<Turn, BackendError> {
        self.inner.next_turn_boxed(conversation).await
    }

    pub async fn submit_tool_result(
        &self,
        conversation: ConversationId,
        result: ToolResult,
    ) -> Result<(), BackendError> {
        self.inner.submit_tool_result_boxed(conversation, result).await
    }

    pub async fn end_conversation(&self, conversation: ConversationId) {
        self.inner.end_conversation_boxed(conversation).await
    }
}

impl std::fmt::Debug for BoxBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxBackend")
            .field("name", &self.name())
            .finish()
    }
}
