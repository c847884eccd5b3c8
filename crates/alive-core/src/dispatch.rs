//! Multi-backend dispatch.
//!
//! The [`Dispatcher`] runs one conversation per target backend, all
//! concurrently. Each conversation loops turn by turn: tool-call turns go
//! through the [`ToolBridge`] one at a time and their results are fed back
//! to the same conversation, until the backend gives a final answer or
//! fails. Results are returned in target declaration order regardless of
//! completion order.

use std::future::Future;
use std::sync::Arc;

use futures_util::future::join_all;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{Instrument, debug, info_span, warn};

use alive_observe::attrs;
use alive_types::agent::{BackendRef, ReturnSpec};
use alive_types::backend::{BackendError, ConversationId, ConversationRequest, Turn};
use alive_types::error::{TargetError, TargetFailure};

use crate::aggregate::coerce;
use crate::backend::BoxBackend;
use crate::engine::Engine;
use crate::host::Alive;
use crate::scope::InvocationScope;
use crate::tool::ToolBridge;
use crate::visibility::VisibilityContext;

/// Runs one agent invocation against its target backends.
pub struct Dispatcher<'a, H: Alive> {
    engine: &'a Engine,
    host: &'a Arc<H>,
    context: &'a VisibilityContext,
    request: ConversationRequest,
    returns: &'a ReturnSpec,
    scope: &'a InvocationScope,
}

impl<'a, H: Alive> Dispatcher<'a, H> {
    /// `request` is the conversation template; its `model` is filled in
    /// per target.
    pub fn new(
        engine: &'a Engine,
        host: &'a Arc<H>,
        context: &'a VisibilityContext,
        request: ConversationRequest,
        returns: &'a ReturnSpec,
        scope: &'a InvocationScope,
    ) -> Self {
        Self {
            engine,
            host,
            context,
            request,
            returns,
            scope,
        }
    }

    /// Run every target concurrently; results align with `targets`.
    pub async fn run_all<T>(&self, targets: &[BackendRef]) -> Vec<Result<T, TargetFailure>>
    where
        T: DeserializeOwned + Send,
    {
        join_all(targets.iter().map(|target| async move {
            self.run_target::<T>(target)
                .await
                .map_err(|error| {
                    warn!(backend = %target, error = %error, "backend target failed");
                    TargetFailure {
                        target: target.clone(),
                        error,
                    }
                })
        }))
        .await
    }

    /// Run one conversation to completion and coerce its answer.
    pub async fn run_target<T>(&self, target: &BackendRef) -> Result<T, TargetError>
    where
        T: DeserializeOwned + Send,
    {
        let backend = self.engine.backends().lookup(target).ok_or_else(|| {
            TargetError::Backend(BackendError::InvalidRequest(format!(
                "no backend registered for '{target}'"
            )))
        })?;

        let mut request = self.request.clone();
        request.model = target.model.clone();

        let span = info_span!(
            "conversation",
            gen_ai.operation.name = attrs::OP_CONVERSATION,
            gen_ai.system = backend.name(),
            gen_ai.request.model = %target.model,
            gen_ai.agent.name = %request.agent,
            alive.depth = self.scope.depth,
        );

        async {
            let conversation = self
                .cancellable(backend.start_conversation(&request))
                .await??;
            let outcome = self.converse(backend, conversation).await;
            backend.end_conversation(conversation).await;
            coerce::<T>(self.returns, outcome?).map_err(TargetError::from)
        }
        .instrument(span)
        .await
    }

    async fn converse(
        &self,
        backend: &BoxBackend,
        conversation: ConversationId,
    ) -> Result<Value, TargetError> {
        let bridge = ToolBridge::new(self.engine, self.host, self.context, self.scope);
        let max_rounds = self.engine.config().max_tool_rounds;
        let mut rounds = 0u32;

        loop {
            match self.cancellable(backend.next_turn(conversation)).await?? {
                Turn::FinalAnswer(raw) => {
                    debug!(rounds, "final answer received");
                    return Ok(raw);
                }
                Turn::ToolCall(call) => {
                    if rounds >= max_rounds {
                        return Err(TargetError::TurnLimitExceeded { max_rounds });
                    }
                    rounds += 1;
                    debug!(tool = %call.name, round = rounds, "tool call requested");
                    let result = self.cancellable(bridge.call(&call)).await?;
                    self.cancellable(backend.submit_tool_result(conversation, result))
                        .await??;
                }
            }
        }
    }

    /// Await `future` unless the invocation is cancelled first.
    async fn cancellable<F: Future>(&self, future: F) -> Result<F::Output, TargetError> {
        tokio::select! {
            biased;
            _ = self.scope.cancellation.cancelled() => Err(TargetError::Cancelled),
            output = future => Ok(output),
        }
    }
}
