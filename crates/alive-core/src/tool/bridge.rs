//! Tool bridge: executes model-requested tool calls on the host.
//!
//! Every call is checked against the invocation's visibility context,
//! its arguments are bound to the method's declared parameters, and the
//! method runs on the same host instance that owns the invocation. Any
//! failure is turned into an error [`ToolResult`] for the backend instead
//! of aborting the conversation.
//!
//! Agent methods exposed as tools re-enter the [`Engine`] with a child
//! scope, so the nested call resolves its own visibility context and is
//! cancelled with its parent.

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{Instrument, info_span, warn};

use alive_observe::attrs;
use alive_types::backend::{ToolCallRequest, ToolResult};
use alive_types::error::ToolExecutionError;

use crate::aggregate::AgentOutput;
use crate::engine::Engine;
use crate::host::Alive;
use crate::input::AgentInput;
use crate::registry::MethodKind;
use crate::scope::InvocationScope;
use crate::visibility::VisibilityContext;

use super::schema::{ToolArgs, bind_arguments};

/// Executes tool calls for one backend conversation.
pub struct ToolBridge<'a, H: Alive> {
    engine: &'a Engine,
    host: &'a Arc<H>,
    context: &'a VisibilityContext,
    scope: &'a InvocationScope,
}

impl<'a, H: Alive> ToolBridge<'a, H> {
    pub fn new(
        engine: &'a Engine,
        host: &'a Arc<H>,
        context: &'a VisibilityContext,
        scope: &'a InvocationScope,
    ) -> Self {
        Self {
            engine,
            host,
            context,
            scope,
        }
    }

    /// Execute `request` and package the outcome for the backend.
    pub async fn call(&self, request: &ToolCallRequest) -> ToolResult {
        let span = info_span!(
            "execute_tool",
            gen_ai.operation.name = attrs::OP_EXECUTE_TOOL,
            gen_ai.tool.name = %request.name,
            gen_ai.tool.call.id = %request.id,
            alive.depth = self.scope.depth,
        );
        match self.execute(request).instrument(span).await {
            Ok(value) => ToolResult::ok(request, value),
            Err(e) => {
                warn!(tool = %request.name, error = %e, "tool call failed");
                ToolResult::error(request, e.to_string())
            }
        }
    }

    /// Execute `request`, returning the method's value.
    pub async fn execute(&self, request: &ToolCallRequest) -> Result<Value, ToolExecutionError> {
        let not_visible = || ToolExecutionError::NotVisible(request.name.clone());
        if !self.context.can_call(&request.name) {
            return Err(not_visible());
        }
        let decl = H::registry().method(&request.name).ok_or_else(not_visible)?;
        let args = bind_arguments(&decl.name, &decl.params, &request.arguments)?;

        match &decl.kind {
            MethodKind::Tool(handler) => handler(Arc::clone(self.host), args)
                .await
                .map_err(|e| ToolExecutionError::Failed {
                    tool: decl.name.clone(),
                    message: format!("{e:#}"),
                }),
            MethodKind::Builtin(builtin) => {
                let limits = self.engine.config().preview_limits();
                builtin.run(self.host.as_ref(), self.context, &args, limits)
            }
            MethodKind::Agent(_) => self.call_agent(&decl.name, args).await,
        }
    }

    async fn call_agent(&self, name: &str, args: ToolArgs) -> Result<Value, ToolExecutionError> {
        let max_depth = self.engine.config().max_nesting_depth;
        if self.scope.depth >= max_depth {
            return Err(ToolExecutionError::DepthLimit {
                tool: name.to_string(),
                max_depth,
            });
        }

        let input = AgentInput::from_args(args.as_map());
        let output = self
            .engine
            .run::<H, Value>(self.host, name, input, self.scope.child())
            .await
            .map_err(|e| ToolExecutionError::Failed {
                tool: name.to_string(),
                message: e.to_string(),
            })?;

        Ok(match output {
            AgentOutput::One(value) => value,
            AgentOutput::Many(results) => Value::Array(
                results
                    .into_iter()
                    .map(|result| result.unwrap_or_else(|f| json!({ "error": f.to_string() })))
                    .collect(),
            ),
        })
    }
}
