//! The agent engine.
//!
//! [`Engine::invoke`] runs an agent method of a host object:
//!
//! 1. Validate the method, its visibility selectors and its backend targets.
//!    Nothing is sent to any backend if this fails.
//! 2. Resolve the visibility context and compile the method's doc.
//! 3. Dispatch to every target concurrently, bridging tool calls back to
//!    the host.
//! 4. Coerce and aggregate the answers.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use serde::de::DeserializeOwned;
use tracing::{Instrument, debug, info_span};

use alive_observe::attrs;
use alive_types::agent::AgentBinding;
use alive_types::backend::ConversationRequest;
use alive_types::config::EngineConfig;
use alive_types::error::{ConfigurationError, TargetFailure};

use crate::aggregate::{AgentOutput, aggregate};
use crate::backend::BackendRegistry;
use crate::dispatch::Dispatcher;
use crate::host::Alive;
use crate::prompt::compile_doc;
use crate::registry::{MethodDecl, TypeRegistry};
use crate::scope::InvocationScope;
use crate::visibility::{self, VisibilityContext};

pub use crate::input::AgentInput;

/// Errors returned to the caller of an agent method.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// Declaration or selection problem; no backend was called.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// The only target of a single-target agent failed.
    #[error("{0}")]
    Target(TargetFailure),

    /// Targets of a multi-target agent failed and partial results are not
    /// tolerated.
    #[error("{} of {total} targets failed: {}", .failures.len(), render_failures(.failures))]
    Aggregate {
        failures: Vec<TargetFailure>,
        total: usize,
    },

    #[error("invocation cancelled")]
    Cancelled,
}

fn render_failures(failures: &[TargetFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Runs agent methods against registered backends.
///
/// Cheap to clone; clones share the backend registry and configuration.
#[derive(Debug, Clone)]
pub struct Engine {
    backends: Arc<BackendRegistry>,
    config: Arc<EngineConfig>,
}

impl Engine {
    pub fn new(backends: BackendRegistry) -> Self {
        Self::with_config(backends, EngineConfig::default())
    }

    pub fn with_config(backends: BackendRegistry, config: EngineConfig) -> Self {
        Self {
            backends: Arc::new(backends),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn backends(&self) -> &BackendRegistry {
        &self.backends
    }

    /// Resolve the visibility context `method` would run with right now.
    pub fn resolve<H: Alive>(
        &self,
        host: &H,
        method: &str,
    ) -> Result<VisibilityContext, ConfigurationError> {
        visibility::resolve(H::registry(), method, host.memory())
    }

    /// Invoke agent `method` on `host` under a fresh root scope.
    pub async fn invoke<H, T>(
        &self,
        host: &Arc<H>,
        method: &str,
        input: impl Into<AgentInput>,
    ) -> Result<AgentOutput<T>, AgentError>
    where
        H: Alive,
        T: DeserializeOwned + Send + 'static,
    {
        self.invoke_with_scope(host, method, input, InvocationScope::new())
            .await
    }

    /// Invoke agent `method` under `scope`.
    ///
    /// Cancelling `scope` stops every backend conversation of this call and
    /// of any agent it invokes as a tool.
    pub async fn invoke_with_scope<H, T>(
        &self,
        host: &Arc<H>,
        method: &str,
        input: impl Into<AgentInput>,
        scope: InvocationScope,
    ) -> Result<AgentOutput<T>, AgentError>
    where
        H: Alive,
        T: DeserializeOwned + Send + 'static,
    {
        self.run::<H, T>(host, method, input.into(), scope).await
    }

    /// Boxed so agents invoked as tools can re-enter the engine.
    pub(crate) fn run<'a, H, T>(
        &'a self,
        host: &'a Arc<H>,
        method: &'a str,
        input: AgentInput,
        scope: InvocationScope,
    ) -> BoxFuture<'a, Result<AgentOutput<T>, AgentError>>
    where
        H: Alive,
        T: DeserializeOwned + Send + 'static,
    {
        Box::pin(async move {
            let registry = H::registry();
            let (decl, binding) = self.validate(registry, method)?;
            let context = visibility::resolve(registry, method, host.memory())?;

            let doc = compile_doc(&decl.doc);
            let request = ConversationRequest {
                agent: method.to_string(),
                model: String::new(),
                instructions: doc.instructions,
                user_content: input.into_user_content(&self.config.default_user_prompt),
                context: context.fields.clone(),
                tools: context.tool_manifest(),
                output_schema: binding.returns.schema.clone(),
            };

            debug!(
                agent = method,
                fields = context.fields.len(),
                tools = context.tools.len(),
                "resolved visibility context"
            );

            let span = info_span!(
                "invoke_agent",
                gen_ai.operation.name = attrs::OP_INVOKE_AGENT,
                gen_ai.agent.name = method,
                alive.depth = scope.depth,
                alive.targets = binding.llm_targets.len(),
            );

            let dispatcher =
                Dispatcher::new(self, host, &context, request, &binding.returns, &scope);
            let results = dispatcher
                .run_all::<T>(&binding.llm_targets)
                .instrument(span)
                .await;

            if scope.is_cancelled() {
                return Err(AgentError::Cancelled);
            }
            aggregate(&binding.returns, results)
        })
    }

    /// Check that `method` is a runnable agent whose targets are all
    /// registered.
    fn validate<'r, H>(
        &self,
        registry: &'r TypeRegistry<H>,
        method: &str,
    ) -> Result<(&'r MethodDecl<H>, &'r AgentBinding), ConfigurationError> {
        let decl = registry
            .method(method)
            .ok_or_else(|| ConfigurationError::UnknownMethod {
                type_name: registry.type_name().to_string(),
                name: method.to_string(),
            })?;
        let binding = decl.agent().ok_or_else(|| ConfigurationError::NotAnAgent {
            type_name: registry.type_name().to_string(),
            method: method.to_string(),
        })?;
        if binding.llm_targets.is_empty() {
            return Err(ConfigurationError::NoTargets {
                method: method.to_string(),
            });
        }
        if let Some(missing) = binding
            .llm_targets
            .iter()
            .find(|target| !self.backends.contains(target))
        {
            return Err(ConfigurationError::UnknownBackend {
                method: method.to_string(),
                backend: missing.clone(),
            });
        }
        Ok((decl, binding))
    }
}
