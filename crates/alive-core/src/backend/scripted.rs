//! Scripted spy backend.
//!
//! Plays the same list of [`ScriptStep`]s in every conversation it is
//! given and records what it saw: the requests that opened each
//! conversation and every tool result fed back. Used to drive the engine
//! deterministically and to assert on what reached the backend.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use serde_json::Value;

use alive_types::backend::{
    BackendError, ConversationId, ConversationRequest, ToolCallRequest, ToolResult, Turn,
};

use super::provider::Backend;

/// One turn of a script.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptStep {
    /// Finish with this raw answer.
    Answer(Value),
    /// Ask for a tool call.
    CallTool { name: String, arguments: Value },
    /// Fail the turn.
    Fail(BackendError),
    /// Finish with the content of the last tool result (`null` if none).
    EchoLastToolResult,
}

impl ScriptStep {
    pub fn call(name: impl Into<String>, arguments: Value) -> Self {
        ScriptStep::CallTool {
            name: name.into(),
            arguments,
        }
    }
}

#[derive(Debug)]
struct ConversationState {
    seq: usize,
    request: ConversationRequest,
    cursor: usize,
    tool_results: Vec<ToolResult>,
    ended: bool,
}

#[derive(Debug)]
struct Inner {
    name: String,
    script: Vec<ScriptStep>,
    /// Per-turn delay in milliseconds; 0 means none.
    latency_ms: AtomicU64,
    started: AtomicUsize,
    conversations: DashMap<ConversationId, ConversationState>,
}

/// A backend that replays a fixed script and records every call.
///
/// Clones share state, so a test can keep one handle for assertions while
/// the engine owns another.
#[derive(Debug, Clone)]
pub struct ScriptedBackend {
    inner: Arc<Inner>,
}

impl ScriptedBackend {
    pub fn new(name: impl Into<String>, script: impl IntoIterator<Item = ScriptStep>) -> Self {
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                script: script.into_iter().collect(),
                latency_ms: AtomicU64::new(0),
                started: AtomicUsize::new(0),
                conversations: DashMap::new(),
            }),
        }
    }

    /// A backend that answers `value` immediately.
    pub fn answering(name: impl Into<String>, value: Value) -> Self {
        Self::new(name, [ScriptStep::Answer(value)])
    }

    /// A backend whose first turn fails with `error`.
    pub fn failing(name: impl Into<String>, error: BackendError) -> Self {
        Self::new(name, [ScriptStep::Fail(error)])
    }

    /// Wait `latency` before producing each turn.
    ///
    /// Shared with every clone of this backend.
    pub fn with_latency(self, latency: Duration) -> Self {
        let millis = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        self.inner.latency_ms.store(millis, Ordering::SeqCst);
        self
    }

    /// Number of conversations started.
    pub fn conversation_count(&self) -> usize {
        self.inner.started.load(Ordering::SeqCst)
    }

    /// Requests that opened each conversation, in start order.
    pub fn requests(&self) -> Vec<ConversationRequest> {
        let mut requests: Vec<(usize, ConversationRequest)> = self
            .inner
            .conversations
            .iter()
            .map(|entry| (entry.seq, entry.request.clone()))
            .collect();
        requests.sort_by_key(|(seq, _)| *seq);
        requests.into_iter().map(|(_, request)| request).collect()
    }

    /// Every tool result submitted, grouped by conversation in start order.
    pub fn tool_results(&self) -> Vec<ToolResult> {
        let mut results: Vec<(usize, Vec<ToolResult>)> = self
            .inner
            .conversations
            .iter()
            .map(|entry| (entry.seq, entry.tool_results.clone()))
            .collect();
        results.sort_by_key(|(seq, _)| *seq);
        results.into_iter().flat_map(|(_, r)| r).collect()
    }

    /// Number of conversations the engine has closed.
    pub fn ended_count(&self) -> usize {
        self.inner
            .conversations
            .iter()
            .filter(|entry| entry.ended)
            .count()
    }
}

impl Backend for ScriptedBackend {
    fn name(&self) -> &str {
        &self.inner.name
    }

    async fn start_conversation(
        &self,
        request: &ConversationRequest,
    ) -> Result<ConversationId, BackendError> {
        let id = ConversationId::new();
        let seq = self.inner.started.fetch_add(1, Ordering::SeqCst);
        self.inner.conversations.insert(
            id,
            ConversationState {
                seq,
                request: request.clone(),
                cursor: 0,
                tool_results: Vec::new(),
                ended: false,
            },
        );
        Ok(id)
    }

    async fn next_turn(&self, conversation: ConversationId) -> Result<Turn, BackendError> {
        let latency_ms = self.inner.latency_ms.load(Ordering::SeqCst);
        if latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(latency_ms)).await;
        }

        let mut state = self
            .inner
            .conversations
            .get_mut(&conversation)
            .ok_or(BackendError::UnknownConversation(conversation))?;
        let step = self
            .inner
            .script
            .get(state.cursor)
            .cloned()
            .ok_or_else(|| BackendError::InvalidRequest("script exhausted".to_string()))?;
        state.cursor += 1;

        match step {
            ScriptStep::Answer(value) => Ok(Turn::FinalAnswer(value)),
            ScriptStep::CallTool { name, arguments } => {
                Ok(Turn::ToolCall(ToolCallRequest::new(name, arguments)))
            }
            ScriptStep::Fail(error) => Err(error),
            ScriptStep::EchoLastToolResult => Ok(Turn::FinalAnswer(
                state
                    .tool_results
                    .last()
                    .map(|result| result.content.clone())
                    .unwrap_or(Value::Null),
            )),
        }
    }

    async fn submit_tool_result(
        &self,
        conversation: ConversationId,
        result: ToolResult,
    ) -> Result<(), BackendError> {
        let mut state = self
            .inner
            .conversations
            .get_mut(&conversation)
            .ok_or(BackendError::UnknownConversation(conversation))?;
        state.tool_results.push(result);
        Ok(())
    }

    async fn end_conversation(&self, conversation: ConversationId) {
        if let Some(mut state) = self.inner.conversations.get_mut(&conversation) {
            state.ended = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn request(agent: &str) -> ConversationRequest {
        ConversationRequest {
            agent: agent.to_string(),
            model: String::new(),
            instructions: String::new(),
            user_content: vec![],
            context: BTreeMap::new(),
            tools: vec![],
            output_schema: json!({}),
        }
    }

    #[tokio::test]
    async fn test_script_replays_per_conversation() {
        let backend = ScriptedBackend::new(
            "scripted",
            [ScriptStep::call("bump", json!({})), ScriptStep::Answer(json!(7))],
        );
        for _ in 0..2 {
            let id = backend.start_conversation(&request("a")).await.unwrap();
            let turn = backend.next_turn(id).await.unwrap();
            assert!(matches!(turn, Turn::ToolCall(ref call) if call.name == "bump"));
            let turn = backend.next_turn(id).await.unwrap();
            assert_eq!(turn, Turn::FinalAnswer(json!(7)));
        }
        assert_eq!(backend.conversation_count(), 2);
    }

    #[tokio::test]
    async fn test_echo_last_tool_result() {
        let backend = ScriptedBackend::new(
            "scripted",
            [ScriptStep::call("bump", json!({})), ScriptStep::EchoLastToolResult],
        );
        let id = backend.start_conversation(&request("a")).await.unwrap();
        let Turn::ToolCall(call) = backend.next_turn(id).await.unwrap() else {
            panic!("expected a tool call");
        };
        backend
            .submit_tool_result(id, ToolResult::ok(&call, json!(3)))
            .await
            .unwrap();
        assert_eq!(
            backend.next_turn(id).await.unwrap(),
            Turn::FinalAnswer(json!(3))
        );
        assert_eq!(backend.tool_results().len(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_script_and_unknown_conversation() {
        let backend = ScriptedBackend::answering("scripted", json!(1));
        let id = backend.start_conversation(&request("a")).await.unwrap();
        backend.next_turn(id).await.unwrap();
        assert!(matches!(
            backend.next_turn(id).await,
            Err(BackendError::InvalidRequest(_))
        ));
        assert!(matches!(
            backend.next_turn(ConversationId::new()).await,
            Err(BackendError::UnknownConversation(_))
        ));
    }

    #[tokio::test]
    async fn test_requests_in_start_order() {
        let backend = ScriptedBackend::answering("scripted", json!(1));
        for agent in ["first", "second", "third"] {
            backend.start_conversation(&request(agent)).await.unwrap();
        }
        let agents: Vec<String> = backend.requests().into_iter().map(|r| r.agent).collect();
        assert_eq!(agents, ["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_latency_applies_to_existing_clones() {
        let backend = ScriptedBackend::answering("scripted", json!(1));
        let handle = backend.clone();
        let _backend = backend.with_latency(Duration::from_millis(30));

        let id = handle.start_conversation(&request("a")).await.unwrap();
        let started = std::time::Instant::now();
        handle.next_turn(id).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(30));
    }
}
