//! Schema-driven test backend.
//!
//! [`TestBackend`] needs no script: in every conversation it calls each
//! tool of the manifest once, with arguments generated from the tool's
//! parameter schema, and then answers with a value generated from the
//! output schema. Good for smoke-testing declarations end to end.

use std::collections::VecDeque;

use dashmap::DashMap;
use serde_json::{Map, Value, json};

use alive_types::backend::{
    BackendError, ConversationId, ConversationRequest, ToolCallRequest, ToolResult, Turn,
};

use super::provider::Backend;

#[derive(Debug)]
struct ConversationState {
    pending: VecDeque<ToolCallRequest>,
    output_schema: Value,
    tool_results: Vec<ToolResult>,
}

#[derive(Debug)]
pub struct TestBackend {
    name: String,
    conversations: DashMap<ConversationId, ConversationState>,
}

impl TestBackend {
    pub fn new() -> Self {
        Self::named("test")
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            conversations: DashMap::new(),
        }
    }
}

impl Default for TestBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for TestBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start_conversation(
        &self,
        request: &ConversationRequest,
    ) -> Result<ConversationId, BackendError> {
        let id = ConversationId::new();
        let pending = request
            .tools
            .iter()
            .map(|tool| ToolCallRequest::new(&tool.name, example_value(&tool.parameters)))
            .collect();
        self.conversations.insert(
            id,
            ConversationState {
                pending,
                output_schema: request.output_schema.clone(),
                tool_results: Vec::new(),
            },
        );
        Ok(id)
    }

    async fn next_turn(&self, conversation: ConversationId) -> Result<Turn, BackendError> {
        let mut state = self
            .conversations
            .get_mut(&conversation)
            .ok_or(BackendError::UnknownConversation(conversation))?;
        match state.pending.pop_front() {
            Some(call) => Ok(Turn::ToolCall(call)),
            None => Ok(Turn::FinalAnswer(example_value(&state.output_schema))),
        }
    }

    async fn submit_tool_result(
        &self,
        conversation: ConversationId,
        result: ToolResult,
    ) -> Result<(), BackendError> {
        let mut state = self
            .conversations
            .get_mut(&conversation)
            .ok_or(BackendError::UnknownConversation(conversation))?;
        state.tool_results.push(result);
        Ok(())
    }

    async fn end_conversation(&self, conversation: ConversationId) {
        self.conversations.remove(&conversation);
    }
}

/// Generate a minimal value that satisfies `schema`.
///
/// Honors `const`, `enum`, `default`, `anyOf`/`oneOf` (first non-null
/// option), numeric `minimum`, array `minItems` and object `properties`.
/// Unconstrained schemas yield `null`.
pub fn example_value(schema: &Value) -> Value {
    let Some(object) = schema.as_object() else {
        return Value::Null;
    };

    if let Some(value) = object.get("const") {
        return value.clone();
    }
    if let Some(first) = object
        .get("enum")
        .and_then(Value::as_array)
        .and_then(|values| values.first())
    {
        return first.clone();
    }
    if let Some(default) = object.get("default") {
        return default.clone();
    }
    for key in ["anyOf", "oneOf"] {
        if let Some(options) = object.get(key).and_then(Value::as_array) {
            let option = options
                .iter()
                .find(|option| option.get("type").and_then(Value::as_str) != Some("null"))
                .or_else(|| options.first());
            return option.map(example_value).unwrap_or(Value::Null);
        }
    }

    let kind = match object.get("type") {
        Some(Value::String(kind)) => Some(kind.as_str()),
        Some(Value::Array(kinds)) => kinds
            .iter()
            .filter_map(Value::as_str)
            .find(|kind| *kind != "null")
            .or(Some("null")),
        _ if object.contains_key("properties") => Some("object"),
        _ => None,
    };

    match kind {
        Some("string") => json!("a"),
        Some("integer") => {
            let minimum = object.get("minimum").and_then(Value::as_f64).unwrap_or(0.0);
            json!(minimum.max(0.0).ceil() as i64)
        }
        Some("number") => {
            let minimum = object.get("minimum").and_then(Value::as_f64).unwrap_or(0.0);
            json!(minimum.max(0.0))
        }
        Some("boolean") => json!(false),
        Some("array") => {
            let min_items = object.get("minItems").and_then(Value::as_u64).unwrap_or(0);
            let max_items = object
                .get("maxItems")
                .and_then(Value::as_u64)
                .unwrap_or(u64::MAX);
            let count = min_items.max(1).min(max_items);
            let item = object.get("items").map(example_value).unwrap_or(Value::Null);
            Value::Array((0..count).map(|_| item.clone()).collect())
        }
        Some("object") => {
            let properties: Map<String, Value> = object
                .get("properties")
                .and_then(Value::as_object)
                .map(|props| {
                    props
                        .iter()
                        .map(|(name, schema)| (name.clone(), example_value(schema)))
                        .collect()
                })
                .unwrap_or_default();
            Value::Object(properties)
        }
        _ => Value::Null,
    }
}
