//! User content for agent invocations.

use serde::Serialize;
use serde_json::{Map, Value};

/// The user-side content of one agent invocation.
///
/// Each part becomes one user message. Keyword arguments render as
/// `key=value`; strings are rendered without quotes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentInput {
    parts: Vec<String>,
}

impl AgentInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a free-text part.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.parts.push(text.into());
        self
    }

    /// Add a keyword argument. Null values are skipped.
    ///
    /// # Errors
    ///
    /// Returns the serializer's error if `value` has no JSON form.
    pub fn arg(mut self, key: &str, value: impl Serialize) -> Result<Self, serde_json::Error> {
        let value = serde_json::to_value(value)?;
        if let Some(part) = render_arg(key, &value) {
            self.parts.push(part);
        }
        Ok(self)
    }

    /// Input built from bound tool arguments, in map order.
    pub fn from_args(args: &Map<String, Value>) -> Self {
        Self {
            parts: args
                .iter()
                .filter_map(|(key, value)| render_arg(key, value))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// The user content parts, or `[default]` when there are none.
    pub fn into_user_content(self, default: &str) -> Vec<String> {
        if self.parts.is_empty() {
            vec![default.to_string()]
        } else {
            self.parts
        }
    }
}

impl From<&str> for AgentInput {
    fn from(text: &str) -> Self {
        Self::new().text(text)
    }
}

impl From<String> for AgentInput {
    fn from(text: String) -> Self {
        Self::new().text(text)
    }
}

fn render_arg(key: &str, value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(format!("{key}={s}")),
        other => Some(format!("{key}={other}")),
    }
}
