//! Memory field declarations and previews.
//!
//! A [`MemoryField`] is the type-level declaration of one memory slot: its
//! name, declared type, default value, description and tags. Declarations
//! are shared read-only by every instance of the host type; values live in
//! each instance's memory store.

use std::collections::BTreeSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::{kind_matches, schema_value, type_name, value_kind};
use crate::tag::Tag;

/// Declaration of one typed memory slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryField {
    pub name: String,
    /// Declared type name (e.g. `"int64"`, `"Array_of_string"`).
    pub value_type: String,
    /// JSON schema of the declared type.
    pub schema: Value,
    pub default: Value,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: BTreeSet<Tag>,
}

impl MemoryField {
    /// Declare a field of type `T` with the given default.
    ///
    /// Fails only when `T`'s serialization of the default is not
    /// representable as JSON (e.g. maps with non-string keys).
    pub fn new<T>(name: impl Into<String>, default: T) -> Result<Self, serde_json::Error>
    where
        T: Serialize + JsonSchema,
    {
        Ok(Self {
            name: name.into(),
            value_type: type_name::<T>(),
            schema: schema_value::<T>(),
            default: serde_json::to_value(default)?,
            description: String::new(),
            tags: BTreeSet::new(),
        })
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn tag(mut self, tag: impl Into<Tag>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn has_tag(&self, tag: &Tag) -> bool {
        self.tags.contains(tag)
    }

    /// Summarize the current `value` of this field.
    pub fn overview(&self, value: &Value, limits: PreviewLimits) -> MemoryOverview {
        let serialized_len = serde_json::to_string(value).map(|s| s.len()).unwrap_or(0);
        let size_kb = (serialized_len as f64 / 1024.0 * 1000.0).round() / 1000.0;

        let mut preview = preview(value, limits);
        if !value.is_null() && !kind_matches(&self.schema, value) {
            preview = format!(
                "{preview}  [hint={} ≠ runtime={}]",
                self.value_type,
                value_kind(value)
            );
        }

        MemoryOverview {
            name: self.name.clone(),
            type_name: value_kind(value).to_string(),
            hint: self.value_type.clone(),
            size_kb,
            description: self.description.clone(),
            preview,
        }
    }
}

/// One row of the memory overview exposed to models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryOverview {
    pub name: String,
    /// Runtime JSON kind of the current value.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Declared type name.
    pub hint: String,
    /// Approximate serialized size in KiB, rounded to three decimals.
    pub size_kb: f64,
    pub description: String,
    pub preview: String,
}

/// Truncation limits for [`preview`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewLimits {
    pub max_chars: usize,
    pub max_items: usize,
}

impl Default for PreviewLimits {
    fn default() -> Self {
        Self {
            max_chars: 220,
            max_items: 20,
        }
    }
}

/// Render a short, human-readable preview of a memory value.
///
/// Strings are shown raw, arrays as `array(len=N, head=[..])`, objects as
/// `object(len=N, keys=[..])`; everything is truncated to `max_chars`
/// characters with a trailing ellipsis.
pub fn preview(value: &Value, limits: PreviewLimits) -> String {
    let rendered = match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => {
            let head: Vec<String> = items
                .iter()
                .take(limits.max_items)
                .map(Value::to_string)
                .collect();
            format!("array(len={}, head=[{}])", items.len(), head.join(", "))
        }
        Value::Object(map) => {
            let keys: Vec<&str> = map
                .keys()
                .take(limits.max_items)
                .map(String::as_str)
                .collect();
            format!("object(len={}, keys=[{}])", map.len(), keys.join(", "))
        }
        other => other.to_string(),
    };
    truncate_chars(&rendered, limits.max_chars)
}

fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &s[..idx]),
        None => s.to_string(),
    }
}
