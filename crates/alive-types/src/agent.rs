//! Agent and tool declaration types for Alive.
//!
//! An [`AgentBinding`] is the declaration-time metadata that turns a method
//! into an agent: which backends it targets, which members of the host it
//! may see, and the type it must return. A [`ToolBinding`] is what a model
//! sees of a sibling method exposed to it as a tool.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::{schema_value, type_name};
use crate::selector::Selector;

/// Identifies one model backend configuration.
///
/// Written as `provider:model` (e.g. `openai:gpt-4o`, `test:slow`). The
/// model part may be empty for backends that serve a single model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BackendRef {
    pub provider: String,
    #[serde(default)]
    pub model: String,
}

impl BackendRef {
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
        }
    }

    /// A reference to a provider without a model qualifier.
    pub fn provider(provider: impl Into<String>) -> Self {
        Self::new(provider, "")
    }
}

impl fmt::Display for BackendRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.model.is_empty() {
            f.write_str(&self.provider)
        } else {
            write!(f, "{}:{}", self.provider, self.model)
        }
    }
}

impl FromStr for BackendRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (provider, model) = s.split_once(':').unwrap_or((s, ""));
        if provider.is_empty() {
            return Err(format!("invalid backend reference: '{s}'"));
        }
        Ok(Self::new(provider, model))
    }
}

/// One declared parameter of a method.
///
/// A parameter is required exactly when it has no default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub type_name: String,
    pub schema: Value,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ParamSpec {
    /// A required parameter of type `T`.
    pub fn required<T: JsonSchema>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name::<T>(),
            schema: schema_value::<T>(),
            description: String::new(),
            default: None,
        }
    }

    /// An optional parameter of type `T` that falls back to `default`.
    pub fn optional<T: JsonSchema>(name: impl Into<String>, default: Value) -> Self {
        Self {
            default: Some(default),
            ..Self::required::<T>(name)
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// The declared return type of an agent method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnSpec {
    pub type_name: String,
    /// JSON schema sent to backends as the structured-output contract.
    pub schema: Value,
    /// Whether a multi-target call may return with some targets failed.
    ///
    /// When false, any failed target turns the whole call into an
    /// aggregated error.
    #[serde(default)]
    pub partial_results: bool,
}

impl ReturnSpec {
    pub fn of<T: JsonSchema>() -> Self {
        Self {
            type_name: type_name::<T>(),
            schema: schema_value::<T>(),
            partial_results: false,
        }
    }
}

impl Default for ReturnSpec {
    /// An unconstrained return type (any JSON value).
    fn default() -> Self {
        Self::of::<Value>()
    }
}

/// Declaration-time metadata that makes a method an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentBinding {
    /// Backends to dispatch to, in declaration order.
    pub llm_targets: Vec<BackendRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<Vec<Selector>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Vec<Selector>>,
    #[serde(default)]
    pub returns: ReturnSpec,
}

impl AgentBinding {
    pub fn new(llm_targets: impl IntoIterator<Item = BackendRef>) -> Self {
        Self {
            llm_targets: llm_targets.into_iter().collect(),
            include: None,
            exclude: None,
            returns: ReturnSpec::default(),
        }
    }

    pub fn include(mut self, selectors: impl IntoIterator<Item = Selector>) -> Self {
        self.include = Some(selectors.into_iter().collect());
        self
    }

    pub fn exclude(mut self, selectors: impl IntoIterator<Item = Selector>) -> Self {
        self.exclude = Some(selectors.into_iter().collect());
        self
    }

    /// Declare the return type `T`.
    pub fn returns<T: JsonSchema>(mut self) -> Self {
        let partial_results = self.returns.partial_results;
        self.returns = ReturnSpec {
            partial_results,
            ..ReturnSpec::of::<T>()
        };
        self
    }

    /// Allow multi-target calls to return with some targets failed.
    pub fn tolerate_partial(mut self) -> Self {
        self.returns.partial_results = true;
        self
    }

    /// The selection mode this binding uses.
    ///
    /// Returns `None` when both `include` and `exclude` are set, which is
    /// not a valid binding.
    pub fn selection(&self) -> Option<Selection<'_>> {
        match (&self.include, &self.exclude) {
            (Some(_), Some(_)) => None,
            (Some(include), None) => Some(Selection::Include(include)),
            (None, Some(exclude)) => Some(Selection::Exclude(exclude)),
            (None, None) => Some(Selection::Default),
        }
    }

    pub fn is_multi_target(&self) -> bool {
        self.llm_targets.len() > 1
    }
}

/// How an agent selects the members it can see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection<'a> {
    /// Exactly the union of the listed members.
    Include(&'a [Selector]),
    /// Everything except the listed members.
    Exclude(&'a [Selector]),
    /// All memory fields and no tools.
    Default,
}

/// A sibling method as exposed to a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolBinding {
    pub name: String,
    pub description: String,
    /// JSON schema (`type: object`) of the tool's arguments.
    pub parameters: Value,
}
