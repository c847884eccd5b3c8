use thiserror::Error;

use crate::agent::BackendRef;
use crate::backend::BackendError;
use crate::selector::Selector;
use crate::tag::Tag;

/// Declaration or selection problems. Detected before any backend is called.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("tag '{tag}' has no members on '{type_name}'")]
    UnknownTag { type_name: String, tag: Tag },

    #[error("'{type_name}' has no memory field '{name}'")]
    UnknownField { type_name: String, name: String },

    #[error("'{type_name}' has no method '{name}'")]
    UnknownMethod { type_name: String, name: String },

    #[error("'{type_name}' has no field or method '{name}'")]
    UnknownMember { type_name: String, name: String },

    #[error("method '{method}' on '{type_name}' is not an agent")]
    NotAnAgent { type_name: String, method: String },

    #[error("agent '{method}' sets both include and exclude")]
    ConflictingSelection { method: String },

    #[error("agent '{method}' declares no backend targets")]
    NoTargets { method: String },

    #[error("agent '{method}' targets unregistered backend '{backend}'")]
    UnknownBackend { method: String, backend: BackendRef },

    #[error("'{type_name}' declares '{name}' more than once")]
    DuplicateMember { type_name: String, name: String },

    #[error("invalid declaration for '{name}': {message}")]
    InvalidDeclaration { name: String, message: String },
}

impl ConfigurationError {
    /// Build the "does not resolve" error matching a selector's kind.
    pub fn unresolved(type_name: &str, selector: &Selector) -> Self {
        let type_name = type_name.to_string();
        match selector {
            Selector::Tag(tag) => Self::UnknownTag {
                type_name,
                tag: tag.clone(),
            },
            Selector::Field(name) => Self::UnknownField {
                type_name,
                name: name.clone(),
            },
            Selector::Method(name) => Self::UnknownMethod {
                type_name,
                name: name.clone(),
            },
            Selector::Name(name) => Self::UnknownMember {
                type_name,
                name: name.clone(),
            },
            Selector::All => Self::InvalidDeclaration {
                name: type_name,
                message: "wildcard cannot be unresolved".to_string(),
            },
        }
    }
}

/// A tool call that could not be completed.
///
/// Reported back to the backend that asked for it; never fatal to the agent
/// invocation on its own.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ToolExecutionError {
    #[error("tool '{0}' is not available in this conversation")]
    NotVisible(String),

    #[error("invalid arguments for tool '{tool}': {message}")]
    InvalidArguments { tool: String, message: String },

    #[error("tool '{tool}' failed: {message}")]
    Failed { tool: String, message: String },

    #[error("tool '{tool}' exceeds the nesting depth limit of {max_depth}")]
    DepthLimit { tool: String, max_depth: u8 },
}

/// A final answer that does not fit the declared return type.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("cannot coerce answer to '{expected}': {message}")]
pub struct ResultTypeError {
    pub expected: String,
    pub message: String,
    pub raw: serde_json::Value,
}

/// Why a single backend target produced no value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TargetError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    ResultType(#[from] ResultTypeError),

    #[error("conversation exceeded {max_rounds} tool rounds")]
    TurnLimitExceeded { max_rounds: u32 },

    #[error("cancelled")]
    Cancelled,
}

/// A target paired with the error it produced.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{target}: {error}")]
pub struct TargetFailure {
    pub target: BackendRef,
    pub error: TargetError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_display() {
        let err = ConfigurationError::UnknownTag {
            type_name: "Counter".to_string(),
            tag: Tag::new("io"),
        };
        assert_eq!(err.to_string(), "tag 'io' has no members on 'Counter'");
    }

    #[test]
    fn test_unresolved_matches_selector_kind() {
        let err = ConfigurationError::unresolved("Counter", &Selector::field("ghost"));
        assert!(matches!(err, ConfigurationError::UnknownField { .. }));
        let err = ConfigurationError::unresolved("Counter", &Selector::name("ghost"));
        assert!(matches!(err, ConfigurationError::UnknownMember { .. }));
    }

    #[test]
    fn test_target_failure_display() {
        let failure = TargetFailure {
            target: BackendRef::new("test", "slow"),
            error: TargetError::Backend(BackendError::Overloaded("busy".to_string())),
        };
        assert_eq!(failure.to_string(), "test:slow: provider overloaded: busy");
    }

    #[test]
    fn test_result_type_error_display() {
        let err = ResultTypeError {
            expected: "int64".to_string(),
            message: "invalid type: string".to_string(),
            raw: serde_json::json!("x"),
        };
        assert!(err.to_string().contains("int64"));
    }
}
