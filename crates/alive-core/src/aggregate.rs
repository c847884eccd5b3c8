//! Result coercion and aggregation.
//!
//! Each backend's raw final answer is coerced to the agent's declared
//! return type on its own. Single-target agents then return their value
//! unwrapped; multi-target agents return one entry per target, in
//! declaration order.

use serde::de::DeserializeOwned;
use serde_json::Value;

use alive_types::agent::ReturnSpec;
use alive_types::error::{ResultTypeError, TargetFailure};
use alive_types::schema::{declared_kinds, kind_matches, value_kind};

use crate::engine::AgentError;

/// The value of an agent invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentOutput<T> {
    /// The answer of a single-target agent.
    One(T),
    /// One entry per target, aligned with the declared target order.
    Many(Vec<Result<T, TargetFailure>>),
}

impl<T> AgentOutput<T> {
    /// The single answer, if this is a single-target output.
    pub fn one(self) -> Option<T> {
        match self {
            AgentOutput::One(value) => Some(value),
            AgentOutput::Many(_) => None,
        }
    }

    /// Per-target results; a single answer becomes a one-element list.
    pub fn many(self) -> Vec<Result<T, TargetFailure>> {
        match self {
            AgentOutput::One(value) => vec![Ok(value)],
            AgentOutput::Many(results) => results,
        }
    }

    /// Successful answers, in target order.
    pub fn successes(self) -> Vec<T> {
        self.many().into_iter().filter_map(Result::ok).collect()
    }

    pub fn len(&self) -> usize {
        match self {
            AgentOutput::One(_) => 1,
            AgentOutput::Many(results) => results.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Coerce a raw final answer to `T`.
///
/// The answer must first match the declared schema's JSON kind, then
/// deserialize as `T`.
pub fn coerce<T: DeserializeOwned>(spec: &ReturnSpec, raw: Value) -> Result<T, ResultTypeError> {
    if !kind_matches(&spec.schema, &raw) {
        return Err(ResultTypeError {
            expected: spec.type_name.clone(),
            message: format!(
                "expected {}, got {}",
                declared_kinds(&spec.schema).join(" or "),
                value_kind(&raw)
            ),
            raw,
        });
    }
    serde_json::from_value(raw.clone()).map_err(|e| ResultTypeError {
        expected: spec.type_name.clone(),
        message: e.to_string(),
        raw,
    })
}

/// Combine per-target results into the caller-visible outcome.
///
/// A failed single target is an error. In multi-target mode, failures are
/// kept in place when the return spec tolerates partial results; otherwise
/// any failure aborts with every failure collected into one error.
pub fn aggregate<T>(
    spec: &ReturnSpec,
    mut results: Vec<Result<T, TargetFailure>>,
) -> Result<AgentOutput<T>, AgentError> {
    if results.len() == 1 {
        return match results.pop() {
            Some(Ok(value)) => Ok(AgentOutput::One(value)),
            Some(Err(failure)) => Err(AgentError::Target(failure)),
            None => Ok(AgentOutput::Many(Vec::new())),
        };
    }

    if !spec.partial_results {
        let failures: Vec<TargetFailure> = results
            .iter()
            .filter_map(|result| result.as_ref().err().cloned())
            .collect();
        if !failures.is_empty() {
            return Err(AgentError::Aggregate {
                failures,
                total: results.len(),
            });
        }
    }

    Ok(AgentOutput::Many(results))
}
