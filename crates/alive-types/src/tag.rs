//! Grouping labels attached to memory fields and methods.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Tag attached to every agent method.
pub const AGENT_TAG: &str = "agent";

/// Tag attached to the built-in memory tools.
pub const MEMORY_TAG: &str = "memory";

/// An opaque grouping label.
///
/// Tags have no ordering semantics beyond what is needed to keep them in
/// sorted sets; two tags are equal when their names are equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag(String);

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The tag carried by every agent method.
    pub fn agent() -> Self {
        Self::new(AGENT_TAG)
    }

    /// The tag carried by the built-in memory tools.
    pub fn memory() -> Self {
        Self::new(MEMORY_TAG)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Tag {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Tag {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl PartialEq<str> for Tag {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_equality_by_name() {
        assert_eq!(Tag::new("io"), Tag::from("io"));
        assert_ne!(Tag::new("io"), Tag::new("net"));
        assert!(Tag::memory() == *"memory");
    }

    #[test]
    fn test_tag_serde_is_transparent() {
        let json = serde_json::to_string(&Tag::agent()).unwrap();
        assert_eq!(json, "\"agent\"");
        let parsed: Tag = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Tag::agent());
    }
}
