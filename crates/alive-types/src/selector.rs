//! Include/exclude selectors used by agent bindings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::tag::Tag;

/// The wildcard spelling accepted by [`Selector::from_str`].
pub const WILDCARD: &str = "*";

/// One entry of an agent's `include` or `exclude` list.
///
/// Selectors are stored verbatim on the binding and only resolved against
/// the type's declarations when an agent is invoked, so tags may be declared
/// after the agent that references them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum Selector {
    /// Every declared field and method.
    All,
    /// Every member currently carrying the tag.
    Tag(Tag),
    /// A memory field by name.
    Field(String),
    /// A method by name.
    Method(String),
    /// A field or a method, whichever carries the name.
    Name(String),
}

impl Selector {
    pub fn tag(tag: impl Into<Tag>) -> Self {
        Self::Tag(tag.into())
    }

    pub fn field(name: impl Into<String>) -> Self {
        Self::Field(name.into())
    }

    pub fn method(name: impl Into<String>) -> Self {
        Self::Method(name.into())
    }

    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::All)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::All => f.write_str(WILDCARD),
            Selector::Tag(tag) => write!(f, "tag:{tag}"),
            Selector::Field(name) => write!(f, "field:{name}"),
            Selector::Method(name) => write!(f, "method:{name}"),
            Selector::Name(name) => f.write_str(name),
        }
    }
}

impl FromStr for Selector {
    type Err = String;

    /// Parses `*`, `tag:x`, `field:x`, `method:x` or a bare name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("empty selector".to_string());
        }
        if s == WILDCARD {
            return Ok(Selector::All);
        }
        let selector = match s.split_once(':') {
            Some(("tag", rest)) => Selector::Tag(Tag::new(rest)),
            Some(("field", rest)) => Selector::Field(rest.to_string()),
            Some(("method", rest)) => Selector::Method(rest.to_string()),
            Some((prefix, _)) => return Err(format!("invalid selector prefix: '{prefix}'")),
            None => Selector::Name(s.to_string()),
        };
        Ok(selector)
    }
}

impl From<Tag> for Selector {
    fn from(value: Tag) -> Self {
        Selector::Tag(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wildcard() {
        assert_eq!("*".parse::<Selector>().unwrap(), Selector::All);
        assert!(Selector::All.is_wildcard());
    }

    #[test]
    fn test_parse_prefixed_selectors() {
        assert_eq!(
            "tag:io".parse::<Selector>().unwrap(),
            Selector::tag("io")
        );
        assert_eq!(
            "field:counter".parse::<Selector>().unwrap(),
            Selector::field("counter")
        );
        assert_eq!(
            "method:bump".parse::<Selector>().unwrap(),
            Selector::method("bump")
        );
        assert_eq!(
            "notes".parse::<Selector>().unwrap(),
            Selector::name("notes")
        );
    }

    #[test]
    fn test_parse_rejects_unknown_prefix_and_empty() {
        assert!("widget:x".parse::<Selector>().is_err());
        assert!("  ".parse::<Selector>().is_err());
    }

    #[test]
    fn test_display_parses_back() {
        for selector in [
            Selector::All,
            Selector::tag("io"),
            Selector::field("a"),
            Selector::method("b"),
            Selector::name("c"),
        ] {
            let parsed: Selector = selector.to_string().parse().unwrap();
            assert_eq!(parsed, selector);
        }
    }
}
