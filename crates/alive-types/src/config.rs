//! Engine configuration for Alive.
//!
//! `EngineConfig` controls conversation limits and the defaults used when
//! building backend requests. All fields have sensible defaults, so an empty
//! TOML document is a valid configuration.

use serde::{Deserialize, Serialize};

use crate::memory::PreviewLimits;

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Tool calls one conversation may make before the target fails.
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: u32,

    /// Maximum depth of agents invoked as tools by other agents.
    #[serde(default = "default_max_nesting_depth")]
    pub max_nesting_depth: u8,

    /// User content sent when an agent is invoked without arguments.
    #[serde(default = "default_user_prompt")]
    pub default_user_prompt: String,

    /// Character limit for memory previews.
    #[serde(default = "default_preview_max_chars")]
    pub preview_max_chars: usize,

    /// Item limit for collection previews.
    #[serde(default = "default_preview_max_items")]
    pub preview_max_items: usize,
}

fn default_max_tool_rounds() -> u32 {
    16
}

fn default_max_nesting_depth() -> u8 {
    3
}

fn default_user_prompt() -> String {
    "follow the instructions".to_string()
}

fn default_preview_max_chars() -> usize {
    220
}

fn default_preview_max_items() -> usize {
    20
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_tool_rounds: default_max_tool_rounds(),
            max_nesting_depth: default_max_nesting_depth(),
            default_user_prompt: default_user_prompt(),
            preview_max_chars: default_preview_max_chars(),
            preview_max_items: default_preview_max_items(),
        }
    }
}

impl EngineConfig {
    /// Parse a TOML configuration document.
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn preview_limits(&self) -> PreviewLimits {
        PreviewLimits {
            max_chars: self.preview_max_chars,
            max_items: self.preview_max_items,
        }
    }
}
