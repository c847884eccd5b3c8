//! Built-in memory tools carried by every registry.

use std::collections::BTreeSet;

use serde_json::Value;

use alive_types::agent::ParamSpec;
use alive_types::error::ToolExecutionError;
use alive_types::memory::PreviewLimits;
use alive_types::tag::Tag;

use crate::host::Alive;
use crate::registry::{MethodDecl, MethodKind};
use crate::visibility::VisibilityContext;

use super::schema::ToolArgs;

/// Tools every host exposes over its own memory.
///
/// Both are tagged `memory`. They only reach the fields of the calling
/// agent's visibility context, so excluding a field also hides it from
/// these tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinTool {
    /// Return the current value of one field.
    ReadMemory,
    /// Summarize every visible field (kind, declared type, size, preview).
    MemoriesOverview,
}

impl BuiltinTool {
    pub const ALL: [BuiltinTool; 2] = [BuiltinTool::ReadMemory, BuiltinTool::MemoriesOverview];

    pub fn name(self) -> &'static str {
        match self {
            BuiltinTool::ReadMemory => "read_memory",
            BuiltinTool::MemoriesOverview => "get_memories_overview",
        }
    }

    fn doc(self) -> &'static str {
        match self {
            BuiltinTool::ReadMemory => "<Read the current value of a memory field by name.>",
            BuiltinTool::MemoriesOverview => {
                "<List the visible memory fields with their type, size and a short preview.>"
            }
        }
    }

    fn params(self) -> Vec<ParamSpec> {
        match self {
            BuiltinTool::ReadMemory => {
                vec![ParamSpec::required::<String>("name").describe("memory field name")]
            }
            BuiltinTool::MemoriesOverview => Vec::new(),
        }
    }

    pub(crate) fn declaration<H>(self) -> MethodDecl<H> {
        MethodDecl {
            name: self.name().to_string(),
            doc: self.doc().to_string(),
            params: self.params(),
            tags: BTreeSet::from([Tag::memory()]),
            kind: MethodKind::Builtin(self),
        }
    }

    pub(crate) fn run<H: Alive>(
        self,
        host: &H,
        context: &VisibilityContext,
        args: &ToolArgs,
        limits: PreviewLimits,
    ) -> Result<Value, ToolExecutionError> {
        match self {
            BuiltinTool::ReadMemory => {
                let name: String = args.get("name")?;
                let unreadable = || ToolExecutionError::Failed {
                    tool: self.name().to_string(),
                    message: format!("no visible memory field '{name}'"),
                };
                if !context.can_see(&name) {
                    return Err(unreadable());
                }
                host.memory().get(&name).ok_or_else(unreadable)
            }
            BuiltinTool::MemoriesOverview => {
                let mut rows: Vec<_> = H::registry()
                    .fields_of()
                    .iter()
                    .filter(|field| context.can_see(&field.name))
                    .map(|field| {
                        let value = host.memory().get(&field.name).unwrap_or(Value::Null);
                        field.overview(&value, limits)
                    })
                    .collect();
                rows.sort_by(|a, b| a.name.cmp(&b.name));
                serde_json::to_value(rows).map_err(|e| ToolExecutionError::Failed {
                    tool: self.name().to_string(),
                    message: e.to_string(),
                })
            }
        }
    }
}
