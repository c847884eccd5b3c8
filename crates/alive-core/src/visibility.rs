//! Per-invocation visibility resolution.
//!
//! Given an agent method, [`resolve`] computes which memory fields the
//! model sees (with their current values) and which sibling methods it may
//! call as tools. Selectors are expanded against the registry at call time,
//! so members declared after the agent are picked up.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use alive_types::agent::{Selection, ToolBinding};
use alive_types::error::ConfigurationError;
use alive_types::selector::Selector;

use crate::host::Memory;
use crate::prompt::compile_doc;
use crate::registry::{Members, TypeRegistry};
use crate::tool::schema::parameter_schema;

/// The fields and tools one agent invocation can see.
///
/// Built fresh for every invocation and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisibilityContext {
    /// The agent method this context was resolved for.
    pub agent: String,
    /// Visible fields and a snapshot of their values.
    pub fields: BTreeMap<String, Value>,
    /// Visible tools, keyed by method name.
    pub tools: BTreeMap<String, ToolBinding>,
}

impl VisibilityContext {
    /// Tool bindings in name order.
    pub fn tool_manifest(&self) -> Vec<ToolBinding> {
        self.tools.values().cloned().collect()
    }

    pub fn can_call(&self, tool: &str) -> bool {
        self.tools.contains_key(tool)
    }

    pub fn can_see(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }
}

/// Resolve the visibility context of agent `method`.
///
/// Fails with a [`ConfigurationError`] when `method` is not an agent on
/// this type, when it sets both include and exclude, or when any selector
/// does not resolve to a declared member.
pub fn resolve<H>(
    registry: &TypeRegistry<H>,
    method: &str,
    memory: &Memory,
) -> Result<VisibilityContext, ConfigurationError> {
    let decl = registry
        .method(method)
        .ok_or_else(|| ConfigurationError::UnknownMethod {
            type_name: registry.type_name().to_string(),
            name: method.to_string(),
        })?;
    let binding = decl.agent().ok_or_else(|| ConfigurationError::NotAnAgent {
        type_name: registry.type_name().to_string(),
        method: method.to_string(),
    })?;
    let selection = binding
        .selection()
        .ok_or_else(|| ConfigurationError::ConflictingSelection {
            method: method.to_string(),
        })?;

    let mut visible = match selection {
        Selection::Include(selectors) => {
            let mut members = select(registry, selectors)?;
            if !names_explicitly(selectors, method) {
                members.methods.remove(method);
            }
            members
        }
        Selection::Exclude(selectors) => {
            let excluded = select(registry, selectors)?;
            let mut members = registry.all_members().difference(&excluded);
            members.methods.remove(method);
            members
        }
        Selection::Default => Members {
            fields: registry.all_members().fields,
            methods: Default::default(),
        },
    };

    let fields = memory.snapshot(visible.fields.iter().map(String::as_str));
    let tools = std::mem::take(&mut visible.methods)
        .into_iter()
        .filter_map(|name| registry.method(&name))
        .map(|decl| {
            let doc = compile_doc(&decl.doc);
            let binding = ToolBinding {
                name: decl.name.clone(),
                description: doc.tool_description_or(&decl.name).to_string(),
                parameters: parameter_schema(&decl.params),
            };
            (decl.name.clone(), binding)
        })
        .collect();

    Ok(VisibilityContext {
        agent: method.to_string(),
        fields,
        tools,
    })
}

/// Union of the members referenced by `selectors`.
fn select<H>(
    registry: &TypeRegistry<H>,
    selectors: &[Selector],
) -> Result<Members, ConfigurationError> {
    let mut members = Members::default();
    for selector in selectors {
        members.extend(members_of(registry, selector)?);
    }
    Ok(members)
}

fn members_of<H>(
    registry: &TypeRegistry<H>,
    selector: &Selector,
) -> Result<Members, ConfigurationError> {
    let unresolved = || ConfigurationError::unresolved(registry.type_name(), selector);
    let mut members = Members::default();
    match selector {
        Selector::All => return Ok(registry.all_members()),
        Selector::Tag(tag) => return registry.resolve_tag(tag),
        Selector::Field(name) => {
            registry.field(name).ok_or_else(unresolved)?;
            members.fields.insert(name.clone());
        }
        Selector::Method(name) => {
            registry.method(name).ok_or_else(unresolved)?;
            members.methods.insert(name.clone());
        }
        Selector::Name(name) => {
            if registry.field(name).is_some() {
                members.fields.insert(name.clone());
            } else if registry.method(name).is_some() {
                members.methods.insert(name.clone());
            } else {
                return Err(unresolved());
            }
        }
    }
    Ok(members)
}

/// Whether `method` is named directly (not via tag or wildcard).
fn names_explicitly(selectors: &[Selector], method: &str) -> bool {
    selectors.iter().any(|selector| match selector {
        Selector::Method(name) | Selector::Name(name) => name == method,
        _ => false,
    })
}
