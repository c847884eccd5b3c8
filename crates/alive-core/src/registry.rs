//! Field/tag registry for host types.
//!
//! A [`TypeRegistry`] is built once per host type and holds the declared
//! memory fields and methods, each with its tags. Methods are either plain
//! tools (an async handler over the host), agents (an [`AgentBinding`]), or
//! one of the built-in memory tools every registry carries.
//!
//! Tag references are not checked at build time: a tag is only required to
//! have members when an agent selecting it is invoked.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use schemars::JsonSchema;
use serde::Serialize;
use serde_json::Value;

use alive_types::agent::{AgentBinding, ParamSpec};
use alive_types::error::ConfigurationError;
use alive_types::memory::MemoryField;
use alive_types::tag::Tag;

use crate::tool::builtin::BuiltinTool;
use crate::tool::schema::ToolArgs;

/// Future returned by a tool handler.
pub type ToolFuture = BoxFuture<'static, anyhow::Result<Value>>;

/// An async method body invoked with the shared host and bound arguments.
pub type ToolHandler<H> = Arc<dyn Fn(Arc<H>, ToolArgs) -> ToolFuture + Send + Sync>;

/// What happens when a method is called.
pub enum MethodKind<H> {
    /// A real method body.
    Tool(ToolHandler<H>),
    /// A model-backed method.
    Agent(AgentBinding),
    /// A built-in memory tool.
    Builtin(BuiltinTool),
}

impl<H> fmt::Debug for MethodKind<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodKind::Tool(_) => f.write_str("Tool(<handler>)"),
            MethodKind::Agent(binding) => f.debug_tuple("Agent").field(binding).finish(),
            MethodKind::Builtin(builtin) => f.debug_tuple("Builtin").field(builtin).finish(),
        }
    }
}

/// Declaration of one method of a host type.
pub struct MethodDecl<H> {
    pub name: String,
    /// Documentation text; see [`crate::prompt::compile_doc`].
    pub doc: String,
    pub params: Vec<ParamSpec>,
    pub tags: BTreeSet<Tag>,
    pub kind: MethodKind<H>,
}

impl<H> fmt::Debug for MethodDecl<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDecl")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("tags", &self.tags)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl<H> MethodDecl<H> {
    pub fn has_tag(&self, tag: &Tag) -> bool {
        self.tags.contains(tag)
    }

    /// The agent binding, if this method is an agent.
    pub fn agent(&self) -> Option<&AgentBinding> {
        match &self.kind {
            MethodKind::Agent(binding) => Some(binding),
            _ => None,
        }
    }

    pub fn is_agent(&self) -> bool {
        self.agent().is_some()
    }
}

/// Members of a type selected by a tag or selector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Members {
    pub fields: BTreeSet<String>,
    pub methods: BTreeSet<String>,
}

impl Members {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.methods.is_empty()
    }

    pub fn extend(&mut self, other: Members) {
        self.fields.extend(other.fields);
        self.methods.extend(other.methods);
    }

    /// Members of `self` that are not in `other`.
    pub fn difference(&self, other: &Members) -> Members {
        Members {
            fields: self.fields.difference(&other.fields).cloned().collect(),
            methods: self.methods.difference(&other.methods).cloned().collect(),
        }
    }
}

/// Declarations for one host type.
pub struct TypeRegistry<H> {
    type_name: String,
    fields: Vec<MemoryField>,
    methods: Vec<MethodDecl<H>>,
}

impl<H> fmt::Debug for TypeRegistry<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("type_name", &self.type_name)
            .field("fields", &self.fields)
            .field("methods", &self.methods)
            .finish()
    }
}

impl<H: Send + Sync + 'static> TypeRegistry<H> {
    pub fn builder(type_name: impl Into<String>) -> RegistryBuilder<H> {
        RegistryBuilder::new(type_name)
    }
}

impl<H> TypeRegistry<H> {
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Declared memory fields, in declaration order.
    pub fn fields_of(&self) -> &[MemoryField] {
        &self.fields
    }

    /// Declared methods, in declaration order, built-ins last.
    pub fn methods_of(&self) -> &[MethodDecl<H>] {
        &self.methods
    }

    pub fn field(&self, name: &str) -> Option<&MemoryField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn method(&self, name: &str) -> Option<&MethodDecl<H>> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Every declared field and method.
    pub fn all_members(&self) -> Members {
        Members {
            fields: self.fields.iter().map(|f| f.name.clone()).collect(),
            methods: self.methods.iter().map(|m| m.name.clone()).collect(),
        }
    }

    /// Every field and method currently carrying `tag`.
    ///
    /// Fails with [`ConfigurationError::UnknownTag`] when nothing carries it.
    pub fn resolve_tag(&self, tag: &Tag) -> Result<Members, ConfigurationError> {
        let members = Members {
            fields: self
                .fields
                .iter()
                .filter(|f| f.has_tag(tag))
                .map(|f| f.name.clone())
                .collect(),
            methods: self
                .methods
                .iter()
                .filter(|m| m.has_tag(tag))
                .map(|m| m.name.clone())
                .collect(),
        };
        if members.is_empty() {
            return Err(ConfigurationError::UnknownTag {
                type_name: self.type_name.clone(),
                tag: tag.clone(),
            });
        }
        Ok(members)
    }
}

/// Builder for a [`TypeRegistry`].
///
/// Declaration errors (duplicate names, invalid defaults, agents with both
/// include and exclude, agents without targets) are collected and reported
/// by [`RegistryBuilder::build`].
pub struct RegistryBuilder<H> {
    type_name: String,
    fields: Vec<MemoryField>,
    methods: Vec<MethodDecl<H>>,
    builtins: bool,
    errors: Vec<ConfigurationError>,
}

impl<H: Send + Sync + 'static> RegistryBuilder<H> {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Vec::new(),
            methods: Vec::new(),
            builtins: true,
            errors: Vec::new(),
        }
    }

    /// Declare a memory field of type `T`.
    pub fn field<T>(mut self, name: &str, default: T, description: &str, tags: &[&str]) -> Self
    where
        T: Serialize + JsonSchema,
    {
        match MemoryField::new(name, default) {
            Ok(field) => {
                let field = tags
                    .iter()
                    .fold(field.describe(description), |field, tag| field.tag(*tag));
                self.fields.push(field);
            }
            Err(e) => self.errors.push(ConfigurationError::InvalidDeclaration {
                name: name.to_string(),
                message: e.to_string(),
            }),
        }
        self
    }

    /// Declare an already-built memory field.
    pub fn memory_field(mut self, field: MemoryField) -> Self {
        self.fields.push(field);
        self
    }

    /// Declare a method with a real body.
    pub fn tool<F, Fut>(
        mut self,
        name: &str,
        doc: &str,
        params: Vec<ParamSpec>,
        tags: &[&str],
        handler: F,
    ) -> Self
    where
        F: Fn(Arc<H>, ToolArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        let handler: ToolHandler<H> = Arc::new(move |host: Arc<H>, args: ToolArgs| -> ToolFuture {
            Box::pin(handler(host, args))
        });
        self.methods.push(MethodDecl {
            name: name.to_string(),
            doc: doc.to_string(),
            params,
            tags: tags.iter().map(|t| Tag::new(*t)).collect(),
            kind: MethodKind::Tool(handler),
        });
        self
    }

    /// Declare an agent method. It carries the `agent` tag in addition to
    /// `tags`.
    pub fn agent(
        mut self,
        name: &str,
        doc: &str,
        params: Vec<ParamSpec>,
        tags: &[&str],
        binding: AgentBinding,
    ) -> Self {
        if binding.selection().is_none() {
            self.errors.push(ConfigurationError::ConflictingSelection {
                method: name.to_string(),
            });
        }
        if binding.llm_targets.is_empty() {
            self.errors.push(ConfigurationError::NoTargets {
                method: name.to_string(),
            });
        }
        let mut tag_set: BTreeSet<Tag> = tags.iter().map(|t| Tag::new(*t)).collect();
        tag_set.insert(Tag::agent());
        self.methods.push(MethodDecl {
            name: name.to_string(),
            doc: doc.to_string(),
            params,
            tags: tag_set,
            kind: MethodKind::Agent(binding),
        });
        self
    }

    /// Leave out the built-in `read_memory` and `get_memories_overview` tools.
    pub fn without_builtins(mut self) -> Self {
        self.builtins = false;
        self
    }

    pub fn build(mut self) -> Result<TypeRegistry<H>, ConfigurationError> {
        if self.builtins {
            for builtin in BuiltinTool::ALL {
                self.methods.push(builtin.declaration());
            }
        }

        let mut seen = HashSet::new();
        let names = self
            .fields
            .iter()
            .map(|f| f.name.as_str())
            .chain(self.methods.iter().map(|m| m.name.as_str()));
        for name in names {
            if !seen.insert(name) {
                return Err(ConfigurationError::DuplicateMember {
                    type_name: self.type_name.clone(),
                    name: name.to_string(),
                });
            }
        }

        if let Some(error) = self.errors.into_iter().next() {
            return Err(error);
        }

        Ok(TypeRegistry {
            type_name: self.type_name,
            fields: self.fields,
            methods: self.methods,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alive_types::agent::BackendRef;
    use alive_types::selector::Selector;
    use serde_json::json;

    struct Dummy;

    fn registry() -> TypeRegistry<Dummy> {
        TypeRegistry::builder("Dummy")
            .field("counter", 0i64, "a counter", &["stats"])
            .field("notes", Vec::<String>::new(), "", &[])
            .tool("bump", "<bump>", vec![], &["stats", "write"], |_host, _args| async {
                Ok::<_, anyhow::Error>(json!(1))
            })
            .agent(
                "think",
                "Think hard.",
                vec![],
                &[],
                AgentBinding::new([BackendRef::provider("test")]),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_fields_and_methods_in_declaration_order() {
        let registry = registry();
        let fields: Vec<&str> = registry.fields_of().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(fields, ["counter", "notes"]);
        let methods: Vec<&str> = registry.methods_of().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(
            methods,
            ["bump", "think", "read_memory", "get_memories_overview"]
        );
    }

    #[test]
    fn test_resolve_tag_spans_fields_and_methods() {
        let registry = registry();
        let members = registry.resolve_tag(&Tag::new("stats")).unwrap();
        assert!(members.fields.contains("counter"));
        assert!(members.methods.contains("bump"));
        assert_eq!(members.fields.len() + members.methods.len(), 2);
    }

    #[test]
    fn test_resolve_unknown_tag_fails() {
        let registry = registry();
        let err = registry.resolve_tag(&Tag::new("ghost")).unwrap_err();
        assert!(matches!(err, ConfigurationError::UnknownTag { .. }));
    }

    #[test]
    fn test_agent_methods_carry_agent_tag() {
        let registry = registry();
        let members = registry.resolve_tag(&Tag::agent()).unwrap();
        assert_eq!(members.methods.into_iter().collect::<Vec<_>>(), ["think"]);
        assert!(registry.method("think").unwrap().is_agent());
        assert!(!registry.method("bump").unwrap().is_agent());
    }

    #[test]
    fn test_builtins_carry_memory_tag_and_can_be_omitted() {
        let registry = registry();
        let members = registry.resolve_tag(&Tag::memory()).unwrap();
        assert_eq!(members.methods.len(), 2);

        let bare = TypeRegistry::<Dummy>::builder("Dummy")
            .field("counter", 0i64, "", &[])
            .without_builtins()
            .build()
            .unwrap();
        assert!(bare.methods_of().is_empty());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err = TypeRegistry::<Dummy>::builder("Dummy")
            .field("bump", 0i64, "", &[])
            .tool("bump", "", vec![], &[], |_h, _a| async { Ok::<_, anyhow::Error>(Value::Null) })
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::DuplicateMember { .. }));
    }

    #[test]
    fn test_conflicting_selection_and_missing_targets_rejected() {
        let binding = AgentBinding::new([BackendRef::provider("test")])
            .include([Selector::All])
            .exclude([Selector::All]);
        let err = TypeRegistry::<Dummy>::builder("Dummy")
            .agent("think", "", vec![], &[], binding)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::ConflictingSelection { .. }));

        let err = TypeRegistry::<Dummy>::builder("Dummy")
            .agent("think", "", vec![], &[], AgentBinding::new([]))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::NoTargets { .. }));
    }

    #[test]
    fn test_members_difference() {
        let registry = registry();
        let all = registry.all_members();
        let stats = registry.resolve_tag(&Tag::new("stats")).unwrap();
        let rest = all.difference(&stats);
        assert!(!rest.fields.contains("counter"));
        assert!(rest.fields.contains("notes"));
        assert!(!rest.methods.contains("bump"));
    }
}
