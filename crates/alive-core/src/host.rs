//! Host objects and their memory stores.
//!
//! A host type implements [`Alive`]: it owns a [`Memory`] holding the
//! current value of every declared memory field, and exposes the
//! type-level [`TypeRegistry`] that declares those fields and its methods.
//!
//! The memory store is the only state shared between nesting levels and
//! between concurrently running backend targets. Writes to a single field
//! are atomic; the engine makes no guarantee across several fields.

use std::collections::BTreeMap;

use dashmap::DashMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use alive_types::memory::MemoryField;
use alive_types::schema::{kind_matches, value_kind};

use crate::registry::TypeRegistry;

/// An object whose methods can be run as agents.
///
/// Implementors keep their registry in a `static OnceLock` so it is built
/// once per type:
///
/// ```ignore
/// impl Alive for Counter {
///     fn memory(&self) -> &Memory { &self.memory }
///     fn registry() -> &'static TypeRegistry<Self> {
///         static REGISTRY: OnceLock<TypeRegistry<Counter>> = OnceLock::new();
///         REGISTRY.get_or_init(build_counter_registry)
///     }
/// }
/// ```
pub trait Alive: Send + Sync + Sized + 'static {
    /// This instance's memory values.
    fn memory(&self) -> &Memory;

    /// The declarations shared by every instance of this type.
    fn registry() -> &'static TypeRegistry<Self>;
}

/// Errors from memory reads and writes.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    #[error("no memory field '{0}'")]
    UnknownField(String),

    #[error("field '{field}' expects {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: String,
        actual: &'static str,
    },

    #[error("field '{field}': {source}")]
    Serde {
        field: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone)]
struct Slot {
    value: Value,
    schema: Value,
    value_type: String,
}

/// Per-instance memory values, keyed by field name.
///
/// Only declared fields can be written; writes are checked against the
/// field's declared JSON kind.
#[derive(Debug, Default)]
pub struct Memory {
    slots: DashMap<String, Slot>,
}

impl Memory {
    /// Create a store holding the default of every field.
    pub fn new(fields: &[MemoryField]) -> Self {
        let slots = fields
            .iter()
            .map(|field| {
                (
                    field.name.clone(),
                    Slot {
                        value: field.default.clone(),
                        schema: field.schema.clone(),
                        value_type: field.value_type.clone(),
                    },
                )
            })
            .collect();
        Self { slots }
    }

    /// Create a store for `H` from its registry's field declarations.
    pub fn for_type<H: Alive>() -> Self {
        Self::new(H::registry().fields_of())
    }

    /// Current value of a field.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.slots.get(name).map(|slot| slot.value.clone())
    }

    /// Current value of a field, deserialized as `T`.
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> Result<T, MemoryError> {
        let value = self
            .get(name)
            .ok_or_else(|| MemoryError::UnknownField(name.to_string()))?;
        serde_json::from_value(value).map_err(|source| MemoryError::Serde {
            field: name.to_string(),
            source,
        })
    }

    /// Replace the value of a declared field.
    pub fn set<T: Serialize>(&self, name: &str, value: T) -> Result<(), MemoryError> {
        let value = serde_json::to_value(value).map_err(|source| MemoryError::Serde {
            field: name.to_string(),
            source,
        })?;
        let mut slot = self
            .slots
            .get_mut(name)
            .ok_or_else(|| MemoryError::UnknownField(name.to_string()))?;
        check_kind(name, &slot, &value)?;
        slot.value = value;
        Ok(())
    }

    /// Apply `f` to a field's value while holding its entry lock.
    ///
    /// Returns the new value. The update is discarded if the result no
    /// longer matches the field's declared kind.
    pub fn update<F>(&self, name: &str, f: F) -> Result<Value, MemoryError>
    where
        F: FnOnce(&mut Value),
    {
        let mut slot = self
            .slots
            .get_mut(name)
            .ok_or_else(|| MemoryError::UnknownField(name.to_string()))?;
        let mut next = slot.value.clone();
        f(&mut next);
        check_kind(name, &slot, &next)?;
        slot.value = next.clone();
        Ok(next)
    }

    /// Copy the current values of the named fields.
    ///
    /// Unknown names are skipped.
    pub fn snapshot<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> BTreeMap<String, Value> {
        names
            .into_iter()
            .filter_map(|name| self.get(name).map(|value| (name.to_string(), value)))
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }
}

fn check_kind(name: &str, slot: &Slot, value: &Value) -> Result<(), MemoryError> {
    if kind_matches(&slot.schema, value) {
        Ok(())
    } else {
        Err(MemoryError::TypeMismatch {
            field: name.to_string(),
            expected: slot.value_type.clone(),
            actual: value_kind(value),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields() -> Vec<MemoryField> {
        vec![
            MemoryField::new("counter", 0i64).unwrap(),
            MemoryField::new("notes", Vec::<String>::new()).unwrap(),
        ]
    }

    #[test]
    fn test_new_memory_holds_defaults() {
        let memory = Memory::new(&fields());
        assert_eq!(memory.get("counter"), Some(json!(0)));
        assert_eq!(memory.get("notes"), Some(json!([])));
        assert!(memory.get("ghost").is_none());
    }

    #[test]
    fn test_set_and_get_as() {
        let memory = Memory::new(&fields());
        memory.set("counter", 5).unwrap();
        assert_eq!(memory.get_as::<i64>("counter").unwrap(), 5);
        memory.set("notes", vec!["a", "b"]).unwrap();
        assert_eq!(
            memory.get_as::<Vec<String>>("notes").unwrap(),
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn test_set_rejects_unknown_field_and_wrong_kind() {
        let memory = Memory::new(&fields());
        assert!(matches!(
            memory.set("ghost", 1),
            Err(MemoryError::UnknownField(_))
        ));
        assert!(matches!(
            memory.set("counter", "many"),
            Err(MemoryError::TypeMismatch { .. })
        ));
        assert_eq!(memory.get("counter"), Some(json!(0)));
    }

    #[test]
    fn test_update_returns_new_value() {
        let memory = Memory::new(&fields());
        let next = memory
            .update("counter", |v| *v = json!(v.as_i64().unwrap_or(0) + 1))
            .unwrap();
        assert_eq!(next, json!(1));
        assert_eq!(memory.get("counter"), Some(json!(1)));
    }

    #[test]
    fn test_snapshot_skips_unknown_names() {
        let memory = Memory::new(&fields());
        let snapshot = memory.snapshot(["counter", "ghost"]);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot["counter"], json!(0));
    }
}
