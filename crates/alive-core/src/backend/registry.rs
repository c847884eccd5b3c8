//! Backend registry for runtime lookup by [`BackendRef`].

use std::collections::HashMap;

use alive_types::agent::BackendRef;

use super::box_backend::BoxBackend;

/// Registered backends, keyed by `provider` or `provider:model`.
///
/// Lookup tries the full reference first and then the bare provider, so a
/// backend registered as `"openai"` serves `openai:gpt-4o` and
/// `openai:gpt-4o-mini` alike.
pub struct BackendRegistry {
    backends: HashMap<String, BoxBackend>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self {
            backends: HashMap::new(),
        }
    }

    /// Register a backend under `key`, replacing any previous one.
    pub fn register(&mut self, key: impl Into<String>, backend: BoxBackend) {
        self.backends.insert(key.into(), backend);
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, key: impl Into<String>, backend: BoxBackend) -> Self {
        self.register(key, backend);
        self
    }

    pub fn get(&self, key: &str) -> Option<&BoxBackend> {
        self.backends.get(key)
    }

    /// Find the backend serving `target`.
    pub fn lookup(&self, target: &BackendRef) -> Option<&BoxBackend> {
        self.backends
            .get(&target.to_string())
            .or_else(|| self.backends.get(&target.provider))
    }

    pub fn contains(&self, target: &BackendRef) -> bool {
        self.lookup(target).is_some()
    }

    /// Registered keys, sorted.
    pub fn list_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.backends.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("backends", &self.list_names())
            .finish()
    }
}
