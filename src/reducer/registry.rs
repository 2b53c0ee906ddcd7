use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::{CombinedReducer, Reducer};
use crate::error::{Result, StoreError};

/// Domain key under which the client capability's reducer is mounted.
pub const CLIENT_KEY: &str = "apollo";

/// Mapping from unique domain name to the reducer that owns it.
///
/// The registry is a plain value: construction takes one, injection merges
/// one in, and dispatch never touches it.
#[derive(Clone, Default)]
pub struct ReducerRegistry {
    reducers: BTreeMap<String, Arc<dyn Reducer>>,
}

impl ReducerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, reducer: Arc<dyn Reducer>) -> Self {
        self.insert(key, reducer);
        self
    }

    /// Insert or overwrite the reducer for `key`.
    pub fn insert(&mut self, key: impl Into<String>, reducer: Arc<dyn Reducer>) {
        self.reducers.insert(key.into(), reducer);
    }

    pub fn get(&self, key: &str) -> Option<&Arc<dyn Reducer>> {
        self.reducers.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.reducers.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.reducers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.reducers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reducers.is_empty()
    }

    /// A new registry holding `self` overlaid with `delta`.
    ///
    /// Keys only in `delta` are added; keys in both take `delta`'s reducer.
    pub fn merge(&self, delta: &ReducerRegistry) -> ReducerRegistry {
        let mut merged = self.clone();
        for (key, reducer) in &delta.reducers {
            merged.reducers.insert(key.clone(), Arc::clone(reducer));
        }
        merged
    }

    /// Fail if any key collides with [`CLIENT_KEY`].
    pub fn check_reserved(&self) -> Result<()> {
        if self.reducers.contains_key(CLIENT_KEY) {
            return Err(StoreError::ReservedKey(CLIENT_KEY.to_string()));
        }
        Ok(())
    }

    /// Combine every entry plus `client` mounted under [`CLIENT_KEY`].
    pub fn combine(&self, client: Arc<dyn Reducer>) -> Result<CombinedReducer> {
        self.check_reserved()?;
        let mut reducers: Vec<(String, Arc<dyn Reducer>)> = self
            .reducers
            .iter()
            .map(|(key, reducer)| (key.clone(), Arc::clone(reducer)))
            .collect();
        reducers.push((CLIENT_KEY.to_string(), client));
        Ok(CombinedReducer::new(reducers))
    }
}

impl<K: Into<String>> FromIterator<(K, Arc<dyn Reducer>)> for ReducerRegistry {
    fn from_iter<I: IntoIterator<Item = (K, Arc<dyn Reducer>)>>(iter: I) -> Self {
        let mut registry = Self::new();
        for (key, reducer) in iter {
            registry.insert(key, reducer);
        }
        registry
    }
}

impl fmt::Debug for ReducerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.reducers.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reducer::reducer;
    use serde_json::{json, Value};

    fn constant(value: Value) -> Arc<dyn Reducer> {
        reducer(value, |state, _| state.clone())
    }

    #[test]
    fn merge_adds_and_overwrites() {
        let base = ReducerRegistry::new()
            .with("a", constant(json!(1)))
            .with("b", constant(json!(2)));
        let delta = ReducerRegistry::new()
            .with("b", constant(json!(20)))
            .with("c", constant(json!(3)));

        let merged = base.merge(&delta);

        assert_eq!(merged.keys().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(merged.get("b").unwrap().initial_state(), json!(20));
        assert_eq!(base.get("b").unwrap().initial_state(), json!(2));
        assert_eq!(base.len(), 2);
    }

    #[test]
    fn combine_rejects_reserved_key() {
        let registry = ReducerRegistry::new().with(CLIENT_KEY, constant(json!(null)));
        let err = registry.combine(constant(json!({}))).unwrap_err();
        assert!(matches!(err, StoreError::ReservedKey(key) if key == CLIENT_KEY));
    }

    #[test]
    fn combine_mounts_client_reducer() {
        let registry = ReducerRegistry::new().with("todos", constant(json!([])));
        let combined = registry.combine(constant(json!({}))).unwrap();
        assert!(combined.owns("todos"));
        assert!(combined.owns(CLIENT_KEY));
    }
}
