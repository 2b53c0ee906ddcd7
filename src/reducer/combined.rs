use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::Reducer;
use crate::action::{types, Action};
use crate::error::{Result, StoreError};
use crate::state::{conform, StateTree};

/// The point-wise application of every registered reducer.
///
/// Keys in the tree that no reducer owns are carried over untouched.
pub struct CombinedReducer {
    reducers: Vec<(String, Arc<dyn Reducer>)>,
}

impl CombinedReducer {
    pub(crate) fn new(reducers: Vec<(String, Arc<dyn Reducer>)>) -> Self {
        Self { reducers }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.reducers.iter().map(|(key, _)| key.as_str())
    }

    /// Whether some reducer owns `key`.
    pub fn owns(&self, key: &str) -> bool {
        self.reducer(key).is_some()
    }

    fn reducer(&self, key: &str) -> Option<&Arc<dyn Reducer>> {
        self.reducers
            .iter()
            .find(|(owned, _)| owned == key)
            .map(|(_, reducer)| reducer)
    }

    /// Reduce `action` against `tree`, including the store's reserved
    /// handling of normalization and rehydration.
    pub fn apply(
        &self,
        tree: &StateTree,
        action: &Action,
        log_rehydration: bool,
    ) -> Result<StateTree> {
        let tree = if action.is(types::NORMALIZE_STATE) {
            self.normalize(tree)
        } else {
            tree.clone()
        };
        let next = self.reduce(&tree, action)?;
        if action.is(types::REHYDRATE) {
            return Ok(self.rehydrate(&next, action.payload(), log_rehydration));
        }
        Ok(next)
    }

    /// Run every reducer on its own sub-state.
    ///
    /// A reducer returning a structurally equal value keeps the previous
    /// allocation; if nothing changed the input tree itself is returned.
    pub fn reduce(&self, tree: &StateTree, action: &Action) -> Result<StateTree> {
        let mut updates = Vec::new();
        for (key, reducer) in &self.reducers {
            let previous = tree.shared(key);
            let initial;
            let input = match &previous {
                Some(sub) => sub.as_ref(),
                None => {
                    initial = reducer.initial_state();
                    &initial
                }
            };

            let next = reducer
                .reduce(input, action)
                .map_err(|source| StoreError::Reducer {
                    key: key.clone(),
                    source,
                })?;

            if previous.as_deref() != Some(&next) {
                updates.push((key.clone(), Arc::new(next)));
            }
        }
        Ok(tree.with_updates(updates))
    }

    /// Coerce every owned sub-state into its reducer's initial shape.
    pub fn normalize(&self, tree: &StateTree) -> StateTree {
        let updates = self
            .reducers
            .iter()
            .filter_map(|(key, reducer)| {
                conform(tree.entries().get(key), reducer.initial_state())
                    .map(|sub| (key.clone(), sub))
            })
            .collect();
        tree.with_updates(updates)
    }

    /// Fold a persisted snapshot into `tree`.
    ///
    /// Object sub-states are shallow-merged with the snapshot winning; any
    /// other value replaces the sub-state. The result is conformed to the
    /// reducer's initial shape. Keys no reducer owns are skipped.
    pub fn rehydrate(&self, tree: &StateTree, snapshot: &Value, log: bool) -> StateTree {
        let Value::Object(inbound) = snapshot else {
            tracing::debug!("ignoring rehydration payload that is not an object");
            return tree.clone();
        };

        let mut updates = Vec::new();
        for (key, incoming) in inbound {
            let Some(reducer) = self.reducer(key) else {
                tracing::debug!(key = %key, "ignoring rehydrated key with no reducer");
                continue;
            };

            let merged = match (tree.get(key), incoming) {
                (Some(Value::Object(current)), Value::Object(fields)) => {
                    let mut merged = current.clone();
                    merged.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
                    Value::Object(merged)
                }
                _ => incoming.clone(),
            };
            let merged = Arc::new(merged);
            let merged = conform(Some(&merged), reducer.initial_state()).unwrap_or(merged);

            if tree.get(key) == Some(merged.as_ref()) {
                continue;
            }
            if log {
                tracing::info!(key = %key, "rehydrated sub-state");
            }
            updates.push((key.clone(), merged));
        }
        tree.with_updates(updates)
    }
}

impl fmt::Debug for CombinedReducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombinedReducer")
            .field("keys", &self.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReducerError;
    use crate::reducer::{reducer, try_reducer, ReducerRegistry};
    use serde_json::json;

    fn counter() -> Arc<dyn Reducer> {
        reducer(json!(0), |state, action| {
            if action.is("INC") {
                json!(state.as_i64().unwrap_or(0) + 1)
            } else {
                state.clone()
            }
        })
    }

    fn identity(initial: Value) -> Arc<dyn Reducer> {
        reducer(initial, |state, _| state.clone())
    }

    fn combined() -> CombinedReducer {
        ReducerRegistry::new()
            .with("counter", counter())
            .with("settings", identity(json!({ "theme": "light", "lang": "en" })))
            .combine(identity(json!({})))
            .unwrap()
    }

    #[test]
    fn reduce_fills_every_owned_key() {
        let tree = combined().reduce(&StateTree::new(), &Action::new("INIT")).unwrap();
        assert_eq!(tree.get("counter"), Some(&json!(0)));
        assert_eq!(tree.get("settings"), Some(&json!({ "theme": "light", "lang": "en" })));
        assert_eq!(tree.get("apollo"), Some(&json!({})));
    }

    #[test]
    fn unchanged_reduction_shares_tree() {
        let reducer = combined();
        let tree = reducer.reduce(&StateTree::new(), &Action::new("INIT")).unwrap();
        let again = reducer.reduce(&tree, &Action::new("NOOP")).unwrap();
        assert!(again.ptr_eq(&tree));

        let bumped = reducer.reduce(&tree, &Action::new("INC")).unwrap();
        assert!(!bumped.ptr_eq(&tree));
        assert!(bumped.shares(&tree, "settings"));
    }

    #[test]
    fn unowned_keys_survive_reduction() {
        let tree = StateTree::from_json(json!({ "legacy": [1, 2] })).unwrap();
        let next = combined().reduce(&tree, &Action::new("INC")).unwrap();
        assert_eq!(next.get("legacy"), Some(&json!([1, 2])));
    }

    #[test]
    fn reducer_failure_names_key() {
        let failing = ReducerRegistry::new()
            .with(
                "broken",
                try_reducer(json!(null), |_, _| Err(ReducerError::new("boom"))),
            )
            .combine(identity(json!({})))
            .unwrap();

        let err = failing.reduce(&StateTree::new(), &Action::new("ANY")).unwrap_err();
        assert!(matches!(err, StoreError::Reducer { ref key, .. } if key == "broken"));
    }

    #[test]
    fn normalize_is_idempotent() {
        let reducer = combined();
        let tree = StateTree::from_json(json!({ "counter": "7", "settings": { "theme": "dark" } }))
            .unwrap();

        let once = reducer.apply(&tree, &Action::normalize(), false).unwrap();
        let twice = reducer.apply(&once, &Action::normalize(), false).unwrap();

        assert_eq!(once, twice);
        assert_eq!(once.get("counter"), Some(&json!(0)));
        assert_eq!(once.get("settings"), Some(&json!({ "theme": "dark", "lang": "en" })));
    }

    #[test]
    fn rehydrate_merges_objects_and_skips_unknown_keys() {
        let reducer = combined();
        let tree = reducer.reduce(&StateTree::new(), &Action::new("INIT")).unwrap();
        let snapshot = json!({
            "counter": 5,
            "settings": { "theme": "dark" },
            "ghost": { "boo": true },
        });

        let next = reducer.apply(&tree, &Action::rehydrate(snapshot), false).unwrap();

        assert_eq!(next.get("counter"), Some(&json!(5)));
        assert_eq!(next.get("settings"), Some(&json!({ "theme": "dark", "lang": "en" })));
        assert!(!next.contains_key("ghost"));
        assert!(next.shares(&tree, "apollo"));
    }

    #[test]
    fn rehydrate_conforms_restored_values() {
        let reducer = combined();
        let tree = reducer.reduce(&StateTree::new(), &Action::new("INIT")).unwrap();
        let snapshot = json!({ "counter": "oops", "settings": "dark" });

        let next = reducer.apply(&tree, &Action::rehydrate(snapshot), false).unwrap();

        assert!(next.ptr_eq(&tree));
        assert_eq!(next.get("counter"), Some(&json!(0)));
    }
}
