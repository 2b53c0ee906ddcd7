use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, StoreError};

/// Immutable state tree keyed by top-level domain name.
///
/// Updates are copy-on-write: the domain map and every sub-state sit behind
/// their own `Arc`, so a new tree shares every sub-state it did not replace
/// with the tree it was derived from. Holders of an older tree keep a valid,
/// unchanged snapshot.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateTree {
    domains: Arc<BTreeMap<String, Arc<Value>>>,
}

impl StateTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from a JSON object, one domain per top-level field.
    pub fn from_json(value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) => {
                let domains = fields
                    .into_iter()
                    .map(|(key, sub)| (key, Arc::new(sub)))
                    .collect();
                Ok(Self {
                    domains: Arc::new(domains),
                })
            }
            other => Err(StoreError::MalformedSnapshot(format!(
                "expected a JSON object, found {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.domains.get(key).map(|sub| sub.as_ref())
    }

    /// Shared handle to a sub-state.
    pub fn shared(&self, key: &str) -> Option<Arc<Value>> {
        self.domains.get(key).cloned()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.domains.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.domains.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    /// Whether both trees hold the very same allocation for `key`.
    pub fn shares(&self, other: &StateTree, key: &str) -> bool {
        match (self.domains.get(key), other.domains.get(key)) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Whether both trees are the same allocation.
    pub fn ptr_eq(&self, other: &StateTree) -> bool {
        Arc::ptr_eq(&self.domains, &other.domains)
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.domains
                .iter()
                .map(|(key, sub)| (key.clone(), sub.as_ref().clone()))
                .collect(),
        )
    }

    pub(crate) fn entries(&self) -> &BTreeMap<String, Arc<Value>> {
        &self.domains
    }

    /// Derive a tree with `updates` applied, sharing everything else.
    pub(crate) fn with_updates(&self, updates: Vec<(String, Arc<Value>)>) -> Self {
        if updates.is_empty() {
            return self.clone();
        }
        let mut next = self.clone();
        let domains = Arc::make_mut(&mut next.domains);
        for (key, sub) in updates {
            domains.insert(key, sub);
        }
        next
    }
}

impl fmt::Debug for StateTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.domains.iter()).finish()
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn updates_share_untouched_domains() {
        let tree = StateTree::from_json(json!({ "a": 1, "b": { "x": true } })).unwrap();
        let next = tree.with_updates(vec![("a".to_string(), Arc::new(json!(2)))]);

        assert_eq!(next.get("a"), Some(&json!(2)));
        assert_eq!(tree.get("a"), Some(&json!(1)));
        assert!(next.shares(&tree, "b"));
        assert!(!next.shares(&tree, "a"));
    }

    #[test]
    fn empty_update_keeps_allocation() {
        let tree = StateTree::from_json(json!({ "a": 1 })).unwrap();
        assert!(tree.with_updates(Vec::new()).ptr_eq(&tree));
    }

    #[test]
    fn rejects_non_object_snapshot() {
        let err = StateTree::from_json(json!([1, 2])).unwrap_err();
        assert!(matches!(err, StoreError::MalformedSnapshot(_)));
    }

    #[test]
    fn serializes_as_plain_object() {
        let tree = StateTree::from_json(json!({ "counter": 3 })).unwrap();
        assert_eq!(serde_json::to_value(&tree).unwrap(), json!({ "counter": 3 }));
        assert_eq!(tree.to_json(), json!({ "counter": 3 }));

        let back: StateTree = serde_json::from_value(json!({ "counter": 3 })).unwrap();
        assert_eq!(back, tree);
    }
}
