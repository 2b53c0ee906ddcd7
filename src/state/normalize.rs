use std::mem;
use std::sync::Arc;

use serde_json::Value;

/// Coerce `current` into the shape of a reducer's `initial` state.
///
/// Returns `None` when `current` already conforms, so conforming sub-states
/// keep their allocation. A `null` initial state accepts anything.
pub(crate) fn conform(current: Option<&Arc<Value>>, initial: Value) -> Option<Arc<Value>> {
    let Some(current) = current else {
        return Some(Arc::new(initial));
    };
    if initial.is_null() {
        return None;
    }
    if mem::discriminant(current.as_ref()) != mem::discriminant(&initial) {
        return Some(Arc::new(initial));
    }

    match (current.as_ref(), initial) {
        (Value::Object(fields), Value::Object(defaults)) => {
            let missing: Vec<_> = defaults
                .into_iter()
                .filter(|(key, _)| !fields.contains_key(key))
                .collect();
            if missing.is_empty() {
                return None;
            }
            let mut filled = fields.clone();
            filled.extend(missing);
            Some(Arc::new(Value::Object(filled)))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_sub_state_takes_initial() {
        assert_eq!(conform(None, json!(0)), Some(Arc::new(json!(0))));
    }

    #[test]
    fn kind_mismatch_takes_initial() {
        let current = Arc::new(json!("3"));
        assert_eq!(conform(Some(&current), json!(0)), Some(Arc::new(json!(0))));
    }

    #[test]
    fn objects_gain_missing_fields_only() {
        let current = Arc::new(json!({ "items": [1], "filter": "done" }));
        let filled = conform(
            Some(&current),
            json!({ "items": [], "filter": "all", "loading": false }),
        )
        .unwrap();

        assert_eq!(
            *filled,
            json!({ "items": [1], "filter": "done", "loading": false })
        );
        assert_eq!(conform(Some(&filled), json!({ "loading": true })), None);
    }

    #[test]
    fn null_initial_accepts_anything() {
        let current = Arc::new(json!([1, 2, 3]));
        assert_eq!(conform(Some(&current), Value::Null), None);
    }
}
