use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reserved action types handled by the store itself.
pub mod types {
    /// Replaces matching sub-states with persisted data.
    pub const REHYDRATE: &str = "@@larder/REHYDRATE";
    /// Coerces sub-states into the shape of their reducer's initial state.
    pub const NORMALIZE_STATE: &str = "@@larder/NORMALIZE_STATE";
    /// Reduced once after the reducer set changes.
    pub const REPLACE: &str = "@@larder/REPLACE";
    /// Carries an ordered sequence of actions as its payload.
    pub const BATCH: &str = "@@larder/BATCH";
}

/// A tagged record with a `type` discriminator and an arbitrary payload.
///
/// When parsed from its record form, top-level fields other than `type`
/// and `payload` are folded into an object (or absent) payload, with the
/// payload's own fields winning. They are dropped if the payload is any
/// other JSON value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawAction")]
pub struct Action {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    payload: Value,
}

#[derive(Deserialize)]
struct RawAction {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: Value,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<RawAction> for Action {
    fn from(raw: RawAction) -> Self {
        let RawAction {
            kind,
            payload,
            mut extra,
        } = raw;
        let payload = match payload {
            _ if extra.is_empty() => payload,
            Value::Null => Value::Object(extra),
            Value::Object(fields) => {
                extra.extend(fields);
                Value::Object(extra)
            }
            other => {
                tracing::debug!(
                    action = %kind,
                    "dropping top-level fields beside a non-object payload"
                );
                other
            }
        };
        Self { kind, payload }
    }
}

impl Action {
    /// Create an action with no payload.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            payload: Value::Null,
        }
    }

    /// Create an action carrying `payload`.
    pub fn with_payload(kind: impl Into<String>, payload: Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }

    /// Bundle `actions` into a single batch action.
    ///
    /// The array middleware expands it back into independent dispatches,
    /// in order.
    pub fn batch(actions: impl IntoIterator<Item = Action>) -> Self {
        let payload = actions
            .into_iter()
            .map(|action| action.to_value())
            .collect::<Vec<_>>();
        Self::with_payload(types::BATCH, Value::Array(payload))
    }

    pub fn rehydrate(snapshot: Value) -> Self {
        Self::with_payload(types::REHYDRATE, snapshot)
    }

    pub fn normalize() -> Self {
        Self::new(types::NORMALIZE_STATE)
    }

    pub(crate) fn replace() -> Self {
        Self::new(types::REPLACE)
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Whether this action has the given type.
    pub fn is(&self, kind: &str) -> bool {
        self.kind == kind
    }

    /// Look up a field of an object payload.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.payload.get(name)
    }

    pub fn to_value(&self) -> Value {
        let mut record = serde_json::Map::new();
        record.insert("type".to_string(), Value::String(self.kind.clone()));
        if !self.payload.is_null() {
            record.insert("payload".to_string(), self.payload.clone());
        }
        Value::Object(record)
    }

    /// Parse an action from its JSON record form.
    pub fn from_value(value: Value) -> Option<Self> {
        serde_json::from_value(value).ok()
    }
}
