use std::fmt;

use serde_json::Value;

use super::Action;
use crate::error::Result;
use crate::store::Store;

/// A deferred action, resolved by the thunk middleware.
///
/// The callable receives the store so it can read state and dispatch
/// further actions; its return value becomes the result of the dispatch.
pub struct Thunk(Box<dyn FnOnce(&Store) -> Result<Value> + Send>);

impl Thunk {
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(&Store) -> Result<Value> + Send + 'static,
    {
        Self(Box::new(f))
    }

    pub(crate) fn call(self, store: &Store) -> Result<Value> {
        (self.0)(store)
    }
}

impl fmt::Debug for Thunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Thunk(..)")
    }
}

/// Create a thunk from a closure.
///
/// # Example
///
/// ```ignore
/// store.dispatch(thunk(|store| {
///     store.dispatch(Action::new("LOAD_START"))?;
///     Ok(Value::Null)
/// }))?;
/// ```
pub fn thunk<F>(f: F) -> Thunk
where
    F: FnOnce(&Store) -> Result<Value> + Send + 'static,
{
    Thunk::new(f)
}

/// Anything that can be handed to [`Store::dispatch`].
#[derive(Debug)]
pub enum Dispatchable {
    Action(Action),
    Thunk(Thunk),
}

impl From<Action> for Dispatchable {
    fn from(action: Action) -> Self {
        Dispatchable::Action(action)
    }
}

impl From<Thunk> for Dispatchable {
    fn from(thunk: Thunk) -> Self {
        Dispatchable::Thunk(thunk)
    }
}

/// Result of a dispatch: the action itself, or whatever a thunk returned.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatched {
    Action(Action),
    Value(Value),
}

impl Dispatched {
    pub fn action(&self) -> Option<&Action> {
        match self {
            Dispatched::Action(action) => Some(action),
            Dispatched::Value(_) => None,
        }
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            Dispatched::Action(_) => None,
            Dispatched::Value(value) => Some(value),
        }
    }
}
