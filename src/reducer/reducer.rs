use std::sync::Arc;

use serde_json::Value;

use crate::action::Action;
use crate::error::ReducerError;

/// A pure function from (current sub-state, action) to the next sub-state.
pub trait Reducer: Send + Sync {
    /// The sub-state used when the tree holds nothing for this domain yet.
    fn initial_state(&self) -> Value;

    /// Compute the next sub-state.
    ///
    /// Actions a reducer does not recognise must return `state` unchanged.
    fn reduce(&self, state: &Value, action: &Action) -> Result<Value, ReducerError>;
}

/// A reducer backed by a closure and an initial state.
pub struct FnReducer<F> {
    initial: Value,
    reduce: F,
}

impl<F> FnReducer<F>
where
    F: Fn(&Value, &Action) -> Result<Value, ReducerError> + Send + Sync,
{
    pub fn new(initial: Value, reduce: F) -> Self {
        Self { initial, reduce }
    }
}

impl<F> Reducer for FnReducer<F>
where
    F: Fn(&Value, &Action) -> Result<Value, ReducerError> + Send + Sync,
{
    fn initial_state(&self) -> Value {
        self.initial.clone()
    }

    fn reduce(&self, state: &Value, action: &Action) -> Result<Value, ReducerError> {
        (self.reduce)(state, action)
    }
}

/// Create an infallible reducer.
///
/// # Example
///
/// ```
/// use larder::{reducer, Action, Reducer};
/// use serde_json::json;
///
/// let counter = reducer(json!(0), |state, action| {
///     if action.is("INC") {
///         json!(state.as_i64().unwrap_or(0) + 1)
///     } else {
///         state.clone()
///     }
/// });
/// assert_eq!(counter.reduce(&json!(1), &Action::new("INC")).unwrap(), json!(2));
/// ```
pub fn reducer<F>(initial: Value, reduce: F) -> Arc<dyn Reducer>
where
    F: Fn(&Value, &Action) -> Value + Send + Sync + 'static,
{
    Arc::new(FnReducer::new(initial, move |state: &Value, action: &Action| {
        Ok(reduce(state, action))
    }))
}

/// Create a reducer that may fail.
pub fn try_reducer<F>(initial: Value, reduce: F) -> Arc<dyn Reducer>
where
    F: Fn(&Value, &Action) -> Result<Value, ReducerError> + Send + Sync + 'static,
{
    Arc::new(FnReducer::new(initial, reduce))
}
