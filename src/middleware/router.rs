use std::sync::{Arc, Mutex, PoisonError};

use serde_json::{json, Value};

use super::{Middleware, Next};
use crate::action::{Action, Dispatchable, Dispatched};
use crate::error::{Result, StoreError};
use crate::store::Store;

/// Action type asking the history middleware to navigate.
pub const CALL_HISTORY_METHOD: &str = "@@router/CALL_HISTORY_METHOD";

/// Navigation history capability.
pub trait History: Send + Sync {
    fn push(&self, path: &str) -> Result<()>;
    fn replace(&self, path: &str) -> Result<()>;
    /// Move `delta` entries through the history stack.
    fn go(&self, delta: i64) -> Result<()>;

    fn go_back(&self) -> Result<()> {
        self.go(-1)
    }

    fn go_forward(&self) -> Result<()> {
        self.go(1)
    }
}

fn history_call(method: &str, args: Value) -> Action {
    Action::with_payload(CALL_HISTORY_METHOD, json!({ "method": method, "args": args }))
}

pub fn push(path: impl Into<String>) -> Action {
    history_call("push", json!([path.into()]))
}

pub fn replace(path: impl Into<String>) -> Action {
    history_call("replace", json!([path.into()]))
}

pub fn go(delta: i64) -> Action {
    history_call("go", json!([delta]))
}

pub fn go_back() -> Action {
    history_call("goBack", json!([]))
}

pub fn go_forward() -> Action {
    history_call("goForward", json!([]))
}

/// Routes [`CALL_HISTORY_METHOD`] actions to a [`History`].
///
/// Navigation actions are consumed here and never reach the reducers.
pub struct RouterMiddleware {
    history: Arc<dyn History>,
}

impl RouterMiddleware {
    pub fn new(history: Arc<dyn History>) -> Self {
        Self { history }
    }

    fn call(&self, action: &Action) -> Result<()> {
        let method = action
            .field("method")
            .and_then(Value::as_str)
            .ok_or_else(|| StoreError::History("missing history method".to_string()))?;
        let arg = action
            .field("args")
            .and_then(Value::as_array)
            .and_then(|args| args.first());

        match (method, arg) {
            ("push", Some(Value::String(path))) => self.history.push(path),
            ("replace", Some(Value::String(path))) => self.history.replace(path),
            ("go", Some(delta)) => {
                let delta = delta
                    .as_i64()
                    .ok_or_else(|| StoreError::History(format!("invalid go delta {delta}")))?;
                self.history.go(delta)
            }
            ("goBack", _) => self.history.go_back(),
            ("goForward", _) => self.history.go_forward(),
            (method, _) => Err(StoreError::History(format!(
                "unsupported history call `{method}`"
            ))),
        }
    }
}

impl Middleware for RouterMiddleware {
    fn name(&self) -> &'static str {
        "router"
    }

    fn handle(&self, _store: &Store, item: Dispatchable, next: Next<'_>) -> Result<Dispatched> {
        match item {
            Dispatchable::Action(action) if action.is(CALL_HISTORY_METHOD) => {
                self.call(&action)?;
                Ok(Dispatched::Action(action))
            }
            other => next.run(other),
        }
    }
}

/// In-memory history stack, for servers and tests.
pub struct MemoryHistory {
    stack: Mutex<HistoryStack>,
}

struct HistoryStack {
    entries: Vec<String>,
    index: usize,
}

impl MemoryHistory {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            stack: Mutex::new(HistoryStack {
                entries: vec![initial.into()],
                index: 0,
            }),
        }
    }

    /// The current location.
    pub fn location(&self) -> String {
        let stack = self.stack.lock().unwrap_or_else(PoisonError::into_inner);
        stack.entries[stack.index].clone()
    }

    /// Number of entries on the stack.
    pub fn depth(&self) -> usize {
        self.stack.lock().unwrap_or_else(PoisonError::into_inner).entries.len()
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new("/")
    }
}

impl History for MemoryHistory {
    fn push(&self, path: &str) -> Result<()> {
        let mut stack = self.stack.lock().unwrap_or_else(PoisonError::into_inner);
        let keep = stack.index + 1;
        stack.entries.truncate(keep);
        stack.entries.push(path.to_string());
        stack.index = keep;
        Ok(())
    }

    fn replace(&self, path: &str) -> Result<()> {
        let mut stack = self.stack.lock().unwrap_or_else(PoisonError::into_inner);
        let index = stack.index;
        stack.entries[index] = path.to_string();
        Ok(())
    }

    fn go(&self, delta: i64) -> Result<()> {
        let mut stack = self.stack.lock().unwrap_or_else(PoisonError::into_inner);
        // Out-of-range moves are ignored, as in browsers.
        let target = i64::try_from(stack.index)
            .ok()
            .and_then(|index| index.checked_add(delta))
            .and_then(|target| usize::try_from(target).ok())
            .filter(|&target| target < stack.entries.len());
        if let Some(target) = target {
            stack.index = target;
        }
        Ok(())
    }
}
