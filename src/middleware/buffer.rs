use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{Middleware, Next};
use crate::action::{Action, Dispatchable, Dispatched};
use crate::error::Result;
use crate::store::Store;

/// Holds every action until a breaker action is seen.
///
/// Once the breaker passes, queued actions replay through the rest of the
/// chain in FIFO order, exactly once. Actions arriving while the replay is
/// still running join the back of the queue, so they reach the reducers
/// after everything queued before them. Afterwards actions pass straight
/// through.
///
/// A failing replayed action does not stop the replay; the first error
/// seen (the breaker's own included) is returned once the queue is drained.
pub struct ActionBuffer {
    breaker: String,
    state: Mutex<BufferState>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum Phase {
    #[default]
    Buffering,
    Replaying,
    Released,
}

#[derive(Default)]
struct BufferState {
    phase: Phase,
    queue: VecDeque<Action>,
}

impl ActionBuffer {
    pub fn new(breaker: impl Into<String>) -> Self {
        Self {
            breaker: breaker.into(),
            state: Mutex::new(BufferState::default()),
        }
    }

    /// Number of actions waiting to be replayed.
    pub fn pending(&self) -> usize {
        self.lock().queue.len()
    }

    /// Whether the replay has finished and actions pass straight through.
    pub fn is_released(&self) -> bool {
        self.lock().phase == Phase::Released
    }

    fn lock(&self) -> MutexGuard<'_, BufferState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn replay(&self, next: Next<'_>) -> Result<()> {
        let mut first_error = None;
        let mut count = 0usize;
        loop {
            let action = {
                let mut state = self.lock();
                match state.queue.pop_front() {
                    Some(action) => action,
                    None => {
                        state.phase = Phase::Released;
                        break;
                    }
                }
            };
            count += 1;
            if let Err(err) = next.run(Dispatchable::Action(action)) {
                tracing::debug!(error = %err, "buffered action failed during replay");
                first_error.get_or_insert(err);
            }
        }
        tracing::trace!(count, "replayed buffered actions");
        first_error.map_or(Ok(()), Err)
    }
}

impl Middleware for ActionBuffer {
    fn name(&self) -> &'static str {
        "action-buffer"
    }

    fn handle(&self, _store: &Store, item: Dispatchable, next: Next<'_>) -> Result<Dispatched> {
        let action = match item {
            Dispatchable::Action(action) => action,
            thunk => return next.run(thunk),
        };

        {
            let mut state = self.lock();
            match state.phase {
                Phase::Released => {
                    drop(state);
                    return next.run(Dispatchable::Action(action));
                }
                Phase::Buffering if action.is(&self.breaker) => {
                    state.phase = Phase::Replaying;
                }
                _ => {
                    tracing::trace!(action = action.kind(), "buffering until {}", self.breaker);
                    state.queue.push_back(action.clone());
                    return Ok(Dispatched::Action(action));
                }
            }
        }

        let result = next.run(Dispatchable::Action(action));
        let replayed = self.replay(next);
        let dispatched = result?;
        replayed?;
        Ok(dispatched)
    }
}
