use super::{Middleware, Next};
use crate::action::{Dispatchable, Dispatched};
use crate::error::Result;
use crate::store::Store;

/// Resolves [`Thunk`](crate::Thunk)s by calling them with the store.
///
/// Plain actions are forwarded. The thunk's return value becomes the
/// result of the dispatch.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThunkMiddleware;

impl Middleware for ThunkMiddleware {
    fn name(&self) -> &'static str {
        "thunk"
    }

    fn handle(&self, store: &Store, item: Dispatchable, next: Next<'_>) -> Result<Dispatched> {
        match item {
            Dispatchable::Thunk(thunk) => thunk.call(store).map(Dispatched::Value),
            action => next.run(action),
        }
    }
}
