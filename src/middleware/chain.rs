use std::sync::Arc;

use crate::action::{Dispatchable, Dispatched};
use crate::error::Result;
use crate::store::Store;

/// A step in the dispatch pipeline.
///
/// A middleware may pass the item on with [`Next::run`], transform it,
/// swallow it, or dispatch new items from the top of the chain through
/// `store`.
pub trait Middleware: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    fn handle(&self, store: &Store, item: Dispatchable, next: Next<'_>) -> Result<Dispatched>;
}

/// The remainder of the chain after the current middleware.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    store: &'a Store,
    rest: &'a [Arc<dyn Middleware>],
}

impl<'a> Next<'a> {
    pub(crate) fn new(store: &'a Store, rest: &'a [Arc<dyn Middleware>]) -> Self {
        Self { store, rest }
    }

    /// Hand `item` to the next middleware, or to the reducer at the end.
    pub fn run(self, item: Dispatchable) -> Result<Dispatched> {
        match self.rest.split_first() {
            Some((head, tail)) => head.handle(self.store, item, Next::new(self.store, tail)),
            None => self.store.reduce_dispatchable(item),
        }
    }
}

/// A middleware that forwards everything untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassThrough;

impl Middleware for PassThrough {
    fn name(&self) -> &'static str {
        "pass-through"
    }

    fn handle(&self, _store: &Store, item: Dispatchable, next: Next<'_>) -> Result<Dispatched> {
        next.run(item)
    }
}
