//! The GraphQL client capability the store mounts.

use std::sync::Arc;

use serde_json::json;

use crate::middleware::{Middleware, PassThrough};
use crate::reducer::{reducer, Reducer};

/// A data client that keeps its own sub-state in the store.
///
/// Its reducer is mounted under [`CLIENT_KEY`](crate::CLIENT_KEY) and its
/// middleware runs between array flattening and history synchronization.
pub trait Client: Send + Sync {
    fn reducer(&self) -> Arc<dyn Reducer>;
    fn middleware(&self) -> Arc<dyn Middleware>;
}

/// A client with no remote side: an empty-object sub-state and a
/// pass-through middleware.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedClient;

impl Client for DetachedClient {
    fn reducer(&self) -> Arc<dyn Reducer> {
        reducer(json!({}), |state, _| state.clone())
    }

    fn middleware(&self) -> Arc<dyn Middleware> {
        Arc::new(PassThrough)
    }
}
