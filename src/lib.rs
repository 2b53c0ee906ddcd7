//! # Larder
//!
//! A rehydrating, middleware-composed state container.
//!
//! A [`Store`] is built from a [`ReducerRegistry`] of named reducers, each
//! owning one top-level domain of an immutable [`StateTree`]. Dispatch runs
//! through a fixed middleware chain:
//!
//! - thunk resolution
//! - batch flattening
//! - the data client's own hook
//! - history synchronization
//! - an action buffer that holds everything until rehydration
//!
//! Reducers can be injected at runtime without losing accumulated state or
//! subscribers.
//!
//! ```
//! use std::sync::Arc;
//! use larder::{
//!     reducer, Action, DetachedClient, MemoryHistory, ReducerRegistry, Store, StoreOptions,
//! };
//! use serde_json::json;
//!
//! let counter = reducer(json!(0), |state, action| {
//!     if action.is("INC") { json!(state.as_i64().unwrap_or(0) + 1) } else { state.clone() }
//! });
//! let store = Store::configure(StoreOptions::new(
//!     ReducerRegistry::new().with("counter", counter),
//!     Arc::new(MemoryHistory::default()),
//!     Arc::new(DetachedClient),
//! ))?;
//! store.rehydrate()?;
//!
//! store.dispatch(Action::new("INC"))?;
//! assert_eq!(store.state().get("counter"), Some(&json!(1)));
//! # Ok::<(), larder::StoreError>(())
//! ```

pub mod action;
pub mod error;
pub mod middleware;
pub mod reducer;
pub mod state;
pub mod store;

// Re-export main types for convenience
pub use action::{thunk, types, Action, Dispatchable, Dispatched, Thunk};
pub use error::{ReducerError, Result, StorageError, StoreError};
pub use middleware::{History, MemoryHistory, Middleware, Next};
pub use reducer::{reducer, try_reducer, Reducer, ReducerRegistry, CLIENT_KEY};
pub use state::StateTree;
pub use store::{
    reload_channel, Client, DetachedClient, FileStorage, HotReload, MemoryStorage, Platform,
    SnapshotSource, Storage, Store, StoreConfig, StoreOptions, Subscription,
};
