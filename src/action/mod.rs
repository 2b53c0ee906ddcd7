//! Actions and the values that travel through dispatch.
//!
//! Plain [`Action`]s are tagged JSON records. A [`Thunk`] is a deferred
//! action resolved by the thunk middleware before anything reaches the
//! reducers.

mod action;
mod dispatch;

pub use action::{types, Action};
pub use dispatch::{thunk, Dispatchable, Dispatched, Thunk};
