//! The dispatch middleware chain.
//!
//! The store runs a fixed chain, in order:
//! 1. [`ThunkMiddleware`] resolves deferred actions
//! 2. [`ArrayMiddleware`] expands batch actions into separate dispatches
//! 3. the client capability's own interception hook
//! 4. [`RouterMiddleware`] turns navigation actions into history calls
//! 5. [`ActionBuffer`] holds everything until rehydration completes

mod array;
mod buffer;
mod chain;
mod router;
mod thunk;

pub use array::ArrayMiddleware;
pub use buffer::ActionBuffer;
pub use chain::{Middleware, Next, PassThrough};
pub use router::{
    go, go_back, go_forward, push, replace, History, MemoryHistory, RouterMiddleware,
    CALL_HISTORY_METHOD,
};
pub use thunk::ThunkMiddleware;
