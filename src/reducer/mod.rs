//! Reducers, the registry that names them, and their combination.
//!
//! A [`Reducer`] owns one top-level domain of the state tree. The
//! [`ReducerRegistry`] maps domain names to reducers and is combined, along
//! with the client's own reducer, into the single reducer the store runs.

mod combined;
mod reducer;
mod registry;

pub use combined::CombinedReducer;
pub use reducer::{reducer, try_reducer, FnReducer, Reducer};
pub use registry::{ReducerRegistry, CLIENT_KEY};
