//! Error types surfaced by the store and its collaborators.

use thiserror::Error;

/// Failure raised by a reducer while computing its next sub-state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ReducerError(String);

impl ReducerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Errors raised by [`Storage`](crate::Storage) backends.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage lock was poisoned")]
    LockPoisoned,
}

/// Errors surfaced by store construction, dispatch and injection.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("reducer key `{0}` collides with the reserved client key")]
    ReservedKey(String),

    #[error("persisted snapshot is malformed: {0}")]
    MalformedSnapshot(String),

    #[error("reducer `{key}` failed: {source}")]
    Reducer {
        key: String,
        #[source]
        source: ReducerError,
    },

    #[error("batch action payload must be an array of actions: {0}")]
    MalformedBatch(String),

    #[error("thunk reached the end of the middleware chain unresolved")]
    UnresolvedThunk,

    #[error("middleware `{name}` failed: {message}")]
    Middleware { name: &'static str, message: String },

    #[error("history navigation failed: {0}")]
    History(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type Result<T> = std::result::Result<T, StoreError>;
