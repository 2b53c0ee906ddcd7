//! The state container and its collaborators.
//!
//! [`Store`] assembles the reducer registry, the fixed middleware chain and
//! an optional persisted snapshot into a single container. Around it sit
//! platform configuration, snapshot storage, the client capability and the
//! development-time reload signal.

mod client;
mod config;
mod persist;
mod reload;
mod store;

pub use client::{Client, DetachedClient};
pub use config::{Mode, Platform, StoreConfig, Target};
pub use persist::{FileStorage, MemoryStorage, SnapshotSource, Storage};
pub use reload::{reload_channel, HotReload, ReloadSender};
pub use store::{Store, StoreOptions, Subscription};
