//! Development-time reducer hot reloading.

use std::sync::mpsc;

use crate::error::Result;
use crate::reducer::ReducerRegistry;
use crate::store::Store;

/// Sends replacement registries to a [`HotReload`].
#[derive(Clone)]
pub struct ReloadSender(mpsc::Sender<ReducerRegistry>);

impl ReloadSender {
    /// Signal that the registry changed. Returns `false` once the receiving
    /// side is gone.
    pub fn send(&self, registry: ReducerRegistry) -> bool {
        self.0.send(registry).is_ok()
    }
}

/// Receiving side of a reload signal.
pub struct HotReload(mpsc::Receiver<ReducerRegistry>);

impl HotReload {
    /// Inject every pending registry into `store`, oldest first.
    ///
    /// Returns how many were applied.
    pub fn poll(&self, store: &Store) -> Result<usize> {
        let mut applied = 0;
        while let Ok(registry) = self.0.try_recv() {
            store.inject_reducers(registry)?;
            applied += 1;
        }
        if applied > 0 {
            tracing::info!(applied, "hot reloaded reducers");
        }
        Ok(applied)
    }
}

pub fn reload_channel() -> (ReloadSender, HotReload) {
    let (tx, rx) = mpsc::channel();
    (ReloadSender(tx), HotReload(rx))
}
