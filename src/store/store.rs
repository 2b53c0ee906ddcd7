use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use serde_json::Value;

use super::client::Client;
use super::config::StoreConfig;
use super::persist::{write_snapshot, SnapshotSource, Storage};
use crate::action::{types, Action, Dispatchable, Dispatched};
use crate::error::{Result, StoreError};
use crate::middleware::{
    ActionBuffer, ArrayMiddleware, History, Middleware, Next, RouterMiddleware, ThunkMiddleware,
};
use crate::reducer::{CombinedReducer, Reducer, ReducerRegistry};
use crate::state::StateTree;

type Subscriber = Arc<dyn Fn(&StateTree) + Send + Sync>;

/// Everything [`Store::configure`] needs.
pub struct StoreOptions {
    pub registry: ReducerRegistry,
    pub history: Arc<dyn History>,
    pub client: Arc<dyn Client>,
    pub config: StoreConfig,
    pub snapshot: SnapshotSource,
}

impl StoreOptions {
    pub fn new(
        registry: ReducerRegistry,
        history: Arc<dyn History>,
        client: Arc<dyn Client>,
    ) -> Self {
        Self {
            registry,
            history,
            client,
            config: StoreConfig::default(),
            snapshot: SnapshotSource::default(),
        }
    }

    pub fn with_config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_snapshot(mut self, snapshot: SnapshotSource) -> Self {
        self.snapshot = snapshot;
        self
    }
}

/// Application-wide state container.
///
/// The store owns the state tree and the reducer registry. Both change only
/// through [`dispatch`](Store::dispatch) and
/// [`inject_reducers`](Store::inject_reducers). Cloning a store yields
/// another handle to the same container.
pub struct Store {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    state: RwLock<StateTree>,
    // Serializes read-reduce-swap across handles.
    reducing: Mutex<()>,
    registry: RwLock<ReducerRegistry>,
    reducer: RwLock<Arc<CombinedReducer>>,
    client_reducer: Arc<dyn Reducer>,
    middlewares: Arc<[Arc<dyn Middleware>]>,
    subscribers: RwLock<Vec<(usize, Subscriber)>>,
    next_subscriber: AtomicUsize,
    snapshot: Option<Value>,
    config: StoreConfig,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

impl Store {
    /// Assemble a store from a reducer registry, a history and a client.
    ///
    /// On a browser-like platform the persisted snapshot seeds the initial
    /// tree; elsewhere the reducers' initial states are used. A
    /// normalization pass runs before the store is returned.
    pub fn configure(options: StoreOptions) -> Result<Self> {
        let StoreOptions {
            registry,
            history,
            client,
            config,
            snapshot,
        } = options;

        let client_reducer = client.reducer();
        let reducer = registry.combine(Arc::clone(&client_reducer))?;

        let middlewares: Vec<Arc<dyn Middleware>> = vec![
            Arc::new(ThunkMiddleware),
            Arc::new(ArrayMiddleware),
            client.middleware(),
            Arc::new(RouterMiddleware::new(history)),
            Arc::new(ActionBuffer::new(types::REHYDRATE)),
        ];

        let snapshot = if config.platform.is_browser() {
            snapshot.load(&config.storage_key)?
        } else {
            None
        };

        let initial = match &snapshot {
            Some(value) => {
                let tree = StateTree::from_json(value.clone())?;
                for key in tree.keys().filter(|key| !reducer.owns(key)) {
                    tracing::warn!(key = %key, "persisted snapshot holds a key no reducer owns");
                }
                tree
            }
            None => StateTree::new(),
        };

        let store = Self {
            inner: Arc::new(StoreInner {
                state: RwLock::new(initial),
                reducing: Mutex::new(()),
                registry: RwLock::new(registry),
                reducer: RwLock::new(Arc::new(reducer)),
                client_reducer,
                middlewares: middlewares.into(),
                subscribers: RwLock::new(Vec::new()),
                next_subscriber: AtomicUsize::new(0),
                snapshot,
                config,
            }),
        };

        store.reduce_action(&Action::normalize())?;
        Ok(store)
    }

    /// Get the current state tree.
    ///
    /// The returned tree is an immutable snapshot; later dispatches do not
    /// affect it.
    pub fn state(&self) -> StateTree {
        read(&self.inner.state).clone()
    }

    /// Shared handle to one domain's sub-state.
    pub fn select(&self, key: &str) -> Option<Arc<Value>> {
        read(&self.inner.state).shared(key)
    }

    /// Read state without cloning the tree.
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&StateTree) -> R,
    {
        let state = read(&self.inner.state);
        f(&state)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Keys of the current reducer registry, excluding the client key.
    pub fn registry_keys(&self) -> Vec<String> {
        read(&self.inner.registry).keys().map(str::to_string).collect()
    }

    /// Middleware names in chain order.
    pub fn middleware_names(&self) -> Vec<&'static str> {
        self.inner.middlewares.iter().map(|m| m.name()).collect()
    }

    /// Send an action or thunk through the middleware chain.
    ///
    /// Returns the dispatched action, or the value a thunk returned.
    /// Middleware and reducer errors propagate unchanged and leave the
    /// state tree as it was.
    pub fn dispatch(&self, item: impl Into<Dispatchable>) -> Result<Dispatched> {
        let chain = Arc::clone(&self.inner.middlewares);
        Next::new(self, &chain).run(item.into())
    }

    /// Dispatch the startup snapshot as a rehydration action.
    ///
    /// This is the signal that releases the action buffer.
    pub fn rehydrate(&self) -> Result<Dispatched> {
        let snapshot = self
            .inner
            .snapshot
            .clone()
            .unwrap_or_else(|| Value::Object(Default::default()));
        self.dispatch(Action::rehydrate(snapshot))
    }

    /// Merge `delta` into the registry and install the recombined reducer.
    ///
    /// Sub-states of keys not in `delta` are kept as-is. Newly added keys
    /// receive their reducer's initial state right away. The middleware
    /// chain is bypassed, so buffered actions are never replayed here.
    pub fn inject_reducers(&self, delta: ReducerRegistry) -> Result<()> {
        delta.check_reserved()?;
        {
            let mut registry = write(&self.inner.registry);
            let merged = registry.merge(&delta);
            let reducer = merged.combine(Arc::clone(&self.inner.client_reducer))?;
            *registry = merged;
            *write(&self.inner.reducer) = Arc::new(reducer);
        }
        tracing::info!(keys = ?delta.keys().collect::<Vec<_>>(), "injected reducers");
        self.reduce_action(&Action::replace())
    }

    /// Subscribe to state changes.
    ///
    /// The callback runs after every reduction with the new tree. It stays
    /// registered until the returned [`Subscription`] is dropped.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&StateTree) + Send + Sync + 'static,
    {
        let id = self.inner.next_subscriber.fetch_add(1, Ordering::SeqCst);
        write(&self.inner.subscribers).push((id, Arc::new(callback)));
        Subscription {
            id,
            store: Arc::downgrade(&self.inner),
        }
    }

    /// Write the tree to `storage` after every reduction.
    ///
    /// Write failures are logged and do not interrupt dispatch.
    #[must_use = "dropping the subscription stops persisting"]
    pub fn persist(&self, storage: Arc<dyn Storage>) -> Subscription {
        let key = self.inner.config.storage_key.clone();
        self.subscribe(move |tree| {
            if let Err(e) = write_snapshot(storage.as_ref(), &key, tree) {
                tracing::warn!(error = %e, "failed to persist state snapshot");
            }
        })
    }

    /// Write the current tree to `storage` once.
    pub fn save(&self, storage: &dyn Storage) -> Result<()> {
        let tree = self.state();
        write_snapshot(storage, &self.inner.config.storage_key, &tree)
    }

    /// Terminal step of the middleware chain.
    pub(crate) fn reduce_dispatchable(&self, item: Dispatchable) -> Result<Dispatched> {
        match item {
            Dispatchable::Action(action) => {
                self.reduce_action(&action)?;
                Ok(Dispatched::Action(action))
            }
            Dispatchable::Thunk(_) => Err(StoreError::UnresolvedThunk),
        }
    }

    /// Reduce `action` with the active reducer and notify subscribers.
    ///
    /// Reductions are serialized across every handle to the store; the
    /// lock is released before subscribers run so they may dispatch.
    fn reduce_action(&self, action: &Action) -> Result<()> {
        let next = {
            let _reducing = self
                .inner
                .reducing
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let reducer = Arc::clone(&read(&self.inner.reducer));
            let current = self.state();
            let next = reducer.apply(&current, action, self.inner.config.log_rehydration)?;

            tracing::debug!(
                action = action.kind(),
                changed = !next.ptr_eq(&current),
                "reduced action"
            );
            *write(&self.inner.state) = next.clone();
            next
        };
        self.notify(&next);
        Ok(())
    }

    /// Notify all subscribers of a state change.
    fn notify(&self, state: &StateTree) {
        let subscribers: Vec<Subscriber> = read(&self.inner.subscribers)
            .iter()
            .map(|(_, subscriber)| Arc::clone(subscriber))
            .collect();
        for subscriber in subscribers {
            subscriber(state);
        }
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.state())
            .field("middlewares", &self.middleware_names())
            .finish()
    }
}

impl Clone for Store {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// RAII guard for store subscribers.
pub struct Subscription {
    id: usize,
    store: Weak<StoreInner>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(store) = self.store.upgrade() {
            write(&store.subscribers).retain(|(id, _)| *id != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::thunk;
    use crate::error::ReducerError;
    use crate::middleware::{push, MemoryHistory};
    use crate::reducer::{reducer, try_reducer};
    use crate::store::{DetachedClient, MemoryStorage};
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> Arc<dyn Reducer> {
        reducer(json!(0), |state, action| {
            let count = state.as_i64().unwrap_or(0);
            match action.kind() {
                "INC" => json!(count + 1),
                "DOUBLE" => json!(count * 2),
                _ => state.clone(),
            }
        })
    }

    fn store_with(registry: ReducerRegistry) -> Store {
        let options = StoreOptions::new(
            registry,
            Arc::new(MemoryHistory::default()),
            Arc::new(DetachedClient),
        );
        let store = Store::configure(options).unwrap();
        store.rehydrate().unwrap();
        store
    }

    fn counter_store() -> Store {
        store_with(ReducerRegistry::new().with("counter", counter()))
    }

    #[test]
    fn store_starts_from_initial_states() {
        let store = counter_store();
        assert_eq!(store.state().get("counter"), Some(&json!(0)));
        assert_eq!(store.state().get("apollo"), Some(&json!({})));
    }

    #[test]
    fn store_dispatch_returns_action() {
        let store = counter_store();
        let dispatched = store.dispatch(Action::new("INC")).unwrap();
        assert_eq!(dispatched.action(), Some(&Action::new("INC")));
        assert_eq!(store.read(|tree| tree.get("counter").cloned()), Some(json!(1)));
    }

    #[test]
    fn store_subscribe() {
        let store = counter_store();

        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        let subscription = store.subscribe(move |_state| {
            call_count_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(call_count.load(Ordering::SeqCst), 0);

        store.dispatch(Action::new("INC")).unwrap();
        assert_eq!(call_count.load(Ordering::SeqCst), 1);

        store.dispatch(Action::new("INC")).unwrap();
        assert_eq!(call_count.load(Ordering::SeqCst), 2);

        drop(subscription);
        store.dispatch(Action::new("INC")).unwrap();
        assert_eq!(call_count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn subscribers_survive_injection() {
        let store = counter_store();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let _subscription = store.subscribe(move |state| {
            seen_clone
                .lock()
                .unwrap()
                .push(state.get("counter").cloned());
        });

        store
            .inject_reducers(ReducerRegistry::new().with("other", counter()))
            .unwrap();
        store.dispatch(Action::new("INC")).unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.last(), Some(&Some(json!(1))));
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn injection_installs_new_reducer() {
        let store = counter_store();
        store.dispatch(Action::new("INC")).unwrap();

        let tripler = reducer(json!(0), |state, action| {
            let count = state.as_i64().unwrap_or(0);
            if action.is("INC") {
                json!(count * 3)
            } else {
                state.clone()
            }
        });
        store
            .inject_reducers(ReducerRegistry::new().with("counter", tripler))
            .unwrap();

        assert_eq!(store.state().get("counter"), Some(&json!(1)));
        store.dispatch(Action::new("INC")).unwrap();
        assert_eq!(store.state().get("counter"), Some(&json!(3)));
    }

    #[test]
    fn injection_rejects_reserved_key() {
        let store = counter_store();
        let err = store
            .inject_reducers(ReducerRegistry::new().with("apollo", counter()))
            .unwrap_err();

        assert!(matches!(err, StoreError::ReservedKey(_)));
        assert_eq!(store.registry_keys(), vec!["counter".to_string()]);
    }

    #[test]
    fn reducer_error_leaves_state_untouched() {
        let store = store_with(
            ReducerRegistry::new().with("counter", counter()).with(
                "strict",
                try_reducer(json!(null), |state, action| {
                    if action.is("BAD") {
                        Err(ReducerError::new("rejected"))
                    } else {
                        Ok(state.clone())
                    }
                }),
            ),
        );
        store.dispatch(Action::new("INC")).unwrap();
        let before = store.state();

        let err = store.dispatch(Action::new("BAD")).unwrap_err();

        assert!(matches!(err, StoreError::Reducer { ref key, .. } if key == "strict"));
        assert!(store.state().ptr_eq(&before));
    }

    #[test]
    fn thunk_result_is_returned() {
        let store = counter_store();
        let dispatched = store
            .dispatch(thunk(|store| {
                store.dispatch(Action::new("INC"))?;
                store.dispatch(Action::new("DOUBLE"))?;
                Ok(json!("done"))
            }))
            .unwrap();

        assert_eq!(dispatched.value(), Some(&json!("done")));
        assert_eq!(store.state().get("counter"), Some(&json!(2)));
    }

    #[test]
    fn navigation_actions_do_not_reach_reducers() {
        let history = Arc::new(MemoryHistory::default());
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = seen.clone();
        let registry = ReducerRegistry::new().with(
            "spy",
            reducer(json!(null), move |state, action| {
                if action.kind().starts_with("@@router") {
                    seen_clone.fetch_add(1, Ordering::SeqCst);
                }
                state.clone()
            }),
        );
        let store = Store::configure(StoreOptions::new(
            registry,
            history.clone(),
            Arc::new(DetachedClient),
        ))
        .unwrap();
        store.rehydrate().unwrap();

        store.dispatch(push("/todos/1")).unwrap();

        assert_eq!(history.location(), "/todos/1");
        assert_eq!(seen.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn middleware_order_is_fixed() {
        let store = counter_store();
        assert_eq!(
            store.middleware_names(),
            vec!["thunk", "array", "pass-through", "router", "action-buffer"]
        );
    }

    #[test]
    fn persist_writes_after_each_reduction() {
        let store = counter_store();
        let storage = Arc::new(MemoryStorage::new());
        let _persisting = store.persist(storage.clone());

        store.dispatch(Action::new("INC")).unwrap();

        let raw = storage.get("state").unwrap().unwrap();
        let saved: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(saved["counter"], json!(1));
    }
}
