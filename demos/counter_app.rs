//! Counter application wiring the full store: snapshot restore, buffered
//! startup actions, navigation, persistence and reducer injection.
//!
//! Run with `RUST_LOG=debug APP_TARGET=browser cargo run --example counter_app`.

use std::sync::Arc;

use larder::middleware::push;
use larder::{
    reducer, reload_channel, thunk, Action, DetachedClient, FileStorage, MemoryHistory,
    ReducerRegistry, SnapshotSource, Storage, Store, StoreConfig, StoreOptions,
};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

fn registry() -> ReducerRegistry {
    ReducerRegistry::new()
        .with(
            "counter",
            reducer(json!({ "count": 0, "step": 1 }), |state, action| {
                let count = state["count"].as_i64().unwrap_or(0);
                let step = state["step"].as_i64().unwrap_or(1);
                match action.kind() {
                    "INCREMENT" => json!({ "count": count + step, "step": step }),
                    "DECREMENT" => json!({ "count": count - step, "step": step }),
                    "SET_STEP" => json!({ "count": count, "step": action.payload() }),
                    "RESET" => json!({ "count": 0, "step": step }),
                    _ => state.clone(),
                }
            }),
        )
        .with(
            "history",
            reducer(json!([]), |state, action| {
                if action.kind().starts_with("@@") {
                    return state.clone();
                }
                let mut entries = state.as_array().cloned().unwrap_or_default();
                entries.push(json!(action.kind()));
                Value::Array(entries)
            }),
        )
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Counter App ===\n");

    let dir = std::env::temp_dir().join("larder-counter-app");
    let storage: Arc<dyn Storage> = Arc::new(FileStorage::new(&dir)?);
    let history = Arc::new(MemoryHistory::new("/"));

    let store = Store::configure(
        StoreOptions::new(registry(), history.clone(), Arc::new(DetachedClient))
            .with_config(StoreConfig::from_env())
            .with_snapshot(SnapshotSource::new().with_storage(storage.clone())),
    )?;
    println!("1. Restored state: {}", store.state().to_json());

    let _persisting = store.persist(storage);
    let _logging = store.subscribe(|state| {
        println!("   [State] counter = {}", state.get("counter").unwrap_or(&Value::Null));
    });

    println!("\n2. Dispatching before rehydration (buffered)");
    store.dispatch(Action::new("INCREMENT"))?;
    store.dispatch(Action::with_payload("SET_STEP", json!(5)))?;

    println!("\n3. Rehydrating releases the buffer");
    store.rehydrate()?;

    println!("\n4. Batched and deferred actions");
    store.dispatch(Action::batch([Action::new("INCREMENT"), Action::new("INCREMENT")]))?;
    store.dispatch(thunk(|store| {
        let count = store.read(|s| s.get("counter").map(|c| c["count"].clone()));
        if count.and_then(|c| c.as_i64()).unwrap_or(0) > 100 {
            store.dispatch(Action::new("RESET"))?;
        }
        Ok(Value::Null)
    }))?;

    println!("\n5. Navigation");
    store.dispatch(push("/stats"))?;
    println!("   location = {}", history.location());

    println!("\n6. Hot reloading a new domain");
    let (sender, reload) = reload_channel();
    sender.send(ReducerRegistry::new().with(
        "visits",
        reducer(json!(0), |state, action| {
            if action.is("VISIT") {
                json!(state.as_i64().unwrap_or(0) + 1)
            } else {
                state.clone()
            }
        }),
    ));
    reload.poll(&store)?;
    store.dispatch(Action::new("VISIT"))?;

    println!("\nFinal state: {}", store.state().to_json());
    println!("Snapshot saved under {}", dir.display());
    Ok(())
}
