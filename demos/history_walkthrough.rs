//! History walkthrough.
//!
//! Builds a small ordered set of records and a stack, mutates both, and
//! prints what every version looked like. Run with
//! `RUST_LOG=persistent_history=trace` to see each published version.

use std::collections::BTreeMap;

use persistent_history::persistent::{
    FieldLookup, PersistenceError, PersistentOrderedSet, PersistentStack,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn record(id: &str, name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("id".to_string(), id.to_string()),
        ("name".to_string(), name.to_string()),
    ])
}

fn main() -> Result<(), PersistenceError> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,persistent_history=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Ordered set keyed on \"id\"");
    let mut set = PersistentOrderedSet::with_history_capacity("id", FieldLookup, 4);
    for (id, name) in [("5", "eve"), ("3", "cal"), ("8", "hal"), ("1", "ann"), ("4", "dan")] {
        set.insert(record(id, name));
    }
    set.delete(&record("5", ""))?;

    if let Err(error) = set.delete(&record("q", "")) {
        tracing::info!("expected failure: {error}");
    }

    for time in 0..=set.current_time() {
        let names: Vec<&str> = set
            .get_all_elements_at(time)?
            .into_iter()
            .map(|record| record["name"].as_str())
            .collect();
        let root = set.snapshot(time)?.root_key().map(str::to_string);
        tracing::info!(time, ?root, ?names, "set version");
    }

    tracing::info!("Stack");
    let mut stack = PersistentStack::with_history_capacity(2);
    stack.extend(["x", "y", "z"]);
    let popped = stack.pop()?;
    tracing::info!(popped, "popped top");

    for time in 0..=stack.current_time() {
        let bottom_first = stack.get_all_elements_at(time, true)?;
        tracing::info!(time, ?bottom_first, "stack version");
    }

    Ok(())
}
