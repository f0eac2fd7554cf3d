#![cfg(feature = "serde")]

//! Integration tests for serde support.
//!
//! Snapshots serialize as plain sequences of their elements.

use persistent_history::persistent::{PersistentOrderedSet, PersistentStack};
use rstest::rstest;

#[rstest]
fn test_set_snapshot_serializes_in_key_order() {
    let mut set = PersistentOrderedSet::new("name", |name: &String, _: &str| name.clone());
    set.extend(["pear", "Apple", "fig"].map(String::from));

    let latest = serde_json::to_string(&set.snapshot(3).unwrap()).unwrap();
    assert_eq!(latest, r#"["Apple","fig","pear"]"#);

    let first = serde_json::to_string(&set.snapshot(1).unwrap()).unwrap();
    assert_eq!(first, r#"["pear"]"#);
}

#[rstest]
fn test_empty_snapshot_serializes_as_empty_sequence() {
    let stack: PersistentStack<i32> = PersistentStack::new();
    let json = serde_json::to_string(&stack.snapshot(0).unwrap()).unwrap();
    assert_eq!(json, "[]");
}

#[rstest]
fn test_stack_snapshot_serializes_top_first() {
    let mut stack = PersistentStack::new();
    stack.extend([1, 2, 3]);
    stack.pop().unwrap();

    let json = serde_json::to_string(&stack.snapshot(3).unwrap()).unwrap();
    assert_eq!(json, "[3,2,1]");
    let json = serde_json::to_string(&stack.snapshot(4).unwrap()).unwrap();
    assert_eq!(json, "[2,1]");
}
