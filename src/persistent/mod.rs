//! Partially persistent data structures.
//!
//! This module provides versioned data structures whose mutations publish a
//! new version instead of changing anything in place:
//!
//! - [`PersistentOrderedSet`]: ordered set of records (unbalanced search tree
//!   with path copying)
//! - [`PersistentStack`]: stack (immutable singly-linked list)
//! - [`VersionHistory`]: the time-indexed table of roots behind both
//!
//! # Partial Persistence
//!
//! Each successful mutation advances the current time by one. Every version
//! stays readable forever through the `*_at(time)` methods and through
//! owned snapshots; only the newest version can be mutated. Version `0` is
//! always empty.
//!
//! # Examples
//!
//! ## `PersistentOrderedSet`
//!
//! ```rust
//! use persistent_history::persistent::{PersistenceError, PersistentOrderedSet};
//!
//! let mut set = PersistentOrderedSet::new("id", |id: &String, _: &str| id.clone());
//! for id in ["5", "3", "8", "1", "4"] {
//!     set.insert(id.to_string());
//! }
//! set.delete(&"5".to_string()).unwrap();
//!
//! let latest = set.snapshot(set.current_time()).unwrap();
//! assert_eq!(latest.root_key(), Some("4"));
//! assert!(!set.find(&"5".to_string()));
//! assert!(set.find_at(&"5".to_string(), 5).unwrap());
//!
//! assert_eq!(
//!     set.delete(&"q".to_string()),
//!     Err(PersistenceError::NotFound { key: "q".to_string() })
//! );
//! assert_eq!(set.current_time(), 6);
//! ```
//!
//! ## `PersistentStack`
//!
//! ```rust
//! use persistent_history::persistent::PersistentStack;
//!
//! let mut stack = PersistentStack::new();
//! stack.push(1);
//! stack.push(2);
//! assert_eq!(stack.pop(), Ok(2));
//!
//! assert_eq!(stack.get_all_elements_at(2, false).unwrap(), vec![&2, &1]);
//! assert_eq!(stack.get_all_elements(false), vec![&1]);
//! ```

// =============================================================================
// Reference Counter Type Alias
// =============================================================================

/// Reference-counted smart pointer type for shared nodes.
///
/// When the `arc` feature is enabled, this is `std::sync::Arc`, so versions
/// and snapshots can cross threads.
///
/// When the `arc` feature is disabled (default), this is `std::rc::Rc`,
/// which is faster but not thread-safe.
#[cfg(feature = "arc")]
pub(crate) type ReferenceCounter<T> = std::sync::Arc<T>;

#[cfg(not(feature = "arc"))]
pub(crate) type ReferenceCounter<T> = std::rc::Rc<T>;

mod error;
mod history;
mod key;
mod ordered_set;
#[cfg(feature = "shared")]
mod shared;
mod stack;
mod versioned;

pub use error::PersistenceError;
pub use error::PersistenceResult;
pub use history::DEFAULT_HISTORY_CAPACITY;
pub use history::VersionHistory;
pub use key::FieldLookup;
pub use key::KeyExtractor;
pub use key::compare_ignore_case;
pub use ordered_set::PersistentOrderedSet;
pub use ordered_set::PersistentOrderedSetIterator;
pub use ordered_set::SetSnapshot;
#[cfg(feature = "shared")]
pub use shared::SharedHistory;
pub use stack::PersistentStack;
pub use stack::PersistentStackIterator;
pub use stack::StackSnapshot;
pub use versioned::Versioned;

// Snapshots cross threads only when nodes are atomically counted.
#[cfg(feature = "arc")]
mod arc_send_sync_verification {
    use super::{SetSnapshot, StackSnapshot};

    static_assertions::assert_impl_all!(SetSnapshot<String>: Send, Sync);
    static_assertions::assert_impl_all!(StackSnapshot<String>: Send, Sync);
}

#[cfg(not(feature = "arc"))]
mod rc_send_sync_verification {
    use super::{SetSnapshot, StackSnapshot};

    static_assertions::assert_not_impl_any!(SetSnapshot<String>: Send, Sync);
    static_assertions::assert_not_impl_any!(StackSnapshot<String>: Send, Sync);
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod reference_counter_tests {
    use super::ReferenceCounter;
    use rstest::rstest;

    #[rstest]
    fn test_reference_counter_strong_count() {
        let reference_counter: ReferenceCounter<i32> = ReferenceCounter::new(42);
        assert_eq!(ReferenceCounter::strong_count(&reference_counter), 1);
        let reference_counter_clone = reference_counter.clone();
        assert_eq!(ReferenceCounter::strong_count(&reference_counter), 2);
        drop(reference_counter_clone);
        assert_eq!(ReferenceCounter::strong_count(&reference_counter), 1);
    }
}
