//! # persistent-history
//!
//! Partially persistent data structures for Rust: every mutation publishes
//! a new, independently readable version, and past versions stay frozen
//! forever.
//!
//! ## Overview
//!
//! - **Ordered set**: an unbalanced binary search tree over records ordered
//!   by an extracted, case-insensitive sort key; insert and delete copy only
//!   the search path.
//! - **Stack**: an immutable singly-linked list; push and pop never copy a
//!   node.
//! - **Version history**: both structures keep one root per point in time,
//!   starting from the empty version `0`.
//!
//! ## Feature Flags
//!
//! - `arc`: share nodes with `Arc` instead of `Rc`, making snapshots
//!   `Send + Sync`
//! - `shared`: `SharedHistory`, a lock-guarded wrapper for multi-threaded use
//! - `serde`: `Serialize` for snapshots
//! - `full`: Enable all features
//!
//! ## Example
//!
//! ```rust
//! use persistent_history::prelude::*;
//!
//! let mut stack = PersistentStack::new();
//! stack.push("x");
//! stack.push("y");
//! stack.pop().unwrap();
//!
//! assert_eq!(stack.current_time(), 3);
//! assert_eq!(stack.get_all_elements_at(2, true).unwrap(), vec![&"x", &"y"]);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Prelude module for convenient imports.
///
/// Re-exports commonly used types and traits.
///
/// # Usage
///
/// ```rust
/// use persistent_history::prelude::*;
/// ```
pub mod prelude {
    pub use crate::persistent::*;
}

pub mod persistent;
