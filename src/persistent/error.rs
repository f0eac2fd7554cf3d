//! Error types for versioned data structures.
//!
//! Every failure is a caller error: the operation had no effect, no
//! version was published and the current time did not advance.

use std::error::Error;
use std::fmt;

/// Errors returned by operations on versioned data structures.
///
/// # Examples
///
/// ```rust
/// use persistent_history::persistent::{PersistenceError, PersistentStack};
///
/// let mut stack: PersistentStack<i32> = PersistentStack::new();
/// assert_eq!(stack.pop(), Err(PersistenceError::EmptyStack));
/// assert_eq!(stack.current_time(), 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// A delete named a key that is absent from the current version.
    NotFound {
        /// The sort key that was searched for.
        key: String,
    },

    /// A pop was attempted on a version with no elements.
    EmptyStack,

    /// A time index outside `0..=current` was requested.
    InvalidVersion {
        /// The time index that was asked for.
        requested: usize,
        /// The current (highest valid) time index.
        current: usize,
    },
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { key } => {
                write!(formatter, "element with key {key:?} is not in the tree")
            }
            Self::EmptyStack => write!(formatter, "stack is empty"),
            Self::InvalidVersion { requested, current } => {
                write!(
                    formatter,
                    "invalid version {requested}: valid versions are 0..={current}"
                )
            }
        }
    }
}

impl Error for PersistenceError {}

/// Result of an operation on a versioned data structure.
pub type PersistenceResult<T> = std::result::Result<T, PersistenceError>;
