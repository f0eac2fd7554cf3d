//! Time-indexed history of root references.
//!
//! [`VersionHistory`] is the append-only table behind every versioned
//! structure in this crate. Slot `0` always holds the empty structure and
//! each successful mutation appends exactly one new root.
//!
//! # Examples
//!
//! ```rust
//! use persistent_history::persistent::VersionHistory;
//!
//! let mut history: VersionHistory<&str> = VersionHistory::with_capacity(2);
//! assert_eq!(history.current_time(), 0);
//!
//! assert_eq!(history.append(None), 1);
//! assert_eq!(history.append(None), 2);
//! assert!(history.root_at(2).unwrap().is_none());
//! assert!(history.root_at(3).is_err());
//! ```

use std::fmt;

use super::ReferenceCounter;
use super::error::{PersistenceError, PersistenceResult as Result};

/// Initial number of version slots reserved by `new()` constructors.
pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;

/// An append-only sequence of roots, one per point in time.
///
/// Storage doubles whenever it is full. Entries are reference-counted
/// pointers, so growing the table never invalidates a root that a reader
/// already holds.
///
/// # Time Complexity
///
/// | Operation      | Complexity       |
/// |----------------|------------------|
/// | `append`       | O(1) amortized   |
/// | `root_at`      | O(1)             |
/// | `current_time` | O(1)             |
pub struct VersionHistory<N> {
    roots: Vec<Option<ReferenceCounter<N>>>,
}

impl<N> VersionHistory<N> {
    /// Creates a history holding only the empty version `0`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Creates a history with room for `capacity` versions before the first
    /// growth. A capacity of zero is treated as one, since version `0`
    /// always exists.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let mut roots = Vec::with_capacity(capacity.max(1));
        roots.push(None);
        Self { roots }
    }

    /// Returns the highest valid time index.
    #[inline]
    #[must_use]
    pub fn current_time(&self) -> usize {
        self.roots.len() - 1
    }

    /// Returns the number of stored versions, including version `0`.
    #[inline]
    #[must_use]
    pub fn version_count(&self) -> usize {
        self.roots.len()
    }

    /// Returns the number of versions that fit before the next growth.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.roots.capacity()
    }

    /// Stores `root` at `current_time() + 1` and returns the new current time.
    ///
    /// Publishing is a single push, so the root and the time counter move
    /// together.
    pub fn append(&mut self, root: Option<ReferenceCounter<N>>) -> usize {
        if self.roots.len() == self.roots.capacity() {
            let grown = self.roots.capacity().max(1) * 2;
            self.roots.reserve_exact(grown - self.roots.len());
            tracing::debug!(
                capacity = self.roots.capacity(),
                versions = self.roots.len(),
                "version history grew"
            );
        }
        self.roots.push(root);
        self.current_time()
    }

    /// Returns the root stored at `time`, or `None` for an empty version.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::InvalidVersion`] if `time` exceeds the
    /// current time.
    pub fn root_at(&self, time: usize) -> Result<Option<&ReferenceCounter<N>>> {
        self.roots
            .get(time)
            .map(Option::as_ref)
            .ok_or_else(|| PersistenceError::InvalidVersion {
                requested: time,
                current: self.current_time(),
            })
    }

    /// Returns the root of the current version.
    #[inline]
    #[must_use]
    pub fn current_root(&self) -> Option<&ReferenceCounter<N>> {
        self.roots.last().and_then(Option::as_ref)
    }
}

impl<N> Default for VersionHistory<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N> fmt::Debug for VersionHistory<N> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("VersionHistory")
            .field("current_time", &self.current_time())
            .field("capacity", &self.capacity())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_new_history_has_empty_version_zero() {
        let history: VersionHistory<i32> = VersionHistory::new();
        assert_eq!(history.current_time(), 0);
        assert_eq!(history.version_count(), 1);
        assert!(history.root_at(0).unwrap().is_none());
        assert!(history.current_root().is_none());
    }

    #[rstest]
    fn test_append_advances_time() {
        let mut history = VersionHistory::new();
        assert_eq!(history.append(Some(ReferenceCounter::new(10))), 1);
        assert_eq!(history.append(None), 2);
        assert_eq!(history.append(Some(ReferenceCounter::new(30))), 3);
        assert_eq!(history.current_time(), 3);
        assert_eq!(history.root_at(1).unwrap().map(|root| **root), Some(10));
        assert!(history.root_at(2).unwrap().is_none());
        assert_eq!(history.current_root().map(|root| **root), Some(30));
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(2)]
    fn test_root_at_rejects_future_time(#[case] appended: usize) {
        let mut history = VersionHistory::with_capacity(4);
        for value in 0..appended {
            history.append(Some(ReferenceCounter::new(value)));
        }
        assert_eq!(
            history.root_at(appended + 1),
            Err(PersistenceError::InvalidVersion {
                requested: appended + 1,
                current: appended,
            })
        );
    }

    #[rstest]
    fn test_growth_doubles_capacity() {
        let mut history = VersionHistory::with_capacity(2);
        assert_eq!(history.capacity(), 2);
        history.append(Some(ReferenceCounter::new(1)));
        assert_eq!(history.capacity(), 2);
        history.append(Some(ReferenceCounter::new(2)));
        assert_eq!(history.capacity(), 4);
    }

    #[rstest]
    fn test_growth_keeps_roots_identical() {
        let mut history = VersionHistory::with_capacity(1);
        let first = ReferenceCounter::new("first");
        history.append(Some(ReferenceCounter::clone(&first)));
        for _ in 0..100 {
            history.append(None);
        }
        let stored = history.root_at(1).unwrap().unwrap();
        assert!(ReferenceCounter::ptr_eq(stored, &first));
    }

    #[rstest]
    fn test_zero_capacity_is_usable() {
        let mut history = VersionHistory::with_capacity(0);
        assert!(history.capacity() >= 1);
        assert_eq!(history.append(Some(ReferenceCounter::new(()))), 1);
    }
}
