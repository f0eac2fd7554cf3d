//! The common read interface of versioned structures.

use super::error::PersistenceResult as Result;

/// A structure whose history can be read one version at a time.
///
/// Implemented by [`PersistentOrderedSet`](super::PersistentOrderedSet) and
/// [`PersistentStack`](super::PersistentStack).
pub trait Versioned {
    /// Owned, frozen view of a single version.
    type Snapshot;

    /// Returns the time of the newest version.
    fn current_time(&self) -> usize;

    /// Returns a frozen view of version `time`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::InvalidVersion`](super::PersistenceError::InvalidVersion)
    /// if `time` is past the current time.
    fn snapshot(&self, time: usize) -> Result<Self::Snapshot>;
}
