//! Lock-guarded access to a versioned structure from many threads.
//!
//! Mutations read the current version and publish the next one, so they
//! must be serialized. [`SharedHistory`] does that with a
//! [`parking_lot::RwLock`]. Readers only need the lock long enough to clone
//! a root: [`SharedHistory::snapshot`] hands back an owned view that can be
//! read while later writers proceed.
//!
//! # Examples
//!
//! ```rust
//! use persistent_history::persistent::{PersistentStack, SharedHistory};
//! use std::sync::Arc;
//! use std::thread;
//!
//! let shared = Arc::new(SharedHistory::new(PersistentStack::new()));
//! shared.mutate(|stack| stack.push(1));
//! let frozen = shared.snapshot(1).unwrap();
//!
//! let writer = {
//!     let shared = Arc::clone(&shared);
//!     thread::spawn(move || {
//!         for value in 2..=10 {
//!             shared.mutate(|stack| stack.push(value));
//!         }
//!     })
//! };
//! assert_eq!(frozen.to_vec(false), vec![&1]);
//! writer.join().unwrap();
//! assert_eq!(shared.current_time(), 10);
//! ```

use parking_lot::RwLock;

use super::error::PersistenceResult as Result;
use super::versioned::Versioned;

/// A versioned structure behind a reader-writer lock.
///
/// Only one mutation runs at a time; the root and the time counter are
/// published together while the write lock is held.
pub struct SharedHistory<S> {
    inner: RwLock<S>,
}

impl<S: Versioned> SharedHistory<S> {
    /// Wraps `structure` for shared use.
    #[must_use]
    pub const fn new(structure: S) -> Self {
        Self {
            inner: RwLock::new(structure),
        }
    }

    /// Runs `mutation` with exclusive access and returns its result.
    pub fn mutate<A, F>(&self, mutation: F) -> A
    where
        F: FnOnce(&mut S) -> A,
    {
        let mut guard = self.inner.write();
        mutation(&mut guard)
    }

    /// Runs `reader` with shared access and returns its result.
    pub fn read<A, F>(&self, reader: F) -> A
    where
        F: FnOnce(&S) -> A,
    {
        let guard = self.inner.read();
        reader(&guard)
    }

    /// Returns the time of the newest version.
    #[must_use]
    pub fn current_time(&self) -> usize {
        self.inner.read().current_time()
    }

    /// Returns a frozen view of version `time`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::InvalidVersion`](super::PersistenceError::InvalidVersion)
    /// if `time` is past the current time.
    pub fn snapshot(&self, time: usize) -> Result<S::Snapshot> {
        self.inner.read().snapshot(time)
    }

    /// Returns a frozen view of the newest version.
    ///
    /// # Errors
    ///
    /// Passes through any error from [`Versioned::snapshot`] for the
    /// current time.
    pub fn latest(&self) -> Result<S::Snapshot> {
        let guard = self.inner.read();
        guard.snapshot(guard.current_time())
    }

    /// Unwraps the structure.
    pub fn into_inner(self) -> S {
        self.inner.into_inner()
    }
}

impl<S: Versioned + Default> Default for SharedHistory<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}
