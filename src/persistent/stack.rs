//! Partially persistent stack based on an immutable singly-linked list.
//!
//! This module provides [`PersistentStack`], a stack in which every push or
//! pop publishes a new version while all earlier versions stay readable.
//!
//! # Overview
//!
//! - O(1) push and pop
//! - O(1) peek at any version
//! - O(n) size and element listing at any version
//!
//! # Examples
//!
//! ```rust
//! use persistent_history::persistent::PersistentStack;
//!
//! let mut stack = PersistentStack::new();
//! stack.push("x");
//! stack.push("y");
//! stack.push("z");
//!
//! assert_eq!(stack.get_all_elements_at(3, false).unwrap(), vec![&"z", &"y", &"x"]);
//! assert_eq!(stack.get_all_elements_at(3, true).unwrap(), vec![&"x", &"y", &"z"]);
//!
//! assert_eq!(stack.pop(), Ok("z"));
//! assert_eq!(stack.current_time(), 4);
//! assert_eq!(stack.size_at(4), Ok(2));
//! ```
//!
//! # Structural Sharing
//!
//! Nodes never change after they are created, so no node is ever copied:
//!
//! ```text
//! version 3: z -> y -> x -> nil
//! version 4 (pop):    [y -> x -> nil]   // the very same nodes as version 2
//! version 5 (push w): w -> [y -> x -> nil]
//! ```

use std::fmt;
use std::iter::FusedIterator;

use super::ReferenceCounter;
use super::error::{PersistenceError, PersistenceResult as Result};
use super::history::{DEFAULT_HISTORY_CAPACITY, VersionHistory};
use super::versioned::Versioned;

/// Internal node structure of the stack.
struct Node<T> {
    element: T,
    next: Link<T>,
}

type Link<T> = Option<ReferenceCounter<Node<T>>>;

impl<T> Drop for Node<T> {
    /// Unlinks uniquely owned successors iteratively so that dropping a long
    /// stack cannot overflow the call stack.
    fn drop(&mut self) {
        let mut next = self.next.take();
        while let Some(node) = next {
            next = match ReferenceCounter::try_unwrap(node) {
                Ok(mut node) => node.next.take(),
                Err(_) => None,
            };
        }
    }
}

/// A partially persistent stack.
///
/// Every successful [`push`](Self::push) or [`pop`](Self::pop) publishes a
/// new version at `current_time() + 1`. Reads accept any time in
/// `0..=current_time()`; version `0` is always empty.
///
/// # Time Complexity
///
/// | Operation            | Complexity |
/// |----------------------|------------|
/// | `push`               | O(1)       |
/// | `pop`                | O(1)       |
/// | `peek` / `peek_at`   | O(1)       |
/// | `size` / `size_at`   | O(n)       |
/// | `get_all_elements`   | O(n)       |
/// | `snapshot`           | O(1)       |
pub struct PersistentStack<T> {
    history: VersionHistory<Node<T>>,
}

impl<T> PersistentStack<T> {
    /// Creates an empty stack.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_history::persistent::PersistentStack;
    ///
    /// let stack: PersistentStack<i32> = PersistentStack::new();
    /// assert!(stack.is_empty());
    /// assert_eq!(stack.current_time(), 0);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::with_history_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Creates an empty stack that reserves room for `capacity` versions.
    #[must_use]
    pub fn with_history_capacity(capacity: usize) -> Self {
        Self {
            history: VersionHistory::with_capacity(capacity),
        }
    }

    /// Pushes `element` on top of the current version and returns the time
    /// of the new version.
    ///
    /// # Complexity
    ///
    /// O(1) time and space
    pub fn push(&mut self, element: T) -> usize {
        let node = Node {
            element,
            next: self.history.current_root().cloned(),
        };
        let time = self.history.append(Some(ReferenceCounter::new(node)));
        tracing::trace!(time, "pushed element");
        time
    }

    /// Returns the time of the newest version, i.e. the number of successful
    /// mutations so far.
    #[inline]
    #[must_use]
    pub fn current_time(&self) -> usize {
        self.history.current_time()
    }

    /// Returns the number of elements in the current version.
    #[must_use]
    pub fn size(&self) -> usize {
        self.iter().count()
    }

    /// Returns the number of elements in version `time`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::InvalidVersion`] if `time` is past the
    /// current time.
    pub fn size_at(&self, time: usize) -> Result<usize> {
        Ok(self.iter_at(time)?.count())
    }

    /// Returns `true` if the current version has no elements.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.history.current_root().is_none()
    }

    /// Returns the top element of the current version.
    #[must_use]
    pub fn peek(&self) -> Option<&T> {
        self.history.current_root().map(|node| &node.element)
    }

    /// Returns the top element of version `time`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::InvalidVersion`] if `time` is past the
    /// current time.
    pub fn peek_at(&self, time: usize) -> Result<Option<&T>> {
        Ok(self.history.root_at(time)?.map(|node| &node.element))
    }

    /// Returns every element of the current version.
    ///
    /// With `reversed == false` the top of the stack comes first; with
    /// `reversed == true` it comes last.
    #[must_use]
    pub fn get_all_elements(&self, reversed: bool) -> Vec<&T> {
        collect_elements(self.iter(), reversed)
    }

    /// Returns every element of version `time`, ordered as in
    /// [`get_all_elements`](Self::get_all_elements).
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::InvalidVersion`] if `time` is past the
    /// current time.
    pub fn get_all_elements_at(&self, time: usize, reversed: bool) -> Result<Vec<&T>> {
        Ok(collect_elements(self.iter_at(time)?, reversed))
    }

    /// Returns an iterator from the top of the current version downwards.
    #[must_use]
    pub fn iter(&self) -> PersistentStackIterator<'_, T> {
        PersistentStackIterator {
            current: self.history.current_root(),
        }
    }

    /// Returns an iterator from the top of version `time` downwards.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::InvalidVersion`] if `time` is past the
    /// current time.
    pub fn iter_at(&self, time: usize) -> Result<PersistentStackIterator<'_, T>> {
        Ok(PersistentStackIterator {
            current: self.history.root_at(time)?,
        })
    }

    /// Returns an owned, frozen view of version `time`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::InvalidVersion`] if `time` is past the
    /// current time.
    pub fn snapshot(&self, time: usize) -> Result<StackSnapshot<T>> {
        let top = self.history.root_at(time)?.cloned();
        Ok(StackSnapshot { top, time })
    }
}

impl<T: Clone> PersistentStack<T> {
    /// Removes the top element of the current version, returns it, and
    /// publishes the remainder as a new version.
    ///
    /// The new version is the popped node's own successor, so no node is
    /// copied.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::EmptyStack`] if the current version has no
    /// elements. No version is published in that case.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_history::persistent::{PersistenceError, PersistentStack};
    ///
    /// let mut stack = PersistentStack::new();
    /// stack.push(1);
    /// assert_eq!(stack.pop(), Ok(1));
    /// assert_eq!(stack.pop(), Err(PersistenceError::EmptyStack));
    /// assert_eq!(stack.current_time(), 2);
    /// ```
    pub fn pop(&mut self) -> Result<T> {
        let Some(top) = self.history.current_root() else {
            tracing::debug!(time = self.current_time(), "pop rejected: stack is empty");
            return Err(PersistenceError::EmptyStack);
        };
        let element = top.element.clone();
        let next = top.next.clone();
        let time = self.history.append(next);
        tracing::trace!(time, "popped element");
        Ok(element)
    }
}

fn collect_elements<'a, T>(iterator: PersistentStackIterator<'a, T>, reversed: bool) -> Vec<&'a T> {
    let mut elements: Vec<&T> = iterator.collect();
    if reversed {
        elements.reverse();
    }
    elements
}

impl<T> Default for PersistentStack<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Versioned for PersistentStack<T> {
    type Snapshot = StackSnapshot<T>;

    fn current_time(&self) -> usize {
        self.history.current_time()
    }

    fn snapshot(&self, time: usize) -> Result<Self::Snapshot> {
        Self::snapshot(self, time)
    }
}

impl<T> Extend<T> for PersistentStack<T> {
    /// Pushes each element in turn; every element gets its own version.
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for element in iter {
            self.push(element);
        }
    }
}

impl<'a, T> IntoIterator for &'a PersistentStack<T> {
    type Item = &'a T;
    type IntoIter = PersistentStackIterator<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: fmt::Debug> fmt::Debug for PersistentStack<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("PersistentStack")
            .field("current_time", &self.current_time())
            .field("elements", &self.get_all_elements(false))
            .finish()
    }
}

// =============================================================================
// Snapshot
// =============================================================================

/// A frozen, owned view of one version of a [`PersistentStack`].
///
/// # Examples
///
/// ```rust
/// use persistent_history::persistent::PersistentStack;
///
/// let mut stack = PersistentStack::new();
/// stack.extend(["a", "b"]);
/// let snapshot = stack.snapshot(2).unwrap();
/// stack.pop().unwrap();
///
/// assert_eq!(snapshot.top(), Some(&"b"));
/// assert_eq!(snapshot.to_vec(true), vec![&"a", &"b"]);
/// ```
pub struct StackSnapshot<T> {
    top: Link<T>,
    time: usize,
}

impl<T> StackSnapshot<T> {
    /// Returns the time index this snapshot was taken at.
    #[inline]
    #[must_use]
    pub const fn time(&self) -> usize {
        self.time
    }

    /// Returns the number of elements in this version.
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Returns `true` if this version has no elements.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.top.is_none()
    }

    /// Returns the top element.
    #[must_use]
    pub fn top(&self) -> Option<&T> {
        self.top.as_ref().map(|node| &node.element)
    }

    /// Returns an iterator from the top downwards.
    #[must_use]
    pub fn iter(&self) -> PersistentStackIterator<'_, T> {
        PersistentStackIterator {
            current: self.top.as_ref(),
        }
    }

    /// Returns every element; top first unless `reversed`.
    #[must_use]
    pub fn to_vec(&self, reversed: bool) -> Vec<&T> {
        collect_elements(self.iter(), reversed)
    }
}

impl<T> Clone for StackSnapshot<T> {
    fn clone(&self) -> Self {
        Self {
            top: self.top.clone(),
            time: self.time,
        }
    }
}

impl<'a, T> IntoIterator for &'a StackSnapshot<T> {
    type Item = &'a T;
    type IntoIter = PersistentStackIterator<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: fmt::Debug> fmt::Debug for StackSnapshot<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_list().entries(self.iter()).finish()
    }
}

#[cfg(feature = "serde")]
impl<T: serde::Serialize> serde::Serialize for StackSnapshot<T> {
    /// Serializes the elements top first.
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(self.iter())
    }
}

// =============================================================================
// Iterator Implementation
// =============================================================================

/// An iterator over the elements of one stack version, top first.
pub struct PersistentStackIterator<'a, T> {
    current: Option<&'a ReferenceCounter<Node<T>>>,
}

impl<'a, T> Iterator for PersistentStackIterator<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.current.map(|node| {
            self.current = node.next.as_ref();
            &node.element
        })
    }
}

impl<T> FusedIterator for PersistentStackIterator<'_, T> {}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn stack_of(elements: &[&'static str]) -> PersistentStack<&'static str> {
        let mut stack = PersistentStack::new();
        stack.extend(elements.iter().copied());
        stack
    }

    #[rstest]
    fn test_push_shares_previous_top() {
        let stack = stack_of(&["x", "y"]);
        let first = stack.history.root_at(1).unwrap().unwrap();
        let second = stack.history.root_at(2).unwrap().unwrap();
        assert!(ReferenceCounter::ptr_eq(second.next.as_ref().unwrap(), first));
    }

    #[rstest]
    fn test_pop_republishes_existing_successor() {
        let mut stack = stack_of(&["x", "y", "z"]);
        assert_eq!(stack.pop(), Ok("z"));
        let before_push = stack.history.root_at(2).unwrap().unwrap();
        let after_pop = stack.history.root_at(4).unwrap().unwrap();
        assert!(ReferenceCounter::ptr_eq(before_push, after_pop));
    }

    #[rstest]
    fn test_pop_to_empty_publishes_empty_version() {
        let mut stack = stack_of(&["only"]);
        assert_eq!(stack.pop(), Ok("only"));
        assert!(stack.history.root_at(2).unwrap().is_none());
        assert!(stack.is_empty());
    }

    #[rstest]
    fn test_failed_pop_allocates_no_version() {
        let mut stack: PersistentStack<i32> = PersistentStack::with_history_capacity(1);
        let capacity = stack.history.capacity();
        assert_eq!(stack.pop(), Err(PersistenceError::EmptyStack));
        assert_eq!(stack.history.version_count(), 1);
        assert_eq!(stack.history.capacity(), capacity);
    }

    #[rstest]
    fn test_long_stack_drops_without_overflow() {
        let mut stack = PersistentStack::with_history_capacity(4);
        stack.extend(0..200_000_u32);
        assert_eq!(stack.size(), 200_000);
        drop(stack);
    }
}
