//! Partially persistent ordered set based on an unbalanced binary search tree.
//!
//! This module provides [`PersistentOrderedSet`], an ordered collection of
//! records in which every insert or delete publishes a new version while all
//! earlier versions stay readable.
//!
//! # Overview
//!
//! Records are ordered by a sort key that a [`KeyExtractor`] derives from a
//! named field. Keys compare case-insensitively (see [`compare_ignore_case`]);
//! a key that compares strictly less than a node's key goes left, everything
//! else (equal or greater) goes right. Duplicates are therefore kept as
//! distinct nodes in the right subtree.
//!
//! - O(h) insert and delete, where h is the height of the current tree
//! - O(h) find at any version
//! - O(n) size and ordered traversal at any version
//!
//! The tree is never rebalanced; its shape is whatever the insertion order
//! produces.
//!
//! # Examples
//!
//! ```rust
//! use persistent_history::persistent::{FieldLookup, PersistentOrderedSet};
//! use std::collections::BTreeMap;
//!
//! fn record(id: &str) -> BTreeMap<String, String> {
//!     BTreeMap::from([("id".to_string(), id.to_string())])
//! }
//!
//! let mut set = PersistentOrderedSet::new("id", FieldLookup);
//! set.insert(record("b"));
//! set.insert(record("a"));
//! set.insert(record("c"));
//!
//! assert_eq!(set.current_time(), 3);
//! assert!(!set.find_at(&record("a"), 1).unwrap());
//! assert!(set.find_at(&record("a"), 2).unwrap());
//!
//! let ids: Vec<&str> = set
//!     .get_all_elements()
//!     .into_iter()
//!     .map(|record| record["id"].as_str())
//!     .collect();
//! assert_eq!(ids, vec!["a", "b", "c"]);
//! ```
//!
//! # Path Copying
//!
//! A mutation copies only the nodes on the path from the root to the
//! mutation point. Every subtree hanging off that path is shared, by
//! reference, with the previous version:
//!
//! ```text
//! version 1:      5               version 2 (insert 4):    5'
//!                / \                                      / \
//!               3   8                                    3'  8   <- shared
//!              /                                        / \
//!             1                             shared ->  1   4
//! ```
//!
//! Nodes are fully built before they are published and are never written
//! afterwards, so a reader holding any version sees a frozen tree.

use std::cmp::Ordering;
use std::fmt;
use std::iter::FusedIterator;

use smallvec::SmallVec;

use super::ReferenceCounter;
use super::error::{PersistenceError, PersistenceResult as Result};
use super::history::{DEFAULT_HISTORY_CAPACITY, VersionHistory};
use super::key::{KeyExtractor, compare_ignore_case};
use super::versioned::Versioned;

/// Number of path entries kept inline before a mutation path spills to the heap.
const PATH_INLINE_CAPACITY: usize = 32;

// =============================================================================
// Node Definition
// =============================================================================

/// Internal node of the search tree.
///
/// The record and its key sit behind reference counters, so copying a node
/// onto a new path never clones record payloads.
struct Node<R> {
    record: ReferenceCounter<R>,
    key: ReferenceCounter<str>,
    left: Link<R>,
    right: Link<R>,
}

type Link<R> = Option<ReferenceCounter<Node<R>>>;

/// Which child a search continued into.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Direction {
    Left,
    Right,
}

impl Direction {
    /// Strictly-less goes left; equal or greater goes right.
    fn of(key: &str, node_key: &str) -> Self {
        if compare_ignore_case(key, node_key) == Ordering::Less {
            Self::Left
        } else {
            Self::Right
        }
    }
}

impl<R> Node<R> {
    fn leaf(record: ReferenceCounter<R>, key: ReferenceCounter<str>) -> Self {
        Self {
            record,
            key,
            left: None,
            right: None,
        }
    }

    /// Creates a copy of this node's record and key with the given children.
    fn with_children(&self, left: Link<R>, right: Link<R>) -> Self {
        Self {
            record: ReferenceCounter::clone(&self.record),
            key: ReferenceCounter::clone(&self.key),
            left,
            right,
        }
    }

    /// Creates a copy of this node that replaces one child and shares the other.
    fn with_child(&self, direction: Direction, child: Link<R>) -> Self {
        match direction {
            Direction::Left => self.with_children(child, self.right.clone()),
            Direction::Right => self.with_children(self.left.clone(), child),
        }
    }

    const fn child(&self, direction: Direction) -> Option<&ReferenceCounter<Self>> {
        match direction {
            Direction::Left => self.left.as_ref(),
            Direction::Right => self.right.as_ref(),
        }
    }
}

impl<R> Drop for Node<R> {
    /// Unlinks uniquely owned descendants iteratively so that dropping a deep
    /// (degenerate) tree cannot overflow the call stack.
    fn drop(&mut self) {
        let mut pending: Vec<ReferenceCounter<Self>> = Vec::new();
        pending.extend(self.left.take());
        pending.extend(self.right.take());
        while let Some(node) = pending.pop() {
            if let Ok(mut node) = ReferenceCounter::try_unwrap(node) {
                pending.extend(node.left.take());
                pending.extend(node.right.take());
            }
        }
    }
}

// =============================================================================
// Path Copying
// =============================================================================

/// Nodes visited by a mutation, each paired with the side the walk took.
type Path<'a, R> = SmallVec<[(&'a ReferenceCounter<Node<R>>, Direction); PATH_INLINE_CAPACITY]>;

/// Copies every node on `path` bottom-up, hanging `bottom` below the last one.
///
/// Returns the new top of the path (or `bottom` itself when the path is empty).
fn copy_path<R>(path: Path<'_, R>, bottom: Link<R>) -> Link<R> {
    path.into_iter()
        .rev()
        .fold(bottom, |child, (node, direction)| {
            Some(ReferenceCounter::new(node.with_child(direction, child)))
        })
}

/// Builds the root of a tree that contains everything under `root` plus `leaf`.
fn insert_leaf<R>(root: Option<&ReferenceCounter<Node<R>>>, leaf: Node<R>) -> Link<R> {
    let mut path: Path<'_, R> = SmallVec::new();
    let mut current = root;
    while let Some(node) = current {
        let direction = Direction::of(&leaf.key, &node.key);
        path.push((node, direction));
        current = node.child(direction);
    }
    copy_path(path, Some(ReferenceCounter::new(leaf)))
}

/// Builds the root of a tree without the first node whose key equals `key`.
///
/// Returns `None` when no such node exists.
fn remove_key<R>(root: Option<&ReferenceCounter<Node<R>>>, key: &str) -> Option<Link<R>> {
    let mut path: Path<'_, R> = SmallVec::new();
    let mut current = root?;
    loop {
        let direction = match compare_ignore_case(key, &current.key) {
            Ordering::Equal => break,
            Ordering::Less => Direction::Left,
            Ordering::Greater => Direction::Right,
        };
        path.push((current, direction));
        current = current.child(direction)?;
    }
    Some(copy_path(path, splice_out(current)))
}

/// Returns the subtree that takes the place of `target` once it is removed.
///
/// With two children the slot survives, carrying the record of the in-order
/// predecessor, and the predecessor is unlinked from a copy of the left
/// spine that leads to it.
fn splice_out<R>(target: &ReferenceCounter<Node<R>>) -> Link<R> {
    match (&target.left, &target.right) {
        (Some(left), Some(_)) => {
            let mut spine: Path<'_, R> = SmallVec::new();
            let mut predecessor = left;
            while let Some(right) = predecessor.right.as_ref() {
                spine.push((predecessor, Direction::Right));
                predecessor = right;
            }
            let remaining_left = copy_path(spine, predecessor.left.clone());
            Some(ReferenceCounter::new(Node {
                record: ReferenceCounter::clone(&predecessor.record),
                key: ReferenceCounter::clone(&predecessor.key),
                left: remaining_left,
                right: target.right.clone(),
            }))
        }
        (Some(child), None) | (None, Some(child)) => Some(ReferenceCounter::clone(child)),
        (None, None) => None,
    }
}

fn contains_key<R>(root: Option<&ReferenceCounter<Node<R>>>, key: &str) -> bool {
    let mut current = root;
    while let Some(node) = current {
        current = match compare_ignore_case(key, &node.key) {
            Ordering::Equal => return true,
            Ordering::Less => node.left.as_ref(),
            Ordering::Greater => node.right.as_ref(),
        };
    }
    false
}

// =============================================================================
// PersistentOrderedSet Definition
// =============================================================================

/// A partially persistent ordered set of records.
///
/// Every successful [`insert`](Self::insert) or [`delete`](Self::delete)
/// publishes a new version at `current_time() + 1`. Reads accept any time in
/// `0..=current_time()`; version `0` is always empty. Only the newest version
/// can be mutated.
///
/// # Time Complexity
///
/// | Operation           | Complexity |
/// |---------------------|------------|
/// | `insert`            | O(h)       |
/// | `delete`            | O(h)       |
/// | `find` / `find_at`  | O(h)       |
/// | `size` / `size_at`  | O(n)       |
/// | `get_all_elements`  | O(n)       |
/// | `snapshot`          | O(1)       |
/// | `current_time`      | O(1)       |
///
/// h is the height of the tree at the version involved; without
/// rebalancing it can be as large as n.
///
/// # Examples
///
/// ```rust
/// use persistent_history::persistent::PersistentOrderedSet;
///
/// let mut set = PersistentOrderedSet::new("word", |record: &String, _: &str| record.clone());
/// set.insert("pear".to_string());
/// set.insert("Apple".to_string());
/// set.delete(&"pear".to_string()).unwrap();
///
/// assert_eq!(set.get_all_elements(), vec!["Apple"]);
/// assert_eq!(set.get_all_elements_at(2).unwrap(), vec!["Apple", "pear"]);
/// ```
pub struct PersistentOrderedSet<R, E> {
    field: String,
    extractor: E,
    history: VersionHistory<Node<R>>,
}

impl<R, E> PersistentOrderedSet<R, E>
where
    E: KeyExtractor<R>,
{
    /// Creates an empty set ordered by the key `extractor` derives for `field`.
    #[must_use]
    pub fn new(field: impl Into<String>, extractor: E) -> Self {
        Self::with_history_capacity(field, extractor, DEFAULT_HISTORY_CAPACITY)
    }

    /// Creates an empty set that reserves room for `capacity` versions.
    #[must_use]
    pub fn with_history_capacity(field: impl Into<String>, extractor: E, capacity: usize) -> Self {
        Self {
            field: field.into(),
            extractor,
            history: VersionHistory::with_capacity(capacity),
        }
    }

    /// Returns the sort key of `record` under this set's field.
    #[must_use]
    pub fn sort_key(&self, record: &R) -> String {
        self.extractor.extract(record, &self.field)
    }

    /// Inserts `record` and returns the time of the new version.
    ///
    /// Inserting never fails. A record whose key is already present is
    /// added as a separate node to the right of the existing one.
    ///
    /// # Complexity
    ///
    /// O(h) time and space: one new node per level on the search path plus
    /// the new leaf.
    pub fn insert(&mut self, record: R) -> usize {
        let key: ReferenceCounter<str> = ReferenceCounter::from(self.sort_key(&record));
        let leaf = Node::leaf(ReferenceCounter::new(record), ReferenceCounter::clone(&key));
        let root = insert_leaf(self.history.current_root(), leaf);
        let time = self.history.append(root);
        tracing::trace!(time, key = %key, "inserted record");
        time
    }

    /// Deletes the record whose key matches `record`'s key and returns the
    /// time of the new version.
    ///
    /// When the removed node has two children, its place is taken by its
    /// in-order predecessor (the largest key in its left subtree).
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::NotFound`] if the current version is empty
    /// or holds no record with that key. No version is published in that case.
    pub fn delete(&mut self, record: &R) -> Result<usize> {
        let key = self.sort_key(record);
        let Some(root) = remove_key(self.history.current_root(), &key) else {
            tracing::debug!(key = %key, time = self.current_time(), "delete rejected: key not found");
            return Err(PersistenceError::NotFound { key });
        };
        let time = self.history.append(root);
        tracing::trace!(time, key = %key, "deleted record");
        Ok(time)
    }

    /// Returns `true` if a record with `record`'s key is in the current version.
    #[must_use]
    pub fn find(&self, record: &R) -> bool {
        self.find_key(&self.sort_key(record))
    }

    /// Returns `true` if a record with `record`'s key is in version `time`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::InvalidVersion`] if `time` is past the
    /// current time.
    pub fn find_at(&self, record: &R, time: usize) -> Result<bool> {
        let root = self.history.root_at(time)?;
        Ok(contains_key(root, &self.sort_key(record)))
    }

    /// Returns `true` if a record with exactly this sort key (ignoring case)
    /// is in the current version.
    #[must_use]
    pub fn find_key(&self, key: &str) -> bool {
        contains_key(self.history.current_root(), key)
    }
}

impl<R, E> PersistentOrderedSet<R, E> {
    /// Returns the field name the sort key is extracted from.
    #[inline]
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Returns the time of the newest version, i.e. the number of successful
    /// mutations so far.
    #[inline]
    #[must_use]
    pub fn current_time(&self) -> usize {
        self.history.current_time()
    }

    /// Returns the number of records in the current version.
    #[must_use]
    pub fn size(&self) -> usize {
        self.iter().count()
    }

    /// Returns the number of records in version `time`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::InvalidVersion`] if `time` is past the
    /// current time.
    pub fn size_at(&self, time: usize) -> Result<usize> {
        Ok(self.iter_at(time)?.count())
    }

    /// Returns `true` if the current version holds no records.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.history.current_root().is_none()
    }

    /// Returns the records of the current version in ascending key order.
    #[must_use]
    pub fn get_all_elements(&self) -> Vec<&R> {
        self.iter().collect()
    }

    /// Returns the records of version `time` in ascending key order.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::InvalidVersion`] if `time` is past the
    /// current time.
    pub fn get_all_elements_at(&self, time: usize) -> Result<Vec<&R>> {
        Ok(self.iter_at(time)?.collect())
    }

    /// Returns an in-order iterator over the current version.
    #[must_use]
    pub fn iter(&self) -> PersistentOrderedSetIterator<'_, R> {
        PersistentOrderedSetIterator::new(self.history.current_root())
    }

    /// Returns an in-order iterator over version `time`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::InvalidVersion`] if `time` is past the
    /// current time.
    pub fn iter_at(&self, time: usize) -> Result<PersistentOrderedSetIterator<'_, R>> {
        Ok(PersistentOrderedSetIterator::new(self.history.root_at(time)?))
    }

    /// Returns an owned, frozen view of version `time`.
    ///
    /// The snapshot shares every node with this set and stays valid however
    /// many versions are published afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::InvalidVersion`] if `time` is past the
    /// current time.
    pub fn snapshot(&self, time: usize) -> Result<SetSnapshot<R>> {
        let root = self.history.root_at(time)?.cloned();
        Ok(SetSnapshot { root, time })
    }
}

impl<R, E> Versioned for PersistentOrderedSet<R, E> {
    type Snapshot = SetSnapshot<R>;

    fn current_time(&self) -> usize {
        self.history.current_time()
    }

    fn snapshot(&self, time: usize) -> Result<Self::Snapshot> {
        Self::snapshot(self, time)
    }
}

impl<R, E> Extend<R> for PersistentOrderedSet<R, E>
where
    E: KeyExtractor<R>,
{
    /// Inserts each record in turn; every record gets its own version.
    fn extend<I: IntoIterator<Item = R>>(&mut self, iter: I) {
        for record in iter {
            self.insert(record);
        }
    }
}

impl<'a, R, E> IntoIterator for &'a PersistentOrderedSet<R, E> {
    type Item = &'a R;
    type IntoIter = PersistentOrderedSetIterator<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<R: fmt::Debug, E> fmt::Debug for PersistentOrderedSet<R, E> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("PersistentOrderedSet")
            .field("field", &self.field)
            .field("current_time", &self.current_time())
            .field("elements", &self.get_all_elements())
            .finish()
    }
}

// =============================================================================
// Snapshot
// =============================================================================

/// A frozen, owned view of one version of a [`PersistentOrderedSet`].
///
/// Cloning a snapshot is O(1). With the `arc` feature a snapshot can be sent
/// to another thread and read there while the set keeps changing.
///
/// # Examples
///
/// ```rust
/// use persistent_history::persistent::PersistentOrderedSet;
///
/// let mut set = PersistentOrderedSet::new("n", |record: &u32, _: &str| format!("{record:03}"));
/// set.extend([20, 10, 30]);
/// let snapshot = set.snapshot(2).unwrap();
/// set.delete(&20).unwrap();
///
/// assert_eq!(snapshot.to_vec(), vec![&10, &20]);
/// assert_eq!(snapshot.root_key(), Some("020"));
/// assert!(snapshot.contains_key("010"));
/// ```
pub struct SetSnapshot<R> {
    root: Link<R>,
    time: usize,
}

impl<R> SetSnapshot<R> {
    /// Returns the time index this snapshot was taken at.
    #[inline]
    #[must_use]
    pub const fn time(&self) -> usize {
        self.time
    }

    /// Returns the number of records in this version.
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Returns `true` if this version holds no records.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns `true` if a record with this sort key (ignoring case) is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        contains_key(self.root.as_ref(), key)
    }

    /// Returns the sort key stored at the root of this version.
    #[must_use]
    pub fn root_key(&self) -> Option<&str> {
        self.root.as_deref().map(|node| &*node.key)
    }

    /// Returns an in-order iterator over the records.
    #[must_use]
    pub fn iter(&self) -> PersistentOrderedSetIterator<'_, R> {
        PersistentOrderedSetIterator::new(self.root.as_ref())
    }

    /// Returns the records in ascending key order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<&R> {
        self.iter().collect()
    }
}

impl<R> Clone for SetSnapshot<R> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            time: self.time,
        }
    }
}

impl<'a, R> IntoIterator for &'a SetSnapshot<R> {
    type Item = &'a R;
    type IntoIter = PersistentOrderedSetIterator<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<R: fmt::Debug> fmt::Debug for SetSnapshot<R> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_list().entries(self.iter()).finish()
    }
}

#[cfg(feature = "serde")]
impl<R: serde::Serialize> serde::Serialize for SetSnapshot<R> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(self.iter())
    }
}

// =============================================================================
// Iterator
// =============================================================================

/// In-order iterator over the records of one version.
///
/// Walks with an explicit stack, so deep (degenerate) trees are safe.
pub struct PersistentOrderedSetIterator<'a, R> {
    stack: SmallVec<[&'a Node<R>; PATH_INLINE_CAPACITY]>,
}

impl<'a, R> PersistentOrderedSetIterator<'a, R> {
    fn new(root: Option<&'a ReferenceCounter<Node<R>>>) -> Self {
        let mut iterator = Self {
            stack: SmallVec::new(),
        };
        iterator.push_left_spine(root);
        iterator
    }

    fn push_left_spine(&mut self, mut link: Option<&'a ReferenceCounter<Node<R>>>) {
        while let Some(node) = link {
            self.stack.push(&**node);
            link = node.left.as_ref();
        }
    }
}

impl<'a, R> Iterator for PersistentOrderedSetIterator<'a, R> {
    type Item = &'a R;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.push_left_spine(node.right.as_ref());
        Some(&*node.record)
    }
}

impl<R> FusedIterator for PersistentOrderedSetIterator<'_, R> {}

// =============================================================================
// Tests
// =============================================================================
