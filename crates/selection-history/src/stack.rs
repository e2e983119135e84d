#![forbid(unsafe_code)]

//! Capacity-bounded stack of selection snapshots.
//!
//! [`HistoryStack`] keeps the most recent snapshot at the head. Pushing past
//! capacity evicts from the tail, so the oldest history silently falls off:
//!
//! ```text
//! capacity = 3
//!
//! push(d)
//! ┌──────────────────────────────┐      ┌──────────────────────────────┐
//! │ head → [c, b, a]             │ ───► │ head → [d, c, b]   (a evicted)│
//! └──────────────────────────────┘      └──────────────────────────────┘
//! ```
//!
//! Entries are stored in a `VecDeque` for O(1) insertion at the head and
//! O(1) eviction at the tail.

use std::collections::VecDeque;
use std::fmt;

use crate::snapshot::SelectionSnapshot;

/// Maximum number of snapshots retained per direction.
pub const MAX_DEPTH: usize = 128;

/// Bounded LIFO stack of [`SelectionSnapshot`]s, most recent first.
///
/// # Invariants
///
/// 1. `len() <= capacity()` after every operation.
/// 2. `1 <= capacity() <= MAX_DEPTH`.
/// 3. Eviction always removes the least recently pushed entry.
#[derive(Clone, PartialEq, Eq)]
pub struct HistoryStack {
    entries: VecDeque<SelectionSnapshot>,
    capacity: usize,
}

impl fmt::Debug for HistoryStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryStack")
            .field("len", &self.entries.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl Default for HistoryStack {
    fn default() -> Self {
        Self::with_capacity(MAX_DEPTH)
    }
}

impl HistoryStack {
    /// Create an empty stack holding at most [`MAX_DEPTH`] snapshots.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty stack with the given capacity.
    ///
    /// Clamped to `1..=MAX_DEPTH`: a depth can be lowered, never raised.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, MAX_DEPTH);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Build a stack from snapshots given most recent first.
    ///
    /// Entries beyond capacity are dropped from the tail.
    #[must_use]
    pub fn from_snapshots(
        capacity: usize,
        snapshots: impl IntoIterator<Item = SelectionSnapshot>,
    ) -> Self {
        let mut stack = Self::with_capacity(capacity);
        stack.entries.extend(snapshots.into_iter().take(stack.capacity));
        stack
    }

    // ====================================================================
    // Core Operations
    // ====================================================================

    /// Insert at the head, evicting the oldest entries beyond capacity.
    pub fn push(&mut self, snapshot: SelectionSnapshot) {
        self.entries.push_front(snapshot);
        self.entries.truncate(self.capacity);
    }

    /// Remove and return the head, or `None` if the stack is empty.
    pub fn pop(&mut self) -> Option<SelectionSnapshot> {
        self.entries.pop_front()
    }

    /// True if any entry satisfies `predicate`. Does not mutate.
    pub fn any(&self, predicate: impl FnMut(&SelectionSnapshot) -> bool) -> bool {
        self.entries.iter().any(predicate)
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    // ====================================================================
    // Query
    // ====================================================================

    /// The most recent entry, if any.
    #[must_use]
    pub fn peek(&self) -> Option<&SelectionSnapshot> {
        self.entries.front()
    }

    /// Entries from most recent to oldest.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &SelectionSnapshot> + '_ {
        self.entries.iter()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the stack holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries retained.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<'a> IntoIterator for &'a HistoryStack {
    type Item = &'a SelectionSnapshot;
    type IntoIter = std::collections::vec_deque::Iter<'a, SelectionSnapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
