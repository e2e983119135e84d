#![forbid(unsafe_code)]

//! Reference ambient selection with synchronous change notification.
//!
//! # Design
//!
//! [`SelectionCell`] wraps the current [`SelectionSnapshot`] in shared,
//! reference-counted storage (`Rc<RefCell<..>>`). When the selection changes
//! (determined by `PartialEq`), every live subscriber is called in
//! registration order *before* [`set`](SelectionCell::set) returns. That
//! synchronous dispatch is what lets a navigator attribute the change to the
//! navigation that caused it.
//!
//! Hosts with their own selection model implement
//! [`SelectionHost`] directly; this type is for hosts that have none, for
//! demos, and for tests.
//!
//! # Failure Modes
//!
//! - **Re-entrant set**: subscribers may call `set()` again. The borrow is
//!   released before callbacks run, so nested changes are delivered in
//!   order, depth first.
//! - **Subscriber leak**: dead weak references are pruned lazily on the next
//!   notification.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::debug_span;

use crate::host::SelectionHost;
use crate::snapshot::SelectionSnapshot;

type CallbackRc = Rc<dyn Fn(&SelectionSnapshot)>;
type CallbackWeak = Weak<dyn Fn(&SelectionSnapshot)>;

struct CellInner {
    value: SelectionSnapshot,
    version: u64,
    subscribers: Vec<CallbackWeak>,
}

/// A shared, version-tracked selection with change notification.
///
/// Cloning creates another handle to the **same** selection.
///
/// # Invariants
///
/// 1. `version` increments by exactly 1 on each value-changing `set`.
/// 2. `set(v)` where `v == current` is a no-op and notifies nobody.
/// 3. Subscribers are notified in registration order.
#[derive(Clone)]
pub struct SelectionCell {
    inner: Rc<RefCell<CellInner>>,
}

impl fmt::Debug for SelectionCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("SelectionCell")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .field("subscriber_count", &inner.subscribers.len())
            .finish()
    }
}

impl Default for SelectionCell {
    fn default() -> Self {
        Self::new(SelectionSnapshot::empty())
    }
}

impl SelectionCell {
    /// Create a cell holding `initial`. Version starts at 0.
    #[must_use]
    pub fn new(initial: SelectionSnapshot) -> Self {
        Self {
            inner: Rc::new(RefCell::new(CellInner {
                value: initial,
                version: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    /// The current selection.
    #[must_use]
    pub fn get(&self) -> SelectionSnapshot {
        self.inner.borrow().value.clone()
    }

    /// Replace the selection and notify subscribers if it changed.
    pub fn set(&self, value: SelectionSnapshot) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.value == value {
                return;
            }
            inner.value = value;
            inner.version += 1;
        }
        self.notify();
    }

    /// Register a change callback. It receives the new selection.
    ///
    /// Dropping the returned [`Subscription`] unsubscribes.
    pub fn subscribe(&self, callback: impl Fn(&SelectionSnapshot) + 'static) -> Subscription {
        let strong: CallbackRc = Rc::new(callback);
        self.inner
            .borrow_mut()
            .subscribers
            .push(Rc::downgrade(&strong));
        Subscription { _guard: strong }
    }

    /// Number of value-changing assignments so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Registered subscribers, including dead ones not yet pruned.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }

    fn notify(&self) {
        // Collect first so no borrow is held while callbacks run.
        let (callbacks, value) = {
            let mut inner = self.inner.borrow_mut();
            inner.subscribers.retain(|w| w.strong_count() > 0);
            let callbacks: Vec<CallbackRc> =
                inner.subscribers.iter().filter_map(Weak::upgrade).collect();
            (callbacks, inner.value.clone())
        };
        if callbacks.is_empty() {
            return;
        }

        let _span = debug_span!(
            "selection.notify",
            subscribers = callbacks.len(),
            selected = value.len()
        )
        .entered();
        for cb in &callbacks {
            cb(&value);
        }
    }
}

impl SelectionHost for SelectionCell {
    fn current_selection(&self) -> SelectionSnapshot {
        self.get()
    }

    fn set_current_selection(&self, selection: SelectionSnapshot) {
        self.set(selection);
    }
}

/// RAII guard for a [`SelectionCell`] subscriber.
#[must_use = "dropping the subscription unsubscribes immediately"]
pub struct Subscription {
    _guard: CallbackRc,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::ObjectId;
    use std::cell::Cell;

    fn sel(raw: &[u64]) -> SelectionSnapshot {
        raw.iter().copied().map(ObjectId::new).collect()
    }

    #[test]
    fn set_changes_value_and_version() {
        let cell = SelectionCell::default();
        assert!(cell.get().is_empty());
        cell.set(sel(&[1]));
        assert_eq!(cell.get(), sel(&[1]));
        assert_eq!(cell.version(), 1);
    }

    #[test]
    fn identical_set_is_silent() {
        let cell = SelectionCell::new(sel(&[1]));
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let _sub = cell.subscribe(move |_| h.set(h.get() + 1));
        cell.set(sel(&[1]));
        assert_eq!(hits.get(), 0);
        assert_eq!(cell.version(), 0);
    }

    #[test]
    fn subscribers_fire_before_set_returns() {
        let cell = SelectionCell::default();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        let _sub = cell.subscribe(move |v| s.borrow_mut().push(v.clone()));
        cell.set(sel(&[1]));
        cell.set(sel(&[2]));
        assert_eq!(*seen.borrow(), vec![sel(&[1]), sel(&[2])]);
    }

    #[test]
    fn dropped_subscription_is_pruned() {
        let cell = SelectionCell::default();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let sub = cell.subscribe(move |_| h.set(h.get() + 1));
        cell.set(sel(&[1]));
        drop(sub);
        cell.set(sel(&[2]));
        assert_eq!(hits.get(), 1);
        assert_eq!(cell.subscriber_count(), 0);
    }

    #[test]
    fn subscriber_may_read_cell() {
        let cell = SelectionCell::default();
        let reader = cell.clone();
        let seen = Rc::new(RefCell::new(None));
        let s = seen.clone();
        let _sub = cell.subscribe(move |_| *s.borrow_mut() = Some(reader.get()));
        cell.set(sel(&[5]));
        assert_eq!(*seen.borrow(), Some(sel(&[5])));
    }

    #[test]
    fn acts_as_selection_host() {
        let cell = SelectionCell::default();
        cell.set_current_selection(sel(&[3, 4]));
        assert_eq!(cell.current_selection(), sel(&[3, 4]));
    }
}
