#![forbid(unsafe_code)]

//! Navigation-history state machine.
//!
//! [`NavigationEngine`] owns the back and forward stacks, the last observed
//! selection and a one-shot *pending cause*. The host's change notification
//! carries no payload and cannot tell a user click from a programmatic
//! assignment, so navigation tags the change it is about to cause:
//!
//! ```text
//!  navigate_backward()                     host                      engine
//!  ───────────────────                     ────                      ──────
//!  pop back (skip fully dead)
//!  pending = Backward ──────────────────────────────────────────────► pending
//!  set_current_selection(target) ───────► notify ──► observe_selection_changed()
//!                                                      cause = take(pending)  (→ External)
//!                                                      push old onto forward
//! ```
//!
//! The cause is consumed with a single take-and-reset, so exactly one
//! observation can ever see it.
//!
//! # Classification
//!
//! | pending    | effect on observation of `old → current`          |
//! |------------|---------------------------------------------------|
//! | `External` | clear forward, push `old` onto back               |
//! | `Forward`  | push `old` onto back (forward kept)               |
//! | `Backward` | push `old` onto forward                           |
//!
//! Nothing is recorded when `old` is absent or empty, or when it equals
//! `current` (a stale notification delivered after a nested change was
//! already observed).
//!
//! The engine itself never calls the host: [`begin_navigation`] hands back the
//! target and the driver ([`Navigator`](crate::Navigator) or
//! [`SharedNavigator`](crate::SharedNavigator)) performs the assignment.
//!
//! [`begin_navigation`]: NavigationEngine::begin_navigation

use std::fmt;

use tracing::debug;

use crate::host::ObjectRegistry;
use crate::snapshot::SelectionSnapshot;
use crate::stack::{HistoryStack, MAX_DEPTH};

/// What caused the next selection change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NavigationCause {
    /// The user or some unrelated code changed the selection.
    #[default]
    External,
    /// A forward navigation is in flight.
    Forward,
    /// A backward navigation is in flight.
    Backward,
}

/// Direction of an explicit navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Backward,
    Forward,
}

impl Direction {
    /// The cause tag a navigation in this direction leaves for the next
    /// observation.
    #[must_use]
    pub const fn cause(self) -> NavigationCause {
        match self {
            Self::Backward => NavigationCause::Backward,
            Self::Forward => NavigationCause::Forward,
        }
    }

    /// Lowercase name, for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Backward => "backward",
            Self::Forward => "forward",
        }
    }
}

/// Outcome of one observed selection change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// The previous selection was absent, empty or identical to the current
    /// one; nothing was recorded.
    Ignored,
    /// A fresh change: the previous selection went onto the back stack and
    /// `discarded_forward` forward entries were dropped.
    External { discarded_forward: usize },
    /// Caused by a forward navigation: previous selection pushed onto back.
    Forward,
    /// Caused by a backward navigation: previous selection pushed onto forward.
    Backward,
}

/// A navigation target chosen by [`NavigationEngine::begin_navigation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationTarget {
    /// The selection to assign, with dead references already removed.
    pub selection: SelectionSnapshot,
    /// Snapshots popped and discarded on the way: fully dead ones, and ones
    /// identical to the current selection.
    pub skipped: usize,
}

/// Back/forward selection history.
///
/// # Invariants
///
/// 1. `back.len() <= capacity` and `forward.len() <= capacity`.
/// 2. `pending` is `External` except between `begin_navigation` and the next
///    observation (or `abandon_pending`).
/// 3. An observation with an absent or empty previous selection, or one
///    equal to the current selection, never touches either stack.
/// 4. No stack head produced by observation equals the last observed
///    selection, and navigation never targets it.
#[derive(Clone)]
pub struct NavigationEngine {
    last_observed: Option<SelectionSnapshot>,
    pending: NavigationCause,
    back: HistoryStack,
    forward: HistoryStack,
}

impl fmt::Debug for NavigationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationEngine")
            .field("back_depth", &self.back.len())
            .field("forward_depth", &self.forward.len())
            .field("pending", &self.pending)
            .field("last_observed", &self.last_observed)
            .finish()
    }
}

impl Default for NavigationEngine {
    fn default() -> Self {
        Self::with_capacity(MAX_DEPTH)
    }
}

impl NavigationEngine {
    /// Create an engine whose stacks hold [`MAX_DEPTH`] snapshots each.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with a custom per-direction depth.
    #[must_use]
    pub fn with_capacity(depth: usize) -> Self {
        Self {
            last_observed: None,
            pending: NavigationCause::External,
            back: HistoryStack::with_capacity(depth),
            forward: HistoryStack::with_capacity(depth),
        }
    }

    // ========================================================================
    // Observation
    // ========================================================================

    /// Record the baseline selection without classifying anything.
    ///
    /// Called once when wiring up to a host whose selection is already
    /// non-empty, so the first real change has something to push.
    pub fn prime(&mut self, current: SelectionSnapshot) {
        self.last_observed = Some(current);
    }

    /// Handle a selection-change notification.
    ///
    /// `current` is the selection *after* the change. The pending cause is
    /// consumed here whether or not anything gets recorded.
    pub fn observe_selection_changed(&mut self, current: SelectionSnapshot) -> Observation {
        let cause = std::mem::take(&mut self.pending);
        if self.last_observed.as_ref() == Some(&current) {
            debug!(cause = ?cause, "selection change ignored: selection unchanged");
            return Observation::Ignored;
        }
        let old = self.last_observed.replace(current);

        let Some(old) = old.filter(|old| !old.is_empty()) else {
            debug!(cause = ?cause, "selection change ignored: no previous selection");
            return Observation::Ignored;
        };

        let observation = match cause {
            NavigationCause::External => {
                let discarded_forward = self.forward.len();
                self.forward.clear();
                self.back.push(old);
                Observation::External { discarded_forward }
            }
            NavigationCause::Forward => {
                self.back.push(old);
                Observation::Forward
            }
            NavigationCause::Backward => {
                self.forward.push(old);
                Observation::Backward
            }
        };

        debug!(
            cause = ?cause,
            back_depth = self.back.len(),
            forward_depth = self.forward.len(),
            "selection change recorded"
        );
        observation
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Pop the next usable snapshot in `direction` and arm the pending cause.
    ///
    /// Fully dead snapshots, and snapshots that would leave the selection
    /// unchanged, are discarded until a usable one turns up. Returns `None`, leaving the pending cause untouched, when the
    /// stack runs out. On success the caller must assign
    /// `target.selection` to the host immediately.
    pub fn begin_navigation<R: ObjectRegistry + ?Sized>(
        &mut self,
        direction: Direction,
        registry: &R,
    ) -> Option<NavigationTarget> {
        let stack = match direction {
            Direction::Backward => &mut self.back,
            Direction::Forward => &mut self.forward,
        };

        let mut skipped = 0;
        while let Some(snapshot) = stack.pop() {
            let selection = snapshot.live(registry);
            if selection.is_empty() || self.last_observed.as_ref() == Some(&selection) {
                skipped += 1;
                continue;
            }
            self.pending = direction.cause();
            debug!(
                direction = direction.as_str(),
                skipped,
                remaining = stack.len(),
                "navigation target chosen"
            );
            return Some(NavigationTarget { selection, skipped });
        }

        if skipped > 0 {
            debug!(
                direction = direction.as_str(),
                skipped, "navigation exhausted after discarding dead history"
            );
        }
        None
    }

    /// Disarm a pending cause the host never consumed.
    ///
    /// Returns the discarded cause, or `None` if nothing was pending. Drivers
    /// call this after the host assignment returns: a host that suppresses
    /// no-op changes would otherwise leave the cause to misclassify the next
    /// unrelated change.
    pub fn abandon_pending(&mut self) -> Option<NavigationCause> {
        match std::mem::take(&mut self.pending) {
            NavigationCause::External => None,
            cause => Some(cause),
        }
    }

    /// True iff some entry in `direction` still has a live reference.
    ///
    /// Scans the whole stack: a fully dead head does not make the rest
    /// unreachable.
    pub fn can_navigate<R: ObjectRegistry + ?Sized>(
        &self,
        direction: Direction,
        registry: &R,
    ) -> bool {
        self.stack(direction).any(|s| s.has_live(registry))
    }

    // ========================================================================
    // Maintenance
    // ========================================================================

    /// Forget all history and any pending cause. The last observed selection
    /// is kept so the next change still records it.
    pub fn clear(&mut self) {
        self.back.clear();
        self.forward.clear();
        self.pending = NavigationCause::External;
    }

    /// Replace both stacks wholesale (used when restoring persisted history).
    pub fn replace_history(&mut self, back: HistoryStack, forward: HistoryStack) {
        self.back = back;
        self.forward = forward;
    }

    // ========================================================================
    // Info
    // ========================================================================

    /// The stack for `direction`.
    #[must_use]
    pub fn stack(&self, direction: Direction) -> &HistoryStack {
        match direction {
            Direction::Backward => &self.back,
            Direction::Forward => &self.forward,
        }
    }

    /// The back stack, most recent first.
    #[must_use]
    pub fn back(&self) -> &HistoryStack {
        &self.back
    }

    /// The forward stack, most recent first.
    #[must_use]
    pub fn forward(&self) -> &HistoryStack {
        &self.forward
    }

    /// The selection seen by the most recent observation.
    #[must_use]
    pub fn last_observed(&self) -> Option<&SelectionSnapshot> {
        self.last_observed.as_ref()
    }

    /// The currently armed cause.
    #[must_use]
    pub fn pending(&self) -> NavigationCause {
        self.pending
    }

    /// Per-direction capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.back.capacity()
    }
}
