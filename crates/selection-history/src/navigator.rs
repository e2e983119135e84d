#![forbid(unsafe_code)]

//! Drivers that connect a [`NavigationEngine`] to a host.
//!
//! The engine decides *what* to navigate to; a driver performs the host
//! assignment and receives the resulting change notification. Two drivers
//! share the [`HistoryNavigator`] interface:
//!
//! - [`Navigator`]: single-threaded. State lives in a `RefCell` and no borrow
//!   is held while the host runs, so a host that notifies synchronously from
//!   inside `set_current_selection` re-enters
//!   [`observe_selection_changed`](HistoryNavigator::observe_selection_changed)
//!   safely.
//! - [`SharedNavigator`]: for hosts that touch the selection from several
//!   threads. One re-entrant mutex is held from arming the pending cause,
//!   through the host assignment, to the observation that consumes it. The
//!   observation on the navigating thread re-acquires the lock; observations
//!   from other threads wait until the navigation has been attributed.
//!
//! Both require the host to dispatch its notification synchronously with the
//! assignment. A notification deferred to a later event-loop turn would be
//! classified as external.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use parking_lot::ReentrantMutex;
use tracing::debug;

use crate::engine::{Direction, NavigationEngine, Observation};
use crate::host::{ObjectRegistry, SelectionHost};
use crate::snapshot::SelectionSnapshot;

/// Operations exposed to UI surfaces (menus, shortcuts, toolbar buttons,
/// extra mouse buttons) and to the host's change notifier.
pub trait HistoryNavigator {
    /// Registry used to decide liveness.
    type Registry: ObjectRegistry;

    /// Handle one selection-change notification from the host.
    fn observe_selection_changed(&self) -> Observation;

    /// Move one step in `direction`. Returns false (and changes nothing) when
    /// no live history remains that way.
    fn navigate(&self, direction: Direction) -> bool;

    /// True iff some history in `direction` still has a live reference.
    fn can_navigate(&self, direction: Direction) -> bool;

    /// Run `f` with exclusive access to the engine.
    ///
    /// `f` must not call back into the host.
    fn with_engine<T>(&self, f: impl FnOnce(&mut NavigationEngine) -> T) -> T;

    /// The liveness registry.
    fn registry(&self) -> &Self::Registry;

    fn navigate_backward(&self) -> bool {
        self.navigate(Direction::Backward)
    }

    fn navigate_forward(&self) -> bool {
        self.navigate(Direction::Forward)
    }

    fn can_navigate_backward(&self) -> bool {
        self.can_navigate(Direction::Backward)
    }

    fn can_navigate_forward(&self) -> bool {
        self.can_navigate(Direction::Forward)
    }

    /// Forget all back and forward history.
    fn clear(&self) {
        self.with_engine(NavigationEngine::clear);
    }
}

fn log_abandoned(engine: &mut NavigationEngine, direction: Direction) {
    if let Some(cause) = engine.abandon_pending() {
        debug!(
            direction = direction.as_str(),
            cause = ?cause,
            "host reported no change for navigation; pending cause dropped"
        );
    }
}

// ============================================================================
// Single-threaded driver
// ============================================================================

/// Single-threaded navigation driver.
///
/// Typically held in an `Rc` so the host's notifier can reach it; see
/// [`observer`](Self::observer).
pub struct Navigator<H, R> {
    engine: RefCell<NavigationEngine>,
    host: H,
    registry: R,
}

impl<H, R> fmt::Debug for Navigator<H, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Navigator")
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

impl<H: SelectionHost, R: ObjectRegistry> Navigator<H, R> {
    /// Create a driver with an empty engine primed with the host's current
    /// selection.
    #[must_use]
    pub fn new(host: H, registry: R) -> Self {
        Self::with_engine_state(NavigationEngine::new(), host, registry)
    }

    /// Create a driver around an existing engine (for instance one restored
    /// from persistence). The engine is primed with the host's current
    /// selection.
    #[must_use]
    pub fn with_engine_state(mut engine: NavigationEngine, host: H, registry: R) -> Self {
        engine.prime(host.current_selection());
        Self {
            engine: RefCell::new(engine),
            host,
            registry,
        }
    }

    /// The host this driver assigns selections to.
    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }
}

impl<H, R> Navigator<H, R>
where
    H: SelectionHost + 'static,
    R: ObjectRegistry + 'static,
{
    /// A notifier callback that forwards to
    /// [`observe_selection_changed`](HistoryNavigator::observe_selection_changed).
    ///
    /// Holds only a weak reference, so subscribing it does not keep the
    /// navigator alive. The payload is ignored; the current selection is
    /// re-read from the host.
    pub fn observer(self: &Rc<Self>) -> impl Fn(&SelectionSnapshot) + 'static {
        let weak: Weak<Self> = Rc::downgrade(self);
        move |_| {
            if let Some(nav) = weak.upgrade() {
                nav.observe_selection_changed();
            }
        }
    }
}

impl<H: SelectionHost, R: ObjectRegistry> HistoryNavigator for Navigator<H, R> {
    type Registry = R;

    fn observe_selection_changed(&self) -> Observation {
        let current = self.host.current_selection();
        self.engine.borrow_mut().observe_selection_changed(current)
    }

    fn navigate(&self, direction: Direction) -> bool {
        let target = self
            .engine
            .borrow_mut()
            .begin_navigation(direction, &self.registry);
        let Some(target) = target else {
            return false;
        };
        self.host.set_current_selection(target.selection);
        log_abandoned(&mut self.engine.borrow_mut(), direction);
        true
    }

    fn can_navigate(&self, direction: Direction) -> bool {
        self.engine.borrow().can_navigate(direction, &self.registry)
    }

    fn with_engine<T>(&self, f: impl FnOnce(&mut NavigationEngine) -> T) -> T {
        f(&mut self.engine.borrow_mut())
    }

    fn registry(&self) -> &R {
        &self.registry
    }
}

// ============================================================================
// Multi-threaded driver
// ============================================================================

/// Thread-safe navigation driver.
///
/// `Sync` whenever the host and registry are.
pub struct SharedNavigator<H, R> {
    state: ReentrantMutex<RefCell<NavigationEngine>>,
    host: H,
    registry: R,
}

impl<H, R> fmt::Debug for SharedNavigator<H, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedNavigator").finish_non_exhaustive()
    }
}

impl<H: SelectionHost, R: ObjectRegistry> SharedNavigator<H, R> {
    /// Create a driver with an empty engine primed with the host's current
    /// selection.
    #[must_use]
    pub fn new(host: H, registry: R) -> Self {
        Self::with_engine_state(NavigationEngine::new(), host, registry)
    }

    /// Create a driver around an existing engine.
    #[must_use]
    pub fn with_engine_state(mut engine: NavigationEngine, host: H, registry: R) -> Self {
        engine.prime(host.current_selection());
        Self {
            state: ReentrantMutex::new(RefCell::new(engine)),
            host,
            registry,
        }
    }

    /// The host this driver assigns selections to.
    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }
}

impl<H: SelectionHost, R: ObjectRegistry> HistoryNavigator for SharedNavigator<H, R> {
    type Registry = R;

    fn observe_selection_changed(&self) -> Observation {
        let guard = self.state.lock();
        let current = self.host.current_selection();
        guard.borrow_mut().observe_selection_changed(current)
    }

    fn navigate(&self, direction: Direction) -> bool {
        // Held until the resulting observation has consumed the cause.
        let guard = self.state.lock();
        let target = guard
            .borrow_mut()
            .begin_navigation(direction, &self.registry);
        let Some(target) = target else {
            return false;
        };
        self.host.set_current_selection(target.selection);
        log_abandoned(&mut guard.borrow_mut(), direction);
        true
    }

    fn can_navigate(&self, direction: Direction) -> bool {
        let guard = self.state.lock();
        guard.borrow().can_navigate(direction, &self.registry)
    }

    fn with_engine<T>(&self, f: impl FnOnce(&mut NavigationEngine) -> T) -> T {
        let guard = self.state.lock();
        f(&mut guard.borrow_mut())
    }

    fn registry(&self) -> &R {
        &self.registry
    }
}
