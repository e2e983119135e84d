#![forbid(unsafe_code)]

//! Session lifecycle: the explicit context object a host owns.
//!
//! ```text
//! startup                          running                         shutdown
//! ───────                          ───────                         ────────
//! HistorySession::start            host notifies ──► navigator     session.shutdown()
//!   load record (before wiring)    UI ──► navigate_backward/forward   save record
//!   prime with current selection
//! session.attach(&cell)  ◄── wire notifications only after start returns
//! ```
//!
//! Load happens before any notification can reach the navigator. Save is
//! explicit: call [`HistorySession::shutdown`] (or [`HistorySession::save`] at
//! any suspension point) as the last step before the host tears down.
//! Persistence failures are logged and swallowed.

use std::fmt;
use std::rc::Rc;

use tracing::warn;

use crate::config::HistoryConfig;
use crate::engine::NavigationEngine;
use crate::host::{ObjectRegistry, SelectionHost};
use crate::navigator::Navigator;
use crate::persistence::{FileStore, HistoryPersistence, HistoryRecord, HistoryStore, LoadOutcome, MemoryStore};
use crate::selection_cell::{SelectionCell, Subscription};

/// Store chosen from a [`HistoryConfig`].
pub type DynStore = Box<dyn HistoryStore>;

/// Open the store a config asks for: a [`FileStore`] when `store_path` is
/// set, otherwise the process-wide [`MemoryStore`].
#[must_use]
pub fn open_store(config: &HistoryConfig) -> DynStore {
    match &config.store_path {
        Some(path) => Box::new(FileStore::new(path)),
        None => Box::new(MemoryStore::global()),
    }
}

/// A host's selection history: navigator plus persistence.
pub struct HistorySession<H, R, S> {
    navigator: Rc<Navigator<H, R>>,
    persistence: HistoryPersistence<S>,
    load_outcome: LoadOutcome,
}

impl<H, R, S> fmt::Debug for HistorySession<H, R, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistorySession")
            .field("navigator", &self.navigator)
            .field("load_outcome", &self.load_outcome)
            .finish_non_exhaustive()
    }
}

impl<H, R> HistorySession<H, R, DynStore>
where
    H: SelectionHost + 'static,
    R: ObjectRegistry + 'static,
{
    /// Start a session using the store named by `config`.
    pub fn from_config(config: &HistoryConfig, host: H, registry: R) -> Self {
        Self::start(config, host, registry, open_store(config))
    }
}

impl<H, R, S> HistorySession<H, R, S>
where
    H: SelectionHost + 'static,
    R: ObjectRegistry + 'static,
    S: HistoryStore,
{
    /// Restore this workspace's history and build the navigator.
    ///
    /// Wire the host's change notifications only after this returns. An
    /// out-of-range `max_depth` is logged and clamped to `1..=MAX_DEPTH`.
    pub fn start(config: &HistoryConfig, host: H, registry: R, store: S) -> Self {
        let problems = config.validate();
        if !problems.is_empty() {
            warn!(
                problems = %problems.join("; "),
                "using selection history config with invalid values"
            );
        }
        let persistence = HistoryPersistence::new(store, config.workspace_key());
        let mut engine = NavigationEngine::with_capacity(config.max_depth);
        let load_outcome = persistence.load_engine(&mut engine, &registry);
        let navigator = Rc::new(Navigator::with_engine_state(engine, host, registry));
        Self {
            navigator,
            persistence,
            load_outcome,
        }
    }

    /// The navigator, for UI surfaces and notifier wiring.
    #[must_use]
    pub fn navigator(&self) -> &Rc<Navigator<H, R>> {
        &self.navigator
    }

    /// What happened when history was loaded at startup.
    #[must_use]
    pub fn load_outcome(&self) -> &LoadOutcome {
        &self.load_outcome
    }

    /// The persistence layer.
    #[must_use]
    pub fn persistence(&self) -> &HistoryPersistence<S> {
        &self.persistence
    }

    /// Subscribe the navigator to a [`SelectionCell`].
    pub fn attach(&self, cell: &SelectionCell) -> Subscription {
        cell.subscribe(self.navigator.observer())
    }

    /// Save now. Failures are logged and reported as `None`.
    pub fn save(&self) -> Option<HistoryRecord> {
        match self.persistence.save(self.navigator.as_ref()) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(error = %e, key = self.persistence.key(), "failed to save selection history");
                None
            }
        }
    }

    /// Save and end the session.
    pub fn shutdown(self) -> Option<HistoryRecord> {
        self.save()
    }
}
