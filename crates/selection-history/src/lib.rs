#![forbid(unsafe_code)]

//! Back/forward navigation over a history of object selections.
//!
//! A host (an editor, a file browser, anything with a "current selection")
//! reports every selection change; the user can then step backward and
//! forward through earlier selections the way a browser steps through pages.
//! Entries whose objects have since been destroyed are skipped or trimmed.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         HistorySession                           │
//! │  ┌──────────────────────────────────┐   ┌─────────────────────┐  │
//! │  │ Navigator / SharedNavigator      │   │ HistoryPersistence  │  │
//! │  │  ┌────────────────────────────┐  │   │  HistoryStore       │  │
//! │  │  │ NavigationEngine           │  │   │  (Memory / File)    │  │
//! │  │  │  back: HistoryStack        │  │◄──┤  load at startup    │  │
//! │  │  │  forward: HistoryStack     │  │──►│  save at shutdown   │  │
//! │  │  │  pending: NavigationCause  │  │   └─────────────────────┘  │
//! │  │  └────────────────────────────┘  │                            │
//! │  └───────▲───────────────┬──────────┘                            │
//! └──────────┼───────────────┼───────────────────────────────────────┘
//!     notify │               │ set_current_selection
//!   ┌────────┴───────────────▼───────┐      ┌────────────────────┐
//!   │ SelectionHost (SelectionCell)  │      │ ObjectRegistry     │
//!   └────────────────────────────────┘      └────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```
//! use std::rc::Rc;
//! use selection_history::{
//!     HistoryConfig, HistoryNavigator, HistorySession, MemoryStore, ObjectId, ObjectTable,
//!     SelectionCell, SelectionSnapshot,
//! };
//!
//! let objects = Rc::new(ObjectTable::with_objects((1..=3).map(ObjectId::new)));
//! let selection = SelectionCell::default();
//! let store = MemoryStore::new();
//!
//! let session = HistorySession::start(
//!     &HistoryConfig::for_workspace("/projects/demo"),
//!     selection.clone(),
//!     objects,
//!     &store,
//! );
//! let _wiring = session.attach(&selection);
//!
//! for id in 1..=3 {
//!     selection.set(SelectionSnapshot::new([ObjectId::new(id)]));
//! }
//! assert!(session.navigator().navigate_backward());
//! assert_eq!(selection.get(), SelectionSnapshot::new([ObjectId::new(2)]));
//!
//! session.shutdown();
//! ```

pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod host;
pub mod navigator;
pub mod persistence;
pub mod selection_cell;
pub mod session;
pub mod snapshot;
pub mod stack;

pub use command::NavigationCommand;
pub use config::HistoryConfig;
pub use engine::{Direction, NavigationCause, NavigationEngine, NavigationTarget, Observation};
pub use error::{ConfigError, PersistenceError};
pub use host::{ObjectRegistry, ObjectTable, SelectionHost};
pub use navigator::{HistoryNavigator, Navigator, SharedNavigator};
pub use persistence::{
    FileStore, HistoryPersistence, HistoryRecord, HistoryStore, LoadOutcome, MemoryStore,
    workspace_key,
};
pub use selection_cell::{SelectionCell, Subscription};
pub use session::{HistorySession, open_store};
pub use snapshot::{ObjectId, SelectionSnapshot};
pub use stack::{HistoryStack, MAX_DEPTH};
