#![forbid(unsafe_code)]

//! Save and restore navigation history across process restarts.
//!
//! # Record Format
//!
//! One record per workspace, stored as a JSON string under a key scoped to
//! the workspace root (see [`workspace_key`]):
//!
//! ```json
//! {
//!   "version": 1,
//!   "saved_at_ms": 1792224000000,
//!   "backward": [[12, 40], [7]],
//!   "forward": [[3]]
//! }
//! ```
//!
//! Each inner list is one snapshot, most recent first. Dead ids are omitted
//! when saving; ids that no longer resolve are dropped when loading, and
//! snapshots left empty by that are dropped too.
//!
//! # Failure Policy
//!
//! Loading never fails outward. A missing record leaves the history as it
//! is; a malformed record, an unknown version or an unreadable store resets
//! the history to empty and logs a warning.
//!
//! # Stores
//!
//! [`HistoryStore`] is a process-wide string key/value store.
//! [`MemoryStore`] keeps records in memory (and [`MemoryStore::global`] gives
//! one shared instance per process); [`FileStore`] keeps every key in a
//! single JSON object file, written with a temp-file-then-rename so a crash
//! mid-write never leaves a torn file.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{info, info_span, warn};

use crate::engine::NavigationEngine;
use crate::error::PersistenceError;
use crate::host::ObjectRegistry;
use crate::navigator::HistoryNavigator;
use crate::snapshot::{ObjectId, SelectionSnapshot};
use crate::stack::HistoryStack;

/// Current record format version.
pub const FORMAT_VERSION: u32 = 1;

/// Store key for `root` under `namespace`: `namespace(<absolute root>)`.
///
/// Relative roots are resolved against the current directory when it is
/// available.
#[must_use]
pub fn workspace_key(namespace: &str, root: &Path) -> String {
    let root = if root.is_absolute() {
        root.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(root))
            .unwrap_or_else(|_| root.to_path_buf())
    };
    format!("{namespace}({})", root.display())
}

// ============================================================================
// Record
// ============================================================================

/// Serialized form of both history stacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub version: u32,
    #[serde(default)]
    pub saved_at_ms: u64,
    pub backward: Vec<Vec<ObjectId>>,
    pub forward: Vec<Vec<ObjectId>>,
}

impl HistoryRecord {
    /// Capture the engine's stacks, omitting dead ids.
    pub fn capture<R: ObjectRegistry + ?Sized>(engine: &NavigationEngine, registry: &R) -> Self {
        let serialize = |stack: &HistoryStack| -> Vec<Vec<ObjectId>> {
            stack
                .iter()
                .map(|snapshot| {
                    snapshot
                        .ids()
                        .iter()
                        .copied()
                        .filter(|&id| registry.is_alive(id))
                        .collect()
                })
                .collect()
        };
        Self {
            version: FORMAT_VERSION,
            saved_at_ms: now_ms(),
            backward: serialize(engine.back()),
            forward: serialize(engine.forward()),
        }
    }

    /// Rebuild both stacks, resolving every id through `registry`.
    ///
    /// Returns `(back, forward)`, each truncated to `capacity`.
    pub fn restore<R: ObjectRegistry + ?Sized>(
        &self,
        registry: &R,
        capacity: usize,
    ) -> (HistoryStack, HistoryStack) {
        let deserialize = |lists: &[Vec<ObjectId>]| -> HistoryStack {
            HistoryStack::from_snapshots(
                capacity,
                lists
                    .iter()
                    .map(|ids| SelectionSnapshot::new(ids.iter().copied()).resolve(registry))
                    .filter(|snapshot| !snapshot.is_empty()),
            )
        };
        (deserialize(&self.backward), deserialize(&self.forward))
    }

    /// Encode as JSON.
    pub fn to_json(&self) -> Result<String, PersistenceError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode from JSON, rejecting unknown versions.
    pub fn from_json(json: &str) -> Result<Self, PersistenceError> {
        let record: Self = serde_json::from_str(json)?;
        if record.version != FORMAT_VERSION {
            return Err(PersistenceError::UnsupportedVersion {
                found: record.version,
                expected: FORMAT_VERSION,
            });
        }
        Ok(record)
    }
}

fn now_ms() -> u64 {
    web_time::SystemTime::now()
        .duration_since(web_time::SystemTime::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

// ============================================================================
// Stores
// ============================================================================

/// Process-wide string key/value store.
pub trait HistoryStore {
    /// The value under `key`, or `None` if absent.
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError>;

    /// Delete `key`. Deleting an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), PersistenceError>;
}

impl<T: HistoryStore + ?Sized> HistoryStore for &T {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        (**self).remove(key)
    }
}

impl<T: HistoryStore + ?Sized> HistoryStore for Box<T> {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        (**self).remove(key)
    }
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide shared store.
    pub fn global() -> &'static MemoryStore {
        static GLOBAL: OnceLock<MemoryStore> = OnceLock::new();
        GLOBAL.get_or_init(MemoryStore::new)
    }

    /// Number of keys held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// True when no key is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl HistoryStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.entries.lock().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// Store backed by one JSON object file mapping keys to values.
///
/// A missing file is an empty store. Writes go through a sibling temp file
/// and a rename. A corrupt file is reported by `get`; `set` and `remove`
/// replace it.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Store at `path`. Nothing is touched until the first access.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>, PersistenceError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(PersistenceError::io(&self.path, e)),
        };
        serde_json::from_str(&contents).map_err(|e| PersistenceError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    fn read_map_for_update(&self) -> Result<BTreeMap<String, String>, PersistenceError> {
        match self.read_map() {
            Err(PersistenceError::Corrupt { reason, .. }) => {
                warn!(
                    path = %self.path.display(),
                    reason = %reason,
                    "replacing corrupt history store"
                );
                Ok(BTreeMap::new())
            }
            other => other,
        }
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| PersistenceError::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(map)?;

        // Atomic write: temp file then rename
        let temp = self.path.with_extension("json.tmp");
        std::fs::write(&temp, json).map_err(|e| PersistenceError::io(&temp, e))?;
        std::fs::rename(&temp, &self.path).map_err(|e| PersistenceError::io(&self.path, e))?;
        Ok(())
    }
}

impl HistoryStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.read_map()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let mut map = self.read_map_for_update()?;
        map.insert(key.to_owned(), value.to_owned());
        self.write_map(&map)
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        let mut map = self.read_map_for_update()?;
        if map.remove(key).is_some() {
            self.write_map(&map)?;
        }
        Ok(())
    }
}

// ============================================================================
// Persistence
// ============================================================================

/// What [`HistoryPersistence::load`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No record for this workspace; history untouched.
    Absent,
    /// History replaced from the record.
    Restored { backward: usize, forward: usize },
    /// The record or store was unusable; history reset to empty.
    Reset { reason: String },
}

/// Saves and loads one workspace's history in a [`HistoryStore`].
#[derive(Debug)]
pub struct HistoryPersistence<S> {
    store: S,
    key: String,
}

impl<S: HistoryStore> HistoryPersistence<S> {
    /// Persist under an explicit key.
    #[must_use]
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Persist under the key for `root` with the default namespace.
    #[must_use]
    pub fn for_workspace(store: S, root: &Path) -> Self {
        Self::new(
            store,
            workspace_key(crate::config::DEFAULT_KEY_NAMESPACE, root),
        )
    }

    /// The store key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Write the engine's stacks under this workspace's key.
    pub fn save_engine<R: ObjectRegistry + ?Sized>(
        &self,
        engine: &NavigationEngine,
        registry: &R,
    ) -> Result<HistoryRecord, PersistenceError> {
        let _span = info_span!("selection_history.save", key = %self.key).entered();
        let record = HistoryRecord::capture(engine, registry);
        self.store.set(&self.key, &record.to_json()?)?;
        info!(
            backward = record.backward.len(),
            forward = record.forward.len(),
            "selection history saved"
        );
        Ok(record)
    }

    /// Replace the engine's stacks from this workspace's record.
    pub fn load_engine<R: ObjectRegistry + ?Sized>(
        &self,
        engine: &mut NavigationEngine,
        registry: &R,
    ) -> LoadOutcome {
        let _span = info_span!("selection_history.load", key = %self.key).entered();
        let record = match self.read_record() {
            Ok(Some(record)) => record,
            Ok(None) => {
                info!("no saved selection history");
                return LoadOutcome::Absent;
            }
            Err(e) => {
                warn!(error = %e, "discarding unreadable selection history");
                engine.replace_history(
                    HistoryStack::with_capacity(engine.capacity()),
                    HistoryStack::with_capacity(engine.capacity()),
                );
                return LoadOutcome::Reset {
                    reason: e.to_string(),
                };
            }
        };

        let (back, forward) = record.restore(registry, engine.capacity());
        let outcome = LoadOutcome::Restored {
            backward: back.len(),
            forward: forward.len(),
        };
        info!(
            backward = back.len(),
            forward = forward.len(),
            dropped = record.backward.len() + record.forward.len() - back.len() - forward.len(),
            "selection history restored"
        );
        engine.replace_history(back, forward);
        outcome
    }

    /// [`save_engine`](Self::save_engine) for a navigator.
    pub fn save<N: HistoryNavigator>(&self, navigator: &N) -> Result<HistoryRecord, PersistenceError> {
        navigator.with_engine(|engine| self.save_engine(engine, navigator.registry()))
    }

    /// [`load_engine`](Self::load_engine) for a navigator.
    pub fn load<N: HistoryNavigator>(&self, navigator: &N) -> LoadOutcome {
        navigator.with_engine(|engine| self.load_engine(engine, navigator.registry()))
    }

    /// Delete this workspace's record.
    pub fn forget(&self) -> Result<(), PersistenceError> {
        self.store.remove(&self.key)
    }

    fn read_record(&self) -> Result<Option<HistoryRecord>, PersistenceError> {
        match self.store.get(&self.key)? {
            Some(json) if !json.trim().is_empty() => HistoryRecord::from_json(&json).map(Some),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ObjectTable;

    fn sel(raw: &[u64]) -> SelectionSnapshot {
        raw.iter().copied().map(ObjectId::new).collect()
    }

    fn ids(raw: &[u64]) -> Vec<ObjectId> {
        raw.iter().copied().map(ObjectId::new).collect()
    }

    fn engine_with(selections: &[&[u64]]) -> NavigationEngine {
        let mut engine = NavigationEngine::new();
        for s in selections {
            engine.observe_selection_changed(sel(s));
        }
        engine
    }

    #[test]
    fn capture_omits_dead_ids() {
        let registry = ObjectTable::with_objects(ids(&[1, 3]));
        let engine = engine_with(&[&[1, 2], &[3], &[4]]);
        let record = HistoryRecord::capture(&engine, &registry);
        assert_eq!(record.version, FORMAT_VERSION);
        assert_eq!(record.backward, vec![ids(&[3]), ids(&[1])]);
        assert!(record.forward.is_empty());
    }

    #[test]
    fn restore_drops_unresolved_and_empty() {
        let registry = ObjectTable::with_objects(ids(&[1, 2]));
        let record = HistoryRecord {
            version: FORMAT_VERSION,
            saved_at_ms: 0,
            backward: vec![ids(&[1, 9]), ids(&[9]), ids(&[2])],
            forward: vec![vec![]],
        };
        let (back, forward) = record.restore(&registry, 128);
        let back: Vec<_> = back.iter().cloned().collect();
        assert_eq!(back, vec![sel(&[1]), sel(&[2])]);
        assert!(forward.is_empty());
    }

    #[test]
    fn unknown_version_rejected() {
        let json = r#"{"version": 99, "backward": [], "forward": []}"#;
        assert!(matches!(
            HistoryRecord::from_json(json),
            Err(PersistenceError::UnsupportedVersion { found: 99, .. })
        ));
    }

    #[test]
    fn memory_store_round_trip() {
        let registry = ObjectTable::with_objects(ids(&[1, 2, 3]));
        let persistence = HistoryPersistence::new(MemoryStore::new(), "k");
        let engine = engine_with(&[&[1], &[2], &[3]]);
        persistence.save_engine(&engine, &registry).unwrap();

        let mut restored = NavigationEngine::new();
        let outcome = persistence.load_engine(&mut restored, &registry);
        assert_eq!(
            outcome,
            LoadOutcome::Restored {
                backward: 2,
                forward: 0
            }
        );
        assert_eq!(restored.back(), engine.back());
    }

    #[test]
    fn absent_record_leaves_history() {
        let registry = ObjectTable::with_objects(ids(&[1, 2]));
        let persistence = HistoryPersistence::new(MemoryStore::new(), "missing");
        let mut engine = engine_with(&[&[1], &[2]]);
        assert_eq!(
            persistence.load_engine(&mut engine, &registry),
            LoadOutcome::Absent
        );
        assert_eq!(engine.back().len(), 1);
    }

    #[test]
    fn corrupt_record_resets_history() {
        let registry = ObjectTable::with_objects(ids(&[1, 2]));
        let store = MemoryStore::new();
        store.set("k", "{not json").unwrap();
        let persistence = HistoryPersistence::new(store, "k");
        let mut engine = engine_with(&[&[1], &[2]]);
        let outcome = persistence.load_engine(&mut engine, &registry);
        assert!(matches!(outcome, LoadOutcome::Reset { .. }));
        assert!(engine.back().is_empty());
        assert!(engine.forward().is_empty());
    }

    #[test]
    #[tracing_test::traced_test]
    fn corrupt_record_is_logged() {
        let store = MemoryStore::new();
        store
            .set("k", r#"{"version": 7, "backward": [], "forward": []}"#)
            .unwrap();
        let persistence = HistoryPersistence::new(store, "k");
        let mut engine = NavigationEngine::new();
        persistence.load_engine(&mut engine, &ObjectTable::new());
        assert!(logs_contain("discarding unreadable selection history"));
    }

    #[test]
    #[tracing_test::traced_test]
    fn save_is_logged() {
        let registry = ObjectTable::with_objects(ids(&[1, 2]));
        let persistence = HistoryPersistence::new(MemoryStore::new(), "k");
        persistence
            .save_engine(&engine_with(&[&[1], &[2]]), &registry)
            .unwrap();
        assert!(logs_contain("selection history saved"));
    }

    #[test]
    fn workspaces_do_not_collide() {
        let store = MemoryStore::new();
        let registry = ObjectTable::with_objects(ids(&[1, 2]));
        let a = HistoryPersistence::for_workspace(&store, Path::new("/work/a"));
        let b = HistoryPersistence::for_workspace(&store, Path::new("/work/b"));
        a.save_engine(&engine_with(&[&[1], &[2]]), &registry)
            .unwrap();

        let mut engine = NavigationEngine::new();
        assert_eq!(b.load_engine(&mut engine, &registry), LoadOutcome::Absent);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("none.json"));
        assert_eq!(store.get("k").unwrap(), None);
        store.remove("k").unwrap();
    }

    #[test]
    fn file_store_persists_and_removes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("history.json");
        let store = FileStore::new(&path);
        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();

        let reopened = FileStore::new(&path);
        assert_eq!(reopened.get("a").unwrap().as_deref(), Some("1"));
        reopened.remove("a").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
        assert_eq!(store.get("b").unwrap().as_deref(), Some("2"));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn file_store_reports_then_replaces_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, "[1, 2").unwrap();
        let store = FileStore::new(&path);
        assert!(matches!(
            store.get("k"),
            Err(PersistenceError::Corrupt { .. })
        ));
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn workspace_key_is_absolute() {
        let key = workspace_key("ns", Path::new("relative/dir"));
        assert!(key.starts_with("ns("));
        assert!(key.ends_with(")"));
        let inner = &key[3..key.len() - 1];
        assert!(Path::new(inner).is_absolute());
    }
}
