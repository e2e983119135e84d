#![forbid(unsafe_code)]

//! Collaborator interfaces supplied by the host environment.
//!
//! The history never owns the objects it refers to. It talks to the host
//! through two narrow capabilities:
//!
//! - [`SelectionHost`]: read and replace the ambient "current selection".
//!   Replacing it must synchronously notify the navigator (see
//!   [`Navigator::observe_selection_changed`](crate::Navigator::observe_selection_changed)).
//! - [`ObjectRegistry`]: decide whether an [`ObjectId`] still refers to a
//!   live object, and map persisted identifiers back to live ones.
//!
//! Both take `&self`: a host dispatching change notifications from inside
//! `set_current_selection` is re-entered while the call is still on the stack,
//! so it has to use interior mutability anyway.

use std::collections::HashSet;
use std::rc::Rc;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::snapshot::{ObjectId, SelectionSnapshot};

/// Ambient selection accessor and mutator.
pub trait SelectionHost {
    /// The selection as it is right now.
    fn current_selection(&self) -> SelectionSnapshot;

    /// Replace the selection. Hosts fire their change notification from here.
    fn set_current_selection(&self, selection: SelectionSnapshot);
}

/// Stable-identity bridge between stored ids and live objects.
pub trait ObjectRegistry {
    /// Map an identifier to the live object it names, or `None` if the
    /// referent no longer exists.
    fn resolve(&self, id: ObjectId) -> Option<ObjectId>;

    /// True when `id` still names a live object.
    fn is_alive(&self, id: ObjectId) -> bool {
        self.resolve(id).is_some()
    }
}

impl<T: SelectionHost + ?Sized> SelectionHost for Rc<T> {
    fn current_selection(&self) -> SelectionSnapshot {
        (**self).current_selection()
    }

    fn set_current_selection(&self, selection: SelectionSnapshot) {
        (**self).set_current_selection(selection);
    }
}

impl<T: SelectionHost + ?Sized> SelectionHost for Arc<T> {
    fn current_selection(&self) -> SelectionSnapshot {
        (**self).current_selection()
    }

    fn set_current_selection(&self, selection: SelectionSnapshot) {
        (**self).set_current_selection(selection);
    }
}

impl<T: ObjectRegistry + ?Sized> ObjectRegistry for Rc<T> {
    fn resolve(&self, id: ObjectId) -> Option<ObjectId> {
        (**self).resolve(id)
    }

    fn is_alive(&self, id: ObjectId) -> bool {
        (**self).is_alive(id)
    }
}

impl<T: ObjectRegistry + ?Sized> ObjectRegistry for Arc<T> {
    fn resolve(&self, id: ObjectId) -> Option<ObjectId> {
        (**self).resolve(id)
    }

    fn is_alive(&self, id: ObjectId) -> bool {
        (**self).is_alive(id)
    }
}

/// In-memory registry of live object ids.
///
/// Suitable for hosts whose identifiers are already stable across sessions,
/// and for tests. Thread-safe; destroying an object is a single removal.
#[derive(Debug, Default)]
pub struct ObjectTable {
    live: RwLock<HashSet<ObjectId>>,
}

impl ObjectTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table with the given objects alive.
    #[must_use]
    pub fn with_objects(ids: impl IntoIterator<Item = ObjectId>) -> Self {
        Self {
            live: RwLock::new(ids.into_iter().collect()),
        }
    }

    /// Mark an object alive. Returns false if it already was.
    pub fn insert(&self, id: ObjectId) -> bool {
        self.live.write().insert(id)
    }

    /// Destroy an object. Returns false if it was not alive.
    pub fn destroy(&self, id: ObjectId) -> bool {
        self.live.write().remove(&id)
    }

    /// Number of live objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live.read().len()
    }

    /// True when no object is alive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live.read().is_empty()
    }
}

impl ObjectRegistry for ObjectTable {
    fn resolve(&self, id: ObjectId) -> Option<ObjectId> {
        self.live.read().contains(&id).then_some(id)
    }
}
