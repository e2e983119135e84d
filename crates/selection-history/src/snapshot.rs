#![forbid(unsafe_code)]

//! Stable object identifiers and immutable selection snapshots.
//!
//! A [`SelectionSnapshot`] records *which* objects were selected at one
//! instant, in selection order. It holds [`ObjectId`]s rather than the
//! objects themselves: the host owns every referent and may destroy it at any
//! time, so a snapshot can silently become partially (or fully) dead. Liveness
//! is only ever decided at read time through an [`ObjectRegistry`].

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::host::ObjectRegistry;

/// Stable opaque identifier of a host object.
///
/// Identifiers are issued by the host and stay valid for the lifetime of the
/// referent. Serialized as a bare integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(u64);

impl ObjectId {
    /// Wrap a raw host identifier.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw host identifier.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl From<u64> for ObjectId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An immutable, ordered capture of a selection.
///
/// Cloning is O(1): the id list is shared behind an `Arc`.
///
/// # Invariants
///
/// 1. The id sequence never changes after construction.
/// 2. [`is_empty`](Self::is_empty) counts references, not live references.
///    A snapshot whose every referent died is *not* empty, it is fully dead.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct SelectionSnapshot {
    ids: Arc<[ObjectId]>,
}

impl fmt::Debug for SelectionSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.ids.iter()).finish()
    }
}

impl SelectionSnapshot {
    /// Capture a selection from its ids, in order.
    #[must_use]
    pub fn new(ids: impl IntoIterator<Item = ObjectId>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }

    /// The empty selection.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Ids in selection order, including dead ones.
    #[must_use]
    pub fn ids(&self) -> &[ObjectId] {
        &self.ids
    }

    /// Number of references, dead or alive.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// True when the snapshot holds no references at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// True when at least one referent is still alive.
    pub fn has_live<R: ObjectRegistry + ?Sized>(&self, registry: &R) -> bool {
        self.ids.iter().any(|&id| registry.is_alive(id))
    }

    /// Copy of this snapshot with dead references removed.
    ///
    /// Returns `self` unchanged (sharing storage) when nothing is dead.
    pub fn live<R: ObjectRegistry + ?Sized>(&self, registry: &R) -> Self {
        if self.ids.iter().all(|&id| registry.is_alive(id)) {
            return self.clone();
        }
        Self::new(self.ids.iter().copied().filter(|&id| registry.is_alive(id)))
    }

    /// Resolve every id through the registry, keeping only those that resolve.
    ///
    /// Used when restoring persisted history, where the registry may map a
    /// stored identifier onto its current live handle.
    pub fn resolve<R: ObjectRegistry + ?Sized>(&self, registry: &R) -> Self {
        Self::new(self.ids.iter().filter_map(|&id| registry.resolve(id)))
    }
}

impl FromIterator<ObjectId> for SelectionSnapshot {
    fn from_iter<I: IntoIterator<Item = ObjectId>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl From<Vec<ObjectId>> for SelectionSnapshot {
    fn from(ids: Vec<ObjectId>) -> Self {
        Self { ids: ids.into() }
    }
}
