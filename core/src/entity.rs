//! Normalized entity collections.
//!
//! An [`EntityStore`] is a keyed, insertion-ordered collection for one record
//! type, with pure CRUD-style operations and derived read selectors. It is the
//! in-memory cache of a remote collection: reducers commit records into it in
//! response to committed events, and selectors read from it.
//!
//! Ordering is insertion order; there is no implicit sorting. Updating an
//! absent id is a no-op, not an error - callers needing existence guarantees
//! must check first.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;

/// A record type that can live in an [`EntityStore`].
pub trait Entity: Clone {
    /// Key type for the collection
    type Id: Copy + Eq + Hash + Display;

    /// The record's key
    fn id(&self) -> Self::Id;
}

/// Normalized, keyed, in-memory collection for one record type.
///
/// Internally a `Vec` of ids (insertion order) plus an id → record map, the
/// same shape as a normalized entity adapter. All mutation goes through the
/// four operations below; readers only ever see a consistent snapshot because
/// the runtime serializes reducer execution.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound(
    serialize = "T: Serialize, T::Id: Serialize",
    deserialize = "T: Deserialize<'de>, T::Id: Deserialize<'de>"
))]
pub struct EntityStore<T: Entity> {
    ids: Vec<T::Id>,
    entities: HashMap<T::Id, T>,

    /// A request against the backing service is in flight
    pub loading: bool,
    /// The first successful load has completed
    pub loaded: bool,
    /// Last error surfaced for this collection, if any
    pub error: Option<String>,
    /// Currently selected record, if any
    pub selected_id: Option<T::Id>,
    /// Load generation counter; bumped per load so stale results can be
    /// discarded (last-load-wins)
    pub generation: u64,
}

impl<T: Entity> Default for EntityStore<T> {
    fn default() -> Self {
        Self {
            ids: Vec::new(),
            entities: HashMap::new(),
            loading: false,
            loaded: false,
            error: None,
            selected_id: None,
            generation: 0,
        }
    }
}

impl<T: Entity> EntityStore<T> {
    /// Create an empty collection (`loading = false`, `loaded = false`)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole collection with `records`, preserving their order
    ///
    /// Duplicate ids keep the last occurrence.
    pub fn set_all(&mut self, records: Vec<T>) {
        self.ids.clear();
        self.entities.clear();
        for record in records {
            let id = record.id();
            if self.entities.insert(id, record).is_none() {
                self.ids.push(id);
            }
        }
    }

    /// Append one record
    ///
    /// If a record with the same id already exists it is replaced in place
    /// (its position is kept).
    pub fn add_one(&mut self, record: T) {
        let id = record.id();
        if self.entities.insert(id, record).is_none() {
            self.ids.push(id);
        }
    }

    /// Update the record with `id` in place via `f`
    ///
    /// No-op when the id is absent.
    pub fn update_one<F>(&mut self, id: T::Id, f: F)
    where
        F: FnOnce(&mut T),
    {
        if let Some(record) = self.entities.get_mut(&id) {
            f(record);
        }
    }

    /// Remove the record with `id`
    ///
    /// Clears the selection if it pointed at the removed record. No-op when
    /// the id is absent.
    pub fn remove_one(&mut self, id: T::Id) {
        if self.entities.remove(&id).is_some() {
            self.ids.retain(|existing| *existing != id);
            if self.selected_id == Some(id) {
                self.selected_id = None;
            }
        }
    }

    /// All records in insertion order
    pub fn select_all(&self) -> impl Iterator<Item = &T> {
        self.ids.iter().filter_map(|id| self.entities.get(id))
    }

    /// Look up one record by id
    #[must_use]
    pub fn select_by_id(&self, id: T::Id) -> Option<&T> {
        self.entities.get(&id)
    }

    /// Number of records
    #[must_use]
    pub fn select_total(&self) -> usize {
        self.ids.len()
    }

    /// Ids in insertion order
    #[must_use]
    pub fn select_ids(&self) -> &[T::Id] {
        &self.ids
    }

    /// The currently selected record, if any
    #[must_use]
    pub fn selected(&self) -> Option<&T> {
        self.selected_id.and_then(|id| self.entities.get(&id))
    }

    /// Whether the collection holds no records
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Whether a record with `id` exists
    #[must_use]
    pub fn contains(&self, id: T::Id) -> bool {
        self.entities.contains_key(&id)
    }
}
