// ── Ordered room collection ──
//
// Insertion-ordered storage keyed by room id. Entries are `Arc`-shared
// with published snapshots and copied on write.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::model::{InsertPosition, RoomEntry, RoomUpsert};

/// Ordered rooms, at most one entry per id.
#[derive(Debug, Default)]
pub(crate) struct RoomCollection {
    by_id: IndexMap<String, Arc<RoomEntry>>,
}

impl RoomCollection {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Replace every entry. Input order becomes the canonical order; a
    /// repeated id keeps its first position and its last value.
    pub(crate) fn replace_all(&mut self, entries: Vec<RoomEntry>) {
        let mut by_id = IndexMap::with_capacity(entries.len());
        for entry in entries {
            by_id.insert(entry.id.clone(), Arc::new(entry));
        }
        self.by_id = by_id;
    }

    /// Insert or update a room. Returns `true` if the id was new.
    pub(crate) fn upsert(&mut self, upsert: RoomUpsert, position: InsertPosition) -> bool {
        if let Some(existing) = self.by_id.get_mut(upsert.id()) {
            match upsert {
                RoomUpsert::Full(entry) => *existing = Arc::new(entry),
                RoomUpsert::Patch(patch) => Arc::make_mut(existing).apply(&patch),
            }
            return false;
        }

        let entry = match upsert {
            RoomUpsert::Full(entry) => entry,
            RoomUpsert::Patch(patch) => RoomEntry::from_patch(&patch),
        };
        let id = entry.id.clone();
        let entry = Arc::new(entry);
        match position {
            InsertPosition::Front => {
                self.by_id.shift_insert(0, id, entry);
            }
            InsertPosition::Back => {
                self.by_id.insert(id, entry);
            }
        }
        true
    }

    /// Remove a room, keeping the order of the rest.
    pub(crate) fn remove(&mut self, id: &str) -> Option<Arc<RoomEntry>> {
        self.by_id.shift_remove(id)
    }

    pub(crate) fn get(&self, id: &str) -> Option<Arc<RoomEntry>> {
        self.by_id.get(id).map(Arc::clone)
    }

    pub(crate) fn len(&self) -> usize {
        self.by_id.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub(crate) fn to_vec(&self) -> Vec<Arc<RoomEntry>> {
        self.by_id.values().map(Arc::clone).collect()
    }
}
