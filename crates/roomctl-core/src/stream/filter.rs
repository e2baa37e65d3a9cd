// ── Filter predicates for room snapshots ──
//
// Lets consumers narrow a snapshot without re-querying the server.

use crate::model::{RoomEntry, RoomState};

/// Filter predicate for room collections.
pub enum RoomFilter {
    All,
    ByState(RoomState),
    /// Room carries `key=value` among its labels.
    ByLabel { key: String, value: String },
    /// Case-insensitive substring of the room name.
    NameContains(String),
    Ready,
    Outdated,
    Custom(Box<dyn Fn(&RoomEntry) -> bool + Send + Sync>),
}

impl RoomFilter {
    pub fn matches(&self, room: &RoomEntry) -> bool {
        match self {
            Self::All => true,
            Self::ByState(state) => room.state() == *state,
            Self::ByLabel { key, value } => room.labels.get(key) == Some(value),
            Self::NameContains(needle) => room
                .name
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            Self::Ready => room.is_ready,
            Self::Outdated => room.is_outdated,
            Self::Custom(f) => f(room),
        }
    }
}
