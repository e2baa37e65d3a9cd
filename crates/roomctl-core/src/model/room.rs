// ── Room domain types ──

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Coarse lifecycle state derived from the `running`/`paused` flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum RoomState {
    Running,
    Paused,
    Stopped,
}

/// The canonical projected room.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomEntry {
    pub id: String,
    pub url: String,
    pub name: String,
    pub neko_image: String,
    pub is_outdated: bool,
    /// 0 when the server multiplexes all rooms over shared ports.
    pub max_connections: u16,
    pub running: bool,
    pub paused: bool,
    pub is_ready: bool,
    /// Server status label (`Up`, `Exited`, `Paused`, or a docker status line).
    pub status: String,
    pub created: Option<DateTime<Utc>>,
    pub labels: BTreeMap<String, String>,
}

impl RoomEntry {
    /// Skeleton entry carrying only an id.
    pub fn skeleton(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Entry built from defaults plus every field present in `patch`.
    pub fn from_patch(patch: &RoomPatch) -> Self {
        let mut entry = Self::skeleton(patch.id.clone());
        entry.apply(patch);
        entry
    }

    /// Field-wise merge: present fields override, absent fields are kept.
    pub fn apply(&mut self, patch: &RoomPatch) {
        if let Some(ref v) = patch.url {
            v.clone_into(&mut self.url);
        }
        if let Some(ref v) = patch.name {
            v.clone_into(&mut self.name);
        }
        if let Some(ref v) = patch.neko_image {
            v.clone_into(&mut self.neko_image);
        }
        if let Some(v) = patch.is_outdated {
            self.is_outdated = v;
        }
        if let Some(v) = patch.max_connections {
            self.max_connections = v;
        }
        if let Some(v) = patch.running {
            self.running = v;
        }
        if let Some(v) = patch.paused {
            self.paused = v;
        }
        if let Some(v) = patch.is_ready {
            self.is_ready = v;
        }
        if let Some(ref v) = patch.status {
            v.clone_into(&mut self.status);
        }
        if let Some(v) = patch.created {
            self.created = Some(v);
        }
        if let Some(ref v) = patch.labels {
            v.clone_into(&mut self.labels);
        }
    }

    pub fn state(&self) -> RoomState {
        if self.paused {
            RoomState::Paused
        } else if self.running {
            RoomState::Running
        } else {
            RoomState::Stopped
        }
    }
}

/// Partial update for a [`RoomEntry`]. `None` means "leave as is".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomPatch {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neko_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_outdated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub running: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paused: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_ready: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
}

impl RoomPatch {
    /// A patch that touches nothing but names the room.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::new(self.id.clone())
    }
}

/// How a room reaches the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomUpsert {
    /// Server-confirmed full entry. Replaces any existing entry wholesale.
    Full(RoomEntry),
    /// Field-wise merge onto the existing entry.
    Patch(RoomPatch),
}

impl RoomUpsert {
    pub fn id(&self) -> &str {
        match self {
            Self::Full(entry) => &entry.id,
            Self::Patch(patch) => &patch.id,
        }
    }
}

/// Where a previously unknown room lands in the ordered list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    Front,
    Back,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_overrides_only_present_fields() {
        let mut entry = RoomEntry {
            id: "r1".into(),
            name: "A".into(),
            status: "Exited".into(),
            ..RoomEntry::default()
        };
        entry.apply(&RoomPatch {
            running: Some(true),
            status: Some("Up".into()),
            ..RoomPatch::new("r1")
        });

        assert_eq!(entry.name, "A");
        assert!(entry.running);
        assert_eq!(entry.status, "Up");
    }

    #[test]
    fn from_patch_fills_defaults() {
        let entry = RoomEntry::from_patch(&RoomPatch {
            paused: Some(true),
            ..RoomPatch::new("r2")
        });
        assert_eq!(entry.id, "r2");
        assert!(entry.paused);
        assert!(entry.name.is_empty());
        assert_eq!(entry.state(), RoomState::Paused);
    }

    #[test]
    fn state_prefers_paused_over_running() {
        let entry = RoomEntry {
            running: true,
            paused: true,
            ..RoomEntry::skeleton("r3")
        };
        assert_eq!(entry.state(), RoomState::Paused);
        assert_eq!(RoomEntry::skeleton("r4").state(), RoomState::Stopped);
    }

    #[test]
    fn room_state_parses_case_insensitively() {
        assert_eq!("Running".parse::<RoomState>().ok(), Some(RoomState::Running));
        assert_eq!(RoomState::Stopped.to_string(), "stopped");
    }

    #[test]
    fn empty_patch_detection() {
        assert!(RoomPatch::new("r1").is_empty());
        assert!(
            !RoomPatch {
                is_ready: Some(false),
                ..RoomPatch::new("r1")
            }
            .is_empty()
        );
    }
}
