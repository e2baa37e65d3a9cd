// Wire types for the room management API.
//
// Field names follow the server's snake_case JSON. Every struct is
// lenient on input (`#[serde(default)]`) so older servers that omit
// newer fields still decode.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Config ──────────────────────────────────────────────────────────

/// Server-wide capability descriptor returned by `GET /api/config/rooms`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomsConfigResponse {
    pub connections: u16,
    pub neko_images: Vec<String>,
    pub storage_enabled: bool,
    pub uses_mux: bool,
}

// ── Rooms ───────────────────────────────────────────────────────────

/// One row of `GET /api/rooms`, also returned by create/get/recreate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomEntryResponse {
    pub id: String,
    pub url: String,
    pub name: String,
    pub neko_image: String,
    pub is_outdated: bool,
    /// 0 when the server multiplexes connections.
    pub max_connections: u16,
    pub running: bool,
    pub paused: bool,
    pub is_ready: bool,
    pub status: String,
    pub created: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub labels: HashMap<String, String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MountType {
    #[default]
    Private,
    Template,
    Protected,
    Public,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomMount {
    #[serde(rename = "type")]
    pub mount_type: MountType,
    pub host_path: String,
    pub container_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomResources {
    /// Relative weight vs. other containers.
    pub cpu_shares: i64,
    /// In units of 10^-9 CPUs.
    pub nano_cpus: i64,
    /// Bytes.
    pub shm_size: i64,
    /// Bytes.
    pub memory: i64,
    pub gpus: Vec<String>,
    pub devices: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserPolicyType {
    #[default]
    Firefox,
    Chromium,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserPolicyExtension {
    pub id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserPolicyContent {
    pub extensions: Vec<BrowserPolicyExtension>,
    pub developer_tools: bool,
    pub persistent_data: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserPolicy {
    #[serde(rename = "type")]
    pub policy_type: BrowserPolicyType,
    pub path: String,
    pub content: BrowserPolicyContent,
}

/// Full mutable configuration of a room (`GET /api/rooms/{id}/settings`,
/// request body of create and recreate).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomSettings {
    #[serde(skip_serializing_if = "is_zero")]
    pub api_version: u32,

    pub name: String,
    pub neko_image: String,
    pub max_connections: u16,

    pub control_protection: bool,
    pub implicit_control: bool,

    pub user_pass: String,
    pub admin_pass: String,

    pub screen: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub video_codec: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub video_bitrate: u32,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub video_pipeline: String,
    pub video_max_fps: u32,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub audio_codec: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub audio_bitrate: u32,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub audio_pipeline: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub broadcast_pipeline: String,

    pub envs: HashMap<String, String>,
    pub labels: HashMap<String, String>,
    pub mounts: Vec<RoomMount>,
    pub resources: RoomResources,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub hostname: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dns: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_policy: Option<BrowserPolicy>,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_zero(v: &u32) -> bool {
    *v == 0
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomMember {
    pub id: String,
    #[serde(rename = "displayname")]
    pub display_name: String,
    pub admin: bool,
    pub muted: bool,
}

/// Live session statistics (`GET /api/rooms/{id}/stats`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomStats {
    pub connections: u32,
    pub host: String,
    pub members: Vec<RoomMember>,
    /// IP -> session ID that banned it.
    pub banned: HashMap<String, String>,
    /// Resource name -> session ID that locked it.
    pub locked: HashMap<String, String>,
    pub server_started_at: Option<DateTime<Utc>>,
    pub last_admin_left_at: Option<DateTime<Utc>>,
    pub last_user_left_at: Option<DateTime<Utc>>,
    pub control_protection: bool,
    pub implicit_control: bool,
}

// ── Pull ────────────────────────────────────────────────────────────

/// Request body for `POST /api/pull`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullStart {
    pub neko_image: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub registry_user: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub registry_pass: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PullProgressDetail {
    pub current: u64,
    pub total: u64,
}

/// One line of the docker pull progress stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PullLayer {
    pub status: String,
    #[serde(rename = "progressDetail")]
    pub progress_detail: Option<PullProgressDetail>,
    pub progress: String,
    pub id: String,
}

/// Singleton image-pull status (`GET /api/pull`, response of `POST /api/pull`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PullStatusResponse {
    pub active: bool,
    pub started: Option<DateTime<Utc>>,
    pub layers: Vec<PullLayer>,
    pub status: Vec<String>,
    pub finished: Option<DateTime<Utc>>,
}

// ── Events ──────────────────────────────────────────────────────────

/// Lifecycle transition reported on the `rooms` event channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomEventAction {
    Created,
    Started,
    Ready,
    Stopped,
    Destroyed,
    Paused,
    /// Anything a newer server may add.
    #[serde(untagged)]
    Other(String),
}

/// Payload of an `event: rooms` frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomEvent {
    pub id: String,
    pub action: RoomEventAction,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_entry_tolerates_missing_fields() {
        let entry: RoomEntryResponse = serde_json::from_str(
            r#"{"id":"abc123","name":"lobby","running":true,"status":"Up 2 minutes"}"#,
        )
        .expect("decode");
        assert_eq!(entry.id, "abc123");
        assert!(entry.running);
        assert!(!entry.paused);
        assert!(entry.labels.is_empty());
        assert!(entry.created.is_none());
    }

    #[test]
    fn settings_omit_empty_optional_fields() {
        let settings = RoomSettings {
            name: "lobby".into(),
            neko_image: "m1k1o/neko:firefox".into(),
            ..RoomSettings::default()
        };
        let json = serde_json::to_value(&settings).expect("encode");
        assert!(json.get("video_codec").is_none());
        assert!(json.get("browser_policy").is_none());
        assert!(json.get("api_version").is_none());
        assert_eq!(json["envs"], serde_json::json!({}));
    }

    #[test]
    fn mount_type_uses_lowercase_tag() {
        let mount: RoomMount = serde_json::from_str(
            r#"{"type":"protected","host_path":"/data","container_path":"/home/neko"}"#,
        )
        .expect("decode");
        assert_eq!(mount.mount_type, MountType::Protected);
    }

    #[test]
    fn unknown_event_action_is_preserved() {
        let event: RoomEvent =
            serde_json::from_str(r#"{"id":"abc","action":"unpaused"}"#).expect("decode");
        assert_eq!(event.action, RoomEventAction::Other("unpaused".into()));

        let event: RoomEvent =
            serde_json::from_str(r#"{"id":"abc","action":"destroyed"}"#).expect("decode");
        assert_eq!(event.action, RoomEventAction::Destroyed);
    }

    #[test]
    fn pull_layer_reads_camel_case_progress() {
        let layer: PullLayer = serde_json::from_str(
            r#"{"status":"Downloading","progressDetail":{"current":10,"total":100},"id":"f1"}"#,
        )
        .expect("decode");
        assert_eq!(
            layer.progress_detail,
            Some(PullProgressDetail {
                current: 10,
                total: 100
            })
        );
    }
}
