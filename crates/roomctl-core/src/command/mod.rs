// ── Command API ──
//
// Every dispatcher operation is also reachable through a `Command`
// value, so callers can queue, log, or replay them uniformly.

pub mod requests;

use crate::model::{PullStatus, RoomEntry, RoomSettings, RoomStats, RoomsConfig};

pub use requests::{CreateRoomRequest, PullRequest, RecreateRoomRequest, RegistryAuth};

/// All operations the dispatcher can perform against a room server.
#[derive(Debug, Clone)]
pub enum Command {
    // ── Config ───────────────────────────────────────────────────────
    RefreshRoomsConfig,

    // ── Rooms ────────────────────────────────────────────────────────
    ListRooms {
        labels: Vec<(String, String)>,
    },
    CreateRoom(Box<CreateRoomRequest>),
    GetRoom {
        id: String,
    },
    GetRoomByName {
        name: String,
    },
    RemoveRoom {
        id: String,
    },
    StartRoom {
        id: String,
    },
    StopRoom {
        id: String,
    },
    PauseRoom {
        id: String,
    },
    RestartRoom {
        id: String,
    },
    RecreateRoom {
        id: String,
        request: Box<RecreateRoomRequest>,
    },
    RoomSettings {
        id: String,
    },
    RoomStats {
        id: String,
    },

    // ── Pull ─────────────────────────────────────────────────────────
    PullStart(PullRequest),
    PullStatus,
    PullStop,

    // ── Export ───────────────────────────────────────────────────────
    ExportCompose,
}

/// Result of a command execution.
#[derive(Debug)]
pub enum CommandResult {
    Ok,
    RoomsConfig(RoomsConfig),
    Rooms(Vec<RoomEntry>),
    Room(RoomEntry),
    Settings(Box<RoomSettings>),
    Stats(RoomStats),
    Pull(PullStatus),
    Compose(String),
}
