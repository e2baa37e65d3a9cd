// ── Domain model ──
//
// Projected entities (rooms, pull status, rooms config) are owned by the
// store. Settings and stats are fetched on demand and never projected, so
// they are the wire types re-exported as-is.

pub mod pull;
pub mod reference;
pub mod room;
pub mod rooms_config;

pub use pull::{LayerProgress, PullLayer, PullStatus};
pub use reference::{AudioCodec, ReferenceTables, VideoCodec, default_room_settings};
pub use room::{InsertPosition, RoomEntry, RoomPatch, RoomState, RoomUpsert};
pub use rooms_config::RoomsConfig;

pub use roomctl_api::types::{
    BrowserPolicy, BrowserPolicyContent, BrowserPolicyExtension, BrowserPolicyType, MountType,
    RoomMember, RoomMount, RoomResources, RoomSettings, RoomStats,
};
