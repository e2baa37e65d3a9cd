// roomctl-core: Reactive state layer between roomctl-api and consumers (CLI, watchers).

pub mod command;
pub mod config;
pub mod console;
pub mod convert;
pub mod dispatcher;
pub mod error;
pub mod feed;
pub mod model;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::requests::*;
pub use command::{Command, CommandResult};
pub use config::{ConsoleConfig, Credentials, TlsVerification};
pub use console::{ConnectionState, Console};
pub use dispatcher::Dispatcher;
pub use error::CoreError;
pub use feed::{EventFeed, FeedOptions, FeedState};
pub use store::{DataStore, StoreSnapshot};
pub use stream::{RoomFilter, RoomStream, RoomWatchStream};

pub use roomctl_api::ServerEvent;
pub use roomctl_api::types::{RoomEvent, RoomEventAction};

pub use model::{
    AudioCodec, InsertPosition, LayerProgress, PullLayer, PullStatus, ReferenceTables, RoomEntry,
    RoomMember, RoomMount, RoomPatch, RoomSettings, RoomState, RoomStats, RoomUpsert, RoomsConfig,
    VideoCodec, default_room_settings,
};
