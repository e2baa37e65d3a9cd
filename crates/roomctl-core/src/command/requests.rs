// ── Command request payloads ──

use secrecy::SecretString;

use crate::model::{RoomSettings, default_room_settings};

/// Registry login used for pulling private images.
#[derive(Debug, Clone)]
pub struct RegistryAuth {
    pub username: String,
    pub password: SecretString,
}

/// Start pulling an image onto the server.
#[derive(Debug, Clone)]
pub struct PullRequest {
    pub image: String,
    pub registry: Option<RegistryAuth>,
}

impl PullRequest {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            registry: None,
        }
    }
}

/// Create a room from settings.
#[derive(Debug, Clone)]
pub struct CreateRoomRequest {
    pub settings: RoomSettings,
    /// Start the container right after creation.
    pub start: bool,
}

impl CreateRoomRequest {
    /// Default settings with the given name and image.
    pub fn named(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            settings: RoomSettings {
                name: name.into(),
                neko_image: image.into(),
                ..default_room_settings()
            },
            start: false,
        }
    }
}

/// Recreate a room's container.
#[derive(Debug, Clone, Default)]
pub struct RecreateRoomRequest {
    /// Replacement settings. `None` keeps the current ones.
    pub settings: Option<RoomSettings>,
    /// `None` keeps the previous running state.
    pub start: Option<bool>,
}
