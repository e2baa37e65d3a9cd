// ── Load-time reference tables ──
//
// Codec lists, selectable screen modes, and the settings a new room
// starts from. Constant for the lifetime of the process.

use std::sync::LazyLock;

use serde::Serialize;
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

use roomctl_api::types::{RoomResources, RoomSettings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, AsRefStr, Serialize)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[serde(rename_all = "UPPERCASE")]
pub enum VideoCodec {
    Vp8,
    Vp9,
    H264,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, AsRefStr, Serialize)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[serde(rename_all = "UPPERCASE")]
pub enum AudioCodec {
    Opus,
    G722,
    Pcmu,
    Pcma,
}

const SCREENS: &[&str] = &[
    "1920x1080@60",
    "1920x1080@30",
    "1680x1050@60",
    "1600x900@60",
    "1440x900@60",
    "1440x810@60",
    "1400x1050@60",
    "1400x900@60",
    "1368x768@60",
    "1360x768@60",
    "1280x1024@60",
    "1280x960@60",
    "1280x800@60",
    "1280x720@60",
    "1280x720@30",
    "1152x864@60",
    "1152x648@60",
    "1024x768@60",
    "1024x576@60",
    "960x720@60",
    "960x720@30",
    "960x600@60",
    "960x540@60",
    "928x696@60",
    "896x672@60",
    "864x486@60",
    "840x525@60",
    "800x600@60",
    "800x450@60",
    "720x450@60",
    "720x405@60",
    "700x525@60",
    "700x450@60",
    "684x384@60",
    "680x384@60",
    "640x512@60",
    "640x480@60",
    "640x400@60",
    "640x360@60",
];

pub const DEFAULT_MAX_CONNECTIONS: u16 = 10;
pub const DEFAULT_SCREEN: &str = "1280x720@30";
pub const DEFAULT_VIDEO_BITRATE: u32 = 3072;
pub const DEFAULT_VIDEO_MAX_FPS: u32 = 25;
pub const DEFAULT_AUDIO_BITRATE: u32 = 128;
pub const DEFAULT_SHM_SIZE: i64 = 2_000_000_000;

/// Static option lists and default room settings.
#[derive(Debug, Clone, Serialize)]
pub struct ReferenceTables {
    pub video_codecs: Vec<VideoCodec>,
    pub audio_codecs: Vec<AudioCodec>,
    pub screens: Vec<&'static str>,
    pub default_settings: RoomSettings,
}

static REFERENCE: LazyLock<ReferenceTables> = LazyLock::new(|| ReferenceTables {
    video_codecs: VideoCodec::iter().collect(),
    audio_codecs: AudioCodec::iter().collect(),
    screens: SCREENS.to_vec(),
    default_settings: default_room_settings(),
});

impl ReferenceTables {
    pub fn get() -> &'static Self {
        &REFERENCE
    }

    pub fn is_known_screen(&self, screen: &str) -> bool {
        self.screens.iter().any(|s| *s == screen)
    }
}

/// Settings a freshly created room starts from. Name and image are left
/// empty for the caller to fill in.
pub fn default_room_settings() -> RoomSettings {
    RoomSettings {
        max_connections: DEFAULT_MAX_CONNECTIONS,
        screen: DEFAULT_SCREEN.to_owned(),
        video_codec: VideoCodec::Vp8.to_string(),
        video_bitrate: DEFAULT_VIDEO_BITRATE,
        video_max_fps: DEFAULT_VIDEO_MAX_FPS,
        audio_codec: AudioCodec::Opus.to_string(),
        audio_bitrate: DEFAULT_AUDIO_BITRATE,
        resources: RoomResources {
            shm_size: DEFAULT_SHM_SIZE,
            ..RoomResources::default()
        },
        ..RoomSettings::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_lists_keep_declaration_order() {
        let tables = ReferenceTables::get();
        let video: Vec<String> = tables.video_codecs.iter().map(ToString::to_string).collect();
        assert_eq!(video, ["VP8", "VP9", "H264"]);
        let audio: Vec<&str> = tables.audio_codecs.iter().map(AudioCodec::as_ref).collect();
        assert_eq!(audio, ["OPUS", "G722", "PCMU", "PCMA"]);
    }

    #[test]
    fn screens_start_at_full_hd_and_include_default() {
        let tables = ReferenceTables::get();
        assert_eq!(tables.screens.len(), 39);
        assert_eq!(tables.screens.first(), Some(&"1920x1080@60"));
        assert_eq!(tables.screens.last(), Some(&"640x360@60"));
        assert!(tables.is_known_screen(DEFAULT_SCREEN));
    }

    #[test]
    fn default_settings_match_constants() {
        let settings = &ReferenceTables::get().default_settings;
        assert_eq!(settings.max_connections, 10);
        assert_eq!(settings.video_codec, "VP8");
        assert_eq!(settings.video_bitrate, 3072);
        assert_eq!(settings.video_max_fps, 25);
        assert_eq!(settings.audio_codec, "OPUS");
        assert_eq!(settings.audio_bitrate, 128);
        assert_eq!(settings.resources.shm_size, 2_000_000_000);
        assert!(settings.name.is_empty());
    }

    #[test]
    fn codecs_parse_case_insensitively() {
        assert_eq!("h264".parse::<VideoCodec>().ok(), Some(VideoCodec::H264));
        assert_eq!("pcma".parse::<AudioCodec>().ok(), Some(AudioCodec::Pcma));
    }
}
