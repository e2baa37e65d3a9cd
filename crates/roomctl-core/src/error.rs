// ── Core error types ──
//
// User-facing errors from roomctl-core. The `From<roomctl_api::Error>`
// impl translates transport-layer errors into domain variants, keeping
// the server's status and message untouched.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to room server at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Room server request timed out")]
    Timeout,

    #[error("Not connected to a room server")]
    NotConnected,

    // ── Server-reported errors ───────────────────────────────────────
    #[error("Room not found: {message}")]
    RoomNotFound { message: String },

    #[error("Server error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Event stream ─────────────────────────────────────────────────
    #[error("Event subscription failed: {reason}")]
    Subscription { reason: String },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Unexpected server response: {message}")]
    Deserialization { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// HTTP status code, when the server produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RoomNotFound { .. } => Some(404),
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Transport or subscription failure, as opposed to a server verdict.
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. } | Self::Timeout | Self::Subscription { .. }
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<roomctl_api::Error> for CoreError {
    fn from(err: roomctl_api::Error) -> Self {
        match err {
            roomctl_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if let Some(status) = e.status() {
                    CoreError::Api {
                        status: status.as_u16(),
                        message: e.to_string(),
                    }
                } else {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                }
            }
            roomctl_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            roomctl_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            roomctl_api::Error::NotFound { message } => CoreError::RoomNotFound { message },
            roomctl_api::Error::Api { status, message } => CoreError::Api { status, message },
            roomctl_api::Error::Deserialization { message, body: _ } => {
                CoreError::Deserialization { message }
            }
            roomctl_api::Error::EventStream(reason) => CoreError::Subscription { reason },
        }
    }
}
