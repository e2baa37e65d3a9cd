use thiserror::Error;

/// Top-level error type for the `roomctl-api` crate.
///
/// Covers every failure mode of the room management API surface:
/// transport, server-reported errors, decoding, and the event stream.
/// `roomctl-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Server-reported ─────────────────────────────────────────────
    /// The server answered 404. For room routes this means the room
    /// does not exist (the server replies `room not found`).
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Any other non-success status. The server writes plain-text
    /// error bodies, which are carried here untouched.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── Event stream ────────────────────────────────────────────────
    /// The server-sent event subscription could not be established
    /// or broke while reading.
    #[error("Event stream error: {0}")]
    EventStream(String),
}

impl Error {
    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            _ => false,
        }
    }

    /// Returns `true` if this is a transient error worth retrying.
    ///
    /// Nothing in this workspace retries on its own; callers decide.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => *status >= 500,
            Self::EventStream(_) => true,
            _ => false,
        }
    }

    /// HTTP status code, when the server produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::NotFound { .. } => Some(404),
            Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
