//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use roomctl_config::ConfigError;
use roomctl_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to room server at {url}")]
    #[diagnostic(
        code(roomctl::connection_failed),
        help(
            "Check that the room server is running and reachable.\n\
             URL: {url}\n\
             Try: roomctl rooms list --insecure"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Event stream unavailable: {reason}")]
    #[diagnostic(
        code(roomctl::event_stream),
        help("The server may have events disabled, or a proxy may be buffering the stream.")
    )]
    EventStream { reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed")]
    #[diagnostic(
        code(roomctl::auth_failed),
        help(
            "Verify the username and password for profile '{profile}'.\n\
             Run: roomctl config set-password --profile {profile}"
        )
    )]
    AuthFailed { profile: String },

    #[error("No password configured for profile '{profile}'")]
    #[diagnostic(
        code(roomctl::no_credentials),
        help(
            "Store one with: roomctl config set-password\n\
             Or set the ROOMCTL_PASSWORD environment variable."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(roomctl::not_found),
        help("Run: roomctl {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── API ──────────────────────────────────────────────────────────
    #[error("Server error ({status}): {message}")]
    #[diagnostic(code(roomctl::api_error))]
    ApiError { status: u16, message: String },

    #[error("Unexpected server response: {message}")]
    #[diagnostic(
        code(roomctl::bad_response),
        help("The server may be running an incompatible version.")
    )]
    BadResponse { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(roomctl::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(roomctl::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: roomctl config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No room server configured")]
    #[diagnostic(
        code(roomctl::no_config),
        help(
            "Create a profile with: roomctl config init\n\
             Or pass --url / set ROOMCTL_URL.\n\
             Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(roomctl::config))]
    Config(Box<ConfigError>),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(roomctl::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Request timed out")]
    #[diagnostic(
        code(roomctl::timeout),
        help("Increase timeout with --timeout or check server responsiveness.")
    )]
    Timeout,

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(roomctl::json), help("Check the JSON file contents and try again."))]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::EventStream { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    pub fn room_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type: "room".into(),
            identifier: identifier.into(),
            list_command: "rooms list".into(),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },
            CoreError::NotConnected => Self::ConnectionFailed {
                url: "(disconnected)".into(),
                reason: "console is not connected".into(),
            },
            CoreError::Timeout => Self::Timeout,
            CoreError::RoomNotFound { message } => Self::room_not_found(message),
            CoreError::Api { status: 401 | 403, .. } => Self::AuthFailed {
                profile: "current".into(),
            },
            CoreError::Api { status, message } => Self::ApiError { status, message },
            CoreError::Subscription { reason } => Self::EventStream { reason },
            CoreError::Deserialization { message } => Self::BadResponse { message },
            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message,
            },
            CoreError::Internal(message) => Self::Internal(message),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(Box::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_statuses_map_to_auth_exit_code() {
        let err = CliError::from(CoreError::Api {
            status: 401,
            message: "unauthorized".into(),
        });
        assert_eq!(err.exit_code(), exit_code::AUTH);

        let err = CliError::from(CoreError::Api {
            status: 500,
            message: "boom".into(),
        });
        assert!(matches!(err, CliError::ApiError { status: 500, .. }));
        assert_eq!(err.exit_code(), exit_code::GENERAL);
    }

    #[test]
    fn missing_room_maps_to_not_found() {
        let err = CliError::from(CoreError::RoomNotFound {
            message: "room not found".into(),
        });
        assert_eq!(err.exit_code(), exit_code::NOT_FOUND);
    }

    #[test]
    fn connectivity_maps_to_connection_exit_code() {
        let err = CliError::from(CoreError::Subscription {
            reason: "server answered 502".into(),
        });
        assert_eq!(err.exit_code(), exit_code::CONNECTION);
        assert_eq!(CliError::from(CoreError::Timeout).exit_code(), exit_code::TIMEOUT);
    }
}
