// ── Runtime connection configuration ──
//
// Describes how to reach a room server. Carries credentials and
// connection tuning but never touches disk; the CLI builds a
// `ConsoleConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

/// Static HTTP basic credentials sent with every request.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed certs).
    DangerAcceptInvalid,
}

/// Configuration for one room server connection.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Server URL (e.g., `https://rooms.example.com`).
    pub url: Url,
    pub credentials: Option<Credentials>,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Subscribe to the server event stream on connect.
    pub events_enabled: bool,
    /// Fetch the full entry when the event stream announces an unknown room.
    pub hydrate_created: bool,
}

impl ConsoleConfig {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(url: Url) -> Self {
        Self {
            url,
            credentials: None,
            tls: TlsVerification::default(),
            timeout: Self::DEFAULT_TIMEOUT,
            events_enabled: true,
            hydrate_created: false,
        }
    }
}
