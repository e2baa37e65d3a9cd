// Shared transport configuration for building reqwest::Client instances.
//
// The request/response client and the event stream share TLS, timeout,
// cookie, and credential settings through this module.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use secrecy::{ExposeSecret, SecretString};

use crate::error::Error;

/// TLS verification mode (api-level mirror of core's TlsVerification).
#[derive(Debug, Clone)]
pub enum TlsMode {
    /// Use the system certificate store.
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (for self-signed deployments).
    DangerAcceptInvalid,
}

/// Static HTTP basic credentials attached to every request,
/// including the event stream subscription.
#[derive(Debug, Clone)]
pub struct BasicCredentials {
    pub username: String,
    pub password: SecretString,
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    /// Per-request timeout. Not applied to the event stream, which is
    /// expected to stay open indefinitely.
    pub timeout: Duration,
    pub cookie_jar: Option<Arc<Jar>>,
    pub credentials: Option<BasicCredentials>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
            cookie_jar: None,
            credentials: None,
        }
    }
}

impl TransportConfig {
    /// Build the `reqwest::Client` used for request/response calls.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        self.builder()?
            .timeout(self.timeout)
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }

    /// Build the `reqwest::Client` used for the long-lived event stream.
    ///
    /// Only the connect phase is bounded by the timeout.
    pub fn build_stream_client(&self) -> Result<reqwest::Client, Error> {
        self.builder()?
            .connect_timeout(self.timeout)
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }

    /// Create a config with a fresh cookie jar (for session cookies).
    pub fn with_cookie_jar(mut self) -> Self {
        self.cookie_jar = Some(Arc::new(Jar::default()));
        self
    }

    fn builder(&self) -> Result<reqwest::ClientBuilder, Error> {
        let mut builder =
            reqwest::Client::builder().user_agent(concat!("roomctl/", env!("CARGO_PKG_VERSION")));

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        if let Some(ref jar) = self.cookie_jar {
            builder = builder.cookie_provider(Arc::clone(jar));
        }

        Ok(builder)
    }
}

impl BasicCredentials {
    /// Attach these credentials to an outgoing request.
    pub fn apply(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.basic_auth(&self.username, Some(self.password.expose_secret()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_transport_uses_system_roots() {
        let config = TransportConfig::default();
        assert!(matches!(config.tls, TlsMode::System));
        assert!(config.credentials.is_none());
        assert!(config.build_client().is_ok());
    }

    #[test]
    fn missing_ca_file_is_a_tls_error() {
        let config = TransportConfig {
            tls: TlsMode::CustomCa(PathBuf::from("/nonexistent/roomctl-ca.pem")),
            ..TransportConfig::default()
        };
        let err = config.build_client().expect_err("missing CA must fail");
        assert!(matches!(err, Error::Tls(_)));
    }

    #[test]
    fn credentials_attach_basic_auth_header() {
        let creds = BasicCredentials {
            username: "admin".into(),
            password: SecretString::from("secret".to_string()),
        };
        let client = reqwest::Client::new();
        let request = creds
            .apply(client.get("http://localhost/api/rooms"))
            .build()
            .expect("request");
        let value = request
            .headers()
            .get(reqwest::header::AUTHORIZATION)
            .expect("authorization header");
        assert_eq!(value.to_str().expect("ascii"), "Basic YWRtaW46c2VjcmV0");
    }
}
