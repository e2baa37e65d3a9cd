//! Configuration for roomctl.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `roomctl_core::ConsoleConfig`. The CLI layers its
//! flag overrides on top of what this crate resolves.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use roomctl_core::{ConsoleConfig, Credentials, TlsVerification};

const KEYRING_SERVICE: &str = "roomctl";
const PASSWORD_ENV: &str = "ROOMCTL_PASSWORD";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no password configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{name}' not found in config")]
    UnknownProfile { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named room server profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Name of the profile to use: explicit choice, then
    /// `default_profile`, then `"default"`.
    pub fn profile_name<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        requested
            .or(self.default_profile.as_deref())
            .unwrap_or("default")
    }

    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() })
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named room server profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Server base URL (e.g., "https://rooms.example.com").
    pub url: String,

    /// Username for HTTP basic auth. No username means no auth.
    pub username: Option<String>,

    /// Password (plaintext, prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    pub insecure: Option<bool>,

    /// Request timeout in seconds.
    pub timeout: Option<u64>,

    /// Subscribe to the server event stream.
    pub events: Option<bool>,

    /// Fetch full entries for rooms announced by `created` events.
    pub hydrate_created: Option<bool>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "roomctl", "roomctl").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("roomctl");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load Config from `path` layered under `ROOMCTL_*` environment
/// variables. A missing file yields the defaults.
///
/// Nested keys use a double underscore: `ROOMCTL_DEFAULTS__OUTPUT=json`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("ROOMCTL_").split("__"));

    Ok(figment.extract()?)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the profile's password through the credential chain:
/// `password_env` variable, `ROOMCTL_PASSWORD`, system keyring, then
/// the plaintext value.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    if let Some(ref env_name) = profile.password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    if let Ok(pw) = std::env::var(PASSWORD_ENV) {
        return Ok(SecretString::from(pw));
    }

    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &keyring_user(profile_name)) {
        if let Ok(pw) = entry.get_password() {
            return Ok(SecretString::from(pw));
        }
    }

    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store a profile password in the system keyring.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, &keyring_user(profile_name))
        .and_then(|entry| entry.set_password(password))
        .map_err(|e| ConfigError::Validation {
            field: "keyring".into(),
            reason: e.to_string(),
        })
}

fn keyring_user(profile_name: &str) -> String {
    format!("{profile_name}/password")
}

/// Resolve basic credentials, or `None` when the profile has no username.
pub fn resolve_credentials(
    profile: &Profile,
    profile_name: &str,
) -> Result<Option<Credentials>, ConfigError> {
    let Some(username) = profile.username.clone() else {
        return Ok(None);
    };
    let password = resolve_password(profile, profile_name)?;
    Ok(Some(Credentials { username, password }))
}

// ── ConsoleConfig ───────────────────────────────────────────────────

pub fn parse_url(raw: &str) -> Result<url::Url, ConfigError> {
    raw.parse().map_err(|e| ConfigError::Validation {
        field: "url".into(),
        reason: format!("invalid URL '{raw}': {e}"),
    })
}

/// Build a `ConsoleConfig` from a profile, falling back to `defaults`
/// for unset fields. No CLI overrides.
pub fn profile_to_console_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<ConsoleConfig, ConfigError> {
    let mut config = ConsoleConfig::new(parse_url(&profile.url)?);

    config.credentials = resolve_credentials(profile, profile_name)?;
    config.tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    config.events_enabled = profile.events.unwrap_or(true);
    config.hydrate_created = profile.hydrate_created.unwrap_or(false);

    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use figment::Jail;
    use secrecy::ExposeSecret;

    use super::*;

    const SAMPLE: &str = r#"
        default_profile = "lab"

        [defaults]
        output = "json"
        timeout = 10

        [profiles.lab]
        url = "https://rooms.lab.local"
        username = "admin"
        password_env = "LAB_ROOMS_PASSWORD"
        events = false

        [profiles.open]
        url = "http://127.0.0.1:8080"
        insecure = true
        timeout = 5
    "#;

    #[test]
    fn loads_file_over_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", SAMPLE)?;
            let cfg = load_config_from(Path::new("config.toml")).map_err(|e| e.to_string())?;

            assert_eq!(cfg.default_profile.as_deref(), Some("lab"));
            assert_eq!(cfg.defaults.output, "json");
            assert_eq!(cfg.defaults.color, "auto");
            assert_eq!(cfg.defaults.timeout, 10);
            assert_eq!(cfg.profiles.len(), 2);
            assert_eq!(cfg.profile("open").map_err(|e| e.to_string())?.timeout, Some(5));
            Ok(())
        });
    }

    #[test]
    fn missing_file_yields_defaults() {
        Jail::expect_with(|_| {
            let cfg = load_config_from(Path::new("nope.toml")).map_err(|e| e.to_string())?;
            assert_eq!(cfg.default_profile.as_deref(), Some("default"));
            assert_eq!(cfg.defaults.output, "table");
            assert!(cfg.profiles.is_empty());
            Ok(())
        });
    }

    #[test]
    fn env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", SAMPLE)?;
            jail.set_env("ROOMCTL_DEFAULT_PROFILE", "open");
            jail.set_env("ROOMCTL_DEFAULTS__OUTPUT", "yaml");
            let cfg = load_config_from(Path::new("config.toml")).map_err(|e| e.to_string())?;

            assert_eq!(cfg.profile_name(None), "open");
            assert_eq!(cfg.profile_name(Some("lab")), "lab");
            assert_eq!(cfg.defaults.output, "yaml");
            Ok(())
        });
    }

    #[test]
    fn password_env_takes_precedence() {
        Jail::expect_with(|jail| {
            jail.set_env("LAB_ROOMS_PASSWORD", "from-profile-env");
            jail.set_env(PASSWORD_ENV, "from-global-env");
            let profile = Profile {
                url: "https://rooms.lab.local".into(),
                username: Some("admin".into()),
                password_env: Some("LAB_ROOMS_PASSWORD".into()),
                password: Some("plaintext".into()),
                ..Profile::default()
            };

            let pw = resolve_password(&profile, "lab").map_err(|e| e.to_string())?;
            assert_eq!(pw.expose_secret(), "from-profile-env");
            Ok(())
        });
    }

    #[test]
    fn global_password_env_is_second() {
        Jail::expect_with(|jail| {
            jail.set_env(PASSWORD_ENV, "from-global-env");
            let profile = Profile {
                url: "https://rooms.lab.local".into(),
                username: Some("admin".into()),
                password_env: Some("UNSET_ROOMS_PASSWORD".into()),
                ..Profile::default()
            };

            let creds = resolve_credentials(&profile, "lab")
                .map_err(|e| e.to_string())?
                .ok_or("expected credentials")?;
            assert_eq!(creds.username, "admin");
            assert_eq!(creds.password.expose_secret(), "from-global-env");
            Ok(())
        });
    }

    #[test]
    fn no_username_means_no_credentials() {
        let profile = Profile {
            url: "http://127.0.0.1:8080".into(),
            ..Profile::default()
        };
        assert!(resolve_credentials(&profile, "open").unwrap().is_none());
    }

    #[test]
    fn console_config_from_profile() {
        let profile = Profile {
            url: "http://127.0.0.1:8080".into(),
            insecure: Some(true),
            events: Some(false),
            ..Profile::default()
        };
        let defaults = Defaults {
            timeout: 12,
            ..Defaults::default()
        };

        let cfg = profile_to_console_config(&profile, "open", &defaults).unwrap();

        assert_eq!(cfg.url.as_str(), "http://127.0.0.1:8080/");
        assert_eq!(cfg.tls, TlsVerification::DangerAcceptInvalid);
        assert_eq!(cfg.timeout, Duration::from_secs(12));
        assert!(!cfg.events_enabled);
        assert!(!cfg.hydrate_created);
        assert!(cfg.credentials.is_none());
    }

    #[test]
    fn invalid_url_is_rejected() {
        let profile = Profile {
            url: "not a url".into(),
            ..Profile::default()
        };
        let err = profile_to_console_config(&profile, "bad", &Defaults::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "url"));
    }

    #[test]
    fn save_round_trips_through_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.profiles.insert(
            "default".into(),
            Profile {
                url: "https://rooms.example.com".into(),
                username: Some("admin".into()),
                ..Profile::default()
            },
        );
        save_config_to(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        let profile = loaded.profile("default").unwrap();
        assert_eq!(profile.url, "https://rooms.example.com");
        assert_eq!(profile.username.as_deref(), Some("admin"));
    }
}
