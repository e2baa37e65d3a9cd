//! CLI configuration -- thin wrapper around `roomctl_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--url, --username, --insecure, --timeout).

use std::time::Duration;

use roomctl_core::{ConsoleConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use roomctl_config::{
    Config, Defaults, Profile, config_path, load_config_or_default, save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.profile_name(global.profile.as_deref()).to_owned()
}

pub fn available_profiles(config: &Config) -> String {
    if config.profiles.is_empty() {
        "(none)".into()
    } else {
        config.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}

/// Build a `ConsoleConfig` from the config file, active profile, and
/// CLI overrides. Without a profile, `--url` alone is enough.
pub fn build_console_config(global: &GlobalOpts) -> Result<ConsoleConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    match cfg.profiles.get(&profile_name) {
        Some(profile) => resolve_profile(profile, &profile_name, &cfg.defaults, global),
        None if global.profile.is_some() => Err(CliError::ProfileNotFound {
            name: profile_name,
            available: available_profiles(&cfg),
        }),
        None => {
            let url = global.url.clone().ok_or_else(|| CliError::NoConfig {
                path: config_path().display().to_string(),
            })?;
            let profile = Profile {
                url,
                ..Profile::default()
            };
            resolve_profile(&profile, &profile_name, &cfg.defaults, global)
        }
    }
}

/// Translate a `Profile` + global flags into a `ConsoleConfig`.
///
/// CLI flag overrides take priority over profile values.
pub fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    global: &GlobalOpts,
) -> Result<ConsoleConfig, CliError> {
    // Overrides are folded into a copy so credential resolution sees them.
    let mut profile = profile.clone();
    if let Some(ref url) = global.url {
        profile.url.clone_from(url);
    }
    if global.username.is_some() {
        profile.username.clone_from(&global.username);
    }

    let mut config = roomctl_config::profile_to_console_config(&profile, profile_name, defaults)?;

    if global.insecure {
        config.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        config.timeout = Duration::from_secs(secs);
    }
    Ok(config)
}
