//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::path::Path;
use std::sync::Arc;

use roomctl_core::{Console, CoreError, RoomEntry, RoomSettings};

use crate::error::CliError;

/// Resolve a room identifier (ID or name) to its entry.
///
/// Looks in the loaded snapshot first, then asks the server by name.
pub async fn resolve_room(console: &Console, identifier: &str) -> Result<Arc<RoomEntry>, CliError> {
    let store = console.store();
    if let Some(room) = store.room(identifier).or_else(|| store.room_by_name(identifier)) {
        return Ok(room);
    }

    match console.dispatcher().get_room_by_name(identifier).await {
        Ok(room) => Ok(Arc::new(room)),
        Err(CoreError::RoomNotFound { .. }) => Err(CliError::room_not_found(identifier)),
        Err(e) => Err(e.into()),
    }
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.trim_end_matches('?').to_owned(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Read room settings from a JSON file for `--from-file` flags.
pub fn read_settings_file(path: &Path) -> Result<RoomSettings, CliError> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| CliError::Validation {
        field: "from-file".into(),
        reason: format!("invalid room settings JSON: {e}"),
    })
}

/// Parse repeated `KEY=VALUE` flags.
pub fn parse_labels(raw: &[String]) -> Result<Vec<(String, String)>, CliError> {
    raw.iter()
        .map(|item| match item.split_once('=') {
            Some((key, value)) if !key.is_empty() => Ok((key.to_owned(), value.to_owned())),
            _ => Err(CliError::Validation {
                field: "label".into(),
                reason: format!("expected KEY=VALUE, got '{item}'"),
            }),
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn labels_split_on_first_equals() {
        let parsed = parse_labels(&["team=qa".into(), "url=a=b".into()]).unwrap();
        assert_eq!(
            parsed,
            vec![
                ("team".to_owned(), "qa".to_owned()),
                ("url".to_owned(), "a=b".to_owned()),
            ]
        );
    }

    #[test]
    fn labels_require_key() {
        assert!(parse_labels(&["=qa".into()]).is_err());
        assert!(parse_labels(&["team".into()]).is_err());
    }
}
