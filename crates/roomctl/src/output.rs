//! Rendering for `--output`.
//!
//! Lists become `tabled` tables, single items a detail block; JSON and
//! YAML serialize the domain value itself, and `plain` prints ids only.

use std::io::{IsTerminal, Write};

use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use roomctl_core::RoomState;

use crate::cli::{ColorMode, OutputFormat};

// ── Color ───────────────────────────────────────────────────────────

/// `auto` colors only an interactive stdout without `NO_COLOR`.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => {
            std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none()
        }
    }
}

pub fn paint_state(state: RoomState, color: bool) -> String {
    let label = state.to_string();
    if !color {
        return label;
    }
    match state {
        RoomState::Running => label.green().to_string(),
        RoomState::Paused => label.yellow().to_string(),
        RoomState::Stopped => label.red().to_string(),
    }
}

pub fn paint_dim(text: &str, color: bool) -> String {
    if color {
        text.dimmed().to_string()
    } else {
        text.to_owned()
    }
}

// ── Rendering ───────────────────────────────────────────────────────

/// Serialized form for the structured formats, `None` for table/plain.
fn structured<T: Serialize + ?Sized>(format: &OutputFormat, data: &T) -> Option<String> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(data).map_err(|e| e.to_string()),
        OutputFormat::JsonCompact => serde_json::to_string(data).map_err(|e| e.to_string()),
        OutputFormat::Yaml => serde_yaml::to_string(data)
            .map(|s| s.trim_end().to_owned())
            .map_err(|e| e.to_string()),
        OutputFormat::Table | OutputFormat::Plain => return None,
    };
    Some(rendered.unwrap_or_else(|e| format!("error: serialization failed: {e}")))
}

/// Render a collection: `to_row` builds table rows, `id_fn` feeds `plain`.
pub fn render_list<T, R>(
    format: &OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: Serialize,
    R: Tabled,
{
    if let Some(out) = structured(format, data) {
        return out;
    }
    if matches!(format, OutputFormat::Plain) {
        return data.iter().map(id_fn).collect::<Vec<_>>().join("\n");
    }
    let rows: Vec<R> = data.iter().map(to_row).collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Render one item: `detail_fn` for tables, `id_fn` for `plain`.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: Serialize + ?Sized,
{
    structured(format, data).unwrap_or_else(|| match format {
        OutputFormat::Plain => id_fn(data),
        _ => detail_fn(data),
    })
}

/// Write to stdout unless `--quiet` or there is nothing to show.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let _ = writeln!(std::io::stdout().lock(), "{output}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Tabled)]
    struct Item {
        id: String,
        size: u32,
    }

    fn items() -> Vec<Item> {
        vec![
            Item {
                id: "a".into(),
                size: 1,
            },
            Item {
                id: "b".into(),
                size: 2,
            },
        ]
    }

    fn copy(i: &Item) -> Item {
        Item {
            id: i.id.clone(),
            size: i.size,
        }
    }

    #[test]
    fn plain_lists_identifiers() {
        let out = render_list(&OutputFormat::Plain, &items(), copy, |i| i.id.clone());
        assert_eq!(out, "a\nb");
    }

    #[test]
    fn table_has_headers() {
        let out = render_list(&OutputFormat::Table, &items(), copy, |i| i.id.clone());
        assert!(out.contains("id"));
        assert!(out.contains("size"));
    }

    #[test]
    fn compact_json_is_single_line() {
        let out = render_single(&OutputFormat::JsonCompact, &items()[0], |_| String::new(), |i| i.id.clone());
        assert_eq!(out, r#"{"id":"a","size":1}"#);
    }

    #[test]
    fn yaml_has_no_trailing_newline() {
        let out = render_single(&OutputFormat::Yaml, &items()[1], |_| String::new(), |i| i.id.clone());
        assert_eq!(out, "id: b\nsize: 2");
    }

    #[test]
    fn uncolored_state_is_plain_text() {
        assert_eq!(paint_state(RoomState::Paused, false), "paused");
    }
}
