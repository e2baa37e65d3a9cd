//! `roomctl watch`: follow the server event stream.

use std::sync::Arc;

use chrono::Local;
use tokio::sync::broadcast;

use roomctl_core::{Console, FeedState, RoomEventAction, ServerEvent};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

use super::rooms;

fn action_label(action: &RoomEventAction) -> &str {
    match action {
        RoomEventAction::Created => "created",
        RoomEventAction::Started => "started",
        RoomEventAction::Ready => "ready",
        RoomEventAction::Stopped => "stopped",
        RoomEventAction::Destroyed => "destroyed",
        RoomEventAction::Paused => "paused",
        RoomEventAction::Other(other) => other,
    }
}

/// One human-readable line per event, resolved against the store.
fn event_line(console: &Console, event: &ServerEvent, color: bool) -> Option<String> {
    let time = Local::now().format("%H:%M:%S");
    match event {
        ServerEvent::Rooms(ev) => {
            let store = console.store();
            let room = store.room(&ev.id);
            let name = room
                .as_ref()
                .map(|r| r.name.as_str())
                .filter(|n| !n.is_empty())
                .unwrap_or(ev.id.as_str());
            let state = room
                .as_ref()
                .map(|r| output::paint_state(r.state(), color))
                .unwrap_or_default();
            Some(format!(
                "{} {:<9} {name} {state}",
                output::paint_dim(&time.to_string(), color),
                action_label(&ev.action)
            ))
        }
        ServerEvent::Pull(pull) => {
            let phase = if pull.active { "pulling" } else { "pull done" };
            let last = pull.status.last().map_or("", String::as_str);
            Some(format!(
                "{} {phase:<9} {last}",
                output::paint_dim(&time.to_string(), color)
            ))
        }
        ServerEvent::Unknown { .. } => None,
    }
}

fn print_table(console: &Console, global: &GlobalOpts) {
    let rooms = console.rooms_snapshot();
    let out = rooms::render_rooms(&global.output, &rooms);
    output::print_output(&out, global.quiet);
}

pub async fn handle(console: &Console, args: WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    let structured = matches!(
        global.output,
        OutputFormat::Json | OutputFormat::JsonCompact
    );

    let Some(mut feed) = console.feed_state().await else {
        return Err(CliError::EventStream {
            reason: "event feed is not running".into(),
        });
    };
    if let FeedState::Failed(reason) = feed.borrow_and_update().clone() {
        return Err(CliError::EventStream { reason });
    }
    let mut events = console.events();

    if args.table || !structured {
        print_table(console, global);
    }
    if !global.quiet {
        eprintln!("Watching {} (Ctrl-C to stop)", console.config().url);
    }

    loop {
        tokio::select! {
            biased;
            _ = tokio::signal::ctrl_c() => break,
            changed = feed.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = feed.borrow_and_update().clone();
                match state {
                    FeedState::Failed(reason) => return Err(CliError::EventStream { reason }),
                    FeedState::Closed => {
                        if !global.quiet {
                            eprintln!("Event stream closed by server");
                        }
                        break;
                    }
                    FeedState::Connecting | FeedState::Live => {}
                }
            }
            recv = events.recv() => match recv {
                Ok(event) => render_event(console, &event, &args, global, color),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "watch output fell behind the event stream");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }
    Ok(())
}

fn render_event(
    console: &Console,
    event: &Arc<ServerEvent>,
    args: &WatchArgs,
    global: &GlobalOpts,
    color: bool,
) {
    if args.table {
        print_table(console, global);
        return;
    }
    let line = match global.output {
        OutputFormat::Json | OutputFormat::JsonCompact => {
            serde_json::to_string(event.as_ref()).ok()
        }
        _ => event_line(console, event, color),
    };
    if let Some(line) = line {
        output::print_output(&line, global.quiet);
    }
}
