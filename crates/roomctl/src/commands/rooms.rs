//! Room command handlers.

use std::sync::Arc;

use tabled::Tabled;

use roomctl_core::{
    Command as CoreCommand, CommandResult, Console, CreateRoomRequest, RecreateRoomRequest,
    ReferenceTables, RoomEntry, RoomFilter, RoomSettings, RoomState, RoomStats,
};

use crate::cli::{GlobalOpts, OutputFormat, RoomStateArg, RoomsArgs, RoomsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct RoomRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Image")]
    image: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Ready")]
    ready: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Max")]
    max_connections: String,
}

fn row(r: &Arc<RoomEntry>) -> RoomRow {
    RoomRow {
        id: short_id(&r.id).to_owned(),
        name: r.name.clone(),
        image: r.neko_image.clone(),
        state: r.state().to_string(),
        ready: if r.is_ready { "yes" } else { "no" }.into(),
        status: r.status.clone(),
        max_connections: if r.max_connections == 0 {
            "mux".into()
        } else {
            r.max_connections.to_string()
        },
    }
}

pub(super) fn render_rooms(format: &OutputFormat, rooms: &[Arc<RoomEntry>]) -> String {
    output::render_list(format, rooms, row, |r| r.id.clone())
}

fn short_id(id: &str) -> &str {
    id.get(..12).unwrap_or(id)
}

fn detail(r: &Arc<RoomEntry>, color: bool) -> String {
    let mut lines = vec![
        format!("ID:       {}", r.id),
        format!("Name:     {}", r.name),
        format!("URL:      {}", if r.url.is_empty() { "-" } else { &r.url }),
        format!("Image:    {}", r.neko_image),
        format!("State:    {}", output::paint_state(r.state(), color)),
        format!("Ready:    {}", r.is_ready),
        format!("Status:   {}", r.status),
        format!("Max conn: {}", r.max_connections),
    ];
    if r.is_outdated {
        lines.push(format!(
            "Outdated: {}",
            output::paint_dim("image has a newer version; recreate to update", color)
        ));
    }
    if let Some(created) = r.created {
        lines.push(format!("Created:  {}", created.format("%Y-%m-%d %H:%M:%S UTC")));
    }
    if !r.labels.is_empty() {
        let labels: Vec<String> = r.labels.iter().map(|(k, v)| format!("{k}={v}")).collect();
        lines.push(format!("Labels:   {}", labels.join(", ")));
    }
    lines.join("\n")
}

fn settings_detail(s: &RoomSettings) -> String {
    let or_dash = |v: &str| if v.is_empty() { "-".to_owned() } else { v.to_owned() };
    let mut lines = vec![
        format!("Name:               {}", s.name),
        format!("Image:              {}", s.neko_image),
        format!("Max connections:    {}", s.max_connections),
        format!("Control protection: {}", s.control_protection),
        format!("Implicit control:   {}", s.implicit_control),
        format!("Screen:             {}", or_dash(&s.screen)),
        format!("Video codec:        {}", or_dash(&s.video_codec)),
        format!("Video bitrate:      {}", s.video_bitrate),
        format!("Video max fps:      {}", s.video_max_fps),
        format!("Audio codec:        {}", or_dash(&s.audio_codec)),
        format!("Audio bitrate:      {}", s.audio_bitrate),
        format!("Mounts:             {}", s.mounts.len()),
    ];
    if !s.hostname.is_empty() {
        lines.push(format!("Hostname:           {}", s.hostname));
    }
    if !s.dns.is_empty() {
        lines.push(format!("DNS:                {}", s.dns.join(", ")));
    }
    lines.join("\n")
}

fn stats_detail(s: &RoomStats) -> String {
    let fmt_time = |t: Option<chrono::DateTime<chrono::Utc>>| {
        t.map_or_else(|| "-".into(), |t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
    };
    let mut lines = vec![
        format!("Connections:      {}", s.connections),
        format!("Host:             {}", if s.host.is_empty() { "-" } else { &s.host }),
        format!("Server started:   {}", fmt_time(s.server_started_at)),
        format!("Last admin left:  {}", fmt_time(s.last_admin_left_at)),
        format!("Last user left:   {}", fmt_time(s.last_user_left_at)),
        format!("Banned IPs:       {}", s.banned.len()),
        format!("Locked:           {}", s.locked.len()),
    ];
    for m in &s.members {
        let role = if m.admin { "admin" } else { "user" };
        let muted = if m.muted { ", muted" } else { "" };
        lines.push(format!("  member {} ({role}{muted})", m.display_name));
    }
    lines.join("\n")
}

fn state_filter(arg: RoomStateArg) -> RoomFilter {
    RoomFilter::ByState(match arg {
        RoomStateArg::Running => RoomState::Running,
        RoomStateArg::Paused => RoomState::Paused,
        RoomStateArg::Stopped => RoomState::Stopped,
    })
}

fn create_request(
    name: Option<String>,
    image: Option<String>,
    max_connections: Option<u16>,
    screen: Option<String>,
    labels: Vec<(String, String)>,
    settings: Option<RoomSettings>,
) -> Result<CreateRoomRequest, CliError> {
    let mut request = match settings {
        Some(settings) => CreateRoomRequest {
            settings,
            start: false,
        },
        None => CreateRoomRequest::named(name.unwrap_or_default(), image.unwrap_or_default()),
    };

    let settings = &mut request.settings;
    if let Some(max) = max_connections {
        settings.max_connections = max;
    }
    if let Some(screen) = screen {
        if !ReferenceTables::get().is_known_screen(&screen) {
            return Err(CliError::Validation {
                field: "screen".into(),
                reason: format!("unsupported screen configuration '{screen}'"),
            });
        }
        settings.screen = screen;
    }
    settings.labels.extend(labels);

    if settings.name.is_empty() || settings.neko_image.is_empty() {
        return Err(CliError::Validation {
            field: "settings".into(),
            reason: "room name and image are required".into(),
        });
    }
    Ok(request)
}

fn unexpected(result: &CommandResult) -> CliError {
    CliError::Internal(format!("unexpected command result: {result:?}"))
}

// ── Handler ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub async fn handle(console: &Console, args: RoomsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(&global.color);

    match args.command {
        RoomsCommand::List { label, state, name } => {
            let labels = util::parse_labels(&label)?;
            if !labels.is_empty() {
                console.execute(CoreCommand::ListRooms { labels }).await?;
            }

            let mut filters = Vec::new();
            if let Some(state) = state {
                filters.push(state_filter(state));
            }
            if let Some(name) = name {
                filters.push(RoomFilter::NameContains(name));
            }

            let rooms: Vec<Arc<RoomEntry>> = console
                .rooms_snapshot()
                .iter()
                .filter(|r| filters.iter().all(|f| f.matches(r)))
                .cloned()
                .collect();
            let out = render_rooms(&global.output, &rooms);
            output::print_output(&out, global.quiet);
            Ok(())
        }

        RoomsCommand::Get { room } => {
            let entry = util::resolve_room(console, &room).await?;
            let out = output::render_single(
                &global.output,
                &entry,
                |r| detail(r, color),
                |r| r.id.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        RoomsCommand::Create {
            name,
            image,
            max_connections,
            screen,
            label,
            from_file,
            start,
        } => {
            let settings = from_file
                .as_deref()
                .map(util::read_settings_file)
                .transpose()?;
            let labels = util::parse_labels(&label)?;
            let mut request = create_request(name, image, max_connections, screen, labels, settings)?;
            request.start = start;

            if let Some(config) = console.rooms_config() {
                if !config.allows_image(&request.settings.neko_image) {
                    tracing::warn!(
                        image = %request.settings.neko_image,
                        "image is not in the server's image list"
                    );
                }
            }

            let result = console
                .execute(CoreCommand::CreateRoom(Box::new(request)))
                .await?;
            let entry = match result {
                CommandResult::Room(entry) => entry,
                other => return Err(unexpected(&other)),
            };
            let entry = Arc::new(entry);
            let out = output::render_single(
                &global.output,
                &entry,
                |r| detail(r, color),
                |r| r.id.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        RoomsCommand::Remove { room } => {
            let entry = util::resolve_room(console, &room).await?;
            if !util::confirm(&format!("Remove room '{}'?", entry.name), global.yes)? {
                return Ok(());
            }
            console
                .execute(CoreCommand::RemoveRoom {
                    id: entry.id.clone(),
                })
                .await?;
            if !global.quiet {
                eprintln!("Room '{}' removed", entry.name);
            }
            Ok(())
        }

        RoomsCommand::Start { room } => {
            let entry = util::resolve_room(console, &room).await?;
            console
                .execute(CoreCommand::StartRoom {
                    id: entry.id.clone(),
                })
                .await?;
            if !global.quiet {
                eprintln!("Room '{}' started", entry.name);
            }
            Ok(())
        }

        RoomsCommand::Stop { room } => {
            let entry = util::resolve_room(console, &room).await?;
            console
                .execute(CoreCommand::StopRoom {
                    id: entry.id.clone(),
                })
                .await?;
            if !global.quiet {
                eprintln!("Room '{}' stopped", entry.name);
            }
            Ok(())
        }

        RoomsCommand::Pause { room } => {
            let entry = util::resolve_room(console, &room).await?;
            console
                .execute(CoreCommand::PauseRoom {
                    id: entry.id.clone(),
                })
                .await?;
            if !global.quiet {
                eprintln!("Room '{}' paused", entry.name);
            }
            Ok(())
        }

        RoomsCommand::Restart { room } => {
            let entry = util::resolve_room(console, &room).await?;
            console
                .execute(CoreCommand::RestartRoom {
                    id: entry.id.clone(),
                })
                .await?;
            if !global.quiet {
                eprintln!("Room '{}' restart initiated", entry.name);
            }
            Ok(())
        }

        RoomsCommand::Recreate {
            room,
            from_file,
            start,
            no_start,
        } => {
            let entry = util::resolve_room(console, &room).await?;
            let settings = from_file
                .as_deref()
                .map(util::read_settings_file)
                .transpose()?;
            let prompt = format!(
                "Recreate room '{}'? Its container will be replaced",
                entry.name
            );
            if !util::confirm(&prompt, global.yes)? {
                return Ok(());
            }

            let start = match (start, no_start) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            let result = console
                .execute(CoreCommand::RecreateRoom {
                    id: entry.id.clone(),
                    request: Box::new(RecreateRoomRequest { settings, start }),
                })
                .await?;
            let new_entry = match result {
                CommandResult::Room(new_entry) => new_entry,
                other => return Err(unexpected(&other)),
            };
            if !global.quiet {
                eprintln!(
                    "Room '{}' recreated ({} -> {})",
                    new_entry.name,
                    short_id(&entry.id),
                    short_id(&new_entry.id)
                );
            }
            let new_entry = Arc::new(new_entry);
            let out = output::render_single(
                &global.output,
                &new_entry,
                |r| detail(r, color),
                |r| r.id.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        RoomsCommand::Settings { room } => {
            let entry = util::resolve_room(console, &room).await?;
            let result = console
                .execute(CoreCommand::RoomSettings {
                    id: entry.id.clone(),
                })
                .await?;
            let settings = match result {
                CommandResult::Settings(settings) => settings,
                other => return Err(unexpected(&other)),
            };
            let out = output::render_single(
                &global.output,
                settings.as_ref(),
                settings_detail,
                |s| s.name.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        RoomsCommand::Stats { room } => {
            let entry = util::resolve_room(console, &room).await?;
            let result = console
                .execute(CoreCommand::RoomStats {
                    id: entry.id.clone(),
                })
                .await?;
            let stats = match result {
                CommandResult::Stats(stats) => stats,
                other => return Err(unexpected(&other)),
            };
            let out = output::render_single(&global.output, &stats, stats_detail, |s| {
                s.connections.to_string()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        RoomsCommand::Compose => {
            let result = console.execute(CoreCommand::ExportCompose).await?;
            let yaml = match result {
                CommandResult::Compose(yaml) => yaml,
                other => return Err(unexpected(&other)),
            };
            output::print_output(yaml.trim_end(), global.quiet);
            Ok(())
        }
    }
}
