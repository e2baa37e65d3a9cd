//! Image pull command handlers.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use secrecy::SecretString;

use roomctl_core::{
    Command as CoreCommand, CommandResult, Console, PullRequest, PullStatus, RegistryAuth,
};

use crate::cli::{GlobalOpts, PullArgs, PullCommand};
use crate::error::CliError;
use crate::output;

const POLL_INTERVAL: Duration = Duration::from_secs(1);

fn detail(status: &PullStatus) -> String {
    let fmt_time = |t: Option<chrono::DateTime<chrono::Utc>>| {
        t.map_or_else(|| "-".into(), |t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
    };
    let totals = status.totals();
    let mut lines = vec![
        format!("Active:   {}", status.active),
        format!("Started:  {}", fmt_time(status.started)),
        format!("Finished: {}", fmt_time(status.finished)),
        format!("Layers:   {}", status.layers.len()),
    ];
    if totals.total > 0 {
        lines.push(format!("Progress: {} / {} bytes", totals.current, totals.total));
    }
    for layer in &status.layers {
        lines.push(format!("  {} {}", layer.id, layer.status));
    }
    for line in &status.status {
        lines.push(line.clone());
    }
    lines.join("\n")
}

fn summary(status: &PullStatus) -> String {
    if status.active {
        "active".into()
    } else if status.is_finished() {
        "finished".into()
    } else {
        "idle".into()
    }
}

fn registry_auth(user: Option<String>) -> Result<Option<RegistryAuth>, CliError> {
    let Some(username) = user else {
        return Ok(None);
    };
    let password = rpassword::prompt_password("Registry password: ")?;
    if password.is_empty() {
        return Err(CliError::Validation {
            field: "registry password".into(),
            reason: "value cannot be empty".into(),
        });
    }
    Ok(Some(RegistryAuth {
        username,
        password: SecretString::from(password),
    }))
}

async fn fetch_status(console: &Console) -> Result<PullStatus, CliError> {
    match console.execute(CoreCommand::PullStatus).await? {
        CommandResult::Pull(status) => Ok(status),
        other => Err(CliError::Internal(format!(
            "unexpected command result: {other:?}"
        ))),
    }
}

/// Poll the pull status until the server reports it inactive.
async fn follow(console: &Console, mut status: PullStatus, quiet: bool) -> Result<PullStatus, CliError> {
    let bar = if quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(0)
    };
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{bar:30}] {bytes}/{total_bytes} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );

    while status.active {
        let totals = status.totals();
        bar.set_length(totals.total);
        bar.set_position(totals.current);
        if let Some(line) = status.status.last() {
            bar.set_message(line.clone());
        }
        tokio::time::sleep(POLL_INTERVAL).await;
        status = fetch_status(console).await?;
    }

    bar.finish_and_clear();
    Ok(status)
}

pub async fn handle(console: &Console, args: PullArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        PullCommand::Start {
            image,
            registry_user,
            follow: follow_flag,
        } => {
            let request = PullRequest {
                registry: registry_auth(registry_user)?,
                ..PullRequest::new(image.clone())
            };
            let status = match console.execute(CoreCommand::PullStart(request)).await? {
                CommandResult::Pull(status) => status,
                other => {
                    return Err(CliError::Internal(format!(
                        "unexpected command result: {other:?}"
                    )));
                }
            };
            if !global.quiet {
                eprintln!("Pulling {image}");
            }
            let status = if follow_flag {
                follow(console, status, global.quiet).await?
            } else {
                status
            };
            let out = output::render_single(&global.output, &status, detail, summary);
            output::print_output(&out, global.quiet);
            Ok(())
        }

        PullCommand::Status { follow: follow_flag } => {
            let mut status = fetch_status(console).await?;
            if follow_flag {
                status = follow(console, status, global.quiet).await?;
            }
            let out = output::render_single(&global.output, &status, detail, summary);
            output::print_output(&out, global.quiet);
            Ok(())
        }

        PullCommand::Stop => {
            console.execute(CoreCommand::PullStop).await?;
            if !global.quiet {
                eprintln!("Pull stopped");
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use roomctl_core::{LayerProgress, PullLayer};

    use super::*;

    #[test]
    fn summary_reflects_lifecycle() {
        assert_eq!(summary(&PullStatus::default()), "idle");
        let active = PullStatus {
            active: true,
            ..PullStatus::default()
        };
        assert_eq!(summary(&active), "active");
        let done = PullStatus {
            finished: Some(chrono::Utc::now()),
            ..PullStatus::default()
        };
        assert_eq!(summary(&done), "finished");
    }

    #[test]
    fn detail_lists_layers_and_progress() {
        let status = PullStatus {
            active: true,
            layers: vec![PullLayer {
                id: "abc123".into(),
                status: "Downloading".into(),
                progress_detail: Some(LayerProgress {
                    current: 5,
                    total: 10,
                }),
                ..PullLayer::default()
            }],
            status: vec!["Status: pulling".into()],
            ..PullStatus::default()
        };
        let out = detail(&status);
        assert!(out.contains("Progress: 5 / 10 bytes"));
        assert!(out.contains("abc123 Downloading"));
        assert!(out.ends_with("Status: pulling"));
    }
}
