//! Command dispatch: bridges CLI args -> core Commands -> output formatting.

pub mod config_cmd;
pub mod pull;
pub mod rooms;
pub mod util;
pub mod watch;

use roomctl_core::Console;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a server-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, console: &Console, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Rooms(args) => rooms::handle(console, args, global).await,
        Command::Pull(args) => pull::handle(console, args, global).await,
        Command::Watch(args) => watch::handle(console, args, global).await,
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "local command routed to the server dispatcher".into(),
        )),
    }
}
