//! Clap derive structures for the `roomctl` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// roomctl -- manage rooms on a room server from the command line
#[derive(Debug, Parser)]
#[command(
    name = "roomctl",
    version,
    about = "Manage virtual browser rooms from the command line",
    long_about = "A console for room servers.\n\n\
        Creates, starts, stops and recreates rooms, pulls room images,\n\
        and follows the server's live event stream.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Server profile to use
    #[arg(long, short = 'p', env = "ROOMCTL_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Room server URL (overrides profile)
    #[arg(long, short = 'u', env = "ROOMCTL_URL", global = true)]
    pub url: Option<String>,

    /// Username for HTTP basic auth (overrides profile)
    #[arg(long, env = "ROOMCTL_USERNAME", global = true)]
    pub username: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "ROOMCTL_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "ROOMCTL_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "ROOMCTL_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage rooms
    #[command(alias = "r")]
    Rooms(RoomsArgs),

    /// Pull room images onto the server
    Pull(PullArgs),

    /// Follow live room changes from the server event stream
    Watch(WatchArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  ROOMS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct RoomsArgs {
    #[command(subcommand)]
    pub command: RoomsCommand,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RoomStateArg {
    Running,
    Paused,
    Stopped,
}

#[derive(Debug, Subcommand)]
pub enum RoomsCommand {
    /// List rooms
    #[command(alias = "ls")]
    List {
        /// Server-side label filter (repeatable)
        #[arg(long, short = 'l', value_name = "KEY=VALUE")]
        label: Vec<String>,

        /// Only rooms in this state
        #[arg(long)]
        state: Option<RoomStateArg>,

        /// Only rooms whose name contains this text
        #[arg(long)]
        name: Option<String>,
    },

    /// Show a room
    Get {
        /// Room ID or name
        room: String,
    },

    /// Create a room
    Create {
        /// Room name
        #[arg(long, required_unless_present = "from_file")]
        name: Option<String>,

        /// Room image (e.g., m1k1o/neko:firefox)
        #[arg(long, required_unless_present = "from_file")]
        image: Option<String>,

        /// Maximum concurrent connections
        #[arg(long)]
        max_connections: Option<u16>,

        /// Screen size and rate (e.g., 1920x1080@30)
        #[arg(long)]
        screen: Option<String>,

        /// Room label (repeatable)
        #[arg(long, short = 'l', value_name = "KEY=VALUE")]
        label: Vec<String>,

        /// Full room settings as JSON (overrides the flags above)
        #[arg(long, short = 'F', value_name = "PATH")]
        from_file: Option<PathBuf>,

        /// Start the room after creating it
        #[arg(long)]
        start: bool,
    },

    /// Remove a room
    #[command(alias = "rm")]
    Remove {
        /// Room ID or name
        room: String,
    },

    /// Start a room
    Start {
        /// Room ID or name
        room: String,
    },

    /// Stop a room
    Stop {
        /// Room ID or name
        room: String,
    },

    /// Pause a room
    Pause {
        /// Room ID or name
        room: String,
    },

    /// Restart a room
    Restart {
        /// Room ID or name
        room: String,
    },

    /// Recreate a room's container, optionally with new settings
    Recreate {
        /// Room ID or name
        room: String,

        /// Replacement settings as JSON
        #[arg(long, short = 'F', value_name = "PATH")]
        from_file: Option<PathBuf>,

        /// Start the recreated room
        #[arg(long, conflicts_with = "no_start")]
        start: bool,

        /// Leave the recreated room stopped
        #[arg(long)]
        no_start: bool,
    },

    /// Show a room's settings
    Settings {
        /// Room ID or name
        room: String,
    },

    /// Show a room's live session statistics
    Stats {
        /// Room ID or name
        room: String,
    },

    /// Export all rooms as a docker-compose file
    Compose,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  PULL
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct PullArgs {
    #[command(subcommand)]
    pub command: PullCommand,
}

#[derive(Debug, Subcommand)]
pub enum PullCommand {
    /// Start pulling an image
    Start {
        /// Image reference
        image: String,

        /// Registry username (password is prompted)
        #[arg(long)]
        registry_user: Option<String>,

        /// Follow progress until the pull finishes
        #[arg(long, short = 'f')]
        follow: bool,
    },

    /// Show the current pull status
    Status {
        /// Follow progress until the pull finishes
        #[arg(long, short = 'f')]
        follow: bool,
    },

    /// Abort the running pull
    Stop,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  WATCH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Fetch full details for rooms created while watching
    #[arg(long)]
    pub hydrate: bool,

    /// Print the room table after every change instead of one line per event
    #[arg(long)]
    pub table: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Print the config file path
    Path,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store a password in the system keyring
    SetPassword {
        /// Profile name (defaults to active profile)
        #[arg(long)]
        profile: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
