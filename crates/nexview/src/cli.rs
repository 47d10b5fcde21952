//! Clap derive structures for the `nexview` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use nexview_core::MediaCommand;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// nexview -- watch and control a remote host from the terminal
#[derive(Debug, Parser)]
#[command(
    name = "nexview",
    version,
    about = "Monitor a nexview telemetry server from the command line",
    long_about = "Streams live system telemetry (CPU, memory, disk, network, media \n\
        players) from a nexview server and sends media transport commands back.",
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
    /// Server host (overrides the saved endpoint)
    #[arg(long, short = 'H', env = "NEXVIEW_HOST", global = true)]
    pub host: Option<String>,

    /// Server port (overrides the saved endpoint)
    #[arg(long, short = 'P', env = "NEXVIEW_PORT", global = true)]
    pub port: Option<u16>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "NEXVIEW_OUTPUT",
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

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "NEXVIEW_INSECURE", global = true)]
    pub insecure: bool,

    /// Request and first-snapshot timeout in seconds
    #[arg(long, env = "NEXVIEW_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Write logs to this file instead of stderr
    #[arg(long, env = "NEXVIEW_LOG_FILE", global = true)]
    pub log_file: Option<PathBuf>,
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
    /// Log in to a server and store the session token
    Login(LoginArgs),

    /// Forget the saved server and token
    Logout,

    /// Stream live telemetry until interrupted
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Print one telemetry snapshot
    #[command(alias = "s")]
    Stats,

    /// List media players on the host
    #[command(alias = "ls")]
    Players,

    /// Send a media command to a player
    #[command(alias = "p")]
    Player(PlayerArgs),

    /// Show current weather for the configured location
    Weather(WeatherArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Login ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Account username
    #[arg(long, short = 'u', env = "NEXVIEW_USERNAME")]
    pub username: String,

    /// Read the password from stdin instead of prompting
    #[arg(long)]
    pub password_stdin: bool,
}

// ── Watch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Stop after this many snapshots
    #[arg(long, short = 'n')]
    pub count: Option<usize>,
}

// ── Player ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct PlayerArgs {
    /// Player ID (see `nexview players`)
    pub id: String,

    /// Action: previous (prev), play-pause (toggle), next
    #[arg(value_parser = parse_media_command)]
    pub action: MediaCommand,
}

fn parse_media_command(s: &str) -> Result<MediaCommand, String> {
    s.parse()
        .map_err(|_| format!("unknown action '{s}' (expected previous, play-pause, or next)"))
}

// ── Weather ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WeatherArgs {
    /// Latitude in degrees (overrides config)
    #[arg(long, allow_hyphen_values = true)]
    pub latitude: Option<f64>,

    /// Longitude in degrees (overrides config)
    #[arg(long, allow_hyphen_values = true)]
    pub longitude: Option<f64>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current resolved configuration
    Show,

    /// Print the config file path
    Path,

    /// Set a configuration value
    Set {
        /// Config key (dot-separated path, e.g., "session.reconnect_delay_secs")
        key: String,

        /// Value to set ("none" clears optional keys)
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
