//! Clap derive structures for the `jellyfish` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use jellyfish_core::{RequestOptions, Rgb};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// jellyfish -- control JellyFish lighting from the command line
#[derive(Debug, Parser)]
#[command(
    name = "jellyfish",
    version,
    about = "Control JellyFish lighting controllers from the command line",
    long_about = "Turn zones on and off, run patterns and manage schedules on a\n\
        JellyFish lighting controller over its local WebSocket API.",
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
    /// Controller profile to use
    #[arg(long, short = 'p', env = "JELLYFISH_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Controller hostname or IP address (overrides profile)
    #[arg(long, short = 'H', env = "JELLYFISH_HOST", global = true)]
    pub host: Option<String>,

    /// Controller WebSocket port (overrides profile)
    #[arg(long, env = "JELLYFISH_PORT", global = true)]
    pub port: Option<u16>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "JELLYFISH_OUTPUT",
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

    /// Confirmation timeout in seconds (overrides profile)
    #[arg(long, env = "JELLYFISH_TIMEOUT", global = true)]
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
    /// Show controller name, hostname and firmware
    Info,

    /// Manage zone topology
    #[command(alias = "z")]
    Zones(ZonesArgs),

    /// Show the current state of zones
    States(ZoneSelection),

    /// Turn zones on
    On(ZoneAction),

    /// Turn zones off
    Off(ZoneAction),

    /// Show a solid color on zones
    Color(ColorArgs),

    /// Show a repeating string of colors on zones
    Lights(LightsArgs),

    /// Manage stored patterns
    #[command(alias = "pat")]
    Patterns(PatternsArgs),

    /// Manage the calendar and daily schedules
    #[command(alias = "sched")]
    Schedule(ScheduleArgs),

    /// Show or change the controller name
    Name(NameArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared Arguments ─────────────────────────────────────────────────

/// Zones to act on. Every zone when none are given.
#[derive(Debug, Args)]
pub struct ZoneSelection {
    /// Zone name (repeatable)
    #[arg(long = "zone", short = 'z')]
    pub zones: Vec<String>,
}

/// Whether to wait for the controller to confirm a change.
#[derive(Debug, Args)]
pub struct WaitArgs {
    /// Return as soon as the request is sent
    #[arg(long)]
    pub no_wait: bool,
}

impl WaitArgs {
    /// Request options for a change, using `timeout` when waiting.
    pub fn options(&self, timeout: std::time::Duration) -> RequestOptions {
        if self.no_wait {
            RequestOptions::no_wait()
        } else {
            RequestOptions::with_timeout(timeout)
        }
    }
}

#[derive(Debug, Args)]
pub struct ZoneAction {
    #[command(flatten)]
    pub selection: ZoneSelection,

    #[command(flatten)]
    pub wait: WaitArgs,
}

// ── Zones ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ZonesArgs {
    #[command(subcommand)]
    pub command: ZonesCommand,
}

#[derive(Debug, Subcommand)]
pub enum ZonesCommand {
    /// List zones and their port mappings
    #[command(alias = "ls")]
    List,

    /// Add a zone mapped onto one controller port
    Add {
        /// Zone name
        name: String,

        /// Physical port number (1-based)
        #[arg(long)]
        phy_port: u32,

        /// First pixel index on the port
        #[arg(long, default_value = "0")]
        start: u32,

        /// Last pixel index on the port (inclusive)
        #[arg(long)]
        end: u32,

        /// Controller that owns the port (defaults to this controller)
        #[arg(long)]
        ctlr: Option<String>,

        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Delete a zone
    #[command(alias = "rm")]
    Delete {
        /// Zone name
        name: String,

        #[command(flatten)]
        wait: WaitArgs,
    },
}

// ── Colors ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ColorArgs {
    /// Color as `r,g,b` or `#rrggbb`
    pub color: Rgb,

    /// Brightness percent (0-100)
    #[arg(long, short = 'b', default_value = "100")]
    pub brightness: u8,

    #[command(flatten)]
    pub selection: ZoneSelection,

    #[command(flatten)]
    pub wait: WaitArgs,
}

#[derive(Debug, Args)]
pub struct LightsArgs {
    /// Colors, one per light, as `r,g,b` or `#rrggbb`
    #[arg(required = true, num_args = 1..)]
    pub colors: Vec<Rgb>,

    /// Brightness percent (0-100)
    #[arg(long, short = 'b', default_value = "100")]
    pub brightness: u8,

    #[command(flatten)]
    pub selection: ZoneSelection,

    #[command(flatten)]
    pub wait: WaitArgs,
}

// ── Patterns ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct PatternsArgs {
    #[command(subcommand)]
    pub command: PatternsCommand,
}

#[derive(Debug, Subcommand)]
pub enum PatternsCommand {
    /// List stored patterns and folders
    #[command(alias = "ls")]
    List,

    /// Show the configuration of a stored pattern
    Show {
        /// Pattern as `folder/name`
        pattern: String,
    },

    /// Run a stored pattern on zones
    Apply {
        /// Pattern as `folder/name`
        pattern: String,

        #[command(flatten)]
        selection: ZoneSelection,

        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Create or overwrite a pattern from a JSON pattern configuration
    Save {
        /// Pattern as `folder/name`
        pattern: String,

        /// JSON file holding the pattern configuration
        #[arg(long, short = 'F')]
        from_file: PathBuf,

        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Delete a stored pattern
    #[command(alias = "rm")]
    Delete {
        /// Pattern as `folder/name`
        pattern: String,

        #[command(flatten)]
        wait: WaitArgs,
    },
}

// ── Schedules ────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ScheduleArgs {
    #[command(subcommand)]
    pub command: ScheduleCommand,
}

#[derive(Debug, Subcommand)]
pub enum ScheduleCommand {
    /// Events tied to calendar dates
    Calendar(ScheduleAction),

    /// Events repeating on weekdays
    Daily(ScheduleAction),
}

#[derive(Debug, Args)]
pub struct ScheduleAction {
    #[command(subcommand)]
    pub command: ScheduleActionCommand,
}

#[derive(Debug, Subcommand)]
pub enum ScheduleActionCommand {
    /// List scheduled events
    #[command(alias = "ls")]
    List,

    /// Replace the whole schedule with the events in a JSON file
    Set {
        /// JSON file holding an array of events
        #[arg(long, short = 'F')]
        from_file: PathBuf,

        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Append one event from a JSON file
    Add {
        /// JSON file holding a single event
        #[arg(long, short = 'F')]
        from_file: PathBuf,

        #[command(flatten)]
        wait: WaitArgs,
    },

    /// Remove every event
    Clear {
        #[command(flatten)]
        wait: WaitArgs,
    },
}

// ── Name ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct NameArgs {
    #[command(subcommand)]
    pub command: NameCommand,
}

#[derive(Debug, Subcommand)]
pub enum NameCommand {
    /// Show the controller name
    Show,

    /// Rename the controller
    Set {
        /// New name
        name: String,

        #[command(flatten)]
        wait: WaitArgs,
    },
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Add a profile to the config file, prompting for anything not
    /// given through --name, --host or --port
    Init {
        /// Profile name
        #[arg(long)]
        name: Option<String>,
    },

    /// Display the current configuration
    Show,

    /// Print the config file location
    Path,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
