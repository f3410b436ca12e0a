//! Clap derive structures for the `windhager` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// windhager -- read and control Windhager heating appliances
#[derive(Debug, Parser)]
#[command(
    name = "windhager",
    version,
    about = "Read and control Windhager heating appliances from the command line",
    long_about = "Talks to the appliance's local HTTP/JSON interface (Digest auth).\n\n\
        Discovers heating zones and the pellet heater, polls their datapoints,\n\
        and writes setpoints, programs and comfort corrections.",
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
    /// Appliance profile to use
    #[arg(long, short = 'p', env = "WINDHAGER_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Appliance host or URL (overrides profile)
    #[arg(long, env = "WINDHAGER_HOST", global = true)]
    pub host: Option<String>,

    /// Digest username (overrides profile)
    #[arg(long, short = 'u', env = "WINDHAGER_USERNAME", global = true)]
    pub username: Option<String>,

    /// Appliance password (overrides profile, keyring and env lookup)
    #[arg(long, env = "WINDHAGER_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "WINDHAGER_OUTPUT",
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

    /// Accept invalid TLS certificates on https hosts
    #[arg(long, short = 'k', env = "WINDHAGER_INSECURE", global = true)]
    pub insecure: bool,

    /// Per-request timeout in seconds (overrides profile)
    #[arg(long, env = "WINDHAGER_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
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

#[derive(Debug, Clone, Copy, ValueEnum)]
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
    /// List discovered devices
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Poll every discovered datapoint once
    #[command(alias = "snap")]
    Snapshot(SnapshotArgs),

    /// Read a single datapoint
    Get {
        /// Datapoint OID, e.g. /1/15/0/0/9/0
        oid: String,
    },

    /// Write a single datapoint
    Set {
        /// Datapoint OID, e.g. /1/7/2/3/58/0
        oid: String,

        /// Raw value as the appliance expects it
        #[arg(allow_negative_numbers = true)]
        value: String,
    },

    /// Inspect and control heating zones
    #[command(alias = "c")]
    Climate(ClimateArgs),

    /// Walk the whole lookup tree and log every reading
    Scan,

    /// Poll periodically and print each snapshot until interrupted
    Watch(WatchArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  DEVICES / SNAPSHOT / WATCH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct DevicesArgs {
    /// Only show descriptors of this kind (climate, temperature, sensor, select, total, total_increasing)
    #[arg(long)]
    pub kind: Option<String>,
}

#[derive(Debug, Args)]
pub struct SnapshotArgs {
    /// List raw OID readings instead of interpreted device states
    #[arg(long)]
    pub raw: bool,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Seconds between polls (defaults to the configured refresh interval)
    #[arg(long, short = 'i')]
    pub interval: Option<u64>,

    /// Stop after this many polls
    #[arg(long, short = 'n')]
    pub count: Option<u32>,

    /// List raw OID readings instead of interpreted device states
    #[arg(long)]
    pub raw: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CLIMATE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ClimateArgs {
    #[command(subcommand)]
    pub command: ClimateCommand,
}

#[derive(Debug, Subcommand)]
pub enum ClimateCommand {
    /// Show every heating zone
    #[command(alias = "ls")]
    Status {
        /// Report temperatures as measured, without the comfort correction
        #[arg(long)]
        raw: bool,
    },

    /// Hold a manual setpoint
    SetTemp {
        /// Target temperature in °C
        #[arg(allow_negative_numbers = true)]
        celsius: f64,

        #[command(flatten)]
        zone: ZoneArg,
    },

    /// Select a heating program (0-7)
    SetPreset {
        mode: u8,

        #[command(flatten)]
        zone: ZoneArg,
    },

    /// Set the comfort temperature correction in kelvin (-3.5 to 3.5)
    SetCompensation {
        #[arg(allow_negative_numbers = true)]
        kelvin: f64,

        #[command(flatten)]
        zone: ZoneArg,
    },
}

#[derive(Debug, Args)]
pub struct ZoneArg {
    /// Zone id, name or function path (e.g. /1/7/2); optional with a single zone
    #[arg(long, short = 'z')]
    pub zone: Option<String>,
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
    /// Create or extend the config file with a profile
    Init(InitArgs),

    /// Display current configuration (passwords redacted)
    Show,

    /// Store a password in the system keyring
    SetPassword {
        /// Profile name (defaults to the active profile)
        #[arg(long = "for")]
        profile: Option<String>,
    },

    /// Print the config file location
    Path,
}

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Profile name
    #[arg(long)]
    pub name: Option<String>,

    /// Where to keep the password
    #[arg(long, value_enum)]
    pub store: Option<PasswordStore>,

    /// Do not prompt; fail if a required value is missing
    #[arg(long)]
    pub no_input: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PasswordStore {
    /// System keyring
    Keyring,
    /// Plaintext in the config file
    Plaintext,
    /// Nowhere; supply it via --password or WINDHAGER_PASSWORD
    None,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
