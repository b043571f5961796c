//! Clap derive structures for the `groundlink` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// groundlink -- drone session replay on the groundlink engine
#[derive(Debug, Parser)]
#[command(
    name = "groundlink",
    version,
    about = "Replay drone sessions through the groundlink engine",
    long_about = "Feeds a scripted session (discovery, link events, feature messages)\n\
        to the groundlink engine and prints every component and device state\n\
        change that application observers would see.",
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
    /// Output format (defaults to the configured one)
    #[arg(long, short = 'o', env = "GROUNDLINK_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One line per notification: device, component, compact JSON value
    Plain,
    /// One JSON object per line
    Json,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a session script through the engine
    Replay(ReplayArgs),

    /// Inspect configuration
    #[command(alias = "cfg")]
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Replay ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ReplayArgs {
    /// Session script (JSON)
    pub script: PathBuf,

    /// Device settings file (overrides the configured one)
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Keep device settings in memory only
    #[arg(long, conflicts_with = "settings")]
    pub ephemeral: bool,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,

    /// Print the effective configuration as TOML
    Show,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
