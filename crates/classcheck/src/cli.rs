//! Clap derive structures for the `classcheck` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use classcheck_core::{PollDuration, PollId, StudentId};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// classcheck -- classroom attendance from the command line
#[derive(Debug, Parser)]
#[command(
    name = "classcheck",
    version,
    about = "Run ClassCheck attendance polls from the command line",
    long_about = "Manage the student roster, open timed attendance polls, mark\n\
        attendance by roll number, and review or export attendance logs\n\
        from a ClassCheck service.",
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
    /// Service profile to use
    #[arg(long, short = 'p', env = "CLASSCHECK_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Service base URL (overrides profile)
    #[arg(long, short = 'u', env = "CLASSCHECK_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Bearer token (overrides profile and keyring)
    #[arg(long, env = "CLASSCHECK_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "CLASSCHECK_OUTPUT",
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

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', env = "CLASSCHECK_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "CLASSCHECK_TIMEOUT", global = true)]
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
    /// Manage the student roster
    #[command(alias = "st")]
    Students(StudentsArgs),

    /// Start and observe attendance polls
    Poll(PollArgs),

    /// Mark a roll number present in the open poll
    Mark(MarkArgs),

    /// Interactive student check-in terminal
    Kiosk,

    /// Review and export attendance logs
    #[command(alias = "log")]
    Logs(LogsArgs),

    /// Check that the service is reachable and healthy
    Ping,

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared pagination ────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct PageArgs {
    /// Number of entries to skip
    #[arg(long, default_value = "0")]
    pub skip: u32,

    /// Maximum number of entries to return
    #[arg(long, short = 'l')]
    pub limit: Option<u32>,
}

// ── Students ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct StudentsArgs {
    #[command(subcommand)]
    pub command: StudentsCommand,
}

#[derive(Debug, Subcommand)]
pub enum StudentsCommand {
    /// List students ordered by id
    #[command(alias = "ls")]
    List(PageArgs),

    /// Show one student
    Get { id: StudentId },

    /// Register a student
    Create {
        #[arg(long)]
        name: String,
        /// Unique roll number (matched exactly when marking)
        #[arg(long)]
        roll_no: String,
        #[arg(long)]
        department: String,
    },

    /// Change a student's details
    Update {
        id: StudentId,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        roll_no: Option<String>,
        #[arg(long)]
        department: Option<String>,
    },

    /// Remove a student
    #[command(alias = "rm")]
    Delete { id: StudentId },

    /// Polls a student was marked present in, newest first
    History { id: StudentId },
}

// ── Polls ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct PollArgs {
    #[command(subcommand)]
    pub command: PollCommand,
}

#[derive(Debug, Subcommand)]
pub enum PollCommand {
    /// Open a new attendance poll
    Start {
        /// Poll length in minutes (1-60)
        #[arg(long, short = 'd', default_value = "5")]
        duration: PollDuration,
    },

    /// Show the current poll status once
    Status,

    /// Follow the current poll with a live countdown
    Watch {
        /// Also show the live attendance board (present / total)
        #[arg(long, short = 'b')]
        board: bool,

        /// Exit once no poll is open
        #[arg(long)]
        exit_on_close: bool,
    },
}

// ── Mark ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct MarkArgs {
    /// Roll number, matched exactly against the roster
    pub roll_no: String,
}

// ── Logs ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LogsArgs {
    #[command(subcommand)]
    pub command: LogsCommand,
}

#[derive(Debug, Subcommand)]
pub enum LogsCommand {
    /// List polls, newest first
    #[command(alias = "ls")]
    List(PageArgs),

    /// Attendance summary and records for one poll
    Show { poll_id: PollId },

    /// Write a poll's attendance as CSV
    Export {
        poll_id: PollId,

        /// Output file (default: attendance-<poll_id>.csv)
        #[arg(long, short = 'f', conflicts_with = "stdout")]
        file: Option<PathBuf>,

        /// Write to stdout instead of a file
        #[arg(long)]
        stdout: bool,
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
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Set a value on the active profile
    Set {
        /// Profile key (api_url, token_env, ca_cert, insecure, timeout, ...)
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name
        name: String,
    },

    /// Store a bearer token in the system keyring
    SetToken {
        /// Profile name (defaults to the active profile)
        #[arg(long)]
        profile: Option<String>,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
