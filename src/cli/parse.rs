//! CLI parse: clap types for veil. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// veil - policy-driven content redaction with a self-updating moderation policy
#[derive(Parser)]
#[command(name = "veil")]
#[command(about = "Redact content-tree snapshots with an LLM-evaluated policy that learns from flagged samples")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides layered config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Verbose logging (debug level unless --log-level is given)
    #[arg(long, short = 'v', conflicts_with = "quiet")]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, short = 'q')]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (with --log-output file)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the decision for every visited node without issuing calls
    Plan {
        /// Content tree snapshot (JSON)
        snapshot: PathBuf,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Classify a snapshot and list the nodes to redact
    Scan {
        /// Content tree snapshot (JSON)
        snapshot: PathBuf,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Rescan a snapshot every time it changes on disk
    Watch {
        /// Content tree snapshot (JSON)
        snapshot: PathBuf,
        /// Quiet window before rescanning (milliseconds)
        #[arg(long)]
        debounce_ms: Option<u64>,
    },
    /// Print the text of leaves inside a rectangle, optionally flagging it
    Select {
        /// Content tree snapshot (JSON)
        snapshot: PathBuf,
        /// Rectangle as left,top,right,bottom
        #[arg(long, allow_hyphen_values = true)]
        rect: String,
        /// Flag the selected text
        #[arg(long)]
        flag: bool,
    },
    /// Flag a sample and fold it into the policy
    Flag {
        /// Flagged text
        text: String,
    },
    /// Inspect or edit the policy document
    Policy {
        #[command(subcommand)]
        command: PolicyCommands,
    },
    /// List flagged samples
    History {
        /// Show only the most recent N samples
        #[arg(long)]
        limit: Option<usize>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show policy, history and provider state
    Status {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Print the effective configuration (API key masked)
    Config,
}

#[derive(Subcommand)]
pub enum PolicyCommands {
    /// Print the policy in force
    Show,
    /// Replace the policy
    Set {
        /// New policy text
        text: String,
    },
    /// Forget the stored policy and fall back to the default
    Reset,
}
