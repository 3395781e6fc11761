//! CLI command definitions and argument parsing.

use crate::config::API_KEY_ENV;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Storyboard CLI - Split scripts into shots and describe them with an LLM.
#[derive(Debug, Parser)]
#[command(name = "storyboard")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Profile to use
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    /// API key; overrides the profile's key variable
    #[arg(long, global = true, env = API_KEY_ENV, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (bare text)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Split a source document into numbered segments
    Split(SplitArgs),

    /// Describe numbered segments batch by batch
    Describe(DescribeArgs),

    /// Split a document, then describe every segment
    Run(RunArgs),

    /// List the known providers
    Providers,

    /// Manage configuration profiles
    Profile(ProfileArgs),

    /// Enter interactive REPL mode
    Repl,
}

/// Options shared by commands that split text.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct SplitOptions {
    /// Per-line character ceiling (default from config)
    #[arg(long)]
    pub max_chars: Option<usize>,

    /// Keep every sentence on its own line
    #[arg(long)]
    pub no_merge: bool,
}

/// Options shared by commands that describe segments.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct DescribeOptions {
    /// File with the character sheet
    #[arg(long)]
    pub characters: Option<PathBuf>,

    /// Style flags appended to image descriptions (default from config)
    #[arg(long)]
    pub style: Option<String>,

    /// Segments per call (default from config)
    #[arg(short, long)]
    pub batch_size: Option<usize>,

    /// Pause between batches in milliseconds (default from config)
    #[arg(long)]
    pub delay_ms: Option<u64>,
}

/// Arguments for the split command.
#[derive(Debug, Parser)]
pub struct SplitArgs {
    /// Source document (UTF-8 text)
    pub input: PathBuf,

    /// Write the numbered lines to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub options: SplitOptions,
}

/// Arguments for the describe command.
#[derive(Debug, Parser)]
pub struct DescribeArgs {
    /// File of numbered lines, as written by `split -o`
    pub input: PathBuf,

    /// Write the storyboard to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub options: DescribeOptions,
}

/// Arguments for the run command.
#[derive(Debug, Parser)]
pub struct RunArgs {
    /// Source document (UTF-8 text)
    pub input: PathBuf,

    /// Write the storyboard to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also write the numbered lines to this file
    #[arg(long)]
    pub segments_output: Option<PathBuf>,

    #[command(flatten)]
    pub split: SplitOptions,

    #[command(flatten)]
    pub describe: DescribeOptions,
}

/// Arguments for profile management.
#[derive(Debug, Parser)]
pub struct ProfileArgs {
    #[command(subcommand)]
    pub action: ProfileAction,
}

/// Profile management actions.
#[derive(Debug, Subcommand)]
pub enum ProfileAction {
    /// List all profiles
    List,

    /// Show active profile
    Show,

    /// Switch to a different profile
    Switch {
        /// Profile name
        name: String,
    },

    /// Create or update a profile
    Set {
        /// Profile name
        name: String,
        /// Provider name (see `storyboard providers`)
        #[arg(long)]
        provider: String,
        /// Model id
        #[arg(short, long)]
        model: Option<String>,
        /// Base URL for a custom relay
        #[arg(short, long)]
        url: Option<String>,
        /// Environment variable holding the API key
        #[arg(short, long)]
        key_env: Option<String>,
        /// Request timeout in seconds
        #[arg(short, long)]
        timeout: Option<u64>,
    },

    /// Delete a profile
    Delete {
        /// Profile name
        name: String,
    },
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}
