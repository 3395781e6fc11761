//! Storyboard CLI library.
//!
//! Configuration, command execution, the interactive session and output
//! formatting for the `storyboard` binary.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;
pub mod repl;

pub use cli::{Cli, Command};
pub use config::Config;
pub use error::{CliError, Result};
pub use output::Formatter;
