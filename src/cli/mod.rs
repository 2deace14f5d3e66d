//! Command-line interface definitions.
//!
//! The CLI drives the same store operations as the HTTP server, against the
//! same file, so a quick `jotter add` works while `jotter serve` is running.

use crate::constants::{APP_DESCRIPTION, APP_NAME, DEFAULT_LOG_LEVEL};
use crate::logging::LogFormat;
use clap::{Parser, Subcommand};

/// A small journaling service that keeps your daily streak
#[derive(Parser, Debug)]
#[command(name = APP_NAME, about = APP_DESCRIPTION, version)]
pub struct CliArgs {
    /// Path to the posts file (overrides JOTTER_DATA_FILE)
    #[arg(long, global = true, value_name = "PATH")]
    pub data_file: Option<String>,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Log level or filter directive (RUST_LOG takes precedence)
    #[arg(long, global = true, default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,

    /// Shorthand for --log-level debug
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// The operation to run.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print all posts, newest first, with the current streak
    List,

    /// Add a post
    Add {
        /// The entry text
        content: String,
    },

    /// Replace the text of a post
    Edit {
        /// Id of the post to edit
        id: u64,
        /// The new text
        content: String,
    },

    /// Delete a post
    Delete {
        /// Id of the post to delete
        id: u64,
    },

    /// Print the current streak in days
    Streak,

    /// Run the HTTP server
    Serve {
        /// Listen address (overrides JOTTER_BIND)
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
    },
}

impl CliArgs {
    /// The log filter to install, taking `--verbose` into account.
    pub fn effective_log_level(&self) -> &str {
        if self.verbose {
            "debug"
        } else {
            &self.log_level
        }
    }

    /// The `--bind` override, if the command is `serve`.
    pub fn bind_override(&self) -> Option<&str> {
        match &self.command {
            Command::Serve { bind } => bind.as_deref(),
            _ => None,
        }
    }
}
