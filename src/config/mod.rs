//! Configuration management for the jotter application.
//!
//! This module handles loading and validating configuration settings from environment
//! variables, with sensible defaults. Command-line flags can override either value
//! after loading.
//!
//! # Environment Variables
//!
//! - `JOTTER_DATA_FILE`: Path to the posts file (defaults to `posts.json` in the
//!   working directory). `~` and `$VAR` references are expanded.
//! - `JOTTER_BIND`: Address the HTTP server listens on (defaults to `127.0.0.1:5000`)

use crate::constants::{
    DEFAULT_BIND_ADDR, DEFAULT_DATA_FILE, ENV_VAR_JOTTER_BIND, ENV_VAR_JOTTER_DATA_FILE,
    REDACTED_PLACEHOLDER,
};
use crate::errors::{AppError, AppResult};
use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Configuration for the jotter application.
///
/// # Examples
///
/// Creating a configuration manually:
/// ```
/// use jotter::Config;
/// use std::path::PathBuf;
///
/// let config = Config {
///     data_file: PathBuf::from("/var/lib/jotter/posts.json"),
///     bind_addr: "127.0.0.1:8080".to_string(),
/// };
/// assert!(config.validate().is_ok());
/// ```
pub struct Config {
    /// Location of the posts file.
    pub data_file: PathBuf,

    /// Socket address for `jotter serve`.
    pub bind_addr: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("data_file", &REDACTED_PLACEHOLDER)
            .field("bind_addr", &self.bind_addr)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

/// Expands `~` and environment variable references in a path string.
fn expand_path(raw: &str) -> AppResult<PathBuf> {
    let expanded = shellexpand::full(raw)
        .map_err(|e| AppError::Config(format!("Failed to expand path: {}", e)))?;
    Ok(PathBuf::from(expanded.into_owned()))
}

impl Config {
    /// Loads configuration from environment variables with sensible defaults.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the data file path cannot be expanded
    /// (for example it references an undefined variable).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use jotter::Config;
    ///
    /// match Config::load() {
    ///     Ok(config) => println!("Listening on {}", config.bind_addr),
    ///     Err(err) => eprintln!("Failed to load config: {}", err),
    /// }
    /// ```
    pub fn load() -> AppResult<Self> {
        let data_file = match env::var(ENV_VAR_JOTTER_DATA_FILE) {
            Ok(raw) => expand_path(&raw)?,
            Err(_) => PathBuf::from(DEFAULT_DATA_FILE),
        };

        let bind_addr =
            env::var(ENV_VAR_JOTTER_BIND).unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

        Ok(Config {
            data_file,
            bind_addr,
        })
    }

    /// Applies command-line overrides on top of the loaded values.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the overriding data file path cannot be expanded.
    pub fn with_overrides(
        mut self,
        data_file: Option<&str>,
        bind_addr: Option<&str>,
    ) -> AppResult<Self> {
        if let Some(raw) = data_file {
            self.data_file = expand_path(raw)?;
        }
        if let Some(addr) = bind_addr {
            self.bind_addr = addr.to_string();
        }
        Ok(self)
    }

    /// Parses the bind address.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the address is not `host:port` with an IP host.
    pub fn socket_addr(&self) -> AppResult<SocketAddr> {
        self.bind_addr.parse().map_err(|e| {
            AppError::Config(format!("Invalid bind address '{}': {}", self.bind_addr, e))
        })
    }

    /// Validates that the configuration is usable.
    ///
    /// The bind address is only checked by [`Config::socket_addr`], which
    /// `serve` calls, so a stray `JOTTER_BIND` never blocks the other commands.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` with one of the following messages:
    /// - "Data file path is empty"
    /// - "Data file path points to a directory"
    pub fn validate(&self) -> AppResult<()> {
        if self.data_file.as_os_str().is_empty() {
            return Err(AppError::Config("Data file path is empty".to_string()));
        }

        if self.data_file.is_dir() {
            return Err(AppError::Config(format!(
                "Data file path points to a directory: {}",
                self.data_file.display()
            )));
        }

        Ok(())
    }
}
