//! Constants used throughout the application.
//!
//! This module contains all constants used in the Jotter application, organized
//! into logical groups. Having constants centralized makes them easier to find,
//! modify, and reference consistently.

// Application Metadata
/// The name of the application.
pub const APP_NAME: &str = "jotter";
/// The description of the application used in CLI help text.
pub const APP_DESCRIPTION: &str = "A small journaling service that keeps your daily streak";

// CLI Arguments & Defaults
/// Log format identifier for plain text.
pub const LOG_FORMAT_TEXT: &str = "text";
/// Log format identifier for JSON.
pub const LOG_FORMAT_JSON: &str = "json";
/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// Configuration Keys & Environment Variables
/// Environment variable for the location of the posts file.
pub const ENV_VAR_JOTTER_DATA_FILE: &str = "JOTTER_DATA_FILE";
/// Environment variable for the HTTP listen address.
pub const ENV_VAR_JOTTER_BIND: &str = "JOTTER_BIND";
/// Default posts file, relative to the working directory.
pub const DEFAULT_DATA_FILE: &str = "posts.json";
/// Default HTTP listen address.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5000";

// Validation
/// Placeholder string for redacted information in debug output.
pub const REDACTED_PLACEHOLDER: &str = "[REDACTED]";
/// Field names owned by the store. Never taken from caller-supplied extras.
pub const RESERVED_POST_FIELDS: &[&str] = &["id", "content", "timestamp"];

// File System Parameters
/// Suffix of the sidecar file used for the cross-process write lock.
pub const LOCK_FILE_SUFFIX: &str = ".lock";
/// Infix of the file a corrupt posts file is moved to before it is overwritten.
pub const CORRUPT_FILE_INFIX: &str = ".corrupt-";
/// Timestamp format appended to preserved corrupt files.
pub const CORRUPT_FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";
/// Indentation used when pretty-printing the posts file.
pub const JSON_INDENT: &[u8] = b"    ";
/// Default POSIX permissions for the posts file (owner read/write).
#[cfg(unix)]
pub const DEFAULT_FILE_PERMISSIONS: u32 = 0o600;
/// How many times a busy lock is retried before giving up.
pub const LOCK_RETRY_ATTEMPTS: u32 = 100;
/// Pause between lock attempts, in milliseconds.
pub const LOCK_RETRY_INTERVAL_MS: u64 = 50;

// Date/Time Logic
/// Format used when printing post timestamps on the terminal.
pub const DISPLAY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

// Logging Configuration
/// Service name used in tracing spans and structured logs.
pub const TRACING_SERVICE_NAME: &str = "jotter";
/// Name for the root tracing span covering an application invocation.
pub const TRACING_ROOT_SPAN_NAME: &str = "app_invocation";
