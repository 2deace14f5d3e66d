//! Error handling utilities for the jotter application.
//!
//! This module provides the central error type `AppError` which represents all
//! possible error conditions that might occur in the application, as well as the
//! convenience type alias `AppResult` for functions that can return these errors.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the pure post transforms.
///
/// These map directly onto client errors at the HTTP boundary: a validation
/// failure is the caller's fault, a missing id is a not-found response.
///
/// # Examples
///
/// ```
/// use jotter::errors::PostError;
///
/// let error = PostError::NotFound { id: 42 };
/// assert!(format!("{}", error).contains("42"));
///
/// let error = PostError::Validation("content is required".to_string());
/// assert!(format!("{}", error).contains("content is required"));
/// ```
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PostError {
    /// A required field is missing or blank.
    #[error("Invalid post data: {0}")]
    Validation(String),

    /// The operation targets an id that is not in the collection.
    #[error("Post {id} not found")]
    NotFound {
        /// The id that was looked up
        id: u64,
    },
}

/// Represents errors that can occur when attempting to lock the posts file.
///
/// # Examples
///
/// ```
/// use jotter::errors::LockError;
/// use std::path::PathBuf;
///
/// let error = LockError::FileBusy {
///     path: PathBuf::from("/path/to/posts.json.lock"),
/// };
///
/// assert!(format!("{}", error).contains("held by another process"));
/// ```
#[derive(Debug, Error)]
pub enum LockError {
    /// Error when the lock stays held by another process past the retry budget.
    #[error("Posts file lock is held by another process: {path}. Please wait for the other jotter process to finish.")]
    FileBusy {
        /// The path to the lock file
        path: PathBuf,
    },

    /// Error when acquiring the lock fails for a technical reason.
    #[error("Failed to acquire lock {path}: {source}. Please check file permissions and ensure the directory is accessible.")]
    AcquisitionFailed {
        /// The path to the lock file that couldn't be locked
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

/// Represents all possible errors that can occur in the jotter application.
///
/// Note: This type does not implement `Clone` to avoid losing error context when
/// cloning `std::io::Error` values.
///
/// # Examples
///
/// Creating a configuration error:
/// ```
/// use jotter::errors::AppError;
///
/// let error = AppError::Config("Data file path is empty".to_string());
/// assert_eq!(format!("{}", error), "Configuration error: Data file path is empty");
/// ```
///
/// Converting from an IO error:
/// ```
/// use jotter::errors::AppError;
/// use std::io::{self, ErrorKind};
///
/// let io_error = io::Error::new(ErrorKind::PermissionDenied, "permission denied");
/// let app_error: AppError = io_error.into();
///
/// match app_error {
///     AppError::Io(inner) => assert_eq!(inner.kind(), ErrorKind::PermissionDenied),
///     _ => panic!("Expected Io variant"),
/// }
/// ```
#[derive(Debug, Error)]
pub enum AppError {
    /// Errors related to configuration loading or validation.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input/output errors from filesystem operations.
    ///
    /// This variant automatically converts from `std::io::Error` through the `From` trait.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Validation and lookup failures from the post transforms.
    #[error("{0}")]
    Post(#[from] PostError),

    /// Errors related to file locking.
    #[error("File locking error: {0}")]
    Lock(#[from] LockError),

    /// The posts collection could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The HTTP server failed to start or stopped unexpectedly.
    #[error("Server error: {0}")]
    Server(String),
}

/// A type alias for `Result<T, AppError>` to simplify function signatures.
///
/// # Examples
///
/// ```
/// use jotter::errors::{AppResult, AppError};
///
/// fn might_fail() -> AppResult<String> {
///     if false {
///         return Err(AppError::Config("Something went wrong".to_string()));
///     }
///     Ok("Operation succeeded".to_string())
/// }
/// ```
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::io;

    #[test]
    fn test_app_error_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");

        let app_error: AppError = io_error.into();

        match app_error {
            AppError::Io(inner) => {
                assert_eq!(inner.kind(), io::ErrorKind::NotFound);
            }
            _ => panic!("Expected AppError::Io variant"),
        }
    }

    #[test]
    fn test_app_error_display() {
        let config_error = AppError::Config("Invalid bind address".to_string());
        assert_eq!(
            format!("{}", config_error),
            "Configuration error: Invalid bind address"
        );

        let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "permission denied");
        let app_io_error = AppError::Io(io_error);
        assert_eq!(format!("{}", app_io_error), "I/O error: permission denied");

        // Post errors are shown as-is so they can be echoed back to clients
        let post_error = AppError::Post(PostError::NotFound { id: 7 });
        assert_eq!(format!("{}", post_error), "Post 7 not found");

        let lock_error = AppError::Lock(LockError::FileBusy {
            path: PathBuf::from("/data/posts.json.lock"),
        });
        assert!(format!("{}", lock_error).contains("File locking error"));
        assert!(format!("{}", lock_error).contains("/data/posts.json.lock"));
    }

    #[test]
    fn test_post_error_conversion_to_app_error() {
        let app_error: AppError = PostError::Validation("content is required".to_string()).into();

        match app_error {
            AppError::Post(PostError::Validation(msg)) => {
                assert_eq!(msg, "content is required");
            }
            _ => panic!("Expected AppError::Post variant"),
        }
    }

    #[test]
    fn test_lock_error_source_chaining() {
        let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "permission denied");
        let error = LockError::AcquisitionFailed {
            path: PathBuf::from("/data/posts.json.lock"),
            source: io_error,
        };

        let source = error
            .source()
            .expect("LockError::AcquisitionFailed should have a source");
        let source_io_error = source
            .downcast_ref::<io::Error>()
            .expect("Source should be an io::Error");
        assert_eq!(source_io_error.kind(), io::ErrorKind::PermissionDenied);

        let busy = LockError::FileBusy {
            path: PathBuf::from("/data/posts.json.lock"),
        };
        assert!(busy.source().is_none());
    }

    #[test]
    fn test_serialization_error_conversion() {
        let json_error = serde_json::from_str::<Vec<u64>>("not json").unwrap_err();
        let app_error: AppError = json_error.into();

        assert!(matches!(app_error, AppError::Serialization(_)));
        assert!(format!("{}", app_error).starts_with("Serialization error"));
    }
}
