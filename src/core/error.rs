//! Error types for Treecast
//!
//! Crate-wide error enum plus the errors of the subsystems that have no
//! module-local error type of their own.

use std::path::PathBuf;

use thiserror::Error;

use crate::browse::BrowseError;
use crate::logging::LoggingError;

/// Result type alias for Treecast operations
pub type Result<T> = std::result::Result<T, TreecastError>;

/// Main error type for Treecast
#[derive(Error, Debug)]
pub enum TreecastError {
    #[error("Browse error: {0}")]
    Browse(#[from] BrowseError),

    #[error("Watcher error: {0}")]
    Watcher(#[from] WatcherError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),

    #[error("Server bind failed on {addr}: {reason}")]
    BindFailed { addr: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("Directory does not exist: {path}")]
    RootNotFound { path: PathBuf },

    #[error("Not a directory: {path}")]
    RootNotDirectory { path: PathBuf },

    #[error("Cannot resolve served directory {path}: {source}")]
    RootUnresolvable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// File watcher errors
#[derive(Error, Debug)]
pub enum WatcherError {
    #[error("Failed to create watcher: {0}")]
    Init(#[source] notify::Error),

    #[error("Failed to watch {path}: {source}")]
    Subscribe {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error("Watcher already started")]
    AlreadyStarted,
}
