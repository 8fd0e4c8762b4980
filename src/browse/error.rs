//! Browse error types

use std::path::PathBuf;

use thiserror::Error;

/// Rejections produced while sandboxing a user-supplied path
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("path attempts to traverse up: '{0}'")]
    Traversal(String),

    #[error("path outside root directory: {}", .0.display())]
    OutsideRoot(PathBuf),
}

/// Listing and media selection errors
#[derive(Error, Debug)]
pub enum BrowseError {
    #[error(transparent)]
    Path(#[from] PathError),

    #[error("cannot read directory '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no media files found in '{path}'")]
    NoMedia { path: String },
}

impl BrowseError {
    /// Check if this error should result in a 403 Forbidden response
    pub fn is_forbidden(&self) -> bool {
        matches!(self, BrowseError::Path(_))
    }

    /// Check if this error should result in a 404 Not Found response
    pub fn is_not_found(&self) -> bool {
        matches!(self, BrowseError::NoMedia { .. })
    }
}
