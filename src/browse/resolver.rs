//! Path sandboxing
//!
//! Every user-supplied relative path goes through [`ServedRoot::resolve`]
//! before it touches the filesystem. Two independent checks apply:
//! a textual rejection of `..` segments, then a containment check of the
//! canonical candidate against the canonical root.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::error::PathError;

/// The canonicalized directory this process is allowed to expose
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServedRoot {
    path: PathBuf,
}

/// A user path that passed the sandbox checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Normalized relative form, `""` for the root itself
    pub relative: String,
    /// Absolute filesystem path
    pub absolute: PathBuf,
}

impl ServedRoot {
    /// Canonicalize `path` once; it stays fixed for the process lifetime
    pub fn new(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self {
            path: fs::canonicalize(path)?,
        })
    }

    /// Absolute root path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Map a relative user path to an absolute path inside the root
    pub fn resolve(&self, user_path: &str) -> Result<ResolvedPath, PathError> {
        let relative = normalize(user_path)?;
        let candidate = if relative.is_empty() {
            self.path.clone()
        } else {
            self.path.join(&relative)
        };

        // Symlinks are followed so a link pointing out of the tree is caught.
        // Paths that do not exist yet keep their lexical form.
        let absolute = fs::canonicalize(&candidate).unwrap_or(candidate);
        if !is_within(&self.path, &absolute) {
            return Err(PathError::OutsideRoot(absolute));
        }

        Ok(ResolvedPath { relative, absolute })
    }
}

/// Clean a relative path: drop empty and `.` segments, reject `..`
///
/// The result uses `/` between segments and has no leading or trailing
/// separator; the root is the empty string.
pub fn normalize(user_path: &str) -> Result<String, PathError> {
    let mut segments = Vec::new();
    for segment in user_path.split(std::path::is_separator) {
        match segment {
            "" | "." => continue,
            ".." => return Err(PathError::Traversal(user_path.to_string())),
            other => segments.push(other),
        }
    }
    Ok(segments.join("/"))
}

/// Boundary-aware containment: `root` followed by a separator or nothing
///
/// Comparison is per path component, so `/data-other` is not inside `/data`.
pub fn is_within(root: &Path, candidate: &Path) -> bool {
    candidate.starts_with(root)
}
