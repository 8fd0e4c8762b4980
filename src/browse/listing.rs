//! Directory listing
//!
//! Builds a fresh [`Listing`] for every request. Entries are not cached.

use std::fs::{self, Metadata};

use chrono::{DateTime, Utc};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;

use super::error::BrowseError;
use super::resolver::ServedRoot;

/// Link prefix for directories
pub const BROWSE_PREFIX: &str = "/browse/";

/// Link prefix for downloadable files
pub const FILES_PREFIX: &str = "/files/";

/// Characters left readable in a path segment; `/` is always escaped
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b',')
    .remove(b':')
    .remove(b';')
    .remove(b'=')
    .remove(b'@');

/// One child of a listed directory
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry {
    pub name: String,
    pub size: u64,
    /// Unix-style permission string, e.g. `drwxr-xr-x`
    #[serde(rename = "mode")]
    pub permissions: String,
    #[serde(rename = "modTime")]
    pub modified_at: DateTime<Utc>,
    #[serde(rename = "isDir")]
    pub is_dir: bool,
    /// `/browse/...` for directories, `/files/...` otherwise
    #[serde(rename = "path")]
    pub link_path: String,
}

/// A directory's entries plus navigation links
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    #[serde(rename = "files")]
    pub entries: Vec<Entry>,
    pub current_path: String,
    pub parent_path: String,
    pub has_parent: bool,
}

/// List the direct children of `relative_path` under `root`
///
/// Children whose metadata cannot be read are skipped. Entries keep the
/// order the OS returned them in.
pub fn list(root: &ServedRoot, relative_path: &str) -> Result<Listing, BrowseError> {
    let resolved = root.resolve(relative_path)?;
    let current = resolved.relative;

    let read_dir = fs::read_dir(&resolved.absolute).map_err(|source| BrowseError::Io {
        path: current.clone(),
        source,
    })?;

    let mut entries = Vec::new();
    for dir_entry in read_dir {
        let dir_entry = match dir_entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!("Skipping unreadable entry in '{}': {}", current, e);
                continue;
            }
        };
        let name = dir_entry.file_name().to_string_lossy().into_owned();
        let metadata = match dir_entry.metadata() {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::debug!("Skipping '{}' in '{}': {}", name, current, e);
                continue;
            }
        };
        if let Some(entry) = build_entry(&current, name, &metadata) {
            entries.push(entry);
        }
    }

    let (parent_path, has_parent) = parent_link(&current);

    Ok(Listing {
        entries,
        current_path: current,
        parent_path,
        has_parent,
    })
}

fn build_entry(current: &str, name: String, metadata: &Metadata) -> Option<Entry> {
    let modified_at: DateTime<Utc> = metadata.modified().ok()?.into();
    let is_dir = metadata.is_dir();
    let prefix = if is_dir { BROWSE_PREFIX } else { FILES_PREFIX };

    let mut link_path = String::from(prefix);
    if !current.is_empty() {
        link_path.push_str(&escape_path(current));
        link_path.push('/');
    }
    link_path.extend(utf8_percent_encode(&name, SEGMENT));

    Some(Entry {
        size: metadata.len(),
        permissions: permission_string(metadata),
        modified_at,
        is_dir,
        link_path,
        name,
    })
}

/// Percent-encode each `/`-separated segment of a relative path
pub fn escape_path(relative: &str) -> String {
    relative
        .split('/')
        .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// Logical parent of a normalized relative path, as a browse link
fn parent_link(current: &str) -> (String, bool) {
    if current.is_empty() {
        return (String::new(), false);
    }
    match current.rsplit_once('/') {
        Some((parent, _)) => (format!("{}{}", BROWSE_PREFIX, escape_path(parent)), true),
        None => (BROWSE_PREFIX.to_string(), true),
    }
}

#[cfg(unix)]
fn permission_string(metadata: &Metadata) -> String {
    use std::os::unix::fs::{FileTypeExt, PermissionsExt};

    let file_type = metadata.file_type();
    let kind = if file_type.is_dir() {
        'd'
    } else if file_type.is_symlink() {
        'L'
    } else if file_type.is_fifo() {
        'p'
    } else if file_type.is_socket() {
        'S'
    } else {
        '-'
    };

    let mode = metadata.permissions().mode();
    let mut out = String::with_capacity(10);
    out.push(kind);
    for shift in [6u32, 3, 0] {
        let bits = (mode >> shift) & 0o7;
        out.push(if bits & 0o4 != 0 { 'r' } else { '-' });
        out.push(if bits & 0o2 != 0 { 'w' } else { '-' });
        out.push(if bits & 0o1 != 0 { 'x' } else { '-' });
    }
    out
}

#[cfg(not(unix))]
fn permission_string(metadata: &Metadata) -> String {
    let kind = if metadata.is_dir() { 'd' } else { '-' };
    let bits = if metadata.permissions().readonly() {
        "r--r--r--"
    } else {
        "rw-rw-rw-"
    };
    format!("{}{}", kind, bits)
}
