//! Directory browsing
//!
//! Turns a subtree of the served root into safe, orderable, linkable
//! listings:
//! - `resolver`: sandboxes user paths under the served root
//! - `listing`: single-level directory enumeration with derived links
//! - `sort`: listing order by name, size or date
//! - `media`: uniform random pick among media files

mod error;
mod listing;
mod media;
mod resolver;
mod sort;

#[cfg(test)]
mod tests;

pub use error::{BrowseError, PathError};
pub use listing::{escape_path, list, Entry, Listing, BROWSE_PREFIX, FILES_PREFIX};
pub use media::{is_media_file, pick_media_link, pick_random_media, MEDIA_EXTENSIONS};
pub use resolver::{is_within, normalize, ResolvedPath, ServedRoot};
pub use sort::{sort_entries, SortField, SortOrder};
