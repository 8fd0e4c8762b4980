//! Random media selection

use std::path::Path;

use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use rand::Rng;

use super::error::BrowseError;
use super::listing::{list, Entry};
use super::resolver::ServedRoot;
use crate::core::utils::get_extension;

/// Lowercase extensions treated as audio, video or image files
pub const MEDIA_EXTENSIONS: &[&str] = &[
    // audio
    "mp3", "wav", "flac", "aac", "ogg", "m4a", "wma",
    // video
    "mp4", "avi", "mkv", "mov", "wmv", "flv", "webm", "m4v",
    // image
    "jpg", "jpeg", "png", "gif", "webp", "svg", "bmp", "tiff",
];

/// Whether a file name has a media extension (case-insensitive)
pub fn is_media_file(name: &str) -> bool {
    let ext = get_extension(Path::new(name));
    MEDIA_EXTENSIONS.contains(&ext.as_str())
}

/// Pick one media file's link uniformly from `entries`
pub fn pick_media_link<R: Rng + ?Sized>(entries: &[Entry], rng: &mut R) -> Option<String> {
    let media: Vec<&Entry> = entries
        .iter()
        .filter(|entry| !entry.is_dir && is_media_file(&entry.name))
        .collect();
    media.choose(rng).map(|entry| entry.link_path.clone())
}

/// Link of a random media file directly inside `relative_path`
///
/// Selection uses the operating system's CSPRNG.
pub fn pick_random_media(root: &ServedRoot, relative_path: &str) -> Result<String, BrowseError> {
    let listing = list(root, relative_path)?;
    pick_media_link(&listing.entries, &mut OsRng).ok_or(BrowseError::NoMedia {
        path: listing.current_path,
    })
}
