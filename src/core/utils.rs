//! Utility functions for Treecast
//!
//! Common helper functions used throughout the application.

use std::path::Path;

/// Extract file extension from path (lowercase)
pub fn get_extension(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default()
}

/// Shorten a secret for log output
pub fn redact(secret: &str) -> String {
    let visible: String = secret.chars().take(8).collect();
    format!("{}...", visible)
}
