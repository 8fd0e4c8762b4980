//! Treecast - serve a directory tree over HTTP with live change notifications
//!
//! This crate provides:
//! - Sandboxed browsing of one served root (listing, sorting, random media)
//! - Raw file downloads
//! - Recursive filesystem watching with coarse change signals
//! - WebSocket fan-out of those signals to connected browsers
//! - An optional password gate backed by in-memory sessions

pub mod broadcast;
pub mod browse;
pub mod core;
pub mod logging;
pub mod server;
pub mod session;
pub mod watcher;

// Re-export commonly used items
pub use broadcast::BroadcastHub;
pub use browse::{BrowseError, Listing, PathError, ServedRoot};
pub use crate::core::config::{AppConfig, ConfigOverrides};
pub use crate::core::error::{Result, TreecastError};
pub use server::{FileServer, ServerState};
pub use session::{KeyedPasswordHash, PasswordVerifier, SessionStore};
pub use watcher::{ChangeSignal, FileWatcher};
