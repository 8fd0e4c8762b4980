//! Treecast Core Module
//!
//! This module contains the core functionality for Treecast including:
//! - Configuration management
//! - Error types and handling
//! - Utility functions

pub mod config;
pub mod error;
pub mod utils;

// Re-export commonly used items
pub use self::config::{AppConfig, ConfigOverrides};
pub use self::error::{ConfigError, Result, TreecastError, WatcherError};
