//! File Watcher Module
//!
//! Keeps an OS-level subscription on every directory of the served tree and
//! emits a coarse [`ChangeSignal`] for each filesystem event. Signals carry no
//! path: they only mean "something changed, re-fetch".
//!
//! Uses notify-rs for cross-platform file system events. Each directory is
//! watched non-recursively; directories created later are subscribed as
//! their create events arrive. Subscriptions are never removed.


use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::browse::ServedRoot;
use crate::core::error::WatcherError;

/// Change notification sent to live clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChangeSignal {
    /// The served tree changed somewhere
    Update,
}

impl ChangeSignal {
    /// Wire form, e.g. `{"type":"update"}`
    pub fn payload(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Configuration for the FileWatcher
#[derive(Debug, Clone)]
pub struct FileWatcherConfig {
    /// Channel buffer size for raw notify events
    pub channel_buffer_size: usize,
}

impl Default for FileWatcherConfig {
    fn default() -> Self {
        Self {
            channel_buffer_size: 1000,
        }
    }
}

/// Set of directories registered with the OS notifier
type WatchSet = Arc<RwLock<HashSet<PathBuf>>>;

/// File watcher emitting one change signal per filesystem event
pub struct FileWatcher {
    /// Root of the watched tree
    root: PathBuf,
    /// Configuration
    config: FileWatcherConfig,
    /// Watched directories (mutated only by the worker task)
    watched_dirs: WatchSet,
    /// Sender for change signals, moved into the worker on start
    signal_sender: Option<mpsc::Sender<ChangeSignal>>,
    /// Worker task handle
    task: Option<JoinHandle<()>>,
    /// Shutdown signal
    shutdown: CancellationToken,
}

impl FileWatcher {
    /// Create a new FileWatcher with default configuration
    pub fn new(root: &ServedRoot, buffer: usize) -> (Self, mpsc::Receiver<ChangeSignal>) {
        Self::with_config(root, buffer, FileWatcherConfig::default())
    }

    /// Create a new FileWatcher with custom configuration
    ///
    /// `buffer` bounds the signal channel towards the broadcast worker.
    pub fn with_config(
        root: &ServedRoot,
        buffer: usize,
        config: FileWatcherConfig,
    ) -> (Self, mpsc::Receiver<ChangeSignal>) {
        let (signal_sender, signal_receiver) = mpsc::channel(buffer.max(1));

        let watcher = Self {
            root: root.path().to_path_buf(),
            config,
            watched_dirs: Arc::new(RwLock::new(HashSet::new())),
            signal_sender: Some(signal_sender),
            task: None,
            shutdown: CancellationToken::new(),
        };

        (watcher, signal_receiver)
    }

    /// Subscribe the whole tree and spawn the worker task
    ///
    /// Failing to watch the root itself is fatal; failures below it are
    /// logged and skipped. The worker stops when `shutdown` or the
    /// watcher's own token is cancelled.
    pub fn start(&mut self, shutdown: &CancellationToken) -> Result<(), WatcherError> {
        let signal_sender = self
            .signal_sender
            .take()
            .ok_or(WatcherError::AlreadyStarted)?;

        let (raw_tx, mut raw_rx) =
            mpsc::channel::<notify::Result<Event>>(self.config.channel_buffer_size.max(1));

        // The callback runs on notify's own thread
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            // The worker is gone after shutdown; late events are dropped
            if raw_tx.blocking_send(res).is_err() {
                tracing::trace!("Dropping filesystem event after watcher shutdown");
            }
        })
        .map_err(WatcherError::Init)?;

        watcher
            .watch(&self.root, RecursiveMode::NonRecursive)
            .map_err(|source| WatcherError::Subscribe {
                path: self.root.clone(),
                source,
            })?;
        self.watched_dirs.write().insert(self.root.clone());
        subscribe_tree(&mut watcher, &self.watched_dirs, &self.root);

        tracing::info!(
            "Watching {} ({} directories)",
            self.root.display(),
            self.watched_dirs.read().len()
        );

        self.shutdown = shutdown.child_token();
        let shutdown = self.shutdown.clone();
        let watched_dirs = Arc::clone(&self.watched_dirs);

        self.task = Some(tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,

                    raw = raw_rx.recv() => match raw {
                        Some(Ok(event)) => {
                            if !is_change(&event.kind) {
                                continue;
                            }
                            if matches!(event.kind, EventKind::Create(_)) {
                                for path in &event.paths {
                                    subscribe_created(&mut watcher, &watched_dirs, path);
                                }
                            }
                            if signal_sender.send(ChangeSignal::Update).await.is_err() {
                                tracing::debug!("Change signal receiver dropped; stopping watcher");
                                break;
                            }
                        }
                        Some(Err(e)) => {
                            tracing::warn!("Watcher error: {}", e);
                        }
                        None => break,
                    }
                }
            }
            drop(watcher);
            tracing::debug!("File watcher stopped");
        }));

        Ok(())
    }

    /// Stop the worker and wait for it to exit
    pub async fn stop(&mut self) {
        self.shutdown.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!("File watcher task failed: {}", e);
            }
        }
    }

    /// Wait for the worker to exit on its own (after shutdown)
    pub async fn join(&mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!("File watcher task failed: {}", e);
            }
        }
    }

    /// Get the set of watched directories
    pub fn watched_directories(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = self.watched_dirs.read().iter().cloned().collect();
        dirs.sort();
        dirs
    }

    /// Whether `path` is currently subscribed
    pub fn is_watching(&self, path: &Path) -> bool {
        self.watched_dirs.read().contains(path)
    }
}

/// Events that represent a change to the tree
///
/// Access notifications (open/close) are not changes.
fn is_change(kind: &EventKind) -> bool {
    !matches!(kind, EventKind::Access(_))
}

/// Subscribe a freshly created path if it is a directory
fn subscribe_created(watcher: &mut RecommendedWatcher, watched: &WatchSet, path: &Path) {
    let is_dir = std::fs::symlink_metadata(path)
        .map(|m| m.is_dir())
        .unwrap_or(false);
    if !is_dir {
        return;
    }
    if add_watch(watcher, watched, path) {
        // Children may have been created before the watch was in place
        subscribe_tree(watcher, watched, path);
    }
}

/// Walk `start` and subscribe every directory below it
fn subscribe_tree(watcher: &mut RecommendedWatcher, watched: &WatchSet, start: &Path) {
    let mut pending = vec![start.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Error walking path {}: {}", dir.display(), e);
                continue;
            }
        };

        for entry in entries.flatten() {
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            if !is_dir {
                continue;
            }
            let path = entry.path();
            if add_watch(watcher, watched, &path) {
                pending.push(path);
            }
        }
    }
}

/// Register one directory; returns true when it was newly added
fn add_watch(watcher: &mut RecommendedWatcher, watched: &WatchSet, path: &Path) -> bool {
    if watched.read().contains(path) {
        return false;
    }
    match watcher.watch(path, RecursiveMode::NonRecursive) {
        Ok(()) => {
            watched.write().insert(path.to_path_buf());
            tracing::debug!("Watching {}", path.display());
            true
        }
        Err(e) => {
            tracing::warn!("Failed to add directory {} to watcher: {}", path.display(), e);
            false
        }
    }
}
