//! Treecast
//!
//! Main entry point: load configuration, start the watcher and broadcast
//! workers, serve HTTP until Ctrl-C, then drain the workers.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;

use treecast::core::config::{AppConfig, ConfigOverrides};
use treecast::logging::{init_fallback_logging, LogLevel, LoggingSystem};
use treecast::{BroadcastHub, FileServer, FileWatcher, KeyedPasswordHash, ServerState};

/// Serve a directory tree over HTTP with live change notifications
#[derive(Parser, Debug)]
#[command(name = "treecast")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Directory to serve (defaults to the current directory)
    #[arg(short, long, value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Require this password (also read from TREECAST_PASSWORD)
    #[arg(long)]
    password: Option<String>,

    /// Show the random media button
    #[arg(long)]
    random_button: bool,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<LogLevel>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

impl Cli {
    fn overrides(self) -> ConfigOverrides {
        ConfigOverrides {
            config_file: self.config,
            port: self.port,
            root_dir: self.dir,
            password: self.password,
            random_button: self.random_button.then_some(true),
            log_level: self.log_level,
            json_logs: self.json_logs,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let overrides = Cli::parse().overrides();
    let mut config = AppConfig::load(&overrides).context("loading configuration")?;

    let _logging_system = match LoggingSystem::init(config.logging.clone()) {
        Ok(system) => {
            if let Some(dir) = system.log_directory() {
                tracing::info!("Writing logs to {}", dir.display());
            }
            Some(system)
        }
        Err(e) => {
            init_fallback_logging();
            tracing::warn!("Failed to initialize logging system: {}. Using fallback.", e);
            None
        }
    };

    let root = config.served_root().context("resolving served directory")?;

    let shutdown = CancellationToken::new();

    let (mut watcher, signals) = FileWatcher::new(&root, config.signal_buffer);
    watcher
        .start(&shutdown)
        .context("starting file watcher")?;

    let hub = BroadcastHub::new(config.client_queue_capacity);
    let fan_out = hub.spawn(signals, shutdown.clone());

    let mut state = ServerState::new(root, hub)
        .with_session_ttl(config.session_ttl())
        .with_random_button(config.random_button);
    // The plaintext is dropped once hashed
    if let Some(password) = config.password.take() {
        state = state.with_verifier(Arc::new(KeyedPasswordHash::new(&password)));
    }

    let server = FileServer::new(config.listen_addr(), state);

    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            return;
        }
        tracing::info!("Shutting down");
        ctrl_c.cancel();
    });

    let served = server.run(shutdown.clone()).await;

    shutdown.cancel();
    watcher.join().await;
    if let Err(e) = fan_out.await {
        tracing::error!("Broadcast worker failed: {}", e);
    }

    served.context("running HTTP server")
}
