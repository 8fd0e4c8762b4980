//! Configuration module for Treecast
//!
//! Settings are layered with the `config` crate:
//! defaults, then an optional TOML file, then `TREECAST_*` environment
//! variables, then command-line overrides.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use ::config::{Config, Environment, File};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::browse::ServedRoot;
use crate::core::error::ConfigError;
use crate::logging::{LogFormat, LogLevel, LoggingConfig};

/// Prefix for environment variable overrides (`TREECAST_PORT`, ...)
pub const ENV_PREFIX: &str = "TREECAST";

/// Default listen port
pub const DEFAULT_PORT: u16 = 8080;

/// Main application configuration
#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Port to listen on
    pub port: u16,

    /// Address to bind (all interfaces by default, for LAN access)
    pub bind_address: IpAddr,

    /// Directory to serve; the working directory when unset
    pub root_dir: Option<PathBuf>,

    /// Shared password; enables the login gate when set
    #[serde(skip_serializing)]
    pub password: Option<SecretString>,

    /// Show the random media button on the index page
    pub random_button: bool,

    /// Session lifetime in seconds (0 keeps sessions until logout)
    pub session_ttl_secs: u64,

    /// Outbound queue depth per live-update client
    pub client_queue_capacity: usize,

    /// Buffer between the watcher and the broadcast worker
    pub signal_buffer: usize,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            root_dir: None,
            password: None,
            random_button: false,
            session_ttl_secs: 24 * 60 * 60,
            client_queue_capacity: 16,
            signal_buffer: 256,
            logging: LoggingConfig::default(),
        }
    }
}

/// Values supplied on the command line; `None` leaves lower layers alone
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Explicit config file (must exist when given)
    pub config_file: Option<PathBuf>,
    pub port: Option<u16>,
    pub root_dir: Option<PathBuf>,
    pub password: Option<String>,
    pub random_button: Option<bool>,
    pub log_level: Option<LogLevel>,
    pub json_logs: bool,
}

impl AppConfig {
    /// Load configuration from every layer
    pub fn load(overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        match &overrides.config_file {
            Some(path) => {
                builder = builder.add_source(File::from(path.as_path()).required(true));
            }
            None => {
                if let Some(path) = default_config_path() {
                    builder = builder.add_source(File::from(path).required(false));
                }
            }
        }

        builder = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_override_option("port", overrides.port.map(i64::from))?
            .set_override_option(
                "root_dir",
                overrides
                    .root_dir
                    .as_ref()
                    .map(|p| p.to_string_lossy().into_owned()),
            )?
            .set_override_option("password", overrides.password.clone())?
            .set_override_option("random_button", overrides.random_button)?;

        let mut config: AppConfig = builder.build()?.try_deserialize()?;

        // An empty password means no password
        if config
            .password
            .as_ref()
            .is_some_and(|p| p.expose_secret().is_empty())
        {
            config.password = None;
        }

        if let Some(level) = overrides.log_level {
            config.logging.level = level;
        }
        if overrides.json_logs {
            config.logging.format = LogFormat::Json;
        }
        config.validate()?;

        Ok(config)
    }

    /// Reject settings that cannot work at runtime
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.client_queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "client_queue_capacity must be at least 1".to_string(),
            ));
        }
        if self.signal_buffer == 0 {
            return Err(ConfigError::Invalid(
                "signal_buffer must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve and canonicalize the served directory
    pub fn served_root(&self) -> Result<ServedRoot, ConfigError> {
        let dir = match &self.root_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().map_err(|source| ConfigError::RootUnresolvable {
                path: PathBuf::from("."),
                source,
            })?,
        };
        resolve_root(&dir)
    }

    /// Socket address the HTTP server binds to
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }

    /// Session lifetime, `None` when sessions never expire
    pub fn session_ttl(&self) -> Option<Duration> {
        match self.session_ttl_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Whether the password gate is active
    pub fn auth_enabled(&self) -> bool {
        self.password
            .as_ref()
            .is_some_and(|p| !p.expose_secret().is_empty())
    }
}

fn resolve_root(dir: &Path) -> Result<ServedRoot, ConfigError> {
    let metadata = match std::fs::metadata(dir) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigError::RootNotFound {
                path: dir.to_path_buf(),
            })
        }
        Err(source) => {
            return Err(ConfigError::RootUnresolvable {
                path: dir.to_path_buf(),
                source,
            })
        }
    };
    if !metadata.is_dir() {
        return Err(ConfigError::RootNotDirectory {
            path: dir.to_path_buf(),
        });
    }
    ServedRoot::new(dir).map_err(|source| ConfigError::RootUnresolvable {
        path: dir.to_path_buf(),
        source,
    })
}

/// `<config dir>/treecast/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("treecast").join("config.toml"))
}
