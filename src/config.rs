//! Application configuration loaded from TOML.
use std::fs;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "RESCUENET_CONFIG";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP listener settings.
    pub server: ServerConfig,
    /// Graph backend settings.
    pub graph: GraphConfig,
    /// Log filter settings.
    pub logging: LoggingConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: IpAddr,
    /// Bind port.
    pub port: u16,
    /// Allowed CORS origins; empty disables the CORS layer.
    pub allow_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 5000,
            allow_origins: Vec::new(),
        }
    }
}

/// Graph backend settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Bolt URI.
    pub uri: String,
    /// Login user.
    pub user: String,
    /// Login password.
    pub password: String,
    /// Target database; the server default when unset.
    pub database: Option<String>,
    /// Driver connection pool size.
    pub max_connections: usize,
    /// Bound on driver construction and session acquisition.
    pub acquire_timeout_ms: u64,
    /// Per-statement bound; the driver default when unset.
    pub query_timeout_ms: Option<u64>,
    /// Semicolon-delimited seed script.
    pub seed_file: PathBuf,
    /// Skip the real backend and serve mock data from the start.
    pub force_mock: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".into(),
            user: "neo4j".into(),
            password: "password".into(),
            database: None,
            max_connections: 50,
            acquire_timeout_ms: 2_000,
            query_timeout_ms: None,
            seed_file: PathBuf::from("database/neo4j/graph_seed.cypher"),
            force_mock: false,
        }
    }
}

impl GraphConfig {
    /// Acquisition bound as a [`Duration`].
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }

    /// Statement bound as a [`Duration`].
    pub fn query_timeout(&self) -> Option<Duration> {
        self.query_timeout_ms.map(Duration::from_millis)
    }
}

/// Log filter settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from `explicit`, then `$RESCUENET_CONFIG`, then
    /// the per-user default path. A missing file yields defaults; an
    /// explicitly named file must exist.
    pub fn load(explicit: Option<PathBuf>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(&path);
        }
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .or_else(default_config_path);
        match path {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Reads and validates one TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: AppConfig = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.graph.max_connections == 0 {
            return Err(ConfigError::Invalid {
                field: "graph.max_connections",
                reason: "must be at least 1".into(),
            });
        }
        if self.graph.acquire_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "graph.acquire_timeout_ms",
                reason: "must be positive".into(),
            });
        }
        if self.graph.uri.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "graph.uri",
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        /// Config file path.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
    /// The file is not valid TOML for [`AppConfig`].
    #[error("failed to parse config {path}: {source}")]
    Parse {
        /// Config file path.
        path: PathBuf,
        /// Parser diagnostic.
        source: toml::de::Error,
    },
    /// A value parsed but is out of range.
    #[error("invalid value for {field}: {reason}")]
    Invalid {
        /// Dotted field name.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// Per-user config file location.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join("rescuenet").join("config.toml"))
}
