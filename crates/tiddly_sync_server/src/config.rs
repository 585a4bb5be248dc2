//! Server configuration.

use crate::error::{ServerError, ServerResult};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tiddly_core::{StoreConfig, SystemPrefixes};
use tiddly_credentials::CredentialConfig;

/// Default name of the configuration file.
pub const CONFIG_FILE: &str = ".config";

/// Default port.
pub const DEFAULT_PORT: u16 = 9090;

/// Database file used when the configuration names none.
pub const DEFAULT_DATABASE: &str = "./database/tiddly.db";

/// What follows the colon in a tiddler ETag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EtagMode {
    /// Nothing: `"default/<title>/<rev>:"`.
    #[default]
    Weak,
    /// SHA-256 hex of the request body.
    ContentDigest,
}

/// Configuration for the protocol adapter.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port the HTTP layer should listen on.
    pub port: u16,
    /// ETag digest mode for PUT responses.
    pub etag_mode: EtagMode,
    /// How long the listing ETag seed lives before it is recomputed.
    pub etag_refresh: Duration,
    /// Lifetime of the remember cookie.
    pub remember_for: Duration,
    /// User name reported by `/status` when the session has none to offer.
    pub status_username: Option<String>,
    /// TiddlyWiki version reported by `/status`.
    pub tiddlywiki_version: String,
    /// Deadline for each request's store calls; none when unset.
    pub request_timeout: Option<Duration>,
}

impl ServerConfig {
    /// Creates a configuration for `port` with default settings.
    #[must_use]
    pub fn new(port: u16) -> Self {
        Self {
            port,
            etag_mode: EtagMode::Weak,
            etag_refresh: Duration::from_secs(60),
            remember_for: Duration::from_secs(365 * 24 * 60 * 60),
            status_username: None,
            tiddlywiki_version: "5.1.23".to_string(),
            request_timeout: None,
        }
    }

    /// Sets the ETag digest mode.
    #[must_use]
    pub fn with_etag_mode(mut self, mode: EtagMode) -> Self {
        self.etag_mode = mode;
        self
    }

    /// Sets the listing ETag refresh interval.
    #[must_use]
    pub fn with_etag_refresh(mut self, interval: Duration) -> Self {
        self.etag_refresh = interval;
        self
    }

    /// Sets the remember cookie lifetime.
    #[must_use]
    pub fn with_remember_for(mut self, lifetime: Duration) -> Self {
        self.remember_for = lifetime;
        self
    }

    /// Sets the per-request deadline for store calls.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Overrides the user name reported by `/status`.
    #[must_use]
    pub fn with_status_username(mut self, name: impl Into<String>) -> Self {
        self.status_username = Some(name.into());
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PORT)
    }
}

/// Database section of the configuration file.
///
/// Only `name` is used: it is the SQLite file path. The remaining fields are
/// accepted so that existing files still parse.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    /// Host (unused).
    pub host: String,
    /// Database file path.
    pub name: String,
    /// User (unused).
    pub user: String,
    /// Password (unused).
    pub password: String,
    /// Port (unused).
    pub port: u16,
}

/// The JSON configuration file.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Server-wide password pepper.
    pub pepper: String,
    /// Port; 0 means the default.
    pub port: u16,
    /// Database settings.
    pub database: DatabaseSection,
    /// Directory holding `users.json` and `tokens.json`.
    pub credentials_dir: Option<PathBuf>,
    /// ETag digest mode.
    pub etag_mode: EtagMode,
    /// System title prefixes; the built-in set when absent.
    pub system_prefixes: Option<Vec<String>>,
    /// Per-request deadline in milliseconds; none when absent or 0.
    pub request_timeout_ms: Option<u64>,
}

impl std::fmt::Debug for FileConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileConfig")
            .field("pepper", &"<redacted>")
            .field("port", &self.port)
            .field("database", &self.database.name)
            .field("credentials_dir", &self.credentials_dir)
            .field("etag_mode", &self.etag_mode)
            .field("system_prefixes", &self.system_prefixes)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .finish()
    }
}

impl FileConfig {
    /// Reads and parses a configuration file.
    pub fn load(path: &Path) -> ServerResult<Self> {
        let data = fs::read_to_string(path).map_err(|e| {
            ServerError::InvalidConfig(format!("error reading {}: {e}", path.display()))
        })?;
        Self::parse(&data)
            .map_err(|e| ServerError::InvalidConfig(format!("{}: {e}", path.display())))
    }

    /// Parses configuration JSON.
    pub fn parse(json: &str) -> ServerResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ServerError::InvalidConfig(format!("error parsing config: {e}")))?;
        if config.pepper.is_empty() {
            return Err(ServerError::InvalidConfig("pepper is required".into()));
        }
        Ok(config)
    }

    /// Store configuration for the database file.
    pub fn store_config(&self) -> StoreConfig {
        let config = if self.database.name.is_empty() {
            StoreConfig::new(DEFAULT_DATABASE)
        } else {
            StoreConfig::new(&self.database.name)
        };
        match &self.system_prefixes {
            Some(prefixes) => config.system_prefixes(SystemPrefixes::new(prefixes.iter().cloned())),
            None => config,
        }
    }

    /// Credential configuration; collections default to the working directory.
    pub fn credential_config(&self) -> CredentialConfig {
        let dir = self
            .credentials_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));
        CredentialConfig::new(dir, self.pepper.clone())
    }

    /// Adapter configuration.
    pub fn server_config(&self) -> ServerConfig {
        let port = if self.port == 0 {
            DEFAULT_PORT
        } else {
            self.port
        };
        let config = ServerConfig::new(port).with_etag_mode(self.etag_mode);
        match self.request_timeout_ms {
            Some(ms) if ms > 0 => config.with_request_timeout(Duration::from_millis(ms)),
            _ => config,
        }
    }
}
