//! CLI command implementations.

pub mod credentials;
pub mod inspect;
pub mod migrate;

use std::error::Error;
use std::path::{Path, PathBuf};
use tiddly_core::{StoreConfig, SystemPrefixes};
use tiddly_credentials::CredentialConfig;
use tiddly_sync_server::{FileConfig, DEFAULT_DATABASE};
use tracing::debug;

pub use tiddly_credentials::DEFAULT_BCRYPT_COST as DEFAULT_COST;

/// Settings merged from the configuration file and command-line overrides.
pub struct Settings {
    /// The parsed configuration file, if one exists.
    pub file: Option<FileConfig>,
    /// Database file to operate on.
    pub database: PathBuf,
}

impl Settings {
    /// Loads `config_path` if it exists. A present but malformed file is an
    /// error.
    pub fn load(config_path: &Path, database: Option<PathBuf>) -> Result<Self, Box<dyn Error>> {
        let file = if config_path.exists() {
            Some(FileConfig::load(config_path)?)
        } else {
            debug!(path = %config_path.display(), "no configuration file");
            None
        };

        let database = database
            .or_else(|| file.as_ref().map(|f| f.store_config().path))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE));

        Ok(Self { file, database })
    }

    /// Returns `explicit`, or the configured pepper.
    pub fn pepper(&self, explicit: Option<String>) -> Result<String, Box<dyn Error>> {
        explicit
            .or_else(|| self.file.as_ref().map(|f| f.pepper.clone()))
            .filter(|p| !p.is_empty())
            .ok_or_else(|| "pepper required: pass --pepper or create a configuration file".into())
    }

    /// Credential configuration, with `dir` overriding the configured one.
    ///
    /// The pepper is empty when no configuration file exists.
    pub fn credential_config(&self, dir: Option<PathBuf>) -> CredentialConfig {
        let mut config = match &self.file {
            Some(file) => file.credential_config(),
            None => CredentialConfig::default(),
        };
        if let Some(dir) = dir {
            config.dir = dir;
        }
        config
    }

    /// Store configuration for the selected database.
    ///
    /// Non-empty `prefixes` replace the system prefixes from the
    /// configuration file.
    pub fn store_config(&self, prefixes: &[String]) -> StoreConfig {
        let mut config = match &self.file {
            Some(file) => file.store_config(),
            None => StoreConfig::default(),
        };
        config.path = self.database.clone();
        if prefixes.is_empty() {
            config
        } else {
            config.system_prefixes(SystemPrefixes::new(prefixes.iter().cloned()))
        }
    }
}
