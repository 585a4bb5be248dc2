//! Store configuration.

use crate::error::{CoreError, CoreResult};
use crate::system::SystemPrefixes;
use std::path::PathBuf;
use std::time::Duration;

/// Path value that selects a private in-memory database.
pub const MEMORY_PATH: &str = ":memory:";

/// Where migration scripts come from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MigrationSource {
    /// Scripts compiled into the crate.
    #[default]
    Embedded,
    /// Every `*.sql` file in a directory.
    Directory(PathBuf),
}

/// Configuration for opening a tiddler store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Database file path, or [`MEMORY_PATH`].
    pub path: PathBuf,

    /// How long a statement waits on a locked database before failing.
    pub busy_timeout: Duration,

    /// Whether to switch file databases to write-ahead logging.
    pub wal: bool,

    /// Where to load migrations from.
    pub migrations: MigrationSource,

    /// Whether opening applies pending migrations.
    pub run_migrations: bool,

    /// Title prefixes that mark system tiddlers.
    pub system_prefixes: SystemPrefixes,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./database/tiddly.db"),
            busy_timeout: Duration::from_secs(5),
            wal: true,
            migrations: MigrationSource::Embedded,
            run_migrations: true,
            system_prefixes: SystemPrefixes::default(),
        }
    }
}

impl StoreConfig {
    /// Creates a configuration for the database at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Creates a configuration for a private in-memory database.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MEMORY_PATH)
    }

    /// Returns true if this configuration selects an in-memory database.
    #[must_use]
    pub fn is_memory(&self) -> bool {
        self.path.as_os_str() == MEMORY_PATH
    }

    /// Sets the busy timeout.
    #[must_use]
    pub const fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Sets whether to enable write-ahead logging.
    #[must_use]
    pub const fn wal(mut self, value: bool) -> Self {
        self.wal = value;
        self
    }

    /// Sets the migration source.
    #[must_use]
    pub fn migrations(mut self, source: MigrationSource) -> Self {
        self.migrations = source;
        self
    }

    /// Sets whether opening applies pending migrations.
    ///
    /// Read-only tools turn this off to look at a database as it is.
    #[must_use]
    pub const fn run_migrations(mut self, value: bool) -> Self {
        self.run_migrations = value;
        self
    }

    /// Sets the system prefix set.
    #[must_use]
    pub fn system_prefixes(mut self, prefixes: SystemPrefixes) -> Self {
        self.system_prefixes = prefixes;
        self
    }

    /// Checks the configuration before a store is opened with it.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for an empty path or an empty system prefix, which
    /// would mark every title as system.
    pub fn validate(&self) -> CoreResult<()> {
        if self.path.as_os_str().is_empty() {
            return Err(CoreError::invalid_config("database path is empty"));
        }
        if self.system_prefixes.prefixes().iter().any(String::is_empty) {
            return Err(CoreError::invalid_config("system prefixes must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = StoreConfig::default();
        assert!(config.wal);
        assert!(!config.is_memory());
        assert_eq!(config.busy_timeout, Duration::from_secs(5));
        assert_eq!(config.migrations, MigrationSource::Embedded);
        assert!(config.run_migrations);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_pattern() {
        let config = StoreConfig::in_memory()
            .busy_timeout(Duration::from_millis(250))
            .wal(false)
            .migrations(MigrationSource::Directory(PathBuf::from("migration")));

        assert!(config.is_memory());
        assert!(!config.wal);
        assert_eq!(config.busy_timeout, Duration::from_millis(250));
        assert_eq!(
            config.migrations,
            MigrationSource::Directory(PathBuf::from("migration"))
        );
    }

    #[test]
    fn validation_rejects_unusable_values() {
        assert!(matches!(
            StoreConfig::new("").validate(),
            Err(CoreError::InvalidConfig { .. })
        ));
        let blank_prefix = StoreConfig::in_memory().system_prefixes(SystemPrefixes::new(["$:/", ""]));
        assert!(matches!(
            blank_prefix.validate(),
            Err(CoreError::InvalidConfig { .. })
        ));
        assert!(StoreConfig::in_memory()
            .system_prefixes(SystemPrefixes::new(["Private/"]))
            .validate()
            .is_ok());
    }
}
