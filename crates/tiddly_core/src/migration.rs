//! Schema migrations.
//!
//! Migrations upgrade the SQLite schema of a tiddler store. They are:
//! - **Versioned**: each migration carries an integer version, taken from the
//!   file stem for SQL scripts (`0002.sql` is version 2)
//! - **Forward-only**: there is no down step
//! - **Tracked in the database**: the applied version lives in
//!   `PRAGMA user_version`, so no ledger table is needed
//! - **Transactional**: a migration and the version bump commit together
//!
//! ## Usage
//!
//! ```ignore
//! use tiddly_core::migration::MigrationManager;
//!
//! let manager = MigrationManager::embedded()?;
//! let result = manager.run_pending(&mut conn)?;
//! println!("schema now at v{}", result.final_version);
//! ```

use crate::error::{CoreError, CoreResult};
use rusqlite::{Connection, Transaction};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Version number for migrations.
pub type MigrationVersion = u64;

/// Highest version `PRAGMA user_version` can hold.
const MAX_VERSION: MigrationVersion = i32::MAX as MigrationVersion;

/// Scripts shipped with the crate.
const EMBEDDED: &[(&str, &str)] = &[
    ("0001.sql", include_str!("../migrations/0001.sql")),
    ("0002.sql", include_str!("../migrations/0002.sql")),
];

/// Information about a migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationInfo {
    /// Version number (unique).
    pub version: MigrationVersion,
    /// Human-readable name.
    pub name: String,
    /// Description of what this migration does.
    pub description: Option<String>,
}

/// Result of running all pending migrations.
#[derive(Debug, Clone)]
pub struct MigrationRunResult {
    /// Migrations applied by this run, in order.
    pub applied: Vec<MigrationInfo>,
    /// Schema version before the run.
    pub previous_version: MigrationVersion,
    /// Schema version after the run.
    pub final_version: MigrationVersion,
}

impl MigrationRunResult {
    /// Number of migrations applied.
    #[must_use]
    pub fn applied_count(&self) -> usize {
        self.applied.len()
    }
}

/// Trait for defining migrations.
pub trait Migration: Send + Sync {
    /// Returns the version number for this migration.
    fn version(&self) -> MigrationVersion;

    /// Returns the name of this migration.
    fn name(&self) -> &str;

    /// Returns an optional description.
    fn description(&self) -> Option<&str> {
        None
    }

    /// Applies the migration inside `tx`.
    ///
    /// The caller bumps the schema version and commits; returning an error
    /// rolls everything back.
    fn up(&self, tx: &Transaction<'_>) -> CoreResult<()>;
}

/// A migration made of SQL statements.
#[derive(Debug, Clone)]
pub struct SqlMigration {
    version: MigrationVersion,
    name: String,
    sql: String,
}

impl SqlMigration {
    /// Creates a SQL migration.
    pub fn new(version: MigrationVersion, name: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            version,
            name: name.into(),
            sql: sql.into(),
        }
    }

    /// Creates a SQL migration whose version is the numeric file stem.
    pub fn from_file_name(file_name: &str, sql: impl Into<String>) -> CoreResult<Self> {
        let version = version_from_file_name(file_name)?;
        Ok(Self::new(version, file_name, sql))
    }

    /// Returns the SQL text.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }
}

impl Migration for SqlMigration {
    fn version(&self) -> MigrationVersion {
        self.version
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn up(&self, tx: &Transaction<'_>) -> CoreResult<()> {
        tx.execute_batch(&self.sql)?;
        Ok(())
    }
}

/// Parses the version out of a script name such as `0003.sql`.
pub fn version_from_file_name(file_name: &str) -> CoreResult<MigrationVersion> {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);
    stem.parse::<MigrationVersion>().map_err(|e| {
        CoreError::migration_failed(0, file_name, format!("file stem is not a version: {e}"))
    })
}

/// Reads the schema version stored in the database.
pub fn schema_version(conn: &Connection) -> CoreResult<MigrationVersion> {
    let version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    Ok(version.max(0) as MigrationVersion)
}

/// Manages schema migrations.
pub struct MigrationManager {
    /// Registered migrations, keyed by version.
    migrations: BTreeMap<MigrationVersion, Box<dyn Migration>>,
}

impl MigrationManager {
    /// Creates an empty migration manager.
    #[must_use]
    pub fn new() -> Self {
        Self {
            migrations: BTreeMap::new(),
        }
    }

    /// Creates a manager holding the scripts shipped with this crate.
    pub fn embedded() -> CoreResult<Self> {
        let mut manager = Self::new();
        for (file_name, sql) in EMBEDDED {
            manager.register(Box::new(SqlMigration::from_file_name(file_name, *sql)?))?;
        }
        Ok(manager)
    }

    /// Creates a manager from every `*.sql` file in `dir`.
    pub fn from_dir(dir: &Path) -> CoreResult<Self> {
        let mut manager = Self::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("sql") {
                continue;
            }
            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| {
                    CoreError::migration_failed(0, path.display().to_string(), "non UTF-8 file name")
                })?
                .to_string();
            let sql = fs::read_to_string(&path)?;
            manager.register(Box::new(SqlMigration::from_file_name(&file_name, sql)?))?;
        }
        Ok(manager)
    }

    /// Registers a migration.
    ///
    /// Returns an error if the version is 0, too large for `user_version`,
    /// or already registered.
    pub fn register(&mut self, migration: Box<dyn Migration>) -> CoreResult<()> {
        let version = migration.version();
        if version == 0 || version > MAX_VERSION {
            return Err(CoreError::migration_failed(
                version,
                migration.name(),
                format!("version must be in 1..={MAX_VERSION}"),
            ));
        }
        if let Some(existing) = self.migrations.get(&version) {
            return Err(CoreError::migration_failed(
                version,
                migration.name(),
                format!("version already registered by {}", existing.name()),
            ));
        }
        self.migrations.insert(version, migration);
        Ok(())
    }

    /// Returns the registered migrations in version order.
    #[must_use]
    pub fn list(&self) -> Vec<MigrationInfo> {
        self.migrations.values().map(|m| info_of(m.as_ref())).collect()
    }

    /// Returns the migrations above `current_version`, in version order.
    #[must_use]
    pub fn pending(&self, current_version: MigrationVersion) -> Vec<MigrationInfo> {
        self.migrations
            .range(current_version.saturating_add(1)..)
            .map(|(_, m)| info_of(m.as_ref()))
            .collect()
    }

    /// Returns the highest registered version, or 0.
    #[must_use]
    pub fn latest_version(&self) -> MigrationVersion {
        self.migrations.keys().next_back().copied().unwrap_or(0)
    }

    /// Validates that versions run 1, 2, 3, ... with no gaps.
    pub fn validate(&self) -> CoreResult<()> {
        for (i, (version, migration)) in self.migrations.iter().enumerate() {
            let expected = (i + 1) as MigrationVersion;
            if *version != expected {
                return Err(CoreError::migration_failed(
                    *version,
                    migration.name(),
                    format!("version gap: expected {expected}"),
                ));
            }
        }
        Ok(())
    }

    /// Applies every migration above the stored schema version.
    ///
    /// Each migration runs in its own transaction together with the version
    /// bump. The first failure rolls back that migration and is returned;
    /// migrations committed before it stay applied.
    pub fn run_pending(&self, conn: &mut Connection) -> CoreResult<MigrationRunResult> {
        let previous_version = schema_version(conn)?;
        let mut applied = Vec::new();

        for (version, migration) in self.migrations.range(previous_version.saturating_add(1)..) {
            debug!(version, name = migration.name(), "applying migration");
            apply_one(conn, migration.as_ref()).map_err(|e| match e {
                e @ CoreError::MigrationFailed { .. } => e,
                other => CoreError::migration_failed(*version, migration.name(), other.to_string()),
            })?;
            applied.push(info_of(migration.as_ref()));
        }

        let final_version = schema_version(conn)?;
        if !applied.is_empty() {
            info!(
                from = previous_version,
                to = final_version,
                count = applied.len(),
                "schema migrated"
            );
        }

        Ok(MigrationRunResult {
            applied,
            previous_version,
            final_version,
        })
    }
}

impl Default for MigrationManager {
    fn default() -> Self {
        Self::new()
    }
}

fn info_of(migration: &dyn Migration) -> MigrationInfo {
    MigrationInfo {
        version: migration.version(),
        name: migration.name().to_string(),
        description: migration.description().map(String::from),
    }
}

fn apply_one(conn: &mut Connection, migration: &dyn Migration) -> CoreResult<()> {
    let tx = conn.transaction()?;
    migration.up(&tx)?;
    // Versions are capped at i32::MAX on registration.
    tx.pragma_update(None, "user_version", migration.version() as i64)?;
    tx.commit()?;
    Ok(())
}
