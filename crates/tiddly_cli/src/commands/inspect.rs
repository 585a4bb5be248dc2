//! Inspect command implementation.

use serde::Serialize;
use std::error::Error;
use tiddly_core::{MigrationManager, StoreConfig, SystemPrefixes, TiddlerStore};

/// Store inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Database path.
    pub path: String,
    /// Schema version.
    pub schema_version: u64,
    /// Built-in migrations not yet applied.
    pub pending_migrations: usize,
    /// Tiddlers returned by listings.
    pub visible: u64,
    /// System tiddlers.
    pub system: u64,
    /// All tiddlers.
    pub total: u64,
    /// Rows whose system flag was corrected, if reclassification ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reclassified: Option<usize>,
}

/// Runs the inspect command.
///
/// The database is opened as it is; pending migrations are reported, not
/// applied.
pub fn run(config: StoreConfig, reclassify: bool, format: &str) -> Result<(), Box<dyn Error>> {
    if !config.path.exists() {
        return Err(format!("No database found at {:?}", config.path).into());
    }
    let result = inspect(config, reclassify)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        "text" => print_text(&result),
        other => return Err(format!("Unknown format: {other}").into()),
    }
    Ok(())
}

/// Collects statistics for the store at `config.path`.
pub fn inspect(config: StoreConfig, reclassify: bool) -> Result<InspectResult, Box<dyn Error>> {
    let path = config.path.display().to_string();
    let store = TiddlerStore::open(config.run_migrations(false))?;
    let schema_version = store.schema_version()?;
    if schema_version == 0 {
        return Err(format!("{path} has no schema yet; run `tiddly migrate run` first").into());
    }
    let pending_migrations = MigrationManager::embedded()?.pending(schema_version).len();
    let reclassified = if reclassify {
        Some(store.reclassify()?)
    } else {
        None
    };
    let stats = store.stats()?;

    Ok(InspectResult {
        path,
        schema_version: stats.schema_version,
        pending_migrations,
        visible: stats.visible,
        system: stats.system,
        total: stats.total(),
        reclassified,
    })
}

fn print_text(result: &InspectResult) {
    println!("Tiddler Store");
    println!("=============");
    println!("  Path: {}", result.path);
    println!("  Schema version: {}", result.schema_version);
    if result.pending_migrations > 0 {
        println!("  Pending migrations: {}", result.pending_migrations);
    }
    println!("  Tiddlers: {}", result.total);
    println!("    visible: {}", result.visible);
    println!("    system: {}", result.system);
    if let Some(changed) = result.reclassified {
        println!("  Reclassified: {changed}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiddly_core::TiddlerDraft;

    #[test]
    fn counts_visible_and_system() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::new(dir.path().join("tiddly.db"));
        {
            let store = TiddlerStore::open(config.clone()).unwrap();
            store.upsert("Foo", TiddlerDraft::default()).unwrap();
            store.upsert("$:/StoryList", TiddlerDraft::default()).unwrap();
        }

        let result = inspect(config, true).unwrap();
        assert_eq!(result.visible, 1);
        assert_eq!(result.system, 1);
        assert_eq!(result.total, 2);
        assert_eq!(result.reclassified, Some(0));
        assert!(result.schema_version >= 1);
    }

    #[test]
    fn reclassify_applies_given_prefixes() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::new(dir.path().join("tiddly.db"));
        {
            let store = TiddlerStore::open(config.clone()).unwrap();
            store.upsert("Private/Diary", TiddlerDraft::default()).unwrap();
            store.upsert("Public", TiddlerDraft::default()).unwrap();
        }

        let custom = config.system_prefixes(SystemPrefixes::new(["Private/"]));
        let result = inspect(custom, true).unwrap();
        assert_eq!(result.reclassified, Some(1));
        assert_eq!(result.visible, 1);
        assert_eq!(result.system, 1);
    }

    #[test]
    fn inspect_does_not_migrate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.db");
        {
            // A database left at version 1 by an older build.
            let conn = rusqlite::Connection::open(&path).unwrap();
            conn.execute_batch(include_str!("../../../tiddly_core/migrations/0001.sql"))
                .unwrap();
            conn.pragma_update(None, "user_version", 1).unwrap();
        }

        let result = inspect(StoreConfig::new(&path), false).unwrap();
        assert_eq!(result.schema_version, 1);
        assert!(result.pending_migrations > 0);

        let conn = rusqlite::Connection::open(&path).unwrap();
        assert_eq!(tiddly_core::migration::schema_version(&conn).unwrap(), 1);
    }

    #[test]
    fn unmigrated_database_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.db");
        rusqlite::Connection::open(&path).unwrap();
        assert!(inspect(StoreConfig::new(&path), false).is_err());
    }

    #[test]
    fn missing_database_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::new(dir.path().join("absent.db"));
        assert!(run(config, false, "text").is_err());
    }
}
