//! Migration commands.

use rusqlite::{Connection, OpenFlags};
use std::error::Error;
use std::path::Path;
use tiddly_core::migration::{self, MigrationManager};
use tracing::info;

/// Shows the schema version and the migrations still to apply.
pub fn status(db_path: &Path, dir: Option<&Path>) -> Result<(), Box<dyn Error>> {
    info!("Checking migration status for {:?}", db_path);

    let manager = load_manager(dir)?;
    let current = if db_path.exists() {
        let conn = Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        migration::schema_version(&conn)?
    } else {
        0
    };

    println!("Migration Status");
    println!("================");
    println!("  Database: {}", db_path.display());
    println!("  Current version: {current}");
    println!("  Latest version: {}", manager.latest_version());

    let pending = manager.pending(current);
    if pending.is_empty() {
        println!("\n✓ Schema is up to date.");
    } else {
        println!("\nPending Migrations:");
        for m in &pending {
            println!("  v{}: {}", m.version, m.name);
        }
    }

    Ok(())
}

/// Applies pending migrations, creating the database if needed.
pub fn run(db_path: &Path, dir: Option<&Path>, dry_run: bool) -> Result<(), Box<dyn Error>> {
    info!("Running migrations for {:?}", db_path);

    let manager = load_manager(dir)?;
    manager.validate()?;

    if dry_run {
        let current = if db_path.exists() {
            let conn = Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
            migration::schema_version(&conn)?
        } else {
            0
        };
        let pending = manager.pending(current);
        println!("Dry run - would apply {} migration(s):", pending.len());
        for m in &pending {
            println!("  v{}: {}", m.version, m.name);
        }
        return Ok(());
    }

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut conn = Connection::open(db_path)?;
    let result = manager.run_pending(&mut conn)?;

    if result.applied_count() == 0 {
        println!("✓ No pending migrations to run.");
    } else {
        println!(
            "✓ Successfully applied {} migration(s)",
            result.applied_count()
        );
        for m in &result.applied {
            println!("  v{}: {}", m.version, m.name);
        }
    }
    println!("  Final version: {}", result.final_version);

    Ok(())
}

fn load_manager(dir: Option<&Path>) -> Result<MigrationManager, Box<dyn Error>> {
    Ok(match dir {
        Some(dir) => MigrationManager::from_dir(dir)?,
        None => MigrationManager::embedded()?,
    })
}
