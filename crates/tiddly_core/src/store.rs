//! SQLite-backed tiddler store.

use crate::config::{MigrationSource, StoreConfig};
use crate::context::RequestContext;
use crate::error::{CoreError, CoreResult};
use crate::migration::{self, MigrationManager, MigrationRunResult};
use crate::tiddler::{
    json_kind, Metadata, Revision, Tiddler, TiddlerDraft, TiddlerSummary, BAG, BAG_FIELD,
    REVISION_FIELD, TITLE_FIELD,
};
use parking_lot::{Mutex, MutexGuard};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use serde_json::Value;
use std::fs;
use tracing::{debug, info};

/// Row counts of a store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Tiddlers returned by listings.
    pub visible: u64,
    /// System tiddlers hidden from listings.
    pub system: u64,
    /// Current schema version.
    pub schema_version: u64,
}

impl StoreStats {
    /// Total number of stored tiddlers.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.visible + self.system
    }
}

/// The tiddler store.
///
/// `TiddlerStore` owns every tiddler row. Each operation runs in its own
/// SQLite transaction, so a reader never sees half of a write. Writers on
/// the same title are serialised; the last one wins and revisions stay
/// gapless.
///
/// # Example
///
/// ```rust,ignore
/// use tiddly_core::{StoreConfig, TiddlerDraft, TiddlerStore};
///
/// let store = TiddlerStore::open(StoreConfig::new("./database/tiddly.db"))?;
/// let rev = store.upsert("Foo", TiddlerDraft::new(Default::default(), "hello"))?;
/// assert_eq!(store.get("Foo")?.revision, rev);
/// ```
pub struct TiddlerStore {
    config: StoreConfig,
    conn: Mutex<Connection>,
    migrated: MigrationRunResult,
}

impl TiddlerStore {
    /// Opens the store and applies pending migrations, unless
    /// [`StoreConfig::run_migrations`] is off.
    ///
    /// Creates the parent directory of a file database if needed, enables
    /// write-ahead logging and foreign keys, and sets the busy timeout.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for an unusable configuration, and
    /// `MigrationFailed` if any migration fails; nothing of the failing
    /// migration is persisted and the store must not be used.
    pub fn open(config: StoreConfig) -> CoreResult<Self> {
        config.validate()?;
        let mut conn = if config.is_memory() {
            Connection::open_in_memory()?
        } else {
            if let Some(parent) = config.path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            Connection::open(&config.path)?
        };

        conn.busy_timeout(config.busy_timeout)?;
        if config.wal && !config.is_memory() {
            let mode: String =
                conn.pragma_update_and_check(None, "journal_mode", "wal", |row| row.get(0))?;
            debug!(%mode, "journal mode set");
        }
        conn.pragma_update(None, "foreign_keys", "ON")?;

        let migrated = if config.run_migrations {
            let manager = match &config.migrations {
                MigrationSource::Embedded => MigrationManager::embedded()?,
                MigrationSource::Directory(dir) => MigrationManager::from_dir(dir)?,
            };
            manager.run_pending(&mut conn)?
        } else {
            let current = migration::schema_version(&conn)?;
            MigrationRunResult {
                applied: Vec::new(),
                previous_version: current,
                final_version: current,
            }
        };

        info!(
            path = %config.path.display(),
            schema_version = migrated.final_version,
            "tiddler store opened"
        );

        Ok(Self {
            config,
            conn: Mutex::new(conn),
            migrated,
        })
    }

    /// Opens a private in-memory store.
    pub fn open_in_memory() -> CoreResult<Self> {
        Self::open(StoreConfig::in_memory())
    }

    /// Returns the store configuration.
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Returns what the migration engine did when the store was opened.
    #[must_use]
    pub fn migrations_applied(&self) -> &MigrationRunResult {
        &self.migrated
    }

    /// Returns the schema version stored in the database.
    pub fn schema_version(&self) -> CoreResult<u64> {
        let conn = self.conn.lock();
        migration::schema_version(&conn)
    }

    /// Returns true if `title` is a system title under this store's prefixes.
    #[must_use]
    pub fn is_system(&self, title: &str) -> bool {
        self.config.system_prefixes.is_system(title)
    }

    /// Takes the connection for one operation.
    ///
    /// A context deadline bounds both the wait for the mutex and SQLite's
    /// busy wait.
    fn lock(&self, ctx: &RequestContext) -> CoreResult<MutexGuard<'_, Connection>> {
        ctx.check()?;
        let conn = match ctx.remaining() {
            None => self.conn.lock(),
            Some(remaining) => self
                .conn
                .try_lock_for(remaining)
                .ok_or_else(|| CoreError::cancelled("request deadline exceeded waiting for the store"))?,
        };
        let busy = ctx
            .remaining()
            .map_or(self.config.busy_timeout, |r| r.min(self.config.busy_timeout));
        conn.busy_timeout(busy)?;
        Ok(conn)
    }

    /// Gets a tiddler by title.
    pub fn get(&self, title: &str) -> CoreResult<Tiddler> {
        self.get_with(&RequestContext::new(), title)
    }

    /// Gets a tiddler by title, honouring `ctx`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no tiddler has this title.
    pub fn get_with(&self, ctx: &RequestContext, title: &str) -> CoreResult<Tiddler> {
        let mut conn = self.lock(ctx)?;
        let tx = conn.transaction()?;

        let row = tx
            .query_row(
                "SELECT rev, meta, text, is_system FROM tiddler WHERE title = ?1",
                params![title],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, bool>(3)?,
                    ))
                },
            )
            .optional()?;
        drop(tx);
        drop(conn);

        let Some((rev, raw_meta, text, is_system)) = row else {
            return Err(CoreError::not_found(title));
        };

        Ok(Tiddler {
            title: title.to_string(),
            revision: Revision::new(rev.max(0) as u64),
            meta: parse_meta(title, &raw_meta)?,
            text,
            is_system,
        })
    }

    /// Lists the stored metadata of every non-system tiddler.
    pub fn list(&self) -> CoreResult<Vec<TiddlerSummary>> {
        self.list_with(&RequestContext::new())
    }

    /// Lists the stored metadata of every non-system tiddler, honouring `ctx`.
    ///
    /// Order is unspecified. Text is not included.
    pub fn list_with(&self, ctx: &RequestContext) -> CoreResult<Vec<TiddlerSummary>> {
        let mut conn = self.lock(ctx)?;
        let tx = conn.transaction()?;

        let summaries = {
            let mut stmt = tx.prepare("SELECT title, meta FROM tiddler WHERE is_system = 0")?;
            let rows = stmt.query_map([], |row| {
                Ok(TiddlerSummary {
                    title: row.get(0)?,
                    raw_meta: row.get(1)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, rusqlite::Error>>()?
        };

        debug!(count = summaries.len(), "listed tiddlers");
        Ok(summaries)
    }

    /// Inserts or updates a tiddler and returns its new revision.
    pub fn upsert(&self, title: &str, draft: TiddlerDraft) -> CoreResult<Revision> {
        self.upsert_with(&RequestContext::new(), title, draft)
    }

    /// Inserts or updates a tiddler, honouring `ctx`.
    ///
    /// A new title gets revision 1; an existing one gets its previous
    /// revision plus one. The revision and bag are written into the stored
    /// metadata, and the system flag is derived from the title. `ctx` is
    /// checked just before commit; a cancelled context rolls the write back.
    pub fn upsert_with(
        &self,
        ctx: &RequestContext,
        title: &str,
        draft: TiddlerDraft,
    ) -> CoreResult<Revision> {
        let is_system = self.is_system(title);
        let TiddlerDraft { mut meta, text } = draft;

        let mut conn = self.lock(ctx)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let previous: Option<i64> = tx
            .query_row(
                "SELECT rev FROM tiddler WHERE title = ?1",
                params![title],
                |row| row.get(0),
            )
            .optional()?;
        let revision = match previous {
            Some(rev) => Revision::new(rev.max(0) as u64).next(),
            None => Revision::FIRST,
        };

        meta.insert(REVISION_FIELD.to_string(), Value::from(revision.as_u64()));
        meta.insert(BAG_FIELD.to_string(), Value::from(BAG));
        meta.entry(TITLE_FIELD.to_string())
            .or_insert_with(|| Value::String(title.to_string()));
        let raw_meta = serde_json::to_string(&meta)?;

        tx.execute(
            "INSERT INTO tiddler (title, rev, meta, text, is_system)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(title) DO UPDATE SET
                rev = excluded.rev,
                meta = excluded.meta,
                text = excluded.text,
                is_system = excluded.is_system",
            params![title, revision.as_u64() as i64, raw_meta, text, is_system],
        )?;

        ctx.check()?;
        tx.commit()?;

        debug!(title, %revision, is_system, "tiddler written");
        Ok(revision)
    }

    /// Deletes a tiddler.
    ///
    /// Returns whether a row existed. Deleting a missing title is not an
    /// error.
    pub fn delete(&self, title: &str) -> CoreResult<bool> {
        self.delete_with(&RequestContext::new(), title)
    }

    /// Deletes a tiddler, honouring `ctx`.
    pub fn delete_with(&self, ctx: &RequestContext, title: &str) -> CoreResult<bool> {
        let mut conn = self.lock(ctx)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let removed = tx.execute("DELETE FROM tiddler WHERE title = ?1", params![title])?;
        ctx.check()?;
        tx.commit()?;

        debug!(title, existed = removed > 0, "tiddler deleted");
        Ok(removed > 0)
    }

    /// Recomputes the system flag of every row with the current prefixes.
    ///
    /// Returns the number of rows whose flag changed.
    pub fn reclassify(&self) -> CoreResult<usize> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let rows = {
            let mut stmt = tx.prepare("SELECT title, is_system FROM tiddler")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, bool>(1)?))
            })?;
            rows.collect::<Result<Vec<_>, rusqlite::Error>>()?
        };

        let mut changed = 0;
        for (title, stored) in rows {
            let is_system = self.is_system(&title);
            if is_system != stored {
                tx.execute(
                    "UPDATE tiddler SET is_system = ?1 WHERE title = ?2",
                    params![is_system, title],
                )?;
                changed += 1;
            }
        }
        tx.commit()?;

        if changed > 0 {
            info!(changed, "tiddlers reclassified");
        }
        Ok(changed)
    }

    /// Returns the number of stored tiddlers, system ones included.
    pub fn count(&self) -> CoreResult<u64> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM tiddler", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    /// Returns row counts and the schema version.
    pub fn stats(&self) -> CoreResult<StoreStats> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let (visible, system): (i64, i64) = tx.query_row(
            "SELECT
                COALESCE(SUM(CASE WHEN is_system = 0 THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN is_system = 0 THEN 0 ELSE 1 END), 0)
             FROM tiddler",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        let schema_version = migration::schema_version(&tx)?;

        Ok(StoreStats {
            visible: visible.max(0) as u64,
            system: system.max(0) as u64,
            schema_version,
        })
    }
}

fn parse_meta(title: &str, raw: &str) -> CoreResult<Metadata> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(meta)) => Ok(meta),
        Ok(other) => Err(CoreError::corrupt_row(
            title,
            format!("stored metadata is {}, expected an object", json_kind(&other)),
        )),
        Err(e) => Err(CoreError::corrupt_row(title, format!("stored metadata: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::SystemPrefixes;
    use proptest::prelude::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    fn draft(title: &str, text: &str) -> TiddlerDraft {
        let mut meta = Metadata::new();
        meta.insert("title".into(), json!(title));
        meta.insert("tags".into(), json!("demo"));
        TiddlerDraft::new(meta, text)
    }

    fn titles(store: &TiddlerStore) -> Vec<String> {
        let mut titles: Vec<_> = store.list().unwrap().into_iter().map(|s| s.title).collect();
        titles.sort();
        titles
    }

    #[test]
    fn get_unknown_title_is_not_found() {
        let store = TiddlerStore::open_in_memory().unwrap();
        let err = store.get("Nope").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn foo_scenario() {
        let store = TiddlerStore::open_in_memory().unwrap();

        let rev = store.upsert("Foo", draft("Foo", "hello")).unwrap();
        assert_eq!(rev, Revision::new(1));

        let rev = store.upsert("Foo", draft("Foo", "world")).unwrap();
        assert_eq!(rev, Revision::new(2));

        let foo = store.get("Foo").unwrap();
        assert_eq!(foo.text, "world");
        assert_eq!(foo.revision, Revision::new(2));

        store.delete("Foo").unwrap();
        assert!(store.get("Foo").unwrap_err().is_not_found());
    }

    #[test]
    fn upsert_then_get_returns_what_was_written() {
        let store = TiddlerStore::open_in_memory().unwrap();
        let written = draft("Bar", "body").with_field("color", "red");
        store.upsert("Bar", written).unwrap();

        let bar = store.get("Bar").unwrap();
        assert_eq!(bar.text, "body");
        assert_eq!(bar.meta["color"], json!("red"));
        assert_eq!(bar.meta["tags"], json!("demo"));
        assert_eq!(bar.meta["revision"], json!(1));
        assert_eq!(bar.meta["bag"], json!(BAG));
        assert!(!bar.meta.contains_key("text"));
        assert!(!bar.is_system);
    }

    #[test]
    fn caller_revision_and_bag_are_overwritten() {
        let store = TiddlerStore::open_in_memory().unwrap();
        let forged = draft("Baz", "x")
            .with_field("revision", 99)
            .with_field("bag", "elsewhere");
        let rev = store.upsert("Baz", forged).unwrap();

        let baz = store.get("Baz").unwrap();
        assert_eq!(rev, Revision::FIRST);
        assert_eq!(baz.meta["revision"], json!(1));
        assert_eq!(baz.meta["bag"], json!(BAG));
    }

    #[test]
    fn missing_title_field_is_filled_in() {
        let store = TiddlerStore::open_in_memory().unwrap();
        store
            .upsert("Untitled", TiddlerDraft::new(Metadata::new(), "x"))
            .unwrap();
        assert_eq!(store.get("Untitled").unwrap().meta["title"], json!("Untitled"));
    }

    #[test]
    fn metadata_field_order_is_kept() {
        let store = TiddlerStore::open_in_memory().unwrap();
        let mut meta = Metadata::new();
        meta.insert("title".into(), json!("Ordered"));
        meta.insert("zeta".into(), json!(1));
        meta.insert("alpha".into(), json!(2));
        store.upsert("Ordered", TiddlerDraft::new(meta, "")).unwrap();

        let keys: Vec<_> = store.get("Ordered").unwrap().meta.keys().cloned().collect();
        assert_eq!(&keys[..3], &["title", "zeta", "alpha"]);
    }

    #[test]
    fn delete_missing_and_existing_both_succeed() {
        let store = TiddlerStore::open_in_memory().unwrap();
        store.upsert("Here", draft("Here", "x")).unwrap();

        assert!(store.delete("Here").unwrap());
        assert!(!store.delete("Here").unwrap());
        assert!(!store.delete("Never").unwrap());
    }

    #[test]
    fn revision_restarts_after_delete() {
        let store = TiddlerStore::open_in_memory().unwrap();
        store.upsert("Again", draft("Again", "1")).unwrap();
        store.upsert("Again", draft("Again", "2")).unwrap();
        store.delete("Again").unwrap();
        assert_eq!(store.upsert("Again", draft("Again", "3")).unwrap(), Revision::FIRST);
    }

    #[test]
    fn list_hides_system_tiddlers() {
        let store = TiddlerStore::open_in_memory().unwrap();
        store.upsert("$:/boot/boot.js", draft("$:/boot/boot.js", "code")).unwrap();
        store
            .upsert(
                "$:/themes/tiddlywiki/vanilla",
                draft("$:/themes/tiddlywiki/vanilla", "{}"),
            )
            .unwrap();
        store.upsert("Foo", draft("Foo", "hello")).unwrap();

        assert_eq!(titles(&store), vec!["$:/themes/tiddlywiki/vanilla", "Foo"]);
        assert!(store.get("$:/boot/boot.js").unwrap().is_system);
    }

    #[test]
    fn list_returns_stored_json_without_text() {
        let store = TiddlerStore::open_in_memory().unwrap();
        store.upsert("Foo", draft("Foo", "secret body")).unwrap();

        let list = store.list().unwrap();
        assert_eq!(list.len(), 1);
        assert!(!list[0].raw_meta.contains("secret body"));
        let parsed: Value = serde_json::from_str(&list[0].raw_meta).unwrap();
        assert_eq!(parsed["revision"], json!(1));
    }

    #[test]
    fn cancelled_write_is_rolled_back() {
        let store = TiddlerStore::open_in_memory().unwrap();
        let ctx = RequestContext::new();
        ctx.cancel();

        let err = store.upsert_with(&ctx, "Foo", draft("Foo", "x")).unwrap_err();
        assert!(matches!(err, CoreError::Cancelled { .. }));
        assert!(store.get("Foo").unwrap_err().is_not_found());
    }

    #[test]
    fn cancelled_update_keeps_previous_revision() {
        let store = TiddlerStore::open_in_memory().unwrap();
        store.upsert("Foo", draft("Foo", "first")).unwrap();

        let ctx = RequestContext::new();
        ctx.cancel();
        assert!(store.upsert_with(&ctx, "Foo", draft("Foo", "second")).is_err());
        assert!(store.delete_with(&ctx, "Foo").is_err());

        let foo = store.get("Foo").unwrap();
        assert_eq!(foo.text, "first");
        assert_eq!(foo.revision, Revision::FIRST);
    }

    #[test]
    fn cancelled_read_fails() {
        let store = TiddlerStore::open_in_memory().unwrap();
        let ctx = RequestContext::new();
        ctx.cancel();
        assert!(store.list_with(&ctx).is_err());
        assert!(matches!(
            store.get_with(&ctx, "Foo"),
            Err(CoreError::Cancelled { .. })
        ));
    }

    #[test]
    fn deadline_bounds_the_wait_for_the_connection() {
        let store = TiddlerStore::open_in_memory().unwrap();
        store.upsert("Foo", draft("Foo", "x")).unwrap();

        let _held = store.conn.lock();
        let ctx = RequestContext::with_timeout(Duration::from_millis(50));
        let started = Instant::now();
        let err = store.upsert_with(&ctx, "Foo", draft("Foo", "y")).unwrap_err();

        assert!(matches!(err, CoreError::Cancelled { .. }));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn deadline_bounds_sqlite_busy_wait() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiddly.db");
        let store = TiddlerStore::open(StoreConfig::new(&path)).unwrap();

        // A second connection holds the write lock.
        let blocker = Connection::open(&path).unwrap();
        blocker.execute_batch("BEGIN IMMEDIATE").unwrap();

        let ctx = RequestContext::with_timeout(Duration::from_millis(200));
        let started = Instant::now();
        assert!(store.upsert_with(&ctx, "Foo", draft("Foo", "x")).is_err());
        assert!(started.elapsed() < Duration::from_secs(4));

        blocker.execute_batch("ROLLBACK").unwrap();
        store.upsert("Foo", draft("Foo", "x")).unwrap();
    }

    #[test]
    fn corrupt_stored_metadata_is_a_storage_error() {
        let store = TiddlerStore::open_in_memory().unwrap();
        store.upsert("Foo", draft("Foo", "x")).unwrap();
        store.upsert("Bar", draft("Bar", "y")).unwrap();
        {
            let conn = store.conn.lock();
            conn.execute("UPDATE tiddler SET meta = '{broken' WHERE title = 'Foo'", [])
                .unwrap();
            conn.execute("UPDATE tiddler SET meta = '[1]' WHERE title = 'Bar'", [])
                .unwrap();
        }

        for title in ["Foo", "Bar"] {
            let err = store.get(title).unwrap_err();
            assert!(matches!(err, CoreError::CorruptRow { .. }), "{title}: {err}");
            assert!(err.is_storage());
        }
    }

    #[test]
    fn invalid_config_is_rejected_on_open() {
        let config = StoreConfig::in_memory().system_prefixes(SystemPrefixes::new([""]));
        assert!(matches!(
            TiddlerStore::open(config),
            Err(CoreError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn open_without_migrating_leaves_schema_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiddly.db");
        Connection::open(&path).unwrap();

        let store = TiddlerStore::open(StoreConfig::new(&path).run_migrations(false)).unwrap();
        assert_eq!(store.schema_version().unwrap(), 0);
        assert_eq!(store.migrations_applied().applied_count(), 0);
        assert_eq!(store.migrations_applied().final_version, 0);
        drop(store);

        let store = TiddlerStore::open(StoreConfig::new(&path)).unwrap();
        assert!(store.schema_version().unwrap() > 0);
    }

    #[test]
    fn reopen_keeps_data_and_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("tiddly.db");

        let first_version = {
            let store = TiddlerStore::open(StoreConfig::new(&path)).unwrap();
            store.upsert("Foo", draft("Foo", "hello")).unwrap();
            assert!(store.migrations_applied().applied_count() > 0);
            store.schema_version().unwrap()
        };

        let store = TiddlerStore::open(StoreConfig::new(&path)).unwrap();
        assert_eq!(store.migrations_applied().applied_count(), 0);
        assert_eq!(store.schema_version().unwrap(), first_version);
        assert_eq!(store.get("Foo").unwrap().text, "hello");
    }

    #[test]
    fn broken_migration_aborts_open() {
        let dir = tempfile::tempdir().unwrap();
        let scripts = dir.path().join("migration");
        fs::create_dir(&scripts).unwrap();
        fs::write(scripts.join("0001.sql"), "CREATE TABLE tiddler (title TEXT);").unwrap();
        fs::write(scripts.join("0002.sql"), "ALTER TABLE nope ADD COLUMN x;").unwrap();

        let config = StoreConfig::new(dir.path().join("tiddly.db"))
            .migrations(MigrationSource::Directory(scripts));
        let err = TiddlerStore::open(config).err().unwrap();
        assert!(matches!(err, CoreError::MigrationFailed { version: 2, .. }));
    }

    #[test]
    fn reclassify_follows_new_prefixes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiddly.db");
        {
            let store = TiddlerStore::open(StoreConfig::new(&path)).unwrap();
            store.upsert("Private/Note", draft("Private/Note", "x")).unwrap();
            store.upsert("Public", draft("Public", "y")).unwrap();
        }

        let config = StoreConfig::new(&path).system_prefixes(SystemPrefixes::new(["Private/"]));
        let store = TiddlerStore::open(config).unwrap();
        assert_eq!(store.reclassify().unwrap(), 1);
        assert_eq!(titles(&store), vec!["Public"]);
    }

    #[test]
    fn stats_count_rows() {
        let store = TiddlerStore::open_in_memory().unwrap();
        store.upsert("$:/StoryList", draft("$:/StoryList", "")).unwrap();
        store.upsert("Foo", draft("Foo", "x")).unwrap();
        store.upsert("Bar", draft("Bar", "y")).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.visible, 2);
        assert_eq!(stats.system, 1);
        assert_eq!(stats.total(), 3);
        assert_eq!(store.count().unwrap(), 3);
        assert_eq!(stats.schema_version, store.schema_version().unwrap());
    }

    #[test]
    fn concurrent_writers_keep_revisions_gapless() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(TiddlerStore::open(StoreConfig::new(dir.path().join("t.db"))).unwrap());

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let mut seen = Vec::new();
                    for j in 0..25 {
                        let rev = store
                            .upsert("Shared", draft("Shared", &format!("{i}-{j}")))
                            .unwrap();
                        seen.push(rev.as_u64());
                    }
                    seen
                })
            })
            .collect();

        let mut all: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        all.sort_unstable();

        assert_eq!(all, (1..=100).collect::<Vec<_>>());
        assert_eq!(store.get("Shared").unwrap().revision, Revision::new(100));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn n_upserts_yield_revision_n(n in 1usize..20, title in "[A-Za-z][A-Za-z0-9 ]{0,15}") {
            let store = TiddlerStore::open_in_memory().unwrap();
            let mut last = Revision::new(0);
            for i in 0..n {
                let rev = store.upsert(&title, draft(&title, &i.to_string())).unwrap();
                prop_assert_eq!(rev, last.next());
                last = rev;
            }
            prop_assert_eq!(store.get(&title).unwrap().revision, Revision::new(n as u64));
        }

        #[test]
        fn visible_titles_are_always_listed(title in "[A-Za-z][A-Za-z0-9 ]{0,15}") {
            let store = TiddlerStore::open_in_memory().unwrap();
            store.upsert(&title, draft(&title, "x")).unwrap();
            let listed = store.list().unwrap();
            prop_assert!(listed.iter().any(|s| s.title == title));
        }
    }
}
