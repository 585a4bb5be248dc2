//! # Tiddly Core
//!
//! Revisioned tiddler store for the tiddly server.
//!
//! This crate provides:
//! - A SQLite tiddler store with per-title revisions
//! - Schema migrations tracked through `PRAGMA user_version`
//! - System tiddler classification by title prefix
//! - Request contexts for cancellation and deadlines
//!
//! Every store operation runs in its own transaction. A write either
//! commits completely, with its revision, metadata, text and system flag,
//! or leaves the row as it was.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod config;
mod context;
mod error;
pub mod migration;
mod store;
pub mod system;
mod tiddler;

pub use config::{MigrationSource, StoreConfig, MEMORY_PATH};
pub use context::RequestContext;
pub use error::{CoreError, CoreResult};
pub use migration::{
    Migration, MigrationInfo, MigrationManager, MigrationRunResult, MigrationVersion, SqlMigration,
};
pub use store::{StoreStats, TiddlerStore};
pub use system::{is_system_title, SystemPrefixes, SYSTEM_PREFIXES};
pub use tiddler::{
    join_summaries, Metadata, Revision, Tiddler, TiddlerDraft, TiddlerSummary, BAG, BAG_FIELD,
    REVISION_FIELD, TEXT_FIELD, TITLE_FIELD,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
