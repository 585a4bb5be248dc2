//! Error types for the tiddler store.

use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in tiddler store operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// SQLite error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Metadata could not be encoded or decoded.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Tiddler not found.
    #[error("tiddler not found: {title:?}")]
    NotFound {
        /// The title that was looked up.
        title: String,
    },

    /// Supplied metadata is unusable, for example a non-string `text`.
    #[error("invalid metadata for {title:?}: {message}")]
    InvalidMetadata {
        /// Title of the offending tiddler.
        title: String,
        /// Description of the problem.
        message: String,
    },

    /// A stored row could not be decoded.
    #[error("corrupt row for {title:?}: {message}")]
    CorruptRow {
        /// Title of the row.
        title: String,
        /// Description of the problem.
        message: String,
    },

    /// A migration failed. The migration's transaction was rolled back.
    #[error("migration {version} ({name}) failed: {message}")]
    MigrationFailed {
        /// Version of the failing migration (0 when not tied to one).
        version: u64,
        /// Name of the failing migration.
        name: String,
        /// Description of the failure.
        message: String,
    },

    /// The request was cancelled or ran past its deadline before commit.
    #[error("operation cancelled: {reason}")]
    Cancelled {
        /// Why the operation was abandoned.
        reason: String,
    },

    /// Invalid store configuration.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },
}

impl CoreError {
    /// Creates a not found error.
    pub fn not_found(title: impl Into<String>) -> Self {
        Self::NotFound {
            title: title.into(),
        }
    }

    /// Creates an invalid metadata error.
    pub fn invalid_metadata(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidMetadata {
            title: title.into(),
            message: message.into(),
        }
    }

    /// Creates a corrupt row error.
    pub fn corrupt_row(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CorruptRow {
            title: title.into(),
            message: message.into(),
        }
    }

    /// Creates a migration failed error.
    pub fn migration_failed(
        version: u64,
        name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::MigrationFailed {
            version,
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates a cancelled error.
    pub fn cancelled(reason: impl Into<String>) -> Self {
        Self::Cancelled {
            reason: reason.into(),
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Returns true if this error means the tiddler does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true for failures of the underlying storage.
    #[must_use]
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Self::Sqlite(_) | Self::Io(_) | Self::Json(_) | Self::CorruptRow { .. }
        )
    }
}
