//! Error types for the credential store.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for credential operations.
pub type CredentialResult<T> = Result<T, CredentialError>;

/// Errors that can occur in credential operations.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// No user or token matched.
    #[error("not found")]
    NotFound,

    /// The password did not match the stored hash.
    #[error("invalid credential")]
    InvalidCredential,

    /// A collection file could not be read, parsed or written.
    #[error("storage error at {}: {message}", path.display())]
    Storage {
        /// The collection file.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },

    /// Password hashing failed, or a stored hash is malformed.
    #[error("hash error: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    /// The operating system random source failed.
    #[error("random source failed: {message}")]
    Random {
        /// Description of the failure.
        message: String,
    },

    /// Input rejected before touching storage.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Description of the problem.
        message: String,
    },
}

impl CredentialError {
    /// Creates a storage error for `path`.
    pub fn storage(path: &Path, message: impl Into<String>) -> Self {
        Self::Storage {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    /// Creates a random source error.
    pub fn random(message: impl Into<String>) -> Self {
        Self::Random {
            message: message.into(),
        }
    }

    /// Creates an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Returns true for failures that mean "these credentials are no good".
    ///
    /// Callers facing the network must present both kinds the same way so
    /// that a caller cannot tell an unknown email from a wrong password.
    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::NotFound | Self::InvalidCredential)
    }
}
