//! Credential store configuration.

use std::fmt;
use std::path::PathBuf;

/// File name of the user collection.
pub const USERS_FILE: &str = "users.json";
/// File name of the remember-token collection.
pub const TOKENS_FILE: &str = "tokens.json";
/// bcrypt cost used unless configured otherwise.
pub const DEFAULT_BCRYPT_COST: u32 = bcrypt::DEFAULT_COST;

/// Configuration for a credential store.
#[derive(Clone)]
pub struct CredentialConfig {
    /// Directory holding the collection files.
    pub dir: PathBuf,
    /// Server-wide secret appended to every password before hashing.
    pub pepper: String,
    /// bcrypt cost used when hashing new passwords.
    pub bcrypt_cost: u32,
}

impl CredentialConfig {
    /// Creates a configuration for collections in `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, pepper: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            pepper: pepper.into(),
            bcrypt_cost: DEFAULT_BCRYPT_COST,
        }
    }

    /// Sets the bcrypt cost.
    #[must_use]
    pub const fn bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    /// Path of the user collection.
    #[must_use]
    pub fn users_path(&self) -> PathBuf {
        self.dir.join(USERS_FILE)
    }

    /// Path of the remember-token collection.
    #[must_use]
    pub fn tokens_path(&self) -> PathBuf {
        self.dir.join(TOKENS_FILE)
    }
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self::new(".", String::new())
    }
}

impl fmt::Debug for CredentialConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialConfig")
            .field("dir", &self.dir)
            .field("pepper", &"<redacted>")
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}
