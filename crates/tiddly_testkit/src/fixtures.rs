//! Test fixtures for stores and credential directories.
//!
//! Every fixture that touches disk owns its `TempDir`, so the files live
//! exactly as long as the fixture.

use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tiddly_core::{StoreConfig, TiddlerDraft, TiddlerStore};
use tiddly_credentials::{CredentialConfig, CredentialStore};

/// Pepper used by every credential fixture.
pub const TEST_PEPPER: &str = "testkit-pepper";

/// Email of the seeded user.
pub const TEST_EMAIL: &str = "user@example.com";

/// Password of the seeded user.
pub const TEST_PASSWORD: &str = "fancy-password";

/// Lowest bcrypt cost, to keep tests fast.
pub const TEST_BCRYPT_COST: u32 = 4;

/// A tiddler store with automatic cleanup.
pub struct TestStore {
    /// The store, shareable across threads.
    pub store: Arc<TiddlerStore>,
    _temp_dir: Option<TempDir>,
}

impl TestStore {
    /// Opens an in-memory store.
    pub fn memory() -> Self {
        Self {
            store: Arc::new(TiddlerStore::open_in_memory().expect("Failed to open in-memory store")),
            _temp_dir: None,
        }
    }

    /// Opens a store on a file in a fresh temporary directory.
    pub fn file() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config = StoreConfig::new(temp_dir.path().join("tiddly.db"));
        let store = TiddlerStore::open(config).expect("Failed to open file store");
        Self {
            store: Arc::new(store),
            _temp_dir: Some(temp_dir),
        }
    }

    /// Returns the temporary directory, if file-based.
    pub fn dir(&self) -> Option<&Path> {
        self._temp_dir.as_ref().map(TempDir::path)
    }
}

impl std::ops::Deref for TestStore {
    type Target = TiddlerStore;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

/// A credential directory seeded with one user.
pub struct TestCredentials {
    /// The store over the seeded directory.
    pub store: Arc<CredentialStore>,
    _temp_dir: TempDir,
}

impl TestCredentials {
    /// Creates a directory holding [`TEST_EMAIL`] / [`TEST_PASSWORD`].
    pub fn seeded() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config =
            CredentialConfig::new(temp_dir.path(), TEST_PEPPER).bcrypt_cost(TEST_BCRYPT_COST);
        let store = CredentialStore::new(config);
        let hash = store
            .hash_password(TEST_PASSWORD)
            .expect("Failed to hash password");
        store
            .add_user(TEST_EMAIL, &hash)
            .expect("Failed to write user file");
        Self {
            store: Arc::new(store),
            _temp_dir: temp_dir,
        }
    }

    /// Returns the credential directory.
    pub fn dir(&self) -> &Path {
        self._temp_dir.path()
    }

    /// Issues a remember token for the seeded user.
    pub fn sign_in(&self) -> String {
        let user = self
            .store
            .by_email(TEST_EMAIL)
            .expect("Seeded user missing");
        self.store
            .create_remember_token(&user)
            .expect("Failed to create remember token")
    }
}

impl std::ops::Deref for TestCredentials {
    type Target = CredentialStore;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

/// Runs a test with a temporary in-memory store.
pub fn with_temp_store<F, R>(f: F) -> R
where
    F: FnOnce(&TiddlerStore) -> R,
{
    let test_store = TestStore::memory();
    f(&test_store.store)
}

/// Builds a draft from a JSON object literal.
///
/// Panics if `json` is not an object; meant for test inputs only.
pub fn draft(title: &str, json: &str) -> TiddlerDraft {
    let fields = match serde_json::from_str(json).expect("Invalid JSON") {
        serde_json::Value::Object(fields) => fields,
        other => panic!("expected a JSON object, got {other}"),
    };
    TiddlerDraft::from_fields(title, fields).expect("Invalid tiddler fields")
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;

    /// A store holding `count` ordinary tiddlers titled `Tiddler 0..count`.
    pub fn populated_store(count: usize) -> TestStore {
        let test_store = TestStore::memory();
        for i in 0..count {
            let title = format!("Tiddler {i}");
            test_store
                .upsert(&title, draft(&title, &format!(r#"{{"text":"body {i}"}}"#)))
                .expect("Failed to upsert tiddler");
        }
        test_store
    }

    /// A store holding one visible, one system and one theme tiddler.
    pub fn mixed_store() -> TestStore {
        let test_store = TestStore::memory();
        for title in ["Foo", "$:/boot/boot.js", "$:/themes/tiddlywiki/vanilla"] {
            test_store
                .upsert(title, draft(title, "{}"))
                .expect("Failed to upsert tiddler");
        }
        test_store
    }
}
