//! The credential store.

use crate::collection::{JsonCollection, WhenMissing};
use crate::config::CredentialConfig;
use crate::error::{CredentialError, CredentialResult};
use crate::secret;
use crate::user::{User, UserToken};
use parking_lot::Mutex;
use std::sync::OnceLock;
use tracing::{debug, info};

/// Password checked against the decoy hash when an email is unknown.
const DECOY_INPUT: &str = "tiddly-decoy";

/// Users and remember tokens, each persisted as one JSON file.
///
/// Each collection sits behind its own mutex. Every operation that reads a
/// collection and writes it back holds that mutex from the read to the
/// write, so two concurrent token writes cannot drop each other's record.
/// Password verification runs after the user lock is released.
///
/// The token file may be missing (no one has signed in yet); the user file
/// may not.
pub struct CredentialStore {
    config: CredentialConfig,
    users: Mutex<JsonCollection<User>>,
    tokens: Mutex<JsonCollection<UserToken>>,
    decoy: OnceLock<String>,
}

impl CredentialStore {
    /// Creates a store over the collections in `config.dir`.
    ///
    /// Nothing is read until the first operation.
    #[must_use]
    pub fn new(config: CredentialConfig) -> Self {
        let users = JsonCollection::new(config.users_path(), WhenMissing::Fail);
        let tokens = JsonCollection::new(config.tokens_path(), WhenMissing::Empty);
        Self {
            config,
            users: Mutex::new(users),
            tokens: Mutex::new(tokens),
            decoy: OnceLock::new(),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &CredentialConfig {
        &self.config
    }

    /// Checks an email and password.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown email, `InvalidCredential` for a wrong
    /// password. Present both the same way to remote callers. An unknown
    /// email still costs one bcrypt check, against a decoy hash made with
    /// the configured cost.
    pub fn authenticate(&self, email: &str, password: &str) -> CredentialResult<User> {
        let user = match self.by_email(email) {
            Ok(user) => user,
            Err(CredentialError::NotFound) => {
                let decoy = self.decoy_hash();
                let _ = secret::verify_password(password, &self.config.pepper, decoy);
                return Err(CredentialError::NotFound);
            }
            Err(e) => return Err(e),
        };
        if secret::verify_password(password, &self.config.pepper, &user.password_hash)? {
            debug!(email = %user.email, "password accepted");
            Ok(user)
        } else {
            Err(CredentialError::InvalidCredential)
        }
    }

    fn decoy_hash(&self) -> &str {
        self.decoy.get_or_init(|| {
            bcrypt::hash(DECOY_INPUT, self.config.bcrypt_cost).unwrap_or_default()
        })
    }

    /// Looks a user up by email, ignoring case.
    pub fn by_email(&self, email: &str) -> CredentialResult<User> {
        let users = self.users.lock();
        users
            .load()?
            .into_iter()
            .find(|u| u.has_email(email))
            .ok_or(CredentialError::NotFound)
    }

    /// Returns every user.
    pub fn users(&self) -> CredentialResult<Vec<User>> {
        self.users.lock().load()
    }

    /// Adds a user, or replaces the hash of an existing one.
    ///
    /// Creates the user file if it does not exist yet.
    pub fn add_user(&self, email: &str, password_hash: &str) -> CredentialResult<User> {
        let email = email.trim();
        if email.is_empty() {
            return Err(CredentialError::invalid_input("email is required"));
        }
        if password_hash.is_empty() {
            return Err(CredentialError::invalid_input("password hash is required"));
        }

        let users = self.users.lock();
        let mut all = users.load_or(WhenMissing::Empty)?;
        let user = User::new(email, password_hash);
        match all.iter_mut().find(|u| u.has_email(email)) {
            Some(existing) => *existing = user.clone(),
            None => all.push(user.clone()),
        }
        users.save(&all)?;

        info!(email, path = %users.path().display(), "user saved");
        Ok(user)
    }

    /// Hashes `password` with this store's pepper and cost.
    pub fn hash_password(&self, password: &str) -> CredentialResult<String> {
        secret::hash_password(password, &self.config.pepper, self.config.bcrypt_cost)
    }

    /// Issues a new remember token for `user`.
    ///
    /// Earlier tokens of the same user stay valid.
    pub fn create_remember_token(&self, user: &User) -> CredentialResult<String> {
        let token = secret::generate_token()?;

        let tokens = self.tokens.lock();
        let mut all = tokens.load()?;
        all.push(UserToken {
            email: user.email.clone(),
            remember_token: token.clone(),
        });
        tokens.save(&all)?;

        debug!(email = %user.email, active = all.len(), "remember token issued");
        Ok(token)
    }

    /// Resolves a remember token to its user.
    ///
    /// # Errors
    ///
    /// `NotFound` if no record holds the token, or its user no longer exists.
    pub fn by_remember_token(&self, token: &str) -> CredentialResult<User> {
        if token.is_empty() {
            return Err(CredentialError::NotFound);
        }

        let email = {
            let tokens = self.tokens.lock();
            tokens
                .load()?
                .into_iter()
                .find(|t| t.matches(token))
                .map(|t| t.email)
        };

        match email {
            Some(email) => self.by_email(&email),
            None => Err(CredentialError::NotFound),
        }
    }

    /// Revokes a remember token. Unknown tokens are ignored.
    pub fn clear_remember_token(&self, token: &str) -> CredentialResult<()> {
        let tokens = self.tokens.lock();
        let mut all = tokens.load()?;
        let Some(index) = all.iter().position(|t| t.matches(token)) else {
            return Ok(());
        };
        // Token order carries no meaning.
        all.swap_remove(index);
        tokens.save(&all)?;

        debug!(active = all.len(), "remember token cleared");
        Ok(())
    }

    /// Returns the number of stored remember tokens.
    pub fn token_count(&self) -> CredentialResult<usize> {
        Ok(self.tokens.lock().load()?.len())
    }
}
