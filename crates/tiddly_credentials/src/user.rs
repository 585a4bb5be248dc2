//! User and remember-token records.

use serde::{Deserialize, Serialize};

/// A user allowed to sign in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Email address, compared case-insensitively.
    pub email: String,
    /// bcrypt hash of password + pepper.
    pub password_hash: String,
}

impl User {
    /// Creates a user record.
    #[must_use]
    pub fn new(email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password_hash: password_hash.into(),
        }
    }

    /// Returns true if `email` names this user.
    #[must_use]
    pub fn has_email(&self, email: &str) -> bool {
        same_email(&self.email, email)
    }
}

/// A remember token issued to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserToken {
    /// Email of the owning user.
    pub email: String,
    /// The opaque token handed out in the cookie.
    pub remember_token: String,
}

impl UserToken {
    /// Returns true if `token` is this record's token, ignoring ASCII case.
    #[must_use]
    pub fn matches(&self, token: &str) -> bool {
        self.remember_token.eq_ignore_ascii_case(token)
    }
}

pub(crate) fn same_email(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || a.to_lowercase() == b.to_lowercase()
}
