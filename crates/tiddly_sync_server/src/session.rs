//! Cookie sessions backed by remember tokens.

use crate::error::ServerResult;
use crate::http::Request;
use std::time::Duration;
use tiddly_credentials::{CredentialStore, User};
use time::macros::format_description;
use time::OffsetDateTime;
use tracing::warn;

/// Name of the remember cookie.
pub const REMEMBER_COOKIE: &str = "tiddlywiki-remember";

/// A signed-in caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// The user the remember token belongs to.
    pub user: User,
    /// The token presented.
    pub token: String,
}

impl Session {
    /// Name shown to the wiki: the local part of the email.
    pub fn username(&self) -> &str {
        self.user
            .email
            .split_once('@')
            .map_or(self.user.email.as_str(), |(local, _)| local)
    }
}

/// Resolves the session a request carries, if any.
///
/// A missing or unknown token is no session. Storage failures are errors.
pub fn resolve(credentials: &CredentialStore, request: &Request) -> ServerResult<Option<Session>> {
    let Some(token) = request.cookie(REMEMBER_COOKIE).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };

    match credentials.by_remember_token(token) {
        Ok(user) => Ok(Some(Session {
            user,
            token: token.to_string(),
        })),
        Err(e) if e.is_auth_failure() => {
            warn!(path = %request.path, "remember token not recognised");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// `Set-Cookie` value that stores `token` for `lifetime`.
pub fn remember_cookie(token: &str, lifetime: Duration, now: OffsetDateTime) -> String {
    let expires = now + lifetime;
    format!(
        "{REMEMBER_COOKIE}={token}; Path=/; Expires={}; Max-Age={}; HttpOnly",
        http_date(expires),
        lifetime.as_secs()
    )
}

/// `Set-Cookie` value that removes the remember cookie.
pub fn clearing_cookie() -> String {
    format!(
        "{REMEMBER_COOKIE}=; Path=/; Expires={}; Max-Age=0; HttpOnly",
        http_date(OffsetDateTime::UNIX_EPOCH)
    )
}

/// RFC 7231 IMF-fixdate, always in GMT.
fn http_date(at: OffsetDateTime) -> String {
    let format = format_description!(
        "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
    );
    at.to_offset(time::UtcOffset::UTC)
        .format(format)
        .unwrap_or_default()
}
