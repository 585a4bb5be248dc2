//! Error types for the protocol adapter.

use thiserror::Error;
use tiddly_core::CoreError;
use tiddly_credentials::CredentialError;

/// Result type for adapter operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur while serving a request.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Malformed request: bad body, missing form field, bad encoding.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Sign-in failed. Carries no detail on purpose.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// No such route or tiddler.
    #[error("not found: {0}")]
    NotFound(String),

    /// The route exists but not for this method.
    #[error("method {0} not allowed")]
    MethodNotAllowed(String),

    /// Tiddler store failure.
    #[error("store error: {0}")]
    Store(#[from] CoreError),

    /// Credential store failure other than a credential mismatch.
    #[error("credential error: {0}")]
    Credentials(#[from] CredentialError),

    /// The configuration file is missing or malformed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    /// Returns true if this is a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status())
    }

    /// Returns true if this is a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        self.status() >= 500
    }

    /// Returns the HTTP status this error is presented with.
    ///
    /// Rejected input maps to 400; a stored row that fails to decode is a
    /// storage fault and maps to 500.
    pub fn status(&self) -> u16 {
        match self {
            ServerError::InvalidRequest(_) => 400,
            ServerError::AuthenticationFailed => 401,
            ServerError::NotFound(_) => 404,
            ServerError::MethodNotAllowed(_) => 405,
            ServerError::Store(e) if e.is_not_found() => 404,
            ServerError::Store(CoreError::InvalidMetadata { .. }) => 400,
            ServerError::Credentials(e) if e.is_auth_failure() => 401,
            ServerError::Credentials(CredentialError::InvalidInput { .. }) => 400,
            ServerError::Store(_)
            | ServerError::Credentials(_)
            | ServerError::InvalidConfig(_)
            | ServerError::Internal(_) => 500,
        }
    }

    /// Detail shown to every caller after the status text, if any.
    ///
    /// Authentication failures and server errors show none.
    pub(crate) fn public_detail(&self) -> Option<String> {
        match self {
            ServerError::InvalidRequest(message) => Some(message.clone()),
            ServerError::Store(e @ CoreError::InvalidMetadata { .. }) => Some(e.to_string()),
            _ => None,
        }
    }
}

/// Standard reason phrase for `status`.
pub(crate) fn status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        204 => "No Content",
        302 => "Found",
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_classification() {
        assert!(ServerError::InvalidRequest("bad".into()).is_client_error());
        assert!(ServerError::Internal("oops".into()).is_server_error());
        assert!(!ServerError::InvalidRequest("bad".into()).is_server_error());
    }

    #[test]
    fn store_errors_map_by_kind() {
        assert_eq!(ServerError::from(CoreError::not_found("Foo")).status(), 404);
        assert_eq!(
            ServerError::from(CoreError::invalid_metadata("Foo", "not an object")).status(),
            400
        );
        assert_eq!(
            ServerError::from(CoreError::migration_failed(2, "index", "boom")).status(),
            500
        );
        assert_eq!(ServerError::from(CoreError::cancelled("deadline")).status(), 500);
    }

    #[test]
    fn corrupt_rows_are_server_faults() {
        let err = ServerError::from(CoreError::corrupt_row("Foo", "stored metadata is an array"));
        assert_eq!(err.status(), 500);
        assert!(err.is_server_error());
        assert_eq!(err.public_detail(), None);
    }

    #[test]
    fn credential_mismatches_look_alike() {
        let unknown = ServerError::from(CredentialError::NotFound);
        let wrong = ServerError::from(CredentialError::InvalidCredential);
        assert_eq!(unknown.status(), 401);
        assert_eq!(wrong.status(), 401);
        assert_eq!(unknown.public_detail(), None);
        assert_eq!(wrong.public_detail(), None);
    }

    #[test]
    fn server_errors_have_no_public_detail() {
        let err = ServerError::Internal("disk on fire".into());
        assert_eq!(err.public_detail(), None);
        assert_eq!(status_text(err.status()), "Internal Server Error");
    }
}
