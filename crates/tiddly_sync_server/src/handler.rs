//! Request handlers for the TiddlyWeb endpoints.

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::etag::{self, EtagSeed};
use crate::http::{Request, Response};
use crate::session::{self, Session};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tiddly_core::{join_summaries, RequestContext, TiddlerDraft, TiddlerStore, BAG};
use tiddly_credentials::CredentialStore;
use time::OffsetDateTime;
use tracing::info;

/// Shared state for request handling.
pub struct HandlerContext {
    /// Server configuration.
    pub config: ServerConfig,
    /// Tiddler store (shared across all handlers).
    pub store: Arc<TiddlerStore>,
    /// Users and remember tokens.
    pub credentials: Arc<CredentialStore>,
    /// Listing ETag seed.
    pub etag_seed: EtagSeed,
}

impl HandlerContext {
    /// Creates a new handler context.
    pub fn new(
        config: ServerConfig,
        store: Arc<TiddlerStore>,
        credentials: Arc<CredentialStore>,
    ) -> Self {
        let etag_seed = EtagSeed::new(config.etag_refresh);
        Self {
            config,
            store,
            credentials,
            etag_seed,
        }
    }
}

#[derive(Serialize)]
struct StatusBody<'a> {
    username: &'a str,
    anonymous: bool,
    read_only: bool,
    space: Space,
    tiddlywiki_version: &'a str,
}

#[derive(Serialize)]
struct Space {
    recipe: &'static str,
}

/// Handler for TiddlyWeb requests.
///
/// Each method serves one endpoint once routing and session checks are done.
pub struct RequestHandler {
    context: Arc<HandlerContext>,
}

impl RequestHandler {
    /// Creates a new request handler.
    pub fn new(context: Arc<HandlerContext>) -> Self {
        Self { context }
    }

    /// Returns one tiddler as its fields merged with `text`.
    pub fn handle_get(&self, ctx: &RequestContext, title: &str) -> ServerResult<Response> {
        let tiddler = self.context.store.get_with(ctx, title)?;
        let body = serde_json::to_vec(&tiddler.to_fields())
            .map_err(|e| ServerError::Internal(format!("encode tiddler: {e}")))?;
        Ok(Response::json(body))
    }

    /// Stores a tiddler and answers with its new ETag.
    pub fn handle_put(
        &self,
        ctx: &RequestContext,
        title: &str,
        body: &[u8],
    ) -> ServerResult<Response> {
        let fields = match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(fields)) => fields,
            Ok(_) => {
                return Err(ServerError::InvalidRequest(
                    "tiddler body must be a JSON object".into(),
                ))
            }
            Err(e) => return Err(ServerError::InvalidRequest(format!("cannot read data: {e}"))),
        };

        let draft = TiddlerDraft::from_fields(title, fields)?;
        let revision = self.context.store.upsert_with(ctx, title, draft)?;
        self.context.etag_seed.invalidate();

        let digest = etag::digest_for(self.context.config.etag_mode, body);
        let tag = etag::format_etag(title, revision, digest.as_deref());

        Ok(Response::no_content()
            .with_header("Content-Type", "text/plain")
            .with_header("Etag", tag))
    }

    /// Deletes a tiddler. Absent titles succeed too.
    pub fn handle_delete(&self, ctx: &RequestContext, title: &str) -> ServerResult<Response> {
        let existed = self.context.store.delete_with(ctx, title)?;
        if existed {
            self.context.etag_seed.invalidate();
        }
        Ok(Response::no_content())
    }

    /// Lists every non-system tiddler's stored metadata.
    pub fn handle_list(&self, ctx: &RequestContext) -> ServerResult<Response> {
        let summaries = self.context.store.list_with(ctx)?;
        Ok(Response::json(join_summaries(&summaries))
            .with_header("Etag", self.context.etag_seed.header_value()))
    }

    /// Reports the server status for the signed-in user.
    pub fn handle_status(&self, session: &Session) -> ServerResult<Response> {
        let config = &self.context.config;
        let status = StatusBody {
            username: config
                .status_username
                .as_deref()
                .unwrap_or_else(|| session.username()),
            anonymous: false,
            read_only: false,
            space: Space { recipe: BAG },
            tiddlywiki_version: &config.tiddlywiki_version,
        };
        let body = serde_json::to_vec(&status)
            .map_err(|e| ServerError::Internal(format!("encode status: {e}")))?;
        Ok(Response::json(body))
    }

    /// Checks a sign-in form and sets the remember cookie.
    ///
    /// Unknown email and wrong password are the same `AuthenticationFailed`.
    pub fn handle_login(&self, request: &Request) -> ServerResult<Response> {
        let email = request.form_value("email").unwrap_or_default();
        if email.is_empty() {
            return Err(ServerError::InvalidRequest(
                "Email address is required.".into(),
            ));
        }
        let password = request.form_value("password").unwrap_or_default();
        if password.is_empty() {
            return Err(ServerError::InvalidRequest("Password is required.".into()));
        }

        let credentials = &self.context.credentials;
        let user = match credentials.authenticate(&email, &password) {
            Ok(user) => user,
            Err(e) if e.is_auth_failure() => {
                info!("sign-in rejected");
                return Err(ServerError::AuthenticationFailed);
            }
            Err(e) => return Err(e.into()),
        };

        let token = credentials.create_remember_token(&user)?;
        info!(email = %user.email, "signed in");

        let cookie = session::remember_cookie(
            &token,
            self.context.config.remember_for,
            OffsetDateTime::now_utc(),
        );
        Ok(Response::redirect("/").with_header("Set-Cookie", cookie))
    }

    /// Revokes the presented remember token, if any, and clears the cookie.
    pub fn handle_logout(&self, request: &Request) -> ServerResult<Response> {
        if let Some(token) = request
            .cookie(session::REMEMBER_COOKIE)
            .filter(|t| !t.is_empty())
        {
            self.context.credentials.clear_remember_token(token)?;
            info!("signed out");
        }
        Ok(Response::redirect("/login/").with_header("Set-Cookie", session::clearing_cookie()))
    }
}
