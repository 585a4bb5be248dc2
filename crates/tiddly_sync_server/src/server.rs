//! Main sync server.

use crate::config::ServerConfig;
use crate::error::{status_text, ServerError, ServerResult};
use crate::handler::{HandlerContext, RequestHandler};
use crate::http::{Method, Request, Response};
use crate::route::Route;
use crate::session::{self, Session};
use std::sync::Arc;
use tiddly_core::{RequestContext, TiddlerStore};
use tiddly_credentials::CredentialStore;
use tracing::{debug, error};

/// The TiddlyWeb protocol adapter.
///
/// Routes requests, checks sessions, calls the stores and renders errors.
/// One instance is shared by every request thread.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use tiddly_core::TiddlerStore;
/// use tiddly_credentials::{CredentialConfig, CredentialStore};
/// use tiddly_sync_server::{Request, ServerConfig, SyncServer};
///
/// let store = Arc::new(TiddlerStore::open_in_memory().unwrap());
/// let credentials = Arc::new(CredentialStore::new(CredentialConfig::new(".", "pepper")));
/// let server = SyncServer::new(ServerConfig::default(), store, credentials);
///
/// // The HTTP layer builds a Request per incoming call.
/// let response = server.handle(&Request::get("/status"));
/// assert_eq!(response.status, 302);
/// ```
pub struct SyncServer {
    handler: RequestHandler,
    context: Arc<HandlerContext>,
}

impl SyncServer {
    /// Creates a new sync server over the given stores.
    pub fn new(
        config: ServerConfig,
        store: Arc<TiddlerStore>,
        credentials: Arc<CredentialStore>,
    ) -> Self {
        let context = Arc::new(HandlerContext::new(config, store, credentials));
        let handler = RequestHandler::new(Arc::clone(&context));

        Self { handler, context }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.context.config
    }

    /// Returns the tiddler store.
    pub fn store(&self) -> &Arc<TiddlerStore> {
        &self.context.store
    }

    /// Returns the credential store.
    pub fn credentials(&self) -> &Arc<CredentialStore> {
        &self.context.credentials
    }

    /// Handles a request under the configured request timeout, if any.
    pub fn handle(&self, request: &Request) -> Response {
        let ctx = match self.context.config.request_timeout {
            Some(timeout) => RequestContext::with_timeout(timeout),
            None => RequestContext::new(),
        };
        self.handle_with(&ctx, request)
    }

    /// Handles a request, honouring `ctx` in store calls.
    ///
    /// Never fails: every error becomes a response.
    pub fn handle_with(&self, ctx: &RequestContext, request: &Request) -> Response {
        let session = match session::resolve(&self.context.credentials, request) {
            Ok(session) => session,
            Err(e) => return self.error_response(request, &e, None),
        };

        match self.dispatch(ctx, request, session.as_ref()) {
            Ok(response) => {
                debug!(
                    method = %request.method,
                    path = %request.path,
                    status = response.status,
                    "request served"
                );
                response
            }
            Err(e) => self.error_response(request, &e, session.as_ref()),
        }
    }

    fn dispatch(
        &self,
        ctx: &RequestContext,
        request: &Request,
        session: Option<&Session>,
    ) -> ServerResult<Response> {
        let Some(route) = Route::parse(&request.path)? else {
            return Err(ServerError::NotFound(request.path.clone()));
        };

        if route.is_public() {
            return self.dispatch_public(&route, request);
        }
        let Some(session) = session else {
            return Ok(Response::redirect("/login/"));
        };

        if !route.allowed().contains(&request.method) {
            return Err(ServerError::MethodNotAllowed(request.method.to_string()));
        }

        match (&route, &request.method) {
            (Route::Tiddler(title), Method::Get) => self.handler.handle_get(ctx, title),
            (Route::Tiddler(title), Method::Put) => {
                self.handler.handle_put(ctx, title, &request.body)
            }
            (Route::BagTiddler(title), _) => self.handler.handle_delete(ctx, title),
            (Route::List, _) => self.handler.handle_list(ctx),
            (Route::Status, _) => self.handler.handle_status(session),
            _ => Err(ServerError::MethodNotAllowed(request.method.to_string())),
        }
    }

    fn dispatch_public(&self, route: &Route, request: &Request) -> ServerResult<Response> {
        if !route.allowed().contains(&request.method) {
            return Err(ServerError::MethodNotAllowed(request.method.to_string()));
        }
        match route {
            Route::Login => self.handler.handle_login(request),
            Route::Logout => self.handler.handle_logout(request),
            _ => Err(ServerError::Internal(format!("{route:?} is not public"))),
        }
    }

    /// Renders `err` as a plain-text response.
    ///
    /// Client errors show their status text and, for malformed requests, the
    /// reason. Server errors show only the status text unless the caller is
    /// signed in, in which case the error chain follows on the next line.
    fn error_response(
        &self,
        request: &Request,
        err: &ServerError,
        session: Option<&Session>,
    ) -> Response {
        let status = err.status();
        let mut body = status_text(status).to_string();

        if err.is_server_error() {
            error!(
                method = %request.method,
                path = %request.path,
                error = %err,
                "request failed"
            );
            if session.is_some() {
                body.push('\n');
                body.push_str(&err.to_string());
            }
        } else if let Some(detail) = err.public_detail() {
            body.push_str(": ");
            body.push_str(&detail);
        }

        let response = Response::text(status, body);
        match (status, route_methods(&request.path)) {
            (405, Some(methods)) => response.with_header("Allow", methods),
            _ => response,
        }
    }
}

fn route_methods(path: &str) -> Option<String> {
    let route = Route::parse(path).ok()??;
    let names: Vec<&str> = route.allowed().iter().map(Method::as_str).collect();
    Some(names.join(", "))
}
