//! Path routing for the TiddlyWeb endpoints.

use crate::error::{ServerError, ServerResult};
use crate::http::Method;
use percent_encoding::percent_decode_str;

const TIDDLER_PREFIX: &str = "/recipes/default/tiddlers/";
const LIST_PATH: &str = "/recipes/default/tiddlers.json";
const BAG_PREFIXES: [&str; 2] = ["/bags/default/tiddlers/", "/bags/bag/tiddlers/"];

const GET: &[Method] = &[Method::Get];
const GET_PUT: &[Method] = &[Method::Get, Method::Put];
const GET_POST: &[Method] = &[Method::Get, Method::Post];
const POST: &[Method] = &[Method::Post];
const DELETE: &[Method] = &[Method::Delete];

/// A recognised endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/recipes/default/tiddlers/{title}`: GET or PUT.
    Tiddler(String),
    /// `/bags/{default|bag}/tiddlers/{title}`: DELETE.
    BagTiddler(String),
    /// `/recipes/default/tiddlers.json`: GET.
    List,
    /// `/status`: GET.
    Status,
    /// `/login/`: POST.
    Login,
    /// `/logout/`: GET or POST.
    Logout,
}

impl Route {
    /// Matches a raw path. Titles are percent-decoded.
    ///
    /// Returns `Ok(None)` for paths no route claims.
    pub fn parse(path: &str) -> ServerResult<Option<Self>> {
        let route = match path {
            LIST_PATH => Route::List,
            "/status" => Route::Status,
            "/login/" | "/login" => Route::Login,
            "/logout/" | "/logout" => Route::Logout,
            _ => {
                if let Some(raw) = path.strip_prefix(TIDDLER_PREFIX) {
                    Route::Tiddler(decode_title(raw)?)
                } else if let Some(raw) = BAG_PREFIXES.iter().find_map(|p| path.strip_prefix(p)) {
                    Route::BagTiddler(decode_title(raw)?)
                } else {
                    return Ok(None);
                }
            }
        };
        Ok(Some(route))
    }

    /// Methods this route answers to.
    pub fn allowed(&self) -> &'static [Method] {
        match self {
            Route::Tiddler(_) => GET_PUT,
            Route::BagTiddler(_) => DELETE,
            Route::List | Route::Status => GET,
            Route::Login => POST,
            Route::Logout => GET_POST,
        }
    }

    /// Whether the route is served without a session.
    pub fn is_public(&self) -> bool {
        matches!(self, Route::Login | Route::Logout)
    }
}

fn decode_title(raw: &str) -> ServerResult<String> {
    if raw.is_empty() {
        return Err(ServerError::InvalidRequest("title is required".into()));
    }
    percent_decode_str(raw)
        .decode_utf8()
        .map(|title| title.into_owned())
        .map_err(|_| ServerError::InvalidRequest("title is not valid UTF-8".into()))
}
