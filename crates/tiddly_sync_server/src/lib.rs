//! # Tiddly Sync Server
//!
//! TiddlyWeb protocol adapter for the tiddly store.
//!
//! This crate provides:
//! - Routing for the TiddlyWeb endpoints a TiddlyWiki client uses to sync
//! - Cookie sessions backed by remember tokens
//! - ETags for tiddler writes and the tiddler listing
//! - Error presentation that hides detail from anonymous callers
//! - The JSON configuration file
//!
//! # Architecture
//!
//! The adapter does not own a socket. An HTTP layer turns each incoming call
//! into a [`Request`], passes it to [`SyncServer::handle`] and writes the
//! [`Response`] back. `SyncServer` is `Sync` and meant to be shared behind an
//! `Arc` by every request thread.
//!
//! # Endpoints
//!
//! | request | response |
//! |---------|----------|
//! | `GET /recipes/default/tiddlers/{title}` | tiddler fields with `text` |
//! | `PUT /recipes/default/tiddlers/{title}` | 204 and `Etag` |
//! | `DELETE /bags/default/tiddlers/{title}` | 204 |
//! | `GET /recipes/default/tiddlers.json` | metadata of non-system tiddlers |
//! | `GET /status` | server status |
//! | `POST /login/` | 302 to `/` with the remember cookie |
//! | `GET /logout/` | 302 to `/login/` with an expired cookie |
//!
//! Every endpoint but login and logout redirects anonymous callers to
//! `/login/`.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod config;
mod error;
pub mod etag;
mod handler;
mod http;
mod route;
pub mod session;
mod server;

pub use config::{
    DatabaseSection, EtagMode, FileConfig, ServerConfig, CONFIG_FILE, DEFAULT_DATABASE,
    DEFAULT_PORT,
};
pub use error::{ServerError, ServerResult};
pub use etag::EtagSeed;
pub use handler::{HandlerContext, RequestHandler};
pub use http::{Method, Request, Response};
pub use route::Route;
pub use server::SyncServer;
pub use session::{Session, REMEMBER_COOKIE};
