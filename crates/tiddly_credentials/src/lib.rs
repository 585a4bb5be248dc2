//! # Tiddly Credentials
//!
//! Sign-in support for the tiddly server.
//!
//! This crate provides:
//! - User lookup and bcrypt password checks with a server-wide pepper
//! - Remember tokens for cookie sessions, one per signed-in device
//! - Whole-collection JSON persistence for users and tokens
//!
//! Users are created out of band (see the `tiddly add-user` command) and are
//! read-only while the server runs. Tokens are created on sign-in and
//! removed on sign-out; there is no server-side expiry.
//!
//! Every mutation rewrites its whole collection file. That is fine for a
//! single-user server and would need per-record storage to scale further.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod collection;
mod config;
mod error;
pub mod secret;
mod store;
mod user;

pub use config::{CredentialConfig, DEFAULT_BCRYPT_COST, TOKENS_FILE, USERS_FILE};
pub use error::{CredentialError, CredentialResult};
pub use secret::{generate_pepper, generate_token, hash_password, verify_password, MAX_HASH_INPUT};
pub use store::CredentialStore;
pub use user::{User, UserToken};
