//! # Tiddly Testkit
//!
//! Test utilities for the tiddly workspace.
//!
//! This crate provides:
//! - Temporary tiddler stores, in memory or on disk
//! - Credential directories seeded with a known user
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tiddly_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_store() {
//!     with_temp_store(|store| {
//!         store.upsert("Foo", draft("Foo", r#"{"text":"hi"}"#)).unwrap();
//!     });
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
