//! Entity tags.
//!
//! A tiddler ETag is `"<bag>/<title>/<revision>:<digest>"` with the title
//! form-escaped. The digest is empty unless [`EtagMode::ContentDigest`] is
//! configured.
//!
//! The listing has no per-tiddler identity, so it carries a seed that
//! changes whenever a write lands or the refresh interval passes.

use crate::config::EtagMode;
use parking_lot::Mutex;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tiddly_core::{Revision, BAG};

/// Bytes left alone by form escaping.
const FORM: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Escapes `s` for a query string: unreserved bytes pass, space becomes
/// `+`, everything else is `%XX`.
pub fn query_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for (i, part) in s.split(' ').enumerate() {
        if i > 0 {
            out.push('+');
        }
        out.extend(utf8_percent_encode(part, FORM));
    }
    out
}

/// Formats the ETag returned for a tiddler write.
pub fn format_etag(title: &str, revision: Revision, digest: Option<&str>) -> String {
    format!(
        "\"{BAG}/{}/{revision}:{}\"",
        query_escape(title),
        digest.unwrap_or_default()
    )
}

/// SHA-256 of `body`, lower-case hex.
pub fn content_digest(body: &[u8]) -> String {
    hex(&Sha256::digest(body))
}

/// Returns the digest `mode` calls for.
pub(crate) fn digest_for(mode: EtagMode, body: &[u8]) -> Option<String> {
    match mode {
        EtagMode::Weak => None,
        EtagMode::ContentDigest => Some(content_digest(body)),
    }
}

fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Time-derived tag for the tiddler listing.
///
/// The value is recomputed on first use after [`invalidate`](Self::invalidate)
/// or once it is older than the refresh interval.
#[derive(Debug)]
pub struct EtagSeed {
    refresh: Duration,
    state: Mutex<SeedState>,
}

#[derive(Debug)]
struct SeedState {
    value: Option<(Instant, String)>,
    generation: u64,
}

impl EtagSeed {
    /// Creates a seed that lives at most `refresh`.
    pub fn new(refresh: Duration) -> Self {
        Self {
            refresh,
            state: Mutex::new(SeedState {
                value: None,
                generation: 0,
            }),
        }
    }

    /// Returns the current seed, recomputing it if stale.
    pub fn current(&self) -> String {
        let mut state = self.state.lock();
        if let Some((computed_at, value)) = &state.value {
            if computed_at.elapsed() < self.refresh {
                return value.clone();
            }
        }

        state.generation += 1;
        let value = seed_value(state.generation);
        state.value = Some((Instant::now(), value.clone()));
        value
    }

    /// Returns the seed quoted for an `Etag` header.
    pub fn header_value(&self) -> String {
        format!("\"{}\"", self.current())
    }

    /// Forces the next [`current`](Self::current) to recompute.
    pub fn invalidate(&self) {
        self.state.lock().value = None;
    }
}

fn seed_value(generation: u64) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let mut hasher = Sha256::new();
    hasher.update(nanos.to_be_bytes());
    hasher.update(generation.to_be_bytes());
    hex(&hasher.finalize()[..16])
}
