//! Tiddler types.

use crate::error::{CoreError, CoreResult};
use serde_json::{Map, Value};
use std::fmt;

/// Caller-owned tiddler fields, kept in insertion order.
///
/// The store only touches the fields named by [`REVISION_FIELD`],
/// [`BAG_FIELD`] and (when missing) [`TITLE_FIELD`].
pub type Metadata = Map<String, Value>;

/// The bag every tiddler is written into.
pub const BAG: &str = "default";

/// Metadata field holding the revision.
pub const REVISION_FIELD: &str = "revision";
/// Metadata field holding the bag name.
pub const BAG_FIELD: &str = "bag";
/// Metadata field holding the title.
pub const TITLE_FIELD: &str = "title";
/// Body field on the wire. Never stored inside metadata.
pub const TEXT_FIELD: &str = "text";

/// Revision of a tiddler.
///
/// Revisions start at 1 and grow by exactly 1 on every write of a title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Revision(pub u64);

impl Revision {
    /// Revision assigned on the first write of a title.
    pub const FIRST: Revision = Revision(1);

    /// Creates a revision.
    #[must_use]
    pub const fn new(rev: u64) -> Self {
        Self(rev)
    }

    /// Returns the raw revision value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the revision that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored tiddler.
#[derive(Debug, Clone, PartialEq)]
pub struct Tiddler {
    /// Unique title.
    pub title: String,
    /// Current revision.
    pub revision: Revision,
    /// Metadata as stored, including `revision` and `bag`.
    pub meta: Metadata,
    /// Body text.
    pub text: String,
    /// Whether the title falls in a system namespace.
    pub is_system: bool,
}

impl Tiddler {
    /// Returns the metadata merged with the body under `text`.
    ///
    /// This is the shape the sync protocol returns for a single tiddler.
    #[must_use]
    pub fn to_fields(&self) -> Metadata {
        let mut fields = self.meta.clone();
        fields.insert(TEXT_FIELD.to_string(), Value::String(self.text.clone()));
        fields
    }
}

/// A tiddler as supplied by a writer, before the store assigns a revision.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TiddlerDraft {
    /// Caller metadata. `revision` and `bag` are overwritten on write.
    pub meta: Metadata,
    /// Body text.
    pub text: String,
}

impl TiddlerDraft {
    /// Creates a draft from metadata and text.
    #[must_use]
    pub fn new(meta: Metadata, text: impl Into<String>) -> Self {
        Self {
            meta,
            text: text.into(),
        }
    }

    /// Splits a wire object into metadata and text.
    ///
    /// `text` is removed from the metadata; it must be a string when present
    /// and defaults to empty when absent.
    pub fn from_fields(title: &str, mut fields: Metadata) -> CoreResult<Self> {
        let text = match fields.shift_remove(TEXT_FIELD) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(text)) => text,
            Some(other) => {
                return Err(CoreError::invalid_metadata(
                    title,
                    format!("field `text` must be a string, got {}", json_kind(&other)),
                ))
            }
        };
        Ok(Self { meta: fields, text })
    }

    /// Sets a metadata field.
    #[must_use]
    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.meta.insert(key.to_string(), value.into());
        self
    }
}

/// A listing entry: the raw metadata JSON exactly as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TiddlerSummary {
    /// Title of the tiddler.
    pub title: String,
    /// Stored metadata JSON, never re-parsed.
    pub raw_meta: String,
}

/// Joins listing entries into a JSON array without re-parsing them.
#[must_use]
pub fn join_summaries(summaries: &[TiddlerSummary]) -> String {
    let capacity = summaries.iter().map(|s| s.raw_meta.len() + 1).sum::<usize>() + 2;
    let mut out = String::with_capacity(capacity);
    out.push('[');
    for (i, summary) in summaries.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&summary.raw_meta);
    }
    out.push(']');
    out
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
