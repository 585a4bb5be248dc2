//! Whole-collection JSON files.
//!
//! A collection is one JSON array in one file. Every save rewrites the whole
//! file: the array is written to `<name>.tmp`, synced, and renamed over the
//! original, so a crash leaves either the old or the new collection.

use crate::error::{CredentialError, CredentialResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// How a missing file is treated on load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WhenMissing {
    /// A missing file is an empty collection.
    Empty,
    /// A missing file is a storage error.
    Fail,
}

/// A JSON array of `T` persisted in a single file.
#[derive(Debug)]
pub(crate) struct JsonCollection<T> {
    path: PathBuf,
    when_missing: WhenMissing,
    _items: PhantomData<fn() -> T>,
}

impl<T> JsonCollection<T>
where
    T: Serialize + DeserializeOwned,
{
    pub(crate) fn new(path: PathBuf, when_missing: WhenMissing) -> Self {
        Self {
            path,
            when_missing,
            _items: PhantomData,
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the collection, applying this collection's missing-file rule.
    pub(crate) fn load(&self) -> CredentialResult<Vec<T>> {
        self.load_or(self.when_missing)
    }

    /// Loads the collection, applying `when_missing`.
    pub(crate) fn load_or(&self, when_missing: WhenMissing) -> CredentialResult<Vec<T>> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound && when_missing == WhenMissing::Empty => {
                return Ok(Vec::new());
            }
            Err(e) => return Err(CredentialError::storage(&self.path, e.to_string())),
        };

        serde_json::from_slice(&data)
            .map_err(|e| CredentialError::storage(&self.path, format!("parse: {e}")))
    }

    /// Replaces the collection on disk.
    pub(crate) fn save(&self, items: &[T]) -> CredentialResult<()> {
        let data = serde_json::to_vec_pretty(items)
            .map_err(|e| CredentialError::storage(&self.path, format!("encode: {e}")))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| CredentialError::storage(&self.path, e.to_string()))?;
            }
        }

        let temp_path = self.temp_path();
        let write = || -> std::io::Result<()> {
            let mut file = File::create(&temp_path)?;
            file.write_all(&data)?;
            file.sync_all()?;
            drop(file);
            fs::rename(&temp_path, &self.path)
        };
        write().map_err(|e| CredentialError::storage(&self.path, e.to_string()))
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
