//! Durable catalog document
//!
//! The accumulated `BookRecord` batch is serialized to a single JSON array in
//! production order. Re-running the crawl overwrites the document atomically
//! (write to a temp file, then rename) so the file is always one valid JSON
//! document; append-concatenation across runs would corrupt it.

use crate::catalog::record::BookRecord;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Catalog persistence errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Catalog IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Catalog serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Owns the write lifecycle of the on-disk catalog document
pub struct CatalogStore {
    path: PathBuf,
}

impl CatalogStore {
    /// Creates a store for the document at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the catalog document
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Saves the batch, preserving order, neither deduplicating nor merging
    ///
    /// The write is atomic: the document is serialized to a sibling temp file
    /// and renamed over the destination.
    pub fn save(&self, records: &[BookRecord]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_vec_pretty(records)?;

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, &json)?;
        fs::rename(&tmp_path, &self.path)?;

        Ok(())
    }

    /// Loads the catalog document back into memory
    pub fn load(&self) -> Result<Vec<BookRecord>, StoreError> {
        let content = fs::read_to_string(&self.path)?;
        let records = serde_json::from_str(&content)?;
        Ok(records)
    }
}
