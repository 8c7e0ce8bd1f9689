//! Storage traits and error types
//!
//! This module defines the interface for persisting clone provenance and
//! detecting previously produced clones.

use crate::output::{CloneResult, CloneStatistics};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Provenance record written next to a clone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneMetadata {
    /// URL the clone was made from
    pub source_url: String,

    /// Host of the source URL
    pub domain: String,

    /// When the clone finished
    pub cloned_at: DateTime<Utc>,

    /// Statistics of the clone
    pub statistics: CloneStatistics,

    /// Version of the tool that produced the clone
    pub version: String,
}

impl CloneMetadata {
    /// Builds the provenance record for a finished clone
    pub fn from_result(result: &CloneResult) -> Self {
        Self {
            source_url: result.source_url.to_string(),
            domain: crate::url::extract_domain(&result.source_url).unwrap_or_default(),
            cloned_at: Utc::now(),
            statistics: result.statistics.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// A usable clone found on disk
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistingClone {
    /// Directory holding the clone
    pub path: PathBuf,

    /// When the clone was made; unknown for legacy clones
    pub cloned_at: Option<DateTime<Utc>>,

    /// Recorded source URL; unknown for legacy clones
    pub source_url: Option<String>,

    /// Recorded statistics; unknown for legacy clones
    pub statistics: Option<CloneStatistics>,

    /// True when the directory has pages but no metadata file
    pub is_legacy: bool,
}

/// Trait for clone metadata backends
pub trait MetadataStore {
    /// Looks for a previous clone of `source_url` in `dir`
    ///
    /// # Returns
    ///
    /// * `Some(ExistingClone)` - Metadata for the same source, or a legacy clone
    /// * `None` - No usable prior clone (including metadata for another URL)
    fn find_existing(&self, dir: &Path, source_url: &Url) -> Option<ExistingClone>;

    /// Persists provenance for a finished clone into `dir`
    fn save(&self, dir: &Path, result: &CloneResult) -> StorageResult<CloneMetadata>;
}
