//! JSON file implementation of the metadata store

use crate::output::CloneResult;
use crate::storage::traits::{
    CloneMetadata, ExistingClone, MetadataStore, StorageError, StorageResult,
};
use crate::url::normalize_page_url;
use std::path::{Path, PathBuf};
use url::Url;

/// File name of the metadata document inside a clone directory
pub const METADATA_FILE: &str = ".sumi-mirror.json";

/// Stores clone metadata as a pretty-printed JSON file in the clone directory
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonMetadataStore;

impl JsonMetadataStore {
    pub fn new() -> Self {
        Self
    }

    /// Path of the metadata file for a clone directory
    pub fn metadata_path(dir: &Path) -> PathBuf {
        dir.join(METADATA_FILE)
    }

    /// Reads the metadata file of `dir`
    ///
    /// # Returns
    ///
    /// * `Ok(Some(CloneMetadata))` - Metadata present and well-formed
    /// * `Ok(None)` - No metadata file
    /// * `Err(StorageError)` - File unreadable or malformed
    pub fn load(&self, dir: &Path) -> StorageResult<Option<CloneMetadata>> {
        let content = match std::fs::read_to_string(Self::metadata_path(dir)) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::Io(e)),
        };

        Ok(Some(serde_json::from_str(&content)?))
    }
}

impl MetadataStore for JsonMetadataStore {
    fn find_existing(&self, dir: &Path, source_url: &Url) -> Option<ExistingClone> {
        match self.load(dir) {
            Ok(Some(metadata)) => {
                if !same_source(&metadata.source_url, source_url) {
                    tracing::debug!(
                        "Clone in {} is of {}, not {}",
                        dir.display(),
                        metadata.source_url,
                        source_url
                    );
                    return None;
                }

                return Some(ExistingClone {
                    path: dir.to_path_buf(),
                    cloned_at: Some(metadata.cloned_at),
                    source_url: Some(metadata.source_url),
                    statistics: Some(metadata.statistics),
                    is_legacy: false,
                });
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!("Ignoring unreadable clone metadata in {}: {}", dir.display(), e);
            }
        }

        if dir.join("index.html").is_file() {
            return Some(ExistingClone {
                path: dir.to_path_buf(),
                cloned_at: None,
                source_url: None,
                statistics: None,
                is_legacy: true,
            });
        }

        None
    }

    fn save(&self, dir: &Path, result: &CloneResult) -> StorageResult<CloneMetadata> {
        let metadata = CloneMetadata::from_result(result);
        let json = serde_json::to_string_pretty(&metadata)?;

        std::fs::create_dir_all(dir)?;
        std::fs::write(Self::metadata_path(dir), json)?;

        tracing::debug!("Wrote clone metadata to {}", Self::metadata_path(dir).display());
        Ok(metadata)
    }
}

/// Compares a recorded source URL against the requested one
fn same_source(recorded: &str, requested: &Url) -> bool {
    match Url::parse(recorded) {
        Ok(recorded) => normalize_page_url(&recorded) == normalize_page_url(requested),
        Err(_) => recorded == requested.as_str(),
    }
}
