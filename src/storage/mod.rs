//! Storage module for clone provenance
//!
//! A clone directory carries a small JSON document describing where it came
//! from. This module writes it and uses it (or, for older clones, the mere
//! presence of `index.html`) to recognize clones that already exist.

mod json;
mod traits;

pub use json::{JsonMetadataStore, METADATA_FILE};
pub use traits::{CloneMetadata, ExistingClone, MetadataStore, StorageError, StorageResult};
