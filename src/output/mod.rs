//! Output module for clone results
//!
//! This module handles:
//! - The structured result of a clone operation
//! - Clone statistics and their console rendering

pub mod stats;

pub use stats::{print_statistics, CloneStatistics};

use serde::Serialize;
use std::path::PathBuf;
use url::Url;

/// Result of one clone invocation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneResult {
    /// Output root the site was written to
    pub output_path: PathBuf,

    /// The validated URL the clone started from
    pub source_url: Url,

    /// Completeness report
    pub statistics: CloneStatistics,
}
