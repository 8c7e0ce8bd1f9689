//! Asset download phase
//!
//! Every asset URL discovered while crawling pages is downloaded here, at most
//! `concurrency` at a time. Individual downloads may fail; the phase as a whole
//! cannot.

use crate::url::{is_http_scheme, local_asset_path, same_origin};
use reqwest::Client;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

/// Timeout for a single asset request
pub const ASSET_TIMEOUT: Duration = Duration::from_secs(15);

/// Why a single asset could not be saved
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("HTTP {status}")]
    Http { status: u16 },

    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Cannot write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Reason an asset was deliberately not downloaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Not http or https
    UnsupportedScheme,

    /// Foreign origin while external mirroring is disabled
    ExternalOrigin,
}

/// Outcome of one asset download
#[derive(Debug)]
pub enum AssetOutcome {
    Saved { url: Url, path: PathBuf, bytes: usize },
    Skipped { url: Url, reason: SkipReason },
    Failed { url: Url, error: AssetError },
}

/// Counters produced by the asset phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssetReport {
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl AssetReport {
    fn record(&mut self, outcome: &AssetOutcome) {
        match outcome {
            AssetOutcome::Saved { url, path, bytes } => {
                tracing::debug!("Saved {} ({} bytes) as {}", url, bytes, path.display());
                self.downloaded += 1;
            }
            AssetOutcome::Skipped { url, reason } => {
                tracing::trace!("Skipped asset {} ({:?})", url, reason);
                self.skipped += 1;
            }
            AssetOutcome::Failed { url, error } => {
                tracing::warn!("Failed to download asset {}: {}", url, error);
                self.failed += 1;
            }
        }
    }
}

/// Downloads discovered assets into `<out_dir>/assets`
pub struct AssetFetcher {
    client: Client,
    out_dir: PathBuf,

    /// Root URL of the crawl, used for the same-origin check
    root: Url,

    mirror_external: bool,
    concurrency: usize,
}

impl AssetFetcher {
    /// Creates a fetcher
    ///
    /// # Arguments
    ///
    /// * `client` - HTTP client carrying the crawler's user agent
    /// * `out_dir` - Output root; files land in its `assets/` directory
    /// * `root` - Root URL of the crawl
    /// * `mirror_external` - Whether to download assets from other origins
    /// * `concurrency` - Maximum simultaneous downloads (at least 1)
    pub fn new(
        client: Client,
        out_dir: PathBuf,
        root: Url,
        mirror_external: bool,
        concurrency: usize,
    ) -> Self {
        Self {
            client,
            out_dir,
            root,
            mirror_external,
            concurrency: concurrency.max(1),
        }
    }

    /// Returns why `url` would be skipped, or `None` when it should be fetched
    pub fn skip_reason(&self, url: &Url) -> Option<SkipReason> {
        if !is_http_scheme(url) {
            return Some(SkipReason::UnsupportedScheme);
        }
        if !self.mirror_external && !same_origin(url, &self.root) {
            return Some(SkipReason::ExternalOrigin);
        }
        None
    }

    /// Downloads every asset in `assets`
    ///
    /// At most `concurrency` requests are in flight at any instant; the rest
    /// wait for a permit. Failures are logged and counted, never propagated.
    pub async fn fetch_all(&self, assets: BTreeSet<Url>) -> AssetReport {
        let mut report = AssetReport::default();
        if assets.is_empty() {
            return report;
        }

        tracing::info!(
            "Downloading up to {} assets ({} at a time)",
            assets.len(),
            self.concurrency
        );

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for url in assets {
            if let Some(reason) = self.skip_reason(&url) {
                report.record(&AssetOutcome::Skipped { url, reason });
                continue;
            }

            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    tracing::error!("Asset download pool closed: {}", e);
                    break;
                }
            };

            let client = self.client.clone();
            let out_dir = self.out_dir.clone();
            tasks.spawn(async move {
                let outcome = match download_asset(&client, &url, &out_dir).await {
                    Ok((path, bytes)) => AssetOutcome::Saved { url, path, bytes },
                    Err(error) => AssetOutcome::Failed { url, error },
                };
                drop(permit);
                outcome
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => report.record(&outcome),
                Err(e) => {
                    tracing::error!("Asset download task failed: {}", e);
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            "Assets: {} downloaded, {} failed, {} skipped",
            report.downloaded,
            report.failed,
            report.skipped
        );

        report
    }
}

/// Fetches one asset and writes it to its content-addressed path
async fn download_asset(
    client: &Client,
    url: &Url,
    out_dir: &Path,
) -> Result<(PathBuf, usize), AssetError> {
    let response = client
        .get(url.as_str())
        .timeout(ASSET_TIMEOUT)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(AssetError::Http {
            status: status.as_u16(),
        });
    }

    let body = response.bytes().await?;

    let path = local_asset_path(out_dir, url);
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| AssetError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
    }
    tokio::fs::write(&path, &body)
        .await
        .map_err(|source| AssetError::Io {
            path: path.clone(),
            source,
        })?;

    Ok((path, body.len()))
}
