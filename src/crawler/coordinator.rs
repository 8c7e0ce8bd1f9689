//! Clone coordinator - orchestrates one website clone
//!
//! A clone runs in fixed order:
//! 1. Validate the target URL
//! 2. Clear and recreate the output directory
//! 3. Resolve robots.txt (when enabled)
//! 4. Crawl and rewrite pages
//! 5. Download every discovered asset
//! 6. Report statistics

use crate::config::Config;
use crate::crawler::assets::AssetFetcher;
use crate::crawler::fetcher::build_http_client;
use crate::crawler::rewriter::DocumentRewriter;
use crate::crawler::scheduler::Scheduler;
use crate::output::{CloneResult, CloneStatistics};
use crate::robots::fetch_robots;
use crate::state::CrawlSession;
use crate::storage::METADATA_FILE;
use crate::url::{default_unwrappers, normalize_page_url, validate_target_url, ResourceUnwrapper};
use crate::MirrorError;
use reqwest::Client;
use std::path::Path;

/// Main clone coordinator
///
/// Holds the configuration, a shared HTTP client and the resource unwrapping
/// rules. Every call to [`Coordinator::clone_site`] builds its own
/// [`CrawlSession`], so one coordinator can clone several sites.
pub struct Coordinator {
    config: Config,
    client: Client,
    unwrappers: Vec<Box<dyn ResourceUnwrapper>>,
}

impl Coordinator {
    /// Creates a coordinator with the default unwrapping rules
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to clone
    /// * `Err(MirrorError)` - The HTTP client could not be built
    pub fn new(config: Config) -> Result<Self, MirrorError> {
        Self::with_unwrappers(config, default_unwrappers())
    }

    /// Creates a coordinator with a custom set of resource unwrapping rules
    pub fn with_unwrappers(
        config: Config,
        unwrappers: Vec<Box<dyn ResourceUnwrapper>>,
    ) -> Result<Self, MirrorError> {
        let client = build_http_client(&config.user_agent)?;
        Ok(Self {
            config,
            client,
            unwrappers,
        })
    }

    /// The configuration this coordinator clones with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Clones `target` into the configured output directory
    ///
    /// # Returns
    ///
    /// * `Ok(CloneResult)` - The clone finished, possibly with missing pages or assets
    /// * `Err(MirrorError::UrlError)` - `target` is not an absolute http(s) URL
    /// * `Err(MirrorError::OutputDir)` - The output directory could not be prepared
    pub async fn clone_site(&self, target: &str) -> Result<CloneResult, MirrorError> {
        let source_url = validate_target_url(target)?;
        let root = normalize_page_url(&source_url);
        let out_dir = self.config.output.resolve(&source_url);
        let crawler = &self.config.crawler;

        tracing::info!("Cloning {} into {}", root, out_dir.display());
        prepare_output_dir(&out_dir).await?;

        let robots = if crawler.respect_robots {
            let policy =
                fetch_robots(&self.client, &root, &self.config.user_agent.crawler_name).await;
            tracing::info!(
                "robots.txt: {} disallowed paths, crawl delay {}s",
                policy.disallowed_paths().len(),
                policy.crawl_delay_secs()
            );
            Some(policy)
        } else {
            tracing::info!("Ignoring robots.txt");
            None
        };

        let rewriter = DocumentRewriter::new(root.clone(), &self.unwrappers);
        let mut session = CrawlSession::new(root);

        let crawl = Scheduler::new(
            &self.client,
            &rewriter,
            robots.as_ref(),
            &out_dir,
            crawler.max_pages,
        )
        .run(&mut session)
        .await;

        let assets = AssetFetcher::new(
            self.client.clone(),
            out_dir.clone(),
            session.root().clone(),
            crawler.mirror_external_assets,
            crawler.concurrency,
        )
        .fetch_all(session.take_assets())
        .await;

        let statistics = CloneStatistics {
            pages_cloned: crawl.pages_saved,
            assets_downloaded: assets.downloaded,
            max_pages_reached: crawl.max_pages_reached,
            robots_respected: crawler.respect_robots,
            pages_skipped: crawl.pages_skipped,
            assets_failed: assets.failed,
        };

        tracing::info!(
            "Clone of {} complete: {} pages, {} assets",
            source_url,
            statistics.pages_cloned,
            statistics.assets_downloaded
        );

        Ok(CloneResult {
            output_path: out_dir,
            source_url,
            statistics,
        })
    }
}

/// Clones `target` with `config`
///
/// Convenience wrapper building a one-off [`Coordinator`].
pub async fn clone_site(target: &str, config: &Config) -> Result<CloneResult, MirrorError> {
    Coordinator::new(config.clone())?.clone_site(target).await
}

/// Clears `path` if it exists and recreates it empty
///
/// Only empty directories and previous clones (metadata file or top-level
/// `index.html`) are cleared; any other non-empty directory is refused.
async fn prepare_output_dir(path: &Path) -> Result<(), MirrorError> {
    let output_dir_error = |source| MirrorError::OutputDir {
        path: path.to_path_buf(),
        source,
    };

    ensure_replaceable(path).await.map_err(output_dir_error)?;

    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => tracing::debug!("Cleared {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(output_dir_error(e)),
    }

    tokio::fs::create_dir_all(path)
        .await
        .map_err(output_dir_error)
}

/// Fails unless `path` is missing, empty, or holds a previous clone
async fn ensure_replaceable(path: &Path) -> std::io::Result<()> {
    let mut entries = match tokio::fs::read_dir(path).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };

    if entries.next_entry().await?.is_none() {
        return Ok(());
    }

    for marker in [METADATA_FILE, "index.html"] {
        if tokio::fs::metadata(path.join(marker)).await.is_ok() {
            return Ok(());
        }
    }

    Err(std::io::Error::new(
        std::io::ErrorKind::AlreadyExists,
        "directory is not empty and does not hold a previous clone",
    ))
}
