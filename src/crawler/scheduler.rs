//! Page crawl scheduler
//!
//! This module drives the page phase of a clone:
//! - Draining the session queue in FIFO order, one page at a time
//! - Enforcing the page budget
//! - Checking robots.txt before fetching and before enqueueing
//! - Honoring the robots.txt crawl delay between requests
//! - Writing rewritten pages to their mapped paths

use crate::crawler::fetcher::{fetch_page, FetchResult};
use crate::crawler::rewriter::DocumentRewriter;
use crate::robots::RobotsPolicy;
use crate::state::CrawlSession;
use crate::url::page_path;
use reqwest::Client;
use std::path::Path;
use url::Url;

/// Counters produced by a page crawl
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlReport {
    /// Pages rewritten and written to disk
    pub pages_saved: usize,

    /// Visited pages that produced no file (non-HTML, HTTP or network errors)
    pub pages_skipped: usize,

    /// Pages dequeued but never fetched because robots.txt disallows them
    pub pages_disallowed: usize,

    /// True when the crawl stopped because the page budget was used up
    pub max_pages_reached: bool,
}

/// What happened to a single visited page
#[derive(Debug)]
enum PageOutcome {
    Saved,
    Skipped,
}

/// Scheduler for the page phase of one clone
///
/// Pages are processed strictly serially: discovering links on page N+1 may
/// depend on page N having been rewritten, and the crawl delay is per site.
pub struct Scheduler<'a> {
    client: &'a Client,
    rewriter: &'a DocumentRewriter<'a>,

    /// `None` when robots.txt enforcement is disabled
    robots: Option<&'a RobotsPolicy>,

    out_dir: &'a Path,
    max_pages: usize,
}

impl<'a> Scheduler<'a> {
    /// Creates a scheduler writing pages under `out_dir`
    ///
    /// # Arguments
    ///
    /// * `client` - HTTP client carrying the crawler's user agent
    /// * `rewriter` - Rewriter for the site being cloned
    /// * `robots` - Policy to enforce, or `None` to ignore robots.txt
    /// * `out_dir` - Output root
    /// * `max_pages` - Page budget
    pub fn new(
        client: &'a Client,
        rewriter: &'a DocumentRewriter<'a>,
        robots: Option<&'a RobotsPolicy>,
        out_dir: &'a Path,
        max_pages: usize,
    ) -> Self {
        Self {
            client,
            rewriter,
            robots,
            out_dir,
            max_pages,
        }
    }

    /// Crawls pages until the queue drains or the budget is exhausted
    ///
    /// Both stop conditions are normal termination. Every per-page failure is
    /// logged and counted; none of them ends the crawl.
    pub async fn run(&self, session: &mut CrawlSession) -> CrawlReport {
        let mut report = CrawlReport::default();
        let mut fetched_any = false;

        while session.visited_count() < self.max_pages {
            let Some(url) = session.next_page() else {
                tracing::debug!("Page queue drained");
                break;
            };

            if session.is_visited(&url) {
                tracing::trace!("Already visited {}", url);
                continue;
            }

            if !self.is_allowed(&url) {
                tracing::info!("Skipping {} (disallowed by robots.txt)", url);
                report.pages_disallowed += 1;
                continue;
            }

            session.mark_visited(&url);

            if fetched_any {
                self.wait_crawl_delay().await;
            }
            fetched_any = true;

            match self.process_page(&url, session).await {
                PageOutcome::Saved => report.pages_saved += 1,
                PageOutcome::Skipped => report.pages_skipped += 1,
            }

            tracing::info!(
                "Progress: {}/{} pages visited, {} queued",
                session.visited_count(),
                self.max_pages,
                session.queue_len()
            );
        }

        report.max_pages_reached = session.visited_count() >= self.max_pages;
        if report.max_pages_reached {
            tracing::info!(
                "Page budget of {} reached with {} pages still queued",
                self.max_pages,
                session.queue_len()
            );
        }

        report
    }

    /// Fetches, rewrites and saves one page, feeding discoveries into the session
    async fn process_page(&self, url: &Url, session: &mut CrawlSession) -> PageOutcome {
        tracing::debug!("Fetching page {}", url);

        let body = match fetch_page(self.client, url).await {
            FetchResult::Success {
                final_url, body, ..
            } => {
                if final_url != url.as_str() {
                    tracing::debug!("{} redirected to {}", url, final_url);
                }
                body
            }
            FetchResult::ContentMismatch { content_type } => {
                tracing::info!("Skipping {} (not HTML: {})", url, content_type);
                return PageOutcome::Skipped;
            }
            FetchResult::HttpError { status_code } => {
                tracing::warn!("Skipping {} (HTTP {})", url, status_code);
                return PageOutcome::Skipped;
            }
            FetchResult::NetworkError { error, timed_out } => {
                if timed_out {
                    tracing::warn!("Skipping {} (timed out)", url);
                } else {
                    tracing::warn!("Skipping {} ({})", url, error);
                }
                return PageOutcome::Skipped;
            }
        };

        let document = match self.rewriter.rewrite(&body, url) {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!("Failed to rewrite {}: {}", url, e);
                return PageOutcome::Skipped;
            }
        };

        let path = page_path(self.out_dir, url);
        if let Err(e) = write_page(&path, &document.html).await {
            tracing::warn!("Failed to write {} to {}: {}", url, path.display(), e);
            return PageOutcome::Skipped;
        }
        tracing::debug!("Saved {} as {}", url, path.display());

        let mut new_assets = 0;
        for asset in document.assets {
            if session.register_asset(asset) {
                new_assets += 1;
            }
        }

        let mut new_pages = 0;
        for page in document.pages {
            if session.is_known(&page) {
                continue;
            }
            if !self.is_allowed(&page) {
                tracing::debug!("Not queueing {} (disallowed by robots.txt)", page);
                continue;
            }
            if session.enqueue(page) {
                new_pages += 1;
            }
        }

        tracing::debug!(
            "{}: {} new pages queued, {} new assets found",
            url,
            new_pages,
            new_assets
        );

        PageOutcome::Saved
    }

    fn is_allowed(&self, url: &Url) -> bool {
        self.robots.map_or(true, |policy| policy.is_allowed(url))
    }

    async fn wait_crawl_delay(&self) {
        let Some(policy) = self.robots else {
            return;
        };

        let delay = policy.crawl_delay();
        if !delay.is_zero() {
            tracing::debug!("Waiting {:?} (robots.txt crawl delay)", delay);
            tokio::time::sleep(delay).await;
        }
    }
}

async fn write_page(path: &Path, html: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, html).await
}
