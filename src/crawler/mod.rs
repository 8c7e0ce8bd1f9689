//! Crawler module for cloning a website
//!
//! This module contains the clone pipeline, including:
//! - HTTP fetching with per-request timeouts
//! - Rewriting documents to reference local copies
//! - Serial page crawling under a budget and robots.txt
//! - Bounded-concurrency asset downloads
//! - Overall clone coordination

mod assets;
mod coordinator;
mod fetcher;
mod rewriter;
mod scheduler;

pub use assets::{AssetError, AssetFetcher, AssetOutcome, AssetReport, SkipReason, ASSET_TIMEOUT};
pub use coordinator::{clone_site, Coordinator};
pub use fetcher::{build_http_client, fetch_page, FetchResult, PAGE_TIMEOUT};
pub use rewriter::{
    DocumentRewriter, RewriteError, RewriteRule, RewriteStrategy, RewrittenDocument,
    REWRITE_RULES,
};
pub use scheduler::{CrawlReport, Scheduler};
