//! State module for tracking crawl progress
//!
//! This module provides the per-invocation state of a clone.
//!
//! # Components
//!
//! - `CrawlSession`: the page queue, the visited set and the discovered asset set

mod crawl_session;

// Re-export main types
pub use crawl_session::CrawlSession;
