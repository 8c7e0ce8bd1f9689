//! Robots.txt handling module
//!
//! This module fetches and parses the robots.txt of the site being cloned.
//! The policy is resolved once per clone and never cached across runs.

mod parser;

pub use parser::RobotsPolicy;

use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Timeout for the robots.txt request
pub const ROBOTS_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetches and parses robots.txt for the origin of `root`
///
/// Robots absence or unreachability is never fatal: any network failure,
/// timeout, non-success status or unreadable body yields
/// [`RobotsPolicy::allow_all`].
///
/// # Arguments
///
/// * `client` - HTTP client carrying our User-Agent header
/// * `root` - Any URL on the target origin
/// * `agent` - Our crawler's robots.txt identity
pub async fn fetch_robots(client: &Client, root: &Url, agent: &str) -> RobotsPolicy {
    let robots_url = match root.join("/robots.txt") {
        Ok(url) => url,
        Err(e) => {
            tracing::debug!("Cannot build robots.txt URL for {}: {}", root, e);
            return RobotsPolicy::allow_all();
        }
    };

    tracing::debug!("Fetching {}", robots_url);

    let response = match client
        .get(robots_url.as_str())
        .timeout(ROBOTS_TIMEOUT)
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!("robots.txt unreachable at {}: {}", robots_url, e);
            return RobotsPolicy::allow_all();
        }
    };

    if !response.status().is_success() {
        tracing::debug!(
            "robots.txt at {} returned HTTP {}, allowing all",
            robots_url,
            response.status().as_u16()
        );
        return RobotsPolicy::allow_all();
    }

    match response.text().await {
        Ok(body) => {
            let policy = RobotsPolicy::parse(&body, agent);
            tracing::info!(
                "robots.txt: {} disallow rule(s), crawl delay {}s",
                policy.disallowed_paths().len(),
                policy.crawl_delay_secs()
            );
            policy
        }
        Err(e) => {
            tracing::debug!("Failed to read robots.txt body from {}: {}", robots_url, e);
            RobotsPolicy::allow_all()
        }
    }
}
