//! Robots.txt parser implementation
//!
//! Only `User-agent`, `Disallow` and `Crawl-delay` are interpreted. Lines are
//! attributed to the block that is active when they are read; a block is
//! active when its `User-agent` line names `*` or our own crawler.

use std::time::Duration;
use url::Url;

/// Parsed robots.txt rules for one origin
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RobotsPolicy {
    /// Disallowed path prefixes, in file order
    disallowed_paths: Vec<String>,

    /// Delay between page requests, in seconds
    crawl_delay: u64,
}

impl RobotsPolicy {
    /// Creates a permissive policy that allows everything with no delay
    ///
    /// This is used as the default when robots.txt cannot be fetched.
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Parses robots.txt content for the given crawler identity
    ///
    /// # Arguments
    ///
    /// * `content` - The raw robots.txt file content
    /// * `agent` - Our crawler's name, compared case-insensitively
    pub fn parse(content: &str, agent: &str) -> Self {
        let mut policy = Self::default();
        let mut active = false;

        for line in content.lines() {
            // Strip comments
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }

            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    active = value == "*" || value.eq_ignore_ascii_case(agent);
                }
                "disallow" if active => {
                    // An empty Disallow means "disallow nothing"
                    if !value.is_empty() {
                        policy.disallowed_paths.push(value.to_string());
                    }
                }
                "crawl-delay" if active => {
                    policy.crawl_delay = parse_delay(value);
                }
                _ => {}
            }
        }

        policy
    }

    /// Builds a policy directly from its parts
    pub fn new(disallowed_paths: Vec<String>, crawl_delay: u64) -> Self {
        Self {
            disallowed_paths,
            crawl_delay,
        }
    }

    /// The disallowed path patterns, in file order
    pub fn disallowed_paths(&self) -> &[String] {
        &self.disallowed_paths
    }

    /// Crawl delay in whole seconds
    pub fn crawl_delay_secs(&self) -> u64 {
        self.crawl_delay
    }

    /// Crawl delay as a `Duration`
    pub fn crawl_delay(&self) -> Duration {
        Duration::from_secs(self.crawl_delay)
    }

    /// Returns true when `path` matches a disallow pattern
    ///
    /// A path is disallowed when it equals a pattern, continues a pattern with
    /// `/`, or starts with the prefix of a pattern ending in `*`. Patterns that
    /// already end in `/` match everything beneath them.
    pub fn is_path_disallowed(&self, path: &str) -> bool {
        self.disallowed_paths.iter().any(|pattern| {
            if let Some(prefix) = pattern.strip_suffix('*') {
                path.starts_with(prefix)
            } else if pattern.ends_with('/') {
                // `/private/` already names a directory; `Disallow: /` must block the site
                path.starts_with(pattern.as_str())
            } else {
                path == pattern
                    || path
                        .strip_prefix(pattern.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            }
        })
    }

    /// Returns true when the URL's path may be crawled
    pub fn is_allowed(&self, url: &Url) -> bool {
        !self.is_path_disallowed(url.path())
    }
}

/// Parses a Crawl-delay value, keeping the whole-second part
///
/// Only the leading number counts, so `5s` is 5 seconds. Values without a
/// leading number are 0.
fn parse_delay(value: &str) -> u64 {
    let end = value
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(value.len());

    value[..end]
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d >= 0.0)
        .map(|d| d.trunc() as u64)
        .unwrap_or(0)
}
