//! Clone statistics and their console rendering

use serde::{Deserialize, Serialize};

/// Completeness report of a clone
///
/// A clone that returned at all "succeeded"; this record says how much of the
/// site actually made it to disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneStatistics {
    /// Pages rewritten and written to disk
    pub pages_cloned: usize,

    /// Assets successfully downloaded
    pub assets_downloaded: usize,

    /// Whether the crawl stopped because the page budget was exhausted
    pub max_pages_reached: bool,

    /// Whether robots.txt was honored
    pub robots_respected: bool,

    /// Visited pages that were not saved (fetch failure, non-HTML, HTTP error)
    #[serde(default)]
    pub pages_skipped: usize,

    /// Assets whose download failed
    #[serde(default)]
    pub assets_failed: usize,
}

/// Prints clone statistics in a human-readable format
pub fn print_statistics(stats: &CloneStatistics) {
    println!("=== Clone Statistics ===\n");

    println!("Pages:");
    println!("  Cloned: {}", stats.pages_cloned);
    println!("  Skipped: {}", stats.pages_skipped);
    println!(
        "  Page budget reached: {}",
        if stats.max_pages_reached { "yes" } else { "no" }
    );

    println!("\nAssets:");
    println!("  Downloaded: {}", stats.assets_downloaded);
    println!("  Failed: {}", stats.assets_failed);

    println!(
        "\nrobots.txt: {}",
        if stats.robots_respected {
            "respected"
        } else {
            "ignored"
        }
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_camel_case() {
        let stats = CloneStatistics {
            pages_cloned: 2,
            assets_downloaded: 1,
            max_pages_reached: false,
            robots_respected: true,
            pages_skipped: 0,
            assets_failed: 0,
        };
        let json = serde_json::to_value(&stats).unwrap();

        assert_eq!(json["pagesCloned"], 2);
        assert_eq!(json["assetsDownloaded"], 1);
        assert_eq!(json["maxPagesReached"], false);
        assert_eq!(json["robotsRespected"], true);
    }

    #[test]
    fn test_older_records_without_failure_counts() {
        let json = r#"{"pagesCloned":3,"assetsDownloaded":7,"maxPagesReached":true,"robotsRespected":false}"#;
        let stats: CloneStatistics = serde_json::from_str(json).unwrap();

        assert_eq!(stats.pages_cloned, 3);
        assert_eq!(stats.assets_downloaded, 7);
        assert_eq!(stats.pages_skipped, 0);
        assert_eq!(stats.assets_failed, 0);
    }
}
