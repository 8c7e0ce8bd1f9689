use serde::Deserialize;
use std::path::PathBuf;
use url::Url;

/// Main configuration structure for Sumi-Mirror
///
/// Every section and key is optional; a missing file is equivalent to
/// `Config::default()`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Maximum number of distinct pages visited per clone
    pub max_pages: usize,

    /// Maximum number of simultaneous asset downloads
    pub concurrency: usize,

    /// Whether robots.txt rules and crawl delay are honored
    pub respect_robots: bool,

    /// Whether assets hosted on other origins are downloaded
    pub mirror_external_assets: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: 10,
            concurrency: 8,
            respect_robots: true,
            mirror_external_assets: true,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct UserAgentConfig {
    /// Name of the crawler, also used as the robots.txt identity
    pub crawler_name: String,

    /// Version of the crawler
    pub crawler_version: String,

    /// URL with information about the crawler
    pub contact_url: Option<String>,

    /// Email address for crawler-related contact
    pub contact_email: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "SumiMirror".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
            contact_email: None,
        }
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// `Name/Version`, followed by `(+ContactURL; ContactEmail)` when any contact
    /// information is configured.
    pub fn header_value(&self) -> String {
        let base = format!("{}/{}", self.crawler_name, self.crawler_version);
        match (&self.contact_url, &self.contact_email) {
            (Some(url), Some(email)) => format!("{} (+{}; {})", base, url, email),
            (Some(url), None) => format!("{} (+{})", base, url),
            (None, Some(email)) => format!("{} ({})", base, email),
            (None, None) => base,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Parent directory for per-site clones when `out_dir` is unset
    pub base_dir: PathBuf,

    /// Explicit output root; takes precedence over `base_dir`
    pub out_dir: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("clones"),
            out_dir: None,
        }
    }
}

impl OutputConfig {
    /// Resolves the output root for a clone of `target`
    ///
    /// Uses `out_dir` verbatim when set, otherwise `<base_dir>/<host>` (with the
    /// port appended as `_<port>` when the URL carries one).
    pub fn resolve(&self, target: &Url) -> PathBuf {
        if let Some(dir) = &self.out_dir {
            return dir.clone();
        }

        let host = target.host_str().unwrap_or("site").to_lowercase();
        let name = match target.port() {
            Some(port) => format!("{}_{}", host, port),
            None => host,
        };
        self.base_dir.join(name)
    }
}
