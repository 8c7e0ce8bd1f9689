//! Mapping of URLs onto the output directory
//!
//! Pages and assets live in disjoint namespaces: pages mirror the site's path
//! hierarchy, assets are flattened into a single `assets/` directory and named
//! by a short hash of their source URL.

use crate::url::normalize::{has_extension, last_segment};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use url::Url;

/// Directory (relative to the output root) holding every downloaded asset
pub const ASSETS_DIR: &str = "assets";

/// Number of hex characters of the URL hash prefixed to asset names
const HASH_LEN: usize = 6;

/// Longest flattened basename kept; longer names keep their tail
const MAX_BASENAME_LEN: usize = 120;

/// Maps a page URL to the HTML file it is saved as
///
/// Query and fragment are ignored. Paths ending in `/` gain `index.html`,
/// extensionless paths gain `/index.html`, anything else is used as-is.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use url::Url;
/// use sumi_mirror::url::page_path;
///
/// let root = Path::new("/out");
/// let url = Url::parse("https://example.com/about/").unwrap();
/// assert_eq!(page_path(root, &url), Path::new("/out/about/index.html"));
/// ```
pub fn page_path(out_root: &Path, url: &Url) -> PathBuf {
    let path = url.path();

    let file = if path.ends_with('/') {
        format!("{}index.html", path)
    } else if !has_extension(last_segment(path)) {
        format!("{}/index.html", path)
    } else {
        path.to_string()
    };

    let mut local = out_root.to_path_buf();
    for segment in file.split('/').filter(|s| is_safe_segment(s)) {
        local.push(segment);
    }
    local
}

/// Maps an asset URL to its path relative to the output root
///
/// The result is `assets/<hash>-<basename>`, where `<hash>` is the first six
/// hex characters of the SHA-256 of the full URL and `<basename>` is the URL's
/// path segments joined with `_` (or `asset` when the path is empty).
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_mirror::url::asset_path;
///
/// let url = Url::parse("https://cdn.test/img/logo.png").unwrap();
/// let path = asset_path(&url);
/// assert!(path.starts_with("assets"));
/// assert!(path.to_string_lossy().ends_with("-img_logo.png"));
/// ```
pub fn asset_path(url: &Url) -> PathBuf {
    Path::new(ASSETS_DIR).join(asset_file_name(url))
}

/// The root-absolute reference written into rewritten HTML for an asset
pub fn asset_href(url: &Url) -> String {
    format!("/{}/{}", ASSETS_DIR, asset_file_name(url))
}

/// Full on-disk location of an asset under `out_root`
pub fn local_asset_path(out_root: &Path, url: &Url) -> PathBuf {
    out_root.join(asset_path(url))
}

fn asset_file_name(url: &Url) -> String {
    format!("{}-{}", url_hash(url), flattened_basename(url))
}

fn url_hash(url: &Url) -> String {
    let digest = Sha256::digest(url.as_str().as_bytes());
    let mut encoded = hex::encode(digest);
    encoded.truncate(HASH_LEN);
    encoded
}

fn flattened_basename(url: &Url) -> String {
    let joined = url
        .path_segments()
        .map(|segments| {
            segments
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join("_")
        })
        .unwrap_or_default();

    let sanitized: String = joined
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let trimmed = sanitized.trim_start_matches('.');
    if trimmed.is_empty() {
        return "asset".to_string();
    }

    // Sanitized names are ASCII, so byte slicing is safe.
    if trimmed.len() > MAX_BASENAME_LEN {
        trimmed[trimmed.len() - MAX_BASENAME_LEN..].to_string()
    } else {
        trimmed.to_string()
    }
}

fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty() && segment != "." && segment != ".."
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_page_path_root() {
        let path = page_path(Path::new("out"), &url("https://example.com/"));
        assert_eq!(path, Path::new("out/index.html"));
    }

    #[test]
    fn test_page_path_directory() {
        let path = page_path(Path::new("out"), &url("https://example.com/about/"));
        assert_eq!(path, Path::new("out/about/index.html"));
    }

    #[test]
    fn test_page_path_extensionless() {
        let path = page_path(Path::new("out"), &url("https://example.com/docs/intro"));
        assert_eq!(path, Path::new("out/docs/intro/index.html"));
    }

    #[test]
    fn test_page_path_file() {
        let path = page_path(Path::new("out"), &url("https://example.com/a/page.html?x=1#f"));
        assert_eq!(path, Path::new("out/a/page.html"));
    }

    #[test]
    fn test_page_path_stays_under_root() {
        let path = page_path(Path::new("out"), &url("https://example.com/a/%2e%2e/b/"));
        assert!(path.starts_with("out"));
    }

    #[test]
    fn test_asset_path_format() {
        let path = asset_path(&url("https://cdn.test/logo.png"));
        let name = path.file_name().unwrap().to_string_lossy().to_string();

        assert_eq!(path.parent().unwrap(), Path::new("assets"));
        assert_eq!(name.len(), HASH_LEN + 1 + "logo.png".len());
        assert!(name[..HASH_LEN].chars().all(|c| c.is_ascii_hexdigit()));
        assert!(name.ends_with("-logo.png"));
    }

    #[test]
    fn test_asset_path_is_idempotent() {
        let a = asset_path(&url("https://example.com/css/site.css?v=3"));
        let b = asset_path(&url("https://example.com/css/site.css?v=3"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_asset_path_same_basename_different_urls() {
        let a = asset_path(&url("https://a.test/img/logo.png"));
        let b = asset_path(&url("https://b.test/img/logo.png"));
        let c = asset_path(&url("https://a.test/img/logo.png?v=2"));

        assert_ne!(a, b);
        assert_ne!(a, c);
        assert!(a.to_string_lossy().ends_with("img_logo.png"));
        assert!(b.to_string_lossy().ends_with("img_logo.png"));
    }

    #[test]
    fn test_asset_path_empty_path_falls_back() {
        let path = asset_path(&url("https://cdn.test/"));
        assert!(path.to_string_lossy().ends_with("-asset"));
    }

    #[test]
    fn test_asset_path_sanitizes() {
        let path = asset_path(&url("https://cdn.test/my%20file/(1).png"));
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')));
    }

    #[test]
    fn test_asset_path_long_names_truncated() {
        let long = "a".repeat(300);
        let path = asset_path(&url(&format!("https://cdn.test/{}.js", long)));
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert_eq!(name.len(), HASH_LEN + 1 + MAX_BASENAME_LEN);
        assert!(name.ends_with(".js"));
    }

    #[test]
    fn test_asset_href_matches_path() {
        let u = url("https://cdn.test/logo.png");
        let href = asset_href(&u);
        assert_eq!(
            href,
            format!("/{}", asset_path(&u).to_string_lossy().replace('\\', "/"))
        );
        assert_eq!(
            local_asset_path(Path::new("out"), &u),
            Path::new("out").join(asset_path(&u))
        );
    }
}
