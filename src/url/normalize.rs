use crate::UrlError;
use std::path::Path;
use url::Url;

/// Validates the URL a clone starts from
///
/// The target must parse as an absolute URL, use the `http` or `https`
/// scheme, and name a host. This runs before any I/O.
///
/// # Examples
///
/// ```
/// use sumi_mirror::url::validate_target_url;
///
/// assert!(validate_target_url("https://example.com/").is_ok());
/// assert!(validate_target_url("ftp://example.com/").is_err());
/// assert!(validate_target_url("not a url").is_err());
/// ```
pub fn validate_target_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if !is_http_scheme(&url) {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    Ok(url)
}

/// Normalizes a same-origin page URL for crawling and link rewriting
///
/// # Normalization Steps
///
/// 1. Remove the query string
/// 2. Remove the fragment
/// 3. Directory-style paths (last segment without an extension) gain a
///    trailing `/`
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_mirror::url::normalize_page_url;
///
/// let url = Url::parse("https://example.com/about?ref=nav#team").unwrap();
/// assert_eq!(normalize_page_url(&url).as_str(), "https://example.com/about/");
///
/// let url = Url::parse("https://example.com/docs/guide.html?x=1").unwrap();
/// assert_eq!(normalize_page_url(&url).as_str(), "https://example.com/docs/guide.html");
/// ```
pub fn normalize_page_url(url: &Url) -> Url {
    let mut normalized = url.clone();
    normalized.set_query(None);
    normalized.set_fragment(None);

    let path = normalized.path();
    if !path.ends_with('/') && !has_extension(last_segment(path)) {
        let directory = format!("{}/", path);
        normalized.set_path(&directory);
    }

    normalized
}

/// Returns true when the URL uses `http` or `https`
pub fn is_http_scheme(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

/// Returns the final `/`-separated segment of a path
pub(crate) fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or("")
}

/// Returns true when a path segment carries a file extension
pub(crate) fn has_extension(segment: &str) -> bool {
    Path::new(segment).extension().is_some()
}
