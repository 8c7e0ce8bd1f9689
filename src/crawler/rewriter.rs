//! HTML rewriter that localizes a page's resource references
//!
//! Each fetched page is streamed through `lol_html` once. A fixed table of
//! [`RewriteRule`]s decides which elements are touched and how:
//! - images (`src`, `data-src`, `srcset`) and `<picture>` sources are pointed
//!   at their content-addressed copies under `/assets/`
//! - `<link href>` and `<script src>` likewise
//! - same-origin `<a href>` links are normalized to directory-style paths and
//!   reported as pages to crawl
//!
//! Every rewritten resource is reported back so the caller can download it.

use crate::url::{
    asset_href, normalize_page_url, same_origin, unwrap_resource, ResourceUnwrapper,
};
use lol_html::errors::RewritingError;
use lol_html::html_content::Element;
use lol_html::{element, HandlerResult, HtmlRewriter, Settings};
use std::cell::RefCell;
use thiserror::Error;
use url::Url;

/// Errors that abort the rewrite of a whole document
#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("HTML rewrite error: {0}")]
    Rewriting(#[from] RewritingError),

    #[error("Invalid UTF-8 in rewritten HTML: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// How an element matched by a rule is rewritten
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteStrategy {
    /// `src`, `data-src` and `srcset` with wrapper unwrapping; loading hints removed
    Image,
    /// `srcset` only, with wrapper unwrapping
    Srcset,
    /// A single attribute holding a stylesheet, script or other resource
    Resource { attribute: &'static str },
    /// An anchor to another page
    PageLink,
}

/// A `{selector, strategy}` pair of the rewrite table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewriteRule {
    pub selector: &'static str,
    pub strategy: RewriteStrategy,
}

/// The rewrite table, evaluated in this order for every element
pub const REWRITE_RULES: &[RewriteRule] = &[
    RewriteRule {
        selector: "img",
        strategy: RewriteStrategy::Image,
    },
    RewriteRule {
        selector: "picture source[srcset]",
        strategy: RewriteStrategy::Srcset,
    },
    RewriteRule {
        selector: "link[href]",
        strategy: RewriteStrategy::Resource { attribute: "href" },
    },
    RewriteRule {
        selector: "script[src]",
        strategy: RewriteStrategy::Resource { attribute: "src" },
    },
    RewriteRule {
        selector: "a[href]",
        strategy: RewriteStrategy::PageLink,
    },
];

/// Image attributes that only make sense when loading over the network
const TRANSIENT_IMAGE_HINTS: &[&str] = &["loading", "decoding"];

/// Link targets that are never rewritten nor followed
const SKIPPED_LINK_SCHEMES: &[&str] = &["mailto:", "tel:", "javascript:"];

/// A page after rewriting, with everything it referenced
#[derive(Debug, Clone, Default)]
pub struct RewrittenDocument {
    /// The rewritten markup
    pub html: String,

    /// Absolute asset URLs, in document order (may contain duplicates)
    pub assets: Vec<Url>,

    /// Normalized same-origin page URLs, in document order (may contain duplicates)
    pub pages: Vec<Url>,
}

#[derive(Debug, Default)]
struct Discoveries {
    assets: Vec<Url>,
    pages: Vec<Url>,
}

/// Rewrites documents of one site
pub struct DocumentRewriter<'a> {
    /// Root of the site; anchors on its origin are treated as internal
    root: Url,

    /// Wrapper schemes to unwrap on image references
    unwrappers: &'a [Box<dyn ResourceUnwrapper>],
}

impl<'a> DocumentRewriter<'a> {
    /// Creates a rewriter for the site rooted at `root`
    pub fn new(root: Url, unwrappers: &'a [Box<dyn ResourceUnwrapper>]) -> Self {
        Self { root, unwrappers }
    }

    /// Rewrites one HTML document fetched from `page_url`
    ///
    /// Per-element problems (unresolvable references, malformed wrappers) leave
    /// that reference untouched and are logged; only a failure of the HTML
    /// stream itself is an error.
    pub fn rewrite(&self, html: &str, page_url: &Url) -> Result<RewrittenDocument, RewriteError> {
        let found = RefCell::new(Discoveries::default());
        let mut output = Vec::with_capacity(html.len());

        {
            let handlers = REWRITE_RULES
                .iter()
                .map(|rule| {
                    let found = &found;
                    element!(rule.selector, move |el| {
                        self.apply(rule, el, page_url, &mut found.borrow_mut())
                    })
                })
                .collect();

            let mut rewriter = HtmlRewriter::new(
                Settings {
                    element_content_handlers: handlers,
                    ..Settings::default()
                },
                |c: &[u8]| output.extend_from_slice(c),
            );

            rewriter.write(html.as_bytes())?;
            rewriter.end()?;
        }

        let found = found.into_inner();
        Ok(RewrittenDocument {
            html: String::from_utf8(output)?,
            assets: found.assets,
            pages: found.pages,
        })
    }

    fn apply(
        &self,
        rule: &RewriteRule,
        el: &mut Element<'_, '_>,
        page_url: &Url,
        found: &mut Discoveries,
    ) -> HandlerResult {
        match rule.strategy {
            RewriteStrategy::Image => {
                for attribute in ["src", "data-src"] {
                    self.rewrite_image_attribute(el, attribute, page_url, found)?;
                }
                self.rewrite_srcset(el, page_url, found)?;
                for hint in TRANSIENT_IMAGE_HINTS {
                    el.remove_attribute(hint);
                }
                Ok(())
            }
            RewriteStrategy::Srcset => self.rewrite_srcset(el, page_url, found),
            RewriteStrategy::Resource { attribute } => {
                self.rewrite_resource(el, attribute, page_url, found)
            }
            RewriteStrategy::PageLink => self.rewrite_page_link(el, page_url, found),
        }
    }

    fn rewrite_image_attribute(
        &self,
        el: &mut Element<'_, '_>,
        attribute: &str,
        page_url: &Url,
        found: &mut Discoveries,
    ) -> HandlerResult {
        let Some(value) = el.get_attribute(attribute) else {
            return Ok(());
        };

        if let Some(asset) = self.resolve_image(&decode_entities(&value), page_url) {
            el.set_attribute(attribute, &asset_href(&asset))?;
            found.assets.push(asset);
        }
        Ok(())
    }

    fn rewrite_srcset(
        &self,
        el: &mut Element<'_, '_>,
        page_url: &Url,
        found: &mut Discoveries,
    ) -> HandlerResult {
        let Some(srcset) = el.get_attribute("srcset") else {
            return Ok(());
        };
        let srcset = decode_entities(&srcset);

        let mut entries = Vec::new();
        for (candidate, descriptor) in parse_srcset(&srcset) {
            let reference = match self.resolve_image(candidate, page_url) {
                Some(asset) => {
                    let href = asset_href(&asset);
                    found.assets.push(asset);
                    href
                }
                None => candidate.to_string(),
            };

            if descriptor.is_empty() {
                entries.push(reference);
            } else {
                entries.push(format!("{} {}", reference, descriptor));
            }
        }

        el.set_attribute("srcset", &entries.join(", "))?;
        Ok(())
    }

    fn rewrite_resource(
        &self,
        el: &mut Element<'_, '_>,
        attribute: &str,
        page_url: &Url,
        found: &mut Discoveries,
    ) -> HandlerResult {
        let Some(value) = el.get_attribute(attribute) else {
            return Ok(());
        };

        if let Some(asset) = resolve_reference(&decode_entities(&value), page_url) {
            el.set_attribute(attribute, &asset_href(&asset))?;
            found.assets.push(asset);
        }
        Ok(())
    }

    fn rewrite_page_link(
        &self,
        el: &mut Element<'_, '_>,
        page_url: &Url,
        found: &mut Discoveries,
    ) -> HandlerResult {
        let Some(href) = el.get_attribute("href") else {
            return Ok(());
        };

        let href = decode_entities(href.trim());
        if is_skipped_link(&href) {
            return Ok(());
        }

        let target = match page_url.join(&href) {
            Ok(target) => target,
            Err(e) => {
                tracing::debug!("Unresolvable link '{}' on {}: {}", href, page_url, e);
                return Ok(());
            }
        };

        // Foreign links stay as they are and are never crawled
        if !same_origin(&target, &self.root) {
            return Ok(());
        }

        let normalized = normalize_page_url(&target);
        el.set_attribute("href", normalized.path())?;
        found.pages.push(normalized);
        Ok(())
    }

    /// Resolves an image reference, unwrapping optimization wrappers
    fn resolve_image(&self, value: &str, page_url: &Url) -> Option<Url> {
        let candidate = resolve_reference(value, page_url)?;

        match unwrap_resource(self.unwrappers, &candidate, page_url) {
            Some(Ok(original)) => {
                tracing::trace!("Unwrapped {} to {}", candidate, original);
                Some(original)
            }
            Some(Err(e)) => {
                tracing::warn!("Leaving image reference on {} unrewritten: {}", page_url, e);
                None
            }
            None => Some(candidate),
        }
    }
}

/// Resolves a decoded resource reference against the page URL
///
/// Empty values and data URIs yield None.
fn resolve_reference(value: &str, page_url: &Url) -> Option<Url> {
    let value = value.trim();
    if value.is_empty() || is_data_uri(value) {
        return None;
    }

    match page_url.join(value) {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::debug!("Unresolvable reference '{}' on {}: {}", value, page_url, e);
            None
        }
    }
}

/// Attribute values arrive with character references still encoded
fn decode_entities(value: &str) -> String {
    html_escape::decode_html_entities(value).into_owned()
}

/// Splits a `srcset` value into `(url, descriptor)` candidates
///
/// A URL is a run of non-whitespace with trailing commas removed, so commas
/// inside a URL (a `data:` payload, for instance) never split it.
fn parse_srcset(srcset: &str) -> Vec<(&str, &str)> {
    let mut candidates = Vec::new();
    let mut rest = srcset;

    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ',');
        if rest.is_empty() {
            break;
        }

        let url_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let raw_url = &rest[..url_end];
        rest = &rest[url_end..];

        let url = raw_url.trim_end_matches(',');
        if url.len() < raw_url.len() {
            candidates.push((url, ""));
            continue;
        }

        let descriptor_end = rest.find(',').unwrap_or(rest.len());
        candidates.push((url, rest[..descriptor_end].trim()));
        rest = &rest[descriptor_end..];
    }

    candidates
}

fn is_data_uri(value: &str) -> bool {
    value
        .get(..5)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("data:"))
}

fn is_skipped_link(href: &str) -> bool {
    if href.starts_with('#') {
        return true;
    }
    let lower = href.to_ascii_lowercase();
    SKIPPED_LINK_SCHEMES
        .iter()
        .any(|scheme| lower.starts_with(scheme))
}
