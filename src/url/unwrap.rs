//! Recovery of original resource URLs from transformation wrappers
//!
//! Image optimization endpoints such as Next.js' `/_next/image?url=...&w=640`
//! serve a resized copy of another resource. When mirroring, the original
//! resource is what should be downloaded, so each wrapper scheme is described
//! by a [`ResourceUnwrapper`] rule.

use thiserror::Error;
use url::Url;

/// Errors raised when a wrapper is recognized but its payload is unusable
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UnwrapError {
    #[error("{rule}: '{param}' parameter is empty")]
    EmptyPayload { rule: String, param: String },

    #[error("{rule}: cannot resolve embedded URL '{value}': {message}")]
    InvalidPayload {
        rule: String,
        value: String,
        message: String,
    },
}

/// A rule that recognizes a resource-wrapping URL scheme
pub trait ResourceUnwrapper: Send + Sync {
    /// Short name used in log messages
    fn name(&self) -> &str;

    /// Attempts to recover the wrapped resource URL
    ///
    /// # Returns
    ///
    /// * `None` - `candidate` is not wrapped by this rule
    /// * `Some(Ok(url))` - The original resource URL
    /// * `Some(Err(_))` - The wrapper matched but its payload is malformed
    fn unwrap(&self, candidate: &Url, page_url: &Url) -> Option<Result<Url, UnwrapError>>;
}

/// Unwraps URLs whose path contains a marker and whose query carries the
/// original resource in a single parameter
#[derive(Debug, Clone)]
pub struct QueryParamUnwrapper {
    name: String,
    path_marker: String,
    param: String,
}

impl QueryParamUnwrapper {
    pub fn new(
        name: impl Into<String>,
        path_marker: impl Into<String>,
        param: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            path_marker: path_marker.into(),
            param: param.into(),
        }
    }
}

impl ResourceUnwrapper for QueryParamUnwrapper {
    fn name(&self) -> &str {
        &self.name
    }

    fn unwrap(&self, candidate: &Url, page_url: &Url) -> Option<Result<Url, UnwrapError>> {
        if !candidate.path().contains(&self.path_marker) {
            return None;
        }

        let value = candidate
            .query_pairs()
            .find(|(key, _)| key == self.param.as_str())
            .map(|(_, value)| value.into_owned())?;

        let value = value.trim();
        if value.is_empty() {
            return Some(Err(UnwrapError::EmptyPayload {
                rule: self.name.clone(),
                param: self.param.clone(),
            }));
        }

        Some(
            page_url
                .join(value)
                .map_err(|e| UnwrapError::InvalidPayload {
                    rule: self.name.clone(),
                    value: value.to_string(),
                    message: e.to_string(),
                }),
        )
    }
}

/// The built-in wrapper rules: Next.js and Vercel image optimization
pub fn default_unwrappers() -> Vec<Box<dyn ResourceUnwrapper>> {
    vec![
        Box::new(QueryParamUnwrapper::new("next-image", "/_next/image", "url")),
        Box::new(QueryParamUnwrapper::new("vercel-image", "/_vercel/image", "url")),
    ]
}

/// Runs `candidate` through `rules`, returning the first match
pub fn unwrap_resource(
    rules: &[Box<dyn ResourceUnwrapper>],
    candidate: &Url,
    page_url: &Url,
) -> Option<Result<Url, UnwrapError>> {
    rules.iter().find_map(|rule| rule.unwrap(candidate, page_url))
}
