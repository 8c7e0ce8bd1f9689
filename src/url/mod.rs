//! URL handling module for Sumi-Mirror
//!
//! This module provides target validation, page URL normalization, the
//! page/asset path mappers, and resource unwrapping rules.

mod domain;
mod normalize;
mod paths;
mod unwrap;

// Re-export main functions
pub use domain::{extract_domain, same_origin};
pub use normalize::{is_http_scheme, normalize_page_url, validate_target_url};
pub use paths::{asset_href, asset_path, local_asset_path, page_path, ASSETS_DIR};
pub use unwrap::{
    default_unwrappers, unwrap_resource, QueryParamUnwrapper, ResourceUnwrapper, UnwrapError,
};
