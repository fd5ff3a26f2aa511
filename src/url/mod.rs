//! URL handling module for Sumi-Crawl
//!
//! This module provides URL normalization and the same-host filter that
//! decides which discovered links the crawler may fetch.

mod domain;
mod normalize;

pub use domain::{extract_host, is_same_host};
pub use normalize::{normalize, normalize_url};
