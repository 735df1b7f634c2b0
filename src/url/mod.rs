//! URL handling module for doc-fetch
//!
//! This module provides URL canonicalization, host extraction, host and path
//! pattern matching, and the crawl scope predicate.

mod domain;
mod matcher;
mod normalize;
mod scope;

pub use domain::{extract_host, host_key, is_private_host, origin_of};
pub use matcher::{matches_host_pattern, matches_path_prefix};
pub use normalize::{canonicalize, canonicalize_url, request_url, resolve_link};
pub use scope::{is_non_html_resource, CrawlScope, LinkClass};
