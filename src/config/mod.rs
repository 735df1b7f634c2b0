//! Configuration module for doc-fetch
//!
//! This module handles loading, parsing, and validating crawl configuration.
//! Settings come from built-in defaults, an optional TOML file, and finally
//! command-line overrides applied by the binary.
//!
//! # Example
//!
//! ```no_run
//! use doc_fetch::config::{load_config, validate};
//! use std::path::Path;
//!
//! let mut config = load_config(Path::new("doc-fetch.toml")).unwrap();
//! config.crawler.max_depth = 3;
//! validate(&config).unwrap();
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, OutputConfig, ScopeConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_config, load_config_with_hash, load_validated_config, parse_config,
};

pub use validation::{validate, MAX_CONCURRENCY, MAX_DEPTH_LIMIT};
