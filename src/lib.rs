//! doc-fetch: documentation site crawler and markdown consolidator
//!
//! This crate crawls a documentation site breadth-first within a configured scope,
//! extracts the primary content of every page, and assembles the results into a
//! single markdown document suitable for LLM consumption. Crawling respects
//! robots.txt, per-host rate limits, and retry/backoff rules.

pub mod config;
pub mod crawler;
pub mod document;
pub mod output;
pub mod robots;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for doc-fetch operations
#[derive(Debug, Error)]
pub enum DocFetchError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid crawl phase transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::CrawlPhase,
        to: state::CrawlPhase,
    },

    #[error("Invalid URL status transition: {from:?} -> {to:?}")]
    InvalidStatusTransition {
        from: state::UrlStatus,
        to: state::UrlStatus,
    },

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Crawl failed: {0}")]
    CrawlFailed(String),

    #[error("Crawl aborted: {0}")]
    Aborted(String),

    #[error("Worker task failed: {0}")]
    Worker(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid host pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for doc-fetch operations
pub type Result<T> = std::result::Result<T, DocFetchError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{crawl_to_file, run_crawl, CrawlReport};
pub use document::{Block, PageDocument};
pub use state::{CrawlPhase, UrlStatus};
pub use url::{canonicalize_url, CrawlScope};
