//! Crawler module for documentation site traversal
//!
//! This module contains the core crawling logic, including:
//! - The URL frontier and in-order commit buffer
//! - HTTP fetching with retry classification
//! - Main-content extraction and link discovery
//! - Per-host rate limiting
//! - Overall crawl coordination

mod commit;
mod coordinator;
mod dedup;
mod extractor;
mod fetcher;
mod frontier;
mod rate_limit;

pub use commit::CommitQueue;
pub use coordinator::{Coordinator, CrawlReport, StopReason};
pub use dedup::DedupIndex;
pub use extractor::{clean_title, extract};
pub use fetcher::{build_http_client, fetch_url, FetchError, FetchResult};
pub use frontier::{Dequeue, Frontier, RecordId, UrlRecord};
pub use rate_limit::HostLimiter;

use crate::config::{validate, Config};
use crate::output::write_artifact;
use crate::Result;
use tokio_util::sync::CancellationToken;

/// Runs a complete crawl and returns the assembled output in memory
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Validate the configuration and build the crawl scope
/// 2. Build the HTTP client
/// 3. Fetch pages breadth-first from the root URL
/// 4. Extract content and follow in-scope links
/// 5. Assemble the markdown document and llm.txt index
///
/// Cancelling `cancel` stops the crawl early; pages committed so far are
/// kept unless the configuration asks for partial output to be discarded.
pub async fn run_crawl(config: Config, cancel: CancellationToken) -> Result<CrawlReport> {
    validate(&config)?;
    Coordinator::new(config, cancel)?.run().await
}

/// Runs a crawl and writes its artifacts to the configured paths
///
/// Nothing is written when the crawl fails.
pub async fn crawl_to_file(config: Config, cancel: CancellationToken) -> Result<CrawlReport> {
    let output_path = config.output.path.clone();
    let llm_txt_path = config.output.llm_txt.then(|| config.output.llm_txt_path());

    let report = run_crawl(config, cancel).await?;

    write_artifact(&output_path, &report.output.markdown)?;
    tracing::info!(
        "Wrote {} pages to {}",
        report.output.page_count,
        output_path.display()
    );

    if let Some(path) = llm_txt_path {
        write_artifact(&path, &report.output.llm_txt)?;
        tracing::info!("Wrote llm.txt index to {}", path.display());
    }

    Ok(report)
}
