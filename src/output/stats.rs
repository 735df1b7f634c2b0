//! Crawl counters and the list of URLs left out of the output

use std::fmt;
use std::time::Duration;

/// Why a URL did not make it into the output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Permanent HTTP error (4xx other than 408/429)
    Http(u16),

    /// Transient failures persisted through every retry
    RetriesExhausted(String),

    /// Disallowed by robots.txt
    RobotsDisallowed,

    /// Response was not an HTML document
    NotHtml(String),

    /// Redirected to a URL outside the crawl scope
    RedirectOutOfScope(String),

    /// Same content as an earlier page
    DuplicateContent,

    /// The worker task died
    Worker(String),
}

impl SkipReason {
    /// Failures count against the crawl; the rest are deliberate skips
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::RetriesExhausted(_) | Self::Worker(_)
        )
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(status) => write!(f, "HTTP {}", status),
            Self::RetriesExhausted(last) => write!(f, "gave up after retries ({})", last),
            Self::RobotsDisallowed => write!(f, "disallowed by robots.txt"),
            Self::NotHtml(content_type) if content_type.is_empty() => write!(f, "not HTML"),
            Self::NotHtml(content_type) => write!(f, "not HTML ({})", content_type),
            Self::RedirectOutOfScope(target) => write!(f, "redirected out of scope to {}", target),
            Self::DuplicateContent => write!(f, "duplicate content"),
            Self::Worker(message) => write!(f, "worker failed: {}", message),
        }
    }
}

/// A URL left out of the output, with its discovery order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedUrl {
    pub order: usize,
    pub url: String,
    pub reason: SkipReason,
}

/// Counters for one crawl run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStats {
    /// URLs ever enqueued
    pub discovered: usize,

    /// Successful HTML responses
    pub fetched: usize,

    /// Pages accepted into the output
    pub included: usize,

    /// Permanently failed URLs
    pub failed: usize,

    /// URLs skipped on purpose (robots, non-HTML, redirects)
    pub skipped: usize,

    /// Pages dropped as content duplicates
    pub duplicates: usize,

    /// Retry attempts scheduled
    pub retries: usize,

    /// Every URL left out, in discovery order
    pub skipped_urls: Vec<SkippedUrl>,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a URL left out of the output
    pub fn record_skip(&mut self, order: usize, url: &str, reason: SkipReason) {
        match &reason {
            SkipReason::DuplicateContent => self.duplicates += 1,
            r if r.is_failure() => self.failed += 1,
            _ => self.skipped += 1,
        }
        self.skipped_urls.push(SkippedUrl {
            order,
            url: url.to_string(),
            reason,
        });
    }

    /// Left-out URLs sorted by discovery order
    pub fn skipped_in_order(&self) -> Vec<&SkippedUrl> {
        let mut list: Vec<&SkippedUrl> = self.skipped_urls.iter().collect();
        list.sort_by_key(|s| s.order);
        list
    }
}

/// Prints statistics to stderr in a formatted manner
pub fn print_statistics(stats: &CrawlStats, elapsed: Duration) {
    let secs = elapsed.as_secs_f64();
    let rate = if secs > 0.0 {
        stats.fetched as f64 / secs
    } else {
        0.0
    };

    eprintln!("=== Crawl Statistics ===");
    eprintln!("  Pages included:  {}", stats.included);
    eprintln!("  URLs discovered: {}", stats.discovered);
    eprintln!("  Pages fetched:   {}", stats.fetched);
    eprintln!("  Failed:          {}", stats.failed);
    eprintln!("  Skipped:         {}", stats.skipped);
    eprintln!("  Duplicates:      {}", stats.duplicates);
    eprintln!("  Retries:         {}", stats.retries);
    eprintln!("  Elapsed:         {:.2}s ({:.2} pages/sec)", secs, rate);

    let failures: Vec<_> = stats
        .skipped_in_order()
        .into_iter()
        .filter(|s| s.reason.is_failure())
        .collect();
    if !failures.is_empty() {
        eprintln!("Failed URLs:");
        for entry in failures {
            eprintln!("  - {} ({})", entry.url, entry.reason);
        }
    }
}
