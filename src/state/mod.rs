//! State module for tracking crawl progress
//!
//! This module provides the state machines used during a crawl.
//!
//! # Components
//!
//! - `CrawlPhase`: Lifecycle of a whole crawl (idle, running, draining, completed, failed)
//! - `UrlStatus`: Lifecycle of a single URL record (pending, in flight, done, failed)
//! - `DomainState`: Per-host token bucket for rate limiting and request counting

mod crawl_phase;
mod domain_state;
mod url_status;

// Re-export main types
pub use crawl_phase::CrawlPhase;
pub use domain_state::DomainState;
pub use url_status::UrlStatus;
