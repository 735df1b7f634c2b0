//! Robots.txt handling module
//!
//! This module fetches, parses and caches robots.txt files so the crawler
//! can honor `Disallow` rules and `Crawl-delay` hints.

mod cache;
mod parser;

pub use cache::{CachedRobots, RobotsCache};
pub use parser::ParsedRobots;

use reqwest::Client;

/// Fetches and parses `<origin>/robots.txt`
///
/// | Response | Rules |
/// |----------|-------|
/// | 2xx | parsed content |
/// | 4xx | allow all |
/// | 5xx, network error | allow all, logged as a warning |
pub async fn fetch_robots(client: &Client, origin: &str) -> ParsedRobots {
    let robots_url = format!("{}/robots.txt", origin.trim_end_matches('/'));

    let response = match client.get(&robots_url).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("Could not fetch {}: {}; allowing all", robots_url, e);
            return ParsedRobots::allow_all();
        }
    };

    let status = response.status();
    if status.is_success() {
        match response.text().await {
            Ok(body) => ParsedRobots::from_content(&body),
            Err(e) => {
                tracing::warn!("Could not read {}: {}; allowing all", robots_url, e);
                ParsedRobots::allow_all()
            }
        }
    } else if status.is_client_error() {
        tracing::debug!("{} returned {}; allowing all", robots_url, status);
        ParsedRobots::allow_all()
    } else {
        tracing::warn!("{} returned {}; allowing all", robots_url, status);
        ParsedRobots::allow_all()
    }
}
