//! Per-origin robots.txt cache
//!
//! Each origin's robots.txt is fetched at most once per 24 hours. Concurrent
//! workers asking for the same origin wait on a single in-flight fetch.

use crate::robots::{fetch_robots, ParsedRobots};
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};

/// Robots rules for one origin plus the time they were fetched
#[derive(Debug, Clone)]
pub struct CachedRobots {
    pub rules: ParsedRobots,
    pub fetched_at: DateTime<Utc>,
}

impl CachedRobots {
    pub fn new(rules: ParsedRobots) -> Self {
        Self {
            rules,
            fetched_at: Utc::now(),
        }
    }

    /// Robots.txt is refreshed daily
    pub fn is_stale(&self) -> bool {
        Utc::now() - self.fetched_at > Duration::hours(24)
    }

    pub fn is_allowed(&self, url: &str, token: &str) -> bool {
        self.rules.is_allowed(url, token)
    }
}

type Slot = Arc<OnceCell<Arc<CachedRobots>>>;

/// Shared cache of robots.txt rules keyed by origin (`scheme://host[:port]`)
#[derive(Debug, Default)]
pub struct RobotsCache {
    entries: Mutex<HashMap<String, Slot>>,
}

impl RobotsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the rules for `origin`, fetching them on first use
    pub async fn rules_for(&self, client: &Client, origin: &str) -> Arc<CachedRobots> {
        let slot = {
            let mut entries = self.entries.lock().await;
            let slot = entries
                .entry(origin.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()));
            if slot.get().map(|cached| cached.is_stale()).unwrap_or(false) {
                tracing::debug!("robots.txt for {} is stale, refetching", origin);
                *slot = Arc::new(OnceCell::new());
            }
            Arc::clone(slot)
        };

        slot.get_or_init(|| async {
            tracing::debug!("Fetching robots.txt for {}", origin);
            Arc::new(CachedRobots::new(fetch_robots(client, origin).await))
        })
        .await
        .clone()
    }

    /// Number of origins with cached rules
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_cache_not_stale() {
        let cache = CachedRobots::new(ParsedRobots::allow_all());
        assert!(!cache.is_stale());
    }

    #[test]
    fn test_cache_is_stale_after_a_day() {
        let mut cache = CachedRobots::new(ParsedRobots::allow_all());
        cache.fetched_at = Utc::now() - Duration::hours(25);
        assert!(cache.is_stale());

        cache.fetched_at = Utc::now() - Duration::hours(23);
        assert!(!cache.is_stale());
    }

    #[test]
    fn test_is_allowed_delegates_to_rules() {
        let cache = CachedRobots::new(ParsedRobots::from_content("User-agent: *\nDisallow: /x"));
        assert!(cache.is_allowed("https://example.com/y", "DocFetch"));
        assert!(!cache.is_allowed("https://example.com/x", "DocFetch"));
    }

    #[tokio::test]
    async fn test_unreachable_origin_allows_all_and_is_cached() {
        let client = Client::new();
        let cache = RobotsCache::new();

        // Port 9 (discard) on loopback is essentially never listening.
        let first = cache.rules_for(&client, "http://127.0.0.1:9").await;
        assert!(first.rules.is_allow_all());

        let second = cache.rules_for(&client, "http://127.0.0.1:9").await;
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len().await, 1);
    }
}
