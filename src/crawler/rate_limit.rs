//! Per-host rate limiting
//!
//! The limiter owns one [`DomainState`] token bucket per host key. Workers
//! call [`HostLimiter::acquire`] before every request and are suspended until
//! their host's bucket has a token, or until the crawl is cancelled.

use crate::state::DomainState;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
pub struct HostLimiter {
    rate: f64,
    burst: u32,
    hosts: Mutex<HashMap<String, DomainState>>,
}

impl HostLimiter {
    pub fn new(rate: f64, burst: u32) -> Self {
        Self {
            rate,
            burst,
            hosts: Mutex::new(HashMap::new()),
        }
    }

    /// Takes a token for `host` without waiting
    pub async fn try_acquire(&self, host: &str, now: Instant) -> Result<(), Duration> {
        let mut hosts = self.hosts.lock().await;
        let (rate, burst) = (self.rate, self.burst);
        hosts
            .entry(host.to_string())
            .or_insert_with(|| DomainState::new(rate, burst, now))
            .try_acquire(now)
    }

    /// Waits for a token for `host`
    ///
    /// Returns false if `cancel` fires first.
    pub async fn acquire(&self, host: &str, cancel: &CancellationToken) -> bool {
        loop {
            if cancel.is_cancelled() {
                return false;
            }

            let wait = match self.try_acquire(host, Instant::now()).await {
                Ok(()) => return true,
                Err(wait) => wait,
            };

            tracing::trace!("Rate limit: waiting {:?} for {}", wait, host);
            tokio::select! {
                _ = cancel.cancelled() => return false,
                _ = tokio::time::sleep(wait) => {}
            }
        }
    }

    /// Blocks `host` until `until` (used for 429 `Retry-After`)
    pub async fn pause(&self, host: &str, until: Instant) {
        let mut hosts = self.hosts.lock().await;
        let (rate, burst) = (self.rate, self.burst);
        hosts
            .entry(host.to_string())
            .or_insert_with(|| DomainState::new(rate, burst, Instant::now()))
            .pause_until(until);
    }

    /// Lowers the host's rate to honor a robots.txt crawl delay
    pub async fn apply_crawl_delay(&self, host: &str, delay: Duration) {
        let mut hosts = self.hosts.lock().await;
        let (rate, burst) = (self.rate, self.burst);
        hosts
            .entry(host.to_string())
            .or_insert_with(|| DomainState::new(rate, burst, Instant::now()))
            .apply_crawl_delay(delay);
    }

    /// Requests granted per host so far
    pub async fn request_counts(&self) -> HashMap<String, u32> {
        self.hosts
            .lock()
            .await
            .iter()
            .map(|(host, state)| (host.clone(), state.request_count))
            .collect()
    }
}
