use std::time::{Duration, Instant};

/// Longest single wait handed back to a caller; it re-checks afterwards
const MAX_WAIT: Duration = Duration::from_secs(3600);

const MIN_WAIT: Duration = Duration::from_millis(1);

/// Per-host politeness state
///
/// A token bucket refilled at `rate` tokens per second up to `capacity`.
/// A host can additionally be paused (after a 429) until a fixed instant.
#[derive(Debug, Clone)]
pub struct DomainState {
    tokens: f64,
    capacity: f64,
    rate: f64,
    last_refill: Instant,

    /// No request may start before this instant
    paused_until: Option<Instant>,

    /// Requests granted so far
    pub request_count: u32,
}

impl DomainState {
    /// Creates a full bucket
    pub fn new(rate: f64, burst: u32, now: Instant) -> Self {
        let capacity = f64::from(burst.max(1));
        Self {
            tokens: capacity,
            capacity,
            rate,
            last_refill: now,
            paused_until: None,
            request_count: 0,
        }
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.rate).min(self.capacity);
        self.last_refill = now;
    }

    /// Takes a token if one is available
    ///
    /// Returns the time to wait before trying again otherwise.
    pub fn try_acquire(&mut self, now: Instant) -> Result<(), Duration> {
        if let Some(until) = self.paused_until {
            if now < until {
                return Err(until - now);
            }
            self.paused_until = None;
            // No burst after a pause
            self.tokens = self.tokens.min(1.0);
            self.last_refill = now;
        }

        self.refill(now);

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            self.request_count += 1;
            return Ok(());
        }

        let missing = 1.0 - self.tokens;
        let wait = Duration::try_from_secs_f64(missing / self.rate).unwrap_or(MAX_WAIT);
        Err(wait.clamp(MIN_WAIT, MAX_WAIT))
    }

    /// Blocks the host until `until` (keeps the later of two pauses)
    pub fn pause_until(&mut self, until: Instant) {
        self.paused_until = Some(match self.paused_until {
            Some(existing) if existing > until => existing,
            _ => until,
        });
    }

    pub fn is_paused(&self, now: Instant) -> bool {
        self.paused_until.map(|until| now < until).unwrap_or(false)
    }

    /// Applies a robots.txt `Crawl-delay`
    ///
    /// The rate drops to one request per delay (never raised) and bursting is
    /// disabled.
    pub fn apply_crawl_delay(&mut self, delay: Duration) {
        let secs = delay.as_secs_f64();
        if secs <= 0.0 {
            return;
        }
        self.rate = self.rate.min(1.0 / secs);
        self.capacity = 1.0;
        self.tokens = self.tokens.min(1.0);
    }
}
