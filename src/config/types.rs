use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for doc-fetch
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    pub scope: ScopeConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Maximum link depth from the root URL (root is depth 0)
    pub max_depth: u32,

    /// Maximum number of pages included in the output
    pub max_pages: usize,

    /// Number of concurrent fetch-and-extract workers
    pub concurrency: u32,

    /// Sustained request rate per host
    pub requests_per_second: f64,

    /// Token bucket capacity per host
    pub burst: u32,

    /// Timeout for a single HTTP request (seconds)
    pub request_timeout_secs: u64,

    /// Retries after the first attempt for transient failures
    pub max_retries: u32,

    /// Base delay for exponential backoff (milliseconds)
    pub backoff_base_ms: u64,

    /// Upper bound on a single backoff delay (milliseconds)
    pub max_backoff_ms: u64,

    /// Upper bound honored for a `Retry-After` hint (seconds)
    pub max_retry_after_secs: u64,

    /// Upper bound honored for a robots.txt `Crawl-delay` (seconds)
    pub max_crawl_delay_secs: u64,

    /// Wall-clock limit for the whole crawl (seconds)
    pub max_duration_secs: Option<u64>,

    /// Whether robots.txt rules are honored
    pub respect_robots: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: 2,
            max_pages: 500,
            concurrency: 4,
            requests_per_second: 4.0,
            burst: 4,
            request_timeout_secs: 30,
            max_retries: 3,
            backoff_base_ms: 500,
            max_backoff_ms: 30_000,
            max_retry_after_secs: 60,
            max_crawl_delay_secs: 30,
            max_duration_secs: None,
            respect_robots: true,
        }
    }
}

impl CrawlerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Clamps a robots.txt crawl delay to `max_crawl_delay_secs`
    pub fn crawl_delay(&self, requested: Duration) -> Duration {
        requested.min(Duration::from_secs(self.max_crawl_delay_secs))
    }

    pub fn max_duration(&self) -> Option<Duration> {
        self.max_duration_secs.map(Duration::from_secs)
    }

    /// Backoff before retry number `attempt` (1-based), capped at `max_backoff_ms`
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let delay = self.backoff_base_ms.saturating_mul(1u64 << exponent);
        Duration::from_millis(delay.min(self.max_backoff_ms))
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct UserAgentConfig {
    /// Name of the crawler, also used as the robots.txt product token
    pub crawler_name: String,

    /// Version of the crawler
    pub crawler_version: String,

    /// URL with information about the crawler
    pub contact_url: Option<String>,

    /// Full user agent string, replacing the generated one
    #[serde(rename = "override")]
    pub override_header: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "DocFetch".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
            override_header: None,
        }
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `CrawlerName/Version (+ContactURL)` unless an override is configured.
    pub fn header_value(&self) -> String {
        if let Some(custom) = &self.override_header {
            return custom.clone();
        }
        match &self.contact_url {
            Some(contact) => format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, contact
            ),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }

    /// Product token used when matching robots.txt groups
    pub fn robots_token(&self) -> String {
        match &self.override_header {
            Some(custom) => custom
                .split(|c: char| c == '/' || c.is_whitespace())
                .next()
                .unwrap_or_default()
                .to_string(),
            None => self.crawler_name.clone(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Path of the consolidated markdown file
    pub path: PathBuf,

    /// Title for the top-level heading (defaults to the root page title)
    pub title: Option<String>,

    /// Also write an llm.txt index next to the markdown file
    pub llm_txt: bool,

    /// Write nothing if the crawl is cancelled before completing
    pub discard_on_abort: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("docs.md"),
            title: None,
            llm_txt: false,
            discard_on_abort: false,
        }
    }
}

impl OutputConfig {
    /// Path of the llm.txt index derived from the markdown path
    pub fn llm_txt_path(&self) -> PathBuf {
        let raw = self.path.to_string_lossy();
        match raw.strip_suffix(".md") {
            Some(stem) => PathBuf::from(format!("{}.llm.txt", stem)),
            None => PathBuf::from(format!("{}.llm.txt", raw)),
        }
    }
}

/// Crawl scope configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ScopeConfig {
    /// The URL the crawl starts from
    pub root_url: Option<String>,

    /// Host patterns (e.g., "docs.example.com" or "*.example.com"); defaults to the root host
    pub allowed_hosts: Vec<String>,

    /// Path prefixes that in-scope URLs must start with; defaults to the root's directory
    pub path_prefixes: Vec<String>,

    /// Permit loopback/private network hosts
    pub allow_private_hosts: bool,
}
