//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with the configured user agent and timeouts
//! - GET requests with redirect following
//! - Content-Type checks
//! - Error classification (transient vs permanent) and `Retry-After` parsing

use crate::config::Config;
use chrono::{DateTime, Utc};
use reqwest::header::{CONTENT_TYPE, RETRY_AFTER};
use reqwest::{redirect::Policy, Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Maximum redirect hops followed for one request
const MAX_REDIRECTS: usize = 10;

/// A successfully fetched HTML response
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// URL that was requested
    pub url: Url,

    /// URL after redirects
    pub final_url: Url,

    pub status: u16,

    pub body: Vec<u8>,

    pub content_type: String,

    pub fetched_at: DateTime<Utc>,
}

impl FetchResult {
    /// Body decoded as UTF-8, replacing invalid sequences
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Why a fetch attempt did not produce an HTML page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {status}")]
    Status {
        status: u16,
        retry_after: Option<Duration>,
    },

    #[error("not an HTML page ({0})")]
    NotHtml(String),
}

impl FetchError {
    /// Transient failures are retried with backoff
    ///
    /// | Condition | Transient |
    /// |-----------|-----------|
    /// | timeout, connection, other network errors | yes |
    /// | HTTP 5xx, 408, 429 | yes |
    /// | other HTTP 4xx | no |
    /// | non-HTML content | no |
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout | Self::Connect(_) | Self::Network(_) => true,
            Self::Status { status, .. } => *status >= 500 || *status == 408 || *status == 429,
            Self::NotHtml(_) => false,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::Status { status: 429, .. })
    }

    /// Server-provided retry hint, if any
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Status { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

/// Builds the HTTP client shared by all workers
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    let timeout = config.crawler.request_timeout();
    Client::builder()
        .user_agent(config.user_agent.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches `url` and returns the body if it is an HTML page
///
/// # Request Flow
///
/// 1. GET the URL, following up to 10 redirects
/// 2. Non-2xx → `FetchError::Status` (with `Retry-After` on 429/503)
/// 3. Content-Type must be HTML (a missing header is accepted)
/// 4. Read the body
pub async fn fetch_url(client: &Client, url: &Url) -> Result<FetchResult, FetchError> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(FetchError::from_reqwest)?;

    let status = response.status();
    let final_url = response.url().clone();

    if !status.is_success() {
        let retry_after = if status == StatusCode::TOO_MANY_REQUESTS
            || status == StatusCode::SERVICE_UNAVAILABLE
        {
            response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| parse_retry_after(v, Utc::now()))
        } else {
            None
        };
        return Err(FetchError::Status {
            status: status.as_u16(),
            retry_after,
        });
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if !is_html_content_type(&content_type) {
        return Err(FetchError::NotHtml(content_type));
    }

    let body = response
        .bytes()
        .await
        .map_err(FetchError::from_reqwest)?
        .to_vec();

    Ok(FetchResult {
        url: url.clone(),
        final_url,
        status: status.as_u16(),
        body,
        content_type,
        fetched_at: Utc::now(),
    })
}

/// HTML and XHTML are accepted; an absent Content-Type is given the benefit of the doubt
pub fn is_html_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime.is_empty() || mime == "text/html" || mime == "application/xhtml+xml"
}

/// Parses a `Retry-After` value: delay-seconds or an HTTP date
pub fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }

    let date = DateTime::parse_from_rfc2822(value).ok()?.with_timezone(&Utc);
    Some((date - now).to_std().unwrap_or(Duration::ZERO))
}
