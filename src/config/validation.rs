use crate::config::types::{Config, CrawlerConfig, OutputConfig, ScopeConfig, UserAgentConfig};
use crate::url::is_private_host;
use crate::ConfigError;
use url::Url;

/// Deepest crawl the tool will attempt
pub const MAX_DEPTH_LIMIT: u32 = 10;

/// Largest worker pool the tool will run
pub const MAX_CONCURRENCY: u32 = 20;

/// File extensions accepted for the output path
const ALLOWED_OUTPUT_EXTENSIONS: &[&str] = &["md", "txt"];

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_scope_config(&config.scope)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_depth > MAX_DEPTH_LIMIT {
        return Err(ConfigError::Validation(format!(
            "max_depth cannot exceed {}, got {}",
            MAX_DEPTH_LIMIT, config.max_depth
        )));
    }

    if config.concurrency < 1 || config.concurrency > MAX_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and {}, got {}",
            MAX_CONCURRENCY, config.concurrency
        )));
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(
            "max_pages must be >= 1".to_string(),
        ));
    }

    if config.requests_per_second <= 0.0 || !config.requests_per_second.is_finite() {
        return Err(ConfigError::Validation(format!(
            "requests_per_second must be a positive number, got {}",
            config.requests_per_second
        )));
    }

    if config.burst < 1 {
        return Err(ConfigError::Validation("burst must be >= 1".to_string()));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.max_backoff_ms < config.backoff_base_ms {
        return Err(ConfigError::Validation(format!(
            "max_backoff_ms ({}) must be >= backoff_base_ms ({})",
            config.max_backoff_ms, config.backoff_base_ms
        )));
    }

    if config.max_duration_secs == Some(0) {
        return Err(ConfigError::Validation(
            "max_duration_secs must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if let Some(custom) = &config.override_header {
        if custom.trim().is_empty() {
            return Err(ConfigError::Validation(
                "user agent override cannot be empty".to_string(),
            ));
        }
        return Ok(());
    }

    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters, hyphens and underscores, got '{}'",
            config.crawler_name
        )));
    }

    if let Some(contact) = &config.contact_url {
        Url::parse(contact)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output path cannot be empty".to_string(),
        ));
    }

    let extension = config
        .path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default();
    if !ALLOWED_OUTPUT_EXTENSIONS.contains(&extension) {
        return Err(ConfigError::Validation(format!(
            "output path must end in .md or .txt, got '{}'",
            config.path.display()
        )));
    }

    if let Some(title) = &config.title {
        if title.trim().is_empty() {
            return Err(ConfigError::Validation(
                "output title cannot be blank".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates the crawl scope: root URL, host patterns and path prefixes
fn validate_scope_config(config: &ScopeConfig) -> Result<(), ConfigError> {
    let root = config
        .root_url
        .as_deref()
        .ok_or_else(|| ConfigError::Validation("a root URL is required".to_string()))?;

    let url = Url::parse(root)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid root URL '{}': {}", root, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Root URL must use http or https, got '{}'",
            url.scheme()
        )));
    }

    let host = url
        .host_str()
        .ok_or_else(|| ConfigError::InvalidUrl(format!("Root URL '{}' has no host", root)))?;

    if !config.allow_private_hosts && is_private_host(host) {
        return Err(ConfigError::InvalidUrl(format!(
            "Root URL '{}' points at a local or private address",
            root
        )));
    }

    for pattern in &config.allowed_hosts {
        validate_host_pattern(pattern)?;
    }

    for prefix in &config.path_prefixes {
        if !prefix.starts_with('/') {
            return Err(ConfigError::Validation(format!(
                "path prefix '{}' must start with '/'",
                prefix
            )));
        }
    }

    Ok(())
}

/// Validates a host pattern (supports a leading "*." wildcard)
fn validate_host_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Host pattern cannot be empty".to_string(),
        ));
    }

    let host = pattern.strip_prefix("*.").unwrap_or(pattern);
    validate_host_string(host)
}

/// Validates a host string (without wildcard prefix)
fn validate_host_string(host: &str) -> Result<(), ConfigError> {
    if host.is_empty() {
        return Err(ConfigError::InvalidPattern("Host cannot be empty".to_string()));
    }

    if !host
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Host '{}' contains invalid characters",
            host
        )));
    }

    if host.starts_with('.') || host.ends_with('.') || host.starts_with('-') || host.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Host '{}' cannot start or end with '.' or '-'",
            host
        )));
    }

    if host.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Host '{}' cannot contain consecutive dots",
            host
        )));
    }

    Ok(())
}
