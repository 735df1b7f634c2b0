use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// Missing tables and keys fall back to their defaults. The result is not
/// validated here because command-line overrides are usually applied on top;
/// call [`validate`](crate::config::validate) once the configuration is final.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use doc_fetch::config::load_config;
///
/// let config = load_config(Path::new("doc-fetch.toml")).unwrap();
/// println!("Max depth: {}", config.crawler.max_depth);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    Ok(config)
}

/// Loads, then validates, a configuration file
pub fn load_validated_config(path: &Path) -> Result<Config, ConfigError> {
    let config = load_config(path)?;
    validate(&config)?;
    Ok(config)
}

/// SHA-256 of raw configuration text, hex encoded
fn hash_content(content: &[u8]) -> String {
    hex::encode(Sha256::digest(content))
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so a crawl can be matched with the exact configuration
/// that produced it.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    Ok(hash_content(&std::fs::read(path)?))
}

/// Loads a configuration file and hashes the same bytes that were parsed
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let hash = hash_content(content.as_bytes());
    Ok((parse_config(&content)?, hash))
}
