use crate::config::Config;
use crate::url::domain::{extract_host, host_key, is_private_host};
use crate::url::matcher::{matches_host_pattern, matches_path_prefix};
use crate::url::normalize::{canonicalize_url, request_url};
use crate::{ConfigError, ConfigResult};
use url::Url;

/// Path extensions that never lead to an HTML page
const NON_HTML_EXTENSIONS: &[&str] = &[
    "pdf", "zip", "tar", "gz", "tgz", "bz2", "xz", "7z", "rar", "exe", "dmg", "pkg", "deb", "rpm",
    "msi", "iso", "png", "jpg", "jpeg", "gif", "svg", "webp", "ico", "bmp", "mp3", "mp4", "webm",
    "avi", "mov", "wav", "woff", "woff2", "ttf", "eot", "css", "js",
];

/// Outcome of checking a URL against the crawl scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkClass {
    /// Eligible for crawling
    InScope,
    /// Not http or https
    UnsupportedScheme,
    /// Host does not match any allowed host pattern
    ExternalHost,
    /// Path falls outside every allowed prefix
    OutsidePrefix,
    /// Loopback or private network address
    PrivateHost,
    /// Points at a download or media file
    NonHtmlResource,
}

impl LinkClass {
    pub fn is_in_scope(&self) -> bool {
        matches!(self, Self::InScope)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InScope => "in scope",
            Self::UnsupportedScheme => "unsupported scheme",
            Self::ExternalHost => "external host",
            Self::OutsidePrefix => "outside path prefix",
            Self::PrivateHost => "private host",
            Self::NonHtmlResource => "non-HTML resource",
        }
    }
}

/// Immutable description of what one crawl run may visit
#[derive(Debug, Clone)]
pub struct CrawlScope {
    /// Canonical form of the root URL
    root: Url,
    /// The root URL as it is requested
    start: Url,
    allowed_hosts: Vec<String>,
    path_prefixes: Vec<String>,
    max_depth: u32,
    max_pages: usize,
    allow_private: bool,
}

impl CrawlScope {
    /// Builds the scope for a validated configuration
    ///
    /// When no host patterns are configured the root's host (with its port,
    /// if any) is the only allowed host. When no path prefixes are configured
    /// the default prefix is the root's directory: `/docs/intro.html` and
    /// `/docs/` both yield `/docs/`, while `/docs` is taken as a directory
    /// itself.
    pub fn from_config(config: &Config) -> ConfigResult<Self> {
        let raw_root = config
            .scope
            .root_url
            .as_deref()
            .ok_or_else(|| ConfigError::Validation("a root URL is required".to_string()))?;

        let raw = Url::parse(raw_root.trim())
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid root URL '{}': {}", raw_root, e)))?;
        let root = canonicalize_url(raw_root)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid root URL '{}': {}", raw_root, e)))?;
        let start = request_url(raw.clone())
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid root URL '{}': {}", raw_root, e)))?;

        let allowed_hosts = if config.scope.allowed_hosts.is_empty() {
            vec![host_key(&root).ok_or_else(|| {
                ConfigError::InvalidUrl(format!("Root URL '{}' has no host", raw_root))
            })?]
        } else {
            config.scope.allowed_hosts.clone()
        };

        let path_prefixes = if config.scope.path_prefixes.is_empty() {
            vec![default_prefix(raw.path())]
        } else {
            config.scope.path_prefixes.clone()
        };

        Ok(Self {
            root,
            start,
            allowed_hosts,
            path_prefixes,
            max_depth: config.crawler.max_depth,
            max_pages: config.crawler.max_pages,
            allow_private: config.scope.allow_private_hosts,
        })
    }

    pub fn root(&self) -> &Url {
        &self.root
    }

    pub fn start(&self) -> &Url {
        &self.start
    }

    pub fn allowed_hosts(&self) -> &[String] {
        &self.allowed_hosts
    }

    pub fn path_prefixes(&self) -> &[String] {
        &self.path_prefixes
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    /// Classifies a canonical URL against the scope
    pub fn classify(&self, url: &Url) -> LinkClass {
        if url.scheme() != "http" && url.scheme() != "https" {
            return LinkClass::UnsupportedScheme;
        }

        let host = match extract_host(url) {
            Some(host) => host,
            None => return LinkClass::ExternalHost,
        };

        if !self.host_allowed(url, &host) {
            return LinkClass::ExternalHost;
        }

        if !self.allow_private && is_private_host(&host) {
            return LinkClass::PrivateHost;
        }

        if is_non_html_resource(url.path()) {
            return LinkClass::NonHtmlResource;
        }

        let path = url.path();
        if !self
            .path_prefixes
            .iter()
            .any(|prefix| matches_path_prefix(prefix, path))
        {
            return LinkClass::OutsidePrefix;
        }

        LinkClass::InScope
    }

    pub fn contains(&self, url: &Url) -> bool {
        self.classify(url).is_in_scope()
    }

    fn host_allowed(&self, url: &Url, host: &str) -> bool {
        let keyed = host_key(url).unwrap_or_else(|| host.to_string());
        self.allowed_hosts.iter().any(|pattern| {
            // Patterns carrying a port only match that exact origin
            if pattern.contains(':') {
                matches_host_pattern(pattern, &keyed)
            } else {
                matches_host_pattern(pattern, host)
            }
        })
    }
}

fn default_prefix(path: &str) -> String {
    if path.is_empty() || path == "/" {
        return "/".to_string();
    }
    match path.rsplit_once('/') {
        Some((dir, last)) if last.contains('.') => format!("{}/", dir),
        _ => path.to_string(),
    }
}

/// Returns true if the path ends in a known download or media extension
pub fn is_non_html_resource(path: &str) -> bool {
    let last = path.rsplit('/').next().unwrap_or_default();
    match last.rsplit_once('.') {
        Some((_, ext)) => NON_HTML_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()),
        None => false,
    }
}
