/// Checks if a host matches a host pattern
///
/// Two kinds of patterns are supported, compared case-insensitively:
/// 1. Exact: "docs.example.com" matches only "docs.example.com"
/// 2. Wildcard: "*.example.com" matches "example.com" itself and any subdomain
///
/// # Examples
///
/// ```
/// use doc_fetch::url::matches_host_pattern;
///
/// assert!(matches_host_pattern("docs.example.com", "DOCS.example.com"));
/// assert!(!matches_host_pattern("docs.example.com", "example.com"));
///
/// assert!(matches_host_pattern("*.example.com", "example.com"));
/// assert!(matches_host_pattern("*.example.com", "api.v2.example.com"));
/// assert!(!matches_host_pattern("*.example.com", "myexample.com"));
/// ```
pub fn matches_host_pattern(pattern: &str, host: &str) -> bool {
    let pattern = pattern.trim_end_matches('.').to_ascii_lowercase();
    let host = host.trim_end_matches('.').to_ascii_lowercase();

    if host.is_empty() {
        return false;
    }

    match pattern.strip_prefix("*.") {
        Some(base) => host == base || host.ends_with(&format!(".{}", base)),
        None => host == pattern,
    }
}

/// Checks if a URL path falls under a path prefix
///
/// Matching respects segment boundaries: "/docs" covers "/docs" and
/// "/docs/intro" but not "/docsearch". A prefix with a trailing slash also
/// covers the same path without it, because canonical URLs drop trailing
/// slashes.
///
/// # Examples
///
/// ```
/// use doc_fetch::url::matches_path_prefix;
///
/// assert!(matches_path_prefix("/docs/", "/docs"));
/// assert!(matches_path_prefix("/docs/", "/docs/guide/intro"));
/// assert!(!matches_path_prefix("/docs/", "/docsearch"));
/// assert!(matches_path_prefix("/", "/anything"));
/// ```
pub fn matches_path_prefix(prefix: &str, path: &str) -> bool {
    if prefix.is_empty() || prefix == "/" {
        return true;
    }

    let bare = prefix.trim_end_matches('/');
    if path == bare {
        return true;
    }

    path.strip_prefix(bare)
        .map(|rest| rest.starts_with('/'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(matches_host_pattern("example.com", "example.com"));
        assert!(matches_host_pattern("docs.example.com", "docs.example.com"));
    }

    #[test]
    fn test_exact_no_match() {
        assert!(!matches_host_pattern("example.com", "other.com"));
        assert!(!matches_host_pattern("example.com", "docs.example.com"));
        assert!(!matches_host_pattern("docs.example.com", "example.com"));
    }

    #[test]
    fn test_wildcard_matches_bare_and_subdomains() {
        assert!(matches_host_pattern("*.example.com", "example.com"));
        assert!(matches_host_pattern("*.example.com", "docs.example.com"));
        assert!(matches_host_pattern("*.example.com", "api.v2.example.com"));
    }

    #[test]
    fn test_wildcard_no_match_partial() {
        assert!(!matches_host_pattern("*.example.com", "myexample.com"));
        assert!(!matches_host_pattern("*.example.com", "example.com.org"));
        assert!(!matches_host_pattern("*.example.com", "example.org"));
    }

    #[test]
    fn test_case_insensitive() {
        assert!(matches_host_pattern("Example.COM", "example.com"));
        assert!(matches_host_pattern("*.example.com", "Docs.EXAMPLE.com"));
    }

    #[test]
    fn test_trailing_dot_ignored() {
        assert!(matches_host_pattern("example.com", "example.com."));
    }

    #[test]
    fn test_empty_host_never_matches() {
        assert!(!matches_host_pattern("*.example.com", ""));
        assert!(!matches_host_pattern("", ""));
    }

    #[test]
    fn test_ip_hosts() {
        assert!(matches_host_pattern("127.0.0.1", "127.0.0.1"));
        assert!(!matches_host_pattern("127.0.0.1", "127.0.0.2"));
    }

    #[test]
    fn test_path_prefix_segment_boundary() {
        assert!(matches_path_prefix("/docs", "/docs"));
        assert!(matches_path_prefix("/docs", "/docs/intro"));
        assert!(!matches_path_prefix("/docs", "/docsearch"));
        assert!(!matches_path_prefix("/docs", "/blog/docs"));
    }

    #[test]
    fn test_path_prefix_trailing_slash() {
        assert!(matches_path_prefix("/guide/", "/guide"));
        assert!(matches_path_prefix("/guide/", "/guide/setup"));
        assert!(!matches_path_prefix("/guide/", "/guides"));
    }

    #[test]
    fn test_root_prefix_matches_everything() {
        assert!(matches_path_prefix("/", "/"));
        assert!(matches_path_prefix("/", "/a/b/c"));
        assert!(matches_path_prefix("", "/x"));
    }
}
