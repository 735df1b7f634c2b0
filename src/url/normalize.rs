use crate::UrlError;
use url::Url;

/// Query parameters that only carry tracking information
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_eid", "ref", "source"];

/// Canonicalizes a URL so that equivalent spellings compare equal
///
/// # Canonicalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Accept only http and https (the scheme is kept as-is, never upgraded)
/// 3. Lowercase scheme and host, drop the default port
/// 4. Normalize path:
///    - Collapse duplicate slashes
///    - Remove dot segments (. and ..)
///    - Remove trailing slash (except for root /)
/// 5. Remove fragment
/// 6. Remove tracking query parameters (`utm_*`, `fbclid`, `gclid`, `mc_eid`, `ref`, `source`)
/// 7. Sort remaining query parameters, drop an empty query
///
/// # Examples
///
/// ```
/// use doc_fetch::url::canonicalize_url;
///
/// let url = canonicalize_url("HTTPS://Docs.Example.COM:443//guide/./intro/?utm_source=x#top").unwrap();
/// assert_eq!(url.as_str(), "https://docs.example.com/guide/intro");
/// ```
pub fn canonicalize_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
    canonicalize(url)
}

/// Canonicalizes an already parsed URL
pub fn canonicalize(url: Url) -> Result<Url, UrlError> {
    let mut url = request_url(url)?;

    let path = normalize_path(url.path());
    url.set_path(&path);

    if url.query().is_some() {
        let params = filter_and_sort_query_params(&url);
        url.query_pairs_mut().clear().extend_pairs(params);
    }

    Ok(url)
}

/// The form of a URL that is actually requested
///
/// Drops the fragment and tracking parameters and lowercases the host, but
/// keeps the path as written: `/docs/` and `/docs` share a canonical form
/// yet a server may answer only one of them, and relative links resolve
/// differently against each.
pub fn request_url(mut url: Url) -> Result<Url, UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or(UrlError::MissingHost)?
        .to_lowercase();
    url.set_host(Some(&host))
        .map_err(|e| UrlError::Malformed(format!("Failed to set host: {}", e)))?;

    // Default ports are already dropped by the parser.
    url.set_fragment(None);

    if url.query().is_some() {
        let params: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| !is_tracking_param(key))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(params);
        }
    }

    Ok(url)
}

/// Resolves `href` against `base` into the URL to request
///
/// Returns `None` for anything that cannot be turned into a crawlable URL
/// (mailto:, javascript:, malformed references). Dedup keys come from
/// [`canonicalize`] on the result.
pub fn resolve_link(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let joined = base.join(href).ok()?;
    request_url(joined).ok()
}

fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    if segments.is_empty() {
        return "/".to_string();
    }

    format!("/{}", segments.join("/"))
}

fn filter_and_sort_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    params.sort();
    params
}

fn is_tracking_param(key: &str) -> bool {
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key)
}
