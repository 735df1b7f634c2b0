use std::net::{IpAddr, Ipv4Addr};
use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use doc_fetch::url::extract_host;
///
/// let url = Url::parse("https://DOCS.example.com:8443/path").unwrap();
/// assert_eq!(extract_host(&url), Some("docs.example.com".to_string()));
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Builds the key used for per-host bookkeeping (rate limits, robots.txt)
///
/// The key is `host` or `host:port` when a non-default port is in use, so two
/// servers on the same machine are throttled independently.
pub fn host_key(url: &Url) -> Option<String> {
    let host = extract_host(url)?;
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    })
}

/// Builds the origin (`scheme://host[:port]`) a robots.txt file is served from
pub fn origin_of(url: &Url) -> Option<String> {
    let key = host_key(url)?;
    Some(format!("{}://{}", url.scheme(), key))
}

/// Returns true for hosts that resolve to the local machine or a private network
///
/// Only literal addresses and `localhost` are recognized; no DNS lookups are made.
pub fn is_private_host(host: &str) -> bool {
    let host = host.trim_start_matches('[').trim_end_matches(']');
    let lowered = host.to_ascii_lowercase();

    if lowered == "localhost" || lowered.ends_with(".localhost") {
        return true;
    }

    match lowered.parse::<IpAddr>() {
        Ok(IpAddr::V4(ip)) => is_private_v4(ip),
        Ok(IpAddr::V6(ip)) => {
            // ::ffff:a.b.c.d reaches the IPv4 host
            if let Some(mapped) = ip.to_ipv4_mapped() {
                return is_private_v4(mapped);
            }
            let unique_local = (ip.segments()[0] & 0xfe00) == 0xfc00;
            let link_local = (ip.segments()[0] & 0xffc0) == 0xfe80;
            ip.is_loopback() || ip.is_multicast() || ip.is_unspecified() || unique_local || link_local
        }
        Err(_) => false,
    }
}

fn is_private_v4(ip: Ipv4Addr) -> bool {
    ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_multicast()
        || ip.is_unspecified()
        || ip.is_broadcast()
}
