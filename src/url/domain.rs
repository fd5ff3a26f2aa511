use url::Url;

/// Extracts the host from a URL
///
/// The host is returned lowercase and without the port. URLs without a host
/// (which shouldn't happen for valid HTTP(S) URLs) yield None.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_crawl::url::extract_host;
///
/// let url = Url::parse("https://EXAMPLE.COM:8080/path").unwrap();
/// assert_eq!(extract_host(&url), Some("example.com".to_string()));
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns true if both URLs share the same hostname
///
/// Scheme and port are ignored, so `http://a.test/` and `https://a.test:8443/`
/// are the same host. Two URLs without a host are never the same host.
pub fn is_same_host(a: &Url, b: &Url) -> bool {
    match (extract_host(a), extract_host(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
