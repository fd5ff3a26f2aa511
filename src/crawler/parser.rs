//! HTML parser for extracting links
//!
//! This module turns a fetched page body into the ordered list of absolute
//! URLs its anchors point at.

use crate::url::normalize;
use scraper::{Html, Selector};
use url::Url;

/// Extracts every link from an HTML document
///
/// # Link Extraction Rules
///
/// - Every `<a href="...">` in document order, duplicates kept
/// - Relative hrefs are resolved against `base_url` (RFC 3986 resolution)
/// - Fragments are always stripped, so `/a#x` and `/a#y` yield the same URL
/// - Only `http` and `https` URLs are kept; `mailto:`, `javascript:` and
///   friends yield nothing
/// - An href that cannot be resolved is skipped; the rest of the page is
///   still extracted
///
/// Off-host links are returned like any other: deciding what to fetch is the
/// dispatcher's job.
///
/// # Example
///
/// ```
/// use sumi_crawl::crawler::extract_links;
/// use url::Url;
///
/// let html = r#"<html><body><a href="/page#top">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let links = extract_links(html, &base_url);
/// assert_eq!(links[0].as_str(), "https://example.com/page");
/// ```
pub fn extract_links(html: &str, base_url: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if let Some(href) = element.value().attr("href") {
                if let Some(absolute_url) = resolve_link(href, base_url) {
                    links.push(absolute_url);
                }
            }
        }
    }

    links
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - Hrefs that cannot be resolved against the base
/// - Non-HTTP(S) URLs after resolution
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let absolute_url = match base_url.join(href) {
        Ok(url) => url,
        Err(e) => {
            tracing::debug!("Skipping malformed href {:?} on {}: {}", href, base_url, e);
            return None;
        }
    };

    normalize(absolute_url).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("http://www.google.com/one/two").unwrap()
    }

    fn resolve(href: &str) -> Option<String> {
        resolve_link(href, &base_url()).map(String::from)
    }

    fn extract(html: &str) -> Vec<String> {
        extract_links(html, &Url::parse("http://www.google.com").unwrap())
            .into_iter()
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_resolve_absolute() {
        assert_eq!(
            resolve("http://www.test.com").as_deref(),
            Some("http://www.test.com/")
        );
    }

    #[test]
    fn test_resolve_relative() {
        assert_eq!(
            resolve("test").as_deref(),
            Some("http://www.google.com/one/test")
        );
    }

    #[test]
    fn test_resolve_relative_parent() {
        assert_eq!(
            resolve("../../test").as_deref(),
            Some("http://www.google.com/test")
        );
    }

    #[test]
    fn test_resolve_root() {
        assert_eq!(resolve("/test").as_deref(), Some("http://www.google.com/test"));
    }

    #[test]
    fn test_resolve_fragment_only() {
        assert_eq!(
            resolve("#test").as_deref(),
            Some("http://www.google.com/one/two")
        );
    }

    #[test]
    fn test_fragment_stripped_after_resolution() {
        assert_eq!(
            resolve("/a#frag").as_deref(),
            Some("http://www.google.com/a")
        );
        assert_eq!(resolve("/a#x"), resolve("/a#y"));
    }

    #[test]
    fn test_resolve_keeps_https_and_query() {
        assert_eq!(
            resolve("https://other.test/search?q=rust").as_deref(),
            Some("https://other.test/search?q=rust")
        );
    }

    #[test]
    fn test_skip_mailto_link() {
        assert_eq!(resolve("mailto:test@test.com"), None);
    }

    #[test]
    fn test_skip_javascript_link() {
        assert_eq!(resolve("javascript:void(0)"), None);
    }

    #[test]
    fn test_skip_malformed_href() {
        assert_eq!(resolve("http://[invalid"), None);
        assert_eq!(resolve("http://exa mple.com/"), None);
    }

    #[test]
    fn test_extract_empty() {
        assert!(extract("").is_empty());
    }

    #[test]
    fn test_extract_no_links() {
        assert!(extract("<html><body><h1>test</h1></body></html>").is_empty());
    }

    #[test]
    fn test_extract_single() {
        assert_eq!(
            extract(r#"<html><body><a href="test"></a></body></html>"#),
            vec!["http://www.google.com/test"]
        );
    }

    #[test]
    fn test_extract_document_order() {
        let html = r#"
            <html>
                <body>
                    <h1>Test</h1>
                    <a href="http://www.test.com"></a>
                    <a href="test2"></a>
                    <a href="test1"></a>
                </body>
            </html>
        "#;

        assert_eq!(
            extract(html),
            vec![
                "http://www.test.com/",
                "http://www.google.com/test2",
                "http://www.google.com/test1",
            ]
        );
    }

    #[test]
    fn test_duplicates_preserved() {
        let html = r##"<a href="/a"></a><a href="/a#top"></a><a href="/a"></a>"##;
        assert_eq!(extract(html).len(), 3);
    }

    #[test]
    fn test_malformed_href_does_not_abort_page() {
        let html = r#"
            <a href="/before">Before</a>
            <a href="http://[invalid">Broken</a>
            <a href="mailto:someone@example.com">Mail</a>
            <a href="/after">After</a>
        "#;

        assert_eq!(
            extract(html),
            vec!["http://www.google.com/before", "http://www.google.com/after"]
        );
    }

    #[test]
    fn test_anchor_without_href_ignored() {
        let html = r#"<a name="top">Top</a><a href="/x">X</a>"#;
        assert_eq!(extract(html), vec!["http://www.google.com/x"]);
    }

    #[test]
    fn test_non_anchor_elements_ignored() {
        let html = r#"
            <link rel="stylesheet" href="/style.css">
            <script src="/app.js"></script>
            <img src="/logo.png">
            <a href="/page">Page</a>
        "#;
        assert_eq!(extract(html), vec!["http://www.google.com/page"]);
    }

    #[test]
    fn test_unclosed_markup() {
        let html = r#"<html><body><div><a href="/one">one<a href="/two">two"#;
        assert_eq!(
            extract(html),
            vec!["http://www.google.com/one", "http://www.google.com/two"]
        );
    }
}
