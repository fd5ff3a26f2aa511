//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run full crawls
//! through the reqwest-backed fetcher.

use std::collections::BTreeMap;
use std::time::Duration;
use sumi_crawl::config::{Config, HttpConfig};
use sumi_crawl::output::decode_records;
use sumi_crawl::{crawl, Crawler, ErrorKind, RecordFormat, ReqwestFetcher};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PAGES: [&str; 6] = ["/", "/one", "/two", "/three", "/four", "/five"];

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", body))
        .insert_header("content-type", "text/html")
}

fn fetcher(timeout_ms: u64) -> ReqwestFetcher {
    let config = HttpConfig {
        timeout_ms,
        ..HttpConfig::default()
    };
    ReqwestFetcher::new(&config).expect("Failed to build HTTP client")
}

fn by_url(output: &[u8], format: RecordFormat) -> BTreeMap<String, Vec<String>> {
    decode_records(std::str::from_utf8(output).unwrap(), format)
        .expect("Output should decode into page records")
        .into_iter()
        .map(|page| {
            let links = page.links.iter().map(|l| l.to_string()).collect();
            (page.url.to_string(), links)
        })
        .collect()
}

/// Mounts six pages that all link to each other and to one off-host page
async fn mount_interlinked_site(mock_server: &MockServer) {
    let body = r#"
        <h1>Test</h1>
        <a href="http://www.test.com">Link 1</a>
        <a href="/one">Link 1</a>
        <a href="/two">Link 1</a>
        <a href="/three">Link 1</a>
        <a href="/four">Link 1</a>
        <a href="/five">Link 1</a>
    "#;

    for page in PAGES {
        Mock::given(method("GET"))
            .and(path(page))
            .respond_with(html(body))
            .expect(1) // Every page is fetched exactly once
            .mount(mock_server)
            .await;
    }
}

#[tokio::test]
async fn test_full_crawl_interlinked_site() {
    let mock_server = MockServer::start().await;
    mount_interlinked_site(&mock_server).await;
    let base_url = mock_server.uri();

    let mut output = Vec::new();
    let summary = Crawler::new(1, fetcher(2000))
        .crawl(&base_url, &mut output)
        .await
        .expect("Crawl failed");

    assert_eq!(summary.pages_emitted, 6);

    let pages = by_url(&output, RecordFormat::Text);
    assert_eq!(pages.len(), 6);

    let expected_links: Vec<String> = std::iter::once("http://www.test.com/".to_string())
        .chain(PAGES[1..].iter().map(|p| format!("{}{}", base_url, p)))
        .collect();

    for page in PAGES {
        let url = format!("{}{}", base_url, page);
        assert_eq!(pages[&url], expected_links, "links of {}", url);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_worker_count_does_not_change_result() {
    let mut results = Vec::new();

    for workers in [1, 10, 100] {
        let mock_server = MockServer::start().await;
        mount_interlinked_site(&mock_server).await;

        let mut output = Vec::new();
        Crawler::new(workers, fetcher(2000))
            .with_format(RecordFormat::Json)
            .crawl(&mock_server.uri(), &mut output)
            .await
            .expect("Crawl failed");

        // Strip the per-server origin so runs can be compared.
        let origin = mock_server.uri();
        let normalized: BTreeMap<String, Vec<String>> = by_url(&output, RecordFormat::Json)
            .into_iter()
            .map(|(url, links)| {
                let links = links.into_iter().map(|l| l.replace(&origin, "")).collect();
                (url.replace(&origin, ""), links)
            })
            .collect();
        results.push(normalized);
    }

    assert_eq!(results[0].len(), 6);
    assert_eq!(results[0], results[1]);
    assert_eq!(results[1], results[2]);
}

#[tokio::test]
async fn test_error_statuses_are_skipped() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<a href="/ok">ok</a><a href="/missing">missing</a><a href="/broken">broken</a>"#,
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(html(""))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1) // Failed fetches are never retried
        .mount(&mock_server)
        .await;

    let mut output = Vec::new();
    let summary = Crawler::new(3, fetcher(2000))
        .crawl(&mock_server.uri(), &mut output)
        .await
        .expect("Error statuses should not abort the crawl");

    assert_eq!(summary.pages_emitted, 2);
    assert_eq!(summary.recoverable_errors[&ErrorKind::HttpStatus], 2);
}

#[tokio::test]
async fn test_timeout_is_recoverable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/slow">slow</a>"#))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html("").set_delay(Duration::from_secs(5)))
        .mount(&mock_server)
        .await;

    let mut output = Vec::new();
    let summary = Crawler::new(2, fetcher(200))
        .crawl(&mock_server.uri(), &mut output)
        .await
        .expect("Timeouts should not abort the crawl");

    assert_eq!(summary.pages_emitted, 1);
    assert_eq!(summary.recoverable_errors[&ErrorKind::TransportTimeout], 1);
}

#[tokio::test]
async fn test_connection_refused_is_fatal() {
    // Grab a free port and release it so nothing is listening there.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let err = Crawler::new(2, fetcher(2000))
        .crawl(&format!("http://127.0.0.1:{}/", port), Vec::new())
        .await
        .expect_err("Connection errors should abort the crawl");

    assert_eq!(err.kind(), ErrorKind::TransportOther);
}

#[tokio::test]
async fn test_crawl_from_config() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/a#section">a</a><a href="mailto:x@y.z">mail</a>"#))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(html(r#"<a href="/">home</a>"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = Config::default();
    config.crawler.seed_url = mock_server.uri();
    config.crawler.workers = 4;
    config.output.format = RecordFormat::Json;

    let mut output = Vec::new();
    let summary = crawl(&config, &mut output).await.expect("Crawl failed");

    assert_eq!(summary.pages_emitted, 2);
    let pages = by_url(&output, RecordFormat::Json);
    assert_eq!(
        pages[&format!("{}/", mock_server.uri())],
        vec![format!("{}/a", mock_server.uri())]
    );
}

#[tokio::test]
async fn test_invalid_config_fails_before_fetching() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(html(""))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut config = Config::default();
    config.crawler.seed_url = mock_server.uri();
    config.crawler.workers = 0;

    let err = crawl(&config, Vec::new()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[tokio::test]
async fn test_body_timeout_is_recoverable() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    // Sends the headers and part of the body, then stalls past the client timeout.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut request = [0u8; 1024];
                let _ = socket.read(&mut request).await;
                let _ = socket
                    .write_all(
                        b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 100\r\n\r\n<html>",
                    )
                    .await;
                let _ = socket.flush().await;
                tokio::time::sleep(Duration::from_secs(3)).await;
            });
        }
    });

    let mut output = Vec::new();
    let summary = Crawler::new(2, fetcher(300))
        .crawl(&format!("http://{}/", addr), &mut output)
        .await
        .expect("A slow body should not abort the crawl");

    assert_eq!(summary.pages_emitted, 0);
    assert!(output.is_empty());
    assert_eq!(summary.recoverable_errors[&ErrorKind::TransportTimeout], 1);
}

#[tokio::test]
async fn test_unparsable_seed_in_config_is_url_parse() {
    let mut config = Config::default();
    config.crawler.seed_url = "::not a url::".to_string();

    let err = crawl(&config, Vec::new()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UrlParse);
}

#[tokio::test]
async fn test_client_build_failure_is_config_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(html(""))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut config = Config::default();
    config.crawler.seed_url = mock_server.uri();
    config.http.user_agent = "sumi\ncrawl".to_string();

    let err = crawl(&config, Vec::new()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
}
