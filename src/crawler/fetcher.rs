//! HTTP fetcher implementation
//!
//! This module handles:
//! - The fetch capability the crawl engine consumes ([`HttpFetch`])
//! - Building the production HTTP client over reqwest
//! - Fetching one URL and classifying the outcome into a page or an error

use crate::config::HttpConfig;
use crate::crawler::parser::extract_links;
use crate::crawler::Page;
use crate::CrawlError;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use reqwest::Client;
use std::future::Future;
use std::io;
use thiserror::Error;
use url::Url;

/// Response body as a stream of chunks
pub type BodyStream = BoxStream<'static, io::Result<Bytes>>;

/// A response from the fetch capability
pub struct FetchResponse {
    /// HTTP status code
    pub status: u16,

    /// Response body, read to the end by the worker
    pub body: BodyStream,
}

impl std::fmt::Debug for FetchResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// A request that produced no response
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The request exceeded its deadline
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Connection refused, DNS failure, TLS error, ...
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Returns true if the request failed because it ran out of time
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

/// The fetch capability consumed by the crawl engine
///
/// Implementations own every transport concern: TLS, connection reuse and
/// timeout enforcement. The engine only looks at the status code, reads the
/// body, and asks [`TransportError::is_timeout`] when a request fails.
pub trait HttpFetch: Send + Sync + 'static {
    /// Issues a GET request for `url`
    fn get(&self, url: &Url) -> impl Future<Output = Result<FetchResponse, TransportError>> + Send;
}

/// Production fetcher backed by a reqwest client
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    /// Builds a fetcher from the HTTP configuration
    pub fn new(config: &HttpConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
        })
    }

    /// Wraps an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl HttpFetch for ReqwestFetcher {
    async fn get(&self, url: &Url) -> Result<FetchResponse, TransportError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        Ok(FetchResponse {
            status: response.status().as_u16(),
            body: response.bytes_stream().map_err(body_error).boxed(),
        })
    }
}

/// Builds an HTTP client with proper configuration
///
/// The timeout covers the whole request, body included. A body that is
/// still arriving when it fires is reported as a transport timeout.
///
/// # Example
///
/// ```no_run
/// use sumi_crawl::config::HttpConfig;
/// use sumi_crawl::crawler::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(config.timeout())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Keeps a client deadline that fires mid-body recognizable as a timeout
fn body_error(e: reqwest::Error) -> io::Error {
    if e.is_timeout() {
        io::Error::new(io::ErrorKind::TimedOut, e)
    } else {
        io::Error::other(e)
    }
}

fn classify_reqwest_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout(e.to_string())
    } else {
        TransportError::Other(e.to_string())
    }
}

/// Fetches a URL and classifies the outcome
///
/// | Outcome | Result |
/// |---------|--------|
/// | Transport timeout | `CrawlError::TransportTimeout` |
/// | Other transport failure | `CrawlError::Transport` |
/// | Status >= 400 | `CrawlError::HttpStatus` |
/// | Body read timed out | `CrawlError::TransportTimeout` |
/// | Other body read failure | `CrawlError::BodyRead` |
/// | Otherwise | `Page` with the extracted links |
///
/// Nothing is retried.
pub async fn fetch_page<F: HttpFetch>(fetcher: &F, url: Url) -> Result<Page, CrawlError> {
    let response = match fetcher.get(&url).await {
        Ok(response) => response,
        Err(TransportError::Timeout(message)) => {
            return Err(CrawlError::TransportTimeout {
                url: url.to_string(),
                message,
            })
        }
        Err(TransportError::Other(message)) => {
            return Err(CrawlError::Transport {
                url: url.to_string(),
                message,
            })
        }
    };

    if response.status >= 400 {
        return Err(CrawlError::HttpStatus {
            url: url.to_string(),
            status: response.status,
        });
    }

    let body = match read_body(response.body).await {
        Ok(body) => body,
        Err(source) if source.kind() == io::ErrorKind::TimedOut => {
            return Err(CrawlError::TransportTimeout {
                url: url.to_string(),
                message: source.to_string(),
            })
        }
        Err(source) => {
            return Err(CrawlError::BodyRead {
                url: url.to_string(),
                source,
            })
        }
    };

    let html = String::from_utf8_lossy(&body);
    let links = extract_links(&html, &url);
    tracing::debug!("Fetched {} ({} links)", url, links.len());

    Ok(Page { url, links })
}

async fn read_body(mut body: BodyStream) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    while let Some(chunk) = body.try_next().await? {
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}
