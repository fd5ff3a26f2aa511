//! In-memory fetcher
//!
//! [`StaticSite`] serves a fixed set of pages without touching the network.
//! Unknown URLs answer 404. Routes can also be set up to time out, fail at
//! the transport level, break or stall while the body is read, or never
//! answer at all, which makes it the fetcher of choice for exercising the
//! engine.

use crate::crawler::fetcher::{FetchResponse, HttpFetch, TransportError};
use bytes::Bytes;
use futures::StreamExt;
use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone)]
enum Route {
    Response { status: u16, body: String },
    Timeout,
    ConnectionError(String),
    BrokenBody,
    StalledBody,
    Hang,
}

/// A site served from memory
#[derive(Debug, Clone, Default)]
pub struct StaticSite {
    routes: HashMap<String, Route>,
    latency: Option<Duration>,
    hits: Arc<Mutex<HashMap<String, usize>>>,
}

impl StaticSite {
    /// Creates an empty site
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `html` with status 200 at `url`
    pub fn page(self, url: &str, html: &str) -> Self {
        self.status(url, 200, html)
    }

    /// Serves `body` with the given status at `url`
    pub fn status(self, url: &str, status: u16, body: &str) -> Self {
        self.route(
            url,
            Route::Response {
                status,
                body: body.to_string(),
            },
        )
    }

    /// Requests for `url` fail with a transport timeout
    pub fn timeout(self, url: &str) -> Self {
        self.route(url, Route::Timeout)
    }

    /// Requests for `url` fail with a non-timeout transport error
    pub fn connection_error(self, url: &str, message: &str) -> Self {
        self.route(url, Route::ConnectionError(message.to_string()))
    }

    /// Requests for `url` answer 200 but the body fails mid-read
    pub fn broken_body(self, url: &str) -> Self {
        self.route(url, Route::BrokenBody)
    }

    /// Requests for `url` answer 200 but the deadline fires mid-body
    pub fn stalled_body(self, url: &str) -> Self {
        self.route(url, Route::StalledBody)
    }

    /// Requests for `url` never complete
    pub fn hang(self, url: &str) -> Self {
        self.route(url, Route::Hang)
    }

    /// Delays every response by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of times `url` has been requested
    pub fn hits(&self, url: &str) -> usize {
        let hits = self.hits.lock().unwrap_or_else(|e| e.into_inner());
        hits.get(&route_key(url)).copied().unwrap_or(0)
    }

    /// Total number of requests served
    pub fn total_hits(&self) -> usize {
        let hits = self.hits.lock().unwrap_or_else(|e| e.into_inner());
        hits.values().sum()
    }

    fn route(mut self, url: &str, route: Route) -> Self {
        self.routes.insert(route_key(url), route);
        self
    }

    fn record_hit(&self, key: &str) {
        let mut hits = self.hits.lock().unwrap_or_else(|e| e.into_inner());
        *hits.entry(key.to_string()).or_insert(0) += 1;
    }
}

/// Keys routes by their parsed form so `http://x.test` and `http://x.test/`
/// name the same page
fn route_key(url: &str) -> String {
    Url::parse(url)
        .map(String::from)
        .unwrap_or_else(|_| url.to_string())
}

impl HttpFetch for StaticSite {
    async fn get(&self, url: &Url) -> Result<FetchResponse, TransportError> {
        let key = url.as_str();
        self.record_hit(key);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        match self.routes.get(key).cloned() {
            None => Ok(FetchResponse {
                status: 404,
                body: futures::stream::empty().boxed(),
            }),
            Some(Route::Response { status, body }) => Ok(FetchResponse {
                status,
                body: futures::stream::iter(vec![Ok(Bytes::from(body))]).boxed(),
            }),
            Some(Route::Timeout) => Err(TransportError::Timeout(format!(
                "deadline exceeded for {}",
                url
            ))),
            Some(Route::ConnectionError(message)) => Err(TransportError::Other(message)),
            Some(Route::BrokenBody) => Ok(FetchResponse {
                status: 200,
                body: futures::stream::iter(vec![
                    Ok(Bytes::from_static(b"<html><body><a href=\"/")),
                    Err(io::Error::new(
                        io::ErrorKind::ConnectionReset,
                        "connection reset while reading body",
                    )),
                ])
                .boxed(),
            }),
            Some(Route::StalledBody) => Ok(FetchResponse {
                status: 200,
                body: futures::stream::iter(vec![
                    Ok(Bytes::from_static(b"<html>")),
                    Err(io::Error::new(io::ErrorKind::TimedOut, "operation timed out")),
                ])
                .boxed(),
            }),
            Some(Route::Hang) => futures::future::pending().await,
        }
    }
}
