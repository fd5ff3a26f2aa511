use crate::output::RecordFormat;
use serde::Deserialize;
use std::time::Duration;

/// Default HTTP timeout for a single fetch (milliseconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 2000;

/// Default number of fetch workers
pub const DEFAULT_WORKERS: usize = 10;

/// Default capacity of the frontier and result channels
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Main configuration structure for Sumi-Crawl
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Number of concurrent fetch workers
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Absolute http(s) URL the crawl starts from
    #[serde(rename = "seed-url", default)]
    pub seed_url: String,

    /// Capacity of the frontier and per-worker result channels
    #[serde(rename = "channel-capacity", default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Deadline for a whole request, body included (milliseconds)
    #[serde(rename = "timeout-ms", default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

/// Output configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// Page record format written to stdout
    #[serde(default)]
    pub format: RecordFormat,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            seed_url: String::new(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl HttpConfig {
    /// Returns the request timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

fn default_channel_capacity() -> usize {
    DEFAULT_CHANNEL_CAPACITY
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}
