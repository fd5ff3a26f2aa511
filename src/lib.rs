//! Sumi-Crawl: a bounded-concurrency site crawler
//!
//! This crate crawls a web site from a seed page, following same-host links,
//! and writes one record per visited page listing every link found on it.
//! The crawl ends exactly when the reachable same-host graph is exhausted.

pub mod config;
pub mod crawler;
pub mod output;
pub mod url;

use std::fmt;
use thiserror::Error;

/// Main error type for a crawl
///
/// Every variant maps onto one [`ErrorKind`], which decides whether the
/// result loop absorbs the error or aborts the crawl with it.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[source] ConfigError),

    #[error("Invalid seed URL {url}: {source}")]
    UrlParse { url: String, source: UrlError },

    #[error("Request timeout for {url}: {message}")]
    TransportTimeout { url: String, message: String },

    #[error("HTTP error for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("{url} returned status code: {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("Failed to read response body from {url}: {source}")]
    BodyRead { url: String, source: std::io::Error },

    #[error("Failed to write page record: {0}")]
    Output(#[source] std::io::Error),
}

impl CrawlError {
    /// Returns the classification tag of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Config,
            Self::UrlParse { .. } => ErrorKind::UrlParse,
            Self::TransportTimeout { .. } => ErrorKind::TransportTimeout,
            Self::Transport { .. } => ErrorKind::TransportOther,
            Self::HttpStatus { .. } => ErrorKind::HttpStatus,
            Self::BodyRead { .. } => ErrorKind::BodyRead,
            Self::Output(_) => ErrorKind::Output,
        }
    }

    /// Returns true if the crawl should log this error and carry on
    pub fn is_recoverable(&self) -> bool {
        self.kind().is_recoverable()
    }
}

impl From<ConfigError> for CrawlError {
    /// A seed that does not parse is a `url-parse` error wherever it is caught
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::InvalidUrl { url, source } => Self::UrlParse { url, source },
            other => Self::Config(other),
        }
    }
}

/// Classification of crawl errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The crawl settings are invalid
    Config,
    /// The seed URL could not be parsed
    UrlParse,
    /// The fetch exceeded its deadline
    TransportTimeout,
    /// Connection, DNS, TLS or any other transport failure
    TransportOther,
    /// The response status was 400 or above
    HttpStatus,
    /// The response body could not be read or closed
    BodyRead,
    /// A page record could not be written to the output sink
    Output,
}

impl ErrorKind {
    /// Timeouts and error statuses are absorbed; everything else aborts the crawl
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::TransportTimeout | Self::HttpStatus)
    }

    /// Returns the tag used in log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Config => "config",
            Self::UrlParse => "url-parse",
            Self::TransportTimeout => "transport-timeout",
            Self::TransportOther => "transport-other",
            Self::HttpStatus => "http-status",
            Self::BodyRead => "body-read",
            Self::Output => "output",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid seed URL '{url}': {source}")]
    InvalidUrl { url: String, source: UrlError },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{crawl, Crawler, HttpFetch, Page, ReqwestFetcher, StaticSite};
pub use output::{CrawlSummary, RecordFormat};
pub use crate::url::{is_same_host, normalize_url};
