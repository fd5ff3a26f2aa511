//! Configuration module for Sumi-Crawl
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files. Every setting has a default, so a crawl can also be configured
//! entirely from the command line or the `WORKERS` / `URL` environment.
//!
//! # Example
//!
//! ```no_run
//! use sumi_crawl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawl.toml")).unwrap();
//! println!("Crawler will use {} workers", config.crawler.workers);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, HttpConfig, OutputConfig, DEFAULT_CHANNEL_CAPACITY, DEFAULT_TIMEOUT_MS,
    DEFAULT_WORKERS,
};

// Re-export parser functions
pub use parser::{load_config, parse_config, read_config};
pub use validation::validate;
