//! Crawl statistics
//!
//! The result loop fills in a [`CrawlSummary`] as it works; the binary logs
//! it once the crawl has drained.

use crate::ErrorKind;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;

/// Crawl statistics summary
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    /// When the crawl started
    pub started_at: DateTime<Utc>,

    /// When the crawl drained (None while still running)
    pub finished_at: Option<DateTime<Utc>>,

    /// Number of page records written
    pub pages_emitted: u64,

    /// Total number of links listed across all pages (duplicates included)
    pub links_found: u64,

    /// Number of URLs admitted to the frontier, seed included
    pub urls_admitted: u64,

    /// Recoverable errors absorbed during the crawl, by kind
    pub recoverable_errors: HashMap<ErrorKind, u64>,
}

impl CrawlSummary {
    /// Starts a new summary clocked at the current time
    pub fn start() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            pages_emitted: 0,
            links_found: 0,
            urls_admitted: 0,
            recoverable_errors: HashMap::new(),
        }
    }

    /// Records a written page
    pub fn record_page(&mut self, link_count: usize) {
        self.pages_emitted += 1;
        self.links_found += link_count as u64;
    }

    /// Records an absorbed error
    pub fn record_error(&mut self, kind: ErrorKind) {
        *self.recoverable_errors.entry(kind).or_insert(0) += 1;
    }

    /// Total number of absorbed errors
    pub fn total_errors(&self) -> u64 {
        self.recoverable_errors.values().sum()
    }

    /// Marks the crawl as finished
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Wall-clock duration, if the crawl has finished
    pub fn duration(&self) -> Option<Duration> {
        self.finished_at
            .and_then(|finished| (finished - self.started_at).to_std().ok())
    }
}

/// Logs a summary at info level
pub fn log_summary(summary: &CrawlSummary) {
    let elapsed = summary.duration().unwrap_or_default();
    let rate = if elapsed.as_secs_f64() > 0.0 {
        summary.pages_emitted as f64 / elapsed.as_secs_f64()
    } else {
        0.0
    };

    tracing::info!(
        "Crawl completed: {} pages, {} links, {} URLs admitted in {:?} ({:.2} pages/sec)",
        summary.pages_emitted,
        summary.links_found,
        summary.urls_admitted,
        elapsed,
        rate
    );

    let mut errors: Vec<_> = summary.recoverable_errors.iter().collect();
    errors.sort_by(|a, b| b.1.cmp(a.1));
    for (kind, count) in errors {
        tracing::info!("  {}: {}", kind, count);
    }
}
