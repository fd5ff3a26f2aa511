//! Crawl coordinator - the result loop
//!
//! This module wires the pieces of a crawl together and runs the single
//! loop that consumes their output:
//! - Seeding the dispatcher and spawning the worker pool
//! - Merging every worker's page and error stream
//! - Writing page records and feeding discovered links back
//! - Absorbing recoverable errors and aborting on fatal ones

use crate::config::{CrawlerConfig, DEFAULT_CHANNEL_CAPACITY};
use crate::crawler::dispatcher::Dispatcher;
use crate::crawler::fetcher::HttpFetch;
use crate::crawler::merge::fan_in;
use crate::crawler::worker::spawn_workers;
use crate::crawler::Page;
use crate::output::{CrawlSummary, PageWriter, RecordFormat};
use crate::url::normalize_url;
use crate::{ConfigError, CrawlError};
use std::sync::Arc;
use tokio::io::AsyncWrite;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// A configured crawler
///
/// One `Crawler` can run any number of crawls, sequentially or at the same
/// time; each [`crawl`](Self::crawl) call has its own frontier, visited set
/// and worker pool.
pub struct Crawler<F> {
    fetcher: Arc<F>,
    workers: usize,
    channel_capacity: usize,
    format: RecordFormat,
}

impl<F: HttpFetch> Crawler<F> {
    /// Creates a crawler running `workers` concurrent fetches
    pub fn new(workers: usize, fetcher: F) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            workers,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            format: RecordFormat::default(),
        }
    }

    /// Creates a crawler from the crawler configuration section
    pub fn from_config(config: &CrawlerConfig, fetcher: F) -> Self {
        Self::new(config.workers, fetcher).with_channel_capacity(config.channel_capacity)
    }

    /// Sets the capacity of the frontier and result channels
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Sets the page record format
    pub fn with_format(mut self, format: RecordFormat) -> Self {
        self.format = format;
        self
    }

    /// Crawls the site at `seed_url`, writing one record per page to `sink`
    ///
    /// Returns once every reachable same-host page has been handled, or as
    /// soon as a fatal error occurs. Either way no task spawned for this
    /// crawl is left running.
    ///
    /// # Errors
    ///
    /// * `CrawlError::Config` - zero workers or zero channel capacity
    /// * `CrawlError::UrlParse` - the seed is not an absolute http(s) URL
    /// * `CrawlError::Transport` / `BodyRead` / `Output` - fatal crawl errors
    ///
    /// # Example
    ///
    /// ```
    /// use sumi_crawl::{Crawler, StaticSite};
    ///
    /// # async fn example() -> sumi_crawl::Result<()> {
    /// let site = StaticSite::new().page("http://x.test/", r#"<a href="/a">A</a>"#);
    /// let mut out = Vec::new();
    /// let summary = Crawler::new(4, site).crawl("http://x.test/", &mut out).await?;
    /// assert_eq!(summary.pages_emitted, 1);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn crawl<W>(&self, seed_url: &str, sink: W) -> Result<CrawlSummary, CrawlError>
    where
        W: AsyncWrite + Unpin,
    {
        if self.workers == 0 {
            return Err(ConfigError::Validation(
                "workers must be greater than zero".to_string(),
            )
            .into());
        }
        if self.channel_capacity == 0 {
            return Err(ConfigError::Validation(
                "channel capacity must be greater than zero".to_string(),
            )
            .into());
        }

        let seed = normalize_url(seed_url).map_err(|source| CrawlError::UrlParse {
            url: seed_url.to_string(),
            source,
        })?;

        tracing::info!("Starting crawl of {} with {} workers", seed, self.workers);

        let cancel = CancellationToken::new();
        let tracker = TaskTracker::new();
        let mut summary = CrawlSummary::start();

        let (frontier_tx, frontier_rx) = mpsc::channel(self.channel_capacity);
        let outputs = spawn_workers(
            self.workers,
            Arc::clone(&self.fetcher),
            frontier_rx,
            self.channel_capacity,
            &cancel,
            &tracker,
        );
        let pages = fan_in(outputs.pages, self.channel_capacity, &cancel, &tracker);
        let errors = fan_in(outputs.errors, self.channel_capacity, &cancel, &tracker);

        let mut dispatcher = Dispatcher::seed(seed, frontier_tx, cancel.clone(), tracker.clone());
        let mut writer = PageWriter::new(sink, self.format);

        let result = run_result_loop(&mut dispatcher, pages, errors, &mut writer, &mut summary).await;
        summary.urls_admitted = dispatcher.visited_count() as u64;

        // Every task selects on this token, so the wait below is short even
        // when the loop bailed out with work still in flight.
        cancel.cancel();
        tracker.close();
        drop(dispatcher);
        tracker.wait().await;

        summary.finish();
        match result {
            Ok(()) => {
                tracing::info!(
                    "Crawl drained: {} pages written, {} URLs admitted",
                    summary.pages_emitted,
                    summary.urls_admitted
                );
                Ok(summary)
            }
            Err(e) => {
                tracing::error!("Crawl aborted after {} pages: {}", summary.pages_emitted, e);
                Err(e)
            }
        }
    }
}

/// Consumes the merged streams until both are exhausted
///
/// Returns early with the first fatal error.
async fn run_result_loop<W: AsyncWrite + Unpin>(
    dispatcher: &mut Dispatcher,
    mut pages: mpsc::Receiver<Page>,
    mut errors: mpsc::Receiver<CrawlError>,
    writer: &mut PageWriter<W>,
    summary: &mut CrawlSummary,
) -> Result<(), CrawlError> {
    let mut pages_open = true;
    let mut errors_open = true;

    while pages_open || errors_open {
        tokio::select! {
            page = pages.recv(), if pages_open => match page {
                Some(page) => handle_page(dispatcher, page, writer, summary).await?,
                None => pages_open = false,
            },
            err = errors.recv(), if errors_open => match err {
                Some(err) => handle_error(dispatcher, err, summary)?,
                None => errors_open = false,
            },
        }
    }

    dispatcher.terminate();
    Ok(())
}

async fn handle_page<W: AsyncWrite + Unpin>(
    dispatcher: &mut Dispatcher,
    page: Page,
    writer: &mut PageWriter<W>,
    summary: &mut CrawlSummary,
) -> Result<(), CrawlError> {
    writer.write_page(&page).await.map_err(CrawlError::Output)?;
    summary.record_page(page.links.len());

    let mut admitted = 0;
    for link in &page.links {
        if dispatcher.register(link) {
            dispatcher.publish(link.clone());
            admitted += 1;
        }
    }

    tracing::debug!(
        "Processed {}: {} links, {} new, {} outstanding",
        page.url,
        page.links.len(),
        admitted,
        dispatcher.outstanding()
    );

    dispatcher.complete();
    Ok(())
}

fn handle_error(
    dispatcher: &mut Dispatcher,
    err: CrawlError,
    summary: &mut CrawlSummary,
) -> Result<(), CrawlError> {
    if !err.is_recoverable() {
        return Err(err);
    }

    tracing::warn!("[{}] {}", err.kind(), err);
    summary.record_error(err.kind());
    dispatcher.complete();
    Ok(())
}
