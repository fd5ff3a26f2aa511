//! Fetch worker pool
//!
//! Every worker pulls URLs from the one shared frontier until it closes,
//! fetches each through the shared [`HttpFetch`] capability, and sends the
//! outcome to its own page or error channel. Workers share nothing else.

use crate::crawler::fetcher::{fetch_page, HttpFetch};
use crate::crawler::Page;
use crate::CrawlError;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use url::Url;

/// Receiving end of the frontier, shared by every worker
struct Frontier {
    rx: Mutex<mpsc::Receiver<Url>>,
}

impl Frontier {
    /// Waits for the next URL; None once the frontier is closed and empty
    async fn next(&self) -> Option<Url> {
        self.rx.lock().await.recv().await
    }
}

/// Per-worker output channels
pub struct WorkerOutputs {
    pub pages: Vec<mpsc::Receiver<Page>>,
    pub errors: Vec<mpsc::Receiver<CrawlError>>,
}

/// Spawns `count` workers over `frontier`
///
/// Each worker gets its own page and error channel of `capacity`. Both close
/// when the worker stops, which happens once the frontier is exhausted or
/// `cancel` fires.
pub fn spawn_workers<F: HttpFetch>(
    count: usize,
    fetcher: Arc<F>,
    frontier: mpsc::Receiver<Url>,
    capacity: usize,
    cancel: &CancellationToken,
    tracker: &TaskTracker,
) -> WorkerOutputs {
    let frontier = Arc::new(Frontier {
        rx: Mutex::new(frontier),
    });
    let mut outputs = WorkerOutputs {
        pages: Vec::with_capacity(count),
        errors: Vec::with_capacity(count),
    };

    for id in 0..count {
        let (page_tx, page_rx) = mpsc::channel(capacity.max(1));
        let (error_tx, error_rx) = mpsc::channel(capacity.max(1));
        outputs.pages.push(page_rx);
        outputs.errors.push(error_rx);

        tracker.spawn(run_worker(
            id,
            Arc::clone(&fetcher),
            Arc::clone(&frontier),
            page_tx,
            error_tx,
            cancel.clone(),
        ));
    }

    outputs
}

async fn run_worker<F: HttpFetch>(
    id: usize,
    fetcher: Arc<F>,
    frontier: Arc<Frontier>,
    pages: mpsc::Sender<Page>,
    errors: mpsc::Sender<CrawlError>,
    cancel: CancellationToken,
) {
    tracing::trace!(worker = id, "Worker started");

    loop {
        let url = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            next = frontier.next() => match next {
                Some(url) => url,
                None => break,
            },
        };

        tracing::trace!(worker = id, %url, "Fetching");
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = fetch_page(fetcher.as_ref(), url) => result,
        };

        let delivered = match result {
            Ok(page) => deliver(&pages, page, &cancel).await,
            Err(err) => deliver(&errors, err, &cancel).await,
        };
        if !delivered {
            break;
        }
    }

    tracing::trace!(worker = id, "Worker stopped");
}

/// Sends `value` unless the crawl is cancelled or the receiver is gone
async fn deliver<T>(tx: &mpsc::Sender<T>, value: T, cancel: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        result = tx.send(value) => result.is_ok(),
    }
}
