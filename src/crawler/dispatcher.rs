//! Dispatcher: frontier ownership, dedup and termination detection
//!
//! The dispatcher owns three things:
//! - The sending half of the frontier channel
//! - The visited set of normalized URLs
//! - The outstanding-work counter
//!
//! The counter starts at 1 for the seed. Every admitted link increments it
//! before the link is published, and every resolved fetch decrements it once
//! the result has been fully handled. It can therefore only reach zero when
//! no publish is pending, and reaching zero is what closes the frontier.
//!
//! All of this is mutated through `&mut self` from the result loop alone;
//! workers never see the dispatcher.

use crate::url::is_same_host;
use std::collections::HashSet;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use url::Url;

/// Lifecycle of a crawl as seen by the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    /// Work is outstanding; the frontier is open
    Running,
    /// The frontier is closed; workers are finishing in-flight fetches
    Draining,
    /// Every result stream has closed
    Terminated,
}

/// Owns the frontier and decides when the crawl is over
pub struct Dispatcher {
    seed: Url,
    visited: HashSet<String>,
    outstanding: usize,
    frontier: Option<mpsc::Sender<Url>>,
    state: DispatcherState,
    cancel: CancellationToken,
    tracker: TaskTracker,
}

impl Dispatcher {
    /// Seeds the frontier
    ///
    /// The seed is marked visited, counted as the one outstanding item, and
    /// published like any other link.
    ///
    /// Publish tasks are spawned on `tracker` and stop as soon as `cancel`
    /// fires.
    pub fn seed(
        seed: Url,
        frontier: mpsc::Sender<Url>,
        cancel: CancellationToken,
        tracker: TaskTracker,
    ) -> Self {
        let mut visited = HashSet::new();
        visited.insert(seed.as_str().to_string());

        let dispatcher = Self {
            seed: seed.clone(),
            visited,
            outstanding: 1,
            frontier: Some(frontier),
            state: DispatcherState::Running,
            cancel,
            tracker,
        };

        tracing::debug!("Seeding frontier with {}", seed);
        dispatcher.publish(seed);
        dispatcher
    }

    /// Admits a discovered URL
    ///
    /// Returns true if the URL is on the seed's host and has not been seen
    /// before. An admitted URL is marked visited and counted as outstanding;
    /// the caller must then [`publish`](Self::publish) it.
    ///
    /// Nothing is admitted once the frontier has closed.
    pub fn register(&mut self, url: &Url) -> bool {
        if self.frontier.is_none() || !is_same_host(url, &self.seed) {
            return false;
        }

        if !self.visited.insert(url.as_str().to_string()) {
            return false;
        }

        self.outstanding += 1;
        true
    }

    /// Publishes an admitted URL onto the frontier
    ///
    /// The send happens on its own task so that frontier backpressure never
    /// blocks the caller.
    pub fn publish(&self, url: Url) {
        let Some(frontier) = self.frontier.clone() else {
            tracing::debug!("Frontier closed, dropping {}", url);
            return;
        };
        let cancel = self.cancel.clone();

        self.tracker.spawn(async move {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {}
                result = frontier.send(url) => {
                    if let Err(e) = result {
                        tracing::debug!("Frontier closed before {} was queued", e.0);
                    }
                }
            }
        });
    }

    /// Resolves one unit of outstanding work
    ///
    /// Closes the frontier when the last unit resolves.
    pub fn complete(&mut self) {
        debug_assert!(self.outstanding > 0, "complete() without outstanding work");
        self.outstanding = self.outstanding.saturating_sub(1);

        if self.outstanding == 0 && self.frontier.take().is_some() {
            tracing::debug!(
                "All outstanding work resolved after {} URLs, closing frontier",
                self.visited.len()
            );
            self.state = DispatcherState::Draining;
        }
    }

    /// Records that every result stream has closed
    pub fn terminate(&mut self) {
        self.frontier = None;
        self.state = DispatcherState::Terminated;
    }

    /// Current lifecycle state
    pub fn state(&self) -> DispatcherState {
        self.state
    }

    /// Number of queued or in-flight work items
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Number of URLs admitted so far, seed included
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }
}
