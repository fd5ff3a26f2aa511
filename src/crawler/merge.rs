//! Fan-in of worker output streams

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Merges `sources` into a single receiver
///
/// One forwarding task per source is spawned on `tracker`. The merged
/// receiver closes once every source has closed (or `cancel` fires). Items
/// from different sources arrive in whatever order their forwarders run.
pub fn fan_in<T: Send + 'static>(
    sources: Vec<mpsc::Receiver<T>>,
    capacity: usize,
    cancel: &CancellationToken,
    tracker: &TaskTracker,
) -> mpsc::Receiver<T> {
    let (tx, rx) = mpsc::channel(capacity.max(1));

    for mut source in sources {
        let tx = tx.clone();
        let cancel = cancel.clone();

        tracker.spawn(async move {
            loop {
                let item = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    item = source.recv() => match item {
                        Some(item) => item,
                        None => break,
                    },
                };

                let sent = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => false,
                    result = tx.send(item) => result.is_ok(),
                };
                if !sent {
                    break;
                }
            }
        });
    }

    rx
}
