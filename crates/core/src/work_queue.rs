//! A bounded producer / consumer queue feeding a pool of workers.
//!
//! Items are pushed into a bounded request channel. A single relay task
//! takes them off one by one, runs them through a transform and forwards
//! the result into a bounded work channel that any number of workers can
//! pull from.
//!
//! The transform runs synchronously on the relay task, so it sees items in
//! submission order. Returning `None` from the transform drops the item
//! instead of forwarding it.
//!
//! Cancelling the quit token stops the relay. An item that has already
//! been taken off the request channel is forwarded unless quit fires
//! while the relay is waiting for space in the work channel.

use async_channel::{Receiver, Sender};
use tokio_util::{sync::CancellationToken, task::TaskTracker};

/// Spawn the relay task of a new work queue onto `tracker`.
///
/// Returns the request side and the work side of the queue. Capacities
/// below 1 are raised to 1.
pub fn work_queue<R, W, F>(
    request_capacity: usize,
    work_capacity: usize,
    transform: F,
    quit: CancellationToken,
    tracker: &TaskTracker,
) -> (Sender<R>, Receiver<W>)
where
    R: Send + 'static,
    W: Send + 'static,
    F: FnMut(R) -> Option<W> + Send + 'static,
{
    let (request_tx, request_rx) =
        async_channel::bounded(request_capacity.max(1));
    let (work_tx, work_rx) = async_channel::bounded(work_capacity.max(1));

    tracker.spawn(relay(request_rx, work_tx, transform, quit));

    (request_tx, work_rx)
}

async fn relay<R, W, F>(
    request_rx: Receiver<R>,
    work_tx: Sender<W>,
    mut transform: F,
    quit: CancellationToken,
) where
    F: FnMut(R) -> Option<W>,
{
    loop {
        let item = tokio::select! {
            biased;
            _ = quit.cancelled() => break,
            item = request_rx.recv() => match item {
                Ok(item) => item,
                // All request senders are gone.
                Err(_) => break,
            },
        };

        let Some(work) = transform(item) else {
            continue;
        };

        tokio::select! {
            biased;
            _ = quit.cancelled() => break,
            res = work_tx.send(work) => {
                if res.is_err() {
                    // All workers are gone.
                    break;
                }
            }
        }
    }

    tracing::trace!("work queue relay exiting");
}
