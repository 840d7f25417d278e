// THEORY:
// The `stream` module is the asynchronous face of the comparison engine. It lets
// an async consumer receive clusters one by one while the scan runs on tokio's
// blocking pool, without stalling the runtime.
//
// Key architectural principles:
// 1.  **Fail Before Spawning**: Configuration and dimensions are checked on the
//     caller's task. A `DimensionMismatch` never starts a worker.
// 2.  **Off-Runtime Work**: The mask is built inside `spawn_blocking`; a second
//     blocking worker owns the `ClusterScan` for the rest of the comparison.
// 3.  **Single-Slot Handoff**: Worker and consumer share a bounded channel with
//     room for one cluster, so the worker is never more than one cluster ahead of
//     the consumer.
// 4.  **Cooperative Cancellation**: Dropping the `ClusterStream` closes the
//     channel. The worker's next send fails, it drops the scan and exits.

use crate::config::DiffConfig;
use crate::core_modules::cluster::Cluster;
use crate::core_modules::cluster_detector::cluster_detector::ClusterScan;
use crate::core_modules::difference_mask::difference_mask::ensure_same_dimensions;
use crate::core_modules::pixel::pixel::PixelBuffer;
use crate::error::DiffError;
use crate::pipeline::build_mask;
use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

const HANDOFF_CAPACITY: usize = 1;

/// Clusters of one comparison, delivered as the scan finds them.
pub struct ClusterStream {
    receiver: mpsc::Receiver<Cluster>,
    worker: JoinHandle<usize>,
}

impl ClusterStream {
    /// Stops receiving and waits for the worker to wind down.
    /// Returns how many clusters the worker handed over.
    pub async fn join(self) -> Result<usize, DiffError> {
        let ClusterStream { receiver, worker } = self;
        drop(receiver);
        Ok(worker.await?)
    }
}

impl Stream for ClusterStream {
    type Item = Cluster;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Cluster>> {
        self.receiver.poll_recv(cx)
    }
}

/// Starts a comparison whose clusters are pulled through a [`Stream`].
///
/// The mask is complete when this returns; cluster extraction proceeds only as
/// fast as the stream is polled.
pub async fn compare_stream<A, B>(
    first: Arc<A>,
    second: Arc<B>,
    config: DiffConfig,
) -> Result<ClusterStream, DiffError>
where
    A: PixelBuffer + Send + Sync + 'static,
    B: PixelBuffer + Send + Sync + 'static,
{
    config.validate()?;
    ensure_same_dimensions(&*first, &*second)?;

    let options = config.cluster_options();
    let mask = tokio::task::spawn_blocking(move || build_mask(&*first, &*second, &config))
        .await??;

    let (sender, receiver) = mpsc::channel(HANDOFF_CAPACITY);
    let worker = tokio::task::spawn_blocking(move || {
        let mut handed_over = 0;
        for cluster in ClusterScan::new(mask, options) {
            if sender.blocking_send(cluster).is_err() {
                debug!(handed_over, "cluster stream dropped, abandoning scan");
                return handed_over;
            }
            handed_over += 1;
        }
        debug!(handed_over, "cluster scan finished");
        handed_over
    });

    Ok(ClusterStream { receiver, worker })
}
