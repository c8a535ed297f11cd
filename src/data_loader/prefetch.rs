//! Prefetch helper for the data loader.
//!
//! Spawn a simple async forwarder over an upstream batch stream.
//! Returns a `Receiver` that runs up to `cap` batches ahead of the
//! consumer.  Requires a tokio runtime.

use futures_core::stream::Stream;
use futures_util::StreamExt;
use tokio::sync::mpsc::{channel, Receiver};

use crate::data_loader::dataset::DatasetError;

/// Spawn an async prefetcher over `upstream`.
///
/// The task forwards until the stream ends, the consumer hangs up, or an
/// error comes through (the error is forwarded, then the task stops).
pub fn spawn_prefetch<T, S>(cap: usize, upstream: S) -> Receiver<Result<T, DatasetError>>
where
    S: Stream<Item = Result<T, DatasetError>> + Send + Unpin + 'static,
    T: Send + 'static,
{
    let (tx, rx) = channel(cap.max(1));
    tokio::spawn(async move {
        let mut upstream = upstream;
        while let Some(item) = upstream.next().await {
            let stop = item.is_err();
            if tx.send(item).await.is_err() || stop {
                break;
            }
        }
    });
    rx
}
