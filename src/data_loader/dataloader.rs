//! Epoch-oriented `DataLoader`.
//!
//! * Handles **map-style** and **iterable** datasets transparently.
//! * Map-style visit order comes from an [`EpochSampler`] chosen from the
//!   options (sequential / shuffled / distributed, resumable when a start
//!   position is supplied) or injected via [`DataLoader::with_sampler`].
//! * Yields `Result<Vec<Item>, DatasetError>` where each `Vec` is a batch.
//!
//! One call to [`DataLoader::next_epoch`] is one epoch; the sampler keeps
//! its skip-once resume state across calls.

use crate::data_loader::dataset::{Dataset, DatasetError};
use crate::data_loader::options::LoaderOptions;
use crate::data_loader::prefetch::spawn_prefetch;
use crate::data_loader::sampler::{
    EpochSampler, ResumableDistributedSampler, ResumableSequentialSampler,
};

use async_stream::try_stream;
use futures_core::stream::Stream;
use futures_util::StreamExt;
use log::debug;
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::wrappers::ReceiverStream;

type BatchStream<T> =
    Pin<Box<dyn Stream<Item = Result<Vec<T>, DatasetError>> + Send + 'static>>;

/// High-level iterator that produces batched samples from a dataset.
pub struct DataLoader<D>
where
    D: Dataset,
{
    dataset: Arc<D>,
    sampler: Box<dyn EpochSampler>,
    opts: LoaderOptions,
}

impl<D> DataLoader<D>
where
    D: Dataset,
{
    /// Create a loader whose sampler is chosen from `opts`.
    ///
    /// Fails with `InvalidArgument` when the resume position or the shard
    /// layout is out of range for the dataset.  Map-style datasets must
    /// report `len`; a dataset with neither a length nor a stream produces
    /// empty epochs.
    pub fn new(dataset: D, opts: LoaderOptions) -> Result<Self, DatasetError> {
        let n = dataset.len().unwrap_or(0);
        let start = opts.start_index.unwrap_or(0);
        let sampler: Box<dyn EpochSampler> = if opts.shard_world_size > 1 {
            Box::new(ResumableDistributedSampler::new(
                n,
                opts.shard_world_size,
                opts.shard_rank,
                opts.seed,
                start,
            )?)
        } else if opts.shuffle {
            // single-replica shuffle is the one-replica distributed layout
            Box::new(ResumableDistributedSampler::new(n, 1, 0, opts.seed, start)?)
        } else {
            Box::new(ResumableSequentialSampler::new(n, start)?)
        };
        Ok(Self { dataset: Arc::new(dataset), sampler, opts })
    }

    /// Create a loader around a caller-supplied sampler.
    pub fn with_sampler(
        dataset: D,
        sampler: Box<dyn EpochSampler>,
        opts: LoaderOptions,
    ) -> Self {
        Self { dataset: Arc::new(dataset), sampler, opts }
    }

    /// Return an **async stream** over one epoch of batches.
    ///
    /// ```ignore
    /// # use adlio::{DataLoader, LoaderOptions};
    /// # async fn demo<D: adlio::Dataset>(ds: D) -> anyhow::Result<()> {
    /// let mut loader = DataLoader::new(ds, LoaderOptions::default().resume_from(4096))?;
    /// loop {
    ///     let mut batches = loader.next_epoch();
    ///     while let Some(batch) = batches.next().await {
    ///         let data = batch?; // Vec<D::Item>
    ///         // training step ...
    ///     }
    /// }
    /// # Ok(()) }
    /// ```
    pub fn next_epoch(&mut self) -> BatchStream<D::Item> {
        let ds = self.dataset.clone();
        let opts = self.opts.clone();

        // -------- Iterable dataset ---------------------------------------
        // Delivery order is the stream's own; the sampler is not consulted.
        if let Some(mut st) = ds.as_stream() {
            let bs = opts.batch_size;
            let drop_last = opts.drop_last;
            return Box::pin(try_stream! {
                let mut acc = Vec::with_capacity(bs);
                while let Some(item) = st.next().await {
                    acc.push(item?);
                    if acc.len() == bs {
                        yield std::mem::take(&mut acc);
                    }
                }
                if !acc.is_empty() && !drop_last {
                    yield acc;
                }
            });
        }

        // -------- Map-style dataset --------------------------------------
        let order = self.sampler.next_epoch_positions();
        debug!(
            "epoch start: {} positions, batch_size={}, workers={}",
            order.len(),
            opts.batch_size,
            opts.num_workers
        );

        let workers = effective_workers(opts.num_workers);
        let bs = opts.batch_size;
        let drop_last = opts.drop_last;
        let inner: BatchStream<D::Item> = Box::pin(try_stream! {
            let fetch_ds = ds.clone();
            let mut fetched = futures_util::stream::iter(order.into_iter())
                .map(move |idx| {
                    let ds = fetch_ds.clone();
                    async move { ds.get(idx).await }
                })
                .buffered(workers); // order-preserving concurrency
            let mut acc = Vec::with_capacity(bs);
            while let Some(item) = fetched.next().await {
                acc.push(item?);
                if acc.len() == bs {
                    yield std::mem::take(&mut acc);
                }
            }
            if !acc.is_empty() && !drop_last {
                yield acc;
            }
        });

        if opts.prefetch > 0 {
            let rx = spawn_prefetch(opts.prefetch, inner);
            Box::pin(ReceiverStream::new(rx))
        } else {
            inner
        }
    }
}

/// `0` means "auto": one fetch slot per CPU.
fn effective_workers(num_workers: usize) -> usize {
    if num_workers == 0 {
        num_cpus::get().max(1)
    } else {
        num_workers
    }
}

impl<D> std::fmt::Debug for DataLoader<D>
where
    D: Dataset,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataLoader")
            .field("batch_size", &self.opts.batch_size)
            .field("shard_world_size", &self.opts.shard_world_size)
            .finish()
    }
}
