// src/data_loader/options.rs
//!
//! Knobs the loader honors, with builder helpers so callers can write a
//! fluent style:
//!
//! let opts = LoaderOptions::default()
//!     .with_batch_size(128)
//!     .drop_last(true)
//!     .shuffle(true, 42)
//!     .num_workers(8)
//!     .prefetch(16)
//!     .shard(rank, world_size)
//!     .resume_from(saved_position);
//!

use crate::config;

#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// Number of samples per batch.
    pub batch_size: usize,
    /// Whether to drop the final, possibly incomplete batch.
    pub drop_last: bool,

    /// If true, use a shuffled sampler (deterministic with `seed`).
    pub shuffle: bool,
    /// RNG seed used when `shuffle == true` or when sharded.  Ignored
    /// otherwise.
    pub seed: u64,
    /// Number of parallel fetch workers. `0` means "auto" (use number of CPUs).
    pub num_workers: usize,
    /// Size of the bounded prefetch queue. `0` disables prefetching.
    pub prefetch: usize,

    /// Replica rank in the distributed job (0-based).
    pub shard_rank: usize,
    /// Total number of replicas in the distributed job. `1` means unsharded.
    pub shard_world_size: usize,

    /// Resume position for the first epoch.  `None` starts from the top;
    /// for sharded loaders this is the *global* (pre-shard) position.
    pub start_index: Option<usize>,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            batch_size: config::default_batch_size(),
            drop_last: false,
            shuffle: false,
            seed: 0,
            num_workers: config::default_num_workers(),
            prefetch: config::default_prefetch(),
            shard_rank: 0,
            shard_world_size: 1,
            start_index: None,
        }
    }
}

impl LoaderOptions {
    /// Builder-style helper: change the batch size.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Builder-style helper: set `drop_last`.
    pub fn drop_last(mut self, yes: bool) -> Self {
        self.drop_last = yes;
        self
    }

    /// Enable/disable shuffling and set seed.
    ///
    /// When `on` is false, the seed is left unchanged but ignored.
    pub fn shuffle(mut self, on: bool, seed: u64) -> Self {
        self.shuffle = on;
        if on {
            self.seed = seed;
        }
        self
    }

    /// Set the number of worker tasks used for fetching.
    ///
    /// `0` means "auto", which the loader interprets as the number of CPUs.
    pub fn num_workers(mut self, n: usize) -> Self {
        self.num_workers = n;
        self
    }

    /// Set the number of batches buffered ahead of the consumer.
    ///
    /// `0` disables prefetching.
    pub fn prefetch(mut self, n: usize) -> Self {
        self.prefetch = n;
        self
    }

    /// Set distributed sharding (rank/world_size).
    pub fn shard(mut self, rank: usize, world: usize) -> Self {
        self.shard_rank = rank;
        self.shard_world_size = world.max(1);
        self
    }

    /// Resume the first epoch from a previously recorded position.
    pub fn resume_from(mut self, start_index: usize) -> Self {
        self.start_index = Some(start_index);
        self
    }
}
