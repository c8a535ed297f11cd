//! src/data_loader/sampler.rs
//! Samplers for the data loader.
//!
//! A [`Sampler`] produces a stream of indices into a map-style dataset;
//! an [`EpochSampler`] produces whole epochs of positions at a time and is
//! what the `DataLoader` drives.  Base strategies:
//!  * `SequentialSampler`  – yields 0..end in order.
//!  * `ShuffleSampler`     – yields 0..len in a deterministic shuffled order.
//!  * `DistributedShuffle` – per-epoch reshuffled order, sharded round-robin
//!                           across cooperating replicas.
//!
//! The `Resumable*` wrappers add a skip-once state machine on top: the first
//! epoch after construction drops a prefix of already-consumed positions,
//! every later epoch runs in full.

use log::debug;
use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::data_loader::dataset::DatasetError;

/// Trait for index producers.
pub trait Sampler {
    /// Return the next index to fetch, or `None` when exhausted.
    fn next_index(&mut self) -> Option<usize>;
    /// (Optional) remaining items hint.
    fn remaining(&self) -> Option<usize> {
        None
    }
}

/// Yields `0, 1, 2, …, end-1` once.
#[derive(Debug, Clone)]
pub struct SequentialSampler {
    curr: usize,
    end: usize,
}

impl SequentialSampler {
    /// Create a sequential sampler over `[0, end)`.
    pub fn new(end: usize) -> Self {
        Self { curr: 0, end }
    }
}

impl Sampler for SequentialSampler {
    fn next_index(&mut self) -> Option<usize> {
        if self.curr < self.end {
            let i = self.curr;
            self.curr += 1;
            Some(i)
        } else {
            None
        }
    }

    fn remaining(&self) -> Option<usize> {
        Some(self.end.saturating_sub(self.curr))
    }
}

/// Deterministic shuffled permutation of `0..len` made with `seed`.
fn shuffled_indices(len: usize, seed: u64) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..len).collect();
    let mut rng = ChaCha20Rng::seed_from_u64(seed);

    // Manual Fisher–Yates shuffle
    for i in (1..len).rev() {
        let j = (rng.next_u32() as usize) % (i + 1);
        indices.swap(i, j);
    }
    indices
}

/// Yields all indices `0..len` in a deterministic shuffled order.
#[derive(Debug, Clone)]
pub struct ShuffleSampler {
    indices: Vec<usize>,
    pos: usize,
}

impl ShuffleSampler {
    /// Create a shuffled sampler for `len` items, using `seed`.
    pub fn new(len: usize, seed: u64) -> Self {
        Self { indices: shuffled_indices(len, seed), pos: 0 }
    }
}

impl Sampler for ShuffleSampler {
    fn next_index(&mut self) -> Option<usize> {
        if self.pos < self.indices.len() {
            let i = self.indices[self.pos];
            self.pos += 1;
            Some(i)
        } else {
            None
        }
    }

    fn remaining(&self) -> Option<usize> {
        Some(self.indices.len().saturating_sub(self.pos))
    }
}

/// Epoch-oriented index producer.
///
/// `next_epoch_positions` is called once per epoch and returns that epoch's
/// complete visit order.  Implementations may recompute (e.g. reshuffle)
/// the order on every call.
pub trait EpochSampler: Send {
    fn next_epoch_positions(&mut self) -> Vec<usize>;
}

/// Skip-once resume state.
///
/// `FreshEpoch` means a prefix of already-consumed positions is still
/// pending removal; the transition to `FullEpoch` happens after exactly one
/// traversal and is never reversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpochState {
    FreshEpoch { start_index: usize },
    FullEpoch,
}

fn validate_start(start_index: usize, len: usize) -> Result<(), DatasetError> {
    // start_index == len is a legal empty first traversal.  Negative values
    // are unrepresentable here; anything past the end is a caller bug.
    if start_index > len {
        return Err(DatasetError::InvalidArgument(format!(
            "start_index {start_index} exceeds dataset length {len}"
        )));
    }
    Ok(())
}

/// Sequential order with mid-epoch resume.
///
/// The first epoch yields `start_index..len`; every later epoch yields the
/// full `0..len`.  `start_index == 0` takes the same path, it just skips
/// nothing.
#[derive(Debug, Clone)]
pub struct ResumableSequentialSampler {
    len: usize,
    state: EpochState,
}

impl ResumableSequentialSampler {
    pub fn new(len: usize, start_index: usize) -> Result<Self, DatasetError> {
        validate_start(start_index, len)?;
        Ok(Self { len, state: EpochState::FreshEpoch { start_index } })
    }

    pub fn state(&self) -> EpochState {
        self.state
    }
}

impl EpochSampler for ResumableSequentialSampler {
    fn next_epoch_positions(&mut self) -> Vec<usize> {
        let skip = match self.state {
            EpochState::FreshEpoch { start_index } => {
                debug!(
                    "sequential sampler: resuming at position {start_index} of {}",
                    self.len
                );
                self.state = EpochState::FullEpoch;
                start_index
            }
            EpochState::FullEpoch => 0,
        };
        (skip..self.len).collect()
    }
}

/// Per-epoch reshuffled order, sharded round-robin across `num_replicas`
/// cooperating workers.
///
/// The permutation is padded by wrap-around so every replica receives
/// `ceil(len / num_replicas)` positions, then replica `rank` takes every
/// `num_replicas`-th entry.  The shuffle seed is `seed + epoch`, so all
/// replicas agree on each epoch's permutation without talking to each other.
#[derive(Debug, Clone)]
pub struct DistributedShuffle {
    len: usize,
    num_replicas: usize,
    rank: usize,
    seed: u64,
    epoch: u64,
}

impl DistributedShuffle {
    pub fn new(
        len: usize,
        num_replicas: usize,
        rank: usize,
        seed: u64,
    ) -> Result<Self, DatasetError> {
        if num_replicas == 0 {
            return Err(DatasetError::InvalidArgument(
                "num_replicas must be >= 1".to_string(),
            ));
        }
        if rank >= num_replicas {
            return Err(DatasetError::InvalidArgument(format!(
                "rank {rank} out of range for {num_replicas} replicas"
            )));
        }
        Ok(Self { len, num_replicas, rank, seed, epoch: 0 })
    }

    /// Positions each replica receives per epoch.
    pub fn per_replica_len(&self) -> usize {
        self.len.div_ceil(self.num_replicas)
    }

    pub fn num_replicas(&self) -> usize {
        self.num_replicas
    }
}

impl EpochSampler for DistributedShuffle {
    fn next_epoch_positions(&mut self) -> Vec<usize> {
        let order = shuffled_indices(self.len, self.seed.wrapping_add(self.epoch));
        self.epoch += 1;
        if self.len == 0 {
            return Vec::new();
        }
        let total = self.per_replica_len() * self.num_replicas;
        (self.rank..total)
            .step_by(self.num_replicas)
            .map(|i| order[i % self.len]) // wrap-around padding
            .collect()
    }
}

/// Distributed order with mid-epoch resume.
///
/// `global_start_index` counts positions consumed across *all* replicas;
/// the stored per-replica offset is `global_start_index / num_replicas`.
/// When the global index is not a multiple of the replica count the floor
/// division under-skips by at most one position per replica, a documented
/// imprecision accepted for best-effort resume of long runs.
#[derive(Debug, Clone)]
pub struct ResumableDistributedSampler {
    base: DistributedShuffle,
    state: EpochState,
}

impl ResumableDistributedSampler {
    pub fn new(
        len: usize,
        num_replicas: usize,
        rank: usize,
        seed: u64,
        global_start_index: usize,
    ) -> Result<Self, DatasetError> {
        validate_start(global_start_index, len)?;
        let base = DistributedShuffle::new(len, num_replicas, rank, seed)?;
        let start_index = global_start_index / num_replicas;
        Ok(Self { base, state: EpochState::FreshEpoch { start_index } })
    }

    pub fn state(&self) -> EpochState {
        self.state
    }

    /// Per-replica start offset derived from the global start index.
    pub fn start_offset(&self) -> usize {
        match self.state {
            EpochState::FreshEpoch { start_index } => start_index,
            EpochState::FullEpoch => 0,
        }
    }
}

impl EpochSampler for ResumableDistributedSampler {
    fn next_epoch_positions(&mut self) -> Vec<usize> {
        let positions = self.base.next_epoch_positions();
        let skip = match self.state {
            EpochState::FreshEpoch { start_index } => {
                debug!(
                    "distributed sampler: rank {} resuming at local position {start_index}",
                    self.base.rank
                );
                self.state = EpochState::FullEpoch;
                start_index
            }
            EpochState::FullEpoch => 0,
        };
        positions.into_iter().skip(skip).collect()
    }
}
