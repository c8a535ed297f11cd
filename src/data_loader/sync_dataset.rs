// src/data_loader/sync_dataset.rs
//
// Base state every worker-synchronized dataset embeds.  The shared half
// (duration / transform / sample_rate) routes through one SharedStore that
// all worker handles reference; the local half is plain per-handle data.
// Concrete datasets embed `SyncDataset` and implement `Dataset` on top.

use std::sync::Arc;

use log::debug;

use crate::data_loader::shared::{LocalState, SharedConfig};
use crate::data_loader::transform::Transform;

/// Worker-synchronized dataset core.
///
/// `length` is deliberately process-local: every worker must be handed a
/// handle constructed (or cloned) from the same instance, and the count is
/// fixed at construction.  Only the three shared-config keys synchronize.
#[derive(Clone, Debug)]
pub struct SyncDataset {
    length: usize,
    shared: SharedConfig,
    local: LocalState,
}

impl SyncDataset {
    /// Create a dataset core with a fresh shared store.
    ///
    /// The store is created here, before any worker handle exists, so every
    /// handle cloned from this instance shares it.
    pub fn new(length: usize) -> Self {
        debug!("SyncDataset::new length={length}");
        Self {
            length,
            shared: SharedConfig::new(),
            local: LocalState::new(),
        }
    }

    /// Builder-style: seed the shared excerpt duration (seconds).
    pub fn with_duration(self, secs: f64) -> Self {
        self.shared.set_duration(secs);
        self
    }

    /// Builder-style: seed the shared target sample rate.
    pub fn with_sample_rate(self, rate: u32) -> Self {
        self.shared.set_sample_rate(rate);
        self
    }

    /// Builder-style: seed the shared item transform.
    pub fn with_transform(self, transform: Arc<dyn Transform>) -> Self {
        self.shared.set_transform(transform);
        self
    }

    /// Number of addressable items (fixed at construction, never shared).
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Synchronized configuration.  Reads of a key that was never written
    /// fail with `KeyNotFound`.
    pub fn shared(&self) -> &SharedConfig {
        &self.shared
    }

    /// Per-handle attributes.  Never synchronized.
    pub fn local(&self) -> &LocalState {
        &self.local
    }

    pub fn local_mut(&mut self) -> &mut LocalState {
        &mut self.local
    }

    /// Make the handle a worker receives: the shared store is the same
    /// object, the local state is an independent copy.  Equivalent to
    /// `clone()`; the name states the intent at call sites.
    pub fn clone_for_worker(&self) -> Self {
        self.clone()
    }
}
