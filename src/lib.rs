// src/lib.rs
//
// Crate root — public re-exports for the adlio data-loading layer.

pub mod audio;
pub mod config;
pub mod data_loader;

// ===== Re-exports expected at the crate root =====
// Types:
pub use crate::data_loader::dataloader::DataLoader;
pub use crate::data_loader::dataset::{Dataset, DatasetError};
pub use crate::data_loader::options::LoaderOptions;
// Module alias so callers can use `adlio::dataset::DynStream`:
pub use crate::data_loader::dataset; // re-export the whole module as `adlio::dataset`

// Shared-state dataset core:
pub use crate::data_loader::shared::{
    AttrValue, ConfigValue, LocalState, SharedConfig, SharedStore,
};
pub use crate::data_loader::sync_dataset::SyncDataset;

// Samplers:
pub use crate::data_loader::sampler::{
    DistributedShuffle, EpochSampler, EpochState, ResumableDistributedSampler,
    ResumableSequentialSampler, Sampler, SequentialSampler, ShuffleSampler,
};

// Collation and transforms:
pub use crate::data_loader::collate::collate;
pub use crate::data_loader::transform::{item_rng, Gain, Transform};

// Audio item shapes:
pub use crate::audio::{AudioBuffer, Batch, BatchField, Field, Item, SignalBatch};
