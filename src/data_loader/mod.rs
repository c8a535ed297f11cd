// src/data_loader/mod.rs

//! Public API surface for the adlio data_loader layer.
/// expose the `dataloader` module (file dataloader.rs)
pub mod dataloader;

/// expose the `dataset` module (file dataset.rs)
pub mod dataset;

/// expose the `options` module (file options.rs)
pub mod options;

/// shared-across-workers dataset state
pub mod shared;
pub mod sync_dataset;

/// index ordering, resumable epoch samplers
pub mod sampler;

/// batch collation and prefetching
pub mod collate;
pub mod prefetch;

/// item transforms
pub mod transform;

// Re-export the key types at this level:
pub use collate::collate;
pub use dataloader::DataLoader;
pub use dataset::{Dataset, DatasetError, DynStream};
pub use options::LoaderOptions;
pub use sampler::{
    DistributedShuffle, EpochSampler, EpochState, ResumableDistributedSampler,
    ResumableSequentialSampler, Sampler, SequentialSampler, ShuffleSampler,
};
pub use shared::{AttrValue, ConfigValue, LocalState, SharedConfig, SharedStore};
pub use sync_dataset::SyncDataset;
pub use transform::Transform;
