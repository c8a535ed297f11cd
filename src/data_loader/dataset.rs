//! Core dataset abstractions for adlio's high-level data-loader.
//!
//! A [`Dataset`] is the minimum surface needed to iterate over samples
//! and (optionally) fetch them at random indices.  Shared-state datasets
//! build on this in `sync_dataset`; ordering and resumption live in
//! `sampler`.

use async_trait::async_trait;
use futures_core::stream::Stream;
use std::pin::Pin;
use thiserror::Error;
use anyhow::{self, Error as AnyError};

/// A boxed, pinned, sendable async stream of fallible items.
pub type DynStream<T> =
    Pin<Box<dyn Stream<Item = Result<T, DatasetError>> + Send + 'static>>;

/// Item-level error type for dataset, sampler & loader operations.
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("index out of range: {0}")]
    IndexOutOfRange(usize),

    #[error("operation not supported for this dataset type")]
    Unsupported,

    /// A shared configuration key was read before any write.
    #[error("shared key not found: {0}")]
    KeyNotFound(String),

    /// A process-local attribute was read before any write.
    #[error("attribute not found: {0}")]
    AttributeNotFound(String),

    /// A constructor argument was out of its valid range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Item fields could not be reconciled into one batch column.
    #[error("cannot collate field '{0}': mismatched value types")]
    CollateMismatch(String),

    // Generic backend error
    #[error(transparent)]
    Backend(#[from] AnyError),
}

// Mapping from string to error
impl From<String> for DatasetError {
    fn from(s: String) -> Self {
        DatasetError::Backend(AnyError::msg(s))
    }
}

impl From<&str> for DatasetError {
    fn from(s: &str) -> Self {
        DatasetError::Backend(AnyError::msg(s.to_string()))
    }
}

/// A logical collection of **samples** (e.g. audio excerpts, parsed
/// examples, rows of a table).
///
/// Implementors fall into two broad categories:
///
/// * **Map-style** – support random access through [`Dataset::get`];
///   `len()` normally returns `Some(_)`.
/// * **Iterable** – deliver data solely via `as_stream`; `len()` often
///   returns `None`.
#[async_trait]
pub trait Dataset: Send + Sync + 'static {
    /// Concrete Rust type produced for each sample.  For an audio loader
    /// this is usually [`crate::audio::Item`]; simpler datasets may use
    /// `Vec<u8>` or their own struct.
    type Item: Send + 'static;

    /// Total number of samples if known *a priori*; otherwise `None`.
    fn len(&self) -> Option<usize>;

    /// Retrieve a sample by zero-based index.  Iterable-only datasets may
    /// return `DatasetError::Unsupported`.
    async fn get(&self, index: usize) -> Result<Self::Item, DatasetError>;

    /// Provide an async stream of samples if the dataset is iterable.
    /// Map-style datasets can simply keep the default (`None`).
    fn as_stream(&self) -> Option<DynStream<Self::Item>> {
        None
    }

    /// Convenience helper.
    fn is_empty(&self) -> bool {
        self.len().map(|n| n == 0).unwrap_or(false)
    }
}
