//! Worker-shared dataset state, end to end.
//!
//! A mock tone dataset embeds `SyncDataset` the way a real audio dataset
//! would: its excerpt duration, target sample rate and transform live in
//! the shared config, so every worker handle cut from one instance reads
//! the same values, while local attributes stay per-handle.

use std::sync::Arc;

use adlio::{
    collate, AttrValue, AudioBuffer, BatchField, DataLoader, Dataset, DatasetError,
    Field, Gain, Item, LoaderOptions, SyncDataset,
};

use async_trait::async_trait;
use futures_util::StreamExt;

/// Generates constant-level clips whose length tracks the shared config.
/// Clip `idx` is one frame longer than clip `idx - 1` so collation has
/// something to pad.
#[derive(Clone)]
struct ToneDataset {
    core: SyncDataset,
}

impl ToneDataset {
    fn new(n: usize, sample_rate: u32, duration: f64) -> Self {
        Self {
            core: SyncDataset::new(n)
                .with_sample_rate(sample_rate)
                .with_duration(duration),
        }
    }
}

#[async_trait]
impl Dataset for ToneDataset {
    type Item = Item;

    fn len(&self) -> Option<usize> {
        Some(self.core.len())
    }

    async fn get(&self, index: usize) -> Result<Item, DatasetError> {
        if index >= self.core.len() {
            return Err(DatasetError::IndexOutOfRange(index));
        }
        let rate = self.core.shared().sample_rate()?;
        let duration = self.core.shared().duration()?;
        let frames = (duration * rate as f64) as usize + index;
        let signal = AudioBuffer::from_mono(vec![0.5; frames], rate)?;

        let mut item = Item::new();
        item.insert("source_idx".to_string(), Field::Int(index as i64));

        // transform is optional; unset means no extra fields
        match self.core.shared().transform() {
            Ok(t) => {
                let mut rng = adlio::item_rng(index as u64);
                item.append(&mut t.instantiate(&mut rng, &signal)?);
            }
            Err(DatasetError::KeyNotFound(_)) => {}
            Err(e) => return Err(e),
        }

        item.insert("signal".to_string(), Field::Signal(signal));
        Ok(item)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Shared vs local state across worker handles
// ────────────────────────────────────────────────────────────────────────────

#[test]
fn shared_config_is_one_store_across_handles() {
    let ds = ToneDataset::new(16, 22_050, 0.25);
    let worker_a = ds.clone();
    let worker_b = ds.clone();

    // write through one handle, read through another
    worker_a.core.shared().set_sample_rate(44_100);
    assert_eq!(worker_b.core.shared().sample_rate().unwrap(), 44_100);
    assert_eq!(ds.core.shared().sample_rate().unwrap(), 44_100);

    // two independently constructed datasets never share
    let other = ToneDataset::new(16, 8000, 0.25);
    assert_eq!(other.core.shared().sample_rate().unwrap(), 8000);
}

#[test]
fn transform_installed_after_cloning_reaches_workers() {
    let ds = ToneDataset::new(4, 8000, 0.1);
    let worker = ds.clone();

    assert!(matches!(
        worker.core.shared().transform(),
        Err(DatasetError::KeyNotFound(_))
    ));
    ds.core
        .shared()
        .set_transform(Arc::new(Gain::new(-6.0, 0.0).unwrap()));
    assert_eq!(worker.core.shared().transform().unwrap().name(), "gain");
}

#[test]
fn local_attributes_stay_per_handle() {
    let mut ds = ToneDataset::new(4, 8000, 0.1);
    ds.core.local_mut().set("loudness_cutoff", AttrValue::Float(-40.0));
    let mut worker = ds.clone();
    worker
        .core
        .local_mut()
        .set("loudness_cutoff", AttrValue::Float(-30.0));

    assert_eq!(
        ds.core.local().get("loudness_cutoff").unwrap(),
        AttrValue::Float(-40.0)
    );
    assert_eq!(
        worker.core.local().get("loudness_cutoff").unwrap(),
        AttrValue::Float(-30.0)
    );
}

#[tokio::test]
async fn unseeded_duration_fails_the_fetch() {
    let ds = ToneDataset {
        core: SyncDataset::new(4).with_sample_rate(8000), // duration never set
    };
    match ds.get(0).await {
        Err(DatasetError::KeyNotFound(k)) => assert_eq!(k, "duration"),
        other => panic!("expected KeyNotFound, got {other:?}"),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Full pipeline: loader → items → collate
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn loader_and_collate_produce_padded_signal_batches() {
    let mut ds = ToneDataset::new(9, 8000, 0.01); // base clip: 80 frames
    ds.core
        .shared()
        .set_transform(Arc::new(Gain::new(-12.0, 0.0).unwrap()));

    let opts = LoaderOptions::default().with_batch_size(3).num_workers(2);
    let mut loader = DataLoader::new(ds, opts).unwrap();

    let mut batches = loader.next_epoch();
    let mut seen = 0usize;
    while let Some(batch) = batches.next().await {
        let items = batch.unwrap();
        let collated = collate(&items).unwrap();

        match collated.get("signal").unwrap() {
            BatchField::Signals(sb) => {
                assert_eq!(sb.batch_size(), 3);
                assert_eq!(sb.sample_rate, 8000);
                // sequential order: lengths are consecutive, padded to the max
                assert_eq!(sb.padded_frames(), *sb.lengths.iter().max().unwrap());
                assert!(sb.loudness_db.iter().all(|db| db.is_finite()));
            }
            other => panic!("expected signal batch, got {other:?}"),
        }
        match collated.get("source_idx").unwrap() {
            BatchField::Ints(v) => {
                assert_eq!(v, &vec![seen as i64, seen as i64 + 1, seen as i64 + 2]);
            }
            other => panic!("expected int column, got {other:?}"),
        }
        match collated.get("gain_db").unwrap() {
            BatchField::Scalars(v) => {
                assert_eq!(v.len(), 3);
                assert!(v.iter().all(|g| (-12.0..=0.0).contains(g)));
            }
            other => panic!("expected scalar column, got {other:?}"),
        }
        seen += 3;
    }
    assert_eq!(seen, 9);
}

/// Resuming a run over a synchronized dataset picks up mid-epoch and the
/// shared store still serves every handle the loader fetches through.
#[tokio::test]
async fn resumed_epoch_over_synchronized_dataset() {
    let ds = ToneDataset::new(10, 8000, 0.01);
    let opts = LoaderOptions::default().with_batch_size(2).resume_from(6);
    let mut loader = DataLoader::new(ds, opts).unwrap();

    let first: Vec<i64> = loader
        .next_epoch()
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .flat_map(Result::unwrap)
        .map(|item| match item.get("source_idx") {
            Some(Field::Int(i)) => *i,
            other => panic!("missing source_idx: {other:?}"),
        })
        .collect();
    assert_eq!(first, vec![6, 7, 8, 9]);

    let second: Vec<_> = loader.next_epoch().collect::<Vec<_>>().await;
    let count: usize = second.into_iter().map(|b| b.unwrap().len()).sum();
    assert_eq!(count, 10);
}
