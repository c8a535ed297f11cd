//! Item transforms.
//!
//! A [`Transform`] is instantiated per item with a deterministic,
//! index-seeded RNG and returns extra fields that the dataset merges into
//! the item record.  Transforms are stored behind the shared config so
//! every worker handle applies the same one.

use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::audio::{AudioBuffer, Field, Item};
use crate::data_loader::dataset::DatasetError;

/// Deterministic per-item RNG.  Datasets seed this with the item index so
/// a given index always draws the same augmentation parameters.
pub fn item_rng(seed: u64) -> ChaCha20Rng {
    ChaCha20Rng::seed_from_u64(seed)
}

/// Per-item augmentation parameter draw.
pub trait Transform: Send + Sync {
    /// Short name used in logs and debug output.
    fn name(&self) -> &str;

    /// Draw this transform's parameters for one item and return them as
    /// extra record fields, to be merged into the item by the dataset.
    fn instantiate(
        &self,
        rng: &mut ChaCha20Rng,
        signal: &AudioBuffer,
    ) -> Result<Item, DatasetError>;
}

/// Uniform random gain draw in `[min_db, max_db]`.
#[derive(Debug, Clone)]
pub struct Gain {
    pub min_db: f64,
    pub max_db: f64,
}

impl Gain {
    pub fn new(min_db: f64, max_db: f64) -> Result<Self, DatasetError> {
        if !(min_db <= max_db) {
            return Err(DatasetError::InvalidArgument(format!(
                "gain range is empty: [{min_db}, {max_db}]"
            )));
        }
        Ok(Self { min_db, max_db })
    }
}

impl Transform for Gain {
    fn name(&self) -> &str {
        "gain"
    }

    fn instantiate(
        &self,
        rng: &mut ChaCha20Rng,
        _signal: &AudioBuffer,
    ) -> Result<Item, DatasetError> {
        let unit = rng.next_u32() as f64 / u32::MAX as f64;
        let gain_db = self.min_db + unit * (self.max_db - self.min_db);
        let mut fields = Item::new();
        fields.insert("gain_db".to_string(), Field::Scalar(gain_db));
        Ok(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gain_draw_is_deterministic_per_seed() {
        let t = Gain::new(-12.0, 0.0).unwrap();
        let sig = AudioBuffer::from_mono(vec![0.0; 8], 8000).unwrap();
        let a = t.instantiate(&mut item_rng(3), &sig).unwrap();
        let b = t.instantiate(&mut item_rng(3), &sig).unwrap();
        let c = t.instantiate(&mut item_rng(4), &sig).unwrap();
        let get = |item: &Item| match item.get("gain_db") {
            Some(Field::Scalar(v)) => *v,
            other => panic!("expected scalar gain, got {other:?}"),
        };
        assert_eq!(get(&a), get(&b));
        assert_ne!(get(&a), get(&c));
        assert!((-12.0..=0.0).contains(&get(&a)));
    }

    #[test]
    fn empty_gain_range_is_rejected() {
        assert!(Gain::new(1.0, -1.0).is_err());
    }
}
