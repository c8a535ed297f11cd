// src/data_loader/collate.rs
//
// Batch collation: turn an ordered run of same-shaped item records into
// one record of aggregated columns.  Signal fields are padded to the
// longest clip and carry per-clip loudness; every other field type is
// stacked in item order.

use crate::audio::{AudioBuffer, Batch, BatchField, Field, Item};
use crate::data_loader::dataset::DatasetError;

/// Collate `items` into one batch.
///
/// The field set is taken from the first item, as all items in a batch are
/// expected to share one shape.  A field that is missing from a later item,
/// or whose value types differ across items, fails with `CollateMismatch`.
/// Errors from signal batching (mixed rates or channel counts) propagate
/// unmodified.
pub fn collate(items: &[Item]) -> Result<Batch, DatasetError> {
    let first = items.first().ok_or_else(|| {
        DatasetError::InvalidArgument("cannot collate zero items".to_string())
    })?;

    let mut batch = Batch::new();
    for name in first.keys() {
        let mut column = Vec::with_capacity(items.len());
        for item in items {
            let value = item
                .get(name)
                .ok_or_else(|| DatasetError::CollateMismatch(name.clone()))?;
            column.push(value);
        }
        batch.insert(name.clone(), collate_column(name, &column)?);
    }
    Ok(batch)
}

fn collate_column(name: &str, column: &[&Field]) -> Result<BatchField, DatasetError> {
    match column[0] {
        Field::Signal(_) => {
            let clips = column
                .iter()
                .map(|f| match f {
                    Field::Signal(s) => Ok(s.clone()),
                    _ => Err(DatasetError::CollateMismatch(name.to_string())),
                })
                .collect::<Result<Vec<AudioBuffer>, _>>()?;
            Ok(BatchField::Signals(AudioBuffer::batch(&clips, true)?))
        }
        Field::Scalar(_) => {
            let vals = column
                .iter()
                .map(|f| match f {
                    Field::Scalar(v) => Ok(*v),
                    _ => Err(DatasetError::CollateMismatch(name.to_string())),
                })
                .collect::<Result<Vec<f64>, _>>()?;
            Ok(BatchField::Scalars(vals))
        }
        Field::Int(_) => {
            let vals = column
                .iter()
                .map(|f| match f {
                    Field::Int(v) => Ok(*v),
                    _ => Err(DatasetError::CollateMismatch(name.to_string())),
                })
                .collect::<Result<Vec<i64>, _>>()?;
            Ok(BatchField::Ints(vals))
        }
        Field::Text(_) => {
            let vals = column
                .iter()
                .map(|f| match f {
                    Field::Text(v) => Ok(v.clone()),
                    _ => Err(DatasetError::CollateMismatch(name.to_string())),
                })
                .collect::<Result<Vec<String>, _>>()?;
            Ok(BatchField::Texts(vals))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(frames: usize, idx: i64) -> Item {
        let mut it = Item::new();
        it.insert(
            "signal".to_string(),
            Field::Signal(AudioBuffer::from_mono(vec![0.25; frames], 8000).unwrap()),
        );
        it.insert("source_idx".to_string(), Field::Int(idx));
        it
    }

    #[test]
    fn signals_pad_and_other_fields_stack_in_order() {
        let items = vec![item(3, 10), item(7, 11), item(5, 12)];
        let batch = collate(&items).unwrap();

        match batch.get("signal").unwrap() {
            BatchField::Signals(sb) => {
                assert_eq!(sb.batch_size(), 3);
                assert_eq!(sb.padded_frames(), 7);
                assert_eq!(sb.lengths, vec![3, 7, 5]);
                assert_eq!(sb.loudness_db.len(), 3);
                // all clips hold the same constant level, loudness must match
                assert!((sb.loudness_db[0] - sb.loudness_db[1]).abs() < 1e-9);
            }
            other => panic!("expected signal batch, got {other:?}"),
        }
        match batch.get("source_idx").unwrap() {
            BatchField::Ints(v) => assert_eq!(v, &vec![10, 11, 12]),
            other => panic!("expected int column, got {other:?}"),
        }
    }

    #[test]
    fn heterogeneous_field_types_are_rejected() {
        let mut a = Item::new();
        a.insert("x".to_string(), Field::Scalar(1.0));
        let mut b = Item::new();
        b.insert("x".to_string(), Field::Text("one".to_string()));
        match collate(&[a, b]) {
            Err(DatasetError::CollateMismatch(f)) => assert_eq!(f, "x"),
            other => panic!("expected CollateMismatch, got {other:?}"),
        }
    }

    #[test]
    fn missing_field_in_later_item_is_a_mismatch() {
        let a = item(3, 0);
        let mut b = Item::new();
        b.insert(
            "signal".to_string(),
            Field::Signal(AudioBuffer::from_mono(vec![0.0; 3], 8000).unwrap()),
        );
        assert!(matches!(
            collate(&[a, b]),
            Err(DatasetError::CollateMismatch(_))
        ));
    }

    #[test]
    fn signal_rate_mismatch_propagates_from_the_batcher() {
        let mut a = Item::new();
        a.insert(
            "signal".to_string(),
            Field::Signal(AudioBuffer::from_mono(vec![0.0; 3], 8000).unwrap()),
        );
        let mut b = Item::new();
        b.insert(
            "signal".to_string(),
            Field::Signal(AudioBuffer::from_mono(vec![0.0; 3], 16_000).unwrap()),
        );
        assert!(matches!(
            collate(&[a, b]),
            Err(DatasetError::InvalidArgument(_))
        ));
    }

    #[test]
    fn empty_batch_is_invalid() {
        assert!(matches!(
            collate(&[]),
            Err(DatasetError::InvalidArgument(_))
        ));
    }
}
