// Raw training batch
//
// Feature and label buffers are borrowed from the host for the duration of
// one call; the bridge never retains them. Mini-batching slices the
// leading dimension into full batches; a trailing remainder that cannot
// fill a batch is dropped.

use crate::errors::{BridgeError, Result};

/// One call's worth of borrowed training data.
#[derive(Debug, Clone, Copy)]
pub struct TrainingBatch<'a> {
    features: &'a [u8],
    feature_shape: &'a [usize],
    labels: &'a [u8],
    label_shape: &'a [usize],
}

impl<'a> TrainingBatch<'a> {
    /// Borrow a batch, checking that both shapes are ranked and agree on
    /// the number of rows. Buffer lengths are validated against the shapes
    /// at marshalling time.
    pub fn new(
        features: &'a [u8],
        feature_shape: &'a [usize],
        labels: &'a [u8],
        label_shape: &'a [usize],
    ) -> Result<Self> {
        if feature_shape.is_empty() {
            return Err(BridgeError::ShapeMismatch {
                what: "training feature rank",
                expected: 1,
                got: 0,
            });
        }
        if label_shape.is_empty() {
            return Err(BridgeError::ShapeMismatch {
                what: "training label rank",
                expected: 1,
                got: 0,
            });
        }
        if label_shape[0] != feature_shape[0] {
            return Err(BridgeError::ShapeMismatch {
                what: "training label rows",
                expected: feature_shape[0],
                got: label_shape[0],
            });
        }

        Ok(Self {
            features,
            feature_shape,
            labels,
            label_shape,
        })
    }

    pub fn features(&self) -> &'a [u8] {
        self.features
    }

    pub fn feature_shape(&self) -> &'a [usize] {
        self.feature_shape
    }

    pub fn labels(&self) -> &'a [u8] {
        self.labels
    }

    pub fn label_shape(&self) -> &'a [usize] {
        self.label_shape
    }

    /// Rows available for training (the leading dimension).
    pub fn num_rows(&self) -> usize {
        self.feature_shape[0]
    }
}

/// Offsets of the full mini-batches in a run of `rows` rows.
///
/// Only complete batches are trained on; a remainder smaller than
/// `batch_size` is dropped. A batch size of zero or larger than the row
/// count leaves nothing to train and is rejected.
pub fn full_batches(rows: usize, batch_size: usize) -> Result<Vec<(usize, usize)>> {
    if batch_size == 0 || batch_size > rows {
        return Err(BridgeError::ShapeMismatch {
            what: "batch size",
            expected: rows,
            got: batch_size,
        });
    }

    Ok((0..rows / batch_size)
        .map(|i| (i * batch_size, batch_size))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_batches_drop_remainder() {
        assert_eq!(full_batches(10, 4).unwrap(), vec![(0, 4), (4, 4)]);
        assert_eq!(full_batches(8, 4).unwrap(), vec![(0, 4), (4, 4)]);
        assert_eq!(full_batches(3, 3).unwrap(), vec![(0, 3)]);
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        assert!(full_batches(10, 0).is_err());
    }

    #[test]
    fn test_oversized_batch_rejected() {
        assert!(full_batches(3, 4).is_err());
    }

    #[test]
    fn test_row_count_disagreement_rejected() {
        let features = [0u8; 16];
        let labels = [0u8; 8];
        let err = TrainingBatch::new(&features, &[4, 1], &labels, &[2, 1]).unwrap_err();
        assert!(matches!(
            err,
            BridgeError::ShapeMismatch {
                what: "training label rows",
                ..
            }
        ));
    }
}
