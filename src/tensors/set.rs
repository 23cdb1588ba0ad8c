// Tensor descriptor set
//
// The parallel-array description of N parameter tensors a host hands to
// `execute`: runtime handles, raw value buffers, shapes, and type tags.
// All four arrays must agree; the constructor is the single place that
// invariant is enforced.

use crate::errors::{BridgeError, Result};
use crate::tensors::dtype::ElementType;
use crate::tensors::handle::TensorHandle;
use crate::tensors::marshal::element_count;

/// Parallel-array description of a set of parameter tensors.
#[derive(Debug, Clone)]
pub struct TensorSet {
    handles: Vec<TensorHandle>,
    data: Vec<Vec<u8>>,
    shapes: Vec<Vec<usize>>,
    dtypes: Vec<ElementType>,
}

impl TensorSet {
    /// Assemble a descriptor set, validating that all four arrays have the
    /// same length and that each buffer's byte length matches its shape
    /// under its element type.
    pub fn new(
        handles: Vec<TensorHandle>,
        data: Vec<Vec<u8>>,
        shapes: Vec<Vec<usize>>,
        dtypes: Vec<ElementType>,
    ) -> Result<Self> {
        let n = handles.len();
        for (what, len) in [
            ("tensor data buffers", data.len()),
            ("tensor shapes", shapes.len()),
            ("tensor type tags", dtypes.len()),
        ] {
            if len != n {
                return Err(BridgeError::ShapeMismatch {
                    what,
                    expected: n,
                    got: len,
                });
            }
        }

        for i in 0..n {
            let expected = element_count(&shapes[i]) * dtypes[i].byte_width();
            if data[i].len() != expected {
                return Err(BridgeError::ShapeMismatch {
                    what: "tensor data buffer",
                    expected,
                    got: data[i].len(),
                });
            }
        }

        Ok(Self {
            handles,
            data,
            shapes,
            dtypes,
        })
    }

    pub fn handles(&self) -> &[TensorHandle] {
        &self.handles
    }

    pub fn data(&self) -> &[Vec<u8>] {
        &self.data
    }

    pub fn shapes(&self) -> &[Vec<usize>] {
        &self.shapes
    }

    pub fn dtypes(&self) -> &[ElementType] {
        &self.dtypes
    }

    /// Number of tensors described.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}
