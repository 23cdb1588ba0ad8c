// Buffer <-> tensor marshalling
//
// Raw host buffers are little-endian and untyped; every conversion
// validates the declared shape against the buffer length before the
// runtime is allowed to touch the data.

use candle_core::{DType, Device, Tensor};

use crate::errors::{BridgeError, Result};
use crate::tensors::dtype::ElementType;

/// Number of elements a shape describes. An empty shape is a scalar.
pub fn element_count(shape: &[usize]) -> usize {
    shape.iter().product()
}

/// Build a runtime tensor from a raw byte buffer and its declared shape.
///
/// Fails with `ShapeMismatch` when the buffer length is not exactly the
/// flattened element count times the element width.
pub fn tensor_from_bytes(
    data: &[u8],
    shape: &[usize],
    dtype: ElementType,
    device: &Device,
) -> Result<Tensor> {
    let expected = element_count(shape) * dtype.byte_width();
    if data.len() != expected {
        return Err(BridgeError::ShapeMismatch {
            what: "tensor data buffer",
            expected,
            got: data.len(),
        });
    }

    // pod_collect_to_vec copies, so unaligned host buffers are fine
    let tensor = match dtype {
        ElementType::U8 => Tensor::from_vec(data.to_vec(), shape, device)?,
        ElementType::I64 => {
            Tensor::from_vec(bytemuck::pod_collect_to_vec::<u8, i64>(data), shape, device)?
        }
        ElementType::F32 => {
            Tensor::from_vec(bytemuck::pod_collect_to_vec::<u8, f32>(data), shape, device)?
        }
        ElementType::F64 => {
            Tensor::from_vec(bytemuck::pod_collect_to_vec::<u8, f64>(data), shape, device)?
        }
    };

    Ok(tensor)
}

/// Flatten a tensor into row-major f32 values for the host.
pub fn flatten_values(tensor: &Tensor) -> Result<Vec<f32>> {
    let flat = tensor.to_dtype(DType::F32)?.flatten_all()?;
    Ok(flat.to_vec1::<f32>()?)
}

/// Encode f32 values as the little-endian byte buffer the bridge accepts.
pub fn bytes_from_values(values: &[f32]) -> Vec<u8> {
    bytemuck::cast_slice(values).to_vec()
}
