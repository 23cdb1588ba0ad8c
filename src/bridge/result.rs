// Training step result

use crate::tensors::TensorHandle;

/// What one training call hands back to the host.
///
/// `updated_params` mirrors the input parameter set: same tensor count,
/// same per-tensor element counts, values flattened row-major.
/// `updated_handles` name the same tensors interned in the bridge's table,
/// so a later `diff` can reference them without re-marshalling.
#[derive(Debug, Clone)]
pub struct TrainingResult {
    /// Mean loss over the mini-batches, measured at the pre-update
    /// parameters of each batch.
    pub loss: f32,
    pub updated_params: Vec<Vec<f32>>,
    /// Table handles to the updated tensors. The table keeps each
    /// snapshot alive until `TrainingBridge::release_tensor` is called on
    /// its handle, so a host that trains repeatedly on one bridge should
    /// release these once it is done diffing them.
    pub updated_handles: Vec<TensorHandle>,
}
