// Trainbridge - On-device training bridge
// Library exports

// Core modules
pub mod bridge; // Training bridge: open / execute / diff
pub mod errors;
pub mod plan; // Model artifact: training plan + weights
pub mod tensors; // Tensor marshalling, handles, descriptor sets

pub use bridge::{TrainingBatch, TrainingBridge, TrainingResult};
pub use errors::{BridgeError, Result};
pub use plan::{read_plan, write_artifact, LayerSpec, LossSpec, TrainingPlan};
pub use tensors::{ElementType, TensorHandle, TensorSet};
