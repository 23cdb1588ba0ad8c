// Model artifact layer
// A model artifact is one safetensors file: the tensors are the initial
// parameter values, the metadata header carries the JSON training plan.

pub mod artifact;
pub mod network;
pub mod spec;

pub use artifact::{read_plan, write_artifact};
pub use network::PlanNetwork;
pub use spec::{LayerSpec, LossSpec, TrainingPlan};
