// Training bridge
// The single component hosts talk to: construct from an artifact path,
// then run synchronous training steps and parameter diffs.

pub mod batch;
pub mod module;
pub mod result;

pub use batch::TrainingBatch;
pub use module::TrainingBridge;
pub use result::TrainingResult;
