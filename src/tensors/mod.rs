// Tensor marshalling layer
// Everything that crosses the host boundary goes through here:
// raw byte buffers, shape descriptors, type tags, and opaque handles.

pub mod dtype;
pub mod handle;
pub mod marshal;
pub mod set;

pub use dtype::ElementType;
pub use handle::{TensorHandle, TensorTable};
pub use marshal::{flatten_values, tensor_from_bytes};
pub use set::TensorSet;
