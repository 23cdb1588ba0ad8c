// Borrowed tensor handles
//
// Hosts never see raw tensor addresses. A `TensorHandle` is an index into
// the bridge-owned `TensorTable`; the table checks liveness on every
// access, so a stale or fabricated handle fails instead of reading freed
// memory.

use candle_core::Tensor;

use crate::errors::{BridgeError, Result};

/// Opaque reference to a tensor owned by the bridge's tensor table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TensorHandle(usize);

impl TensorHandle {
    /// The raw slot index, for display/debugging only.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Slab of runtime tensors owned by a bridge instance.
///
/// Slots are never reused within the life of a bridge, so a released
/// handle stays invalid instead of silently aliasing a newer tensor.
#[derive(Debug, Default)]
pub struct TensorTable {
    slots: Vec<Option<Tensor>>,
}

impl TensorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a tensor and hand back its handle.
    pub fn insert(&mut self, tensor: Tensor) -> TensorHandle {
        self.slots.push(Some(tensor));
        TensorHandle(self.slots.len() - 1)
    }

    /// Look up a live tensor.
    pub fn get(&self, handle: TensorHandle) -> Result<&Tensor> {
        self.slots
            .get(handle.0)
            .and_then(|slot| slot.as_ref())
            .ok_or(BridgeError::InvalidHandle(handle.0))
    }

    /// Drop a tensor, invalidating its handle.
    pub fn remove(&mut self, handle: TensorHandle) -> Result<Tensor> {
        self.slots
            .get_mut(handle.0)
            .and_then(|slot| slot.take())
            .ok_or(BridgeError::InvalidHandle(handle.0))
    }

    /// Number of live tensors.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;

    fn scalar(v: f32) -> Tensor {
        Tensor::new(v, &Device::Cpu).unwrap()
    }

    #[test]
    fn test_insert_and_get() {
        let mut table = TensorTable::new();
        let h = table.insert(scalar(1.5));
        let t = table.get(h).unwrap();
        assert_eq!(t.to_scalar::<f32>().unwrap(), 1.5);
    }

    #[test]
    fn test_removed_handle_stays_dead() {
        let mut table = TensorTable::new();
        let h = table.insert(scalar(1.0));
        table.remove(h).unwrap();

        assert!(matches!(table.get(h), Err(BridgeError::InvalidHandle(_))));

        // a later insert must not resurrect the old handle
        let h2 = table.insert(scalar(2.0));
        assert_ne!(h, h2);
        assert!(table.get(h).is_err());
    }

    #[test]
    fn test_fabricated_handle_rejected() {
        let table = TensorTable::new();
        let bogus = TensorHandle(42);
        assert!(matches!(
            table.get(bogus),
            Err(BridgeError::InvalidHandle(42))
        ));
    }
}
