// Training bridge
//
// Owns the loaded model and the tensor table. All calls are synchronous
// and block until the runtime finishes; `&mut self` on the mutating calls
// makes callers serialize access instead of relying on an undeclared
// thread-safety contract.

use std::path::Path;

use candle_core::{DType, Tensor};
use candle_nn::{Optimizer, SGD};

use crate::bridge::batch::{full_batches, TrainingBatch};
use crate::bridge::result::TrainingResult;
use crate::errors::{BridgeError, Result};
use crate::plan::network::PlanNetwork;
use crate::plan::spec::{LossSpec, TrainingPlan};
use crate::tensors::dtype::ElementType;
use crate::tensors::handle::{TensorHandle, TensorTable};
use crate::tensors::marshal::{bytes_from_values, element_count, flatten_values, tensor_from_bytes};
use crate::tensors::set::TensorSet;

/// Bridge between a host application and the tensor runtime.
///
/// Lifecycle: `open` loads the artifact or fails with `ModelLoad`; a
/// loaded bridge serves any number of `execute`/`diff` calls; a failed
/// call leaves it reusable.
#[derive(Debug)]
pub struct TrainingBridge {
    network: PlanNetwork,
    table: TensorTable,
}

impl TrainingBridge {
    /// Load a model artifact from disk. The only constructor: there is no
    /// default-constructed, half-initialized bridge.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let network = PlanNetwork::from_artifact(path)?;

        tracing::info!(
            path = %path.display(),
            params = network.params().len(),
            "loaded model artifact"
        );

        Ok(Self {
            network,
            table: TensorTable::new(),
        })
    }

    /// The plan the loaded artifact declared.
    pub fn plan(&self) -> &TrainingPlan {
        self.network.plan()
    }

    /// Marshal a raw buffer into a runtime tensor owned by the bridge's
    /// table, returning its handle.
    pub fn intern_tensor(
        &mut self,
        data: &[u8],
        shape: &[usize],
        dtype: ElementType,
    ) -> Result<TensorHandle> {
        let tensor = tensor_from_bytes(data, shape, dtype, self.network.device())?;
        Ok(self.table.insert(tensor))
    }

    /// Intern a whole parameter set and assemble its descriptor set.
    pub fn intern_set(
        &mut self,
        data: Vec<Vec<u8>>,
        shapes: Vec<Vec<usize>>,
        dtypes: Vec<ElementType>,
    ) -> Result<TensorSet> {
        for (what, len) in [
            ("tensor shapes", shapes.len()),
            ("tensor type tags", dtypes.len()),
        ] {
            if len != data.len() {
                return Err(BridgeError::ShapeMismatch {
                    what,
                    expected: data.len(),
                    got: len,
                });
            }
        }

        let mut handles = Vec::with_capacity(data.len());
        for ((bytes, shape), dtype) in data.iter().zip(&shapes).zip(&dtypes) {
            handles.push(self.intern_tensor(bytes, shape, *dtype)?);
        }

        TensorSet::new(handles, data, shapes, dtypes)
    }

    /// Look up a live interned tensor.
    pub fn tensor(&self, handle: TensorHandle) -> Result<&Tensor> {
        self.table.get(handle)
    }

    /// Drop an interned tensor; its handle stays invalid afterwards.
    pub fn release_tensor(&mut self, handle: TensorHandle) -> Result<()> {
        self.table.remove(handle).map(|_| ())
    }

    /// Run training over one borrowed batch: per mini-batch, a forward
    /// pass, the plan's loss against the labels, a backward pass, and an
    /// SGD update scaled by `learning_rate`.
    ///
    /// Feature and label buffers are little-endian f32; for a
    /// cross-entropy plan the labels carry class indices as floats. The
    /// reported loss is the mean of the per-mini-batch losses, each
    /// measured before that batch's update. Learning-rate sanity (finite,
    /// positive) is the caller's contract and is only logged here.
    pub fn execute(
        &mut self,
        batch: &TrainingBatch<'_>,
        params: &TensorSet,
        batch_size: usize,
        learning_rate: f64,
    ) -> Result<TrainingResult> {
        if !learning_rate.is_finite() || learning_rate <= 0.0 {
            tracing::warn!(learning_rate, "learning rate is not a finite positive value");
        }

        let rows = batch.num_rows();
        let (features, labels) = self.marshal_batch(batch)?;
        let ranges = full_batches(rows, batch_size)?;

        // write the caller's parameters into the live vars before stepping
        let mut incoming = Vec::with_capacity(params.len());
        for i in 0..params.len() {
            incoming.push(tensor_from_bytes(
                &params.data()[i],
                &params.shapes()[i],
                params.dtypes()[i],
                self.network.device(),
            )?);
        }
        self.network.set_params(&incoming)?;

        let mut sgd = SGD::new(self.network.vars(), learning_rate)?;
        let mut total_loss = 0.0f32;
        for &(start, len) in &ranges {
            let x = features.narrow(0, start, len)?;
            let y = labels.narrow(0, start, len)?;

            let prediction = self.network.forward(&x)?;
            let batch_loss = self.network.loss(&prediction, &y)?;
            total_loss += batch_loss.to_scalar::<f32>()?;

            sgd.backward_step(&batch_loss)?;
        }
        let loss = total_loss / ranges.len() as f32;

        let mut updated_params = Vec::with_capacity(params.len());
        let mut updated_handles = Vec::with_capacity(params.len());
        for (_, var) in self.network.params() {
            let snapshot = var.as_tensor().detach().copy()?;
            updated_params.push(flatten_values(&snapshot)?);
            updated_handles.push(self.table.insert(snapshot));
        }

        tracing::debug!(
            rows,
            batches = ranges.len(),
            loss,
            "training step complete"
        );

        Ok(TrainingResult {
            loss,
            updated_params,
            updated_handles,
        })
    }

    /// The superseded flat-argument call shape: parameters as interned
    /// handles plus shapes, updated values returned without a loss.
    #[deprecated(note = "superseded by `execute`, which reports the loss and returns handles")]
    pub fn execute_with_params(
        &mut self,
        batch: &TrainingBatch<'_>,
        param_handles: &[TensorHandle],
        param_shapes: &[Vec<usize>],
        batch_size: usize,
        learning_rate: f64,
    ) -> Result<Vec<Vec<f32>>> {
        if param_shapes.len() != param_handles.len() {
            return Err(BridgeError::ShapeMismatch {
                what: "parameter shapes",
                expected: param_handles.len(),
                got: param_shapes.len(),
            });
        }

        let mut data = Vec::with_capacity(param_handles.len());
        let mut dtypes = Vec::with_capacity(param_handles.len());
        for (handle, shape) in param_handles.iter().zip(param_shapes) {
            let tensor = self.table.get(*handle)?;
            if tensor.elem_count() != element_count(shape) {
                return Err(BridgeError::ShapeMismatch {
                    what: "parameter elements",
                    expected: element_count(shape),
                    got: tensor.elem_count(),
                });
            }
            data.push(bytes_from_values(&flatten_values(tensor)?));
            dtypes.push(ElementType::F32);
        }

        let set = TensorSet::new(param_handles.to_vec(), data, param_shapes.to_vec(), dtypes)?;
        let result = self.execute(batch, &set, batch_size, learning_rate)?;
        Ok(result.updated_params)
    }

    /// Element-wise `original - updated` per parameter tensor, as flat
    /// rows. Read-only; this is the delta a federated client uploads
    /// instead of full parameters.
    pub fn diff(
        &self,
        original: &[TensorHandle],
        updated: &[TensorHandle],
        shapes: &[Vec<usize>],
    ) -> Result<Vec<Vec<f32>>> {
        if updated.len() != original.len() {
            return Err(BridgeError::ShapeMismatch {
                what: "updated parameter handles",
                expected: original.len(),
                got: updated.len(),
            });
        }
        if shapes.len() != original.len() {
            return Err(BridgeError::ShapeMismatch {
                what: "parameter shapes",
                expected: original.len(),
                got: shapes.len(),
            });
        }

        let mut deltas = Vec::with_capacity(original.len());
        for ((orig, upd), shape) in original.iter().zip(updated).zip(shapes) {
            let expected = element_count(shape);
            let o = self.table.get(*orig)?;
            let u = self.table.get(*upd)?;
            for (what, count) in [
                ("original parameter elements", o.elem_count()),
                ("updated parameter elements", u.elem_count()),
            ] {
                if count != expected {
                    return Err(BridgeError::ShapeMismatch {
                        what,
                        expected,
                        got: count,
                    });
                }
            }

            let o = o.to_dtype(DType::F32)?.flatten_all()?;
            let u = u.to_dtype(DType::F32)?.flatten_all()?;
            let delta = (&o - &u)?;
            deltas.push(delta.to_vec1::<f32>()?);
        }

        tracing::debug!(tensors = deltas.len(), "computed parameter diff");

        Ok(deltas)
    }

    /// Marshal the borrowed batch buffers into runtime tensors, validating
    /// feature and label widths against the plan first.
    fn marshal_batch(&self, batch: &TrainingBatch<'_>) -> Result<(Tensor, Tensor)> {
        let rows = batch.num_rows();
        let plan = self.network.plan();

        let feature_width: usize = batch.feature_shape()[1..].iter().product();
        if feature_width != plan.input_dim {
            return Err(BridgeError::ShapeMismatch {
                what: "training feature width",
                expected: plan.input_dim,
                got: feature_width,
            });
        }

        let label_width: usize = batch.label_shape()[1..].iter().product();
        let expected_label_width = match plan.loss {
            LossSpec::Mse => plan.output_dim(),
            LossSpec::CrossEntropy => 1,
        };
        if label_width != expected_label_width {
            return Err(BridgeError::ShapeMismatch {
                what: "training label width",
                expected: expected_label_width,
                got: label_width,
            });
        }

        let device = self.network.device();
        let features = tensor_from_bytes(
            batch.features(),
            batch.feature_shape(),
            ElementType::F32,
            device,
        )?
        .reshape((rows, feature_width))?;

        let labels = tensor_from_bytes(
            batch.labels(),
            batch.label_shape(),
            ElementType::F32,
            device,
        )?;
        let labels = match plan.loss {
            LossSpec::Mse => labels.reshape((rows, label_width))?,
            LossSpec::CrossEntropy => labels.reshape((rows,))?,
        };

        Ok((features, labels))
    }
}
