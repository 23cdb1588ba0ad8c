// Plan-driven network
//
// Materializes a training plan as candle layers over a VarMap, with the
// artifact's weights loaded in. The var list is kept in plan order so
// parameter sets and results line up index-for-index with what the host
// sent.

use std::path::Path;

use candle_core::{DType, Device, Module, Tensor, Var};
use candle_nn::{linear, loss, Linear, VarBuilder, VarMap};

use crate::errors::{BridgeError, Result};
use crate::plan::artifact::read_plan;
use crate::plan::spec::{LayerSpec, LossSpec, TrainingPlan};

#[derive(Debug)]
enum LayerOp {
    Linear(Linear),
    Relu,
    Sigmoid,
}

/// A loaded model: plan, layers, and the live training variables.
#[derive(Debug)]
pub struct PlanNetwork {
    plan: TrainingPlan,
    ops: Vec<LayerOp>,
    // (artifact tensor name, live var), in plan order
    params: Vec<(String, Var)>,
    device: Device,
}

impl PlanNetwork {
    /// Load a model artifact and build its network on the CPU device.
    pub fn from_artifact(path: &Path) -> Result<Self> {
        let plan = read_plan(path)?;
        let device = Device::Cpu;

        let mut varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);

        let mut ops = Vec::with_capacity(plan.layers.len());
        for layer in &plan.layers {
            let op = match layer {
                LayerSpec::Linear {
                    name,
                    in_dim,
                    out_dim,
                } => LayerOp::Linear(linear(*in_dim, *out_dim, vb.pp(name))?),
                LayerSpec::Relu => LayerOp::Relu,
                LayerSpec::Sigmoid => LayerOp::Sigmoid,
            };
            ops.push(op);
        }

        // Overwrite the fresh random init with the artifact's weights;
        // a tensor missing from the file fails the load.
        varmap.load(path).map_err(|e| BridgeError::ModelLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let vars = varmap.data().lock().unwrap();
        let mut params = Vec::new();
        for name in plan.param_names() {
            let var = vars.get(&name).cloned().ok_or_else(|| BridgeError::ModelLoad {
                path: path.to_path_buf(),
                reason: format!("parameter {name} missing after load"),
            })?;
            params.push((name, var));
        }
        drop(vars);

        Ok(Self {
            plan,
            ops,
            params,
            device,
        })
    }

    pub fn plan(&self) -> &TrainingPlan {
        &self.plan
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// The live parameter vars with their artifact names, in plan order.
    pub fn params(&self) -> &[(String, Var)] {
        &self.params
    }

    /// Vars alone, for the optimizer.
    pub fn vars(&self) -> Vec<Var> {
        self.params.iter().map(|(_, var)| var.clone()).collect()
    }

    /// Overwrite the live parameters with host-supplied tensors.
    ///
    /// Count and per-tensor shapes must match the plan exactly; checked
    /// here so a bad set never reaches the runtime's assignment path.
    pub fn set_params(&self, tensors: &[Tensor]) -> Result<()> {
        if tensors.len() != self.params.len() {
            return Err(BridgeError::ShapeMismatch {
                what: "parameter tensors",
                expected: self.params.len(),
                got: tensors.len(),
            });
        }

        for ((_, var), tensor) in self.params.iter().zip(tensors) {
            if var.dims() != tensor.dims() {
                return Err(BridgeError::ShapeMismatch {
                    what: "parameter tensor shape",
                    expected: var.elem_count(),
                    got: tensor.elem_count(),
                });
            }
            var.set(&tensor.to_dtype(var.dtype())?)?;
        }

        Ok(())
    }

    /// Forward pass over one mini-batch of shape `[batch, input_dim]`.
    pub fn forward(&self, x: &Tensor) -> Result<Tensor> {
        let mut out = x.clone();
        for op in &self.ops {
            out = match op {
                LayerOp::Linear(layer) => layer.forward(&out)?,
                LayerOp::Relu => out.relu()?,
                LayerOp::Sigmoid => candle_nn::ops::sigmoid(&out)?,
            };
        }
        Ok(out)
    }

    /// Loss of a prediction against the labels, per the plan's loss spec.
    pub fn loss(&self, prediction: &Tensor, labels: &Tensor) -> Result<Tensor> {
        let value = match self.plan.loss {
            LossSpec::Mse => loss::mse(prediction, labels)?,
            LossSpec::CrossEntropy => {
                // class labels arrive as floats over the raw boundary
                let classes = labels.flatten_all()?.to_dtype(DType::U32)?;
                loss::cross_entropy(prediction, &classes)?
            }
        };
        Ok(value)
    }
}
