// Training plan
//
// The architecture half of a model artifact: an ordered stack of layers
// plus the loss trained against. Serialized as JSON into the artifact's
// metadata header.

use serde::{Deserialize, Serialize};

use crate::errors::{BridgeError, Result};

/// One layer of the trained network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerSpec {
    /// Affine layer; `name` prefixes its `weight`/`bias` tensors in the
    /// artifact.
    Linear {
        name: String,
        in_dim: usize,
        out_dim: usize,
    },
    Relu,
    Sigmoid,
}

/// Loss the plan trains against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossSpec {
    /// Mean squared error against same-shaped float labels.
    Mse,
    /// Cross entropy against integer class labels.
    CrossEntropy,
}

/// The full plan stored in a model artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingPlan {
    /// Feature width of one training row.
    pub input_dim: usize,
    pub layers: Vec<LayerSpec>,
    pub loss: LossSpec,
}

impl TrainingPlan {
    /// Check that the layer stack is non-trivial and its dimensions chain.
    pub fn validate(&self) -> Result<()> {
        let mut current = self.input_dim;
        let mut linear_count = 0;

        for layer in &self.layers {
            if let LayerSpec::Linear { in_dim, out_dim, .. } = layer {
                if *in_dim != current {
                    return Err(BridgeError::ShapeMismatch {
                        what: "linear layer input dimension",
                        expected: current,
                        got: *in_dim,
                    });
                }
                current = *out_dim;
                linear_count += 1;
            }
        }

        if linear_count == 0 {
            return Err(BridgeError::ShapeMismatch {
                what: "linear layers in plan",
                expected: 1,
                got: 0,
            });
        }

        Ok(())
    }

    /// Width of the network output.
    pub fn output_dim(&self) -> usize {
        self.layers
            .iter()
            .rev()
            .find_map(|layer| match layer {
                LayerSpec::Linear { out_dim, .. } => Some(*out_dim),
                _ => None,
            })
            .unwrap_or(self.input_dim)
    }

    /// Names of the parameter tensors, in plan order.
    pub fn param_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        for layer in &self.layers {
            if let LayerSpec::Linear { name, .. } = layer {
                names.push(format!("{name}.weight"));
                names.push(format!("{name}.bias"));
            }
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear(name: &str, in_dim: usize, out_dim: usize) -> LayerSpec {
        LayerSpec::Linear {
            name: name.to_string(),
            in_dim,
            out_dim,
        }
    }

    #[test]
    fn test_chained_plan_validates() {
        let plan = TrainingPlan {
            input_dim: 4,
            layers: vec![linear("l0", 4, 8), LayerSpec::Relu, linear("l1", 8, 2)],
            loss: LossSpec::CrossEntropy,
        };
        plan.validate().unwrap();
        assert_eq!(plan.output_dim(), 2);
        assert_eq!(
            plan.param_names(),
            vec!["l0.weight", "l0.bias", "l1.weight", "l1.bias"]
        );
    }

    #[test]
    fn test_broken_chain_rejected() {
        let plan = TrainingPlan {
            input_dim: 4,
            layers: vec![linear("l0", 4, 8), linear("l1", 6, 2)],
            loss: LossSpec::Mse,
        };
        assert!(plan.validate().is_err());
    }

    #[test]
    fn test_plan_without_linear_rejected() {
        let plan = TrainingPlan {
            input_dim: 4,
            layers: vec![LayerSpec::Relu],
            loss: LossSpec::Mse,
        };
        assert!(plan.validate().is_err());
    }

    #[test]
    fn test_plan_json_round_trip() {
        let plan = TrainingPlan {
            input_dim: 1,
            layers: vec![linear("l0", 1, 1)],
            loss: LossSpec::Mse,
        };

        let json = serde_json::to_string(&plan).unwrap();
        let back: TrainingPlan = serde_json::from_str(&json).unwrap();
        assert_eq!(plan, back);
    }
}
