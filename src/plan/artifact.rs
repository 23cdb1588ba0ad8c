// Artifact reading and writing
//
// An artifact is a plain safetensors file. The `__metadata__` header holds
// the training plan under PLAN_METADATA_KEY; the tensors hold the initial
// parameter values under the names the plan declares.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use safetensors::tensor::TensorView;
use safetensors::{Dtype, SafeTensors};

use crate::errors::{BridgeError, Result};
use crate::plan::spec::TrainingPlan;

/// Metadata key the training plan lives under.
pub const PLAN_METADATA_KEY: &str = "training_plan";

fn load_error(path: &Path, reason: impl ToString) -> BridgeError {
    BridgeError::ModelLoad {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// Read and validate the training plan out of an artifact's header.
///
/// Every failure mode here (missing file, truncated header, missing or
/// malformed plan entry) is a `ModelLoad` error; the weights themselves
/// are loaded later by the network.
pub fn read_plan(path: &Path) -> Result<TrainingPlan> {
    let buffer = fs::read(path).map_err(|e| load_error(path, e))?;

    let (_, metadata) = SafeTensors::read_metadata(&buffer).map_err(|e| load_error(path, e))?;

    let plan_json = metadata
        .metadata()
        .as_ref()
        .and_then(|entries| entries.get(PLAN_METADATA_KEY))
        .ok_or_else(|| load_error(path, "artifact carries no training plan"))?;

    let plan: TrainingPlan =
        serde_json::from_str(plan_json).map_err(|e| load_error(path, e))?;
    plan.validate()
        .map_err(|e| load_error(path, format!("invalid training plan: {e}")))?;

    Ok(plan)
}

/// Write a model artifact: plan metadata plus named f32 parameter tensors.
///
/// `params` entries are (tensor name, row-major values, shape); the names
/// must match what the plan's layers will look up.
pub fn write_artifact(
    path: &Path,
    plan: &TrainingPlan,
    params: &[(String, Vec<f32>, Vec<usize>)],
) -> Result<()> {
    let write_error = |reason: String| BridgeError::ArtifactWrite {
        path: path.to_path_buf(),
        reason,
    };

    plan.validate()?;

    for (name, values, shape) in params {
        let expected: usize = shape.iter().product();
        if values.len() != expected {
            tracing::warn!(tensor = %name, expected, got = values.len(), "artifact tensor shape disagrees with values");
            return Err(BridgeError::ShapeMismatch {
                what: "artifact tensor values",
                expected,
                got: values.len(),
            });
        }
    }

    let byte_buffers: Vec<Vec<u8>> = params
        .iter()
        .map(|(_, values, _)| bytemuck::cast_slice(values).to_vec())
        .collect();
    let views: Vec<(&str, TensorView)> = params
        .iter()
        .zip(&byte_buffers)
        .map(|((name, _, shape), bytes)| {
            TensorView::new(Dtype::F32, shape.clone(), bytes)
                .map(|view| (name.as_str(), view))
                .map_err(|e| write_error(e.to_string()))
        })
        .collect::<Result<_>>()?;

    let plan_json = serde_json::to_string(plan).map_err(|e| write_error(e.to_string()))?;
    let metadata: HashMap<String, String> =
        HashMap::from([(PLAN_METADATA_KEY.to_string(), plan_json)]);

    safetensors::serialize_to_file(views, &Some(metadata), path)
        .map_err(|e| write_error(e.to_string()))?;

    tracing::debug!(path = %path.display(), tensors = params.len(), "wrote model artifact");

    Ok(())
}
