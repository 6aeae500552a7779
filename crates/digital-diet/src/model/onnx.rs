use std::{fmt, path::Path, sync::Mutex};

use digital_diet_features::{FEATURE_COUNT, FeatureVector};
use ort::{
    session::{Session, SessionOutputs, builder::GraphOptimizationLevel},
    value::{Tensor, TensorValueType, Value},
};
use tracing::debug;

use super::{Classifier, InferenceError, LoadError};
use crate::pipeline::{RiskLevel, RiskProbabilities};

/// Classifier exported to ONNX (for scikit-learn: `skl2onnx` with
/// `zipmap=False`). Output 0 holds labels, output 1 the `[n, 2]` probabilities.
pub struct OnnxClassifier {
    session: Mutex<Session>,
    input_name: String,
}

impl fmt::Debug for OnnxClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnnxClassifier")
            .field("input_name", &self.input_name)
            .finish_non_exhaustive()
    }
}

impl OnnxClassifier {
    pub fn from_file(path: &Path) -> Result<Self, LoadError> {
        let session = Session::builder()
            .map_err(|err| load_error(path, &err))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|err| load_error(path, &err))?
            .with_intra_threads(1)
            .map_err(|err| load_error(path, &err))?
            .commit_from_file(path)
            .map_err(|err| load_error(path, &err))?;

        let input_name = check_signature(&session)?;
        debug!(%input_name, outputs = session.outputs.len(), "ONNX session ready");
        Ok(Self {
            session: Mutex::new(session),
            input_name,
        })
    }

    fn run(&self, features: &FeatureVector) -> Result<(i64, [f64; 2]), InferenceError> {
        let input = prepare_input_for_inference(features)?;
        let mut session = self
            .session
            .lock()
            .map_err(|_| InferenceError::Poisoned)?;
        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input])
            .map_err(runtime_error)?;
        parse_model_outputs(&outputs)
    }
}

/// Name and static shape of one graph input, as reported by the session.
#[derive(Debug)]
struct InputSignature<'a> {
    name: &'a str,
    shape: Option<Vec<i64>>,
}

fn check_signature(session: &Session) -> Result<String, LoadError> {
    let inputs: Vec<InputSignature<'_>> = session
        .inputs
        .iter()
        .map(|input| InputSignature {
            name: &input.name,
            shape: input
                .input_type
                .tensor_shape()
                .map(|shape| shape.iter().copied().collect()),
        })
        .collect();
    check_io(&inputs, session.outputs.len()).map(str::to_string)
}

/// The graph must take one tensor whose trailing dimension is the schema
/// width (or dynamic) and produce labels plus probabilities.
fn check_io<'a>(inputs: &[InputSignature<'a>], n_outputs: usize) -> Result<&'a str, LoadError> {
    let [input] = inputs else {
        return Err(LoadError::Schema(format!(
            "model has {} inputs, expected 1",
            inputs.len()
        )));
    };
    if let Some(shape) = &input.shape {
        let width = shape.last().copied();
        let expected = i64::try_from(FEATURE_COUNT).unwrap_or(i64::MAX);
        if !matches!(width, Some(dim) if dim == expected || dim < 0) {
            return Err(LoadError::Schema(format!(
                "model input `{}` has trailing dimension {width:?}, expected {FEATURE_COUNT}",
                input.name
            )));
        }
    }
    if n_outputs < 2 {
        return Err(LoadError::Schema(format!(
            "model has {n_outputs} outputs, expected labels and probabilities"
        )));
    }
    Ok(input.name)
}

fn load_error(path: &Path, err: &impl fmt::Display) -> LoadError {
    LoadError::Runtime {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}

#[allow(clippy::needless_pass_by_value)]
fn runtime_error(err: impl fmt::Display) -> InferenceError {
    InferenceError::Runtime(err.to_string())
}

fn prepare_input_for_inference(
    features: &FeatureVector,
) -> Result<Value<TensorValueType<f32>>, InferenceError> {
    let shape = vec![1, FEATURE_COUNT];
    let data = features.to_row().to_vec().into_boxed_slice();
    Tensor::from_array((shape, data)).map_err(runtime_error)
}

fn parse_model_outputs(outputs: &SessionOutputs<'_>) -> Result<(i64, [f64; 2]), InferenceError> {
    let label = outputs[0]
        .try_extract_array::<i64>()
        .map_err(runtime_error)?
        .iter()
        .next()
        .copied()
        .ok_or_else(|| InferenceError::MalformedOutput("empty label tensor".to_string()))?;

    let probs_array = outputs[1]
        .try_extract_array::<f32>()
        .map_err(runtime_error)?
        .into_dimensionality::<ndarray::Ix2>()
        .map_err(|err| InferenceError::MalformedOutput(err.to_string()))?;
    if probs_array.ncols() != 2 || probs_array.nrows() == 0 {
        return Err(InferenceError::MalformedOutput(format!(
            "probability tensor has shape {:?}, expected [1, 2]",
            probs_array.shape()
        )));
    }
    let first_row = probs_array.row(0);
    Ok((label, [f64::from(first_row[0]), f64::from(first_row[1])]))
}

impl Classifier for OnnxClassifier {
    fn predict(&self, features: &FeatureVector) -> Result<RiskLevel, InferenceError> {
        let (label, _) = self.run(features)?;
        RiskLevel::try_from(label)
    }

    fn predict_probability(
        &self,
        features: &FeatureVector,
    ) -> Result<RiskProbabilities, InferenceError> {
        let (_, probs) = self.run(features)?;
        RiskProbabilities::try_from(probs)
    }
}
