use std::path::Path;

use digital_diet_features::{FeatureVector, FormAnswers};
use tracing::{debug, info};

mod error;
mod forest;
#[cfg(feature = "onnx")]
mod onnx;

pub use error::{InferenceError, LoadError};
pub use forest::{FlatTree, ForestClassifier, ForestDocument};
#[cfg(feature = "onnx")]
pub use onnx::OnnxClassifier;

use crate::pipeline::{RiskLevel, RiskProbabilities};

/// Where the binary looks for the trained classifier, relative to the
/// working directory.
pub const MODEL_PATH: &str = "mental_health_rf_model.onnx";

/// A pre-trained binary classifier over [`FeatureVector`] rows.
pub trait Classifier {
    fn predict(&self, features: &FeatureVector) -> Result<RiskLevel, InferenceError>;

    fn predict_probability(
        &self,
        features: &FeatureVector,
    ) -> Result<RiskProbabilities, InferenceError>;
}

impl<C: Classifier + ?Sized> Classifier for &C {
    fn predict(&self, features: &FeatureVector) -> Result<RiskLevel, InferenceError> {
        (**self).predict(features)
    }

    fn predict_probability(
        &self,
        features: &FeatureVector,
    ) -> Result<RiskProbabilities, InferenceError> {
        (**self).predict_probability(features)
    }
}

impl<C: Classifier + ?Sized> Classifier for Box<C> {
    fn predict(&self, features: &FeatureVector) -> Result<RiskLevel, InferenceError> {
        (**self).predict(features)
    }

    fn predict_probability(
        &self,
        features: &FeatureVector,
    ) -> Result<RiskProbabilities, InferenceError> {
        (**self).predict_probability(features)
    }
}

/// A classifier read from disk, backend picked by file extension.
#[derive(Debug)]
pub enum LoadedModel {
    #[cfg(feature = "onnx")]
    Onnx(OnnxClassifier),
    Forest(ForestClassifier),
}

impl Classifier for LoadedModel {
    fn predict(&self, features: &FeatureVector) -> Result<RiskLevel, InferenceError> {
        match self {
            #[cfg(feature = "onnx")]
            Self::Onnx(model) => model.predict(features),
            Self::Forest(model) => model.predict(features),
        }
    }

    fn predict_probability(
        &self,
        features: &FeatureVector,
    ) -> Result<RiskProbabilities, InferenceError> {
        match self {
            #[cfg(feature = "onnx")]
            Self::Onnx(model) => model.predict_probability(features),
            Self::Forest(model) => model.predict_probability(features),
        }
    }
}

/// Reads and validates the artifact at `path`.
///
/// - `.onnx`: ONNX graph run by ONNX Runtime
/// - `.json`: [`ForestDocument`] as JSON
/// - `.bin`: [`ForestDocument`] as bincode
///
/// The model is tried once on the initial form before it is handed out.
pub fn load(path: impl AsRef<Path>) -> Result<LoadedModel, LoadError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(LoadError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    debug!(path = %path.display(), ?extension, "Loading model artifact");

    let model = match extension.as_deref() {
        #[cfg(feature = "onnx")]
        Some("onnx") => LoadedModel::Onnx(OnnxClassifier::from_file(path)?),
        Some("json") => LoadedModel::Forest(ForestClassifier::from_json_file(path)?),
        Some("bin") => LoadedModel::Forest(ForestClassifier::from_bincode_file(path)?),
        _ => {
            return Err(LoadError::UnsupportedFormat {
                path: path.to_path_buf(),
            });
        }
    };

    validate(&model)?;
    info!(path = %path.display(), "Model loaded");
    Ok(model)
}

/// Checks that `model` accepts a row of the fixed schema and answers with a
/// legal label and a two-class distribution.
pub fn validate<C: Classifier + ?Sized>(model: &C) -> Result<(), LoadError> {
    let sample = FormAnswers::default().to_features();

    model
        .predict(&sample)
        .map_err(|err| LoadError::Schema(format!("sample prediction failed: {err}")))?;
    // RiskProbabilities can only hold a distribution that sums to 1.
    let probs = model
        .predict_probability(&sample)
        .map_err(|err| LoadError::Schema(format!("sample probabilities failed: {err}")))?;
    debug!(%probs, "Model accepted sample row");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedLabel(i64);

    impl Classifier for FixedLabel {
        fn predict(&self, _features: &FeatureVector) -> Result<RiskLevel, InferenceError> {
            RiskLevel::try_from(self.0)
        }

        fn predict_probability(
            &self,
            _features: &FeatureVector,
        ) -> Result<RiskProbabilities, InferenceError> {
            RiskProbabilities::try_from([0.5, 0.5])
        }
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = load("definitely/not/here/mental_health_rf_model.onnx")
            .expect_err("missing artifact must fail");
        assert!(matches!(err, LoadError::NotFound { .. }));
        assert_eq!(
            err.to_string(),
            "Model file not found. Please check the file path."
        );
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let file = tempfile::Builder::new()
            .suffix(".pkl")
            .tempfile()
            .expect("temp file");
        let err = load(file.path()).expect_err("pickle is not a supported format");
        assert!(matches!(err, LoadError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_validate_rejects_illegal_label() {
        assert!(validate(&FixedLabel(0)).is_ok());
        let err = validate(&FixedLabel(3)).expect_err("label 3 is illegal");
        assert!(matches!(err, LoadError::Schema(_)));
    }

    #[test]
    fn test_boxed_classifier_delegates() {
        let boxed: Box<dyn Classifier> = Box::new(FixedLabel(1));
        let features = FormAnswers::default().to_features();
        assert_eq!(boxed.predict(&features).expect("legal"), RiskLevel::AtRisk);
    }
}
