use std::path::PathBuf;

use thiserror::Error;

/// Why a model artifact could not be turned into a predictor.
///
/// Any of these halts the form: nothing is collected and nothing is
/// predicted.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Model file not found. Please check the file path.")]
    NotFound { path: PathBuf },

    #[error("Failed to read model file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode model file {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("Model runtime rejected {path}: {reason}")]
    Runtime { path: PathBuf, reason: String },

    #[error("Model does not accept the feature schema: {0}")]
    Schema(String),

    #[error("Unsupported model format for {path} (expected .onnx, .json or .bin)")]
    UnsupportedFormat { path: PathBuf },
}

/// Failures inside `predict` / `predict_probability`.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Model runtime failed: {0}")]
    Runtime(String),

    #[error("Model returned class label {0}, expected 0 or 1")]
    UnexpectedLabel(i64),

    #[error("Model returned malformed output: {0}")]
    MalformedOutput(String),

    #[error("Model session lock was poisoned")]
    Poisoned,
}
