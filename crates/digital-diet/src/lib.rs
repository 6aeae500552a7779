//! # digital-diet
//!
//! Predicts mental health risk from digital usage and lifestyle habits using a
//! pre-trained binary classifier.
//!
//! Eleven survey answers ([`FormAnswers`]) are assembled into one
//! [`FeatureVector`] row, the classifier is asked for a label and for class
//! probabilities, and the result is rendered as text.
//!
//! ## Quick Start
//!
//! ```no_run
//! use digital_diet::{FormAnswers, Gender, Location, RiskPredictor};
//!
//! let predictor = RiskPredictor::load(digital_diet::MODEL_PATH)?;
//!
//! let answers = FormAnswers::default()
//!     .with_screen_time(8.0)
//!     .with_sleep_quality(3)
//!     .with_age(19)
//!     .with_gender(Gender::Female)
//!     .with_location(Location::Urban);
//!
//! let assessment = predictor.assess(&answers)?;
//! println!("{}", assessment.level);
//! println!("{}", assessment.probabilities.low_risk_line());
//! println!("{}", assessment.probabilities.high_risk_line());
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Halting on a missing model
//!
//! [`run_form`] loads the model before it collects any answers. If loading
//! fails the run stops there and reports [`Outcome::Halted`].

#[cfg(feature = "cli")]
pub mod cli;

pub mod model;
mod pipeline;
pub mod render;

use std::path::Path;

use anyhow::Context;
pub use digital_diet_features::{
    FEATURE_COUNT, FEATURE_NAMES, FeatureVector, FormAnswers, Gender, Location, controls,
};
pub use model::{Classifier, InferenceError, LoadError, LoadedModel, MODEL_PATH};
pub use pipeline::{Assessment, PROBABILITY_TOLERANCE, RiskLevel, RiskProbabilities};
use tracing::warn;

/// Owns a loaded classifier and runs form answers through it.
///
/// The classifier is loaded once and reused for every row.
#[derive(Debug)]
pub struct RiskPredictor<C> {
    model: C,
}

impl RiskPredictor<LoadedModel> {
    /// Load the model artifact at `path`. See [`model::load`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        model::load(path).map(Self::new)
    }
}

impl<C: Classifier> RiskPredictor<C> {
    #[must_use]
    pub fn new(model: C) -> Self {
        Self { model }
    }

    /// Assemble the feature row for `answers` and predict on it.
    pub fn assess(&self, answers: &FormAnswers) -> anyhow::Result<Assessment> {
        self.assess_features(answers.to_features())
    }

    /// Predict on an already assembled row.
    pub fn assess_features(&self, features: FeatureVector) -> anyhow::Result<Assessment> {
        pipeline::assess(&self.model, features)
            .with_context(|| "Failed to predict mental health risk for the given answers")
    }

    /// Assess several submitted forms, in order.
    pub fn assess_batch(&self, answers: &[FormAnswers]) -> anyhow::Result<Vec<Assessment>> {
        answers
            .iter()
            .enumerate()
            .map(|(idx, answers)| {
                self.assess(answers)
                    .with_context(|| format!("Failed to assess answers #{idx}"))
            })
            .collect()
    }
}

/// Result of one top-to-bottom run of the form.
#[derive(Debug)]
pub enum Outcome {
    /// The model could not be loaded; nothing was collected or predicted.
    Halted(LoadError),
    /// One assessment per collected form.
    Completed(Vec<Assessment>),
}

/// Runs the form once: load the model, then collect answers, then predict.
///
/// `collect` is only called after `load` succeeds. Failures while collecting
/// or predicting are returned as errors.
pub fn run_form<C, L, F>(load: L, collect: F) -> anyhow::Result<Outcome>
where
    C: Classifier,
    L: FnOnce() -> Result<C, LoadError>,
    F: FnOnce() -> anyhow::Result<Vec<FormAnswers>>,
{
    let predictor = match load() {
        Ok(model) => RiskPredictor::new(model),
        Err(err) => {
            warn!(error = %err, "Model unavailable, halting");
            return Ok(Outcome::Halted(err));
        }
    };
    let answers = collect().context("Failed to collect form answers")?;
    predictor.assess_batch(&answers).map(Outcome::Completed)
}
