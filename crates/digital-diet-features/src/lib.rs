//! Feature schema for the digital diet mental health risk model.
//!
//! The model was fit against one fixed table layout: eleven named columns in a
//! fixed order. This crate owns that layout ([`FeatureVector`],
//! [`FEATURE_NAMES`]) and the survey form whose answers are assembled into it
//! ([`FormAnswers`]).

pub mod features;

pub use features::{
    FEATURE_COUNT, FEATURE_NAMES, FeatureVector, FormAnswers, Gender, Location, Slider,
    controls,
};
