pub mod controls;
mod form;
mod vector;

pub use controls::{Gender, Location, Slider};
pub use form::FormAnswers;
pub use vector::{FEATURE_COUNT, FEATURE_NAMES, FeatureVector};
