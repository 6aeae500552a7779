use core::fmt;

use digital_diet_features::FeatureVector;

use crate::model::{Classifier, InferenceError};

/// Largest deviation from 1.0 accepted for `P(low) + P(at-risk)`.
pub const PROBABILITY_TOLERANCE: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum RiskLevel {
    Low,
    AtRisk,
}

impl RiskLevel {
    /// Returns true if this is the at-risk class
    #[must_use]
    pub fn is_at_risk(&self) -> bool {
        matches!(self, Self::AtRisk)
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low Risk",
            Self::AtRisk => "At-Risk",
        }
    }

    #[must_use]
    pub fn indicator(&self) -> &'static str {
        match self {
            Self::Low => "🟢",
            Self::AtRisk => "🔴",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.indicator(), self.label())
    }
}

impl From<RiskLevel> for i64 {
    fn from(level: RiskLevel) -> Self {
        match level {
            RiskLevel::Low => 0,
            RiskLevel::AtRisk => 1,
        }
    }
}

impl TryFrom<i64> for RiskLevel {
    type Error = InferenceError;

    fn try_from(label: i64) -> Result<Self, Self::Error> {
        match label {
            0 => Ok(Self::Low),
            1 => Ok(Self::AtRisk),
            other => Err(InferenceError::UnexpectedLabel(other)),
        }
    }
}

/// Class probabilities.
/// 0: P(low risk), 1: P(at-risk)
///
/// Held in `f64` so the percentages round the same way the trained model's
/// own tooling prints them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskProbabilities(f64, f64);

impl RiskProbabilities {
    #[must_use]
    pub fn low_risk(&self) -> f64 {
        self.0
    }

    #[must_use]
    pub fn at_risk(&self) -> f64 {
        self.1
    }

    /// `Low Risk: 73.4%`
    #[must_use]
    pub fn low_risk_line(&self) -> String {
        format!("Low Risk: {:.1}%", self.0 * 100.0)
    }

    /// `High Risk: 26.6%`
    #[must_use]
    pub fn high_risk_line(&self) -> String {
        format!("High Risk: {:.1}%", self.1 * 100.0)
    }
}

impl fmt::Display for RiskProbabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P(low)={:.3}, P(at-risk)={:.3}", self.0, self.1)
    }
}

impl TryFrom<[f64; 2]> for RiskProbabilities {
    type Error = InferenceError;

    fn try_from(probs: [f64; 2]) -> Result<Self, Self::Error> {
        let [low, high] = probs;
        if !(0.0..=1.0).contains(&low) || !(0.0..=1.0).contains(&high) {
            return Err(InferenceError::MalformedOutput(format!(
                "probabilities [{low}, {high}] are outside [0, 1]"
            )));
        }
        if (low + high - 1.0).abs() > PROBABILITY_TOLERANCE {
            return Err(InferenceError::MalformedOutput(format!(
                "probabilities [{low}, {high}] do not sum to 1"
            )));
        }
        Ok(Self(low, high))
    }
}

/// Everything one form submission produces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assessment {
    pub features: FeatureVector,
    pub level: RiskLevel,
    pub probabilities: RiskProbabilities,
}

/// Runs both inference calls on one row, label first.
pub fn assess<C: Classifier + ?Sized>(
    model: &C,
    features: FeatureVector,
) -> Result<Assessment, InferenceError> {
    let level = model.predict(&features)?;
    let probabilities = model.predict_probability(&features)?;
    Ok(Assessment {
        features,
        level,
        probabilities,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probability_lines_use_one_decimal() {
        let probs = RiskProbabilities::try_from([0.734, 0.266]).expect("valid distribution");
        assert_eq!(probs.low_risk_line(), "Low Risk: 73.4%");
        assert_eq!(probs.high_risk_line(), "High Risk: 26.6%");
    }

    #[test]
    fn test_probability_lines_at_extremes() {
        let probs = RiskProbabilities::try_from([1.0, 0.0]).expect("valid distribution");
        assert_eq!(probs.low_risk_line(), "Low Risk: 100.0%");
        assert_eq!(probs.high_risk_line(), "High Risk: 0.0%");
    }

    #[test]
    fn test_half_tenth_percentages_round_in_double_precision() {
        let probs = RiskProbabilities::try_from([0.7345, 0.2655]).expect("valid distribution");
        assert_eq!(probs.low_risk_line(), "Low Risk: 73.5%");
        assert_eq!(probs.high_risk_line(), "High Risk: 26.6%");

        let probs = RiskProbabilities::try_from([0.2345, 0.7655]).expect("valid distribution");
        assert_eq!(probs.low_risk_line(), "Low Risk: 23.4%");
        assert_eq!(probs.high_risk_line(), "High Risk: 76.5%");
    }

    #[test]
    fn test_probabilities_must_sum_to_one() {
        assert!(RiskProbabilities::try_from([0.7, 0.7]).is_err());
        assert!(RiskProbabilities::try_from([-0.1, 1.1]).is_err());
        assert!(RiskProbabilities::try_from([f64::NAN, 0.5]).is_err());
        assert!(RiskProbabilities::try_from([0.3, 0.700_000_5]).is_ok());
    }

    #[test]
    fn test_label_mapping() {
        assert_eq!(RiskLevel::try_from(0).expect("legal"), RiskLevel::Low);
        assert_eq!(RiskLevel::try_from(1).expect("legal"), RiskLevel::AtRisk);
        assert!(matches!(
            RiskLevel::try_from(2),
            Err(InferenceError::UnexpectedLabel(2))
        ));
        assert_eq!(RiskLevel::Low.to_string(), "🟢 Low Risk");
        assert_eq!(RiskLevel::AtRisk.to_string(), "🔴 At-Risk");
        assert_eq!(i64::from(RiskLevel::AtRisk), 1);
    }
}
