//! Plain-text rendering of an [`Assessment`].

use crate::pipeline::Assessment;

/// Window title; the heading below is what the form shows.
pub const PAGE_TITLE: &str = "Digital Diet & Mental Health Classifier";

pub const TITLE: &str = "🧠 Digital Diet & Mental Health Risk Predictor";

pub const INTRO: &str = "This app uses a machine learning model to predict the likelihood of \
mental health risk based on your digital usage patterns and lifestyle habits.";

pub const CREDIT: &str = "Developed by Hilda Adina Rahmi — Junior Data Scientist.";

pub const RESULT_HEADING: &str = "🎯 Prediction Result";

pub const PROBABILITY_HEADING: &str = "📈 Risk Probability";

pub const EXPLAIN_HEADING: &str = "📘 How does this work?";

pub const EXPLANATION: &str = "\
The model was trained using a Random Forest Classifier on a dataset of 1,000+ individuals.
It considers behavioral patterns such as:
- Screen time
- Social media usage
- Sleep quality
- Stress, anxiety, and depression levels";

/// `Mental Health Risk Level: 🔴 At-Risk`
#[must_use]
pub fn verdict_line(assessment: &Assessment) -> String {
    format!("Mental Health Risk Level: {}", assessment.level)
}

/// The result section, one line per entry, headings included.
#[must_use]
pub fn result_lines(assessment: &Assessment) -> [String; 5] {
    [
        RESULT_HEADING.to_string(),
        verdict_line(assessment),
        PROBABILITY_HEADING.to_string(),
        assessment.probabilities.low_risk_line(),
        assessment.probabilities.high_risk_line(),
    ]
}
