use serde::Serialize;

use super::controls::{Gender, Location};

pub const FEATURE_COUNT: usize = 11;

/// Column names in the order the model was fit against.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "daily_screen_time_hours",
    "sleep_quality",
    "social_media_hours",
    "weekly_depression_score",
    "weekly_anxiety_score",
    "stress_level",
    "age",
    "gender_Female",
    "gender_Male",
    "location_type_Rural",
    "location_type_Urban",
];

/// A single model-ready row.
///
/// Only built through [`FeatureVector::new`], which takes the categorical
/// answers as enums, so each one-hot pair always holds exactly one `1`.
/// Serializes with the exact column names of [`FEATURE_NAMES`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureVector {
    daily_screen_time_hours: f32,
    sleep_quality: u8,
    social_media_hours: f32,
    weekly_depression_score: f32,
    weekly_anxiety_score: f32,
    stress_level: f32,
    age: u8,
    #[serde(rename = "gender_Female")]
    gender_female: u8,
    #[serde(rename = "gender_Male")]
    gender_male: u8,
    #[serde(rename = "location_type_Rural")]
    location_type_rural: u8,
    #[serde(rename = "location_type_Urban")]
    location_type_urban: u8,
}

impl FeatureVector {
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        daily_screen_time_hours: f32,
        sleep_quality: u8,
        social_media_hours: f32,
        weekly_depression_score: f32,
        weekly_anxiety_score: f32,
        stress_level: f32,
        age: u8,
        gender: Gender,
        location: Location,
    ) -> Self {
        let (gender_female, gender_male) = gender.one_hot();
        let (location_type_rural, location_type_urban) = location.one_hot();
        Self {
            daily_screen_time_hours,
            sleep_quality,
            social_media_hours,
            weekly_depression_score,
            weekly_anxiety_score,
            stress_level,
            age,
            gender_female,
            gender_male,
            location_type_rural,
            location_type_urban,
        }
    }

    #[must_use]
    pub fn daily_screen_time_hours(&self) -> f32 {
        self.daily_screen_time_hours
    }

    #[must_use]
    pub fn sleep_quality(&self) -> u8 {
        self.sleep_quality
    }

    #[must_use]
    pub fn social_media_hours(&self) -> f32 {
        self.social_media_hours
    }

    #[must_use]
    pub fn weekly_depression_score(&self) -> f32 {
        self.weekly_depression_score
    }

    #[must_use]
    pub fn weekly_anxiety_score(&self) -> f32 {
        self.weekly_anxiety_score
    }

    #[must_use]
    pub fn stress_level(&self) -> f32 {
        self.stress_level
    }

    #[must_use]
    pub fn age(&self) -> u8 {
        self.age
    }

    #[must_use]
    pub fn gender_female(&self) -> u8 {
        self.gender_female
    }

    #[must_use]
    pub fn gender_male(&self) -> u8 {
        self.gender_male
    }

    #[must_use]
    pub fn location_type_rural(&self) -> u8 {
        self.location_type_rural
    }

    #[must_use]
    pub fn location_type_urban(&self) -> u8 {
        self.location_type_urban
    }

    /// Dense row in [`FEATURE_NAMES`] order, as model runtimes consume it.
    #[must_use]
    pub fn to_row(&self) -> [f32; FEATURE_COUNT] {
        [
            self.daily_screen_time_hours,
            f32::from(self.sleep_quality),
            self.social_media_hours,
            self.weekly_depression_score,
            self.weekly_anxiety_score,
            self.stress_level,
            f32::from(self.age),
            f32::from(self.gender_female),
            f32::from(self.gender_male),
            f32::from(self.location_type_rural),
            f32::from(self.location_type_urban),
        ]
    }
}
