use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use super::{
    controls::{self, Gender, Location},
    vector::FeatureVector,
};

/// Current state of every control on the survey form.
///
/// Missing fields in a serialized form take the control's default, so an
/// empty object is the initial form. The whole-step answers accept any
/// number and land on their track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormAnswers {
    pub screen_time: f32,
    #[serde(deserialize_with = "sleep_quality_on_track")]
    pub sleep_quality: u8,
    pub social_media: f32,
    pub depression: f32,
    pub anxiety: f32,
    pub stress: f32,
    #[serde(deserialize_with = "age_on_track")]
    pub age: u8,
    pub gender: Gender,
    pub location: Location,
}

fn sleep_quality_on_track<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    f64::deserialize(deserializer).map(|value| controls::SLEEP_QUALITY.clamp_number(value))
}

fn age_on_track<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    f64::deserialize(deserializer).map(|value| controls::AGE.clamp_number(value))
}

impl Default for FormAnswers {
    fn default() -> Self {
        Self {
            screen_time: controls::SCREEN_TIME.default,
            sleep_quality: controls::SLEEP_QUALITY.default,
            social_media: controls::SOCIAL_MEDIA.default,
            depression: controls::DEPRESSION.default,
            anxiety: controls::ANXIETY.default,
            stress: controls::STRESS.default,
            age: controls::AGE.default,
            gender: Gender::default(),
            location: Location::default(),
        }
    }
}

impl FormAnswers {
    #[must_use]
    pub fn with_screen_time(mut self, hours: f32) -> Self {
        self.screen_time = controls::SCREEN_TIME.clamp(hours);
        self
    }

    #[must_use]
    pub fn with_sleep_quality(mut self, quality: u8) -> Self {
        self.sleep_quality = controls::SLEEP_QUALITY.clamp(quality);
        self
    }

    #[must_use]
    pub fn with_social_media(mut self, hours: f32) -> Self {
        self.social_media = controls::SOCIAL_MEDIA.clamp(hours);
        self
    }

    #[must_use]
    pub fn with_depression(mut self, score: f32) -> Self {
        self.depression = controls::DEPRESSION.clamp(score);
        self
    }

    #[must_use]
    pub fn with_anxiety(mut self, score: f32) -> Self {
        self.anxiety = controls::ANXIETY.clamp(score);
        self
    }

    #[must_use]
    pub fn with_stress(mut self, level: f32) -> Self {
        self.stress = controls::STRESS.clamp(level);
        self
    }

    #[must_use]
    pub fn with_age(mut self, age: u8) -> Self {
        self.age = controls::AGE.clamp(age);
        self
    }

    #[must_use]
    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = gender;
        self
    }

    #[must_use]
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    /// Every numeric answer moved onto its control's track.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self::default()
            .with_screen_time(self.screen_time)
            .with_sleep_quality(self.sleep_quality)
            .with_social_media(self.social_media)
            .with_depression(self.depression)
            .with_anxiety(self.anxiety)
            .with_stress(self.stress)
            .with_age(self.age)
            .with_gender(self.gender)
            .with_location(self.location)
    }

    /// Assembles the model row. Answers on their tracks pass through
    /// unchanged.
    #[must_use]
    pub fn to_features(&self) -> FeatureVector {
        let answers = self.clamped();
        debug!(
            gender = %answers.gender,
            location = %answers.location,
            age = answers.age,
            "Assembling feature vector from form answers"
        );
        FeatureVector::new(
            answers.screen_time,
            answers.sleep_quality,
            answers.social_media,
            answers.depression,
            answers.anxiety,
            answers.stress,
            answers.age,
            answers.gender,
            answers.location,
        )
    }
}

impl From<FormAnswers> for FeatureVector {
    fn from(answers: FormAnswers) -> Self {
        answers.to_features()
    }
}
