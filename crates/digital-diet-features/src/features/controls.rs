//! Survey form controls.
//!
//! Each numeric question is a [`Slider`] with a fixed track: a value can never
//! leave `[min, max]`. The two categorical questions are exclusive two-option
//! choices ([`Gender`], [`Location`]).

use core::fmt;

use serde::{Deserialize, Serialize};

/// A bounded numeric control with a default position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slider<T> {
    pub label: &'static str,
    pub min: T,
    pub max: T,
    pub default: T,
}

impl<T: PartialOrd + Copy> Slider<T> {
    /// Returns `true` if `value` lies on the slider's track.
    #[must_use]
    pub fn contains(&self, value: T) -> bool {
        value >= self.min && value <= self.max
    }

    /// Moves `value` onto the track, the same way dragging past either end
    /// stops at that end. Unordered values (NaN) land on `min`.
    #[must_use]
    pub fn clamp(&self, value: T) -> T {
        if value > self.max {
            self.max
        } else if value >= self.min {
            value
        } else {
            self.min
        }
    }
}

impl Slider<u8> {
    /// Rounds any number to the nearest whole step and moves it onto the
    /// track. NaN lands on `min`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn clamp_number(&self, value: f64) -> u8 {
        let value = value.round();
        if value >= f64::from(self.max) {
            self.max
        } else if value >= f64::from(self.min) {
            value as u8
        } else {
            self.min
        }
    }
}

pub const SCREEN_TIME: Slider<f32> = Slider {
    label: "📱 Daily Screen Time (hours)",
    min: 0.0,
    max: 15.0,
    default: 5.0,
};

pub const SLEEP_QUALITY: Slider<u8> = Slider {
    label: "😴 Sleep Quality (1 = Poor, 10 = Excellent)",
    min: 1,
    max: 10,
    default: 5,
};

pub const SOCIAL_MEDIA: Slider<f32> = Slider {
    label: "📲 Social Media Use (hours)",
    min: 0.0,
    max: 8.0,
    default: 2.0,
};

pub const DEPRESSION: Slider<f32> = Slider {
    label: "📉 Weekly Depression Score (0–10)",
    min: 0.0,
    max: 10.0,
    default: 4.0,
};

pub const ANXIETY: Slider<f32> = Slider {
    label: "😟 Weekly Anxiety Score (0–10)",
    min: 0.0,
    max: 10.0,
    default: 4.0,
};

pub const STRESS: Slider<f32> = Slider {
    label: "😰 Stress Level (0–10)",
    min: 0.0,
    max: 10.0,
    default: 5.0,
};

pub const AGE: Slider<u8> = Slider {
    label: "🎂 Age",
    min: 13,
    max: 65,
    default: 25,
};

/// Gender choice. The first option is preselected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    #[serde(alias = "Male")]
    Male,
    #[serde(alias = "Female")]
    Female,
}

impl Gender {
    pub const LABEL: &'static str = "⚧️ Gender";

    /// One-hot columns as `(gender_Female, gender_Male)`.
    #[must_use]
    pub fn one_hot(self) -> (u8, u8) {
        match self {
            Self::Female => (1, 0),
            Self::Male => (0, 1),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Male => write!(f, "Male"),
            Self::Female => write!(f, "Female"),
        }
    }
}

/// Living environment choice. The first option is preselected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum Location {
    #[default]
    #[serde(alias = "Urban")]
    Urban,
    #[serde(alias = "Rural")]
    Rural,
}

impl Location {
    pub const LABEL: &'static str = "🏡 Living Environment";

    /// One-hot columns as `(location_type_Rural, location_type_Urban)`.
    #[must_use]
    pub fn one_hot(self) -> (u8, u8) {
        match self {
            Self::Rural => (1, 0),
            Self::Urban => (0, 1),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Urban => write!(f, "Urban"),
            Self::Rural => write!(f, "Rural"),
        }
    }
}
