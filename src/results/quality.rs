use serde::{Deserialize, Serialize};
use std::fmt;

/// Categorical summary of mean detection confidence for one image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualityTier {
    Excellent,
    Good,
    Fair,
    Poor,
    NoTextDetected,
}

impl QualityTier {
    /// Tier for a set of detection confidences.
    ///
    /// Boundaries are strict: a mean of exactly 0.85 is `Good`.
    pub fn from_confidences(confidences: &[f64]) -> Self {
        if confidences.is_empty() {
            return Self::NoTextDetected;
        }
        let mean = confidences.iter().sum::<f64>() / confidences.len() as f64;
        Self::from_mean(mean)
    }

    /// Tier for a non-empty set with the given mean confidence
    pub fn from_mean(mean: f64) -> Self {
        if mean > 0.85 {
            Self::Excellent
        } else if mean > 0.70 {
            Self::Good
        } else if mean > 0.50 {
            Self::Fair
        } else {
            Self::Poor
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "EXCELLENT",
            Self::Good => "GOOD",
            Self::Fair => "FAIR",
            Self::Poor => "POOR",
            Self::NoTextDetected => "NO_TEXT_DETECTED",
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
