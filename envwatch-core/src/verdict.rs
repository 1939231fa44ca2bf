//! Scorer verdicts and the prediction convention
//!
//! The anomaly log stores verdicts as integers. The convention is the one the
//! model artifact is trained with: outlier = -1, inlier = +1. It is spelled
//! out here once; the artifact carries its own `outlier_label` and loading
//! refuses an artifact that disagrees, so a different convention can never
//! silently invert the alerting.

use core::fmt;

use crate::reading::FeatureVector;

/// Logged prediction for a normal reading
pub const PREDICTION_INLIER: i8 = 1;

/// Logged prediction for an anomaly
pub const PREDICTION_OUTLIER: i8 = -1;

/// Binary classifier output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// Matches the learned normal distribution
    Inlier,
    /// Deviates from it; drives the alert outputs
    Outlier,
}

impl Verdict {
    /// Integer prediction written to the anomaly log
    pub const fn prediction(self) -> i8 {
        match self {
            Verdict::Inlier => PREDICTION_INLIER,
            Verdict::Outlier => PREDICTION_OUTLIER,
        }
    }

    /// Parse a logged prediction; anything but ±1 is rejected
    pub const fn from_prediction(prediction: i8) -> Option<Self> {
        match prediction {
            PREDICTION_INLIER => Some(Verdict::Inlier),
            PREDICTION_OUTLIER => Some(Verdict::Outlier),
            _ => None,
        }
    }

    /// True for [`Verdict::Outlier`]
    pub const fn is_outlier(self) -> bool {
        matches!(self, Verdict::Outlier)
    }

    /// Human-readable status
    pub const fn label(self) -> &'static str {
        match self {
            Verdict::Inlier => "normal",
            Verdict::Outlier => "anomaly",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of scoring one window mean
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scored {
    /// Binary verdict
    pub verdict: Verdict,
    /// Continuous anomaly score, if the model has one (higher = more anomalous)
    pub score: Option<f64>,
    /// The standardized vector the model saw
    pub standardized: FeatureVector,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outlier_is_minus_one() {
        assert_eq!(PREDICTION_OUTLIER, -1);
        assert_eq!(Verdict::Outlier.prediction(), -1);
        assert_eq!(Verdict::from_prediction(-1), Some(Verdict::Outlier));
    }

    #[test]
    fn inlier_is_plus_one() {
        assert_eq!(PREDICTION_INLIER, 1);
        assert_eq!(Verdict::Inlier.prediction(), 1);
        assert_eq!(Verdict::from_prediction(1), Some(Verdict::Inlier));
    }

    #[test]
    fn other_predictions_rejected() {
        assert_eq!(Verdict::from_prediction(0), None);
        assert_eq!(Verdict::from_prediction(2), None);
    }
}
