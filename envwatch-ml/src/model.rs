//! Binary outlier models
//!
//! The detector only needs two things from a model: a continuous score for
//! a standardized vector and the threshold above which that score is an
//! outlier. [`OutlierModel`] is that contract. The isolation forest is the
//! trained model; [`RadiusModel`] is a fixed boundary (distance from the
//! training mean) useful for bench setups and tests where the decision must
//! be known in advance.

use envwatch_core::{FeatureVector, Verdict};
use serde::{Deserialize, Serialize};

use crate::{IsolationForest, MLError, MLResult};

/// Scores standardized vectors; higher = more anomalous
pub trait OutlierModel {
    /// Continuous anomaly score
    fn anomaly_score(&self, z: &FeatureVector) -> f64;

    /// Scores strictly above this are outliers
    fn threshold(&self) -> f64;

    /// Verdict for a precomputed score
    fn verdict_for(&self, score: f64) -> Verdict {
        if score > self.threshold() {
            Verdict::Outlier
        } else {
            Verdict::Inlier
        }
    }

    fn classify(&self, z: &FeatureVector) -> Verdict {
        self.verdict_for(self.anomaly_score(z))
    }
}

impl OutlierModel for IsolationForest {
    fn anomaly_score(&self, z: &FeatureVector) -> f64 {
        IsolationForest::anomaly_score(self, z).score
    }

    fn threshold(&self) -> f64 {
        IsolationForest::threshold(self)
    }
}

/// Outlier when the standardized vector lies farther than `radius` from the
/// origin (the training mean)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadiusModel {
    pub radius: f64,
}

impl OutlierModel for RadiusModel {
    fn anomaly_score(&self, z: &FeatureVector) -> f64 {
        libm::sqrt(z.norm_squared())
    }

    fn threshold(&self) -> f64 {
        self.radius
    }
}

/// Any model an artifact can carry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelKind {
    IsolationForest(IsolationForest),
    Radius(RadiusModel),
}

impl ModelKind {
    /// Structural check after deserialization
    pub fn validate(&self) -> MLResult<()> {
        match self {
            ModelKind::IsolationForest(forest) => forest.validate(),
            ModelKind::Radius(model) if model.radius.is_finite() && model.radius >= 0.0 => Ok(()),
            ModelKind::Radius(_) => Err(MLError::InvalidConfig("radius must be finite and non-negative")),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ModelKind::IsolationForest(_) => "isolation forest",
            ModelKind::Radius(_) => "radius",
        }
    }
}

impl OutlierModel for ModelKind {
    fn anomaly_score(&self, z: &FeatureVector) -> f64 {
        match self {
            ModelKind::IsolationForest(forest) => OutlierModel::anomaly_score(forest, z),
            ModelKind::Radius(model) => model.anomaly_score(z),
        }
    }

    fn threshold(&self) -> f64 {
        match self {
            ModelKind::IsolationForest(forest) => OutlierModel::threshold(forest),
            ModelKind::Radius(model) => model.threshold(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radius_boundary() {
        let model = RadiusModel { radius: 3.0 };
        assert_eq!(model.classify(&FeatureVector::zeros()), Verdict::Inlier);
        assert_eq!(model.classify(&FeatureVector::new(3.0, 0.0, 0.0)), Verdict::Inlier);
        assert_eq!(model.classify(&FeatureVector::new(3.0, 0.1, 0.0)), Verdict::Outlier);
    }

    #[test]
    fn classify_is_deterministic() {
        let model = ModelKind::Radius(RadiusModel { radius: 1.0 });
        let z = FeatureVector::new(0.5, -0.9, 0.2);
        assert_eq!(model.classify(&z), model.classify(&z));
    }

    #[test]
    fn negative_radius_invalid() {
        assert!(ModelKind::Radius(RadiusModel { radius: -1.0 }).validate().is_err());
        assert!(ModelKind::Radius(RadiusModel { radius: 2.0 }).validate().is_ok());
    }
}
