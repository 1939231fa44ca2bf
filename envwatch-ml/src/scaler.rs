//! Per-feature standardization
//!
//! `z_i = (x_i - mean_i) / scale_i`, with `scale` the population standard
//! deviation of the training vectors. A feature that never varied in training
//! (motion in a room nobody entered) gets scale 1.0 instead of 0.0, so a
//! freshly fitted scaler is never degenerate. A scaler read from elsewhere can
//! still carry a zero scale; [`StandardScaler::transform`] refuses it instead
//! of dividing by zero.

use envwatch_core::{FeatureVector, ScoreError, FEATURE_COUNT};
use serde::{Deserialize, Serialize};

use crate::{MLError, MLResult};

/// Scales below this count as zero variance
const MIN_SCALE: f64 = 10.0 * f64::EPSILON;

/// Fitted mean and scale per feature, in model order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: [f64; FEATURE_COUNT],
    pub scale: [f64; FEATURE_COUNT],
}

impl StandardScaler {
    pub fn new(mean: [f64; FEATURE_COUNT], scale: [f64; FEATURE_COUNT]) -> Self {
        Self { mean, scale }
    }

    /// Fit mean and population standard deviation
    pub fn fit(samples: &[FeatureVector]) -> MLResult<Self> {
        if samples.is_empty() {
            return Err(MLError::InsufficientData);
        }

        let n = samples.len() as f64;
        let mut mean = [0.0; FEATURE_COUNT];
        for sample in samples {
            for (m, v) in mean.iter_mut().zip(sample.as_array()) {
                *m += v;
            }
        }
        mean.iter_mut().for_each(|m| *m /= n);

        let mut variance = [0.0; FEATURE_COUNT];
        for sample in samples {
            for i in 0..FEATURE_COUNT {
                let d = sample.0[i] - mean[i];
                variance[i] += d * d;
            }
        }

        let mut scale = [1.0; FEATURE_COUNT];
        for i in 0..FEATURE_COUNT {
            let std = libm::sqrt(variance[i] / n);
            if std >= MIN_SCALE {
                scale[i] = std;
            }
        }

        let scaler = Self { mean, scale };
        scaler
            .check()
            .map_err(|_| MLError::InvalidConfig("training data is not finite"))?;
        Ok(scaler)
    }

    /// Reject a zero, negative or non-finite scale and a non-finite mean
    pub fn check(&self) -> Result<(), ScoreError> {
        for feature in 0..FEATURE_COUNT {
            let scale = self.scale[feature];
            if !scale.is_finite() || scale <= 0.0 {
                return Err(ScoreError::DegenerateScale { feature, scale });
            }
            if !self.mean[feature].is_finite() {
                return Err(ScoreError::NonFinite { feature });
            }
        }
        Ok(())
    }

    /// Standardize one vector
    pub fn transform(&self, raw: &FeatureVector) -> Result<FeatureVector, ScoreError> {
        self.check()?;

        let mut z = [0.0; FEATURE_COUNT];
        for feature in 0..FEATURE_COUNT {
            let value = (raw.0[feature] - self.mean[feature]) / self.scale[feature];
            if !value.is_finite() {
                return Err(ScoreError::NonFinite { feature });
            }
            z[feature] = value;
        }
        Ok(FeatureVector(z))
    }
}
