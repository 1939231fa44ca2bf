//! Scaler and model behind the detector's scoring trait

use envwatch_core::{AnomalyScorer, FeatureVector, ScoreError, Scored, FEATURE_COUNT};

use crate::{ModelKind, OutlierModel, StandardScaler};

/// Standardizes the window mean, then classifies it
#[derive(Debug, Clone, PartialEq)]
pub struct Scorer<M = ModelKind> {
    scaler: StandardScaler,
    model: M,
}

impl<M: OutlierModel> Scorer<M> {
    pub fn new(scaler: StandardScaler, model: M) -> Self {
        Self { scaler, model }
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn model(&self) -> &M {
        &self.model
    }
}

impl<M: OutlierModel> AnomalyScorer for Scorer<M> {
    fn score(&self, mean: &FeatureVector) -> Result<Scored, ScoreError> {
        let standardized = self.scaler.transform(mean)?;

        let score = self.model.anomaly_score(&standardized);
        if !score.is_finite() {
            return Err(ScoreError::NonFinite { feature: FEATURE_COUNT });
        }

        Ok(Scored {
            verdict: self.model.verdict_for(score),
            score: Some(score),
            standardized,
        })
    }
}
