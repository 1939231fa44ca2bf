//! Model artifact: everything the detector needs, in one JSON file
//!
//! ```json
//! {
//!   "format_version": 1,
//!   "features": ["Temperature", "Humidity", "Motion"],
//!   "rolling_window": 5,
//!   "contamination": 0.05,
//!   "outlier_label": -1,
//!   "trained_samples": 1436,
//!   "scaler": { "mean": [22.1, 45.3, 0.04], "scale": [0.61, 1.9, 0.11] },
//!   "model": { "type": "isolation_forest", "trees": [...], "sample_size": 256, "threshold": 0.58 }
//! }
//! ```
//!
//! Loading is all-or-nothing. Every check below is fatal, because a
//! detector running on a half-valid model would alert on the wrong things
//! without anyone noticing:
//!
//! - unknown `format_version`
//! - feature list other than [`FEATURE_NAMES`], in that order
//! - `outlier_label` other than [`PREDICTION_OUTLIER`]
//! - zero or non-finite scaler scale
//! - structurally broken model (dangling child links, no trees)
//!
//! The one soft check is `rolling_window`: see [`ModelArtifact::check_window`].

use std::fs;
use std::io;
use std::path::Path;

use envwatch_core::{ScoreError, Verdict, FEATURE_NAMES, PREDICTION_OUTLIER};
use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

use crate::{MLError, ModelKind, Scorer, StandardScaler};

/// Artifact layout version written by this crate
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Why an artifact could not be used
#[derive(Error, Debug)]
pub enum ArtifactError {
    /// No file at the path
    #[error("model artifact not found at {path}")]
    NotFound {
        /// Artifact path
        path: String,
    },

    /// File exists but could not be read or written
    #[error("model artifact I/O failed for {path}: {source}")]
    Io {
        /// Artifact path
        path: String,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Not valid artifact JSON
    #[error("model artifact is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),

    /// Written by an incompatible version
    #[error("unsupported artifact format version {found} (expected {expected})")]
    UnsupportedVersion {
        /// Version in the file
        found: u32,
        /// Version this build reads
        expected: u32,
    },

    /// Trained on different features or in a different order
    #[error("artifact features {found:?} do not match {expected:?}")]
    FeatureMismatch {
        /// Features in the file
        found: Vec<String>,
        /// Features this build produces
        expected: [&'static str; 3],
    },

    /// Trained with a different outlier convention
    #[error("artifact outlier label is {found}, expected {expected}")]
    OutlierLabel {
        /// Label in the file
        found: i8,
        /// Compiled convention
        expected: i8,
    },

    /// Scaler cannot standardize
    #[error("artifact scaler is unusable: {0}")]
    Scaler(ScoreError),

    /// Model structure is broken
    #[error("artifact model is invalid: {0}")]
    Model(MLError),
}

/// Scaler, model and training metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub features: Vec<String>,
    /// W used for the training rolling mean
    pub rolling_window: usize,
    pub contamination: f64,
    /// Prediction value that means "anomaly"
    pub outlier_label: i8,
    /// Rolling-mean vectors the model was fitted on
    pub trained_samples: usize,
    pub scaler: StandardScaler,
    pub model: ModelKind,
}

impl ModelArtifact {
    /// Bundle a freshly trained scaler and model
    pub fn new(
        scaler: StandardScaler,
        model: ModelKind,
        rolling_window: usize,
        contamination: f64,
        trained_samples: usize,
    ) -> Self {
        Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            features: FEATURE_NAMES.iter().map(|f| f.to_string()).collect(),
            rolling_window,
            contamination,
            outlier_label: PREDICTION_OUTLIER,
            trained_samples,
            scaler,
            model,
        }
    }

    /// Read and validate an artifact file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => ArtifactError::NotFound {
                path: path.display().to_string(),
            },
            _ => ArtifactError::Io {
                path: path.display().to_string(),
                source,
            },
        })?;

        let artifact = Self::from_json(&text)?;
        log::info!(
            "loaded {} model from {} ({} training vectors, window {})",
            artifact.model.name(),
            path.display(),
            artifact.trained_samples,
            artifact.rolling_window
        );
        Ok(artifact)
    }

    /// Parse and validate
    pub fn from_json(text: &str) -> Result<Self, ArtifactError> {
        let artifact: Self = serde_json::from_str(text).map_err(ArtifactError::Parse)?;
        artifact.validate()?;
        Ok(artifact)
    }

    pub fn to_json(&self) -> Result<String, ArtifactError> {
        serde_json::to_string_pretty(self).map_err(ArtifactError::Parse)
    }

    /// Write the artifact, creating the parent directory
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ArtifactError> {
        let path = path.as_ref();
        let io_error = |source| ArtifactError::Io {
            path: path.display().to_string(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        fs::write(path, self.to_json()?).map_err(io_error)?;

        log::info!("saved {} model to {}", self.model.name(), path.display());
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(ArtifactError::UnsupportedVersion {
                found: self.format_version,
                expected: ARTIFACT_FORMAT_VERSION,
            });
        }

        if !self.features.iter().map(String::as_str).eq(FEATURE_NAMES.iter().copied()) {
            return Err(ArtifactError::FeatureMismatch {
                found: self.features.clone(),
                expected: FEATURE_NAMES,
            });
        }

        if Verdict::from_prediction(self.outlier_label) != Some(Verdict::Outlier) {
            return Err(ArtifactError::OutlierLabel {
                found: self.outlier_label,
                expected: PREDICTION_OUTLIER,
            });
        }

        self.scaler.check().map_err(ArtifactError::Scaler)?;
        self.model.validate().map_err(ArtifactError::Model)
    }

    /// Compare the training window with the configured one
    ///
    /// A mismatch still works but feeds the model means over a different
    /// number of readings than it learned from, so it is only a warning.
    pub fn check_window(&self, configured: usize) -> bool {
        if self.rolling_window == configured {
            return true;
        }
        log::warn!(
            "model was trained with rolling window {} but the configuration uses {}",
            self.rolling_window,
            configured
        );
        false
    }

    /// Scorer for the detector
    pub fn into_scorer(self) -> Scorer<ModelKind> {
        Scorer::new(self.scaler, self.model)
    }
}
