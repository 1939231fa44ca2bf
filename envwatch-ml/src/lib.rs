//! Anomaly Model for envwatch
//!
//! ## Overview
//!
//! The detector scores the rolling mean of the last W readings. This crate
//! provides everything between that mean and a verdict:
//!
//! 1. **[`StandardScaler`]**: per-feature standardization `z = (x - mean) / scale`
//! 2. **[`IsolationForest`]**: isolates unusual vectors with random splits
//! 3. **[`Scorer`]**: scaler + model behind the core `AnomalyScorer` trait
//! 4. **`ModelArtifact`** (std): JSON bundle written by training, loaded once
//!    at startup
//! 5. **`train`** (std): sensor log CSV in, artifact out
//!
//! ## How Isolation Forest Works
//!
//! Random axis-aligned splits isolate points. Points in dense regions need
//! many splits, anomalies very few:
//!
//! ```text
//! score(x) = 2^(-E[h(x)] / c(psi))
//!
//! h(x)   path length of x in one tree (plus c(leaf size) at the leaf)
//! c(n)   average path length of an unsuccessful BST search over n points
//! psi    samples drawn per tree
//! ```
//!
//! Scores near 1 are anomalies, scores well below 0.5 are normal. The decision
//! threshold is not fixed at 0.5: training picks it so that a `contamination`
//! fraction of the training data scores above it.
//!
//! ## Determinism
//!
//! Training uses its own seeded xorshift generator ([`Rng`]), so the same data
//! and seed always give the same forest, and a loaded forest always gives the
//! same verdict for the same vector.
//!
//! ## Memory Model
//!
//! For the defaults (100 trees, 256 samples, depth limit 8):
//! ```text
//! Per tree: at most 2 * 256 - 1 nodes x 24 bytes = ~12KB
//! Forest:   100 trees, ~1.2MB worst case, typically far less
//! Scoring:  no allocation
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]

extern crate alloc;

pub mod forest;
pub mod model;
pub mod node;
pub mod rng;
pub mod scaler;
pub mod scorer;
pub mod scoring;
pub mod tree;

#[cfg(feature = "std")]
pub mod artifact;
#[cfg(feature = "std")]
pub mod train;

pub use forest::{ForestConfig, ForestStats, IsolationForest};
pub use model::{ModelKind, OutlierModel, RadiusModel};
pub use node::{Node, NodeType};
pub use rng::Rng;
pub use scaler::StandardScaler;
pub use scorer::Scorer;
pub use scoring::{calculate_anomaly_score, percentile, AnomalyScore};
pub use tree::{IsolationTree, TreeConfig};

#[cfg(feature = "std")]
pub use artifact::{ArtifactError, ModelArtifact, ARTIFACT_FORMAT_VERSION};
#[cfg(feature = "std")]
pub use train::{train, TrainConfig, TrainError, TrainingData};

use thiserror_no_std::Error;

/// Trees per forest
pub const DEFAULT_NUM_TREES: usize = 100;

/// Samples drawn per tree
pub const DEFAULT_SAMPLE_SIZE: usize = 256;

/// Seed used when none is configured
pub const DEFAULT_SEED: u64 = 42;

/// Expected fraction of anomalies in training data
pub const DEFAULT_CONTAMINATION: f64 = 0.05;

/// Euler-Mascheroni constant
const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Errors from fitting or validating a model
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MLError {
    /// No samples to fit on
    #[error("not enough data to fit the model")]
    InsufficientData,

    /// Configuration out of range
    #[error("invalid model configuration: {0}")]
    InvalidConfig(&'static str),

    /// Forest has no trees
    #[error("forest has no trees")]
    EmptyForest,

    /// A node points outside its tree or backwards
    #[error("tree {tree} has an invalid child link at node {node}")]
    InvalidTree {
        /// Tree index in the forest
        tree: usize,
        /// Node index in the tree
        node: usize,
    },
}

/// Result type for model operations
pub type MLResult<T> = Result<T, MLError>;

/// Average path length of an unsuccessful BST search over `n` points, c(n)
///
/// ```text
/// c(n) = 0                                  n <= 1
///        1                                  n == 2
///        2 (ln(n - 1) + gamma) - 2 (n - 1) / n   otherwise
/// ```
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * (libm::log(n - 1.0) + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}
