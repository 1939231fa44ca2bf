//! Isolation Forest implementation
//!
//! Combines many isolation trees, each grown on its own random subsample, and
//! fixes the decision threshold from the training data.
//!
//! ## Training
//!
//! ```text
//! psi       = min(sample_size, n)
//! max_depth = ceil(log2(psi))          unless configured
//! for each tree:
//!     subsample psi points without replacement (partial Fisher-Yates)
//!     grow the tree with a seed drawn from the forest generator
//! threshold = (1 - contamination) quantile of the training scores
//! ```
//!
//! A vector is an outlier iff its score is strictly above `threshold`.

use alloc::vec::Vec;

use envwatch_core::FeatureVector;
use serde::{Deserialize, Serialize};

use crate::{
    calculate_anomaly_score, percentile, AnomalyScore, IsolationTree, MLError, MLResult, Rng,
    TreeConfig, DEFAULT_CONTAMINATION, DEFAULT_NUM_TREES, DEFAULT_SAMPLE_SIZE, DEFAULT_SEED,
};

/// Configuration for Isolation Forest
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForestConfig {
    /// Number of trees in the forest
    pub num_trees: usize,
    /// Samples drawn per tree (capped at the data size)
    pub sample_size: usize,
    /// Maximum tree depth; `None` = ceil(log2(psi))
    pub max_depth: Option<usize>,
    /// Random seed
    pub seed: u64,
    /// Expected anomaly fraction in the training data, in (0, 0.5]
    pub contamination: f64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            num_trees: DEFAULT_NUM_TREES,
            sample_size: DEFAULT_SAMPLE_SIZE,
            max_depth: None,
            seed: DEFAULT_SEED,
            contamination: DEFAULT_CONTAMINATION,
        }
    }
}

impl ForestConfig {
    pub fn validate(&self) -> MLResult<()> {
        if self.num_trees == 0 {
            return Err(MLError::InvalidConfig("num_trees must be at least 1"));
        }
        if self.sample_size == 0 {
            return Err(MLError::InvalidConfig("sample_size must be at least 1"));
        }
        if self.max_depth == Some(0) {
            return Err(MLError::InvalidConfig("max_depth must be at least 1"));
        }
        if !(self.contamination > 0.0 && self.contamination <= 0.5) {
            return Err(MLError::InvalidConfig("contamination must be in (0, 0.5]"));
        }
        Ok(())
    }
}

/// Trained forest; immutable once fitted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsolationForest {
    /// Individual trees
    trees: Vec<IsolationTree>,
    /// Per-tree sample size psi, the n in c(n)
    sample_size: usize,
    /// Scores strictly above this are outliers
    threshold: f64,
}

impl IsolationForest {
    /// Train the forest on samples
    pub fn fit(samples: &[FeatureVector], config: &ForestConfig) -> MLResult<Self> {
        config.validate()?;
        if samples.is_empty() {
            return Err(MLError::InsufficientData);
        }

        let sample_size = config.sample_size.min(samples.len());
        let max_depth = config.max_depth.unwrap_or_else(|| ceil_log2(sample_size).max(1));
        let mut rng = Rng::new(config.seed);

        let mut trees = Vec::with_capacity(config.num_trees);
        for _ in 0..config.num_trees {
            let subset = sample_subset(&mut rng, samples, sample_size);
            let tree_config = TreeConfig {
                max_depth,
                seed: rng.next_u64(),
            };
            trees.push(IsolationTree::fit(&subset, tree_config)?);
        }

        let mut forest = Self {
            trees,
            sample_size,
            threshold: 0.5,
        };

        let scores: Vec<f64> = samples.iter().map(|s| forest.anomaly_score(s).score).collect();
        forest.threshold = percentile(&scores, 1.0 - config.contamination)
            .ok_or(MLError::InvalidConfig("training scores are not finite"))?;

        log::debug!(
            "fitted {} trees (psi {}, depth {}), threshold {:.4}",
            forest.trees.len(),
            sample_size,
            max_depth,
            forest.threshold
        );

        Ok(forest)
    }

    /// Mean path length across trees
    pub fn path_length(&self, sample: &FeatureVector) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let total: f64 = self.trees.iter().map(|t| t.path_length(sample)).sum();
        total / self.trees.len() as f64
    }

    /// Calculate anomaly score for a sample
    pub fn anomaly_score(&self, sample: &FeatureVector) -> AnomalyScore {
        let avg_path_length = self.path_length(sample);
        let score = calculate_anomaly_score(avg_path_length, self.sample_size);
        AnomalyScore::new(score, avg_path_length, self.trees.len())
    }

    /// Check if a sample is an anomaly
    pub fn is_anomaly(&self, sample: &FeatureVector) -> bool {
        self.anomaly_score(sample).is_anomaly(self.threshold)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    /// Structural check for a forest read from disk
    pub fn validate(&self) -> MLResult<()> {
        if self.trees.is_empty() {
            return Err(MLError::EmptyForest);
        }
        if self.sample_size == 0 {
            return Err(MLError::InvalidConfig("sample_size must be at least 1"));
        }
        if !self.threshold.is_finite() {
            return Err(MLError::InvalidConfig("threshold must be finite"));
        }
        for (index, tree) in self.trees.iter().enumerate() {
            tree.validate(index)?;
        }
        Ok(())
    }

    /// Get forest statistics
    pub fn stats(&self) -> ForestStats {
        ForestStats {
            num_trees: self.trees.len(),
            total_nodes: self.trees.iter().map(|t| t.node_count()).sum(),
            max_depth: self.trees.iter().map(|t| t.depth()).max().unwrap_or(0),
            sample_size: self.sample_size,
            threshold: self.threshold,
        }
    }
}

/// Forest statistics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForestStats {
    /// Number of trees
    pub num_trees: usize,
    /// Total nodes across all trees
    pub total_nodes: usize,
    /// Deepest node in any tree
    pub max_depth: usize,
    /// Per-tree sample size
    pub sample_size: usize,
    /// Decision threshold
    pub threshold: f64,
}

/// `size` distinct samples, without replacement
fn sample_subset(rng: &mut Rng, samples: &[FeatureVector], size: usize) -> Vec<FeatureVector> {
    if size >= samples.len() {
        return samples.to_vec();
    }

    let mut indices: Vec<usize> = (0..samples.len()).collect();
    for i in 0..size {
        let j = i + rng.next_range(samples.len() - i);
        indices.swap(i, j);
    }

    indices[..size].iter().map(|&i| samples[i]).collect()
}

/// ceil(log2(n)) for n >= 1
fn ceil_log2(n: usize) -> usize {
    if n <= 1 {
        0
    } else {
        (usize::BITS - (n - 1).leading_zeros()) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_data() -> Vec<FeatureVector> {
        let mut samples = Vec::new();

        // Normal data cluster
        for i in 0..40 {
            let temp = 20.0 + (i % 8) as f64 * 0.1;
            let humidity = 50.0 + (i % 5) as f64 * 0.2;
            samples.push(FeatureVector::new(temp, humidity, 0.0));
        }

        // Anomalies
        samples.push(FeatureVector::new(35.0, 90.0, 1.0));
        samples.push(FeatureVector::new(5.0, 20.0, 1.0));

        samples
    }

    fn small_config() -> ForestConfig {
        ForestConfig {
            num_trees: 25,
            sample_size: 32,
            ..ForestConfig::default()
        }
    }

    #[test]
    fn test_ceil_log2() {
        assert_eq!(ceil_log2(1), 0);
        assert_eq!(ceil_log2(2), 1);
        assert_eq!(ceil_log2(3), 2);
        assert_eq!(ceil_log2(256), 8);
        assert_eq!(ceil_log2(257), 9);
    }

    #[test]
    fn test_forest_fit() {
        let forest = IsolationForest::fit(&create_test_data(), &small_config()).unwrap();

        let stats = forest.stats();
        assert_eq!(stats.num_trees, 25);
        assert_eq!(stats.sample_size, 32);
        assert!(stats.total_nodes > 25);
        assert!(stats.max_depth <= 5);
        assert!(forest.validate().is_ok());
    }

    #[test]
    fn sample_size_capped_at_data_size() {
        let data = create_test_data();
        let forest = IsolationForest::fit(&data, &ForestConfig::default()).unwrap();
        assert_eq!(forest.sample_size(), data.len());
    }

    #[test]
    fn test_anomaly_detection() {
        let forest = IsolationForest::fit(&create_test_data(), &small_config()).unwrap();

        let normal = FeatureVector::new(20.3, 50.4, 0.0);
        let anomaly = FeatureVector::new(35.0, 90.0, 1.0);

        assert!(forest.anomaly_score(&anomaly).score > forest.anomaly_score(&normal).score);
        assert!(forest.is_anomaly(&anomaly));
        assert!(!forest.is_anomaly(&normal));
    }

    #[test]
    fn threshold_flags_about_contamination_share() {
        let data = create_test_data();
        let config = ForestConfig { contamination: 0.1, ..small_config() };
        let forest = IsolationForest::fit(&data, &config).unwrap();

        let flagged = data.iter().filter(|s| forest.is_anomaly(s)).count();
        // Strictly-above rule on a 42-point set: at most ceil(0.1 * 42)
        assert!(flagged >= 1 && flagged <= 5, "flagged {}", flagged);
    }

    #[test]
    fn same_seed_same_forest() {
        let data = create_test_data();
        let a = IsolationForest::fit(&data, &small_config()).unwrap();
        let b = IsolationForest::fit(&data, &small_config()).unwrap();
        assert_eq!(a, b);

        let c = IsolationForest::fit(&data, &ForestConfig { seed: 7, ..small_config() }).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn invalid_config_rejected() {
        let data = create_test_data();
        for config in [
            ForestConfig { num_trees: 0, ..ForestConfig::default() },
            ForestConfig { sample_size: 0, ..ForestConfig::default() },
            ForestConfig { contamination: 0.0, ..ForestConfig::default() },
            ForestConfig { contamination: 0.6, ..ForestConfig::default() },
            ForestConfig { contamination: f64::NAN, ..ForestConfig::default() },
        ] {
            assert!(matches!(IsolationForest::fit(&data, &config), Err(MLError::InvalidConfig(_))));
        }
        assert_eq!(IsolationForest::fit(&[], &ForestConfig::default()), Err(MLError::InsufficientData));
    }
}
