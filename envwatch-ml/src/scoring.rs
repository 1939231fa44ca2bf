//! Anomaly score calculation and threshold selection

use alloc::vec::Vec;

use crate::average_path_length;

/// Anomaly score result
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnomalyScore {
    /// 2^(-E[h]/c(psi)); near 1 = anomaly, well below 0.5 = normal
    pub score: f64,
    /// Average path length across trees
    pub avg_path_length: f64,
    /// Number of trees used
    pub num_trees: usize,
}

impl AnomalyScore {
    pub fn new(score: f64, avg_path_length: f64, num_trees: usize) -> Self {
        Self {
            score,
            avg_path_length,
            num_trees,
        }
    }

    /// Strictly above the threshold
    pub fn is_anomaly(&self, threshold: f64) -> bool {
        self.score > threshold
    }
}

/// Calculate anomaly score from path lengths
///
/// Uses the formula: score = 2^(-E(h(x))/c(n))
/// where E(h(x)) is the mean path length and n the per-tree sample size.
pub fn calculate_anomaly_score(avg_path_length: f64, num_samples: usize) -> f64 {
    let expected_path = average_path_length(num_samples);
    if expected_path == 0.0 {
        return 0.5; // Neutral score
    }

    libm::exp2(-avg_path_length / expected_path)
}

/// Quantile `q` in `[0, 1]` with linear interpolation between order statistics
///
/// Returns `None` for an empty slice or a non-finite value.
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() || values.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let mut sorted: Vec<f64> = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = libm::floor(position) as usize;
    let upper = (lower + 1).min(sorted.len() - 1);
    let fraction = position - lower as f64;

    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}
