//! Isolation tree implementation
//!
//! Trees are built by recursively partitioning a sample until every point is
//! isolated, all remaining points are identical, or the depth limit is hit.
//!
//! ## Split Selection
//!
//! - Feature: uniform among the features that still vary in this partition
//! - Value: uniform in `[min, max)` of that feature
//! - Values strictly below the split go left
//!
//! A partition where no feature varies becomes a leaf holding all of its
//! points; its path length is then corrected by c(size).

use alloc::vec::Vec;

use envwatch_core::{FeatureVector, FEATURE_COUNT};
use serde::{Deserialize, Serialize};

use crate::{MLError, MLResult, Node, NodeType, Rng};

/// Configuration for isolation tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeConfig {
    /// Maximum depth of tree
    pub max_depth: usize,
    /// Random seed for this tree
    pub seed: u64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 8, // ceil(log2(256))
            seed: crate::DEFAULT_SEED,
        }
    }
}

/// Isolation tree in array representation; node 0 is the root
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IsolationTree {
    nodes: Vec<Node>,
}

impl IsolationTree {
    /// Build a tree over `samples`
    pub fn fit(samples: &[FeatureVector], config: TreeConfig) -> MLResult<Self> {
        if samples.is_empty() {
            return Err(MLError::InsufficientData);
        }

        let mut builder = Builder {
            nodes: Vec::with_capacity(2 * samples.len() - 1),
            rng: Rng::new(config.seed),
            max_depth: config.max_depth,
        };
        builder.build(samples.to_vec(), 0);

        Ok(Self { nodes: builder.nodes })
    }

    /// Path length of `sample`, leaf correction included
    pub fn path_length(&self, sample: &FeatureVector) -> f64 {
        let mut index = 0usize;

        loop {
            let node = match self.nodes.get(index) {
                Some(node) => node,
                None => return 0.0,
            };

            match node.traverse(sample) {
                Some(next) => index = next as usize,
                None => return node.path_length(),
            }
        }
    }

    /// Check every child link points forward and inside the tree
    ///
    /// `tree` is only used to label the error.
    pub fn validate(&self, tree: usize) -> MLResult<()> {
        if self.nodes.is_empty() {
            return Err(MLError::InvalidTree { tree, node: 0 });
        }

        for (index, node) in self.nodes.iter().enumerate() {
            if let NodeType::Internal { feature, left, right, .. } = node.node_type {
                let ok = usize::from(feature) < FEATURE_COUNT
                    && [left, right]
                        .iter()
                        .all(|&child| (child as usize) > index && (child as usize) < self.nodes.len());
                if !ok {
                    return Err(MLError::InvalidTree { tree, node: index });
                }
            }
        }
        Ok(())
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Get the number of nodes in the tree
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Deepest node
    pub fn depth(&self) -> usize {
        self.nodes.iter().map(|n| usize::from(n.depth)).max().unwrap_or(0)
    }
}

struct Builder {
    nodes: Vec<Node>,
    rng: Rng,
    max_depth: usize,
}

impl Builder {
    /// Append the subtree for `samples`, returning its root index
    fn build(&mut self, samples: Vec<FeatureVector>, depth: u16) -> u32 {
        let index = self.nodes.len() as u32;

        if usize::from(depth) >= self.max_depth || samples.len() <= 1 {
            self.nodes.push(Node::external(samples.len() as u32, depth));
            return index;
        }

        let (feature, split_value) = match self.select_split(&samples) {
            Some(split) => split,
            None => {
                // All samples identical
                self.nodes.push(Node::external(samples.len() as u32, depth));
                return index;
            }
        };

        let count = samples.len() as u32;
        let (left, right): (Vec<FeatureVector>, Vec<FeatureVector>) =
            samples.into_iter().partition(|s| s.0[feature] < split_value);

        if left.is_empty() || right.is_empty() {
            self.nodes.push(Node::external(count, depth));
            return index;
        }

        // Reserve the parent slot so children land after it
        self.nodes.push(Node::external(0, depth));
        let left_index = self.build(left, depth + 1);
        let right_index = self.build(right, depth + 1);
        self.nodes[index as usize] = Node::internal(feature as u8, split_value, left_index, right_index, depth);

        index
    }

    fn select_split(&mut self, samples: &[FeatureVector]) -> Option<(usize, f64)> {
        let mut ranges = [(0usize, 0.0f64, 0.0f64); FEATURE_COUNT];
        let mut varying = 0;

        for feature in 0..FEATURE_COUNT {
            let (min, max) = feature_range(samples, feature);
            if max > min {
                ranges[varying] = (feature, min, max);
                varying += 1;
            }
        }

        if varying == 0 {
            return None;
        }

        let (feature, min, max) = ranges[self.rng.next_range(varying)];
        Some((feature, self.rng.next_f64_range(min, max)))
    }
}

fn feature_range(samples: &[FeatureVector], feature: usize) -> (f64, f64) {
    samples.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), s| {
        (min.min(s.0[feature]), max.max(s.0[feature]))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn create_test_samples() -> Vec<FeatureVector> {
        vec![
            // Normal samples
            FeatureVector::new(20.0, 50.0, 0.0),
            FeatureVector::new(22.0, 55.0, 0.0),
            FeatureVector::new(21.0, 52.0, 0.0),
            FeatureVector::new(19.0, 48.0, 0.0),
            // Anomaly
            FeatureVector::new(35.0, 90.0, 1.0),
        ]
    }

    #[test]
    fn empty_sample_rejected() {
        assert_eq!(IsolationTree::fit(&[], TreeConfig::default()), Err(MLError::InsufficientData));
    }

    #[test]
    fn test_tree_fit() {
        let config = TreeConfig { max_depth: 5, seed: 123 };
        let tree = IsolationTree::fit(&create_test_samples(), config).unwrap();

        assert!(tree.node_count() > 1);
        assert!(tree.depth() <= 5);
        assert!(tree.validate(0).is_ok());
    }

    #[test]
    fn fully_grown_tree_isolates_every_sample() {
        let samples = create_test_samples();
        let tree = IsolationTree::fit(&samples, TreeConfig { max_depth: 64, seed: 9 }).unwrap();

        let leaves: u32 = tree
            .nodes()
            .iter()
            .filter_map(|n| match n.node_type {
                NodeType::External { size } => Some(size),
                NodeType::Internal { .. } => None,
            })
            .sum();
        assert_eq!(leaves as usize, samples.len());
        assert_eq!(tree.node_count(), 2 * samples.len() - 1);
    }

    #[test]
    fn identical_samples_make_a_single_leaf() {
        let samples = vec![FeatureVector::new(1.0, 1.0, 1.0); 4];
        let tree = IsolationTree::fit(&samples, TreeConfig::default()).unwrap();

        assert_eq!(tree.nodes(), &[Node::external(4, 0)]);
        assert_eq!(tree.path_length(&samples[0]), crate::average_path_length(4));
    }

    #[test]
    fn same_seed_same_tree() {
        let samples = create_test_samples();
        let a = IsolationTree::fit(&samples, TreeConfig { max_depth: 8, seed: 5 }).unwrap();
        let b = IsolationTree::fit(&samples, TreeConfig { max_depth: 8, seed: 5 }).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn validate_rejects_backward_links() {
        let tree = IsolationTree {
            nodes: vec![Node::internal(0, 1.0, 0, 1, 0), Node::external(1, 1)],
        };
        assert_eq!(tree.validate(3), Err(MLError::InvalidTree { tree: 3, node: 0 }));
    }
}
