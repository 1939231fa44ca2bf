//! Isolation tree node implementation
//!
//! Nodes live in a flat `Vec` per tree and refer to their children by index.
//! A parent is always stored before its children, so every child index is
//! larger than its parent's; [`crate::IsolationTree::validate`] relies on that
//! to prove traversal terminates on a loaded artifact.

use envwatch_core::FeatureVector;
use serde::{Deserialize, Serialize};

use crate::average_path_length;

/// Node type in the isolation tree
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeType {
    /// Internal node with split condition
    Internal {
        /// Feature index to split on
        feature: u8,
        /// Values strictly below go left
        split_value: f64,
        /// Left child index
        left: u32,
        /// Right child index
        right: u32,
    },
    /// Leaf node (external)
    External {
        /// Number of training samples that reached this leaf
        size: u32,
    },
}

/// One tree node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Node type and data
    pub node_type: NodeType,
    /// Path length from root
    pub depth: u16,
}

impl Node {
    /// Create an internal node
    pub fn internal(feature: u8, split_value: f64, left: u32, right: u32, depth: u16) -> Self {
        Self {
            node_type: NodeType::Internal {
                feature,
                split_value,
                left,
                right,
            },
            depth,
        }
    }

    /// Create an external (leaf) node
    pub fn external(size: u32, depth: u16) -> Self {
        Self {
            node_type: NodeType::External { size },
            depth,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.node_type, NodeType::External { .. })
    }

    /// Path length credited to a sample ending here
    ///
    /// Depth plus c(size): a leaf holding several samples stands for an
    /// unbuilt subtree of roughly that average depth.
    pub fn path_length(&self) -> f64 {
        match self.node_type {
            NodeType::External { size } => f64::from(self.depth) + average_path_length(size as usize),
            NodeType::Internal { .. } => f64::from(self.depth),
        }
    }

    /// Child index to visit next, `None` at a leaf
    ///
    /// A feature index outside the vector routes right, same as a value at
    /// or above the split.
    pub fn traverse(&self, sample: &FeatureVector) -> Option<u32> {
        match self.node_type {
            NodeType::Internal { feature, split_value, left, right } => {
                match sample.get(usize::from(feature)) {
                    Some(value) if value < split_value => Some(left),
                    _ => Some(right),
                }
            }
            NodeType::External { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_creation() {
        let internal = Node::internal(0, 25.0, 1, 2, 3);
        assert!(!internal.is_leaf());
        assert_eq!(internal.depth, 3);

        let external = Node::external(10, 5);
        assert!(external.is_leaf());
        assert_eq!(external.depth, 5);
    }

    #[test]
    fn test_node_traverse() {
        let node = Node::internal(0, 25.0, 1, 2, 0);

        assert_eq!(node.traverse(&FeatureVector::new(20.0, 0.0, 0.0)), Some(1));
        assert_eq!(node.traverse(&FeatureVector::new(25.0, 0.0, 0.0)), Some(2));
        assert_eq!(Node::external(1, 0).traverse(&FeatureVector::zeros()), None);
    }

    #[test]
    fn leaf_path_length_adds_c_of_size() {
        assert_eq!(Node::external(1, 4).path_length(), 4.0);
        assert_eq!(Node::external(2, 4).path_length(), 5.0);
    }
}
