use crate::constants::LEAF_FEATURE_INDEX;
use crate::errors::FeatureSource;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single entry of a tree's node array.
///
/// For a decision node `value` is the split threshold, for a leaf it is the
/// predicted output. Branch targets are only meaningful on decision nodes.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
pub struct Node {
    pub value: f32,
    pub feature_index: i16,
    pub true_branch: u8,
    pub false_branch: u8,
}

impl Node {
    pub fn leaf(value: f32) -> Self {
        Node {
            value,
            feature_index: LEAF_FEATURE_INDEX,
            true_branch: 0,
            false_branch: 0,
        }
    }

    pub fn decision(feature_index: i16, threshold: f32, true_branch: u8, false_branch: u8) -> Self {
        Node {
            value: threshold,
            feature_index,
            true_branch,
            false_branch,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.feature_index == LEAF_FEATURE_INDEX
    }

    /// Get the path that should be traveled down, given a feature value.
    /// Only a value strictly below the threshold takes the true branch,
    /// so ties and NaN both go false.
    pub fn get_child_idx(&self, v: f32) -> usize {
        if v < self.value {
            self.true_branch as usize
        } else {
            self.false_branch as usize
        }
    }

    /// Children of a decision node as `(true, false)`, `None` for a leaf.
    pub fn children(&self) -> Option<(usize, usize)> {
        if self.is_leaf() {
            None
        } else {
            Some((self.true_branch as usize, self.false_branch as usize))
        }
    }

    /// Map the node's feature index onto the split feature space.
    ///
    /// Indices below `subject_len` select from the subject vector, the rest
    /// select from the context vector at `feature_index - subject_len`.
    /// Leaves have no operand.
    pub fn operand(&self, subject_len: usize) -> Option<(FeatureSource, usize)> {
        if self.is_leaf() {
            return None;
        }
        let feature = self.feature_index as usize;
        if feature >= subject_len {
            Some((FeatureSource::Context, feature - subject_len))
        } else {
            Some((FeatureSource::Subject, feature))
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_leaf() {
            write!(f, "leaf={}", self.value)
        } else {
            write!(
                f,
                "[f{}<{}] yes={},no={}",
                self.feature_index, self.value, self.true_branch, self.false_branch
            )
        }
    }
}
