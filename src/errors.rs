//! Errors
//!
//! Custom error types used throughout the `treescore` crate.
use std::fmt;
use thiserror::Error;

/// Which of the two feature vectors a lookup was made against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureSource {
    /// The subject vector, addressed by the raw feature index.
    Subject,
    /// The context vector, addressed by `feature_index - subject_len`.
    Context,
}

impl fmt::Display for FeatureSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FeatureSource::Subject => write!(f, "subject"),
            FeatureSource::Context => write!(f, "context"),
        }
    }
}

/// Errors that can occur while building, compiling or evaluating a tree.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TreeError {
    /// A definition line matched neither node grammar, or a number failed to parse.
    #[error("Malformed definition on line {line} ({content:?}): {reason}")]
    MalformedDefinition {
        line: usize,
        content: String,
        reason: String,
    },
    /// A feature lookup went past the end of one of the feature vectors.
    #[error("Feature offset {index} is out of range for the {vector} vector of length {len}.")]
    FeatureOutOfRange {
        vector: FeatureSource,
        index: usize,
        len: usize,
    },
    /// A branch references a node that does not exist.
    #[error("Node {node} branches to {target}, but the tree only has {n_nodes} nodes.")]
    BranchOutOfRange { node: usize, target: usize, n_nodes: usize },
    /// The tree would need indices or node counts beyond the compact representation.
    #[error("Unsupported tree size: {0}")]
    UnsupportedSize(String),
    /// The node array is empty.
    #[error("A tree needs at least one node.")]
    EmptyTree,
    /// A node can reach one of its own ancestors.
    #[error("Node {node} is part of a cycle.")]
    CyclicTree { node: usize },
    /// A node index was declared more than once.
    #[error("Node index {0} is defined more than once.")]
    DuplicateNodeIndex(usize),
    /// The node indices do not form the sequence 0..n.
    #[error("Node index {0} is missing from the definition.")]
    MissingNodeIndex(usize),
    /// First value is the name of the parameter, second is expected, third is what was passed.
    #[error("Invalid parameter value passed for {0}, expected {1} but {2} provided.")]
    InvalidParameter(String, String, String),
    /// Unable to write model to file.
    #[error("Unable to write model to file: {0}")]
    UnableToWrite(String),
    /// Unable to read model from file.
    #[error("Unable to read model from a file {0}")]
    UnableToRead(String),
}
