//! Tree
//!
//! The immutable node array that both the interpreter and the compiler work from.
//! Node 0 is the root. Branch targets may be shared between parents, so the
//! structure is a DAG, but it never contains a cycle.
use crate::config::ModelIO;
use crate::constants::{LEAF_FEATURE_INDEX, MAX_NODES};
use crate::errors::TreeError;
use crate::node::Node;
use crate::parser::parse_definition;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Tree {
    nodes: Vec<Node>,
}

#[derive(Deserialize)]
struct RawTree {
    nodes: Vec<Node>,
}

impl<'de> Deserialize<'de> for Tree {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = RawTree::deserialize(deserializer)?;
        Tree::new(raw.nodes).map_err(serde::de::Error::custom)
    }
}

/// Minimum feature vector lengths a tree reads from, for a given subject length.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct FeatureRequirements {
    pub subject: usize,
    pub context: usize,
}

impl Tree {
    /// Build a tree from its dense node array.
    ///
    /// Fails if the array is empty, larger than [`MAX_NODES`], holds a negative
    /// feature index other than the leaf sentinel, a non-finite threshold or
    /// leaf value, branches outside the array, or contains a cycle.
    pub fn new(nodes: Vec<Node>) -> Result<Self, TreeError> {
        if nodes.is_empty() {
            return Err(TreeError::EmptyTree);
        }
        if nodes.len() > MAX_NODES {
            return Err(TreeError::UnsupportedSize(format!(
                "{} nodes given, at most {} are addressable",
                nodes.len(),
                MAX_NODES
            )));
        }
        for (i, node) in nodes.iter().enumerate() {
            if node.feature_index < LEAF_FEATURE_INDEX {
                return Err(TreeError::InvalidParameter(
                    format!("feature index of node {}", i),
                    format!("{} or a non-negative index", LEAF_FEATURE_INDEX),
                    node.feature_index.to_string(),
                ));
            }
            if !node.value.is_finite() {
                return Err(TreeError::InvalidParameter(
                    format!("value of node {}", i),
                    "a finite number".to_string(),
                    node.value.to_string(),
                ));
            }
            if let Some((t, f)) = node.children() {
                for target in [t, f] {
                    if target >= nodes.len() {
                        return Err(TreeError::BranchOutOfRange {
                            node: i,
                            target,
                            n_nodes: nodes.len(),
                        });
                    }
                }
            }
        }
        check_acyclic(&nodes)?;

        let tree = Tree { nodes };
        let n_reachable = tree.n_reachable();
        if n_reachable < tree.nodes.len() {
            debug!(
                "Tree has {} nodes that cannot be reached from the root.",
                tree.nodes.len() - n_reachable
            );
        }
        Ok(tree)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn root(&self) -> &Node {
        &self.nodes[0]
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Flags for every node that can be reached from the root.
    pub fn reachable(&self) -> Vec<bool> {
        let mut seen = vec![false; self.nodes.len()];
        let mut stack = vec![0];
        while let Some(idx) = stack.pop() {
            if seen[idx] {
                continue;
            }
            seen[idx] = true;
            if let Some((t, f)) = self.nodes[idx].children() {
                stack.push(f);
                stack.push(t);
            }
        }
        seen
    }

    pub fn n_reachable(&self) -> usize {
        self.reachable().into_iter().filter(|r| *r).count()
    }

    /// Number of distinct leaves reachable from the root.
    pub fn n_leaves(&self) -> usize {
        self.reachable()
            .into_iter()
            .zip(self.nodes.iter())
            .filter(|(r, n)| *r && n.is_leaf())
            .count()
    }

    /// Number of edges on the longest path from the root to a leaf.
    pub fn depth(&self) -> usize {
        // Depth below each node; shared children are only measured once.
        let mut below: Vec<Option<usize>> = vec![None; self.nodes.len()];
        let mut stack = vec![(0, false)];
        while let Some((idx, expanded)) = stack.pop() {
            if below[idx].is_some() {
                continue;
            }
            match self.nodes[idx].children() {
                None => below[idx] = Some(0),
                Some((t, f)) if expanded => {
                    let d = below[t].unwrap_or(0).max(below[f].unwrap_or(0));
                    below[idx] = Some(d + 1);
                }
                Some((t, f)) => {
                    stack.push((idx, true));
                    stack.push((f, false));
                    stack.push((t, false));
                }
            }
        }
        below[0].unwrap_or(0)
    }

    /// Smallest subject and context lengths that every reachable decision node
    /// can read from, when `subject_feature_count` features go to the subject.
    pub fn feature_requirements(&self, subject_feature_count: usize) -> FeatureRequirements {
        let mut req = FeatureRequirements::default();
        for (node, reachable) in self.nodes.iter().zip(self.reachable()) {
            if !reachable || node.is_leaf() {
                continue;
            }
            let feature = node.feature_index as usize;
            if feature < subject_feature_count {
                req.subject = req.subject.max(feature + 1);
            } else {
                req.context = req.context.max(feature - subject_feature_count + 1);
            }
        }
        req
    }
}

/// Reject any node that can reach itself.
///
/// Every node is used as a start point, so cycles among unreachable nodes are
/// caught too.
fn check_acyclic(nodes: &[Node]) -> Result<(), TreeError> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        New,
        Active,
        Done,
    }
    let mut marks = vec![Mark::New; nodes.len()];
    for start in 0..nodes.len() {
        if marks[start] != Mark::New {
            continue;
        }
        let mut stack = vec![(start, false)];
        while let Some((idx, leaving)) = stack.pop() {
            if leaving {
                marks[idx] = Mark::Done;
                continue;
            }
            match marks[idx] {
                Mark::Done => continue,
                Mark::Active => return Err(TreeError::CyclicTree { node: idx }),
                Mark::New => {}
            }
            marks[idx] = Mark::Active;
            stack.push((idx, true));
            if let Some((t, f)) = nodes[idx].children() {
                for child in [f, t] {
                    match marks[child] {
                        Mark::Active => return Err(TreeError::CyclicTree { node: child }),
                        Mark::New => stack.push((child, false)),
                        Mark::Done => {}
                    }
                }
            }
        }
    }
    Ok(())
}

impl ModelIO for Tree {}

impl FromStr for Tree {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_definition(s)
    }
}

impl Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}:{}", i, node)?;
        }
        Ok(())
    }
}
