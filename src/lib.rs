//! Scoring engine for single boosted-tree style decision trees.
//!
//! A tree is loaded from its text dump, then scored either by walking its
//! node array ([`Tree::evaluate`]) or through code compiled from it once
//! ([`Tree::compile`]). Both read features from two vectors, a subject and a
//! context, addressed as if they were concatenated.
//!
//! ```
//! use treescore::Tree;
//!
//! let tree: Tree = "0:[f0<0.5] yes=1,no=2,missing=1,gain=1,cover=1\n\
//!                   1:leaf=-1,cover=1\n\
//!                   2:leaf=1,cover=1"
//!     .parse()
//!     .unwrap();
//! assert_eq!(tree.evaluate(&[0.4], &[]), Ok(-1.0));
//!
//! let compiled = tree.compile(1);
//! assert_eq!(compiled.evaluate(&[0.5], &[]), Ok(1.0));
//! ```

// Modules
pub mod compiler;
pub mod config;
pub mod constants;
pub mod data;
pub mod errors;
pub mod node;
pub mod parser;
pub mod predict;
pub mod scorer;
pub mod tree;

#[cfg(test)]
mod testing;

// Individual classes, and functions
pub use compiler::CompiledEvaluator;
pub use config::{EvaluationEngine, ModelIO, ScorerConfig};
pub use data::Matrix;
pub use errors::TreeError;
pub use node::Node;
pub use parser::parse_definition;
pub use scorer::Scorer;
pub use tree::Tree;
