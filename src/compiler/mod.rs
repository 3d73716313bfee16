//! Compiler
//!
//! Translates a [`Tree`] once into a [`CompiledEvaluator`] that scores feature
//! vectors without walking the node array. Compilation runs in two passes:
//!
//! 1. [`lower`] flattens the tree into a [`Program`] of labeled blocks, one per
//!    distinct reachable node, with feature addressing resolved against the
//!    subject feature count.
//! 2. Code generation turns the blocks into a graph of closures with their
//!    operands and thresholds captured as constants.
//!
//! Vector lengths are checked once per call against the longest read in the
//! program. Covered calls run the generated code, which has no per-node
//! error handling. Undersized vectors go through [`Program::run`] so the
//! error names the first read that falls off the end, as the interpreter's
//! does.
//!
//! The evaluator owns its program and closures, so it stays valid after the
//! tree it came from is dropped, and it can be shared across threads.
mod codegen;
pub mod lower;

pub use lower::{lower, Block, Instruction, Label, Program};

use crate::data::Matrix;
use crate::errors::TreeError;
use crate::predict::predict_rows;
use crate::tree::Tree;
use codegen::{generate, BlockFn};
use log::debug;
use std::fmt;
use std::sync::Arc;

/// A tree translated into directly callable code.
#[derive(Clone)]
pub struct CompiledEvaluator {
    entry: BlockFn,
    program: Arc<Program>,
}

impl CompiledEvaluator {
    /// Score one subject against one context.
    ///
    /// Feature indices below the compiled subject feature count read the
    /// subject vector, the rest read the context vector. Undersized vectors
    /// are reported as [`TreeError::FeatureOutOfRange`] when the walk reaches
    /// the missing feature.
    pub fn evaluate(&self, subject: &[f32], context: &[f32]) -> Result<f32, TreeError> {
        if self.program.covers(subject, context) {
            Ok((self.entry)(subject, context))
        } else {
            self.program.run(subject, context)
        }
    }

    /// Score every row of `data` as a subject against the same context.
    pub fn predict(&self, data: &Matrix<f32>, context: &[f32], parallel: bool) -> Result<Vec<f32>, TreeError> {
        predict_rows(|s, c| self.evaluate(s, c), data, context, parallel)
    }

    pub fn subject_feature_count(&self) -> usize {
        self.program.subject_feature_count
    }

    /// The lowered program this evaluator was generated from.
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Unwrap into a plain function value.
    pub fn into_fn(self) -> impl Fn(&[f32], &[f32]) -> Result<f32, TreeError> + Clone + Send + Sync + 'static {
        move |subject: &[f32], context: &[f32]| self.evaluate(subject, context)
    }
}

impl fmt::Debug for CompiledEvaluator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("CompiledEvaluator")
            .field("subject_feature_count", &self.program.subject_feature_count)
            .field("n_blocks", &self.program.n_blocks())
            .finish()
    }
}

impl Tree {
    /// Compile the tree for callers that put `subject_feature_count` features
    /// in the subject vector.
    ///
    /// Each distinct reachable node is compiled exactly once, shared children
    /// included. The comparison keeps the interpreter's tie break: only a
    /// feature strictly below the threshold takes the true branch.
    pub fn compile(&self, subject_feature_count: usize) -> CompiledEvaluator {
        let program = lower(self, subject_feature_count);
        debug!(
            "Lowered {} nodes into {} blocks ({} branches, {} shared targets).",
            self.n_nodes(),
            program.n_blocks(),
            program.n_branches(),
            program.shared_targets
        );
        let entry = generate(&program);
        CompiledEvaluator {
            entry,
            program: Arc::new(program),
        }
    }
}
