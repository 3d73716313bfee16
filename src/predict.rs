//! Predict
//!
//! The tree interpreter. Each call walks the node array from the root,
//! reading one feature per decision node until it reaches a leaf.
use crate::data::Matrix;
use crate::errors::{FeatureSource, TreeError};
use crate::tree::Tree;
use rayon::prelude::*;

/// Read a feature from the subject or context vector.
#[inline]
pub(crate) fn read_feature(
    subject: &[f32],
    context: &[f32],
    vector: FeatureSource,
    index: usize,
) -> Result<f32, TreeError> {
    let values = match vector {
        FeatureSource::Subject => subject,
        FeatureSource::Context => context,
    };
    values.get(index).copied().ok_or(TreeError::FeatureOutOfRange {
        vector,
        index,
        len: values.len(),
    })
}

impl Tree {
    /// Score one subject against one context.
    ///
    /// A node's feature index below `subject.len()` reads the subject vector,
    /// any other index reads the context vector at `feature_index - subject.len()`.
    /// A feature strictly below the threshold follows the true branch,
    /// everything else (equality and NaN included) follows the false branch.
    pub fn evaluate(&self, subject: &[f32], context: &[f32]) -> Result<f32, TreeError> {
        let nodes = self.nodes();
        let mut node = self.root();
        while let Some((vector, index)) = node.operand(subject.len()) {
            let v = read_feature(subject, context, vector, index)?;
            node = &nodes[node.get_child_idx(v)];
        }
        Ok(node.value)
    }

    /// Score every row of `data` as a subject against the same context.
    pub fn predict(&self, data: &Matrix<f32>, context: &[f32], parallel: bool) -> Result<Vec<f32>, TreeError> {
        predict_rows(|s, c| self.evaluate(s, c), data, context, parallel)
    }
}

/// Apply a row scorer to each row of `data`, in `data.index` order.
pub(crate) fn predict_rows<F>(score: F, data: &Matrix<f32>, context: &[f32], parallel: bool) -> Result<Vec<f32>, TreeError>
where
    F: Fn(&[f32], &[f32]) -> Result<f32, TreeError> + Sync,
{
    if parallel {
        data.index
            .par_iter()
            .map(|i| score(data.get_row(*i), context))
            .collect()
    } else {
        data.index.iter().map(|i| score(data.get_row(*i), context)).collect()
    }
}
