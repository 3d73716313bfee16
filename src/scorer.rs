//! Scorer
//!
//! Loads a tree definition and scores subjects against contexts with the
//! engine picked in a [`ScorerConfig`].
use crate::compiler::CompiledEvaluator;
use crate::config::{EvaluationEngine, ScorerConfig};
use crate::data::Matrix;
use crate::errors::TreeError;
use crate::tree::Tree;
use log::{info, warn};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::fmt;
use std::fs;
use std::path::Path;

pub struct Scorer {
    tree: Tree,
    compiled: Option<CompiledEvaluator>,
    config: ScorerConfig,
    pool: Option<ThreadPool>,
}

impl Scorer {
    /// Wrap a tree, compiling it up front when the config asks for it.
    pub fn new(tree: Tree, config: ScorerConfig) -> Result<Self, TreeError> {
        config.validate()?;
        let compiled = match config.engine {
            EvaluationEngine::Compiled => Some(tree.compile(config.subject_feature_count)),
            EvaluationEngine::Interpreted => None,
        };
        let pool = match config.num_threads {
            Some(n) => Some(
                ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| thread_pool_error(n, e))?,
            ),
            None => None,
        };

        let req = tree.feature_requirements(config.subject_feature_count);
        info!(
            "Scoring a {} node tree with the {:?} engine, reading {} subject and {} context features.",
            tree.n_nodes(),
            config.engine,
            req.subject,
            req.context
        );
        if tree.n_reachable() < tree.n_nodes() {
            warn!(
                "{} of {} tree nodes are unreachable from the root.",
                tree.n_nodes() - tree.n_reachable(),
                tree.n_nodes()
            );
        }

        Ok(Scorer {
            tree,
            compiled,
            config,
            pool,
        })
    }

    /// Build a scorer from definition text.
    pub fn from_definition(definition: &str, config: ScorerConfig) -> Result<Self, TreeError> {
        Self::new(definition.parse()?, config)
    }

    /// Build a scorer from a definition file.
    ///
    /// * `path` - Path of the text dump to load.
    pub fn load<P: AsRef<Path>>(path: P, config: ScorerConfig) -> Result<Self, TreeError> {
        let definition = fs::read_to_string(path).map_err(|e| TreeError::UnableToRead(e.to_string()))?;
        Self::from_definition(&definition, config)
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn config(&self) -> &ScorerConfig {
        &self.config
    }

    pub fn compiled(&self) -> Option<&CompiledEvaluator> {
        self.compiled.as_ref()
    }

    /// Score one subject against one context.
    ///
    /// The subject must hold exactly `subject_feature_count` features, so
    /// both engines address the same vector for every feature index.
    pub fn score(&self, subject: &[f32], context: &[f32]) -> Result<f32, TreeError> {
        self.check_subject_len(subject.len())?;
        match &self.compiled {
            Some(compiled) => compiled.evaluate(subject, context),
            None => self.tree.evaluate(subject, context),
        }
    }

    /// Score each row of `data` as a subject against the same context.
    pub fn score_batch(&self, data: &Matrix<f32>, context: &[f32]) -> Result<Vec<f32>, TreeError> {
        self.check_subject_len(data.cols)?;
        let parallel = self.config.parallel;
        let run = || match &self.compiled {
            Some(compiled) => compiled.predict(data, context, parallel),
            None => self.tree.predict(data, context, parallel),
        };
        match &self.pool {
            Some(pool) if parallel => pool.install(run),
            _ => run(),
        }
    }

    fn check_subject_len(&self, len: usize) -> Result<(), TreeError> {
        if len != self.config.subject_feature_count {
            return Err(TreeError::InvalidParameter(
                "subject".to_string(),
                format!("{} features", self.config.subject_feature_count),
                len.to_string(),
            ));
        }
        Ok(())
    }
}

fn thread_pool_error(num_threads: usize, reason: impl fmt::Display) -> TreeError {
    TreeError::InvalidParameter(
        "num_threads".to_string(),
        format!("a thread count rayon can build a pool with ({})", reason),
        num_threads.to_string(),
    )
}
