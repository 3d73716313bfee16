//! Scorer Configuration
//!
//! Defines how a loaded tree is evaluated, and the JSON persistence shared by
//! configurations and trees.
use crate::errors::TreeError;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Which evaluator a [`crate::Scorer`] uses.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum EvaluationEngine {
    /// Walk the node array on every call.
    Interpreted,
    /// Compile the tree once when the scorer is built.
    #[default]
    Compiled,
}

fn default_parallel() -> bool {
    true
}

/// Configuration for the `Scorer`.
#[derive(Clone, Serialize, Deserialize, PartialEq, Debug)]
pub struct ScorerConfig {
    /// Evaluation strategy.
    #[serde(default)]
    pub engine: EvaluationEngine,
    /// Number of leading feature indices that address the subject vector.
    pub subject_feature_count: usize,
    /// Whether batch scoring runs rows in parallel.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
    /// Number of threads for batch scoring, rayon's global pool when `None`.
    #[serde(default)]
    pub num_threads: Option<usize>,
}

impl ScorerConfig {
    pub fn new(subject_feature_count: usize) -> Self {
        ScorerConfig {
            engine: EvaluationEngine::default(),
            subject_feature_count,
            parallel: default_parallel(),
            num_threads: None,
        }
    }

    pub fn validate(&self) -> Result<(), TreeError> {
        if self.num_threads == Some(0) {
            return Err(TreeError::InvalidParameter(
                "num_threads".to_string(),
                "a positive thread count".to_string(),
                "0".to_string(),
            ));
        }
        Ok(())
    }
}

/// IO
pub trait ModelIO: Serialize + DeserializeOwned + Sized {
    /// Save as a json object to a file.
    ///
    /// * `path` - Path to save to.
    fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), TreeError> {
        fs::write(path, self.json_dump()?).map_err(|e| TreeError::UnableToWrite(e.to_string()))
    }

    /// Dump as a json object
    fn json_dump(&self) -> Result<String, TreeError> {
        serde_json::to_string(self).map_err(|e| TreeError::UnableToWrite(e.to_string()))
    }

    /// Load from a Json string
    ///
    /// * `json_str` - String object, which can be serialized to json.
    fn from_json(json_str: &str) -> Result<Self, TreeError> {
        serde_json::from_str::<Self>(json_str).map_err(|e| TreeError::UnableToRead(e.to_string()))
    }

    /// Load from a path to a json object.
    ///
    /// * `path` - Path to load from.
    fn load<P: AsRef<Path>>(path: P) -> Result<Self, TreeError> {
        let json_str = fs::read_to_string(path).map_err(|e| TreeError::UnableToRead(e.to_string()))?;
        Self::from_json(&json_str)
    }
}

impl ModelIO for ScorerConfig {}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_scorer_config_default() {
        let config = ScorerConfig::new(3);
        assert_eq!(config.engine, EvaluationEngine::Compiled);
        assert_eq!(config.subject_feature_count, 3);
        assert!(config.parallel);
        assert_eq!(config.num_threads, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_scorer_config_partial_json() {
        let config = ScorerConfig::from_json(r#"{"subject_feature_count": 4}"#).unwrap();
        assert_eq!(config, ScorerConfig::new(4));

        let json = r#"{"engine": "Interpreted", "subject_feature_count": 2, "parallel": false, "num_threads": 2}"#;
        let config = ScorerConfig::from_json(json).unwrap();
        assert_eq!(config.engine, EvaluationEngine::Interpreted);
        assert!(!config.parallel);
        assert_eq!(config.num_threads, Some(2));
    }

    #[test]
    fn test_scorer_config_requires_subject_count() {
        assert!(matches!(
            ScorerConfig::from_json(r#"{"engine": "Compiled"}"#),
            Err(TreeError::UnableToRead(_))
        ));
    }

    #[test]
    fn test_scorer_config_validate() {
        let mut config = ScorerConfig::new(1);
        config.num_threads = Some(0);
        assert!(matches!(config.validate(), Err(TreeError::InvalidParameter(..))));
    }

    #[test]
    fn test_scorer_config_io_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("scorer.json");
        let mut config = ScorerConfig::new(5);
        config.engine = EvaluationEngine::Interpreted;
        config.save(&file_path).unwrap();
        let config2 = ScorerConfig::load(&file_path).unwrap();
        assert_eq!(config, config2);
        assert!(matches!(
            ScorerConfig::load(dir.path().join("missing.json")),
            Err(TreeError::UnableToRead(_))
        ));
    }
}
