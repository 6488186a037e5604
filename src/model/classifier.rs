use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read model artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse model artifact: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid model artifact: {0}")]
    InvalidArtifact(String),

    #[error("feature vector has {got} values, model expects {expected}")]
    FeatureMismatch { expected: usize, got: usize },

    #[error("inference failed: {0}")]
    Inference(String),
}

/// Output of one classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    /// Probability of `label`, the largest class probability
    pub confidence: f64,
    pub probabilities: BTreeMap<String, f64>,
}

/// Black-box risk classifier: features in the declared order, label out.
pub trait RiskModel: Send + Sync {
    /// Feature names in the order `predict` expects them
    fn feature_columns(&self) -> &[String];

    /// Class labels, indexed like the probability vector
    fn labels(&self) -> &[String];

    fn predict(&self, features: &[f64]) -> Result<Prediction, ModelError>;

    /// Held-out accuracy recorded at training time, when known
    fn test_accuracy(&self) -> Option<f64> {
        None
    }
}
