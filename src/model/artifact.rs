//! Multinomial logistic regression loaded from a JSON artifact.
//!
//! ```json
//! {
//!   "feature_columns": ["environment_risk_score", "..."],
//!   "classes": ["Low", "Medium", "High"],
//!   "scaler": {"mean": [..], "scale": [..]},
//!   "weights": [[..], [..], [..]],
//!   "bias": [.., .., ..],
//!   "test_accuracy": 0.91
//! }
//! ```

use super::classifier::{ModelError, Prediction, RiskModel};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub feature_columns: Vec<String>,
    pub classes: Vec<String>,
    pub scaler: ScalerParams,
    /// One row per class, one column per feature
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
    #[serde(default)]
    pub test_accuracy: Option<f64>,
}

impl ModelArtifact {
    pub fn validate(&self) -> Result<(), ModelError> {
        let n_features = self.feature_columns.len();
        let n_classes = self.classes.len();

        if n_features == 0 {
            return Err(ModelError::InvalidArtifact("no feature columns".to_string()));
        }
        if n_classes < 2 {
            return Err(ModelError::InvalidArtifact(format!(
                "need at least 2 classes, found {}",
                n_classes
            )));
        }
        if self.scaler.mean.len() != n_features || self.scaler.scale.len() != n_features {
            return Err(ModelError::InvalidArtifact(format!(
                "scaler has {}/{} entries for {} features",
                self.scaler.mean.len(),
                self.scaler.scale.len(),
                n_features
            )));
        }
        if self.weights.len() != n_classes || self.bias.len() != n_classes {
            return Err(ModelError::InvalidArtifact(format!(
                "expected {} weight rows and biases, found {} and {}",
                n_classes,
                self.weights.len(),
                self.bias.len()
            )));
        }
        if let Some(row) = self.weights.iter().find(|row| row.len() != n_features) {
            return Err(ModelError::InvalidArtifact(format!(
                "weight row has {} columns for {} features",
                row.len(),
                n_features
            )));
        }
        if let Some(acc) = self.test_accuracy {
            if !(0.0..=1.0).contains(&acc) {
                return Err(ModelError::InvalidArtifact(format!(
                    "test_accuracy {} outside [0, 1]",
                    acc
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SoftmaxClassifier {
    artifact: ModelArtifact,
}

impl SoftmaxClassifier {
    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self, ModelError> {
        artifact.validate()?;
        Ok(Self { artifact })
    }

    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let artifact: ModelArtifact = serde_json::from_str(&raw)?;
        let model = Self::from_artifact(artifact)?;

        info!(
            path = %path.display(),
            features = model.artifact.feature_columns.len(),
            classes = ?model.artifact.classes,
            "Loaded risk model"
        );
        Ok(model)
    }

    fn standardize(&self, features: &[f64]) -> Vec<f64> {
        let scaler = &self.artifact.scaler;
        features
            .iter()
            .zip(scaler.mean.iter().zip(&scaler.scale))
            .map(|(x, (mean, scale))| {
                // zero scale marks a constant feature
                let scale = if *scale == 0.0 { 1.0 } else { *scale };
                (x - mean) / scale
            })
            .collect()
    }
}

fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|z| (z - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

impl RiskModel for SoftmaxClassifier {
    fn feature_columns(&self) -> &[String] {
        &self.artifact.feature_columns
    }

    fn labels(&self) -> &[String] {
        &self.artifact.classes
    }

    fn predict(&self, features: &[f64]) -> Result<Prediction, ModelError> {
        let expected = self.artifact.feature_columns.len();
        if features.len() != expected {
            return Err(ModelError::FeatureMismatch {
                expected,
                got: features.len(),
            });
        }
        if features.iter().any(|x| !x.is_finite()) {
            return Err(ModelError::Inference(
                "feature vector contains non-finite values".to_string(),
            ));
        }

        let scaled = self.standardize(features);
        let logits: Vec<f64> = self
            .artifact
            .weights
            .iter()
            .zip(&self.artifact.bias)
            .map(|(row, bias)| row.iter().zip(&scaled).map(|(w, x)| w * x).sum::<f64>() + bias)
            .collect();
        let probs = softmax(&logits);

        // first maximum wins on ties
        let (best, confidence) = probs
            .iter()
            .copied()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |acc, (i, p)| if p > acc.1 { (i, p) } else { acc });

        if !confidence.is_finite() {
            return Err(ModelError::Inference("probabilities are not finite".to_string()));
        }

        Ok(Prediction {
            label: self.artifact.classes[best].clone(),
            confidence,
            probabilities: self
                .artifact
                .classes
                .iter()
                .cloned()
                .zip(probs)
                .collect(),
        })
    }

    fn test_accuracy(&self) -> Option<f64> {
        self.artifact.test_accuracy
    }
}
