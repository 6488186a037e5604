//! Risk classification: the model seam, the JSON softmax artifact, and
//! feature assembly from company metrics

mod artifact;
mod classifier;
mod features;

pub use artifact::{ModelArtifact, ScalerParams, SoftmaxClassifier};
pub use classifier::{ModelError, Prediction, RiskModel};
pub use features::{feature_vector, PredictionInput, FEATURE_COLUMNS};
