use crate::company::CompanyData;
use crate::error::PipelineError;
use crate::model::{feature_vector, ModelError, RiskModel};
use crate::pipeline::context::ModelHandle;
use crate::pipeline::stage::{
    Impact, InterpretationSignals, InterpretationSource, KeyFactor, StageName, StageResult,
};
use tracing::{debug, warn};

pub const UNKNOWN_RISK: &str = "Unknown";

const HIGH_CONFIDENCE: f64 = 0.8;
const LOW_CONFIDENCE: f64 = 0.6;

/// Produces the risk label, confidence, and a short explanation for one
/// company, from the model when one is loaded and from the stored label
/// otherwise.
#[derive(Debug, Default, Clone, Copy)]
pub struct ModelInterpretationStage;

impl ModelInterpretationStage {
    /// Only a feature-count disagreement with the model is an error. Every
    /// other inference failure degrades to an "Unknown" label.
    pub fn execute(
        &self,
        company_name: &str,
        company_data: &CompanyData,
        model: &ModelHandle,
    ) -> Result<StageResult, PipelineError> {
        let (risk_level, confidence, probabilities, model_accuracy, source) = match model {
            ModelHandle::ModelAvailable(model) => match run_model(model.as_ref(), company_data) {
                Ok(prediction) => (
                    prediction.label,
                    prediction.confidence.clamp(0.0, 1.0),
                    Some(prediction.probabilities),
                    model.test_accuracy(),
                    InterpretationSource::Model,
                ),
                Err(ModelError::FeatureMismatch { expected, got }) => {
                    return Err(PipelineError::ContractViolation {
                        stage: StageName::ModelInterpretation.as_str(),
                        message: format!(
                            "model declares {} features but received {}",
                            expected, got
                        ),
                    });
                }
                Err(e) => {
                    warn!(company = company_name, error = %e, "Inference failed, reporting Unknown risk");
                    (
                        UNKNOWN_RISK.to_string(),
                        0.0,
                        None,
                        model.test_accuracy(),
                        InterpretationSource::Failed,
                    )
                }
            },
            ModelHandle::ModelUnavailable(Some(baseline)) => (
                baseline.clone(),
                0.0,
                None,
                None,
                InterpretationSource::Baseline,
            ),
            ModelHandle::ModelUnavailable(None) => (
                UNKNOWN_RISK.to_string(),
                0.0,
                None,
                None,
                InterpretationSource::Unavailable,
            ),
        };

        let key_factors = key_factors(company_data);
        let explanation = explain(company_name, &risk_level, confidence, &key_factors);

        debug!(
            company = company_name,
            risk_level = %risk_level,
            confidence,
            source = ?source,
            "Model interpretation complete"
        );

        Ok(StageResult::interpretation(
            format!(
                "{} ESG risk at {:.1}% confidence",
                risk_level,
                confidence * 100.0
            ),
            InterpretationSignals {
                risk_level,
                confidence,
                probabilities,
                explanation,
                key_factors,
                model_accuracy,
                source,
            },
        ))
    }
}

fn run_model(
    model: &dyn RiskModel,
    company_data: &CompanyData,
) -> Result<crate::model::Prediction, ModelError> {
    let features = feature_vector(company_data, model.feature_columns());
    let prediction = model.predict(&features)?;

    // a label outside the declared set is treated as a failed inference
    if !model.labels().iter().any(|l| *l == prediction.label) {
        return Err(ModelError::Inference(format!(
            "model returned undeclared label '{}'",
            prediction.label
        )));
    }
    Ok(prediction)
}

/// Impact annotations for the metrics that are present, in fixed order
pub fn key_factors(data: &CompanyData) -> Vec<KeyFactor> {
    let mut factors = Vec::with_capacity(5);
    let mut push = |feature: &str, value: Option<f64>, rate: fn(f64) -> Impact| {
        if let Some(value) = value.filter(|v| v.is_finite()) {
            factors.push(KeyFactor {
                feature: feature.to_string(),
                value,
                impact: rate(value),
            });
        }
    };

    push("Total ESG Risk", data.total_esg_risk_score, |v| {
        if v > 30.0 {
            Impact::High
        } else if v > 20.0 {
            Impact::Medium
        } else {
            Impact::Low
        }
    });
    push("Environmental Risk", data.environment_risk_score, pillar_impact);
    push("Social Risk", data.social_risk_score, pillar_impact);
    push("Governance Risk", data.governance_risk_score, pillar_impact);
    push("Controversy Level", data.controversy_score, |v| {
        if v > 3.0 {
            Impact::High
        } else {
            Impact::Low
        }
    });

    factors
}

fn pillar_impact(value: f64) -> Impact {
    if value > 10.0 {
        Impact::High
    } else {
        Impact::Medium
    }
}

fn explain(company: &str, risk_level: &str, confidence: f64, factors: &[KeyFactor]) -> String {
    let mut text = format!(
        "The model predicts {} has '{}' ESG risk with {:.1}% confidence. ",
        company,
        risk_level,
        confidence * 100.0
    );

    if let Some(top) = factors.first() {
        text.push_str(&format!(
            "Primary factor: {} ({} impact). ",
            top.feature, top.impact
        ));
    }

    if confidence > HIGH_CONFIDENCE {
        text.push_str("High confidence in this prediction based on historical patterns.");
    } else if confidence < LOW_CONFIDENCE {
        text.push_str("Lower confidence suggests borderline classification or limited data.");
    }

    text
}
