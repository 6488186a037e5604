use crate::company::CompanyData;
use serde::{Deserialize, Serialize};

/// Column order of the shipped risk model
pub const FEATURE_COLUMNS: [&str; 5] = [
    "environment_risk_score",
    "social_risk_score",
    "governance_risk_score",
    "controversy_score",
    "full_time_employees",
];

const MAX_SCORE: f64 = 100.0;

/// Builds a feature vector in `columns` order; missing metrics become 0.
pub fn feature_vector(data: &CompanyData, columns: &[String]) -> Vec<f64> {
    columns
        .iter()
        .map(|column| data.metric(column).unwrap_or(0.0))
        .collect()
}

/// Raw metrics for a standalone prediction request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionInput {
    pub environment_risk_score: f64,
    pub social_risk_score: f64,
    pub governance_risk_score: f64,
    pub controversy_score: f64,
    pub full_time_employees: f64,
}

impl PredictionInput {
    /// Scores must lie in 0..=100 and employee counts must be non-negative.
    pub fn validate(&self) -> Result<(), String> {
        let scores = [
            ("environment_risk_score", self.environment_risk_score),
            ("social_risk_score", self.social_risk_score),
            ("governance_risk_score", self.governance_risk_score),
            ("controversy_score", self.controversy_score),
        ];

        for (field, value) in scores {
            if !value.is_finite() || !(0.0..=MAX_SCORE).contains(&value) {
                return Err(format!(
                    "{} must be between 0 and {}, got {}",
                    field, MAX_SCORE, value
                ));
            }
        }

        if !self.full_time_employees.is_finite() || self.full_time_employees < 0.0 {
            return Err(format!(
                "full_time_employees must be non-negative, got {}",
                self.full_time_employees
            ));
        }

        Ok(())
    }

    pub fn to_company_data(&self) -> CompanyData {
        CompanyData {
            environment_risk_score: Some(self.environment_risk_score),
            social_risk_score: Some(self.social_risk_score),
            governance_risk_score: Some(self.governance_risk_score),
            controversy_score: Some(self.controversy_score),
            full_time_employees: Some(self.full_time_employees),
            ..Default::default()
        }
    }
}
