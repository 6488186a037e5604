use serde::{Deserialize, Serialize};

/// ESG metrics for one listed company. Every field may be missing; numeric
/// gaps are treated as absent rather than zero until a feature vector is
/// built.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CompanyData {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub full_time_employees: Option<f64>,
    #[serde(default)]
    pub total_esg_risk_score: Option<f64>,
    #[serde(default)]
    pub environment_risk_score: Option<f64>,
    #[serde(default)]
    pub social_risk_score: Option<f64>,
    #[serde(default)]
    pub governance_risk_score: Option<f64>,
    #[serde(default)]
    pub controversy_score: Option<f64>,
    #[serde(default)]
    pub controversy_level: Option<String>,
    /// Stored risk label, used as the baseline when no model is loaded
    #[serde(default)]
    pub esg_risk_level: Option<String>,
}

impl CompanyData {
    pub fn new(symbol: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            symbol: Some(symbol.into()),
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Numeric metric by its snake_case field name
    pub fn metric(&self, name: &str) -> Option<f64> {
        match name {
            "full_time_employees" => self.full_time_employees,
            "total_esg_risk_score" => self.total_esg_risk_score,
            "environment_risk_score" => self.environment_risk_score,
            "social_risk_score" => self.social_risk_score,
            "governance_risk_score" => self.governance_risk_score,
            "controversy_score" => self.controversy_score,
            _ => None,
        }
        .filter(|v| v.is_finite())
    }

    /// Name for prompts and reports: the company name, else the symbol
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .or(self.symbol.as_deref())
            .unwrap_or("Unknown company")
    }
}
