//! Values produced by pipeline stages
//!
//! A `StageResult` owns everything it reports and serializes as one flat JSON
//! object: the stage identity, a summary, and the stage-specific signals.

use crate::news::EsgTheme;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageName {
    NewsAnalysis,
    ModelInterpretation,
    Synthesis,
}

impl StageName {
    pub const ORDER: [StageName; 3] = [
        StageName::NewsAnalysis,
        StageName::ModelInterpretation,
        StageName::Synthesis,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StageName::NewsAnalysis => "news_analysis",
            StageName::ModelInterpretation => "model_interpretation",
            StageName::Synthesis => "synthesis",
        }
    }

    /// Display name of the agent behind the stage
    pub fn agent_name(self) -> &'static str {
        match self {
            StageName::NewsAnalysis => "ESG News Analyst",
            StageName::ModelInterpretation => "Model Explainer",
            StageName::Synthesis => "ESG Insight Orchestrator",
        }
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Mixed,
    Neutral,
}

impl Sentiment {
    pub fn as_str(self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Mixed => "mixed",
            Sentiment::Neutral => "neutral",
        }
    }

    /// Sentiment the news should show if it agrees with a risk label
    pub fn expected_for_risk(risk_level: &str) -> Sentiment {
        match risk_level {
            "Low" => Sentiment::Positive,
            "Medium" => Sentiment::Mixed,
            "High" => Sentiment::Negative,
            _ => Sentiment::Neutral,
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThemeSummary {
    pub theme: EsgTheme,
    pub count: usize,
    /// Up to two matching titles, in input order
    pub examples: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Impact {
    High,
    Medium,
    Low,
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Impact::High => "High",
            Impact::Medium => "Medium",
            Impact::Low => "Low",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyFactor {
    pub feature: String,
    pub value: f64,
    pub impact: Impact,
}

/// Where the interpretation's risk label came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpretationSource {
    Model,
    Baseline,
    Unavailable,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Strong,
    Partial,
    Divergent,
}

impl Alignment {
    pub fn as_str(self) -> &'static str {
        match self {
            Alignment::Strong => "Strong alignment",
            Alignment::Partial => "Partial alignment",
            Alignment::Divergent => "Divergent signals",
        }
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Alignment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskAssessment {
    Critical,
    Elevated,
    Uncertain,
    Moderate,
}

impl RiskAssessment {
    pub fn as_str(self) -> &'static str {
        match self {
            RiskAssessment::Critical => "Critical: High risk confirmed by both model and news",
            RiskAssessment::Elevated => "Elevated: Significant risk indicators present",
            RiskAssessment::Uncertain => "Uncertain: Mixed signals require further investigation",
            RiskAssessment::Moderate => "Moderate: Standard monitoring recommended",
        }
    }
}

impl fmt::Display for RiskAssessment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RiskAssessment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsSignals {
    pub sentiment: Sentiment,
    pub key_themes: Vec<ThemeSummary>,
    pub risk_indicators: Vec<String>,
    pub total_articles: usize,
    pub controversy_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterpretationSignals {
    pub risk_level: String,
    pub confidence: f64,
    /// Present only when the model actually ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probabilities: Option<BTreeMap<String, f64>>,
    pub explanation: String,
    pub key_factors: Vec<KeyFactor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_accuracy: Option<f64>,
    pub source: InterpretationSource,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SynthesisSignals {
    pub news_model_alignment: Alignment,
    pub recommendations: Vec<String>,
    pub overall_risk_assessment: RiskAssessment,
    pub synthesis: String,
    /// Set on the LLM path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub powered_by: Option<String>,
    /// Set on the rule-based path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StageSignals {
    News(NewsSignals),
    Interpretation(InterpretationSignals),
    Synthesis(SynthesisSignals),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageResult {
    pub stage_name: StageName,
    pub agent: &'static str,
    pub summary: String,
    #[serde(flatten)]
    pub signal_fields: StageSignals,
}

impl StageResult {
    pub fn news(summary: impl Into<String>, signals: NewsSignals) -> Self {
        Self::build(StageName::NewsAnalysis, summary, StageSignals::News(signals))
    }

    pub fn interpretation(summary: impl Into<String>, signals: InterpretationSignals) -> Self {
        Self::build(
            StageName::ModelInterpretation,
            summary,
            StageSignals::Interpretation(signals),
        )
    }

    pub fn synthesis(summary: impl Into<String>, signals: SynthesisSignals) -> Self {
        Self::build(StageName::Synthesis, summary, StageSignals::Synthesis(signals))
    }

    fn build(stage_name: StageName, summary: impl Into<String>, signal_fields: StageSignals) -> Self {
        Self {
            stage_name,
            agent: stage_name.agent_name(),
            summary: summary.into(),
            signal_fields,
        }
    }

    pub fn as_news(&self) -> Option<&NewsSignals> {
        match &self.signal_fields {
            StageSignals::News(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_interpretation(&self) -> Option<&InterpretationSignals> {
        match &self.signal_fields {
            StageSignals::Interpretation(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_synthesis(&self) -> Option<&SynthesisSignals> {
        match &self.signal_fields {
            StageSignals::Synthesis(s) => Some(s),
            _ => None,
        }
    }
}
