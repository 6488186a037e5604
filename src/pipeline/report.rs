use super::stage::StageResult;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentOutputs {
    pub news_analysis: StageResult,
    pub model_interpretation: StageResult,
    pub synthesis: StageResult,
}

/// Outcome of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalReport {
    pub company: String,
    #[serde(serialize_with = "rfc3339")]
    pub timestamp: DateTime<Utc>,
    pub agents: AgentOutputs,
    /// The same three results, in execution order
    pub conversation_log: Vec<StageResult>,
}

fn rfc3339<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}

impl FinalReport {
    pub fn new(company: impl Into<String>, agents: AgentOutputs) -> Self {
        let conversation_log = vec![
            agents.news_analysis.clone(),
            agents.model_interpretation.clone(),
            agents.synthesis.clone(),
        ];
        Self {
            company: company.into(),
            timestamp: Utc::now(),
            agents,
            conversation_log,
        }
    }
}
