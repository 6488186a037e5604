//! Per-run analysis state

use super::stage::{StageName, StageResult};
use crate::company::CompanyData;
use crate::model::RiskModel;
use crate::news::NewsArticle;
use std::fmt;
use std::sync::Arc;

/// Model-or-baseline input to the interpretation stage
#[derive(Clone)]
pub enum ModelHandle {
    ModelAvailable(Arc<dyn RiskModel>),
    /// No model; the optional stored risk label stands in for a prediction
    ModelUnavailable(Option<String>),
}

impl ModelHandle {
    pub fn baseline(label: Option<String>) -> Self {
        ModelHandle::ModelUnavailable(label.filter(|l| !l.trim().is_empty()))
    }

    pub fn is_available(&self) -> bool {
        matches!(self, ModelHandle::ModelAvailable(_))
    }
}

impl fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelHandle::ModelAvailable(model) => f
                .debug_tuple("ModelAvailable")
                .field(&model.labels())
                .finish(),
            ModelHandle::ModelUnavailable(baseline) => {
                f.debug_tuple("ModelUnavailable").field(baseline).finish()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    NotStarted,
    NewsAnalyzed,
    Interpreted,
    Synthesized,
    Done,
}

impl PipelineState {
    /// Stage that runs next from this state, if any
    pub fn next_stage(self) -> Option<StageName> {
        match self {
            PipelineState::NotStarted => Some(StageName::NewsAnalysis),
            PipelineState::NewsAnalyzed => Some(StageName::ModelInterpretation),
            PipelineState::Interpreted => Some(StageName::Synthesis),
            PipelineState::Synthesized | PipelineState::Done => None,
        }
    }

    fn after(stage: StageName) -> Self {
        match stage {
            StageName::NewsAnalysis => PipelineState::NewsAnalyzed,
            StageName::ModelInterpretation => PipelineState::Interpreted,
            StageName::Synthesis => PipelineState::Synthesized,
        }
    }
}

/// Inputs and history of one company analysis. Created per run by the
/// orchestrator and dropped with it.
#[derive(Debug)]
pub struct AnalysisContext {
    company_name: String,
    company_data: CompanyData,
    news_items: Vec<NewsArticle>,
    model: ModelHandle,
    stage_history: Vec<StageResult>,
    state: PipelineState,
    trace_id: String,
}

impl AnalysisContext {
    pub fn new(
        company_name: impl Into<String>,
        company_data: CompanyData,
        news_items: Vec<NewsArticle>,
        model: ModelHandle,
    ) -> Self {
        Self {
            company_name: company_name.into(),
            company_data,
            news_items,
            model,
            stage_history: Vec::with_capacity(StageName::ORDER.len()),
            state: PipelineState::NotStarted,
            trace_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn company_name(&self) -> &str {
        &self.company_name
    }

    pub fn company_data(&self) -> &CompanyData {
        &self.company_data
    }

    pub fn news_items(&self) -> &[NewsArticle] {
        &self.news_items
    }

    pub fn model(&self) -> &ModelHandle {
        &self.model
    }

    pub fn stage_history(&self) -> &[StageResult] {
        &self.stage_history
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Correlates the log lines of one run
    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    /// Appends the result of the stage that is due next. Returns false and
    /// leaves the history untouched when `result` is out of order.
    pub fn record(&mut self, result: StageResult) -> bool {
        if self.state.next_stage() != Some(result.stage_name) {
            return false;
        }
        self.state = PipelineState::after(result.stage_name);
        self.stage_history.push(result);
        true
    }

    pub fn mark_done(&mut self) {
        if self.state == PipelineState::Synthesized {
            self.state = PipelineState::Done;
        }
    }

    /// Hands back the history, consuming the context
    pub fn into_history(self) -> Vec<StageResult> {
        self.stage_history
    }
}
