//! The three-stage ESG analysis pipeline

pub mod context;
pub mod orchestrator;
pub mod report;
pub mod stage;
pub mod stages;

pub use context::{AnalysisContext, ModelHandle, PipelineState};
pub use orchestrator::PipelineOrchestrator;
pub use report::{AgentOutputs, FinalReport};
pub use stage::{
    Alignment, Impact, InterpretationSignals, InterpretationSource, KeyFactor, NewsSignals,
    RiskAssessment, Sentiment, StageName, StageResult, StageSignals, SynthesisSignals,
    ThemeSummary,
};
pub use stages::{ModelInterpretationStage, NewsAnalysisStage, SynthesisInput, SynthesisStage};
