pub mod model_interpretation;
pub mod news_analysis;
pub mod synthesis;

pub use model_interpretation::{ModelInterpretationStage, UNKNOWN_RISK};
pub use news_analysis::{NewsAnalysisStage, NO_NEWS_SUMMARY};
pub use synthesis::{SynthesisInput, SynthesisStage, NOTE_NOT_CONFIGURED, NOTE_REQUEST_FAILED};
