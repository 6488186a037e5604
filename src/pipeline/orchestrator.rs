use super::context::{AnalysisContext, ModelHandle};
use super::report::{AgentOutputs, FinalReport};
use super::stage::{InterpretationSource, StageName, StageResult};
use super::stages::{ModelInterpretationStage, NewsAnalysisStage, SynthesisInput, SynthesisStage};
use crate::company::CompanyData;
use crate::error::PipelineError;
use crate::llm::LLMClient;
use crate::news::NewsArticle;
use crate::progress::{LoggingHandler, ProgressEvent, ProgressHandler};
use crate::util::RetryPolicy;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Runs news analysis, model interpretation and synthesis, in that order,
/// over a fresh context per company. Holds no per-run state, so one
/// orchestrator serves any number of concurrent runs.
#[derive(Clone)]
pub struct PipelineOrchestrator {
    news_stage: NewsAnalysisStage,
    interpretation_stage: ModelInterpretationStage,
    synthesis_stage: SynthesisStage,
    progress_handler: Arc<dyn ProgressHandler>,
}

impl PipelineOrchestrator {
    pub fn new(llm: Option<Arc<dyn LLMClient>>) -> Self {
        Self {
            news_stage: NewsAnalysisStage,
            interpretation_stage: ModelInterpretationStage,
            synthesis_stage: SynthesisStage::new(llm),
            progress_handler: Arc::new(LoggingHandler),
        }
    }

    pub fn with_progress(mut self, handler: Arc<dyn ProgressHandler>) -> Self {
        self.progress_handler = handler;
        self
    }

    pub fn with_llm_retry(mut self, policy: RetryPolicy) -> Self {
        self.synthesis_stage = self.synthesis_stage.with_retry_policy(policy);
        self
    }

    pub fn has_llm(&self) -> bool {
        self.synthesis_stage.has_llm()
    }

    pub async fn run(
        &self,
        company_name: &str,
        company_data: CompanyData,
        news_articles: Vec<NewsArticle>,
        model: ModelHandle,
    ) -> Result<FinalReport, PipelineError> {
        let start = Instant::now();
        let mut ctx = AnalysisContext::new(company_name, company_data, news_articles, model);

        info!(
            company = company_name,
            trace_id = ctx.trace_id(),
            articles = ctx.news_items().len(),
            model_loaded = ctx.model().is_available(),
            "Starting pipeline"
        );
        self.emit(ProgressEvent::Started {
            company: company_name.to_string(),
            trace_id: ctx.trace_id().to_string(),
        });

        let result = self.run_stages(&mut ctx).await;

        match result {
            Ok(()) => {
                ctx.mark_done();
                let agents = into_agents(ctx.into_history())?;

                self.emit(ProgressEvent::Completed {
                    company: company_name.to_string(),
                    total_time: start.elapsed(),
                });
                Ok(FinalReport::new(company_name, agents))
            }
            Err(e) => {
                self.emit(ProgressEvent::Failed {
                    company: company_name.to_string(),
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn run_stages(&self, ctx: &mut AnalysisContext) -> Result<(), PipelineError> {
        let company = ctx.company_name().to_string();

        self.stage_started(&company, StageName::NewsAnalysis);
        let stage_start = Instant::now();
        let news = self.news_stage.execute(&company, ctx.news_items());
        let news_degraded = news.as_news().map_or(true, |s| s.total_articles == 0);
        self.append(ctx, news.clone(), stage_start, news_degraded)?;

        self.stage_started(&company, StageName::ModelInterpretation);
        let stage_start = Instant::now();
        let interpretation =
            self.interpretation_stage
                .execute(&company, ctx.company_data(), ctx.model())?;
        let interpretation_degraded = interpretation
            .as_interpretation()
            .map_or(true, |s| s.source != InterpretationSource::Model);
        self.append(ctx, interpretation.clone(), stage_start, interpretation_degraded)?;

        let (news_signals, interpretation_signals) =
            match (news.as_news(), interpretation.as_interpretation()) {
                (Some(n), Some(i)) => (n, i),
                _ => {
                    return Err(PipelineError::ContractViolation {
                        stage: StageName::Synthesis.as_str(),
                        message: "upstream results carry the wrong signal type".to_string(),
                    })
                }
            };

        self.stage_started(&company, StageName::Synthesis);
        let stage_start = Instant::now();
        let synthesis = self
            .synthesis_stage
            .execute(SynthesisInput {
                company_name: &company,
                news_summary: &news.summary,
                news: news_signals,
                interpretation: interpretation_signals,
            })
            .await;
        let synthesis_degraded = synthesis.as_synthesis().map_or(true, |s| s.note.is_some());
        self.append(ctx, synthesis, stage_start, synthesis_degraded)?;

        debug!(
            company = %company,
            trace_id = ctx.trace_id(),
            stages = ctx.stage_history().len(),
            "All stages recorded"
        );
        Ok(())
    }

    fn append(
        &self,
        ctx: &mut AnalysisContext,
        result: StageResult,
        stage_start: Instant,
        degraded: bool,
    ) -> Result<(), PipelineError> {
        let stage = result.stage_name;
        if !ctx.record(result) {
            return Err(PipelineError::ContractViolation {
                stage: stage.as_str(),
                message: format!("stage ran out of order (state {:?})", ctx.state()),
            });
        }

        self.emit(ProgressEvent::StageComplete {
            company: ctx.company_name().to_string(),
            stage,
            duration: stage_start.elapsed(),
            degraded,
        });
        Ok(())
    }

    fn stage_started(&self, company: &str, stage: StageName) {
        self.emit(ProgressEvent::StageStarted {
            company: company.to_string(),
            stage,
        });
    }

    fn emit(&self, event: ProgressEvent) {
        self.progress_handler.on_progress(&event);
    }
}

fn into_agents(history: Vec<StageResult>) -> Result<AgentOutputs, PipelineError> {
    let count = history.len();
    let [news_analysis, model_interpretation, synthesis]: [StageResult; 3] =
        history
            .try_into()
            .map_err(|_| PipelineError::ContractViolation {
                stage: StageName::Synthesis.as_str(),
                message: format!("expected 3 stage results, found {}", count),
            })?;

    Ok(AgentOutputs {
        news_analysis,
        model_interpretation,
        synthesis,
    })
}

impl std::fmt::Debug for PipelineOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineOrchestrator")
            .field("synthesis_stage", &self.synthesis_stage)
            .finish()
    }
}
