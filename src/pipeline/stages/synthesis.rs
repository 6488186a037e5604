use crate::error::BackendError;
use crate::llm::{ChatMessage, LLMClient, LLMRequest};
use crate::pipeline::stage::{
    Alignment, InterpretationSignals, NewsSignals, RiskAssessment, Sentiment, StageResult,
    SynthesisSignals,
};
use crate::util::RetryPolicy;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const SYSTEM_PROMPT: &str =
    "You are synthesizing multi-agent ESG analysis into actionable recommendations.";
const TEMPERATURE: f32 = 0.4;
const MAX_TOKENS: u32 = 400;
const MAX_TEMPLATE_THEMES: usize = 3;

pub const NOTE_NOT_CONFIGURED: &str = "Using rule-based synthesis (LLM not configured)";
pub const NOTE_REQUEST_FAILED: &str = "Using rule-based synthesis (LLM request failed)";

/// What the synthesis stage reads from the earlier stages
#[derive(Debug, Clone, Copy)]
pub struct SynthesisInput<'a> {
    pub company_name: &'a str,
    pub news_summary: &'a str,
    pub news: &'a NewsSignals,
    pub interpretation: &'a InterpretationSignals,
}

/// Reconciles news sentiment with the risk label and writes the narrative.
/// The rule-based fields are always computed; only the narrative text comes
/// from the LLM when one is configured and answers.
#[derive(Clone)]
pub struct SynthesisStage {
    llm: Option<Arc<dyn LLMClient>>,
    retry: RetryPolicy,
}

impl SynthesisStage {
    pub fn new(llm: Option<Arc<dyn LLMClient>>) -> Self {
        Self {
            llm,
            retry: RetryPolicy::single_retry(Duration::from_millis(500)),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn has_llm(&self) -> bool {
        self.llm.is_some()
    }

    pub async fn execute(&self, input: SynthesisInput<'_>) -> StageResult {
        let sentiment = input.news.sentiment;
        let risk = input.interpretation.risk_level.as_str();

        let alignment = check_alignment(sentiment, risk);
        let recommendations =
            recommendations(sentiment, risk, &input.news.risk_indicators, alignment);
        let assessment = assess_overall_risk(sentiment, risk, alignment);

        let (synthesis, powered_by, note) = match &self.llm {
            Some(llm) => match self.ask_llm(llm.as_ref(), &input).await {
                Ok(text) => (text, Some(llm.describe()), None),
                Err(e) => {
                    warn!(
                        company = input.company_name,
                        llm = llm.name(),
                        error = %e,
                        "LLM synthesis failed, using rule-based narrative"
                    );
                    (
                        template_narrative(&input, alignment),
                        None,
                        Some(NOTE_REQUEST_FAILED.to_string()),
                    )
                }
            },
            None => (
                template_narrative(&input, alignment),
                None,
                Some(NOTE_NOT_CONFIGURED.to_string()),
            ),
        };

        debug!(
            company = input.company_name,
            alignment = %alignment,
            assessment = %assessment,
            llm = powered_by.is_some(),
            "Synthesis complete"
        );

        StageResult::synthesis(
            format!("{} ({})", assessment, alignment),
            SynthesisSignals {
                news_model_alignment: alignment,
                recommendations,
                overall_risk_assessment: assessment,
                synthesis,
                powered_by,
                note,
            },
        )
    }

    async fn ask_llm(
        &self,
        llm: &dyn LLMClient,
        input: &SynthesisInput<'_>,
    ) -> Result<String, BackendError> {
        let prompt = build_prompt(input);

        self.retry
            .run_if(
                "llm_synthesis",
                |attempt| {
                    let request = LLMRequest::new(vec![
                        ChatMessage::system(SYSTEM_PROMPT),
                        ChatMessage::user(prompt.clone()),
                    ])
                    .with_temperature(TEMPERATURE)
                    .with_max_tokens(MAX_TOKENS);

                    async move {
                        let response = llm.chat(request).await?;
                        if response.is_blank() {
                            return Err(BackendError::InvalidResponse {
                                message: "empty completion".to_string(),
                                raw_response: None,
                            });
                        }
                        info!(
                            llm = llm.name(),
                            attempt,
                            response_ms = response.response_time.as_millis() as u64,
                            "LLM synthesis received"
                        );
                        Ok(response.content.trim().to_string())
                    }
                },
                |_| true,
            )
            .await
    }
}

impl std::fmt::Debug for SynthesisStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SynthesisStage")
            .field("llm", &self.llm.as_ref().map(|l| l.describe()))
            .field("retry", &self.retry)
            .finish()
    }
}

pub fn check_alignment(sentiment: Sentiment, risk_level: &str) -> Alignment {
    if sentiment == Sentiment::expected_for_risk(risk_level) {
        Alignment::Strong
    } else if sentiment == Sentiment::Mixed {
        Alignment::Partial
    } else {
        Alignment::Divergent
    }
}

/// Rules are additive; the maintenance pair only appears when nothing else fired.
pub fn recommendations(
    sentiment: Sentiment,
    risk_level: &str,
    risk_indicators: &[String],
    alignment: Alignment,
) -> Vec<String> {
    let mut recs = Vec::new();

    if risk_level == "High" || sentiment == Sentiment::Negative {
        recs.push("Conduct detailed due diligence on recent controversies".to_string());
        recs.push("Monitor regulatory compliance status".to_string());
    }

    if alignment == Alignment::Divergent {
        recs.push("Investigate discrepancy between news sentiment and model prediction".to_string());
        recs.push("Review recent events not captured in training data".to_string());
    }

    if !risk_indicators.is_empty() {
        recs.push(format!(
            "Address {} identified risk indicators immediately",
            risk_indicators.len()
        ));
    }

    if recs.is_empty() {
        recs.push("Maintain current ESG monitoring practices".to_string());
        recs.push("Continue tracking sustainability metrics quarterly".to_string());
    }

    recs
}

pub fn assess_overall_risk(
    sentiment: Sentiment,
    risk_level: &str,
    alignment: Alignment,
) -> RiskAssessment {
    let negative = sentiment == Sentiment::Negative;
    let high = risk_level == "High";

    if negative && high {
        RiskAssessment::Critical
    } else if negative || high {
        RiskAssessment::Elevated
    } else if alignment == Alignment::Divergent {
        RiskAssessment::Uncertain
    } else {
        RiskAssessment::Moderate
    }
}

fn build_prompt(input: &SynthesisInput<'_>) -> String {
    format!(
        "Company: {}\n\n\
         News Analysis:\n{}\n\n\
         Model Prediction:\n\
         - Risk Level: {}\n\
         - Confidence: {:.2}%\n\n\
         Synthesize these insights and provide:\n\
         1. Overall ESG risk assessment\n\
         2. Key action items for stakeholders\n\
         3. Areas of concern or opportunity\n",
        input.company_name,
        input.news_summary,
        input.interpretation.risk_level,
        input.interpretation.confidence * 100.0
    )
}

/// Deterministic narrative used whenever the LLM does not answer
pub fn template_narrative(input: &SynthesisInput<'_>, alignment: Alignment) -> String {
    let mut text = format!("**{} ESG Analysis Summary:**\n\n", input.company_name);
    text.push_str(&format!(
        "Model Assessment: {} risk ({:.1}% confidence)\n",
        input.interpretation.risk_level,
        input.interpretation.confidence * 100.0
    ));
    text.push_str(&format!(
        "News Sentiment: {} based on {} articles\n",
        input.news.sentiment, input.news.total_articles
    ));
    text.push_str(&format!("News-Model Alignment: {}\n\n", alignment));

    if !input.news.key_themes.is_empty() {
        text.push_str("Key ESG Themes:\n");
        for theme in input.news.key_themes.iter().take(MAX_TEMPLATE_THEMES) {
            text.push_str(&format!("- {}: {} mentions\n", theme.theme, theme.count));
        }
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{MockLLMClient, MockResponse};
    use crate::news::EsgTheme;
    use crate::pipeline::stage::{InterpretationSource, ThemeSummary};

    fn news(sentiment: Sentiment, indicators: usize) -> NewsSignals {
        NewsSignals {
            sentiment,
            key_themes: vec![ThemeSummary {
                theme: EsgTheme::Environmental,
                count: 2,
                examples: vec!["A".to_string(), "B".to_string()],
            }],
            risk_indicators: (0..indicators)
                .map(|i| format!("Controversy detected: {}", i))
                .collect(),
            total_articles: 4,
            controversy_count: indicators,
        }
    }

    fn interpretation(risk: &str, confidence: f64) -> InterpretationSignals {
        InterpretationSignals {
            risk_level: risk.to_string(),
            confidence,
            probabilities: None,
            explanation: String::new(),
            key_factors: vec![],
            model_accuracy: None,
            source: InterpretationSource::Model,
        }
    }

    fn fast_stage(llm: Option<Arc<dyn LLMClient>>) -> SynthesisStage {
        SynthesisStage::new(llm).with_retry_policy(RetryPolicy::single_retry(Duration::from_millis(1)))
    }

    #[test]
    fn test_alignment_rules() {
        assert_eq!(check_alignment(Sentiment::Positive, "Low"), Alignment::Strong);
        assert_eq!(check_alignment(Sentiment::Mixed, "Medium"), Alignment::Strong);
        assert_eq!(check_alignment(Sentiment::Negative, "High"), Alignment::Strong);
        assert_eq!(check_alignment(Sentiment::Neutral, "Unknown"), Alignment::Strong);
        assert_eq!(check_alignment(Sentiment::Mixed, "High"), Alignment::Partial);
        assert_eq!(check_alignment(Sentiment::Positive, "High"), Alignment::Divergent);
        assert_eq!(check_alignment(Sentiment::Neutral, "Low"), Alignment::Divergent);
    }

    #[test]
    fn test_overall_assessment() {
        assert_eq!(
            assess_overall_risk(Sentiment::Negative, "High", Alignment::Strong),
            RiskAssessment::Critical
        );
        assert_eq!(
            assess_overall_risk(Sentiment::Negative, "Low", Alignment::Divergent),
            RiskAssessment::Elevated
        );
        assert_eq!(
            assess_overall_risk(Sentiment::Positive, "High", Alignment::Divergent),
            RiskAssessment::Elevated
        );
        assert_eq!(
            assess_overall_risk(Sentiment::Neutral, "Low", Alignment::Divergent),
            RiskAssessment::Uncertain
        );
        assert_eq!(
            assess_overall_risk(Sentiment::Mixed, "Medium", Alignment::Strong),
            RiskAssessment::Moderate
        );
    }

    #[test]
    fn test_recommendations_are_additive() {
        let recs = recommendations(
            Sentiment::Positive,
            "High",
            &["x".to_string(), "y".to_string()],
            Alignment::Divergent,
        );
        assert_eq!(
            recs,
            vec![
                "Conduct detailed due diligence on recent controversies",
                "Monitor regulatory compliance status",
                "Investigate discrepancy between news sentiment and model prediction",
                "Review recent events not captured in training data",
                "Address 2 identified risk indicators immediately",
            ]
        );

        let quiet = recommendations(Sentiment::Positive, "Low", &[], Alignment::Strong);
        assert_eq!(
            quiet,
            vec![
                "Maintain current ESG monitoring practices",
                "Continue tracking sustainability metrics quarterly",
            ]
        );
    }

    #[tokio::test]
    async fn test_fallback_without_llm() {
        let news = news(Sentiment::Mixed, 1);
        let interp = interpretation("Medium", 0.72);
        let result = fast_stage(None)
            .execute(SynthesisInput {
                company_name: "Acme",
                news_summary: "summary",
                news: &news,
                interpretation: &interp,
            })
            .await;
        let s = result.as_synthesis().unwrap();

        assert_eq!(s.note.as_deref(), Some(NOTE_NOT_CONFIGURED));
        assert!(s.powered_by.is_none());
        assert_eq!(
            s.synthesis,
            "**Acme ESG Analysis Summary:**\n\n\
             Model Assessment: Medium risk (72.0% confidence)\n\
             News Sentiment: mixed based on 4 articles\n\
             News-Model Alignment: Strong alignment\n\n\
             Key ESG Themes:\n\
             - Environmental: 2 mentions\n"
        );
    }

    #[tokio::test]
    async fn test_llm_answer_is_used() {
        let mock = Arc::new(MockLLMClient::with_name("Groq"));
        mock.add_response(MockResponse::text("  Narrative from the model.  "));

        let news = news(Sentiment::Negative, 3);
        let interp = interpretation("High", 0.9);
        let result = fast_stage(Some(mock.clone()))
            .execute(SynthesisInput {
                company_name: "Acme",
                news_summary: "Analyzed 4 ESG-related articles for Acme.",
                news: &news,
                interpretation: &interp,
            })
            .await;
        let s = result.as_synthesis().unwrap();

        assert_eq!(s.synthesis, "Narrative from the model.");
        assert_eq!(s.powered_by.as_deref(), Some("Groq (mock-model)"));
        assert!(s.note.is_none());
        assert_eq!(s.overall_risk_assessment, RiskAssessment::Critical);

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0][0].content, SYSTEM_PROMPT);
        assert!(requests[0][1].content.contains("Risk Level: High"));
        assert!(requests[0][1].content.contains("Confidence: 90.00%"));
    }

    #[tokio::test]
    async fn test_llm_retried_once_then_falls_back() {
        let mock = Arc::new(MockLLMClient::new());
        mock.add_responses(vec![
            MockResponse::error(BackendError::TimeoutError { seconds: 30 }),
            MockResponse::text("   "),
            MockResponse::text("never reached"),
        ]);

        let news = news(Sentiment::Positive, 0);
        let interp = interpretation("Low", 0.95);
        let result = fast_stage(Some(mock.clone()))
            .execute(SynthesisInput {
                company_name: "Acme",
                news_summary: "s",
                news: &news,
                interpretation: &interp,
            })
            .await;
        let s = result.as_synthesis().unwrap();

        assert_eq!(mock.call_count(), 2);
        assert_eq!(s.note.as_deref(), Some(NOTE_REQUEST_FAILED));
        assert!(s.synthesis.starts_with("**Acme ESG Analysis Summary:**"));
    }

    #[tokio::test]
    async fn test_llm_recovers_on_retry() {
        let mock = Arc::new(MockLLMClient::new());
        mock.add_responses(vec![
            MockResponse::error(BackendError::ApiError {
                message: "overloaded".to_string(),
                status_code: None,
            }),
            MockResponse::text("Second try"),
        ]);

        let news = news(Sentiment::Positive, 0);
        let interp = interpretation("Low", 0.95);
        let result = fast_stage(Some(mock.clone()))
            .execute(SynthesisInput {
                company_name: "Acme",
                news_summary: "s",
                news: &news,
                interpretation: &interp,
            })
            .await;

        assert_eq!(result.as_synthesis().unwrap().synthesis, "Second try");
        assert_eq!(mock.call_count(), 2);
    }
}
