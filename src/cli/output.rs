//! Output formatting for multiple formats
//!
//! JSON and YAML are straight serde renderings of the result types; the human
//! format is a boxed text report meant for a terminal.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::EsgConfig;
use crate::pipeline::{FinalReport, StageResult};
use crate::service::{BatchOutcome, CompanyAnalysis, CompanyNews, PredictionOutput};

const RULE: &str = "\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}";
const BRANCH: &str = "\u{251C}\u{2500}";
const LAST_BRANCH: &str = "\u{2514}\u{2500}";

/// Output format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    Yaml,
    /// Human-readable formatted text
    Human,
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format_analysis(&self, analysis: &CompanyAnalysis) -> Result<String> {
        match self.format {
            OutputFormat::Human => Ok(human_analysis(analysis)),
            _ => self.serialize(analysis, "analysis"),
        }
    }

    pub fn format_batch(&self, outcome: &BatchOutcome) -> Result<String> {
        match self.format {
            OutputFormat::Human => {
                let mut output = String::new();
                for analysis in &outcome.results {
                    output.push_str(&human_analysis(analysis));
                    output.push('\n');
                }
                if !outcome.failures.is_empty() {
                    output.push_str("Failures:\n");
                    for (i, failure) in outcome.failures.iter().enumerate() {
                        let connector = branch(i, outcome.failures.len());
                        output.push_str(&format!(
                            "{} {}: {}\n",
                            connector, failure.symbol, failure.error
                        ));
                    }
                }
                output.push_str(&format!(
                    "\n{} succeeded, {} failed\n",
                    outcome.results.len(),
                    outcome.failures.len()
                ));
                Ok(output)
            }
            _ => self.serialize(outcome, "batch outcome"),
        }
    }

    pub fn format_prediction(&self, prediction: &PredictionOutput) -> Result<String> {
        match self.format {
            OutputFormat::Human => {
                let mut output = String::new();
                output.push_str("ESG Risk Prediction\n");
                output.push_str(RULE);
                output.push_str("\n\n");
                output.push_str(&format!("Risk Level:  {}\n", prediction.risk_level));
                output.push_str(&format!(
                    "Confidence:  {}\n\n",
                    confidence_bar(prediction.confidence)
                ));
                output.push_str("Probabilities:\n");
                let total = prediction.probabilities.len();
                for (i, (label, p)) in prediction.probabilities.iter().enumerate() {
                    output.push_str(&format!(
                        "{} {:<8} {:.1}%\n",
                        branch(i, total),
                        label,
                        p * 100.0
                    ));
                }
                Ok(output)
            }
            _ => self.serialize(prediction, "prediction"),
        }
    }

    pub fn format_news(&self, news: &CompanyNews) -> Result<String> {
        match self.format {
            OutputFormat::Human => {
                let s = &news.signals;
                let mut output = String::new();
                output.push_str(&format!("{} ({}) News\n", news.company, news.symbol));
                output.push_str(RULE);
                output.push_str("\n\n");
                output.push_str(&format!("Articles:       {}\n", s.total_articles));
                output.push_str(&format!("Dominant Theme: {}\n\n", s.dominant_theme));
                output.push_str("Mentions:\n");
                output.push_str(&format!(
                    "{} Environmental: {}\n",
                    BRANCH, s.environmental_mentions
                ));
                output.push_str(&format!("{} Social:        {}\n", BRANCH, s.social_mentions));
                output.push_str(&format!(
                    "{} Governance:    {}\n",
                    LAST_BRANCH, s.governance_mentions
                ));
                if !s.recent_headlines.is_empty() {
                    output.push_str("\nRecent Headlines:\n");
                    for (i, headline) in s.recent_headlines.iter().enumerate() {
                        output.push_str(&format!(
                            "{} {}\n",
                            branch(i, s.recent_headlines.len()),
                            headline
                        ));
                    }
                }
                Ok(output)
            }
            _ => self.serialize(news, "company news"),
        }
    }

    pub fn format_health(&self, results: &BTreeMap<String, HealthStatus>) -> Result<String> {
        match self.format {
            OutputFormat::Human => {
                let mut output = String::new();
                output.push_str("esgpulse Health Status\n");
                output.push_str(RULE);
                output.push_str("\n\n");

                for (component, status) in results {
                    let symbol = if status.available {
                        "\u{2713}"
                    } else {
                        "\u{2717}"
                    };
                    output.push_str(&format!("{} {}\n", symbol, component));
                    output.push_str(&format!("  Message: {}\n", status.message));
                    if let Some(ref details) = status.details {
                        output.push_str(&format!("  Details: {}\n", details));
                    }
                    output.push('\n');
                }
                Ok(output)
            }
            _ => self.serialize(results, "health status"),
        }
    }

    pub fn format_config(&self, config: &EsgConfig) -> Result<String> {
        match self.format {
            OutputFormat::Human => Ok(config.to_string()),
            _ => self.serialize(&config.to_display_map(), "config"),
        }
    }

    fn serialize<T: Serialize + ?Sized>(&self, value: &T, what: &str) -> Result<String> {
        match self.format {
            OutputFormat::Yaml => serde_yaml::to_string(value)
                .with_context(|| format!("Failed to serialize {} to YAML", what)),
            _ => serde_json::to_string_pretty(value)
                .with_context(|| format!("Failed to serialize {} to JSON", what)),
        }
    }
}

fn branch(index: usize, len: usize) -> &'static str {
    if index + 1 == len {
        LAST_BRANCH
    } else {
        BRANCH
    }
}

fn confidence_bar(confidence: f64) -> String {
    let confidence = confidence.clamp(0.0, 1.0);
    let filled = (confidence * 10.0).round() as usize;
    format!(
        "{}{} {:.1}%",
        "\u{2588}".repeat(filled),
        "\u{2591}".repeat(10 - filled),
        confidence * 100.0
    )
}

fn human_analysis(analysis: &CompanyAnalysis) -> String {
    let report = &analysis.analysis;
    let mut output = String::new();

    let symbol = analysis.company.symbol.as_deref().unwrap_or("?");
    output.push_str(&format!("ESG Analysis: {} ({})\n", report.company, symbol));
    output.push_str(RULE);
    output.push_str("\n\n");

    if let Some(sector) = analysis.company.sector.as_deref() {
        output.push_str(&format!("Sector:     {}\n", sector));
    }
    output.push_str(&format!("News:       {} articles\n", analysis.news_count));
    output.push_str(&format!(
        "Generated:  {}\n\n",
        report.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    human_report(report, &mut output);
    output
}

fn human_report(report: &FinalReport, output: &mut String) {
    let agents = &report.agents;

    if let Some(news) = agents.news_analysis.as_news() {
        stage_header(&agents.news_analysis, output);
        output.push_str(&format!("{} Sentiment:   {}\n", BRANCH, news.sentiment));
        output.push_str(&format!(
            "{} Controversy: {} article(s)\n",
            BRANCH, news.controversy_count
        ));
        let themes: Vec<String> = news
            .key_themes
            .iter()
            .map(|t| format!("{} ({})", t.theme, t.count))
            .collect();
        output.push_str(&format!(
            "{} Themes:      {}\n\n",
            LAST_BRANCH,
            if themes.is_empty() {
                "none".to_string()
            } else {
                themes.join(", ")
            }
        ));
    }

    if let Some(interp) = agents.model_interpretation.as_interpretation() {
        stage_header(&agents.model_interpretation, output);
        output.push_str(&format!("{} Risk Level:  {}\n", BRANCH, interp.risk_level));
        output.push_str(&format!(
            "{} Confidence:  {}\n",
            BRANCH,
            confidence_bar(interp.confidence)
        ));
        for factor in &interp.key_factors {
            output.push_str(&format!(
                "{} {}: {} ({} impact)\n",
                BRANCH, factor.feature, factor.value, factor.impact
            ));
        }
        output.push_str(&format!("{} {}\n\n", LAST_BRANCH, interp.explanation.trim()));
    }

    if let Some(synth) = agents.synthesis.as_synthesis() {
        stage_header(&agents.synthesis, output);
        output.push_str(&format!(
            "{} Alignment:   {}\n",
            BRANCH, synth.news_model_alignment
        ));
        output.push_str(&format!(
            "{} Assessment:  {}\n",
            BRANCH, synth.overall_risk_assessment
        ));
        match (&synth.powered_by, &synth.note) {
            (Some(llm), _) => output.push_str(&format!("{} Powered by:  {}\n", BRANCH, llm)),
            (None, Some(note)) => output.push_str(&format!("{} Note:        {}\n", BRANCH, note)),
            (None, None) => {}
        }
        output.push_str(&format!("{} Recommendations:\n", LAST_BRANCH));
        for rec in &synth.recommendations {
            output.push_str(&format!("   - {}\n", rec));
        }
        output.push('\n');
        output.push_str(synth.synthesis.trim_end());
        output.push('\n');
    }
}

fn stage_header(result: &StageResult, output: &mut String) {
    output.push_str(&format!("{}:\n", result.agent));
    output.push_str(&format!("  {}\n", result.summary));
}

/// Health status for one component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub available: bool,
    pub message: String,
    pub details: Option<String>,
}

impl HealthStatus {
    pub fn available(message: impl Into<String>) -> Self {
        Self {
            available: true,
            message: message.into(),
            details: None,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            available: false,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::company::CompanyData;
    use crate::news::NewsArticle;
    use crate::pipeline::{ModelHandle, PipelineOrchestrator};

    async fn analysis() -> CompanyAnalysis {
        let company = CompanyData {
            sector: Some("Energy".to_string()),
            environment_risk_score: Some(14.0),
            ..CompanyData::new("XOM", "Exxon Mobil")
        };
        let news = vec![NewsArticle::new("Spill", "Emissions lawsuit filed")];
        let report = PipelineOrchestrator::new(None)
            .run(
                "Exxon Mobil",
                company.clone(),
                news,
                ModelHandle::baseline(Some("High".to_string())),
            )
            .await
            .unwrap();
        CompanyAnalysis {
            company,
            news_count: 1,
            analysis: report,
        }
    }

    #[tokio::test]
    async fn test_json_format() {
        let output = OutputFormatter::new(OutputFormat::Json)
            .format_analysis(&analysis().await)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["analysis"]["company"], "Exxon Mobil");
        assert_eq!(value["news_count"], 1);
    }

    #[tokio::test]
    async fn test_yaml_format() {
        let output = OutputFormatter::new(OutputFormat::Yaml)
            .format_analysis(&analysis().await)
            .unwrap();
        assert!(output.contains("company:"));
        assert!(output.contains("conversation_log:"));
    }

    #[tokio::test]
    async fn test_human_format() {
        let output = OutputFormatter::new(OutputFormat::Human)
            .format_analysis(&analysis().await)
            .unwrap();
        assert!(output.contains("ESG Analysis: Exxon Mobil (XOM)"));
        assert!(output.contains("ESG News Analyst:"));
        assert!(output.contains("Risk Level:  High"));
        assert!(output.contains("Using rule-based synthesis (LLM not configured)"));
        assert!(output.contains("**Exxon Mobil ESG Analysis Summary:**"));
    }

    #[test]
    fn test_confidence_bar() {
        assert_eq!(confidence_bar(0.0), format!("{} 0.0%", "\u{2591}".repeat(10)));
        assert!(confidence_bar(0.87).starts_with(&"\u{2588}".repeat(9)));
        assert!(confidence_bar(1.5).ends_with("100.0%"));
    }

    #[test]
    fn test_prediction_human() {
        let prediction = PredictionOutput {
            risk_level: "Medium".to_string(),
            confidence: 0.62,
            probabilities: BTreeMap::from([
                ("High".to_string(), 0.2),
                ("Low".to_string(), 0.18),
                ("Medium".to_string(), 0.62),
            ]),
        };
        let output = OutputFormatter::new(OutputFormat::Human)
            .format_prediction(&prediction)
            .unwrap();
        assert!(output.contains("Risk Level:  Medium"));
        assert!(output.contains("Medium   62.0%"));
    }

    #[test]
    fn test_health_format_human() {
        let mut results = BTreeMap::new();
        results.insert(
            "Risk model".to_string(),
            HealthStatus::available("Loaded 3 classes"),
        );
        results.insert(
            "News API".to_string(),
            HealthStatus::unavailable("API key not configured").with_details("Set NEWS_API_KEY"),
        );

        let output = OutputFormatter::new(OutputFormat::Human)
            .format_health(&results)
            .unwrap();
        assert!(output.contains("\u{2713} Risk model"));
        assert!(output.contains("\u{2717} News API"));
        assert!(output.contains("Details: Set NEWS_API_KEY"));
    }
}
