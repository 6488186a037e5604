use crate::news::{is_controversial, EsgTheme, NewsArticle};
use crate::pipeline::stage::{NewsSignals, Sentiment, StageResult, ThemeSummary};
use tracing::debug;

const MAX_EXAMPLES: usize = 2;
const MAX_RISK_INDICATORS: usize = 3;
/// More controversial articles than this turn the sentiment negative
const NEGATIVE_THRESHOLD: usize = 2;

pub const NO_NEWS_SUMMARY: &str = "No recent news available for analysis.";

/// Buckets articles into ESG themes by keyword and derives a sentiment from
/// the number of controversy hits. Pure; never fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct NewsAnalysisStage;

impl NewsAnalysisStage {
    pub fn execute(&self, company_name: &str, news_items: &[NewsArticle]) -> StageResult {
        if news_items.is_empty() {
            return StageResult::news(
                NO_NEWS_SUMMARY,
                NewsSignals {
                    sentiment: Sentiment::Neutral,
                    key_themes: Vec::new(),
                    risk_indicators: Vec::new(),
                    total_articles: 0,
                    controversy_count: 0,
                },
            );
        }

        let mut themes: Vec<ThemeSummary> = EsgTheme::ALL
            .iter()
            .map(|&theme| ThemeSummary {
                theme,
                count: 0,
                examples: Vec::new(),
            })
            .collect();
        let mut risk_indicators = Vec::new();
        let mut controversy_count = 0;

        for article in news_items {
            let text = article.description_lower();

            for summary in themes.iter_mut() {
                if summary.theme.matches(&text) {
                    summary.count += 1;
                    if summary.examples.len() < MAX_EXAMPLES {
                        summary.examples.push(article.title.clone());
                    }
                }
            }

            if is_controversial(&text) {
                controversy_count += 1;
                if risk_indicators.len() < MAX_RISK_INDICATORS {
                    risk_indicators.push(format!("Controversy detected: {}", article.title));
                }
            }
        }

        themes.retain(|t| t.count > 0);

        let sentiment = match controversy_count {
            0 => Sentiment::Positive,
            n if n > NEGATIVE_THRESHOLD => Sentiment::Negative,
            _ => Sentiment::Mixed,
        };

        let dominant = themes
            .first()
            .map(|t| t.theme.as_str())
            .unwrap_or("None");
        let summary = format!(
            "Analyzed {} ESG-related articles for {}. Dominant theme: {}. Sentiment: {}.",
            news_items.len(),
            company_name,
            dominant,
            sentiment
        );

        debug!(
            company = company_name,
            articles = news_items.len(),
            controversies = controversy_count,
            sentiment = %sentiment,
            "News analysis complete"
        );

        StageResult::news(
            summary,
            NewsSignals {
                sentiment,
                key_themes: themes,
                risk_indicators,
                total_articles: news_items.len(),
                controversy_count,
            },
        )
    }
}
