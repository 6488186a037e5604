use super::article::NewsArticle;
use super::keywords::EsgTheme;
use serde::{Deserialize, Serialize};

const MAX_HEADLINES: usize = 5;

/// Mention counts over a set of articles, returned by the company-news
/// endpoint alongside the raw articles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EsgSignals {
    pub total_articles: usize,
    pub environmental_mentions: usize,
    pub social_mentions: usize,
    pub governance_mentions: usize,
    /// Lowercase theme with the most mentions, "none" without articles.
    /// Ties resolve in Environmental, Social, Governance order.
    pub dominant_theme: String,
    pub recent_headlines: Vec<String>,
}

pub fn extract_esg_signals(articles: &[NewsArticle]) -> EsgSignals {
    let descriptions: Vec<String> = articles.iter().map(NewsArticle::description_lower).collect();
    let count = |theme: EsgTheme| descriptions.iter().filter(|d| theme.matches(d)).count();

    let counts: Vec<(EsgTheme, usize)> = EsgTheme::ALL.iter().map(|&t| (t, count(t))).collect();

    let dominant_theme = if articles.is_empty() {
        "none".to_string()
    } else {
        // max_by_key keeps the last maximum, so scan for the first one instead
        let mut best = counts[0];
        for &(theme, n) in &counts[1..] {
            if n > best.1 {
                best = (theme, n);
            }
        }
        best.0.as_str().to_lowercase()
    };

    EsgSignals {
        total_articles: articles.len(),
        environmental_mentions: counts[0].1,
        social_mentions: counts[1].1,
        governance_mentions: counts[2].1,
        dominant_theme,
        recent_headlines: articles
            .iter()
            .take(MAX_HEADLINES)
            .map(|a| a.title.clone())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_articles() {
        let signals = extract_esg_signals(&[]);
        assert_eq!(signals.total_articles, 0);
        assert_eq!(signals.dominant_theme, "none");
        assert!(signals.recent_headlines.is_empty());
    }

    #[test]
    fn test_counts_and_dominant_theme() {
        let articles = vec![
            NewsArticle::new("A", "Board approves new ethics code"),
            NewsArticle::new("B", "Audit finds compliance gaps"),
            NewsArticle::new("C", "Carbon target raised"),
        ];
        let signals = extract_esg_signals(&articles);
        assert_eq!(signals.environmental_mentions, 1);
        assert_eq!(signals.social_mentions, 0);
        assert_eq!(signals.governance_mentions, 2);
        assert_eq!(signals.dominant_theme, "governance");
    }

    #[test]
    fn test_tie_prefers_first_theme() {
        let articles = vec![NewsArticle::new("A", "nothing relevant here")];
        assert_eq!(extract_esg_signals(&articles).dominant_theme, "environmental");
    }

    #[test]
    fn test_headlines_capped() {
        let articles: Vec<_> = (0..8)
            .map(|i| NewsArticle::new(format!("Headline {}", i), ""))
            .collect();
        let signals = extract_esg_signals(&articles);
        assert_eq!(signals.recent_headlines.len(), 5);
        assert_eq!(signals.recent_headlines[0], "Headline 0");
    }
}
