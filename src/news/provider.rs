use super::article::NewsArticle;
use async_trait::async_trait;
use std::collections::HashMap;

/// Company news lookup.
///
/// `fetch` never fails: an unconfigured provider or exhausted retries yield
/// an empty list, which the pipeline treats as "no news".
#[async_trait]
pub trait NewsProvider: Send + Sync {
    async fn fetch(&self, company_name: &str, days_back: u32) -> Vec<NewsArticle>;

    /// ESG coverage of a whole sector, newest first
    async fn fetch_sector(&self, sector: &str, days_back: u32) -> Vec<NewsArticle>;

    fn name(&self) -> &str;

    /// False when the provider cannot return anything (e.g. no API key)
    fn is_configured(&self) -> bool {
        true
    }
}

/// In-memory provider keyed by company or sector name (case-insensitive).
/// Used for offline runs and tests; `days_back` is ignored.
#[derive(Debug, Default, Clone)]
pub struct StaticNewsProvider {
    articles: HashMap<String, Vec<NewsArticle>>,
    sectors: HashMap<String, Vec<NewsArticle>>,
}

impl StaticNewsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_articles(mut self, company_name: &str, articles: Vec<NewsArticle>) -> Self {
        self.articles.insert(company_name.to_lowercase(), articles);
        self
    }

    pub fn with_sector_articles(mut self, sector: &str, articles: Vec<NewsArticle>) -> Self {
        self.sectors.insert(sector.to_lowercase(), articles);
        self
    }
}

#[async_trait]
impl NewsProvider for StaticNewsProvider {
    async fn fetch(&self, company_name: &str, _days_back: u32) -> Vec<NewsArticle> {
        self.articles
            .get(&company_name.to_lowercase())
            .cloned()
            .unwrap_or_default()
    }

    async fn fetch_sector(&self, sector: &str, _days_back: u32) -> Vec<NewsArticle> {
        self.sectors
            .get(&sector.to_lowercase())
            .cloned()
            .unwrap_or_default()
    }

    fn name(&self) -> &str {
        "static"
    }

    fn is_configured(&self) -> bool {
        !self.articles.is_empty() || !self.sectors.is_empty()
    }
}
