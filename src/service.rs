//! Company-level operations shared by the HTTP API and the CLI
//!
//! `AnalysisService` owns the collaborators (company store, news provider,
//! risk model, orchestrator) and turns a ticker symbol into a full pipeline
//! run: lookup, news fetch, model-or-baseline choice, then the three stages.

use crate::company::{
    CompanyData, CompanyStore, CompanySummary, ControversyEntry, InMemoryCompanyStore,
    SectorAverage,
};
use crate::config::{EsgConfig, MAX_DAYS_BACK};
use crate::error::AnalysisError;
use crate::llm::select_llm_client;
use crate::model::{feature_vector, PredictionInput, RiskModel, SoftmaxClassifier, FEATURE_COLUMNS};
use crate::news::{extract_esg_signals, EsgSignals, NewsApiClient, NewsArticle, NewsProvider};
use crate::pipeline::{FinalReport, ModelHandle, PipelineOrchestrator};
use anyhow::{Context, Result};
use futures_util::{stream, StreamExt};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

pub const MAX_PREDICTION_BATCH: usize = 1000;
pub const DEFAULT_BATCH_CONCURRENCY: usize = 4;
/// Upper bound for ranking and search result sizes
pub const MAX_QUERY_LIMIT: usize = 100;
const MAX_QUERY_TEXT: usize = 100;
const SECTOR_PREVIEW_ARTICLES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisOptions {
    pub days_back: u32,
    /// Skip the news fetch and analyze with an empty article list
    pub include_news: bool,
    /// Run the loaded model; otherwise the stored risk label is the baseline
    pub include_prediction: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            days_back: 30,
            include_news: true,
            include_prediction: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CompanyAnalysis {
    pub company: CompanyData,
    pub news_count: usize,
    pub analysis: FinalReport,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchFailure {
    pub symbol: String,
    pub error: String,
}

/// Results keep the order of the requested symbols
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchOutcome {
    pub results: Vec<CompanyAnalysis>,
    pub failures: Vec<BatchFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionOutput {
    pub risk_level: String,
    pub confidence: f64,
    pub probabilities: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompanyNews {
    pub company: String,
    pub symbol: String,
    pub articles: Vec<NewsArticle>,
    pub signals: EsgSignals,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectorInsights {
    pub sector: String,
    pub news_summary: EsgSignals,
    pub recent_articles: Vec<NewsArticle>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub status: &'static str,
    pub classes: Vec<String>,
    pub features: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_accuracy: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceHealth {
    pub status: &'static str,
    pub version: &'static str,
    pub llm_configured: bool,
    pub model_loaded: bool,
    pub news_configured: bool,
    pub companies: usize,
}

pub struct AnalysisService {
    companies: Arc<dyn CompanyStore>,
    news: Arc<dyn NewsProvider>,
    model: Option<Arc<dyn RiskModel>>,
    orchestrator: PipelineOrchestrator,
    batch_concurrency: usize,
}

impl AnalysisService {
    pub fn new(
        companies: Arc<dyn CompanyStore>,
        news: Arc<dyn NewsProvider>,
        model: Option<Arc<dyn RiskModel>>,
        orchestrator: PipelineOrchestrator,
    ) -> Self {
        Self {
            companies,
            news,
            model,
            orchestrator,
            batch_concurrency: DEFAULT_BATCH_CONCURRENCY,
        }
    }

    pub fn with_batch_concurrency(mut self, concurrency: usize) -> Self {
        self.batch_concurrency = concurrency.max(1);
        self
    }

    /// Wires the production collaborators. A missing or unreadable model
    /// artifact is not fatal; predictions then fall back to stored labels.
    pub async fn from_config(config: &EsgConfig) -> Result<Self> {
        let companies = InMemoryCompanyStore::load(&config.companies_path).with_context(|| {
            format!(
                "Failed to load company data from {}",
                config.companies_path.display()
            )
        })?;

        let model = load_model(config);

        let news = NewsApiClient::from_config(config).context("Failed to build news client")?;
        if !news.is_configured() {
            info!("NEWS_API_KEY not set, analyses will run without news");
        }

        let llm = select_llm_client(config).await;
        let orchestrator = PipelineOrchestrator::new(llm);

        Ok(Self::new(Arc::new(companies), Arc::new(news), model, orchestrator)
            .with_batch_concurrency(config.batch_concurrency))
    }

    pub fn get_company(&self, symbol: &str) -> Option<CompanyData> {
        self.companies.get(symbol)
    }

    pub fn list_companies(&self, limit: usize) -> Vec<CompanyData> {
        self.companies.list(limit)
    }

    /// Lowest total ESG risk first
    pub fn top_companies(&self, limit: usize) -> Result<Vec<CompanySummary>, AnalysisError> {
        validate_limit(limit)?;
        Ok(self.companies.top_companies(limit))
    }

    pub fn sector_averages(&self) -> Vec<SectorAverage> {
        self.companies.sector_averages()
    }

    pub fn high_controversy(&self, min_score: f64) -> Result<Vec<ControversyEntry>, AnalysisError> {
        if !(0.0..=100.0).contains(&min_score) {
            return Err(AnalysisError::InvalidInput(format!(
                "min_score must be between 0 and 100, got {}",
                min_score
            )));
        }
        Ok(self.companies.high_controversy(min_score))
    }

    pub fn search_companies(
        &self,
        query: &str,
        sector: Option<&str>,
        limit: usize,
    ) -> Result<Vec<CompanySummary>, AnalysisError> {
        let query = query.trim();
        if query.is_empty() || query.chars().count() > MAX_QUERY_TEXT {
            return Err(AnalysisError::InvalidInput(format!(
                "q must be between 1 and {} characters",
                MAX_QUERY_TEXT
            )));
        }
        if sector.is_some_and(|s| s.chars().count() > MAX_QUERY_TEXT) {
            return Err(AnalysisError::InvalidInput(format!(
                "sector must be at most {} characters",
                MAX_QUERY_TEXT
            )));
        }
        validate_limit(limit)?;

        let sector = sector.map(str::trim).filter(|s| !s.is_empty());
        Ok(self.companies.search(query, sector, limit))
    }

    pub fn model_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn health(&self) -> ServiceHealth {
        ServiceHealth {
            status: "healthy",
            version: env!("CARGO_PKG_VERSION"),
            llm_configured: self.orchestrator.has_llm(),
            model_loaded: self.model.is_some(),
            news_configured: self.news.is_configured(),
            companies: self.companies.len(),
        }
    }

    pub fn model_info(&self) -> Result<ModelInfo, AnalysisError> {
        let model = self.model.as_ref().ok_or(AnalysisError::ModelUnavailable)?;
        Ok(ModelInfo {
            status: "loaded",
            classes: model.labels().to_vec(),
            features: model.feature_columns().to_vec(),
            test_accuracy: model.test_accuracy(),
        })
    }

    /// Looks up `symbol`, fetches its news and runs the pipeline
    pub async fn analyze(
        &self,
        symbol: &str,
        options: AnalysisOptions,
    ) -> Result<CompanyAnalysis, AnalysisError> {
        validate_days(options.days_back)?;

        let company = self
            .companies
            .get(symbol)
            .ok_or_else(|| AnalysisError::UnknownCompany(symbol.to_string()))?;
        let company_name = company.display_name().to_string();

        let news = if options.include_news {
            self.news.fetch(&company_name, options.days_back).await
        } else {
            Vec::new()
        };
        let news_count = news.len();

        let model = match (&self.model, options.include_prediction) {
            (Some(model), true) => ModelHandle::ModelAvailable(model.clone()),
            _ => ModelHandle::baseline(company.esg_risk_level.clone()),
        };

        debug!(
            symbol,
            company = %company_name,
            news_count,
            model_loaded = model.is_available(),
            "Running analysis"
        );

        let analysis = self
            .orchestrator
            .run(&company_name, company.clone(), news, model)
            .await?;

        Ok(CompanyAnalysis {
            company,
            news_count,
            analysis,
        })
    }

    /// Analyzes every symbol with at most `batch_concurrency` runs in flight.
    /// One symbol failing does not affect the others; an invalid window
    /// rejects the whole batch before any work starts.
    pub async fn analyze_batch(
        &self,
        symbols: &[String],
        options: AnalysisOptions,
    ) -> Result<BatchOutcome, AnalysisError> {
        validate_days(options.days_back)?;
        let start = Instant::now();

        let mut finished: Vec<(usize, String, Result<CompanyAnalysis, AnalysisError>)> =
            stream::iter(symbols.iter().cloned().enumerate())
                .map(|(index, symbol)| async move {
                    let result = self.analyze(&symbol, options).await;
                    (index, symbol, result)
                })
                .buffer_unordered(self.batch_concurrency)
                .collect()
                .await;
        finished.sort_by_key(|(index, _, _)| *index);

        let mut outcome = BatchOutcome::default();
        for (_, symbol, result) in finished {
            match result {
                Ok(analysis) => outcome.results.push(analysis),
                Err(e) => {
                    warn!(symbol = %symbol, error = %e, "Batch analysis failed for symbol");
                    outcome.failures.push(BatchFailure {
                        symbol,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            requested = symbols.len(),
            succeeded = outcome.results.len(),
            failed = outcome.failures.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Batch analysis complete"
        );
        Ok(outcome)
    }

    pub async fn company_news(
        &self,
        symbol: &str,
        days_back: u32,
    ) -> Result<CompanyNews, AnalysisError> {
        validate_days(days_back)?;

        let company = self
            .companies
            .get(symbol)
            .ok_or_else(|| AnalysisError::UnknownCompany(symbol.to_string()))?;
        let company_name = company.display_name().to_string();

        let articles = self.news.fetch(&company_name, days_back).await;
        let signals = extract_esg_signals(&articles);

        Ok(CompanyNews {
            company: company_name,
            symbol: symbol.to_string(),
            articles,
            signals,
        })
    }

    /// Sector-wide ESG coverage summarized into signals, with the first few
    /// articles attached
    pub async fn sector_insights(
        &self,
        sector: &str,
        days_back: u32,
    ) -> Result<SectorInsights, AnalysisError> {
        validate_days(days_back)?;
        let sector = sector.trim();
        if sector.is_empty() {
            return Err(AnalysisError::InvalidInput("sector must not be empty".to_string()));
        }

        let mut articles = self.news.fetch_sector(sector, days_back).await;
        let news_summary = extract_esg_signals(&articles);
        articles.truncate(SECTOR_PREVIEW_ARTICLES);

        Ok(SectorInsights {
            sector: sector.to_string(),
            news_summary,
            recent_articles: articles,
        })
    }

    pub fn predict(&self, input: &PredictionInput) -> Result<PredictionOutput, AnalysisError> {
        input.validate().map_err(AnalysisError::InvalidInput)?;
        let model = self.model.as_ref().ok_or(AnalysisError::ModelUnavailable)?;

        let features = feature_vector(&input.to_company_data(), model.feature_columns());
        let prediction = model.predict(&features)?;

        Ok(PredictionOutput {
            risk_level: prediction.label,
            confidence: prediction.confidence,
            probabilities: prediction.probabilities,
        })
    }

    /// All-or-nothing: the first invalid item rejects the whole batch
    pub fn predict_batch(
        &self,
        inputs: &[PredictionInput],
    ) -> Result<Vec<PredictionOutput>, AnalysisError> {
        if inputs.len() > MAX_PREDICTION_BATCH {
            return Err(AnalysisError::InvalidInput(format!(
                "batch size must not exceed {}, got {}",
                MAX_PREDICTION_BATCH,
                inputs.len()
            )));
        }

        for (index, input) in inputs.iter().enumerate() {
            input
                .validate()
                .map_err(|e| AnalysisError::InvalidInput(format!("item {}: {}", index, e)))?;
        }

        inputs.iter().map(|input| self.predict(input)).collect()
    }
}

impl std::fmt::Debug for AnalysisService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisService")
            .field("companies", &self.companies.len())
            .field("news", &self.news.name())
            .field("model_loaded", &self.model.is_some())
            .field("orchestrator", &self.orchestrator)
            .field("batch_concurrency", &self.batch_concurrency)
            .finish()
    }
}

fn validate_limit(limit: usize) -> Result<(), AnalysisError> {
    if limit == 0 || limit > MAX_QUERY_LIMIT {
        return Err(AnalysisError::InvalidInput(format!(
            "limit must be between 1 and {}, got {}",
            MAX_QUERY_LIMIT, limit
        )));
    }
    Ok(())
}

fn validate_days(days_back: u32) -> Result<(), AnalysisError> {
    if days_back == 0 || days_back > MAX_DAYS_BACK {
        return Err(AnalysisError::InvalidInput(format!(
            "days_back must be between 1 and {}, got {}",
            MAX_DAYS_BACK, days_back
        )));
    }
    Ok(())
}

fn load_model(config: &EsgConfig) -> Option<Arc<dyn RiskModel>> {
    let path = config.model_path.as_ref()?;
    if !path.exists() {
        warn!(path = %path.display(), "Risk model not found, using stored risk labels");
        return None;
    }

    match SoftmaxClassifier::load(path) {
        Ok(model) => {
            if model.feature_columns().len() != FEATURE_COLUMNS.len() {
                warn!(
                    path = %path.display(),
                    features = model.feature_columns().len(),
                    "Risk model declares a non-standard feature set"
                );
            }
            Some(Arc::new(model))
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to load risk model");
            None
        }
    }
}
