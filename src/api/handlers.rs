use super::error::{ApiError, ApiResult};
use super::state::ApiState;
use crate::company::{CompanyData, CompanySummary, ControversyEntry, SectorAverage};
use crate::model::PredictionInput;
use crate::service::{
    AnalysisOptions, BatchOutcome, CompanyAnalysis, CompanyNews, ModelInfo, PredictionOutput,
    SectorInsights, ServiceHealth,
};
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

pub const MAX_BATCH_SYMBOLS: usize = 50;
const DEFAULT_COMPANY_LIMIT: usize = 100;

fn default_days() -> u32 {
    30
}

fn default_sector_days() -> u32 {
    7
}

fn default_top_limit() -> usize {
    10
}

fn default_search_limit() -> usize {
    20
}

fn default_min_controversy() -> f64 {
    50.0
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    #[serde(flatten)]
    pub health: ServiceHealth,
    pub uptime_secs: u64,
}

pub async fn health(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        health: state.service.health(),
        uptime_secs: state.uptime_secs(),
    })
}

#[derive(Debug, Deserialize)]
pub struct CompaniesQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct CompaniesResponse {
    pub companies: Vec<CompanyData>,
    pub count: usize,
}

pub async fn list_companies(
    State(state): State<ApiState>,
    Query(query): Query<CompaniesQuery>,
) -> Json<CompaniesResponse> {
    let companies = state
        .service
        .list_companies(query.limit.unwrap_or(DEFAULT_COMPANY_LIMIT));
    Json(CompaniesResponse {
        count: companies.len(),
        companies,
    })
}

pub async fn get_company(
    State(state): State<ApiState>,
    Path(symbol): Path<String>,
) -> ApiResult<Json<CompanyData>> {
    state
        .service
        .get_company(&symbol)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Company {} not found", symbol)))
}

#[derive(Debug, Deserialize)]
pub struct TopQuery {
    #[serde(default = "default_top_limit")]
    pub limit: usize,
}

pub async fn top_companies(
    State(state): State<ApiState>,
    Query(query): Query<TopQuery>,
) -> ApiResult<Json<Vec<CompanySummary>>> {
    Ok(Json(state.service.top_companies(query.limit)?))
}

pub async fn sector_averages(State(state): State<ApiState>) -> Json<Vec<SectorAverage>> {
    Json(state.service.sector_averages())
}

#[derive(Debug, Deserialize)]
pub struct ControversyQuery {
    #[serde(default = "default_min_controversy")]
    pub min_score: f64,
}

pub async fn high_controversy(
    State(state): State<ApiState>,
    Query(query): Query<ControversyQuery>,
) -> ApiResult<Json<Vec<ControversyEntry>>> {
    Ok(Json(state.service.high_controversy(query.min_score)?))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub sector: Option<String>,
    #[serde(default = "default_search_limit")]
    pub limit: usize,
}

pub async fn search_companies(
    State(state): State<ApiState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<CompanySummary>>> {
    Ok(Json(state.service.search_companies(
        &query.q,
        query.sector.as_deref(),
        query.limit,
    )?))
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub symbol: String,
    #[serde(default = "default_days")]
    pub days_back: u32,
    #[serde(default = "default_true")]
    pub include_news: bool,
    #[serde(default = "default_true")]
    pub include_prediction: bool,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    #[serde(flatten)]
    pub result: CompanyAnalysis,
}

pub async fn analyze_company(
    State(state): State<ApiState>,
    Json(request): Json<AnalyzeRequest>,
) -> ApiResult<Json<AnalyzeResponse>> {
    let options = AnalysisOptions {
        days_back: request.days_back,
        include_news: request.include_news,
        include_prediction: request.include_prediction,
    };
    let result = state.service.analyze(&request.symbol, options).await?;

    Ok(Json(AnalyzeResponse {
        success: true,
        result,
    }))
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub symbols: Vec<String>,
    #[serde(default = "default_days")]
    pub days_back: u32,
}

pub async fn analyze_batch(
    State(state): State<ApiState>,
    Json(request): Json<BatchRequest>,
) -> ApiResult<Json<BatchOutcome>> {
    if request.symbols.is_empty() {
        return Err(ApiError::BadRequest("symbols must not be empty".to_string()));
    }
    if request.symbols.len() > MAX_BATCH_SYMBOLS {
        return Err(ApiError::BadRequest(format!(
            "at most {} symbols per batch, got {}",
            MAX_BATCH_SYMBOLS,
            request.symbols.len()
        )));
    }

    let options = AnalysisOptions {
        days_back: request.days_back,
        ..Default::default()
    };
    Ok(Json(
        state.service.analyze_batch(&request.symbols, options).await?,
    ))
}

#[derive(Debug, Deserialize)]
pub struct NewsQuery {
    #[serde(default = "default_days")]
    pub days: u32,
}

pub async fn company_news(
    State(state): State<ApiState>,
    Path(symbol): Path<String>,
    Query(query): Query<NewsQuery>,
) -> ApiResult<Json<CompanyNews>> {
    Ok(Json(state.service.company_news(&symbol, query.days).await?))
}

#[derive(Debug, Deserialize)]
pub struct SectorQuery {
    #[serde(default = "default_sector_days")]
    pub days: u32,
}

pub async fn sector_insights(
    State(state): State<ApiState>,
    Path(sector): Path<String>,
    Query(query): Query<SectorQuery>,
) -> ApiResult<Json<SectorInsights>> {
    Ok(Json(state.service.sector_insights(&sector, query.days).await?))
}

pub async fn predict(
    State(state): State<ApiState>,
    Json(input): Json<PredictionInput>,
) -> ApiResult<Json<PredictionOutput>> {
    Ok(Json(state.service.predict(&input)?))
}

#[derive(Debug, Deserialize)]
pub struct PredictBatchRequest {
    pub items: Vec<PredictionInput>,
}

#[derive(Debug, Serialize)]
pub struct PredictBatchResponse {
    pub predictions: Vec<PredictionOutput>,
    pub count: usize,
}

pub async fn predict_batch(
    State(state): State<ApiState>,
    Json(request): Json<PredictBatchRequest>,
) -> ApiResult<Json<PredictBatchResponse>> {
    let predictions = state.service.predict_batch(&request.items)?;
    Ok(Json(PredictBatchResponse {
        count: predictions.len(),
        predictions,
    }))
}

pub async fn model_info(State(state): State<ApiState>) -> ApiResult<Json<ModelInfo>> {
    Ok(Json(state.service.model_info()?))
}
