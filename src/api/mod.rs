//! HTTP surface over [`AnalysisService`]
//!
//! - `GET  /health`
//! - `GET  /api/analytics/companies?limit=N`
//! - `GET  /api/analytics/companies/{symbol}`
//! - `GET  /api/analytics/companies/top?limit=N`
//! - `GET  /api/analytics/companies/high-controversy?min_score=X`
//! - `GET  /api/analytics/companies/search?q=..&sector=..&limit=N`
//! - `GET  /api/analytics/sectors/average`
//! - `POST /api/agents/analyze-company`
//! - `POST /api/agents/batch`
//! - `GET  /api/agents/company-news/{symbol}?days=N`
//! - `GET  /api/agents/sector-insights/{sector}?days=N`
//! - `POST /api/predict`, `POST /api/predict/batch`, `GET /api/predict/model/info`

mod error;
mod handlers;
mod state;

pub use error::{ApiError, ApiResult};
pub use handlers::MAX_BATCH_SYMBOLS;
pub use state::ApiState;

use crate::service::AnalysisService;
use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

pub fn create_app(service: Arc<AnalysisService>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/analytics/companies", get(handlers::list_companies))
        .route("/api/analytics/companies/top", get(handlers::top_companies))
        .route(
            "/api/analytics/companies/high-controversy",
            get(handlers::high_controversy),
        )
        .route(
            "/api/analytics/companies/search",
            get(handlers::search_companies),
        )
        .route("/api/analytics/companies/{symbol}", get(handlers::get_company))
        .route("/api/analytics/sectors/average", get(handlers::sector_averages))
        .route("/api/agents/analyze-company", post(handlers::analyze_company))
        .route("/api/agents/batch", post(handlers::analyze_batch))
        .route(
            "/api/agents/company-news/{symbol}",
            get(handlers::company_news),
        )
        .route(
            "/api/agents/sector-insights/{sector}",
            get(handlers::sector_insights),
        )
        .route("/api/predict", post(handlers::predict))
        .route("/api/predict/batch", post(handlers::predict_batch))
        .route("/api/predict/model/info", get(handlers::model_info))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(ApiState::new(service))
}

/// Binds `addr` and serves until ctrl-c
pub async fn serve(service: Arc<AnalysisService>, addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(addr = %addr, "esgpulse API listening");

    axum::serve(listener, create_app(service))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("esgpulse API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
