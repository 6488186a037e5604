//! `AnalysisService` over in-memory collaborators

mod support;

use esgpulse::company::InMemoryCompanyStore;
use esgpulse::error::AnalysisError;
use esgpulse::news::StaticNewsProvider;
use esgpulse::pipeline::{InterpretationSource, Sentiment};
use esgpulse::{AnalysisOptions, AnalysisService, EsgConfig};
use std::io::Write;
use std::sync::Arc;
use support::*;
use tempfile::{NamedTempFile, TempDir};

fn news() -> StaticNewsProvider {
    StaticNewsProvider::new()
        .with_articles("Acme Corp", lawsuit_articles(3))
        .with_articles("Greenleaf Energy", clean_articles())
}

#[tokio::test]
async fn test_analyze_fetches_news_and_runs_model() {
    let service = service(news(), Some(classifier()));
    let analysis = service
        .analyze("ACME", AnalysisOptions::default())
        .await
        .unwrap();

    assert_eq!(analysis.news_count, 3);
    assert_eq!(analysis.company.symbol.as_deref(), Some("ACME"));
    assert_eq!(analysis.analysis.company, "Acme Corp");

    let interp = analysis
        .analysis
        .agents
        .model_interpretation
        .as_interpretation()
        .unwrap();
    assert_eq!(interp.source, InterpretationSource::Model);
    assert_eq!(interp.risk_level, "High");
}

#[tokio::test]
async fn test_analyze_without_news() {
    let service = service(news(), Some(classifier()));
    let options = AnalysisOptions {
        include_news: false,
        ..Default::default()
    };
    let analysis = service.analyze("ACME", options).await.unwrap();

    assert_eq!(analysis.news_count, 0);
    let news = analysis.analysis.agents.news_analysis.as_news().unwrap();
    assert_eq!(news.sentiment, Sentiment::Neutral);
}

#[tokio::test]
async fn test_batch_keeps_order_and_isolates_failures() {
    let service = service(news(), Some(classifier())).with_batch_concurrency(2);
    let symbols = vec!["GRN".to_string(), "NOPE".to_string(), "ACME".to_string()];

    let outcome = service
        .analyze_batch(&symbols, AnalysisOptions::default())
        .await
        .unwrap();

    let analyzed: Vec<_> = outcome
        .results
        .iter()
        .map(|r| r.analysis.company.as_str())
        .collect();
    assert_eq!(analyzed, vec!["Greenleaf Energy", "Acme Corp"]);

    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].symbol, "NOPE");
    assert!(outcome.failures[0].error.contains("NOPE"));

    let acme_news = outcome.results[1].analysis.agents.news_analysis.as_news().unwrap();
    let grn_news = outcome.results[0].analysis.agents.news_analysis.as_news().unwrap();
    assert_eq!(acme_news.sentiment, Sentiment::Negative);
    assert_eq!(grn_news.sentiment, Sentiment::Positive);
}

#[tokio::test]
async fn test_batch_with_invalid_window_is_rejected() {
    let service = service(news(), None);
    let options = AnalysisOptions {
        days_back: 0,
        ..Default::default()
    };
    let err = service
        .analyze_batch(&["ACME".to_string(), "GRN".to_string()], options)
        .await
        .unwrap_err();

    assert!(matches!(err, AnalysisError::InvalidInput(_)));
}

#[tokio::test]
async fn test_company_news_signals() {
    let service = service(news(), None);
    let news = service.company_news("GRN", 30).await.unwrap();

    assert_eq!(news.company, "Greenleaf Energy");
    assert_eq!(news.articles.len(), 2);
    assert_eq!(news.signals.total_articles, 2);
}

#[tokio::test]
async fn test_company_news_unknown_symbol() {
    let err = service(news(), None)
        .company_news("NOPE", 30)
        .await
        .unwrap_err();
    assert!(matches!(err, AnalysisError::UnknownCompany(_)));
}

#[tokio::test]
async fn test_sector_insights_summarize_all_and_preview_five() {
    let news = news().with_sector_articles("Energy", lawsuit_articles(7));
    let insights = service(news, None).sector_insights("energy", 7).await.unwrap();

    assert_eq!(insights.sector, "energy");
    assert_eq!(insights.news_summary.total_articles, 7);
    assert_eq!(insights.recent_articles.len(), 5);
}

#[tokio::test]
async fn test_sector_insights_without_coverage() {
    let insights = service(news(), None).sector_insights("Utilities", 7).await.unwrap();
    assert_eq!(insights.news_summary.total_articles, 0);
    assert!(insights.recent_articles.is_empty());

    let err = service(news(), None).sector_insights("Utilities", 0).await.unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidInput(_)));
}

#[test]
fn test_rankings_and_search() {
    let service = service(news(), None);

    let top: Vec<_> = service
        .top_companies(10)
        .unwrap()
        .into_iter()
        .filter_map(|c| c.symbol)
        .collect();
    assert_eq!(top, vec!["GRN", "ACME"]);

    let averages = service.sector_averages();
    assert_eq!(averages[0].sector, "Utilities");
    assert_eq!(averages[1].sector, "Energy");

    let flagged = service.high_controversy(3.0).unwrap();
    assert_eq!(flagged.len(), 1);
    assert_eq!(flagged[0].symbol.as_deref(), Some("ACME"));

    let found = service.search_companies("energy", None, 20).unwrap();
    assert_eq!(found[0].symbol.as_deref(), Some("GRN"));
    let found = service.search_companies("a", Some("Energy"), 20).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name.as_deref(), Some("Acme Corp"));
}

#[test]
fn test_model_info() {
    let info = service(news(), Some(classifier())).model_info().unwrap();
    assert_eq!(info.classes, vec!["Low", "Medium", "High"]);
    assert_eq!(info.features.len(), 5);
    assert_eq!(info.test_accuracy, Some(0.87));

    assert!(matches!(
        service(news(), None).model_info(),
        Err(AnalysisError::ModelUnavailable)
    ));
}

#[test]
fn test_empty_store_reports_zero_companies() {
    let service = AnalysisService::new(
        Arc::new(InMemoryCompanyStore::default()),
        Arc::new(StaticNewsProvider::new()),
        None,
        quiet_orchestrator(),
    );
    assert_eq!(service.health().companies, 0);
    assert!(service.list_companies(10).is_empty());
}

#[tokio::test]
async fn test_from_config_loads_files() {
    let dir = TempDir::new().unwrap();
    let companies_path = dir.path().join("companies.json");
    let model_path = dir.path().join("model.json");

    std::fs::write(
        &companies_path,
        serde_json::to_string(&vec![acme(), greenleaf()]).unwrap(),
    )
    .unwrap();
    std::fs::write(
        &model_path,
        serde_json::to_string(&model_artifact()).unwrap(),
    )
    .unwrap();

    let config = EsgConfig {
        companies_path,
        model_path: Some(model_path),
        news_api_key: None,
        llm_enabled: false,
        ..EsgConfig::default()
    };
    let service = AnalysisService::from_config(&config).await.unwrap();

    let health = service.health();
    assert_eq!(health.companies, 2);
    assert!(health.model_loaded);
    assert!(!health.news_configured);
    assert!(!health.llm_configured);
}

#[tokio::test]
async fn test_from_config_tolerates_broken_model() {
    let mut companies = NamedTempFile::new().unwrap();
    write!(companies, r#"[{{"symbol": "ACME", "name": "Acme Corp"}}]"#).unwrap();
    let mut model = NamedTempFile::new().unwrap();
    write!(model, r#"{{"classes": []}}"#).unwrap();

    let config = EsgConfig {
        companies_path: companies.path().to_path_buf(),
        model_path: Some(model.path().to_path_buf()),
        news_api_key: None,
        llm_enabled: false,
        ..EsgConfig::default()
    };
    let service = AnalysisService::from_config(&config).await.unwrap();
    assert!(!service.model_loaded());
}

#[tokio::test]
async fn test_from_config_requires_company_file() {
    let config = EsgConfig {
        companies_path: "/nonexistent/companies.json".into(),
        model_path: None,
        news_api_key: None,
        llm_enabled: false,
        ..EsgConfig::default()
    };
    assert!(AnalysisService::from_config(&config).await.is_err());
}
