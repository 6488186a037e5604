//! Shared fixtures for the integration tests

#![allow(dead_code)]

use esgpulse::company::{CompanyData, InMemoryCompanyStore};
use esgpulse::model::{
    ModelArtifact, ModelError, Prediction, RiskModel, ScalerParams, SoftmaxClassifier,
    FEATURE_COLUMNS,
};
use esgpulse::news::{NewsArticle, StaticNewsProvider};
use esgpulse::pipeline::PipelineOrchestrator;
use esgpulse::progress::NoOpHandler;
use esgpulse::AnalysisService;
use std::sync::Arc;

pub fn acme() -> CompanyData {
    CompanyData {
        sector: Some("Energy".to_string()),
        full_time_employees: Some(12_000.0),
        total_esg_risk_score: Some(38.0),
        environment_risk_score: Some(18.0),
        social_risk_score: Some(11.0),
        governance_risk_score: Some(9.0),
        controversy_score: Some(4.0),
        esg_risk_level: Some("High".to_string()),
        ..CompanyData::new("ACME", "Acme Corp")
    }
}

pub fn greenleaf() -> CompanyData {
    CompanyData {
        sector: Some("Utilities".to_string()),
        full_time_employees: Some(800.0),
        total_esg_risk_score: Some(12.0),
        environment_risk_score: Some(2.0),
        social_risk_score: Some(4.0),
        governance_risk_score: Some(3.0),
        controversy_score: Some(1.0),
        esg_risk_level: Some("Low".to_string()),
        ..CompanyData::new("GRN", "Greenleaf Energy")
    }
}

/// Moderate scores with no stored risk label
pub fn mid_risk_company() -> CompanyData {
    CompanyData {
        environment_risk_score: Some(8.0),
        social_risk_score: Some(10.0),
        governance_risk_score: Some(7.0),
        controversy_score: Some(2.0),
        total_esg_risk_score: Some(25.0),
        ..CompanyData::new("MIDW", "Midway Holdings")
    }
}

pub fn companies() -> InMemoryCompanyStore {
    InMemoryCompanyStore::from_records(vec![acme(), greenleaf()])
}

pub fn lawsuit_articles(n: usize) -> Vec<NewsArticle> {
    (0..n)
        .map(|i| {
            NewsArticle::new(
                format!("Acme faces lawsuit #{}", i + 1),
                "Regulators opened a lawsuit over carbon emissions reporting",
            )
            .with_source("Wire")
        })
        .collect()
}

pub fn clean_articles() -> Vec<NewsArticle> {
    vec![
        NewsArticle::new(
            "Greenleaf expands renewable capacity",
            "New renewable wind farm cuts carbon output",
        ),
        NewsArticle::new(
            "Greenleaf board adds members",
            "The board appointed two independent directors to improve transparency",
        ),
    ]
}

/// Same shape as `models/esg_risk_model.json`
pub fn model_artifact() -> ModelArtifact {
    ModelArtifact {
        feature_columns: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
        classes: vec!["Low".to_string(), "Medium".to_string(), "High".to_string()],
        scaler: ScalerParams {
            mean: vec![6.0, 8.0, 7.0, 2.0, 50_000.0],
            scale: vec![4.0, 4.0, 4.0, 1.5, 80_000.0],
        },
        weights: vec![
            vec![-1.0, -1.0, -1.0, -0.8, 0.0],
            vec![0.0; 5],
            vec![1.0, 1.0, 1.0, 0.8, 0.0],
        ],
        bias: vec![0.0, 0.5, 0.0],
        test_accuracy: Some(0.87),
    }
}

pub fn classifier() -> Arc<dyn RiskModel> {
    Arc::new(SoftmaxClassifier::from_artifact(model_artifact()).unwrap())
}

/// Declares the standard columns but was trained on one feature fewer
pub struct MismatchedModel {
    columns: Vec<String>,
    labels: Vec<String>,
}

impl MismatchedModel {
    pub fn new() -> Self {
        Self {
            columns: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            labels: vec!["Low".to_string(), "High".to_string()],
        }
    }
}

impl RiskModel for MismatchedModel {
    fn feature_columns(&self) -> &[String] {
        &self.columns
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn predict(&self, features: &[f64]) -> Result<Prediction, ModelError> {
        Err(ModelError::FeatureMismatch {
            expected: self.columns.len() - 1,
            got: features.len(),
        })
    }
}

pub fn quiet_orchestrator() -> PipelineOrchestrator {
    PipelineOrchestrator::new(None).with_progress(Arc::new(NoOpHandler))
}

pub fn service(news: StaticNewsProvider, model: Option<Arc<dyn RiskModel>>) -> AnalysisService {
    AnalysisService::new(
        Arc::new(companies()),
        Arc::new(news),
        model,
        quiet_orchestrator(),
    )
}
