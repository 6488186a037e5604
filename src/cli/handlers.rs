//! Subcommand handlers. Each returns the process exit code.

use super::commands::{
    AnalyzeArgs, BatchArgs, CliArgs, ConfigArgs, HealthArgs, LlmArgs, NewsArgs, PredictArgs,
    ServeArgs,
};
use super::output::{HealthStatus, OutputFormat, OutputFormatter};
use crate::api;
use crate::company::{CompanyStore, InMemoryCompanyStore};
use crate::config::EsgConfig;
use crate::error::AnalysisError;
use crate::llm::provider_has_credentials;
use crate::model::{PredictionInput, RiskModel, SoftmaxClassifier};
use crate::news::StaticNewsProvider;
use crate::pipeline::PipelineOrchestrator;
use crate::service::{AnalysisOptions, AnalysisService};
use genai::adapter::AdapterKind;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info};

pub const EXIT_OK: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
/// Input problem: unknown symbol, out-of-range value, bad configuration
pub const EXIT_USAGE: i32 = 2;

/// Environment configuration with the global `--companies`/`--model` overrides
pub fn base_config(args: &CliArgs) -> EsgConfig {
    let mut config = EsgConfig::default();
    if let Some(ref path) = args.companies {
        config.companies_path = path.clone();
    }
    if let Some(ref path) = args.model {
        config.model_path = Some(path.clone());
    }
    config
}

fn apply_llm_args(config: &mut EsgConfig, llm: &LlmArgs) {
    if let Some(provider) = llm.provider {
        debug!(provider = provider.as_str(), "Provider explicitly set");
        config.llm_provider = provider;
    }
    if let Some(ref model) = llm.llm_model {
        config.llm_model = model.clone();
    }
    if llm.no_llm {
        config.llm_enabled = false;
    }
}

async fn build_service(config: &EsgConfig) -> Result<AnalysisService, i32> {
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        eprintln!("\nPlease check your environment variables and command-line arguments.");
        return Err(EXIT_USAGE);
    }

    AnalysisService::from_config(config).await.map_err(|e| {
        error!("Failed to initialize analysis service: {:#}", e);
        EXIT_FAILURE
    })
}

fn emit(output: anyhow::Result<String>, path: Option<&PathBuf>) -> i32 {
    let text = match output {
        Ok(text) => text,
        Err(e) => {
            error!("Failed to format output: {:#}", e);
            return EXIT_FAILURE;
        }
    };

    match path {
        Some(path) => match std::fs::write(path, &text) {
            Ok(()) => {
                info!(path = %path.display(), "Output written");
                EXIT_OK
            }
            Err(e) => {
                error!("Failed to write {}: {}", path.display(), e);
                EXIT_FAILURE
            }
        },
        None => {
            println!("{}", text);
            EXIT_OK
        }
    }
}

fn exit_code_for(err: &AnalysisError) -> i32 {
    match err {
        AnalysisError::UnknownCompany(_) | AnalysisError::InvalidInput(_) => EXIT_USAGE,
        _ => EXIT_FAILURE,
    }
}

pub async fn handle_analyze(args: &AnalyzeArgs, mut config: EsgConfig) -> i32 {
    apply_llm_args(&mut config, &args.llm);
    let service = match build_service(&config).await {
        Ok(service) => service,
        Err(code) => return code,
    };

    let options = AnalysisOptions {
        days_back: args.days.unwrap_or(config.days_back),
        include_news: !args.no_news,
        include_prediction: !args.no_prediction,
    };
    info!(symbol = %args.symbol, days_back = options.days_back, "Analyzing company");

    match service.analyze(&args.symbol, options).await {
        Ok(analysis) => {
            let formatter = OutputFormatter::new(OutputFormat::from(args.format));
            emit(formatter.format_analysis(&analysis), args.output.as_ref())
        }
        Err(e) => {
            error!("Analysis failed: {}", e);
            exit_code_for(&e)
        }
    }
}

pub async fn handle_batch(args: &BatchArgs, mut config: EsgConfig) -> i32 {
    apply_llm_args(&mut config, &args.llm);
    if let Some(concurrency) = args.concurrency {
        config.batch_concurrency = concurrency;
    }
    let service = match build_service(&config).await {
        Ok(service) => service,
        Err(code) => return code,
    };

    let options = AnalysisOptions {
        days_back: args.days.unwrap_or(config.days_back),
        ..Default::default()
    };
    let outcome = match service.analyze_batch(&args.symbols, options).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Batch analysis failed: {}", e);
            return exit_code_for(&e);
        }
    };

    let formatter = OutputFormatter::new(OutputFormat::from(args.format));
    let code = emit(formatter.format_batch(&outcome), None);
    if code == EXIT_OK && outcome.results.is_empty() {
        EXIT_FAILURE
    } else {
        code
    }
}

/// Only needs the model, so the company file and news client are not touched
pub fn handle_predict(args: &PredictArgs, config: &EsgConfig) -> i32 {
    let input = PredictionInput {
        environment_risk_score: args.environment,
        social_risk_score: args.social,
        governance_risk_score: args.governance,
        controversy_score: args.controversy,
        full_time_employees: args.employees,
    };

    let Some(ref path) = config.model_path else {
        error!("No risk model configured; set ESGPULSE_MODEL_PATH or pass --model");
        return EXIT_USAGE;
    };
    let model = match SoftmaxClassifier::load(path) {
        Ok(model) => model,
        Err(e) => {
            error!("Failed to load risk model: {}", e);
            return EXIT_FAILURE;
        }
    };

    let service = AnalysisService::new(
        Arc::new(InMemoryCompanyStore::default()),
        Arc::new(StaticNewsProvider::new()),
        Some(Arc::new(model)),
        PipelineOrchestrator::new(None),
    );

    match service.predict(&input) {
        Ok(prediction) => {
            let formatter = OutputFormatter::new(OutputFormat::from(args.format));
            emit(formatter.format_prediction(&prediction), None)
        }
        Err(e) => {
            error!("Prediction failed: {}", e);
            exit_code_for(&e)
        }
    }
}

pub async fn handle_news(args: &NewsArgs, mut config: EsgConfig) -> i32 {
    config.llm_enabled = false;
    let service = match build_service(&config).await {
        Ok(service) => service,
        Err(code) => return code,
    };

    match service.company_news(&args.symbol, args.days).await {
        Ok(news) => {
            let formatter = OutputFormatter::new(OutputFormat::from(args.format));
            emit(formatter.format_news(&news), None)
        }
        Err(e) => {
            error!("News lookup failed: {}", e);
            exit_code_for(&e)
        }
    }
}

pub async fn handle_serve(args: &ServeArgs, mut config: EsgConfig) -> i32 {
    apply_llm_args(&mut config, &args.llm);
    if let Some(ref addr) = args.addr {
        config.bind_addr = addr.clone();
    }
    let service = match build_service(&config).await {
        Ok(service) => service,
        Err(code) => return code,
    };

    match api::serve(Arc::new(service), &config.bind_addr).await {
        Ok(()) => EXIT_OK,
        Err(e) => {
            error!("Server error: {:#}", e);
            EXIT_FAILURE
        }
    }
}

pub fn handle_config(args: &ConfigArgs, config: &EsgConfig) -> i32 {
    let formatter = OutputFormatter::new(OutputFormat::from(args.format));
    let code = emit(formatter.format_config(config), None);
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return EXIT_USAGE;
    }
    code
}

pub fn handle_health(args: &HealthArgs, config: &EsgConfig) -> i32 {
    info!("Checking component health");
    let results = check_health(config);

    let formatter = OutputFormatter::new(OutputFormat::from(args.format));
    emit(formatter.format_health(&results), None)
}

/// Inspects every collaborator without making network calls
pub fn check_health(config: &EsgConfig) -> BTreeMap<String, HealthStatus> {
    let mut results = BTreeMap::new();

    let companies = match InMemoryCompanyStore::load(&config.companies_path) {
        Ok(store) => HealthStatus::available(format!("{} companies loaded", store.len()))
            .with_details(config.companies_path.display().to_string()),
        Err(e) => HealthStatus::unavailable(e.to_string())
            .with_details("Set ESGPULSE_COMPANIES_PATH or pass --companies"),
    };
    results.insert("Company data".to_string(), companies);

    let model = match config.model_path {
        None => HealthStatus::unavailable("No model configured")
            .with_details("Analyses use stored risk labels"),
        Some(ref path) => match SoftmaxClassifier::load(path) {
            Ok(model) => {
                let mut status = HealthStatus::available(format!(
                    "{} classes over {} features",
                    model.labels().len(),
                    model.feature_columns().len()
                ));
                if let Some(acc) = model.test_accuracy() {
                    status = status.with_details(format!("Test accuracy {:.1}%", acc * 100.0));
                }
                status
            }
            Err(e) => HealthStatus::unavailable(e.to_string())
                .with_details("Analyses use stored risk labels"),
        },
    };
    results.insert("Risk model".to_string(), model);

    let news = if config.news_api_key.is_some() {
        HealthStatus::available(format!("API key is configured ({})", config.news_base_url))
    } else {
        HealthStatus::unavailable("API key not configured")
            .with_details("Set NEWS_API_KEY environment variable")
    };
    results.insert("News API".to_string(), news);

    let provider = config.llm_provider;
    let llm = if !config.llm_enabled {
        HealthStatus::unavailable("Disabled by ESGPULSE_LLM_ENABLED")
    } else if provider == AdapterKind::Ollama || provider_has_credentials(provider) {
        HealthStatus::available(format!("{} ({})", provider.as_str(), config.llm_model))
    } else {
        HealthStatus::unavailable("API key not configured").with_details(format!(
            "Set {} environment variable; synthesis falls back to templates",
            provider.default_key_env_name().unwrap_or("the provider key")
        ))
    };
    results.insert("LLM".to_string(), llm);

    results
}
