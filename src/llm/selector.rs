use crate::config::EsgConfig;
use crate::llm::{GenAIClient, LLMClient};
use genai::adapter::AdapterKind;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Picks the LLM used for narrative synthesis.
///
/// Returns `None` when the LLM is disabled, the configured provider has no
/// credentials, or a local Ollama is not reachable. The pipeline then runs
/// with rule-based synthesis.
pub async fn select_llm_client(config: &EsgConfig) -> Option<Arc<dyn LLMClient>> {
    if !config.llm_enabled {
        info!("LLM synthesis disabled by configuration");
        return None;
    }

    let provider = config.llm_provider;

    if provider == AdapterKind::Ollama {
        if !is_ollama_available().await {
            info!("Ollama not reachable, using rule-based synthesis");
            return None;
        }
    } else if !provider_has_credentials(provider) {
        info!(
            provider = provider.as_str(),
            key = provider.default_key_env_name().unwrap_or(""),
            "LLM not configured, using rule-based synthesis"
        );
        return None;
    }

    let client = GenAIClient::new(provider, config.llm_model.clone(), config.llm_timeout());
    info!(llm = %client.describe(), "Using LLM for synthesis");

    Some(Arc::new(client))
}

/// Check if provider has available credentials
pub fn provider_has_credentials(provider: AdapterKind) -> bool {
    match provider.default_key_env_name() {
        None => true,
        Some(env_var) => std::env::var(env_var)
            .map(|v| !v.trim().is_empty())
            .unwrap_or(false),
    }
}

async fn is_ollama_available() -> bool {
    let base_url =
        std::env::var("OLLAMA_HOST").unwrap_or_else(|_| "http://localhost:11434".to_string());
    let url = format!("{}/api/tags", base_url.trim_end_matches('/'));

    match reqwest::Client::new()
        .get(&url)
        .timeout(Duration::from_secs(2))
        .send()
        .await
    {
        Ok(resp) => {
            let available = resp.status().is_success();
            debug!(available, "Ollama availability check");
            available
        }
        Err(e) => {
            debug!(error = %e, "Ollama not available");
            false
        }
    }
}
