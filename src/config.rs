//! Configuration management for esgpulse
//!
//! Settings come from environment variables with defaults; CLI flags override
//! individual fields after loading.
//!
//! # Environment Variables
//!
//! ## esgpulse
//! - `ESGPULSE_LLM_PROVIDER`: genai provider (groq|openai|anthropic|gemini|ollama|...) - default: "groq"
//! - `ESGPULSE_LLM_MODEL`: model name - default: "llama-3.3-70b-versatile"
//! - `ESGPULSE_LLM_ENABLED`: set to false to force rule-based synthesis - default: "true"
//! - `ESGPULSE_LLM_TIMEOUT`: LLM request timeout in seconds - default: "30"
//! - `ESGPULSE_NEWS_BASE_URL`: NewsAPI-compatible endpoint - default: "https://newsapi.org/v2"
//! - `ESGPULSE_NEWS_TIMEOUT`: news request timeout in seconds - default: "10"
//! - `ESGPULSE_NEWS_MIN_INTERVAL_MS`: minimum gap between news requests - default: "1000"
//! - `ESGPULSE_NEWS_MAX_RETRIES`: attempts per news request - default: "3"
//! - `ESGPULSE_NEWS_PAGE_SIZE`: articles requested per lookup - default: "20"
//! - `ESGPULSE_DAYS_BACK`: default news window in days - default: "30"
//! - `ESGPULSE_COMPANIES_PATH`: companies JSON file - default: "data/companies.json"
//! - `ESGPULSE_MODEL_PATH`: risk model artifact - default: "models/esg_risk_model.json"
//! - `ESGPULSE_BIND_ADDR`: HTTP listen address - default: "0.0.0.0:8000"
//! - `ESGPULSE_BATCH_CONCURRENCY`: companies analyzed in parallel - default: "4"
//! - `ESGPULSE_LOG_LEVEL`: logging level - default: "info"
//!
//! ## Credentials
//! - `NEWS_API_KEY`: NewsAPI key; without it no news is fetched
//! - Provider keys are read by genai: `GROQ_API_KEY`, `OPENAI_API_KEY`,
//!   `ANTHROPIC_API_KEY`, `GEMINI_API_KEY`, ...

use genai::adapter::AdapterKind;
use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_LLM_MODEL: &str = "llama-3.3-70b-versatile";
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 30;
const DEFAULT_NEWS_BASE_URL: &str = "https://newsapi.org/v2";
const DEFAULT_NEWS_TIMEOUT_SECS: u64 = 10;
const DEFAULT_NEWS_MIN_INTERVAL_MS: u64 = 1000;
const DEFAULT_NEWS_MAX_RETRIES: u32 = 3;
const DEFAULT_NEWS_PAGE_SIZE: u32 = 20;
const DEFAULT_DAYS_BACK: u32 = 30;
const DEFAULT_COMPANIES_PATH: &str = "data/companies.json";
const DEFAULT_MODEL_PATH: &str = "models/esg_risk_model.json";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_BATCH_CONCURRENCY: usize = 4;
const DEFAULT_LOG_LEVEL: &str = "info";

/// Longest news window accepted anywhere in the service
pub const MAX_DAYS_BACK: u32 = 365;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid provider: {0}. Valid options: groq, openai, anthropic, gemini, ollama, xai, deepseek, cohere")]
    InvalidProvider(String),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

#[derive(Debug, Clone)]
pub struct EsgConfig {
    pub llm_provider: AdapterKind,
    pub llm_model: String,
    /// When false the synthesis stage never calls out, even with credentials
    pub llm_enabled: bool,
    pub llm_timeout_secs: u64,

    pub news_api_key: Option<String>,
    pub news_base_url: String,
    pub news_timeout_secs: u64,
    pub news_min_interval_ms: u64,
    pub news_max_retries: u32,
    pub news_page_size: u32,

    /// News window used when a request does not name one
    pub days_back: u32,

    pub companies_path: PathBuf,
    /// Risk model artifact; a missing file means baseline-only predictions
    pub model_path: Option<PathBuf>,

    pub bind_addr: String,
    pub batch_concurrency: usize,
    pub log_level: String,
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

/// Parses a genai provider name, accepting a couple of common aliases.
pub fn parse_provider(name: &str) -> Result<AdapterKind, ConfigError> {
    match name.trim().to_lowercase().as_str() {
        "groq" => Ok(AdapterKind::Groq),
        "openai" => Ok(AdapterKind::OpenAI),
        "anthropic" | "claude" => Ok(AdapterKind::Anthropic),
        "gemini" => Ok(AdapterKind::Gemini),
        "ollama" => Ok(AdapterKind::Ollama),
        "xai" | "grok" => Ok(AdapterKind::Xai),
        "deepseek" => Ok(AdapterKind::DeepSeek),
        "cohere" => Ok(AdapterKind::Cohere),
        _ => Err(ConfigError::InvalidProvider(name.to_string())),
    }
}

impl Default for EsgConfig {
    fn default() -> Self {
        let llm_provider = env::var("ESGPULSE_LLM_PROVIDER")
            .ok()
            .and_then(|s| parse_provider(&s).ok())
            .unwrap_or(AdapterKind::Groq);

        let llm_model =
            env::var("ESGPULSE_LLM_MODEL").unwrap_or_else(|_| DEFAULT_LLM_MODEL.to_string());

        let news_api_key = env::var("NEWS_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());

        let model_path = match env::var("ESGPULSE_MODEL_PATH") {
            Ok(path) if path.trim().is_empty() => None,
            Ok(path) => Some(PathBuf::from(path)),
            Err(_) => Some(PathBuf::from(DEFAULT_MODEL_PATH)),
        };

        Self {
            llm_provider,
            llm_model,
            llm_enabled: env_parse("ESGPULSE_LLM_ENABLED").unwrap_or(true),
            llm_timeout_secs: env_parse("ESGPULSE_LLM_TIMEOUT").unwrap_or(DEFAULT_LLM_TIMEOUT_SECS),
            news_api_key,
            news_base_url: env::var("ESGPULSE_NEWS_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_NEWS_BASE_URL.to_string()),
            news_timeout_secs: env_parse("ESGPULSE_NEWS_TIMEOUT")
                .unwrap_or(DEFAULT_NEWS_TIMEOUT_SECS),
            news_min_interval_ms: env_parse("ESGPULSE_NEWS_MIN_INTERVAL_MS")
                .unwrap_or(DEFAULT_NEWS_MIN_INTERVAL_MS),
            news_max_retries: env_parse("ESGPULSE_NEWS_MAX_RETRIES")
                .unwrap_or(DEFAULT_NEWS_MAX_RETRIES),
            news_page_size: env_parse("ESGPULSE_NEWS_PAGE_SIZE").unwrap_or(DEFAULT_NEWS_PAGE_SIZE),
            days_back: env_parse("ESGPULSE_DAYS_BACK").unwrap_or(DEFAULT_DAYS_BACK),
            companies_path: env::var("ESGPULSE_COMPANIES_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_COMPANIES_PATH)),
            model_path,
            bind_addr: env::var("ESGPULSE_BIND_ADDR")
                .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            batch_concurrency: env_parse("ESGPULSE_BATCH_CONCURRENCY")
                .unwrap_or(DEFAULT_BATCH_CONCURRENCY),
            log_level: env::var("ESGPULSE_LOG_LEVEL")
                .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
                .to_lowercase(),
        }
    }
}

impl EsgConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm_timeout_secs == 0 || self.llm_timeout_secs > 600 {
            return Err(ConfigError::ValidationFailed(
                "LLM timeout must be between 1 and 600 seconds".to_string(),
            ));
        }
        if self.news_timeout_secs == 0 || self.news_timeout_secs > 120 {
            return Err(ConfigError::ValidationFailed(
                "News timeout must be between 1 and 120 seconds".to_string(),
            ));
        }
        if self.news_max_retries == 0 {
            return Err(ConfigError::ValidationFailed(
                "News retries must allow at least one attempt".to_string(),
            ));
        }
        if self.news_page_size == 0 || self.news_page_size > 100 {
            return Err(ConfigError::ValidationFailed(
                "News page size must be between 1 and 100".to_string(),
            ));
        }
        if self.days_back == 0 || self.days_back > MAX_DAYS_BACK {
            return Err(ConfigError::ValidationFailed(format!(
                "Default days back must be between 1 and {}",
                MAX_DAYS_BACK
            )));
        }
        if self.batch_concurrency == 0 {
            return Err(ConfigError::ValidationFailed(
                "Batch concurrency must be at least 1".to_string(),
            ));
        }
        if self.llm_model.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "LLM model name cannot be empty".to_string(),
            ));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }

    pub fn news_timeout(&self) -> Duration {
        Duration::from_secs(self.news_timeout_secs)
    }

    pub fn news_min_interval(&self) -> Duration {
        Duration::from_millis(self.news_min_interval_ms)
    }

    /// Key/value view for `esgpulse health` output. Secrets are reduced to
    /// whether they are set.
    pub fn to_display_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();

        map.insert("llm_provider".to_string(), self.llm_provider.as_str().to_string());
        map.insert("llm_model".to_string(), self.llm_model.clone());
        map.insert("llm_enabled".to_string(), self.llm_enabled.to_string());
        map.insert(
            "llm_timeout_secs".to_string(),
            self.llm_timeout_secs.to_string(),
        );
        map.insert(
            "news_api_key".to_string(),
            if self.news_api_key.is_some() { "set" } else { "unset" }.to_string(),
        );
        map.insert("news_base_url".to_string(), self.news_base_url.clone());
        map.insert("days_back".to_string(), self.days_back.to_string());
        map.insert(
            "companies_path".to_string(),
            self.companies_path.display().to_string(),
        );
        if let Some(ref path) = self.model_path {
            map.insert("model_path".to_string(), path.display().to_string());
        }
        map.insert("bind_addr".to_string(), self.bind_addr.clone());
        map.insert(
            "batch_concurrency".to_string(),
            self.batch_concurrency.to_string(),
        );
        map.insert("log_level".to_string(), self.log_level.clone());

        map
    }
}

impl fmt::Display for EsgConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "esgpulse Configuration:")?;
        writeln!(
            f,
            "  LLM: {} ({}){}",
            self.llm_provider.as_str(),
            self.llm_model,
            if self.llm_enabled { "" } else { " [disabled]" }
        )?;
        writeln!(f, "  LLM Timeout: {}s", self.llm_timeout_secs)?;
        writeln!(
            f,
            "  News API: {} (key {})",
            self.news_base_url,
            if self.news_api_key.is_some() { "set" } else { "unset" }
        )?;
        writeln!(f, "  Default Window: {} days", self.days_back)?;
        writeln!(f, "  Companies: {}", self.companies_path.display())?;
        match self.model_path {
            Some(ref path) => writeln!(f, "  Model: {}", path.display())?,
            None => writeln!(f, "  Model: none")?,
        }
        writeln!(f, "  Bind Address: {}", self.bind_addr)?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    struct EnvGuard {
        key: String,
        old_value: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &str, value: &str) -> Self {
            let old_value = env::var(key).ok();
            env::set_var(key, value);
            Self {
                key: key.to_string(),
                old_value,
            }
        }

        fn unset(key: &str) -> Self {
            let old_value = env::var(key).ok();
            env::remove_var(key);
            Self {
                key: key.to_string(),
                old_value,
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.old_value {
                Some(v) => env::set_var(&self.key, v),
                None => env::remove_var(&self.key),
            }
        }
    }

    #[test]
    #[serial]
    fn test_default_configuration() {
        let _guards = vec![
            EnvGuard::unset("ESGPULSE_LLM_PROVIDER"),
            EnvGuard::unset("ESGPULSE_LLM_MODEL"),
            EnvGuard::unset("ESGPULSE_MODEL_PATH"),
            EnvGuard::unset("ESGPULSE_DAYS_BACK"),
            EnvGuard::unset("ESGPULSE_LOG_LEVEL"),
            EnvGuard::unset("NEWS_API_KEY"),
        ];

        let config = EsgConfig::default();

        assert_eq!(config.llm_provider, AdapterKind::Groq);
        assert_eq!(config.llm_model, DEFAULT_LLM_MODEL);
        assert!(config.news_api_key.is_none());
        assert_eq!(config.days_back, DEFAULT_DAYS_BACK);
        assert_eq!(config.model_path, Some(PathBuf::from(DEFAULT_MODEL_PATH)));
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_environment_variable_parsing() {
        let _guards = vec![
            EnvGuard::set("ESGPULSE_LLM_PROVIDER", "OpenAI"),
            EnvGuard::set("ESGPULSE_LLM_MODEL", "gpt-4o-mini"),
            EnvGuard::set("ESGPULSE_LLM_ENABLED", "false"),
            EnvGuard::set("ESGPULSE_NEWS_MAX_RETRIES", "5"),
            EnvGuard::set("ESGPULSE_DAYS_BACK", "7"),
            EnvGuard::set("ESGPULSE_MODEL_PATH", ""),
            EnvGuard::set("ESGPULSE_BATCH_CONCURRENCY", "8"),
            EnvGuard::set("ESGPULSE_LOG_LEVEL", "DEBUG"),
            EnvGuard::set("NEWS_API_KEY", "abc123"),
        ];

        let config = EsgConfig::default();

        assert_eq!(config.llm_provider, AdapterKind::OpenAI);
        assert_eq!(config.llm_model, "gpt-4o-mini");
        assert!(!config.llm_enabled);
        assert_eq!(config.news_max_retries, 5);
        assert_eq!(config.days_back, 7);
        assert!(config.model_path.is_none());
        assert_eq!(config.batch_concurrency, 8);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.news_api_key.as_deref(), Some("abc123"));
    }

    #[test]
    #[serial]
    fn test_unparsable_values_fall_back() {
        let _guards = vec![
            EnvGuard::set("ESGPULSE_LLM_PROVIDER", "not-a-provider"),
            EnvGuard::set("ESGPULSE_DAYS_BACK", "forever"),
        ];

        let config = EsgConfig::default();
        assert_eq!(config.llm_provider, AdapterKind::Groq);
        assert_eq!(config.days_back, DEFAULT_DAYS_BACK);
    }

    #[test]
    fn test_parse_provider_aliases() {
        assert_eq!(parse_provider("claude").unwrap(), AdapterKind::Anthropic);
        assert_eq!(parse_provider("GROQ").unwrap(), AdapterKind::Groq);
        assert!(matches!(
            parse_provider("nope"),
            Err(ConfigError::InvalidProvider(_))
        ));
    }

    #[test]
    #[serial]
    fn test_validation_rejects_bad_values() {
        let mut config = EsgConfig::default();
        config.days_back = 400;
        assert!(config.validate().is_err());

        let mut config = EsgConfig::default();
        config.batch_concurrency = 0;
        assert!(config.validate().is_err());

        let mut config = EsgConfig::default();
        config.llm_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = EsgConfig::default();
        config.log_level = "chatty".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_display_hides_secrets() {
        let _guard = EnvGuard::set("NEWS_API_KEY", "super-secret");
        let config = EsgConfig::default();

        let display = format!("{}", config);
        assert!(display.contains("esgpulse Configuration:"));
        assert!(!display.contains("super-secret"));

        let map = config.to_display_map();
        assert_eq!(map.get("news_api_key").map(String::as_str), Some("set"));
    }
}
