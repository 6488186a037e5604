//! `genai`-backed LLM client
//!
//! One client type covers every provider genai supports (Groq, OpenAI,
//! Anthropic, Gemini, Ollama, ...). Credentials are read by genai from the
//! provider's standard environment variable. `ESGPULSE_LLM_BASE_URL` points
//! the client at an OpenAI-compatible proxy instead of the provider default.

use super::client::LLMClient;
use super::types::{ChatMessage, LLMRequest, LLMResponse, MessageRole};
use crate::error::BackendError;
use async_trait::async_trait;
use genai::adapter::AdapterKind;
use genai::chat::{ChatMessage as GenAIChatMessage, ChatOptions, ChatRequest as GenAIChatRequest};
use genai::resolver::{AuthData, Endpoint, ServiceTargetResolver};
use genai::{Client, ModelIden, ServiceTarget};
use std::time::{Duration, Instant};
use tracing::{debug, error};

pub struct GenAIClient {
    client: Client,
    model: String,
    provider: AdapterKind,
    timeout: Duration,
}

impl GenAIClient {
    pub fn new(provider: AdapterKind, model: impl Into<String>, timeout: Duration) -> Self {
        let model = model.into();
        let client = match std::env::var("ESGPULSE_LLM_BASE_URL") {
            Ok(endpoint_url) if !endpoint_url.trim().is_empty() => {
                debug!(
                    provider = provider.as_str(),
                    endpoint = %endpoint_url,
                    "Using custom LLM endpoint"
                );
                Self::client_for_endpoint(provider, model.clone(), endpoint_url)
            }
            _ => Client::default(),
        };

        debug!(
            provider = provider.as_str(),
            model = %model,
            timeout_secs = timeout.as_secs(),
            "Created GenAI client"
        );

        Self {
            client,
            model,
            provider,
            timeout,
        }
    }

    fn client_for_endpoint(provider: AdapterKind, model: String, endpoint_url: String) -> Client {
        let resolver = ServiceTargetResolver::from_resolver_fn(
            move |_target: ServiceTarget| -> Result<ServiceTarget, genai::resolver::Error> {
                let auth = match provider.default_key_env_name() {
                    Some(key_var) => AuthData::from_env(key_var),
                    None => AuthData::from_single(""),
                };

                Ok(ServiceTarget {
                    endpoint: Endpoint::from_owned(endpoint_url.clone()),
                    auth,
                    model: ModelIden::new(provider, &model),
                })
            },
        );

        Client::builder()
            .with_service_target_resolver(resolver)
            .build()
    }

    fn convert_message(msg: &ChatMessage) -> GenAIChatMessage {
        match msg.role {
            MessageRole::System => GenAIChatMessage::system(msg.content.as_str()),
            MessageRole::User => GenAIChatMessage::user(msg.content.as_str()),
            MessageRole::Assistant => GenAIChatMessage::assistant(msg.content.as_str()),
        }
    }
}

#[async_trait]
impl LLMClient for GenAIClient {
    async fn chat(&self, request: LLMRequest) -> Result<LLMResponse, BackendError> {
        let start = Instant::now();

        let messages: Vec<GenAIChatMessage> =
            request.messages.iter().map(Self::convert_message).collect();
        let genai_request = GenAIChatRequest::new(messages);

        let mut options = ChatOptions::default();
        if let Some(temp) = request.temperature {
            options = options.with_temperature(temp as f64);
        }
        if let Some(max_tokens) = request.max_tokens {
            options = options.with_max_tokens(max_tokens);
        }

        let response = match tokio::time::timeout(
            self.timeout,
            self.client
                .exec_chat(&self.model, genai_request, Some(&options)),
        )
        .await
        {
            Ok(Ok(resp)) => resp,
            Ok(Err(e)) => {
                error!(provider = self.provider.as_str(), error = %e, "LLM request failed");
                return Err(BackendError::ApiError {
                    message: format!("{} request failed: {}", self.provider.as_str(), e),
                    status_code: None,
                });
            }
            Err(_) => {
                error!(
                    provider = self.provider.as_str(),
                    timeout_secs = self.timeout.as_secs(),
                    "LLM request timed out"
                );
                return Err(BackendError::TimeoutError {
                    seconds: self.timeout.as_secs(),
                });
            }
        };

        let content = response.first_text().unwrap_or_default().to_string();

        Ok(LLMResponse::text(content, start.elapsed()))
    }

    fn name(&self) -> &str {
        self.provider.as_str()
    }

    fn model_info(&self) -> Option<String> {
        Some(self.model.clone())
    }
}

impl std::fmt::Debug for GenAIClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenAIClient")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}
