//! LLM client abstraction layer
//!
//! The synthesis stage only sees `dyn LLMClient`; the genai client talks to
//! real providers and the mock client scripts answers for tests.

mod client;
mod genai;
mod mock;
mod selector;
mod types;

pub use client::LLMClient;
pub use self::genai::GenAIClient;
pub use mock::{MockLLMClient, MockResponse};
pub use selector::{provider_has_credentials, select_llm_client};
pub use types::{ChatMessage, LLMRequest, LLMResponse, MessageRole};
