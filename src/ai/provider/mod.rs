//! LLM Provider Abstraction
//!
//! Defines the LlmProvider trait used by the summary and question
//! generators. A JSON schema requests structured output; `Value::Null`
//! requests plain text, returned as `Value::String`.

mod ollama;
mod openai;
mod prompt_utils;

pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{AiConfig, ProviderKind};
use crate::types::Result;

// =============================================================================
// LLM Response
// =============================================================================

#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// Generated content (JSON value, or a string for text requests)
    pub content: Value,
    pub usage: TokenUsage,
    pub timing: ResponseTiming,
    pub metadata: ResponseMetadata,
}

impl LlmResponse {
    /// Create response with content only (usage unknown)
    pub fn content_only(content: Value) -> Self {
        Self {
            content,
            usage: TokenUsage::default(),
            timing: ResponseTiming::default(),
            metadata: ResponseMetadata::default(),
        }
    }

    /// Content as text, whatever shape the provider returned
    pub fn text(&self) -> String {
        match &self.content {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

/// Token usage metrics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl TokenUsage {
    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }

    /// Create from OpenAI-style usage response
    pub fn from_openai(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            input_tokens: prompt_tokens,
            output_tokens: completion_tokens,
        }
    }

    /// Create from Ollama-style usage response
    pub fn from_ollama(prompt_eval_count: u32, eval_count: u32) -> Self {
        Self {
            input_tokens: prompt_eval_count,
            output_tokens: eval_count,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResponseTiming {
    pub total_ms: u64,
}

impl ResponseTiming {
    pub fn from_duration(duration: Duration) -> Self {
        Self {
            total_ms: duration.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResponseMetadata {
    pub model: String,
    pub provider: String,
}

pub type SharedProvider = Arc<dyn LlmProvider + Send + Sync>;

// =============================================================================
// Provider Parameters
// =============================================================================

/// Everything needed to reach the configured model.
///
/// Credentials are redacted in debug output and converted to `SecretString`
/// by each provider.
#[derive(Clone)]
pub struct ProviderParams {
    pub kind: ProviderKind,
    pub model: Option<String>,
    pub api_base: Option<String>,
    pub api_key: Option<String>,
    pub user_token: Option<String>,
    pub temperature: f32,
    pub timeout: Duration,
    pub max_tokens: usize,
}

impl std::fmt::Debug for ProviderParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderParams")
            .field("kind", &self.kind)
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("user_token", &self.user_token.as_ref().map(|_| "[REDACTED]"))
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl From<&AiConfig> for ProviderParams {
    fn from(config: &AiConfig) -> Self {
        let non_empty = |v: &Option<String>| v.clone().filter(|s| !s.trim().is_empty());
        Self {
            kind: config.provider,
            model: non_empty(&config.model),
            api_base: non_empty(&config.url),
            api_key: non_empty(&config.api_key),
            user_token: non_empty(&config.user_token),
            temperature: config.temperature,
            timeout: Duration::from_secs(config.timeout_secs),
            max_tokens: config.max_tokens,
        }
    }
}

impl ProviderParams {
    pub fn has_user_token(&self) -> bool {
        self.user_token.is_some()
    }
}

// =============================================================================
// LLM Provider Trait
// =============================================================================

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate output. `schema` null = plain text, otherwise JSON.
    async fn generate(&self, prompt: &str, schema: &Value) -> Result<LlmResponse>;

    /// Provider name for logging
    fn name(&self) -> &str;

    /// Model name currently in use
    fn model(&self) -> &str;
}

/// Create a shared provider from parameters
pub fn create_provider(params: &ProviderParams) -> Result<SharedProvider> {
    match params.kind {
        ProviderKind::NativeOllama => Ok(Arc::new(OllamaProvider::new(params)?)),
        ProviderKind::OpenAi
        | ProviderKind::ScreenpipeCloud
        | ProviderKind::Embedded
        | ProviderKind::Custom => Ok(Arc::new(OpenAiProvider::new(params)?)),
    }
}

#[cfg(test)]
pub(crate) fn test_params(kind: ProviderKind, api_base: &str) -> ProviderParams {
    ProviderParams {
        kind,
        model: Some("test-model".to_string()),
        api_base: Some(api_base.to_string()),
        api_key: Some("sk-test".to_string()),
        user_token: None,
        temperature: 0.0,
        timeout: Duration::from_secs(5),
        max_tokens: 512,
    }
}
