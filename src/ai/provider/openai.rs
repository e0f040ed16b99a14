//! OpenAI-compatible Chat Completions Provider
//!
//! Serves the `openai`, `screenpipe-cloud`, `embedded` and `custom`
//! provider kinds; they differ only in endpoint and credential.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, info};

use super::{
    LlmProvider, LlmResponse, ProviderParams, ResponseMetadata, ResponseTiming, TokenUsage,
    prompt_utils,
};
use crate::ai::json_repair::extract_json_from_response;
use crate::config::ProviderKind;
use crate::types::{DigestError, ErrorCategory, ErrorClassifier, LlmError, Result};

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const EMBEDDED_API_BASE: &str = "http://localhost:11438/v1";
const DEFAULT_MODEL: &str = "gpt-4o";

const SYSTEM_PROMPT: &str = "You are a helpful assistant that analyzes screen activity.";

/// OpenAI-compatible provider with secure credential handling
pub struct OpenAiProvider {
    kind: ProviderKind,
    /// Bearer credential - never exposed in logs or debug output
    credential: Option<SecretString>,
    api_base: String,
    model: String,
    temperature: f32,
    max_tokens: usize,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("kind", &self.kind)
            .field("credential", &self.credential.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl OpenAiProvider {
    pub fn new(params: &ProviderParams) -> Result<Self> {
        let api_base = match (&params.api_base, params.kind) {
            (Some(base), _) => base.trim_end_matches('/').to_string(),
            (None, ProviderKind::Embedded) => EMBEDDED_API_BASE.to_string(),
            (None, kind) if kind.requires_url() => {
                return Err(DigestError::Config(format!(
                    "AI provider '{}' requires ai.url",
                    kind
                )));
            }
            (None, _) => OPENAI_API_BASE.to_string(),
        };

        // screenpipe-cloud authenticates with the user token, others with the API key
        let credential = match params.kind {
            ProviderKind::ScreenpipeCloud => params.user_token.clone(),
            _ => params
                .api_key
                .clone()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok()),
        }
        .map(SecretString::from);

        if params.kind == ProviderKind::OpenAi && credential.is_none() {
            return Err(DigestError::Config(
                "OpenAI API key not found. Set OPENAI_API_KEY env var or provide ai.api_key"
                    .to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(params.timeout)
            .build()
            .map_err(|e| DigestError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            kind: params.kind,
            credential,
            api_base,
            model: params
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: params.temperature,
            max_tokens: params.max_tokens,
            client,
        })
    }

    fn build_request(&self, prompt: &str, schema: &Value) -> ChatCompletionRequest {
        let json_mode = !schema.is_null();

        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt_utils::build_schema_prompt(prompt, schema),
                },
            ],
            temperature: self.temperature,
            max_tokens: Some(self.max_tokens),
            response_format: json_mode.then(|| ResponseFormat {
                format_type: "json_object".to_string(),
            }),
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn generate(&self, prompt: &str, schema: &Value) -> Result<LlmResponse> {
        info!(
            "Generating with {} (model: {}, temperature: {})",
            self.kind, self.model, self.temperature
        );

        let start_time = Instant::now();
        let request = self.build_request(prompt, schema);
        let url = format!("{}/chat/completions", self.api_base);

        let mut builder = self.client.post(&url).json(&request);
        if let Some(credential) = &self.credential {
            builder = builder.bearer_auth(credential.expose_secret());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ErrorClassifier::classify_transport(&e, self.name()))?;

        let elapsed = start_time.elapsed();

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ErrorClassifier::classify_http_status(
                status.as_u16(),
                &format!("API error ({}): {}", status, body),
                self.name(),
            )
            .into());
        }

        let response_body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ErrorClassifier::classify_transport(&e, self.name()))?;

        let usage = response_body
            .usage
            .map(|u| TokenUsage::from_openai(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        let content_str = response_body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                LlmError::with_provider(ErrorCategory::ParseError, "No content in response", self.name())
            })?;

        debug!(chars = content_str.len(), "Received completion");
        let content = if schema.is_null() {
            Value::String(content_str)
        } else {
            extract_json_from_response(&content_str)?
        };

        Ok(LlmResponse {
            content,
            usage,
            timing: ResponseTiming::from_duration(elapsed),
            metadata: ResponseMetadata {
                model: self.model.clone(),
                provider: self.name().to_string(),
            },
        })
    }

    fn name(&self) -> &str {
        self.kind.as_str()
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    usage: Option<UsageInfo>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageInfo {
    prompt_tokens: u32,
    completion_tokens: u32,
}
