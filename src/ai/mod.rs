//! AI Integration Layer
//!
//! LLM providers and the summary/question generators built on them.

pub mod generator;
pub mod json_repair;
pub mod prompt;
pub mod provider;
pub mod timeout;

pub use generator::{
    LlmQuestionGenerator, LlmSummaryGenerator, QuestionGenerator, SharedQuestionGenerator,
    SharedSummaryGenerator, SummaryGenerator,
};
pub use json_repair::{JsonRepairer, extract_json_from_response};
pub use prompt::{PromptBuilder, PromptSection, PromptTemplates};
pub use provider::{
    LlmProvider, LlmResponse, OllamaProvider, OpenAiProvider, ProviderParams, ResponseMetadata,
    ResponseTiming, SharedProvider, TokenUsage, create_provider,
};
pub use timeout::{TimeoutConfig, with_timeout};
