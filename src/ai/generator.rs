//! Summary and question generation
//!
//! The pipeline depends on the two traits only; the LLM-backed
//! implementations build a provider per call from `ProviderParams`.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument};

use super::prompt::PromptTemplates;
use super::provider::{ProviderParams, SharedProvider, create_provider};
use super::timeout::with_timeout;
use crate::types::{ActivityRecord, DailyLogEntry, DigestError, Result};

/// Turns an activity batch into a structured daily-log entry
#[async_trait]
pub trait SummaryGenerator: Send + Sync {
    async fn generate(
        &self,
        records: &[ActivityRecord],
        prompt_template: &str,
        params: &ProviderParams,
    ) -> Result<DailyLogEntry>;
}

/// Turns an activity batch into a free-text list of discussion questions
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    async fn generate(
        &self,
        records: &[ActivityRecord],
        prompt_template: &str,
        params: &ProviderParams,
    ) -> Result<String>;
}

pub type SharedSummaryGenerator = Arc<dyn SummaryGenerator>;
pub type SharedQuestionGenerator = Arc<dyn QuestionGenerator>;

// =============================================================================
// LLM-backed implementations
// =============================================================================

/// Provider factory, swappable in tests
type ProviderFactory = fn(&ProviderParams) -> Result<SharedProvider>;

#[derive(Clone)]
pub struct LlmSummaryGenerator {
    factory: ProviderFactory,
}

impl Default for LlmSummaryGenerator {
    fn default() -> Self {
        Self {
            factory: create_provider,
        }
    }
}

impl LlmSummaryGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SummaryGenerator for LlmSummaryGenerator {
    #[instrument(skip_all, fields(records = records.len(), provider = %params.kind))]
    async fn generate(
        &self,
        records: &[ActivityRecord],
        prompt_template: &str,
        params: &ProviderParams,
    ) -> Result<DailyLogEntry> {
        let provider = (self.factory)(params)?;
        let prompt = PromptTemplates::daily_log(prompt_template, records);
        let schema = PromptTemplates::daily_log_schema();

        let response = with_timeout(
            params.timeout,
            provider.generate(&prompt, &schema),
            "daily log generation",
        )
        .await?;

        debug!(
            tokens = response.usage.total(),
            elapsed_ms = response.timing.total_ms,
            "Daily log generated"
        );

        if !response.content.is_object() {
            return Err(DigestError::generation(
                "summary",
                format!("expected a JSON object, got: {}", response.content),
            ));
        }

        DailyLogEntry::from_value(response.content)
            .map_err(|e| DigestError::generation("summary", e.to_string()))
    }
}

#[derive(Clone)]
pub struct LlmQuestionGenerator {
    factory: ProviderFactory,
}

impl Default for LlmQuestionGenerator {
    fn default() -> Self {
        Self {
            factory: create_provider,
        }
    }
}

impl LlmQuestionGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuestionGenerator for LlmQuestionGenerator {
    #[instrument(skip_all, fields(records = records.len(), provider = %params.kind))]
    async fn generate(
        &self,
        records: &[ActivityRecord],
        prompt_template: &str,
        params: &ProviderParams,
    ) -> Result<String> {
        let provider = (self.factory)(params)?;
        let prompt = PromptTemplates::questions(prompt_template, records);

        let response = with_timeout(
            params.timeout,
            provider.generate(&prompt, &Value::Null),
            "question generation",
        )
        .await?;

        // blank answers are not an error; delivery is skipped downstream
        Ok(response.text().trim().to_string())
    }
}
