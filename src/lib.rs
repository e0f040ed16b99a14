//! digestpipe - Screen Activity Digest Pipeline
//!
//! Periodically pulls a window of recorded screen activity from a local
//! screenpipe instance, asks an LLM for a structured daily log entry and a
//! list of discussion questions, persists the log and delivers the
//! questions by email and to the screenpipe inbox.
//!
//! ## Core Features
//!
//! - **Staged Pipeline**: settings, storage, welcome, fetch, access guard,
//!   summary, questions, notify
//! - **Bounded Retry**: empty or failed activity queries are retried
//! - **Provider Backends**: OpenAI-compatible, native Ollama, screenpipe-cloud
//! - **Trigger Server**: `GET /api/pipeline` with a non-overlapping run gate
//!
//! ## Quick Start
//!
//! ```ignore
//! use digestpipe::{ConfigLoader, Pipeline, RunTrigger};
//!
//! let pipeline = Pipeline::from_config(ConfigLoader::load()?)?;
//! let outcome = pipeline.run(RunTrigger::scheduled()).await;
//! println!("{:?}", outcome.result.status);
//! ```
//!
//! ## Modules
//!
//! - [`ai`]: LLM providers, prompts, summary and question generators
//! - [`source`]: screenpipe activity search client
//! - [`storage`]: daily log files and run state
//! - [`notify`]: email relay and inbox channels
//! - [`pipeline`]: stage orchestration
//! - [`server`]: HTTP trigger and scheduler

pub mod ai;
pub mod cli;
pub mod config;
pub mod constants;
pub mod notify;
pub mod pipeline;
pub mod retry;
pub mod schedule;
pub mod server;
pub mod source;
pub mod storage;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{ChannelFailurePolicy, Config, ConfigLoader, ProviderKind};

// Error Types
pub use types::error::{DigestError, ErrorCategory, ErrorKind, Result, ResultExt};

// =============================================================================
// Pipeline Re-exports
// =============================================================================

pub use pipeline::{
    Pipeline, PipelineDeps, PipelineOutcome, PipelineResult, PipelineStage, RunStatus, RunTrigger,
};
pub use schedule::Schedule;

// =============================================================================
// AI Re-exports
// =============================================================================

pub use ai::{
    LlmProvider, LlmResponse, ProviderParams, QuestionGenerator, SummaryGenerator, TimeoutConfig,
    with_timeout,
};
