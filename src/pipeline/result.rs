//! Run result types

use serde::Serialize;
use std::path::PathBuf;

use super::stage::PipelineStage;
use crate::constants::pipeline::{EMPTY_WINDOW_MESSAGE, SUCCESS_MESSAGE};
use crate::notify::NotificationReport;
use crate::types::{DailyLogEntry, DigestError, ErrorKind, RunId, RunState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunStatus {
    Success,
    EmptyWindow,
    Error,
}

/// Aggregate result of one run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<DailyLogEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub questions: Option<String>,
    pub notifications: NotificationReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Stage that aborted the run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_stage: Option<PipelineStage>,
    #[serde(skip)]
    pub error_kind: Option<ErrorKind>,
}

impl PipelineResult {
    pub fn success(
        summary: DailyLogEntry,
        log_path: PathBuf,
        questions: String,
        notifications: NotificationReport,
    ) -> Self {
        Self {
            status: RunStatus::Success,
            message: Some(SUCCESS_MESSAGE.to_string()),
            summary: Some(summary),
            log_path: Some(log_path),
            questions: Some(questions),
            notifications,
            error: None,
            failed_stage: None,
            error_kind: None,
        }
    }

    pub fn empty_window() -> Self {
        Self {
            status: RunStatus::EmptyWindow,
            message: Some(EMPTY_WINDOW_MESSAGE.to_string()),
            summary: None,
            log_path: None,
            questions: None,
            notifications: NotificationReport::default(),
            error: None,
            failed_stage: None,
            error_kind: None,
        }
    }

    pub fn failed(abort: StageAbort) -> Self {
        Self {
            status: RunStatus::Error,
            message: None,
            summary: None,
            log_path: None,
            questions: None,
            notifications: abort.notifications.unwrap_or_default(),
            error: Some(abort.message),
            failed_stage: Some(abort.stage),
            error_kind: Some(abort.kind),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }
}

/// Everything a run produced, including the run state to hand back
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub run_id: RunId,
    pub result: PipelineResult,
    pub state: RunState,
}

/// Terminal failure of one stage
#[derive(Debug, Clone)]
pub struct StageAbort {
    pub stage: PipelineStage,
    pub kind: ErrorKind,
    pub message: String,
    pub notifications: Option<NotificationReport>,
}

impl StageAbort {
    pub fn new(stage: PipelineStage, err: &DigestError) -> Self {
        Self {
            stage,
            kind: err.kind(),
            message: err.to_string(),
            notifications: None,
        }
    }

    /// Use a caller-facing message instead of the error's display text
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_notifications(mut self, report: NotificationReport) -> Self {
        self.notifications = Some(report);
        self
    }
}
