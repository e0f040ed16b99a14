//! Digest Pipeline
//!
//! One run pulls a window of screen activity, turns it into a daily log
//! entry and a list of discussion questions, persists the log and fans the
//! questions out to the notification channels.
//!
//! ```text
//! Settings → Storage → Welcome → Fetch (retry) → Access Guard
//!                                                    ↓
//!                     Notify ← Questions ← Summary (persist)
//! ```
//!
//! Stages run strictly in order. Configuration, storage, exhausted fetch,
//! access and generation failures end the run with `status: error`; an
//! empty window ends it with `status: empty-window`. Notification failures
//! follow [`ChannelFailurePolicy`].

mod result;
mod settings;
mod stage;
mod welcome;

pub use result::{PipelineOutcome, PipelineResult, RunStatus, StageAbort};
pub use settings::{EmailTarget, RunSettings};
pub use stage::PipelineStage;
pub use welcome::welcome_body;

use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Span, error, info, instrument, warn};

use crate::ai::{
    LlmQuestionGenerator, LlmSummaryGenerator, SharedQuestionGenerator, SharedSummaryGenerator,
    TimeoutConfig, with_timeout,
};
use crate::config::{ChannelFailurePolicy, Config};
use crate::constants::pipeline::{QUESTIONS_TITLE, WELCOME_SUBJECT};
use crate::notify::{
    EmailMessage, InboxMessage, MailRelayClient, NotificationReport, NotificationResult,
    ScreenpipeInbox, SharedEmailChannel, SharedInboxChannel,
};
use crate::retry::{RetryPolicy, retry};
use crate::source::{ScreenpipeClient, SharedSource};
use crate::storage::{FileLogStore, FileRunStateStore, SharedLogSink, SharedRunStateStore};
use crate::types::{DigestError, Result, RunId, RunState};

const NO_ACCESS_MESSAGE: &str = "seems like you don't have screenpipe-cloud access :(";

/// What started the run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunTrigger {
    /// Started from the UI; the questions email is not sent
    pub user_triggered: bool,
}

impl RunTrigger {
    pub fn scheduled() -> Self {
        Self {
            user_triggered: false,
        }
    }

    pub fn user() -> Self {
        Self {
            user_triggered: true,
        }
    }
}

/// External collaborators of a run
#[derive(Clone)]
pub struct PipelineDeps {
    pub source: SharedSource,
    pub summary: SharedSummaryGenerator,
    pub questions: SharedQuestionGenerator,
    pub email: SharedEmailChannel,
    pub inbox: SharedInboxChannel,
    pub run_state: SharedRunStateStore,
    pub logs: SharedLogSink,
}

impl PipelineDeps {
    /// Production collaborators for `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        let root = config
            .storage
            .root
            .as_deref()
            .ok_or_else(|| DigestError::Config("storage.root is not set".to_string()))?;

        Ok(Self {
            source: Arc::new(ScreenpipeClient::new(&config.source)?),
            summary: Arc::new(LlmSummaryGenerator::new()),
            questions: Arc::new(LlmQuestionGenerator::new()),
            email: Arc::new(MailRelayClient::new(&config.mail)?),
            inbox: Arc::new(ScreenpipeInbox::new(&config.inbox)?),
            run_state: Arc::new(FileRunStateStore::in_root(root)),
            logs: Arc::new(FileLogStore::in_root(root)),
        })
    }
}

/// Pipeline orchestrator
pub struct Pipeline {
    config: Config,
    deps: PipelineDeps,
    retry: RetryPolicy,
    timeouts: TimeoutConfig,
}

impl Pipeline {
    pub fn new(config: Config, deps: PipelineDeps) -> Self {
        let retry = RetryPolicy::new(
            config.pipeline.fetch_attempts,
            Duration::from_millis(config.pipeline.fetch_delay_ms),
        );
        let timeouts = TimeoutConfig::from_config(&config);
        Self {
            config,
            deps,
            retry,
            timeouts,
        }
    }

    /// Pipeline wired to the production collaborators
    pub fn from_config(config: Config) -> Result<Self> {
        let deps = PipelineDeps::from_config(&config)?;
        Ok(Self::new(config, deps))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run once with the window ending now
    pub async fn run(&self, trigger: RunTrigger) -> PipelineOutcome {
        self.run_at(trigger, Utc::now()).await
    }

    /// Run once with the window ending at `now`
    #[instrument(
        name = "pipeline_run",
        skip(self),
        fields(run_id = tracing::field::Empty, user_triggered = trigger.user_triggered)
    )]
    pub async fn run_at(&self, trigger: RunTrigger, now: DateTime<Utc>) -> PipelineOutcome {
        let run_id = RunId::new();
        Span::current().record("run_id", run_id.as_str());

        let mut state = RunState::default();
        let result = match self.execute(trigger, now, &mut state).await {
            Ok(result) => {
                info!(status = ?result.status, "Pipeline run finished");
                result
            }
            Err(abort) => {
                error!(
                    stage = abort.stage.name(),
                    kind = %abort.kind,
                    error = %abort.message,
                    "Pipeline run aborted"
                );
                PipelineResult::failed(abort)
            }
        };

        PipelineOutcome {
            run_id,
            result,
            state,
        }
    }

    async fn execute(
        &self,
        trigger: RunTrigger,
        now: DateTime<Utc>,
        state: &mut RunState,
    ) -> std::result::Result<PipelineResult, StageAbort> {
        // =====================================================================
        // Stage 1: Settings
        // =====================================================================
        let settings = RunSettings::resolve(&self.config)
            .map_err(|e| StageAbort::new(PipelineStage::Settings, &e))?;

        // =====================================================================
        // Stage 2: Storage
        // =====================================================================
        let storage_abort = |e: DigestError| StageAbort::new(PipelineStage::Storage, &e);
        self.deps.logs.ensure().await.map_err(storage_abort)?;
        *state = self.deps.run_state.load().await.map_err(storage_abort)?;

        // =====================================================================
        // Stage 3: Welcome
        // =====================================================================
        if let Some(target) = &settings.email {
            self.welcome(target, &settings, state).await?;
        }

        // =====================================================================
        // Stage 4: Fetch
        // =====================================================================
        let window = settings
            .window(now)
            .map_err(|e| StageAbort::new(PipelineStage::Settings, &e))?;
        info!(
            stage = PipelineStage::Fetch.name(),
            start = %window.start_time,
            end = %window.end_time,
            "Querying activity window"
        );

        let source = &self.deps.source;
        let window_ref = &window;
        let fetch_timeout = self.timeouts.fetch;
        let fetched = retry(self.retry, move || {
            with_timeout(fetch_timeout, source.query(window_ref), "activity query")
        })
        .await
        .map_err(|e| StageAbort::new(PipelineStage::Fetch, &e))?;

        let Some(batch) = fetched else {
            info!("Activity window is empty");
            return Ok(PipelineResult::empty_window());
        };
        info!(records = batch.len(), "Activity window fetched");

        // =====================================================================
        // Stage 5: Access Guard
        // =====================================================================
        if settings.provider.kind.requires_user_token() && !settings.provider.has_user_token() {
            let err = DigestError::AccessPrecondition(NO_ACCESS_MESSAGE.to_string());
            return Err(StageAbort::new(PipelineStage::AccessGuard, &err));
        }

        // =====================================================================
        // Stage 6: Summary
        // =====================================================================
        let summary_abort = |e: DigestError| StageAbort::new(PipelineStage::Summary, &e);
        let entry = self
            .deps
            .summary
            .generate(batch.records(), &settings.dailylog_prompt, &settings.provider)
            .await
            .map_err(summary_abort)?;
        let log_path = self
            .deps
            .logs
            .persist(&entry, now)
            .await
            .map_err(summary_abort)?;
        info!(
            stage = PipelineStage::Summary.name(),
            category = %entry.category,
            tags = ?entry.tags(),
            "Daily log persisted"
        );

        // =====================================================================
        // Stage 7: Questions
        // =====================================================================
        let questions = self
            .deps
            .questions
            .generate(batch.records(), &settings.custom_prompt, &settings.provider)
            .await
            .map_err(|e| StageAbort::new(PipelineStage::Questions, &e))?;
        if questions.trim().is_empty() {
            warn!(
                stage = PipelineStage::Questions.name(),
                "Model returned no questions, skipping delivery"
            );
        } else {
            info!(
                stage = PipelineStage::Questions.name(),
                chars = questions.len(),
                "Questions generated"
            );
        }

        // =====================================================================
        // Stage 8: Notify
        // =====================================================================
        let notifications = self.notify(&settings, trigger, &questions).await?;

        Ok(PipelineResult::success(
            entry,
            log_path,
            questions,
            notifications,
        ))
    }

    /// One-time welcome email. Persists the flag on every attempt.
    async fn welcome(
        &self,
        target: &EmailTarget,
        settings: &RunSettings,
        state: &mut RunState,
    ) -> std::result::Result<(), StageAbort> {
        if state.welcome_message_sent {
            return Ok(());
        }

        let cap = self.config.pipeline.welcome_max_failures;
        if cap > 0 && state.welcome_failures >= cap {
            warn!(
                failures = state.welcome_failures,
                "Welcome email failed too often, skipping"
            );
            return Ok(());
        }

        let message = EmailMessage::new(
            target.address.clone(),
            target.password.expose_secret(),
            WELCOME_SUBJECT,
            welcome_body(&settings.schedule),
        );
        let sent = with_timeout(
            self.timeouts.notification,
            self.deps.email.send(&message),
            "welcome email",
        )
        .await;

        match sent {
            Ok(()) => {
                state.mark_welcome_sent();
                self.deps
                    .run_state
                    .save(state)
                    .await
                    .map_err(|e| StageAbort::new(PipelineStage::Storage, &e))?;
                info!(stage = PipelineStage::Welcome.name(), "Welcome email sent");
                Ok(())
            }
            Err(err) => {
                state.mark_welcome_failed();
                if let Err(save_err) = self.deps.run_state.save(state).await {
                    warn!(error = %save_err, "Could not persist welcome failure");
                }
                Err(StageAbort::new(PipelineStage::Welcome, &err)
                    .with_message(format!("Error in sending welcome email: {}", err)))
            }
        }
    }

    async fn notify(
        &self,
        settings: &RunSettings,
        trigger: RunTrigger,
        questions: &str,
    ) -> std::result::Result<NotificationReport, StageAbort> {
        let policy = self.config.pipeline.channel_failure_policy;
        let has_questions = !questions.trim().is_empty();
        let mut report = NotificationReport::default();

        report.email = match &settings.email {
            None => NotificationResult::Skipped("email not configured".to_string()),
            Some(_) if trigger.user_triggered => {
                NotificationResult::Skipped("user triggered".to_string())
            }
            Some(_) if !has_questions => NotificationResult::Skipped("no questions".to_string()),
            Some(target) => {
                let message = EmailMessage::new(
                    target.address.clone(),
                    target.password.expose_secret(),
                    QUESTIONS_TITLE,
                    questions,
                );
                let sent = with_timeout(
                    self.timeouts.notification,
                    self.deps.email.send(&message),
                    "questions email",
                )
                .await;
                self.channel_outcome(sent, policy, "error in sending mail", &report)?
            }
        };

        report.inbox = if has_questions {
            let message = InboxMessage {
                title: QUESTIONS_TITLE.to_string(),
                body: questions.to_string(),
            };
            let sent = with_timeout(
                self.timeouts.notification,
                self.deps.inbox.send(&message),
                "inbox notification",
            )
            .await;
            self.channel_outcome(sent, policy, "error in sending inbox notification", &report)?
        } else {
            NotificationResult::Skipped("no questions".to_string())
        };

        info!(
            stage = PipelineStage::Notify.name(),
            email = ?report.email,
            inbox = ?report.inbox,
            "Notifications dispatched"
        );
        Ok(report)
    }

    fn channel_outcome(
        &self,
        sent: Result<()>,
        policy: ChannelFailurePolicy,
        fatal_prefix: &str,
        report: &NotificationReport,
    ) -> std::result::Result<NotificationResult, StageAbort> {
        match sent {
            Ok(()) => Ok(NotificationResult::Sent),
            Err(err) => match policy {
                ChannelFailurePolicy::Fatal => Err(StageAbort::new(PipelineStage::Notify, &err)
                    .with_message(format!("{} {}", fatal_prefix, err))
                    .with_notifications(report.clone())),
                ChannelFailurePolicy::Isolated => {
                    warn!(error = %err, "Notification channel failed");
                    Ok(NotificationResult::Failed(err.to_string()))
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{ProviderParams, QuestionGenerator, SummaryGenerator};
    use crate::config::ProviderKind;
    use crate::notify::{EmailChannel, InboxChannel};
    use crate::source::ActivitySource;
    use crate::storage::{LogSink, MemoryLogSink, MemoryRunStateStore, RunStateStore};
    use crate::types::{ActivityBatch, ActivityRecord, DailyLogEntry, ErrorKind, RunWindow};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use serde_json::json;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    // =========================================================================
    // Fakes
    // =========================================================================

    #[derive(Default)]
    struct FakeSource {
        mode: SourceMode,
        calls: AtomicUsize,
        windows: Mutex<Vec<RunWindow>>,
    }

    #[derive(Default, Clone, Copy)]
    enum SourceMode {
        #[default]
        Data,
        Empty,
        Failing,
    }

    impl FakeSource {
        fn with(mode: SourceMode) -> Self {
            Self {
                mode,
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl ActivitySource for FakeSource {
        async fn query(&self, window: &RunWindow) -> Result<ActivityBatch> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.windows.lock().await.push(window.clone());
            match self.mode {
                SourceMode::Data => Ok(ActivityBatch::new(vec![ActivityRecord::new(
                    json!({"content": {"text": "debugging a borrow checker error"}}),
                )])),
                SourceMode::Empty => Ok(ActivityBatch::default()),
                SourceMode::Failing => {
                    Err(DigestError::TransientFetch("connection refused".into()))
                }
            }
        }
    }

    #[derive(Default)]
    struct FakeSummary {
        fail: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SummaryGenerator for FakeSummary {
        async fn generate(
            &self,
            _records: &[ActivityRecord],
            _prompt: &str,
            _params: &ProviderParams,
        ) -> Result<DailyLogEntry> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(DigestError::generation("summary", "model unavailable"));
            }
            Ok(DailyLogEntry::new("coding").with_field("activity", json!("fixing lifetimes")))
        }
    }

    #[derive(Default)]
    struct FakeQuestions {
        /// Answer with nothing
        blank: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl QuestionGenerator for FakeQuestions {
        async fn generate(
            &self,
            _records: &[ActivityRecord],
            _prompt: &str,
            _params: &ProviderParams,
        ) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.blank {
                return Ok(String::new());
            }
            Ok("- r/rust: why does this borrow outlive the scope?".to_string())
        }
    }

    #[derive(Default)]
    struct FakeEmail {
        /// Subjects that fail to send
        failing: Vec<&'static str>,
        sent: Mutex<Vec<(String, String)>>,
    }

    impl FakeEmail {
        fn failing(subjects: &[&'static str]) -> Self {
            Self {
                failing: subjects.to_vec(),
                ..Default::default()
            }
        }

        async fn subjects(&self) -> Vec<String> {
            self.sent.lock().await.iter().map(|(s, _)| s.clone()).collect()
        }
    }

    #[async_trait]
    impl EmailChannel for FakeEmail {
        async fn send(&self, message: &EmailMessage) -> Result<()> {
            if self.failing.iter().any(|s| *s == message.subject) {
                return Err(DigestError::notification("email", "smtp refused"));
            }
            self.sent
                .lock()
                .await
                .push((message.subject.clone(), message.body.clone()));
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeInbox {
        fail: bool,
        sent: Mutex<Vec<InboxMessage>>,
    }

    #[async_trait]
    impl InboxChannel for FakeInbox {
        async fn send(&self, message: &InboxMessage) -> Result<()> {
            if self.fail {
                return Err(DigestError::notification("inbox", "inbox offline"));
            }
            self.sent.lock().await.push(message.clone());
            Ok(())
        }
    }

    struct BrokenLogs;

    #[async_trait]
    impl LogSink for BrokenLogs {
        async fn ensure(&self) -> Result<()> {
            Err(DigestError::Storage("read-only filesystem".into()))
        }

        async fn persist(&self, _entry: &DailyLogEntry, _at: DateTime<Utc>) -> Result<PathBuf> {
            unreachable!("persist after failed ensure")
        }
    }

    // =========================================================================
    // Harness
    // =========================================================================

    struct Harness {
        source: Arc<FakeSource>,
        summary: Arc<FakeSummary>,
        questions: Arc<FakeQuestions>,
        email: Arc<FakeEmail>,
        inbox: Arc<FakeInbox>,
        state: Arc<MemoryRunStateStore>,
        logs: Arc<MemoryLogSink>,
        config: Config,
    }

    impl Harness {
        fn new() -> Self {
            let mut config = Config::default();
            config.pipe.interval_secs = 3600;
            config.storage.root = Some(PathBuf::from("/unused"));
            Self {
                source: Arc::new(FakeSource::default()),
                summary: Arc::new(FakeSummary::default()),
                questions: Arc::new(FakeQuestions::default()),
                email: Arc::new(FakeEmail::default()),
                inbox: Arc::new(FakeInbox::default()),
                state: Arc::new(MemoryRunStateStore::default()),
                logs: Arc::new(MemoryLogSink::default()),
                config,
            }
        }

        fn with_email(mut self) -> Self {
            self.config.pipe.email_address = Some("me@example.com".into());
            self.config.pipe.email_password = Some("app-password".into());
            self
        }

        fn welcomed(mut self) -> Self {
            let mut state = RunState::default();
            state.mark_welcome_sent();
            self.state = Arc::new(MemoryRunStateStore::new(state));
            self
        }

        fn pipeline(&self) -> Pipeline {
            self.pipeline_with_logs(self.logs.clone())
        }

        fn pipeline_with_logs(&self, logs: SharedLogSink) -> Pipeline {
            let deps = PipelineDeps {
                source: self.source.clone(),
                summary: self.summary.clone(),
                questions: self.questions.clone(),
                email: self.email.clone(),
                inbox: self.inbox.clone(),
                run_state: self.state.clone(),
                logs,
            };
            Pipeline::new(self.config.clone(), deps)
        }
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    // =========================================================================
    // Scenarios
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_scenario_email_disabled_success() {
        let h = Harness::new();
        let outcome = h.pipeline().run_at(RunTrigger::scheduled(), noon()).await;
        let result = outcome.result;

        assert_eq!(result.status, RunStatus::Success);
        assert_eq!(result.message.as_deref(), Some("pipe executed successfully"));
        assert_eq!(result.summary.as_ref().unwrap().category, "coding");
        assert!(result.questions.as_deref().unwrap().contains("r/rust"));
        assert_eq!(
            result.notifications.email,
            NotificationResult::Skipped("email not configured".into())
        );
        assert_eq!(result.notifications.inbox, NotificationResult::Sent);

        let logs = h.logs.entries().await;
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].0, "2026-03-01T12-00-00-coding.json");

        let windows = h.source.windows.lock().await;
        assert_eq!(windows[0].end_time, noon());
        assert_eq!(windows[0].span(), chrono::Duration::seconds(3600));

        let inbox = h.inbox.sent.lock().await;
        assert_eq!(inbox[0].title, "reddit questions");
        assert!(h.email.subjects().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_scenario_welcome_failure_aborts_before_fetch() {
        let mut h = Harness::new().with_email();
        h.email = Arc::new(FakeEmail::failing(&["daily reddit questions"]));

        let outcome = h.pipeline().run_at(RunTrigger::scheduled(), noon()).await;

        assert_eq!(outcome.result.status, RunStatus::Error);
        assert_eq!(outcome.result.failed_stage, Some(PipelineStage::Welcome));
        assert!(
            outcome
                .result
                .error
                .as_deref()
                .unwrap()
                .starts_with("Error in sending welcome email: ")
        );
        assert!(!outcome.state.welcome_message_sent);
        assert_eq!(outcome.state.welcome_failures, 1);

        // flag persisted as false, nothing generated or written
        assert_eq!(h.state.save_count().await, 1);
        assert!(!h.state.snapshot().await.welcome_message_sent);
        assert_eq!(h.source.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.summary.calls.load(Ordering::SeqCst), 0);
        assert!(h.logs.entries().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_welcome_sent_once_across_runs() {
        let h = Harness::new().with_email();
        let pipeline = h.pipeline();

        let first = pipeline.run_at(RunTrigger::scheduled(), noon()).await;
        let second = pipeline.run_at(RunTrigger::scheduled(), noon()).await;

        assert!(first.result.is_success());
        assert!(second.result.is_success());
        assert!(second.state.welcome_message_sent);

        let subjects = h.email.subjects().await;
        let welcomes = subjects
            .iter()
            .filter(|s| s.as_str() == "daily reddit questions")
            .count();
        assert_eq!(welcomes, 1);
        assert_eq!(subjects.len(), 3);
        assert_eq!(h.state.save_count().await, 1);

        let sent = h.email.sent.lock().await;
        assert!(sent[0].1.contains("It will run at 11:00 every day."));
    }

    #[tokio::test(start_paused = true)]
    async fn test_welcome_cap_skips_stage() {
        let mut h = Harness::new().with_email();
        h.config.pipeline.welcome_max_failures = 2;
        let mut state = RunState::default();
        state.mark_welcome_failed();
        state.mark_welcome_failed();
        h.state = Arc::new(MemoryRunStateStore::new(state));

        let outcome = h.pipeline().run_at(RunTrigger::scheduled(), noon()).await;

        assert!(outcome.result.is_success());
        assert!(!outcome.state.welcome_message_sent);
        assert_eq!(h.email.subjects().await, vec!["reddit questions".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_window_after_all_attempts() {
        let mut h = Harness::new().with_email().welcomed();
        h.source = Arc::new(FakeSource::with(SourceMode::Empty));

        let started = tokio::time::Instant::now();
        let outcome = h.pipeline().run_at(RunTrigger::scheduled(), noon()).await;

        assert_eq!(outcome.result.status, RunStatus::EmptyWindow);
        assert_eq!(
            outcome.result.message.as_deref(),
            Some("query is empty please wait & and try again!")
        );
        assert_eq!(h.source.calls.load(Ordering::SeqCst), 3);
        // two pauses between three attempts
        assert!(started.elapsed() >= Duration::from_millis(10_000));
        assert!(started.elapsed() < Duration::from_millis(15_000));
        assert_eq!(h.summary.calls.load(Ordering::SeqCst), 0);
        assert!(h.logs.entries().await.is_empty());
        assert!(h.email.subjects().await.is_empty());
        assert!(h.inbox.sent.lock().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_exhaustion_is_error() {
        let mut h = Harness::new();
        h.source = Arc::new(FakeSource::with(SourceMode::Failing));

        let outcome = h.pipeline().run_at(RunTrigger::scheduled(), noon()).await;

        assert_eq!(outcome.result.status, RunStatus::Error);
        assert_eq!(outcome.result.failed_stage, Some(PipelineStage::Fetch));
        assert_eq!(outcome.result.error_kind, Some(ErrorKind::TransientFetch));
        assert_eq!(h.source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cloud_provider_without_token() {
        let mut h = Harness::new();
        h.config.ai.provider = ProviderKind::ScreenpipeCloud;
        h.config.ai.user_token = None;

        let outcome = h.pipeline().run_at(RunTrigger::scheduled(), noon()).await;

        assert_eq!(outcome.result.status, RunStatus::Error);
        assert_eq!(
            outcome.result.error.as_deref(),
            Some("seems like you don't have screenpipe-cloud access :(")
        );
        assert_eq!(h.source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.summary.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cloud_token_not_checked_for_empty_window() {
        let mut h = Harness::new();
        h.config.ai.provider = ProviderKind::ScreenpipeCloud;
        h.source = Arc::new(FakeSource::with(SourceMode::Empty));

        let outcome = h.pipeline().run_at(RunTrigger::scheduled(), noon()).await;
        assert_eq!(outcome.result.status, RunStatus::EmptyWindow);
    }

    #[tokio::test(start_paused = true)]
    async fn test_summary_failure_writes_no_log() {
        let mut h = Harness::new();
        h.summary = Arc::new(FakeSummary {
            fail: true,
            ..Default::default()
        });

        let outcome = h.pipeline().run_at(RunTrigger::scheduled(), noon()).await;

        assert_eq!(outcome.result.status, RunStatus::Error);
        assert_eq!(outcome.result.failed_stage, Some(PipelineStage::Summary));
        assert_eq!(outcome.result.error_kind, Some(ErrorKind::Generation));
        assert!(h.logs.entries().await.is_empty());
        assert_eq!(h.questions.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_questions_still_succeed() {
        let mut h = Harness::new().with_email().welcomed();
        h.questions = Arc::new(FakeQuestions {
            blank: true,
            ..Default::default()
        });

        let outcome = h.pipeline().run_at(RunTrigger::scheduled(), noon()).await;
        let result = outcome.result;

        assert_eq!(result.status, RunStatus::Success);
        assert_eq!(result.message.as_deref(), Some("pipe executed successfully"));
        assert_eq!(
            result.notifications.email,
            NotificationResult::Skipped("no questions".into())
        );
        assert_eq!(
            result.notifications.inbox,
            NotificationResult::Skipped("no questions".into())
        );
        assert_eq!(h.logs.entries().await.len(), 1);
        assert!(h.email.subjects().await.is_empty());
        assert!(h.inbox.sent.lock().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_oversized_interval_is_configuration_error() {
        let mut h = Harness::new();
        h.config.pipe.interval_secs = 10_000_000_000_000;

        let outcome = h.pipeline().run_at(RunTrigger::scheduled(), noon()).await;

        assert_eq!(outcome.result.status, RunStatus::Error);
        assert_eq!(outcome.result.failed_stage, Some(PipelineStage::Settings));
        assert_eq!(outcome.result.error_kind, Some(ErrorKind::Configuration));
        assert_eq!(h.source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_user_trigger_skips_email() {
        let h = Harness::new().with_email().welcomed();

        let outcome = h.pipeline().run_at(RunTrigger::user(), noon()).await;

        assert!(outcome.result.is_success());
        assert_eq!(
            outcome.result.notifications.email,
            NotificationResult::Skipped("user triggered".into())
        );
        assert_eq!(outcome.result.notifications.inbox, NotificationResult::Sent);
        assert!(h.email.subjects().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_policy_stops_at_failing_email() {
        let mut h = Harness::new().with_email().welcomed();
        h.email = Arc::new(FakeEmail::failing(&["reddit questions"]));

        let outcome = h.pipeline().run_at(RunTrigger::scheduled(), noon()).await;

        assert_eq!(outcome.result.status, RunStatus::Error);
        assert_eq!(outcome.result.failed_stage, Some(PipelineStage::Notify));
        assert!(
            outcome
                .result
                .error
                .as_deref()
                .unwrap()
                .starts_with("error in sending mail ")
        );
        // log already committed; inbox never attempted
        assert_eq!(h.logs.entries().await.len(), 1);
        assert!(h.inbox.sent.lock().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_isolated_policy_keeps_delivering() {
        let mut h = Harness::new().with_email().welcomed();
        h.config.pipeline.channel_failure_policy = ChannelFailurePolicy::Isolated;
        h.email = Arc::new(FakeEmail::failing(&["reddit questions"]));

        let outcome = h.pipeline().run_at(RunTrigger::scheduled(), noon()).await;

        assert!(outcome.result.is_success());
        assert!(outcome.result.notifications.email.is_failed());
        assert_eq!(outcome.result.notifications.inbox, NotificationResult::Sent);
        assert_eq!(h.inbox.sent.lock().await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_inbox_failure_message() {
        let mut h = Harness::new();
        h.inbox = Arc::new(FakeInbox {
            fail: true,
            ..Default::default()
        });

        let outcome = h.pipeline().run_at(RunTrigger::scheduled(), noon()).await;

        assert_eq!(outcome.result.status, RunStatus::Error);
        assert!(
            outcome
                .result
                .error
                .as_deref()
                .unwrap()
                .starts_with("error in sending inbox notification ")
        );
        assert_eq!(
            outcome.result.notifications.email,
            NotificationResult::Skipped("email not configured".into())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_storage_failure_aborts() {
        let h = Harness::new();
        let outcome = h
            .pipeline_with_logs(Arc::new(BrokenLogs))
            .run_at(RunTrigger::scheduled(), noon())
            .await;

        assert_eq!(outcome.result.status, RunStatus::Error);
        assert_eq!(outcome.result.failed_stage, Some(PipelineStage::Storage));
        assert_eq!(outcome.result.error_kind, Some(ErrorKind::Storage));
        assert_eq!(h.source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bad_schedule_is_configuration_error() {
        let mut h = Harness::new();
        h.config.pipe.summary_frequency = "fortnightly".into();

        let outcome = h.pipeline().run_at(RunTrigger::scheduled(), noon()).await;

        assert_eq!(outcome.result.failed_stage, Some(PipelineStage::Settings));
        assert_eq!(outcome.result.error_kind, Some(ErrorKind::Configuration));
    }

    #[tokio::test(start_paused = true)]
    async fn test_file_backed_run() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut h = Harness::new();
        h.config.storage.root = Some(dir.path().to_path_buf());

        let deps = PipelineDeps {
            source: h.source.clone(),
            summary: h.summary.clone(),
            questions: h.questions.clone(),
            email: h.email.clone(),
            inbox: h.inbox.clone(),
            run_state: Arc::new(FileRunStateStore::in_root(dir.path())),
            logs: Arc::new(FileLogStore::in_root(dir.path())),
        };
        let outcome = Pipeline::new(h.config.clone(), deps)
            .run_at(RunTrigger::scheduled(), noon())
            .await;

        assert!(outcome.result.is_success());
        let path = outcome.result.log_path.unwrap();
        assert_eq!(path, dir.path().join("logs/2026-03-01T12-00-00-coding.json"));
        let stored: DailyLogEntry =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(stored.activity(), Some("fixing lifetimes"));

        let state = FileRunStateStore::in_root(dir.path()).load().await.unwrap();
        assert_eq!(state, RunState::default());
    }
}
