//! HTTP trigger endpoint and built-in scheduler
//!
//! `GET /api/pipeline` runs the pipeline once and answers with the
//! generated questions. Runs never overlap: a trigger that arrives while a
//! run is in flight gets `409 Conflict`, and a scheduler tick that finds
//! the gate taken is skipped.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Local;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::config::ConfigLoader;
use crate::pipeline::{Pipeline, PipelineResult, PipelineStage, RunStatus, RunTrigger};
use crate::types::{DigestError, Result};

/// Pause before retrying when the scheduler cannot load configuration
const SCHEDULER_BACKOFF: Duration = Duration::from_secs(60);

/// Builds a fresh pipeline per run so configuration edits apply without a restart
pub type PipelineFactory = Arc<dyn Fn() -> Result<Pipeline> + Send + Sync>;

/// Factory that reloads configuration from disk and environment
pub fn config_factory() -> PipelineFactory {
    Arc::new(|| -> Result<Pipeline> { Pipeline::from_config(ConfigLoader::load()?) })
}

#[derive(Clone)]
pub struct AppState {
    factory: PipelineFactory,
    gate: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(factory: PipelineFactory) -> Self {
        Self {
            factory,
            gate: Arc::new(Mutex::new(())),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TriggerQuery {
    #[serde(rename = "fromButton")]
    from_button: Option<String>,
}

impl TriggerQuery {
    fn trigger(&self) -> RunTrigger {
        match self.from_button.as_deref() {
            Some(value) if !value.trim().is_empty() => RunTrigger::user(),
            _ => RunTrigger::scheduled(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/pipeline", get(trigger_pipeline))
        .with_state(state)
}

/// Serve the trigger endpoint until Ctrl-C, optionally with the scheduler
pub async fn serve(host: &str, port: u16, schedule: bool, factory: PipelineFactory) -> Result<()> {
    let listener = TcpListener::bind((host, port)).await?;
    serve_on(listener, schedule, factory).await
}

pub async fn serve_on(listener: TcpListener, schedule: bool, factory: PipelineFactory) -> Result<()> {
    let state = AppState::new(factory);
    let local_addr = listener.local_addr()?;

    let scheduler = schedule.then(|| tokio::spawn(run_scheduler(state.clone())));

    info!("pipeline trigger listening on http://{local_addr}/api/pipeline");
    let served = axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await;

    if let Some(handle) = scheduler {
        handle.abort();
    }
    served.map_err(DigestError::from)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Could not install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn trigger_pipeline(
    State(state): State<AppState>,
    Query(query): Query<TriggerQuery>,
) -> impl IntoResponse {
    let Ok(_running) = state.gate.try_lock() else {
        return (
            StatusCode::CONFLICT,
            Json(json!({ "error": "pipeline is already running" })),
        );
    };

    let pipeline = match (state.factory)() {
        Ok(pipeline) => pipeline,
        Err(e) => {
            error!(error = %e, "Could not prepare pipeline");
            return (
                status_for(PipelineStage::Settings),
                Json(json!({ "error": e.to_string() })),
            );
        }
    };

    let outcome = pipeline.run(query.trigger()).await;
    response_for(&outcome.result)
}

/// Explicit aborts (welcome, access, delivery) are server errors; everything
/// else that stops a run is reported as a bad request
fn status_for(stage: PipelineStage) -> StatusCode {
    match stage {
        PipelineStage::Welcome | PipelineStage::AccessGuard | PipelineStage::Notify => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        PipelineStage::Settings
        | PipelineStage::Storage
        | PipelineStage::Fetch
        | PipelineStage::Summary
        | PipelineStage::Questions => StatusCode::BAD_REQUEST,
    }
}

fn response_for(result: &PipelineResult) -> (StatusCode, Json<serde_json::Value>) {
    match result.status {
        RunStatus::Success | RunStatus::EmptyWindow => (
            StatusCode::OK,
            Json(json!({
                "message": result.message,
                "suggestedQuestions": result.questions,
            })),
        ),
        RunStatus::Error => {
            let status = result
                .failed_stage
                .map(status_for)
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, Json(json!({ "error": result.error })))
        }
    }
}

// =============================================================================
// Scheduler
// =============================================================================

async fn run_scheduler(state: AppState) {
    loop {
        let schedule = match (state.factory)().and_then(|p| p.config().pipe.schedule()) {
            Ok(schedule) => schedule,
            Err(e) => {
                warn!(error = %e, "Scheduler could not load configuration");
                tokio::time::sleep(SCHEDULER_BACKOFF).await;
                continue;
            }
        };

        let wait = schedule.wait_from(&Local::now());
        info!(
            schedule = %schedule.describe(),
            wait_secs = wait.as_secs(),
            "Next scheduled run"
        );
        tokio::time::sleep(wait).await;

        let Ok(_running) = state.gate.try_lock() else {
            info!("Run already in progress, skipping scheduled tick");
            continue;
        };
        match (state.factory)() {
            Ok(pipeline) => {
                let outcome = pipeline.run(RunTrigger::scheduled()).await;
                info!(
                    run_id = %outcome.run_id,
                    status = ?outcome.result.status,
                    "Scheduled run finished"
                );
            }
            Err(e) => error!(error = %e, "Scheduled run could not start"),
        }
    }
}
