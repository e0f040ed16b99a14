//! Activity Source
//!
//! Reads a window of recorded screen activity. The default implementation
//! queries screenpipe's `GET /search` endpoint.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::config::EndpointConfig;
use crate::types::{ActivityBatch, DigestError, Result, RunWindow};

#[async_trait]
pub trait ActivitySource: Send + Sync {
    /// Records inside `window`. An empty batch is not an error.
    async fn query(&self, window: &RunWindow) -> Result<ActivityBatch>;
}

pub type SharedSource = Arc<dyn ActivitySource>;

/// screenpipe search client
#[derive(Debug, Clone)]
pub struct ScreenpipeClient {
    api_base: String,
    client: reqwest::Client,
}

impl ScreenpipeClient {
    pub fn new(config: &EndpointConfig) -> Result<Self> {
        let api_base = url::Url::parse(&config.api_base)
            .map_err(|e| {
                DigestError::Config(format!(
                    "Invalid activity source URL '{}': {}",
                    config.api_base, e
                ))
            })?
            .to_string()
            .trim_end_matches('/')
            .to_string();

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| DigestError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { api_base, client })
    }

    fn query_params(window: &RunWindow) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("start_time", window.start_time.to_rfc3339()),
            ("end_time", window.end_time.to_rfc3339()),
            ("content_type", window.content_type.as_str().to_string()),
        ];
        if let Some(limit) = window.limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(name) = &window.window_name {
            params.push(("window_name", name.clone()));
        }
        params
    }
}

#[async_trait]
impl ActivitySource for ScreenpipeClient {
    #[instrument(skip_all, fields(start = %window.start_time, end = %window.end_time))]
    async fn query(&self, window: &RunWindow) -> Result<ActivityBatch> {
        let url = format!("{}/search", self.api_base);

        let response = self
            .client
            .get(&url)
            .query(&Self::query_params(window))
            .send()
            .await
            .map_err(|e| DigestError::TransientFetch(format!("activity query failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DigestError::TransientFetch(format!(
                "activity source returned {}: {}",
                status, body
            )));
        }

        let batch: ActivityBatch = response.json().await.map_err(|e| {
            DigestError::TransientFetch(format!("unreadable activity response: {}", e))
        })?;

        debug!(records = batch.len(), "Activity window fetched");
        Ok(batch)
    }
}
