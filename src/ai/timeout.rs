//! Unified Timeout Configuration
//!
//! Operation-specific timeout defaults plus a helper that wraps an async
//! operation and turns expiry into `DigestError::Timeout`.
//!
//! ```ignore
//! let batch = with_timeout(
//!     timeouts.fetch,
//!     source.query(&window),
//!     "activity query",
//! ).await?;
//! ```

use std::future::Future;
use std::time::Duration;

use crate::config::Config;
use crate::constants::network as net_constants;
use crate::types::{DigestError, Result};

/// Timeouts for each outbound call a run makes
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// Activity source query (default: 30 seconds)
    pub fetch: Duration,
    /// Email or inbox delivery (default: 30 seconds)
    pub notification: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            fetch: Duration::from_secs(net_constants::SERVICE_TIMEOUT_SECS),
            notification: Duration::from_secs(net_constants::SERVICE_TIMEOUT_SECS),
        }
    }
}

impl TimeoutConfig {
    /// Derive from the configured endpoints
    pub fn from_config(config: &Config) -> Self {
        Self {
            fetch: config.source.timeout(),
            notification: config
                .inbox
                .timeout()
                .max(Duration::from_secs(config.mail.timeout_secs.max(1))),
        }
    }
}

/// Execute an async operation with a timeout
pub async fn with_timeout<T, F>(timeout: Duration, future: F, operation_name: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(DigestError::timeout(operation_name, timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_config_defaults() {
        let config = TimeoutConfig::default();
        assert_eq!(config.fetch.as_secs(), 30);
        assert_eq!(config.notification.as_secs(), 30);
    }

    #[test]
    fn test_from_config() {
        let mut config = Config::default();
        config.source.timeout_secs = 12;
        config.mail.timeout_secs = 45;

        let timeouts = TimeoutConfig::from_config(&config);
        assert_eq!(timeouts.fetch, Duration::from_secs(12));
        assert_eq!(timeouts.notification, Duration::from_secs(45));
    }

    #[tokio::test]
    async fn test_with_timeout_success() {
        let result = with_timeout(
            Duration::from_secs(1),
            async { Ok::<_, DigestError>(42) },
            "test operation",
        )
        .await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_timeout_expires() {
        let result = with_timeout(
            Duration::from_millis(10),
            async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok::<_, DigestError>(42)
            },
            "slow operation",
        )
        .await;
        assert!(matches!(result.unwrap_err(), DigestError::Timeout { .. }));
    }
}
