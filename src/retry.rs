//! Bounded Retry with Fixed Delay
//!
//! Wraps a fallible operation whose successful result may still be "empty"
//! (for example an activity window that has not been indexed yet). Both a
//! returned error and an empty value count as a miss. Misses are followed by
//! a fixed pause; there is no jitter or exponential growth.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::constants::retry as retry_constants;
use crate::types::Result;

/// Values that can be "present" or "absent" without being an error
pub trait Presence {
    fn is_present(&self) -> bool;
}

impl<T> Presence for Vec<T> {
    fn is_present(&self) -> bool {
        !self.is_empty()
    }
}

impl<T> Presence for Option<T> {
    fn is_present(&self) -> bool {
        self.is_some()
    }
}

impl Presence for String {
    fn is_present(&self) -> bool {
        !self.trim().is_empty()
    }
}

/// Retry configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts (values below 1 are treated as 1)
    pub max_attempts: u32,
    /// Pause between attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: retry_constants::DEFAULT_ATTEMPTS,
            delay: Duration::from_millis(retry_constants::DEFAULT_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }
}

/// Run `operation` until it yields a present value or attempts run out.
///
/// Returns `Ok(Some(value))` for the first present value. When every
/// attempt misses, the last error is returned if any attempt failed;
/// otherwise `Ok(None)`.
pub async fn retry<T, F, Fut>(policy: RetryPolicy, mut operation: F) -> Result<Option<T>>
where
    T: Presence,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = policy.max_attempts.max(1);
    let mut last_error = None;

    for attempt in 1..=attempts {
        match operation().await {
            Ok(value) if value.is_present() => {
                debug!(attempt, "Operation produced a value");
                return Ok(Some(value));
            }
            Ok(_) => {
                debug!(attempt, max_attempts = attempts, "Operation returned no data");
            }
            Err(err) => {
                warn!(attempt, max_attempts = attempts, "Query failed, retrying");
                last_error = Some(err);
            }
        }

        if attempt < attempts {
            sleep(policy.delay).await;
        }
    }

    match last_error {
        Some(err) => Err(err),
        None => Ok(None),
    }
}
