//! Persisted run state (`pipe.json`).
//!
//! Tracks one-time actions across runs. Keys the pipeline does not know
//! about are kept in `extra` so rewriting the document never drops them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    /// Welcome email delivered
    #[serde(rename = "welcomeEmailSent", alias = "welcomeMessageSent", default)]
    pub welcome_message_sent: bool,

    /// Consecutive failed welcome attempts since the last success
    #[serde(rename = "welcomeFailures", default, skip_serializing_if = "is_zero")]
    pub welcome_failures: u32,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}

impl RunState {
    pub fn mark_welcome_sent(&mut self) {
        self.welcome_message_sent = true;
        self.welcome_failures = 0;
    }

    pub fn mark_welcome_failed(&mut self) {
        self.welcome_message_sent = false;
        self.welcome_failures = self.welcome_failures.saturating_add(1);
    }
}
