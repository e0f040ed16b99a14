pub mod activity;
pub mod error;
pub mod log_entry;
pub mod run_state;

pub use activity::{ActivityBatch, ActivityRecord, ContentType, RunWindow};
pub use error::{
    DigestError, ErrorCategory, ErrorClassifier, ErrorKind, LlmError, Result, ResultExt,
};
pub use log_entry::DailyLogEntry;
pub use run_state::RunState;

// =============================================================================
// Domain Newtypes
// =============================================================================

use std::fmt;

/// Type-safe wrapper for pipeline run IDs
///
/// Every run (scheduled or triggered) gets a fresh id that is attached to its
/// tracing span.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunId(String);

impl RunId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RunId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
