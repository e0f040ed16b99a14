//! Global Constants
//!
//! Centralized constants for configuration and tuning.

/// Activity fetch retry constants
pub mod retry {
    /// Attempts made against the activity source per run
    pub const DEFAULT_ATTEMPTS: u32 = 3;

    /// Fixed pause between attempts (milliseconds)
    pub const DEFAULT_DELAY_MS: u64 = 5000;
}

/// Pipeline constants
pub mod pipeline {
    /// Namespace used for pipe settings and on-disk layout
    pub const PIPE_NAMESPACE: &str = "reddit-auto-posts";

    /// Window length when no interval is configured (seconds)
    pub const DEFAULT_INTERVAL_SECS: u64 = 60;

    /// Longest accepted window (one year, in seconds)
    pub const MAX_INTERVAL_SECS: u64 = 366 * 24 * 3600;

    /// Subject of the one-time welcome email
    pub const WELCOME_SUBJECT: &str = "daily reddit questions";

    /// Subject/title of the per-run question notifications
    pub const QUESTIONS_TITLE: &str = "reddit questions";

    /// Response message for a completed run
    pub const SUCCESS_MESSAGE: &str = "pipe executed successfully";

    /// Response message when the window had no data
    pub const EMPTY_WINDOW_MESSAGE: &str = "query is empty please wait & and try again!";
}

/// Storage layout constants
pub mod storage {
    /// Log directory under the storage root
    pub const LOGS_DIR: &str = "logs";

    /// Run-state document under the storage root
    pub const RUN_STATE_FILE: &str = "pipe.json";

    /// Extension of daily log files
    pub const LOG_EXTENSION: &str = "json";
}

/// HTTP/Network constants
pub mod network {
    /// Default LLM request timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

    /// Activity source / notification request timeout (seconds)
    pub const SERVICE_TIMEOUT_SECS: u64 = 30;

    /// Default activity source endpoint
    pub const DEFAULT_SOURCE_API: &str = "http://localhost:3030";

    /// Default inbox endpoint
    pub const DEFAULT_INBOX_API: &str = "http://localhost:11435";

    /// Default mail relay endpoint
    pub const DEFAULT_MAIL_RELAY: &str = "http://localhost:3031/send";

    /// Default trigger server bind address
    pub const DEFAULT_HOST: &str = "127.0.0.1";

    /// Default trigger server port
    pub const DEFAULT_PORT: u16 = 3100;
}
