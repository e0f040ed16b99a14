//! Local persistence: run state and daily logs.

mod atomic;
pub mod log_store;
pub mod run_state;

pub use atomic::write_atomic;
pub use log_store::{
    FileLogStore, LogSink, MemoryLogSink, SharedLogSink, log_filename, sanitize_category,
};
pub use run_state::{FileRunStateStore, MemoryRunStateStore, RunStateStore, SharedRunStateStore};
