//! Run-state persistence (`pipe.json`)

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use super::atomic::write_atomic;
use crate::constants::storage::RUN_STATE_FILE;
use crate::types::{DigestError, Result, ResultExt, RunState};

#[async_trait]
pub trait RunStateStore: Send + Sync {
    /// Current state; a missing document yields the default state
    async fn load(&self) -> Result<RunState>;

    /// Replace the stored state (last writer wins)
    async fn save(&self, state: &RunState) -> Result<()>;
}

pub type SharedRunStateStore = Arc<dyn RunStateStore>;

/// JSON document on disk, rewritten atomically
#[derive(Debug, Clone)]
pub struct FileRunStateStore {
    path: PathBuf,
}

impl FileRunStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<root>/pipe.json`
    pub fn in_root(root: &Path) -> Self {
        Self::new(root.join(RUN_STATE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RunStateStore for FileRunStateStore {
    async fn load(&self) -> Result<RunState> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No run state yet");
                return Ok(RunState::default());
            }
            Err(e) => {
                return Err(e).with_context_fn(|| format!("read {}", self.path.display()));
            }
        };

        if raw.trim().is_empty() {
            return Ok(RunState::default());
        }

        serde_json::from_str(&raw).map_err(|e| {
            DigestError::Storage(format!("corrupt run state {}: {}", self.path.display(), e))
        })
    }

    async fn save(&self, state: &RunState) -> Result<()> {
        let content = serde_json::to_vec_pretty(state)?;
        write_atomic(&self.path, &content).await
    }
}

/// In-process store for tests and dry runs
#[derive(Debug, Default)]
pub struct MemoryRunStateStore {
    state: Mutex<RunState>,
    saves: Mutex<usize>,
}

impl MemoryRunStateStore {
    pub fn new(state: RunState) -> Self {
        Self {
            state: Mutex::new(state),
            saves: Mutex::new(0),
        }
    }

    pub async fn snapshot(&self) -> RunState {
        self.state.lock().await.clone()
    }

    /// Number of `save` calls so far
    pub async fn save_count(&self) -> usize {
        *self.saves.lock().await
    }
}

#[async_trait]
impl RunStateStore for MemoryRunStateStore {
    async fn load(&self) -> Result<RunState> {
        Ok(self.state.lock().await.clone())
    }

    async fn save(&self, state: &RunState) -> Result<()> {
        *self.state.lock().await = state.clone();
        *self.saves.lock().await += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let store = FileRunStateStore::in_root(dir.path());
        assert_eq!(store.load().await.unwrap(), RunState::default());
    }

    #[tokio::test]
    async fn test_save_then_load_keeps_unknown_keys() {
        let dir = TempDir::new().unwrap();
        let store = FileRunStateStore::in_root(dir.path());
        std::fs::write(
            store.path(),
            r#"{"crons": [{"schedule": "0 */1 * * *"}], "welcomeEmailSent": false}"#,
        )
        .unwrap();

        let mut state = store.load().await.unwrap();
        state.mark_welcome_sent();
        store.save(&state).await.unwrap();

        let on_disk: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(on_disk["welcomeEmailSent"], json!(true));
        assert_eq!(on_disk["crons"][0]["schedule"], "0 */1 * * *");
    }

    #[tokio::test]
    async fn test_corrupt_file_is_storage_error() {
        let dir = TempDir::new().unwrap();
        let store = FileRunStateStore::in_root(dir.path());
        std::fs::write(store.path(), "{not json").unwrap();

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, DigestError::Storage(_)));
    }

    #[tokio::test]
    async fn test_memory_store_counts_saves() {
        let store = MemoryRunStateStore::default();
        let mut state = store.load().await.unwrap();
        state.mark_welcome_failed();
        store.save(&state).await.unwrap();

        assert_eq!(store.save_count().await, 1);
        assert_eq!(store.snapshot().await.welcome_failures, 1);
    }
}
