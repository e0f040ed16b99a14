//! Daily log store
//!
//! One pretty-printed JSON file per run under `<root>/logs/`, named
//! `<UTC timestamp>-<category>.json`. Files are never rewritten; a name
//! already taken gets a numeric suffix.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::atomic::write_atomic;
use crate::constants::storage::{LOG_EXTENSION, LOGS_DIR};
use crate::types::log_entry::DEFAULT_CATEGORY;
use crate::types::{DailyLogEntry, Result, ResultExt};

static UNSAFE_FILENAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[/\\?%*:|"<>']"#).unwrap());

#[async_trait]
pub trait LogSink: Send + Sync {
    /// Create the backing location; existing is fine
    async fn ensure(&self) -> Result<()>;

    /// Write one entry, returning where it landed
    async fn persist(&self, entry: &DailyLogEntry, at: DateTime<Utc>) -> Result<PathBuf>;
}

pub type SharedLogSink = Arc<dyn LogSink>;

/// Category with path and shell metacharacters replaced by `-`.
/// Everything else, whitespace included, is kept as the model wrote it.
pub fn sanitize_category(category: &str) -> String {
    if category.is_empty() {
        return DEFAULT_CATEGORY.to_string();
    }
    UNSAFE_FILENAME_CHARS.replace_all(category, "-").into_owned()
}

/// `2026-03-01T12-00-00-coding.json`
pub fn log_filename(at: DateTime<Utc>, category: &str) -> String {
    format!(
        "{}-{}.{}",
        at.format("%Y-%m-%dT%H-%M-%S"),
        sanitize_category(category),
        LOG_EXTENSION
    )
}

#[derive(Debug, Clone)]
pub struct FileLogStore {
    dir: PathBuf,
}

impl FileLogStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<root>/logs`
    pub fn in_root(root: &Path) -> Self {
        Self::new(root.join(LOGS_DIR))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Most recent log files, newest first
    pub fn recent(&self, limit: usize) -> Result<Vec<PathBuf>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut files: Vec<PathBuf> = std::fs::read_dir(&self.dir)
            .with_context_fn(|| format!("list {}", self.dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension().and_then(|e| e.to_str()) == Some(LOG_EXTENSION)
                    && !path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.starts_with('.'))
            })
            .collect();

        // Timestamp prefix sorts lexicographically
        files.sort();
        files.reverse();
        files.truncate(limit);
        Ok(files)
    }

    fn free_path(&self, filename: &str) -> PathBuf {
        let candidate = self.dir.join(filename);
        if !candidate.exists() {
            return candidate;
        }

        let stem = filename
            .strip_suffix(&format!(".{}", LOG_EXTENSION))
            .unwrap_or(filename);
        (1u32..)
            .map(|n| self.dir.join(format!("{}-{}.{}", stem, n, LOG_EXTENSION)))
            .find(|path| !path.exists())
            .unwrap_or(candidate)
    }
}

#[async_trait]
impl LogSink for FileLogStore {
    async fn ensure(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context_fn(|| format!("create {}", self.dir.display()))
    }

    async fn persist(&self, entry: &DailyLogEntry, at: DateTime<Utc>) -> Result<PathBuf> {
        let path = self.free_path(&log_filename(at, &entry.category));
        let content = serde_json::to_vec_pretty(entry)?;
        write_atomic(&path, &content).await?;

        info!(path = %path.display(), category = %entry.category, "Daily log saved");
        Ok(path)
    }
}

/// In-process sink for tests and dry runs
#[derive(Debug, Default)]
pub struct MemoryLogSink {
    entries: Mutex<Vec<(String, DailyLogEntry)>>,
}

impl MemoryLogSink {
    pub async fn entries(&self) -> Vec<(String, DailyLogEntry)> {
        self.entries.lock().await.clone()
    }
}

#[async_trait]
impl LogSink for MemoryLogSink {
    async fn ensure(&self) -> Result<()> {
        Ok(())
    }

    async fn persist(&self, entry: &DailyLogEntry, at: DateTime<Utc>) -> Result<PathBuf> {
        let name = log_filename(at, &entry.category);
        debug!(%name, "Daily log kept in memory");
        self.entries.lock().await.push((name.clone(), entry.clone()));
        Ok(PathBuf::from(name))
    }
}
