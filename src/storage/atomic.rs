//! Temp-file + rename writes.
//!
//! Readers of a path written here see either the previous content or the
//! complete new content, never a partial file.

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::types::{Result, ResultExt};

/// Write `content` to `path` atomically, creating parent directories.
pub async fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .with_context_fn(|| format!("create {}", parent.display()))?;
    }

    let tmp_path = temp_path_for(path);

    if let Err(e) = fs::write(&tmp_path, content).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(e).with_context_fn(|| format!("write {}", tmp_path.display()));
    }

    if let Err(e) = fs::rename(&tmp_path, path).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(e).with_context_fn(|| format!("rename into {}", path.display()));
    }

    Ok(())
}

// Same directory as the target so the rename never crosses filesystems
fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("digestpipe");
    let tmp_name = format!(".{}.tmp-{}", name, uuid::Uuid::new_v4().simple());
    path.parent()
        .map(|p| p.join(&tmp_name))
        .unwrap_or_else(|| PathBuf::from(&tmp_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_atomic_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a").join("b").join("state.json");

        write_atomic(&path, b"{\"ok\":true}").await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{\"ok\":true}");
    }

    #[tokio::test]
    async fn test_write_atomic_replaces_and_leaves_no_temp() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");

        write_atomic(&path, b"first").await.unwrap();
        write_atomic(&path, b"second").await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}
