//! Status Command
//!
//! Display onboarding state and the most recent daily logs.

use crate::cli::Output;
use crate::config::ConfigLoader;
use crate::storage::{FileLogStore, FileRunStateStore, RunStateStore};
use crate::types::{DigestError, Result};

pub async fn run(format: &str, limit: usize) -> Result<()> {
    let config = ConfigLoader::load()?;
    let root = config
        .storage
        .root
        .clone()
        .ok_or_else(|| DigestError::Config("storage.root is not set".to_string()))?;

    let state_store = FileRunStateStore::in_root(&root);
    let state = state_store.load().await?;
    let logs = FileLogStore::in_root(&root);
    let recent = logs.recent(limit)?;
    let schedule = config.pipe.schedule()?;

    if format == "json" {
        let status = serde_json::json!({
            "storage_root": root,
            "provider": config.ai.provider.as_str(),
            "schedule": schedule.describe(),
            "email_enabled": config.pipe.email_enabled(),
            "state": state,
            "recent_logs": recent,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    let output = Output::new();
    output.header("Digest Pipeline Status");
    output.field("Storage", root.display());
    output.field("Provider", config.ai.provider);
    output.field("Schedule", schedule.describe());
    output.field(
        "Email",
        if config.pipe.email_enabled() {
            "enabled"
        } else {
            "disabled"
        },
    );
    output.field(
        "Welcome",
        if state.welcome_message_sent {
            "sent".to_string()
        } else if state.welcome_failures > 0 {
            format!("pending ({} failed attempts)", state.welcome_failures)
        } else {
            "pending".to_string()
        },
    );

    output.header("Recent Logs");
    if recent.is_empty() {
        output.info("No daily logs yet");
    }
    for path in recent {
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            println!("  {}", name);
        }
    }

    Ok(())
}
