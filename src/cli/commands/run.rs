//! Run Command
//!
//! Execute the pipeline once and report the outcome.
//!
//! Usage:
//!   digestpipe run [--from-button] [-f json]

use crate::cli::Output;
use crate::config::ConfigLoader;
use crate::notify::NotificationResult;
use crate::pipeline::{Pipeline, PipelineOutcome, RunStatus, RunTrigger};
use crate::types::{DailyLogEntry, Result};

/// Run once. Returns `false` when the run ended in error.
pub async fn run(from_button: bool, format: &str) -> Result<bool> {
    let config = ConfigLoader::load()?;
    let pipeline = Pipeline::from_config(config)?;

    let trigger = if from_button {
        RunTrigger::user()
    } else {
        RunTrigger::scheduled()
    };
    let outcome = pipeline.run(trigger).await;

    if format == "json" {
        let report = serde_json::json!({
            "run_id": outcome.run_id.as_str(),
            "result": &outcome.result,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_outcome(&outcome);
    }

    Ok(outcome.result.status != RunStatus::Error)
}

fn print_outcome(outcome: &PipelineOutcome) {
    let output = Output::new();
    let result = &outcome.result;

    output.header("Pipeline Run");
    output.field("Run", &outcome.run_id);

    match result.status {
        RunStatus::Success => {
            output.success(result.message.as_deref().unwrap_or("done"));
            if let Some(summary) = &result.summary {
                for (label, value) in summary_fields(summary) {
                    output.field(label, value);
                }
            }
            if let Some(path) = &result.log_path {
                output.field("Log", path.display());
            }
            if let Some(questions) = &result.questions {
                println!();
                output.block(questions);
            }
        }
        RunStatus::EmptyWindow => {
            output.warning(result.message.as_deref().unwrap_or("no activity"));
        }
        RunStatus::Error => {
            let stage = result
                .failed_stage
                .map(|s| s.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            output.error(&format!(
                "[{}] {}",
                stage,
                result.error.as_deref().unwrap_or("run failed")
            ));
        }
    }

    print_channel(&output, "Email", &result.notifications.email);
    print_channel(&output, "Inbox", &result.notifications.inbox);
}

fn print_channel(output: &Output, label: &str, result: &NotificationResult) {
    match result {
        NotificationResult::Sent => output.field(label, "sent"),
        NotificationResult::Skipped(reason) => output.field(label, format!("skipped ({reason})")),
        NotificationResult::Failed(reason) => output.field(label, format!("failed ({reason})")),
    }
}

/// Labelled lines shown for a persisted daily log
fn summary_fields(entry: &DailyLogEntry) -> Vec<(&'static str, String)> {
    let mut fields = vec![("Category", entry.category.clone())];
    if let Some(activity) = entry.activity() {
        fields.push(("Activity", activity.to_string()));
    }
    let tags = entry.tags();
    if !tags.is_empty() {
        fields.push(("Tags", tags.join(", ")));
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_summary_fields_include_tags() {
        let entry = DailyLogEntry::new("learning")
            .with_field("activity", json!("reading the tokio docs"))
            .with_field("tags", json!(["rust", "async"]));

        let fields = summary_fields(&entry);
        assert_eq!(fields[0], ("Category", "learning".to_string()));
        assert_eq!(fields[1], ("Activity", "reading the tokio docs".to_string()));
        assert_eq!(fields[2], ("Tags", "rust, async".to_string()));
    }

    #[test]
    fn test_summary_fields_without_tags() {
        let fields = summary_fields(&DailyLogEntry::new("work"));
        assert_eq!(fields, vec![("Category", "work".to_string())]);
    }
}
