//! Activity data model
//!
//! The run window queried from the activity source and the records it
//! returns. Records are opaque JSON: the pipeline only forwards them to the
//! generators.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::retry::Presence;
use crate::types::{DigestError, Result};

/// Content type filter understood by the activity source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ContentType {
    #[default]
    #[serde(rename = "ocr")]
    Ocr,
    #[serde(rename = "audio")]
    Audio,
    #[serde(rename = "ui")]
    Ui,
    #[serde(rename = "all")]
    All,
    #[serde(rename = "audio+ocr")]
    AudioOcr,
    #[serde(rename = "ocr+ui")]
    OcrUi,
    #[serde(rename = "audio+ui")]
    AudioUi,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ocr => "ocr",
            Self::Audio => "audio",
            Self::Ui => "ui",
            Self::All => "all",
            Self::AudioOcr => "audio+ocr",
            Self::OcrUi => "ocr+ui",
            Self::AudioUi => "audio+ui",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ocr" => Ok(Self::Ocr),
            "audio" => Ok(Self::Audio),
            "ui" => Ok(Self::Ui),
            "all" => Ok(Self::All),
            "audio+ocr" => Ok(Self::AudioOcr),
            "ocr+ui" => Ok(Self::OcrUi),
            "audio+ui" => Ok(Self::AudioUi),
            _ => Err(format!(
                "Unknown content type: {}. Valid values: ocr, audio, ui, all, audio+ocr, ocr+ui, audio+ui",
                s
            )),
        }
    }
}

/// Time range and filters for one pipeline execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunWindow {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Window-name filter (None = no filter)
    pub window_name: Option<String>,
    /// Page size bound (None = source default)
    pub limit: Option<u32>,
    pub content_type: ContentType,
}

impl RunWindow {
    /// Window ending at `now` and spanning `interval`.
    ///
    /// A zero or negative interval is replaced by `fallback`, so the window
    /// is never empty. Fails when the start would fall outside the
    /// representable date range.
    pub fn ending_at(now: DateTime<Utc>, interval: Duration, fallback: Duration) -> Result<Self> {
        let interval = if interval > Duration::zero() {
            interval
        } else {
            fallback
        };
        let start_time = now.checked_sub_signed(interval).ok_or_else(|| {
            DigestError::Config(format!(
                "interval of {}s reaches before the earliest supported time",
                interval.num_seconds()
            ))
        })?;
        Ok(Self {
            start_time,
            end_time: now,
            window_name: None,
            limit: None,
            content_type: ContentType::default(),
        })
    }

    pub fn with_window_name(mut self, window_name: &str) -> Self {
        let trimmed = window_name.trim();
        self.window_name = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }

    pub fn with_limit(mut self, limit: Option<u32>) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn span(&self) -> Duration {
        self.end_time - self.start_time
    }
}

/// Single opaque activity record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityRecord(pub serde_json::Value);

impl ActivityRecord {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

/// Records returned for one [`RunWindow`], in source order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityBatch {
    #[serde(default)]
    pub data: Vec<ActivityRecord>,
}

impl ActivityBatch {
    pub fn new(data: Vec<ActivityRecord>) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn records(&self) -> &[ActivityRecord] {
        &self.data
    }
}

impl Presence for ActivityBatch {
    fn is_present(&self) -> bool {
        !self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn fixed_now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_window_ends_at_run_start() {
        let now = fixed_now();
        let window =
            RunWindow::ending_at(now, Duration::seconds(3600), Duration::seconds(60)).unwrap();
        assert_eq!(window.end_time, now);
        assert_eq!(window.span(), Duration::seconds(3600));
    }

    #[test]
    fn test_zero_interval_uses_fallback() {
        let window =
            RunWindow::ending_at(fixed_now(), Duration::zero(), Duration::seconds(60)).unwrap();
        assert_eq!(window.span(), Duration::seconds(60));
    }

    #[test]
    fn test_out_of_range_interval_is_config_error() {
        let result = RunWindow::ending_at(fixed_now(), Duration::MAX, Duration::seconds(60));
        assert!(matches!(result, Err(DigestError::Config(_))));
    }

    #[test]
    fn test_blank_window_name_means_no_filter() {
        let window = RunWindow::ending_at(fixed_now(), Duration::seconds(60), Duration::seconds(60))
            .unwrap()
            .with_window_name("   ");
        assert_eq!(window.window_name, None);

        let window = window.with_window_name("reddit");
        assert_eq!(window.window_name.as_deref(), Some("reddit"));
    }

    #[test]
    fn test_content_type_round_trip_names() {
        assert_eq!("audio+ocr".parse::<ContentType>(), Ok(ContentType::AudioOcr));
        assert_eq!(ContentType::OcrUi.to_string(), "ocr+ui");
        assert!("video".parse::<ContentType>().is_err());
    }

    #[test]
    fn test_batch_deserializes_source_payload() {
        let payload = json!({
            "data": [
                {"type": "OCR", "content": {"text": "hello", "app_name": "firefox"}},
                {"type": "OCR", "content": {"text": "world", "app_name": "code"}}
            ],
            "pagination": {"limit": 100, "offset": 0, "total": 2}
        });
        let batch: ActivityBatch = serde_json::from_value(payload).unwrap();
        assert_eq!(batch.len(), 2);
        assert!(batch.is_present());
        assert_eq!(batch.records()[0].as_value()["content"]["text"], "hello");
    }

    #[test]
    fn test_batch_without_data_is_absent() {
        let batch: ActivityBatch = serde_json::from_value(json!({})).unwrap();
        assert!(!batch.is_present());
    }

    proptest! {
        #[test]
        fn prop_window_span_matches_interval(secs in 1i64..=31 * 24 * 3600) {
            let window = RunWindow::ending_at(
                fixed_now(),
                Duration::seconds(secs),
                Duration::seconds(60),
            )
            .unwrap();
            prop_assert_eq!(window.end_time - window.start_time, Duration::seconds(secs));
            prop_assert_eq!(window.end_time, fixed_now());
        }
    }
}
