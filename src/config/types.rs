//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (~/.config/digestpipe/) and project (.digestpipe/) level
//! configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{network, pipeline, retry};
use crate::schedule::Schedule;
use crate::types::{ContentType, DigestError, Result};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// AI provider settings (global)
    pub ai: AiConfig,

    /// Pipe settings (namespaced)
    pub pipe: PipeSettings,

    /// Orchestration policy
    pub pipeline: PipelinePolicy,

    /// On-disk layout
    pub storage: StorageConfig,

    /// Activity source endpoint
    pub source: EndpointConfig,

    /// Inbox notification endpoint
    pub inbox: EndpointConfig,

    /// Mail relay endpoint
    pub mail: MailConfig,

    /// Trigger server settings
    pub server: ServerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            ai: AiConfig::default(),
            pipe: PipeSettings::default(),
            pipeline: PipelinePolicy::default(),
            storage: StorageConfig::default(),
            source: EndpointConfig::with_base(network::DEFAULT_SOURCE_API),
            inbox: EndpointConfig::with_base(network::DEFAULT_INBOX_API),
            mail: MailConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `DigestError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.ai.temperature) {
            return Err(DigestError::Config(format!(
                "AI temperature must be between 0.0 and 2.0, got {}",
                self.ai.temperature
            )));
        }

        if self.ai.timeout_secs == 0 {
            return Err(DigestError::Config(
                "AI timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.ai.provider.requires_url() && self.ai.url.is_none() {
            return Err(DigestError::Config(format!(
                "AI provider '{}' requires ai.url",
                self.ai.provider
            )));
        }

        if self.pipe.interval_secs > pipeline::MAX_INTERVAL_SECS {
            return Err(DigestError::Config(format!(
                "pipe.interval_secs must be at most {}, got {}",
                pipeline::MAX_INTERVAL_SECS,
                self.pipe.interval_secs
            )));
        }

        if self.pipe.page_size == Some(0) {
            return Err(DigestError::Config(
                "pipe.page_size must be greater than 0".to_string(),
            ));
        }

        if self.pipeline.fetch_attempts == 0 {
            return Err(DigestError::Config(
                "pipeline.fetch_attempts must be greater than 0".to_string(),
            ));
        }

        // Rejects malformed email_time / summary_frequency combinations
        self.pipe.schedule()?;

        Ok(())
    }
}

// =============================================================================
// AI Configuration
// =============================================================================

/// AI provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    #[default]
    #[serde(rename = "openai")]
    OpenAi,
    NativeOllama,
    ScreenpipeCloud,
    Embedded,
    Custom,
}

impl ProviderKind {
    /// Provider only answers requests carrying the user's account token
    pub fn requires_user_token(&self) -> bool {
        matches!(self, Self::ScreenpipeCloud)
    }

    /// Provider has no well-known endpoint; `ai.url` must be set
    pub fn requires_url(&self) -> bool {
        matches!(self, Self::Custom | Self::ScreenpipeCloud)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::NativeOllama => "native-ollama",
            Self::ScreenpipeCloud => "screenpipe-cloud",
            Self::Embedded => "embedded",
            Self::Custom => "custom",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "native-ollama" | "ollama" => Ok(Self::NativeOllama),
            "screenpipe-cloud" => Ok(Self::ScreenpipeCloud),
            "embedded" => Ok(Self::Embedded),
            "custom" => Ok(Self::Custom),
            _ => Err(format!(
                "Unknown provider: {}. Valid values: openai, native-ollama, screenpipe-cloud, embedded, custom",
                s
            )),
        }
    }
}

/// AI provider configuration
///
/// Credentials are never serialized back out (`config show` stays safe to
/// paste) and are converted to `SecretString` by the providers.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub provider: ProviderKind,
    /// Model name (provider-specific)
    pub model: Option<String>,
    /// API base URL (None = provider default)
    pub url: Option<String>,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Account token for providers that require one
    #[serde(skip_serializing)]
    pub user_token: Option<String>,
    pub temperature: f32,
    pub timeout_secs: u64,
    pub max_tokens: usize,
}

impl std::fmt::Debug for AiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("url", &self.url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("user_token", &self.user_token.as_ref().map(|_| "[REDACTED]"))
            .field("temperature", &self.temperature)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::OpenAi,
            model: None,
            url: None,
            api_key: None,
            user_token: None,
            temperature: 0.3,
            timeout_secs: network::DEFAULT_TIMEOUT_SECS,
            max_tokens: 4096,
        }
    }
}

impl AiConfig {
    pub fn has_user_token(&self) -> bool {
        self.user_token
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty())
    }
}

// =============================================================================
// Pipe Settings
// =============================================================================

pub const DEFAULT_DAILYLOG_PROMPT: &str = "You are analyzing screen activity to keep a daily log. \
Summarize what the user was doing, pick one short category for the activity, \
and add a few lowercase tags.";

pub const DEFAULT_CUSTOM_PROMPT: &str = "Based on the screen activity below, suggest a few \
questions the user could post to relevant subreddits to get help or start a discussion. \
Answer with a markdown list, one question per line, each with the subreddit it fits.";

/// Namespaced pipe settings
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipeSettings {
    /// Activity window length in seconds (0 = default)
    pub interval_secs: u64,
    /// "daily" or a number of hours
    pub summary_frequency: String,
    /// Local HH:MM used by the daily schedule
    pub email_time: String,
    pub email_address: Option<String>,
    #[serde(skip_serializing)]
    pub email_password: Option<String>,
    /// Prompt for question generation
    pub custom_prompt: String,
    /// Prompt for daily log generation
    pub dailylog_prompt: String,
    /// Window-name filter ("" = no filter)
    pub window_name: String,
    pub page_size: Option<u32>,
    pub content_type: ContentType,
}

impl std::fmt::Debug for PipeSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipeSettings")
            .field("interval_secs", &self.interval_secs)
            .field("summary_frequency", &self.summary_frequency)
            .field("email_time", &self.email_time)
            .field("email_address", &self.email_address)
            .field(
                "email_password",
                &self.email_password.as_ref().map(|_| "[REDACTED]"),
            )
            .field("window_name", &self.window_name)
            .field("page_size", &self.page_size)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

impl Default for PipeSettings {
    fn default() -> Self {
        Self {
            interval_secs: 3600,
            summary_frequency: "daily".to_string(),
            email_time: "11:00".to_string(),
            email_address: None,
            email_password: None,
            custom_prompt: DEFAULT_CUSTOM_PROMPT.to_string(),
            dailylog_prompt: DEFAULT_DAILYLOG_PROMPT.to_string(),
            window_name: String::new(),
            page_size: Some(100),
            content_type: ContentType::Ocr,
        }
    }
}

impl PipeSettings {
    /// Window length; never zero
    pub fn interval(&self) -> Duration {
        if self.interval_secs == 0 {
            Duration::from_secs(pipeline::DEFAULT_INTERVAL_SECS)
        } else {
            Duration::from_secs(self.interval_secs)
        }
    }

    /// Email is enabled iff both address and password are non-empty
    pub fn email_enabled(&self) -> bool {
        let filled = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        filled(&self.email_address) && filled(&self.email_password)
    }

    pub fn schedule(&self) -> Result<Schedule> {
        Schedule::from_settings(&self.summary_frequency, &self.email_time)
    }
}

// =============================================================================
// Pipeline Policy
// =============================================================================

/// What a failing post-generation notification channel does to the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChannelFailurePolicy {
    /// First channel failure aborts the run with an error
    #[default]
    Fatal,
    /// Failures are recorded per channel and the run still succeeds
    Isolated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelinePolicy {
    pub channel_failure_policy: ChannelFailurePolicy,
    pub fetch_attempts: u32,
    pub fetch_delay_ms: u64,
    /// Consecutive welcome failures after which onboarding stops blocking
    /// runs (0 = never stop)
    pub welcome_max_failures: u32,
}

impl Default for PipelinePolicy {
    fn default() -> Self {
        Self {
            channel_failure_policy: ChannelFailurePolicy::Fatal,
            fetch_attempts: retry::DEFAULT_ATTEMPTS,
            fetch_delay_ms: retry::DEFAULT_DELAY_MS,
            welcome_max_failures: 0,
        }
    }
}

// =============================================================================
// Storage / Endpoints / Server
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root for `logs/` and `pipe.json` (resolved by the loader when unset)
    pub root: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub api_base: String,
    pub timeout_secs: u64,
}

impl EndpointConfig {
    pub fn with_base(api_base: &str) -> Self {
        Self {
            api_base: api_base.to_string(),
            timeout_secs: network::SERVICE_TIMEOUT_SECS,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self::with_base(network::DEFAULT_SOURCE_API)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    pub relay_url: String,
    pub timeout_secs: u64,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            relay_url: network::DEFAULT_MAIL_RELAY.to_string(),
            timeout_secs: network::SERVICE_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Run the built-in scheduler alongside the trigger endpoint
    pub schedule: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: network::DEFAULT_HOST.to_string(),
            port: network::DEFAULT_PORT,
            schedule: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pipe.content_type, ContentType::Ocr);
        assert_eq!(
            config.pipeline.channel_failure_policy,
            ChannelFailurePolicy::Fatal
        );
    }

    #[test]
    fn test_zero_interval_falls_back() {
        let settings = PipeSettings {
            interval_secs: 0,
            ..Default::default()
        };
        assert_eq!(
            settings.interval(),
            Duration::from_secs(pipeline::DEFAULT_INTERVAL_SECS)
        );
    }

    #[test]
    fn test_email_enabled_requires_both_fields() {
        let mut settings = PipeSettings::default();
        assert!(!settings.email_enabled());

        settings.email_address = Some("me@example.com".into());
        assert!(!settings.email_enabled());

        settings.email_password = Some("   ".into());
        assert!(!settings.email_enabled());

        settings.email_password = Some("app-password".into());
        assert!(settings.email_enabled());
    }

    #[test]
    fn test_provider_kind_parsing() {
        assert_eq!("openai".parse::<ProviderKind>(), Ok(ProviderKind::OpenAi));
        assert_eq!(
            "screenpipe-cloud".parse::<ProviderKind>(),
            Ok(ProviderKind::ScreenpipeCloud)
        );
        assert!(ProviderKind::ScreenpipeCloud.requires_user_token());
        assert!(!ProviderKind::NativeOllama.requires_user_token());
        assert!("gemini".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_custom_provider_requires_url() {
        let mut config = Config::default();
        config.ai.provider = ProviderKind::Custom;
        assert!(config.validate().is_err());
        config.ai.url = Some("http://localhost:8080/v1".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_screenpipe_cloud_requires_url() {
        let mut config = Config::default();
        config.ai.provider = ProviderKind::ScreenpipeCloud;
        config.ai.user_token = Some("token".into());
        assert!(matches!(config.validate(), Err(DigestError::Config(_))));
        config.ai.url = Some("http://localhost:8787/v1".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_oversized_interval_rejected() {
        let mut config = Config::default();
        config.pipe.interval_secs = 10_000_000_000_000;
        assert!(matches!(config.validate(), Err(DigestError::Config(_))));

        config.pipe.interval_secs = pipeline::MAX_INTERVAL_SECS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_email_time_rejected() {
        let mut config = Config::default();
        config.pipe.email_time = "25:99".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_secrets_not_serialized() {
        let mut config = Config::default();
        config.ai.api_key = Some("sk-secret".into());
        config.pipe.email_password = Some("hunter2".into());
        let rendered = serde_json::to_string(&config).unwrap();
        assert!(!rendered.contains("sk-secret"));
        assert!(!rendered.contains("hunter2"));
        let debug = format!("{:?}", config);
        assert!(!debug.contains("sk-secret"));
        assert!(!debug.contains("hunter2"));
    }
}
