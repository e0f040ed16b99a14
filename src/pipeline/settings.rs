//! Per-run settings resolved from configuration

use chrono::{DateTime, Duration, Utc};
use secrecy::SecretString;

use crate::ai::ProviderParams;
use crate::config::Config;
use crate::constants::pipeline::DEFAULT_INTERVAL_SECS;
use crate::schedule::Schedule;
use crate::types::{ContentType, DigestError, Result, RunWindow};

/// Address and app password for the email channel
#[derive(Debug, Clone)]
pub struct EmailTarget {
    pub address: String,
    pub password: SecretString,
}

#[derive(Debug, Clone)]
pub struct RunSettings {
    pub interval: Duration,
    pub window_name: String,
    pub page_size: Option<u32>,
    pub content_type: ContentType,
    /// `Some` iff both address and password are configured
    pub email: Option<EmailTarget>,
    pub schedule: Schedule,
    pub provider: ProviderParams,
    pub dailylog_prompt: String,
    pub custom_prompt: String,
}

impl RunSettings {
    pub fn resolve(config: &Config) -> Result<Self> {
        let pipe = &config.pipe;
        let schedule = pipe.schedule()?;

        let email = if pipe.email_enabled() {
            match (&pipe.email_address, &pipe.email_password) {
                (Some(address), Some(password)) => Some(EmailTarget {
                    address: address.trim().to_string(),
                    password: SecretString::from(password.clone()),
                }),
                _ => None,
            }
        } else {
            None
        };

        let secs = pipe.interval().as_secs();
        let interval = i64::try_from(secs)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(|| {
                DigestError::Config(format!("pipe.interval_secs {} is out of range", secs))
            })?;

        Ok(Self {
            interval,
            window_name: pipe.window_name.clone(),
            page_size: pipe.page_size,
            content_type: pipe.content_type,
            email,
            schedule,
            provider: ProviderParams::from(&config.ai),
            dailylog_prompt: pipe.dailylog_prompt.clone(),
            custom_prompt: pipe.custom_prompt.clone(),
        })
    }

    /// Window ending at `now`
    pub fn window(&self, now: DateTime<Utc>) -> Result<RunWindow> {
        Ok(RunWindow::ending_at(
            now,
            self.interval,
            Duration::seconds(DEFAULT_INTERVAL_SECS as i64),
        )?
        .with_window_name(&self.window_name)
        .with_limit(self.page_size)
        .with_content_type(self.content_type))
    }
}
