//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (~/.config/digestpipe/config.toml)
//! 3. Project config (.digestpipe/config.toml)
//! 4. Environment variables (DIGESTPIPE_* prefix, `__` separates sections)

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use tracing::{debug, info};

use super::types::Config;
use crate::constants::pipeline::PIPE_NAMESPACE;
use crate::types::{DigestError, Result};

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with full resolution chain using Figment:
    /// defaults → global → project → env vars
    pub fn load() -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(&global_path));
        }

        let project_path = Self::project_config_path();
        if project_path.exists() {
            debug!("Loading project config from: {}", project_path.display());
            figment = figment.merge(Toml::file(&project_path));
        }

        // e.g. DIGESTPIPE_PIPE__EMAIL_ADDRESS -> pipe.email_address
        figment = figment.merge(Env::prefixed("DIGESTPIPE_").split("__").lowercase(true));

        Self::extract(figment)
    }

    /// Load configuration from a specific file only
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path));
        Self::extract(figment)
    }

    fn extract(figment: Figment) -> Result<Config> {
        let mut config: Config = figment
            .extract()
            .map_err(|e| DigestError::Config(format!("Configuration error: {}", e)))?;

        if config.storage.root.is_none() {
            config.storage.root = Some(Self::default_storage_root());
        }

        config.validate()?;
        Ok(config)
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Get path to global config directory (~/.config/digestpipe/)
    pub fn global_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "digestpipe").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get path to global config file
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join("config.toml"))
    }

    /// Get path to project config file
    pub fn project_config_path() -> PathBuf {
        PathBuf::from(".digestpipe/config.toml")
    }

    /// Storage root when none is configured.
    ///
    /// Follows the screenpipe layout (`$SCREENPIPE_DIR/pipes/<namespace>`)
    /// when SCREENPIPE_DIR is set, else the platform data directory.
    pub fn default_storage_root() -> PathBuf {
        if let Ok(dir) = env::var("SCREENPIPE_DIR")
            && !dir.trim().is_empty()
        {
            return PathBuf::from(dir).join("pipes").join(PIPE_NAMESPACE);
        }

        ProjectDirs::from("", "", "digestpipe")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".digestpipe").join("data"))
    }

    // =========================================================================
    // Config Commands
    // =========================================================================

    /// Show config file paths
    pub fn show_path() {
        println!("Configuration paths:");
        println!();

        if let Some(global) = Self::global_config_path() {
            let exists = if global.exists() { "✓" } else { "✗" };
            println!("  Global:  {} {}", exists, global.display());
        } else {
            println!("  Global:  (not available)");
        }

        let project = Self::project_config_path();
        let exists = if project.exists() { "✓" } else { "✗" };
        println!("  Project: {} {}", exists, project.display());

        let storage = Self::default_storage_root();
        let exists = if storage.exists() { "✓" } else { "✗" };
        println!("  Storage: {} {}", exists, storage.display());
    }

    /// Show current effective configuration
    pub fn show_config(as_json: bool) -> Result<()> {
        let config = Self::load()?;

        if as_json {
            println!("{}", serde_json::to_string_pretty(&config)?);
        } else {
            println!(
                "{}",
                toml::to_string_pretty(&config).map_err(|e| DigestError::Config(e.to_string()))?
            );
        }

        Ok(())
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Initialize global configuration
    pub fn init_global(force: bool) -> Result<PathBuf> {
        let global_dir = Self::global_dir().ok_or_else(|| {
            DigestError::Config("Cannot determine global config directory".to_string())
        })?;
        fs::create_dir_all(&global_dir)?;

        let config_path = global_dir.join("config.toml");
        Self::write_default(&config_path, force)?;
        Ok(global_dir)
    }

    /// Initialize project configuration
    pub fn init_project(force: bool) -> Result<PathBuf> {
        let config_path = Self::project_config_path();
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        Self::write_default(&config_path, force)?;
        Ok(config_path)
    }

    fn write_default(config_path: &Path, force: bool) -> Result<()> {
        if !config_path.exists() || force {
            fs::write(config_path, Self::default_config())?;
            info!("Created config: {}", config_path.display());
        } else {
            info!("Config exists: {}", config_path.display());
        }
        Ok(())
    }

    /// Generate default config content (TOML)
    fn default_config() -> String {
        r#"# digestpipe configuration
# Project settings in .digestpipe/config.toml override the global file.
# Environment overrides: DIGESTPIPE_<SECTION>__<KEY>, e.g. DIGESTPIPE_AI__API_KEY

version = "1.0"

[ai]
provider = "openai"        # openai | native-ollama | screenpipe-cloud | embedded | custom
model = "gpt-4o"
# url = "https://api.openai.com/v1"
# api_key = ""
# user_token = ""

[pipe]
interval_secs = 3600
summary_frequency = "daily"   # "daily" or a number of hours
email_time = "11:00"
# email_address = ""
# email_password = ""
window_name = ""
page_size = 100
content_type = "ocr"

[pipeline]
channel_failure_policy = "fatal"   # fatal | isolated
fetch_attempts = 3
fetch_delay_ms = 5000
welcome_max_failures = 0

[server]
host = "127.0.0.1"
port = 3100
schedule = true
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ChannelFailurePolicy, ProviderKind};
    use crate::types::ContentType;

    #[test]
    fn test_load_from_file_merges_over_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "pipe.toml",
                r#"
                [ai]
                provider = "screenpipe-cloud"
                model = "gpt-4o-mini"
                url = "http://localhost:8787/v1"

                [pipe]
                interval_secs = 7200
                content_type = "audio+ocr"

                [pipeline]
                channel_failure_policy = "isolated"

                [storage]
                root = "/tmp/digest"
                "#,
            )?;

            let config = ConfigLoader::load_from_file(Path::new("pipe.toml"))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.ai.provider, ProviderKind::ScreenpipeCloud);
            assert_eq!(config.ai.model.as_deref(), Some("gpt-4o-mini"));
            assert_eq!(config.pipe.interval_secs, 7200);
            assert_eq!(config.pipe.content_type, ContentType::AudioOcr);
            assert_eq!(
                config.pipeline.channel_failure_policy,
                ChannelFailurePolicy::Isolated
            );
            assert_eq!(config.storage.root, Some(PathBuf::from("/tmp/digest")));
            // untouched sections keep defaults
            assert_eq!(config.pipe.email_time, "11:00");
            Ok(())
        });
    }

    #[test]
    fn test_env_override() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("HOME", jail.directory().display().to_string());
            jail.set_env("XDG_CONFIG_HOME", jail.directory().join("cfg").display().to_string());
            jail.set_env("DIGESTPIPE_PIPE__EMAIL_ADDRESS", "me@example.com");
            jail.set_env("DIGESTPIPE_AI__MODEL", "llama3.2");
            jail.set_env("DIGESTPIPE_STORAGE__ROOT", "/srv/digest");

            let config = ConfigLoader::load().map_err(|e| e.to_string())?;
            assert_eq!(
                config.pipe.email_address.as_deref(),
                Some("me@example.com")
            );
            assert_eq!(config.ai.model.as_deref(), Some("llama3.2"));
            assert_eq!(config.storage.root, Some(PathBuf::from("/srv/digest")));
            Ok(())
        });
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("bad.toml", "[pipe]\nsummary_frequency = \"weekly\"\n")?;
            let err = ConfigLoader::load_from_file(Path::new("bad.toml")).unwrap_err();
            assert!(matches!(err, DigestError::Config(_)));
            Ok(())
        });
    }

    #[test]
    fn test_storage_root_from_screenpipe_dir() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("SCREENPIPE_DIR", "/home/me/.screenpipe");
            assert_eq!(
                ConfigLoader::default_storage_root(),
                PathBuf::from("/home/me/.screenpipe/pipes/reddit-auto-posts")
            );
            Ok(())
        });
    }
}
