//! # Configuration Management Module
//!
//! Configuration is read from a TOML file and then overridden by environment
//! variables, so a deployment can keep secrets out of the file entirely.
//!
//! ## Configuration Structure
//!
//! - [`BotConfig`] - transport token, the single authorized user, locale, message size
//! - [`StorageConfig`] - where photos and documents live and their limits
//! - [`LoggingConfig`] - default log level
//!
//! ## Configuration File Format
//!
//! ```toml
//! [bot]
//! token = "123456:ABC..."
//! authorized_user_id = 12345678
//! locale = "en"
//! listing_limit = 3500
//!
//! [storage]
//! base_dir = "/srv/filebot"
//! image_extensions = [".jpg", ".jpeg", ".png", ".webp", ".bmp"]
//! ```
//!
//! ## Environment Integration
//!
//! `TELEGRAM_TOKEN`, `AUTHORIZED_USER_ID`, `SAVE_PATH` and `BOT_LOCALE` take
//! precedence over the file. Precedence: Environment > Config file > Defaults.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

use crate::bot::messages::Locale;

pub const ENV_TOKEN: &str = "TELEGRAM_TOKEN";
pub const ENV_AUTHORIZED_USER: &str = "AUTHORIZED_USER_ID";
pub const ENV_SAVE_PATH: &str = "SAVE_PATH";
pub const ENV_LOCALE: &str = "BOT_LOCALE";

/// Value written by `init`; treated as "no token configured".
const TOKEN_PLACEHOLDER: &str = "YOUR_BOT_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub bot: BotConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    pub token: String,
    pub authorized_user_id: i64,
    #[serde(default)]
    pub locale: Locale,
    /// Maximum characters per outgoing text message.
    #[serde(default = "default_listing_limit")]
    pub listing_limit: usize,
    /// Send "server online" to the authorized user at startup.
    #[serde(default = "default_true")]
    pub announce_startup: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub base_dir: String,
    #[serde(default = "default_pictures_dir")]
    pub pictures_dir_name: String,
    #[serde(default = "default_documents_dir")]
    pub documents_dir_name: String,
    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,
    /// Images above this size are delivered as documents.
    #[serde(default = "default_max_photo_bytes")]
    pub max_photo_bytes: u64,
    /// Largest upload the transport lets a bot download.
    #[serde(default = "default_max_download_bytes")]
    pub max_download_bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig { level: "info".to_string() }
    }
}

fn default_listing_limit() -> usize { 3500 }
fn default_true() -> bool { true }
fn default_pictures_dir() -> String { "Pictures".to_string() }
fn default_documents_dir() -> String { "Documents".to_string() }
fn default_image_extensions() -> Vec<String> {
    [".jpg", ".jpeg", ".png", ".webp", ".bmp"].iter().map(|s| s.to_string()).collect()
}
fn default_max_photo_bytes() -> u64 { 1024 * 1024 * 1024 }
fn default_max_download_bytes() -> u64 { 20 * 1024 * 1024 }

impl Config {
    /// Load configuration from a file, then apply environment overrides.
    ///
    /// A missing file is not an error: defaults plus environment are used.
    pub async fn load(path: &str) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            let content = fs::read_to_string(path).await
                .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;
            toml::from_str::<Config>(&content)
                .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?
        } else {
            log::debug!("Config file {} not found, using defaults and environment", path);
            Config::default()
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in production).
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup(ENV_TOKEN).filter(|t| !t.trim().is_empty()) {
            self.bot.token = token.trim().to_string();
        }
        if let Some(raw) = lookup(ENV_AUTHORIZED_USER) {
            self.bot.authorized_user_id = raw.trim().parse()
                .map_err(|e| anyhow!("Invalid {} '{}': {}", ENV_AUTHORIZED_USER, raw, e))?;
        }
        if let Some(path) = lookup(ENV_SAVE_PATH).filter(|p| !p.trim().is_empty()) {
            self.storage.base_dir = path.trim().to_string();
        }
        if let Some(raw) = lookup(ENV_LOCALE) {
            self.bot.locale = raw.parse()?;
        }
        Ok(())
    }

    /// Reject configurations the bot cannot start with.
    pub fn validate(&self) -> Result<()> {
        let token = self.bot.token.trim();
        if token.is_empty() || token == TOKEN_PLACEHOLDER {
            return Err(anyhow!("No bot token configured. Set {} or bot.token in the config file.", ENV_TOKEN));
        }
        if self.bot.authorized_user_id == 0 {
            return Err(anyhow!("No authorized user configured. Set {} or bot.authorized_user_id.", ENV_AUTHORIZED_USER));
        }
        if self.bot.listing_limit < 64 {
            return Err(anyhow!("bot.listing_limit must be at least 64 characters"));
        }
        if self.storage.pictures_dir_name == self.storage.documents_dir_name {
            return Err(anyhow!("Pictures and documents must use different directories"));
        }
        Ok(())
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content).await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bot: BotConfig {
                token: TOKEN_PLACEHOLDER.to_string(),
                authorized_user_id: 0,
                locale: Locale::default(),
                listing_limit: default_listing_limit(),
                announce_startup: true,
            },
            storage: StorageConfig {
                base_dir: "./data".to_string(),
                pictures_dir_name: default_pictures_dir(),
                documents_dir_name: default_documents_dir(),
                image_extensions: default_image_extensions(),
                max_photo_bytes: default_max_photo_bytes(),
                max_download_bytes: default_max_download_bytes(),
            },
            logging: LoggingConfig::default(),
        }
    }
}
