// src/config.rs

//! Application configuration.
//!
//! Two layers: a TOML file for watcher behavior (URLs, intervals, selectors)
//! and environment variables for secrets and deployment knobs (bot token,
//! chat id, store URL, liveness port).

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// Root application configuration (TOML layer).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Polling and heartbeat behavior
    #[serde(default)]
    pub watcher: WatcherConfig,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Page layout extraction settings
    #[serde(default)]
    pub extract: ExtractConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.watcher.check_interval_secs == 0 {
            return Err(AppError::config("watcher.check_interval_secs must be > 0"));
        }
        if self.watcher.heartbeat_hour > 23 {
            return Err(AppError::config("watcher.heartbeat_hour must be 0-23"));
        }
        if self.watcher.heartbeat_minute > 59 {
            return Err(AppError::config("watcher.heartbeat_minute must be 0-59"));
        }
        Url::parse(&self.watcher.url)
            .map_err(|e| AppError::config(format!("watcher.url is invalid: {e}")))?;
        Url::parse(&self.watcher.alt_url)
            .map_err(|e| AppError::config(format!("watcher.alt_url is invalid: {e}")))?;
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::config("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::config("http.timeout_secs must be > 0"));
        }
        self.extract.validate()
    }
}

/// Polling loop and heartbeat settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Main afisha page URL (primary layout)
    #[serde(default = "defaults::url")]
    pub url: String,

    /// Alternate afisha page URL (fallback table layout)
    #[serde(default = "defaults::alt_url")]
    pub alt_url: String,

    /// Seconds between the end of one poll cycle and the start of the next
    #[serde(default = "defaults::check_interval")]
    pub check_interval_secs: u64,

    /// Local wall-clock hour after which the daily heartbeat is due
    #[serde(default = "defaults::heartbeat_hour")]
    pub heartbeat_hour: u32,

    /// Local wall-clock minute of the heartbeat threshold
    #[serde(default)]
    pub heartbeat_minute: u32,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            url: defaults::url(),
            alt_url: defaults::alt_url(),
            check_interval_secs: defaults::check_interval(),
            heartbeat_hour: defaults::heartbeat_hour(),
            heartbeat_minute: 0,
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for page fetches
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Extraction settings for both page layouts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Site origin used to qualify relative links
    #[serde(default = "defaults::origin")]
    pub origin: String,

    /// CSS selectors for the primary layout
    #[serde(default)]
    pub primary: PrimarySelectors,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            origin: defaults::origin(),
            primary: PrimarySelectors::default(),
        }
    }
}

impl ExtractConfig {
    fn validate(&self) -> Result<()> {
        if self.origin.trim().is_empty() {
            return Err(AppError::config("extract.origin is empty"));
        }
        let p = &self.primary;
        for (name, value) in [
            ("item_selector", &p.item_selector),
            ("day_selector", &p.day_selector),
            ("time_selector", &p.time_selector),
            ("title_selector", &p.title_selector),
            ("link_selector", &p.link_selector),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::config(format!("extract.primary.{name} is empty")));
            }
        }
        Ok(())
    }
}

/// CSS selectors for the primary afisha layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrimarySelectors {
    /// Selector for each afisha item container
    #[serde(default = "defaults::item_selector")]
    pub item_selector: String,

    /// Selector for the day element within an item
    #[serde(default = "defaults::day_selector")]
    pub day_selector: String,

    /// Selector for the time element within an item
    #[serde(default = "defaults::time_selector")]
    pub time_selector: String,

    /// Selector for the title element within an item
    #[serde(default = "defaults::title_selector")]
    pub title_selector: String,

    /// Selector for the link element within an item
    #[serde(default = "defaults::link_selector")]
    pub link_selector: String,

    /// HTML attribute name for extracting links (usually "href")
    #[serde(default = "defaults::link_attr")]
    pub link_attr: String,
}

impl Default for PrimarySelectors {
    fn default() -> Self {
        Self {
            item_selector: defaults::item_selector(),
            day_selector: defaults::day_selector(),
            time_selector: defaults::time_selector(),
            title_selector: defaults::title_selector(),
            link_selector: defaults::link_selector(),
            link_attr: defaults::link_attr(),
        }
    }
}

/// Environment-variable configuration (secrets and deployment knobs).
#[derive(Debug, Clone)]
pub struct EnvConfig {
    /// Telegram bot token. Required; absence is a hard startup failure.
    pub telegram_token: String,

    /// Telegram chat id. Required only at send time; absence fails that send.
    pub telegram_chat_id: Option<String>,

    /// Redis connection URL
    pub redis_url: String,

    /// HTTP listen port for the liveness endpoint
    pub port: u16,
}

impl EnvConfig {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let telegram_token = get("TELEGRAM_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AppError::config("TELEGRAM_TOKEN is not set"))?;

        let port = match get("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|e| AppError::config(format!("PORT is invalid: {e}")))?,
            None => defaults::port(),
        };

        Ok(Self {
            telegram_token,
            telegram_chat_id: get("TELEGRAM_CHAT_ID").filter(|c| !c.trim().is_empty()),
            redis_url: get("REDIS_URL").unwrap_or_else(defaults::redis_url),
            port,
        })
    }
}

mod defaults {
    // Watcher defaults
    pub fn url() -> String {
        "https://puppet-minsk.by/afisha".into()
    }
    pub fn alt_url() -> String {
        "https://puppet-minsk.by/bilety/afisha".into()
    }
    pub fn check_interval() -> u64 {
        120
    }
    pub fn heartbeat_hour() -> u32 {
        9
    }

    // HTTP defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; afisha-watch/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Extraction defaults
    pub fn origin() -> String {
        "https://puppet-minsk.by".into()
    }
    pub fn item_selector() -> String {
        ".afisha_item".into()
    }
    pub fn day_selector() -> String {
        ".afisha-day".into()
    }
    pub fn time_selector() -> String {
        ".afisha-time".into()
    }
    pub fn title_selector() -> String {
        ".afisha-title".into()
    }
    pub fn link_selector() -> String {
        ".afisha_item-hover".into()
    }
    pub fn link_attr() -> String {
        "href".into()
    }

    // Environment defaults
    pub fn redis_url() -> String {
        "redis://localhost:6379".into()
    }
    pub fn port() -> u16 {
        3000
    }
}
