//! Application configuration structures.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::ExposureCategory;

/// Environment variable overriding `bot.token`.
pub const BOT_TOKEN_ENV: &str = "EXPOSURE_BOT_TOKEN";

/// Environment variable overriding the store connection URL.
pub const REDIS_URL_ENV: &str = "EXPOSURE_REDIS_URL";

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Page fetching settings
    #[serde(default)]
    pub source: SourceConfig,

    /// Table element ids per category
    #[serde(default)]
    pub tables: TablesConfig,

    /// Poll loop settings
    #[serde(default)]
    pub poll: PollConfig,

    /// Key/value store connection
    #[serde(default)]
    pub store: StoreConfig,

    /// Messaging bot settings
    #[serde(default)]
    pub bot: BotConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.apply_env();
        Ok(config)
    }

    /// Load configuration, or the defaults when the file does not exist.
    ///
    /// A file that exists but cannot be read or parsed is an error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::warn!("Config file {:?} not found. Using defaults.", path);
            let mut config = Self::default();
            config.apply_env();
            return Ok(config);
        }
        Self::load(path)
    }

    /// Let secrets come from the environment instead of the file.
    pub fn apply_env(&mut self) {
        if let Ok(token) = std::env::var(BOT_TOKEN_ENV) {
            if !token.trim().is_empty() {
                self.bot.token = token;
            }
        }
        if let Ok(url) = std::env::var(REDIS_URL_ENV) {
            if !url.trim().is_empty() {
                self.store.url = Some(url);
            }
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.source.url.trim().is_empty() {
            return Err(AppError::validation("source.url is empty"));
        }
        url::Url::parse(&self.source.url)?;
        if self.source.user_agent.trim().is_empty() {
            return Err(AppError::validation("source.user_agent is empty"));
        }
        if self.source.timeout_secs == 0 {
            return Err(AppError::validation("source.timeout_secs must be > 0"));
        }
        if self.source.marker_prefix.trim().is_empty() {
            return Err(AppError::validation("source.marker_prefix is empty"));
        }
        for category in ExposureCategory::ALL {
            if self.tables.table_id(category).trim().is_empty() {
                return Err(AppError::validation(format!(
                    "tables.{} is empty",
                    category
                )));
            }
        }
        if self.poll.interval_secs == 0 {
            return Err(AppError::validation("poll.interval_secs must be > 0"));
        }
        if self.store.key_prefix.trim().is_empty() {
            return Err(AppError::validation("store.key_prefix is empty"));
        }
        if self.bot.delivery_concurrency == 0 {
            return Err(AppError::validation(
                "bot.delivery_concurrency must be > 0",
            ));
        }
        Ok(())
    }
}

/// Where and how to fetch the exposure page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Page URL
    #[serde(default = "defaults::url")]
    pub url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Text that precedes the page's last-updated marker
    #[serde(default = "defaults::marker_prefix")]
    pub marker_prefix: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: defaults::url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            marker_prefix: defaults::marker_prefix(),
        }
    }
}

/// HTML `id` of the table holding each category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TablesConfig {
    #[serde(default = "defaults::monitor_table")]
    pub monitor: String,

    #[serde(default = "defaults::close_table")]
    pub close: String,

    #[serde(default = "defaults::casual_table")]
    pub casual: String,
}

impl TablesConfig {
    pub fn table_id(&self, category: ExposureCategory) -> &str {
        match category {
            ExposureCategory::Monitor => &self.monitor,
            ExposureCategory::Close => &self.close,
            ExposureCategory::Casual => &self.casual,
        }
    }
}

impl Default for TablesConfig {
    fn default() -> Self {
        Self {
            monitor: defaults::monitor_table(),
            close: defaults::close_table(),
            casual: defaults::casual_table(),
        }
    }
}

/// Poll loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// Seconds between the starts of consecutive cycles
    #[serde(default = "defaults::interval")]
    pub interval_secs: u64,

    /// Idle time enforced after a cycle that overran the interval
    #[serde(default = "defaults::min_idle")]
    pub min_idle_secs: u64,

    /// Notify rows the page marks as historic (empty status)
    #[serde(default)]
    pub include_historic: bool,
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn min_idle(&self) -> Duration {
        Duration::from_secs(self.min_idle_secs)
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: defaults::interval(),
            min_idle_secs: defaults::min_idle(),
            include_historic: false,
        }
    }
}

/// Redis connection parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "defaults::store_host")]
    pub host: String,

    #[serde(default = "defaults::store_port")]
    pub port: u16,

    #[serde(default)]
    pub db: i64,

    #[serde(default)]
    pub password: Option<String>,

    /// Full connection URL; wins over host/port/db when set
    #[serde(default)]
    pub url: Option<String>,

    /// Prefix shared by every key the watcher touches
    #[serde(default = "defaults::key_prefix")]
    pub key_prefix: String,
}

impl StoreConfig {
    /// Connection URL in `redis://` form.
    pub fn connection_url(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }
        match &self.password {
            Some(password) => format!(
                "redis://:{}@{}:{}/{}",
                password, self.host, self.port, self.db
            ),
            None => format!("redis://{}:{}/{}", self.host, self.port, self.db),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: defaults::store_host(),
            port: defaults::store_port(),
            db: 0,
            password: None,
            url: None,
            key_prefix: defaults::key_prefix(),
        }
    }
}

/// Messaging bot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Bot API token
    #[serde(default)]
    pub token: String,

    /// Bot API base URL
    #[serde(default = "defaults::api_url")]
    pub api_url: String,

    /// Long-poll timeout for command updates, in seconds
    #[serde(default = "defaults::long_poll")]
    pub long_poll_secs: u64,

    /// Maximum concurrent sends while fanning out one message
    #[serde(default = "defaults::delivery_concurrency")]
    pub delivery_concurrency: usize,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_url: defaults::api_url(),
            long_poll_secs: defaults::long_poll(),
            delivery_concurrency: defaults::delivery_concurrency(),
        }
    }
}

mod defaults {
    // Source defaults
    pub fn url() -> String {
        "https://www.covid19.act.gov.au/act-status-and-response/act-covid-19-exposure-locations"
            .into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; exposure-watch/0.1)".into()
    }
    pub fn timeout() -> u64 {
        20
    }
    pub fn marker_prefix() -> String {
        "Page last updated:".into()
    }

    // Table defaults
    pub fn monitor_table() -> String {
        "table04293".into()
    }
    pub fn close_table() -> String {
        "table14458".into()
    }
    pub fn casual_table() -> String {
        "table66547".into()
    }

    // Poll defaults
    pub fn interval() -> u64 {
        300
    }
    pub fn min_idle() -> u64 {
        10
    }

    // Store defaults
    pub fn store_host() -> String {
        "127.0.0.1".into()
    }
    pub fn store_port() -> u16 {
        6379
    }
    pub fn key_prefix() -> String {
        "ACTCOVID".into()
    }

    // Bot defaults
    pub fn api_url() -> String {
        "https://api.telegram.org".into()
    }
    pub fn long_poll() -> u64 {
        30
    }
    pub fn delivery_concurrency() -> usize {
        4
    }
}
