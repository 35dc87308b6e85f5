// src/models/mod.rs

//! Domain models for the exposure watcher.

mod category;
mod config;
mod record;

// Re-export all public types
pub use category::ExposureCategory;
pub use config::{
    BOT_TOKEN_ENV, BotConfig, Config, PollConfig, REDIS_URL_ENV, SourceConfig, StoreConfig,
    TablesConfig,
};
pub use record::{
    ExposurePage, ExposureRecord, FINGERPRINT_FIELDS, Fingerprint, NotificationEvent,
    STATUS_FIELD,
};
