// src/context.rs

//! Shared runtime context.
//!
//! Built once at startup and handed to the poll loop, the command listener
//! and the notifier. Dropped on shutdown.

use std::sync::Arc;

use crate::bot::Messenger;
use crate::error::Result;
use crate::models::Config;
use crate::services::{ChangeDetector, Notifier, PageSource, TableExtractor};
use crate::storage::{KeyValueStore, StoreKeys};

/// Everything a poll cycle or command needs.
pub struct AppContext {
    pub config: Arc<Config>,
    pub keys: StoreKeys,
    pub store: Arc<dyn KeyValueStore>,
    pub source: Arc<dyn PageSource>,
    pub extractor: TableExtractor,
    pub detector: ChangeDetector,
    pub notifier: Notifier,
}

impl AppContext {
    pub fn new(
        config: Config,
        store: Arc<dyn KeyValueStore>,
        source: Arc<dyn PageSource>,
        messenger: Arc<dyn Messenger>,
    ) -> Result<Self> {
        let extractor = TableExtractor::from_config(&config)?;
        Ok(Self {
            keys: StoreKeys::new(config.store.key_prefix.clone()),
            detector: ChangeDetector::new(config.poll.include_historic),
            notifier: Notifier::new(messenger, config.bot.delivery_concurrency),
            extractor,
            store,
            source,
            config: Arc::new(config),
        })
    }
}
