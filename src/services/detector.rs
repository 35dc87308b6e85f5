// src/services/detector.rs

//! Change detection against the known fingerprint sets.
//!
//! A record is new when its fingerprint is not in its category's set. New
//! records are published first and remembered second, so a crash in between
//! repeats the notification rather than losing it.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ExposureCategory, ExposureRecord, Fingerprint, NotificationEvent};
use crate::services::fingerprint::fingerprint;
use crate::storage::{KeyValueStore, StoreKeys};

/// Receiver of newly detected exposure sites.
#[async_trait]
pub trait EventSink: Send {
    async fn publish(&mut self, event: &NotificationEvent) -> Result<()>;
}

/// Per-category counters from one detection pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionSummary {
    pub category: ExposureCategory,
    pub scanned: usize,
    pub historic_skipped: usize,
    pub already_known: usize,
    pub notified: usize,
}

impl DetectionSummary {
    fn new(category: ExposureCategory, scanned: usize) -> Self {
        Self {
            category,
            scanned,
            historic_skipped: 0,
            already_known: 0,
            notified: 0,
        }
    }
}

/// Decides which records are new.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeDetector {
    include_historic: bool,
}

impl ChangeDetector {
    pub fn new(include_historic: bool) -> Self {
        Self { include_historic }
    }

    /// Records eligible for notification, with their fingerprints, in page
    /// order. Also returns how many historic rows were dropped.
    ///
    /// Fails on the first unusable record, before anything is published.
    pub fn candidates<'a>(
        &self,
        records: &'a [ExposureRecord],
    ) -> Result<(Vec<(&'a ExposureRecord, Fingerprint)>, usize)> {
        let mut candidates = Vec::with_capacity(records.len());
        let mut historic = 0;
        for record in records {
            if !self.include_historic && record.is_historic()? {
                historic += 1;
                continue;
            }
            candidates.push((record, fingerprint(record)?));
        }
        Ok((candidates, historic))
    }

    /// Publish every unseen record of `category` and add it to the known set.
    pub async fn process(
        &self,
        category: ExposureCategory,
        records: &[ExposureRecord],
        store: &dyn KeyValueStore,
        keys: &StoreKeys,
        sink: &mut dyn EventSink,
    ) -> Result<DetectionSummary> {
        let mut summary = DetectionSummary::new(category, records.len());
        let (candidates, historic) = self.candidates(records)?;
        summary.historic_skipped = historic;

        let known_key = keys.fingerprints(category);
        for (record, fingerprint) in candidates {
            if store.set_is_member(&known_key, fingerprint.as_str()).await? {
                summary.already_known += 1;
                continue;
            }

            let event = NotificationEvent {
                category,
                record: record.clone(),
            };
            sink.publish(&event).await?;
            store.set_add(&known_key, fingerprint.as_str()).await?;
            summary.notified += 1;
        }

        log::info!(
            "{}: {} rows, {} historic, {} known, {} new",
            category,
            summary.scanned,
            summary.historic_skipped,
            summary.already_known,
            summary.notified
        );
        Ok(summary)
    }
}
