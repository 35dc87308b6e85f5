// src/pipeline/cycle.rs

//! One fetch → diff → notify → persist pass.

use chrono::{DateTime, Utc};

use crate::context::AppContext;
use crate::error::Result;
use crate::models::ExposureCategory;
use crate::services::{Broadcast, DeliveryReport, DetectionSummary};

/// What a cycle did.
#[derive(Debug)]
pub enum CycleOutcome {
    /// Page marker matched the stored one; nothing was parsed or diffed
    Unchanged { marker: String },
    /// Tables were diffed and the new marker stored
    Updated(CycleReport),
}

/// Details of a cycle that processed the tables.
#[derive(Debug)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub previous_marker: Option<String>,
    pub marker: String,
    pub subscriber_count: usize,
    pub categories: Vec<DetectionSummary>,
    pub deliveries: DeliveryReport,
}

impl CycleReport {
    /// New sites across all categories.
    pub fn notified(&self) -> usize {
        self.categories.iter().map(|s| s.notified).sum()
    }
}

/// Run a single poll cycle.
///
/// The stored marker is written last, and only if every category was
/// processed; any error leaves it untouched so the next cycle retries.
pub async fn run_cycle(ctx: &AppContext) -> Result<CycleOutcome> {
    let started_at = Utc::now();
    log::info!("Update started: fetching {}", ctx.source.describe());

    let html = ctx.source.fetch().await?;
    let marker = ctx.extractor.extract_marker(&html)?;

    let marker_key = ctx.keys.marker();
    let previous_marker = ctx.store.get(&marker_key).await?;
    log::debug!("Marker: stored {:?}, page {:?}", previous_marker, marker);

    if previous_marker.as_deref() == Some(marker.as_str()) {
        log::info!("No update required (page last updated {})", marker);
        return Ok(CycleOutcome::Unchanged { marker });
    }

    let page = ctx.extractor.extract(&html)?;
    log::info!(
        "Page updated {}: {} rows across {} categories",
        page.marker,
        page.record_count(),
        ExposureCategory::ALL.len()
    );

    // One subscriber snapshot serves the whole cycle.
    let subscribers = ctx.store.set_members(&ctx.keys.subscribers()).await?;
    let mut sink = Broadcast::new(&ctx.notifier, &subscribers);

    let mut categories = Vec::with_capacity(ExposureCategory::ALL.len());
    for category in ExposureCategory::ALL {
        let summary = ctx
            .detector
            .process(
                category,
                page.records(category),
                ctx.store.as_ref(),
                &ctx.keys,
                &mut sink,
            )
            .await?;
        categories.push(summary);
    }

    ctx.store.set(&marker_key, &page.marker).await?;

    let report = CycleReport {
        started_at,
        finished_at: Utc::now(),
        previous_marker,
        marker: page.marker.clone(),
        subscriber_count: subscribers.len(),
        deliveries: sink.report(),
        categories,
    };
    log::info!(
        "Update done: {} new sites, {}/{} deliveries succeeded",
        report.notified(),
        report.deliveries.delivered,
        report.deliveries.attempted
    );
    Ok(CycleOutcome::Updated(report))
}

/// Log a cycle result. Failures are reported to operators only.
pub fn log_outcome(result: &Result<CycleOutcome>) {
    match result {
        Ok(CycleOutcome::Unchanged { .. }) => {}
        Ok(CycleOutcome::Updated(report)) => {
            let elapsed = report.finished_at - report.started_at;
            log::debug!(
                "Cycle took {}ms (marker {:?} -> {:?})",
                elapsed.num_milliseconds(),
                report.previous_marker,
                report.marker
            );
        }
        Err(error) => {
            log::error!(
                "Update failed ({} error): {}. Marker left unchanged; retrying next cycle.",
                error.kind(),
                error
            );
        }
    }
}
