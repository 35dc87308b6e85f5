// src/services/notifier.rs

//! Notification rendering and fan-out.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};

use crate::bot::Messenger;
use crate::error::Result;
use crate::models::NotificationEvent;
use crate::services::detector::EventSink;

/// Render the subscriber message for a new exposure site.
pub fn render_message(event: &NotificationEvent) -> Result<String> {
    let record = &event.record;
    Ok(format!(
        "{}\n{}\n{} @ {}\nBetween {} and {}\n",
        event.category.header(),
        record.require("suburb")?.to_uppercase(),
        record.require("date")?,
        record.require("place")?.trim(),
        record.require("arrival time")?,
        record.require("departure time")?,
    ))
}

/// Outcome of fanning messages out to subscribers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub attempted: usize,
    pub delivered: usize,
    pub failed: usize,
}

impl DeliveryReport {
    pub fn merge(&mut self, other: DeliveryReport) {
        self.attempted += other.attempted;
        self.delivered += other.delivered;
        self.failed += other.failed;
    }
}

/// Sends rendered messages to every subscriber.
pub struct Notifier {
    messenger: Arc<dyn Messenger>,
    concurrency: usize,
}

impl Notifier {
    pub fn new(messenger: Arc<dyn Messenger>, concurrency: usize) -> Self {
        Self {
            messenger,
            concurrency: concurrency.max(1),
        }
    }

    /// Send `text` to each subscriber.
    ///
    /// A failed send is logged and counted; it never stops the others.
    pub async fn broadcast(&self, text: &str, subscribers: &[String]) -> DeliveryReport {
        let mut report = DeliveryReport {
            attempted: subscribers.len(),
            ..DeliveryReport::default()
        };

        let sends: Vec<_> = subscribers
            .iter()
            .map(|chat_id| async move { (chat_id, self.messenger.send(chat_id, text).await) })
            .collect();
        let mut sends = stream::iter(sends).buffer_unordered(self.concurrency);

        while let Some((chat_id, result)) = sends.next().await {
            match result {
                Ok(()) => report.delivered += 1,
                Err(error) => {
                    report.failed += 1;
                    log::warn!("Failed to notify {}: {}", chat_id, error);
                }
            }
        }
        report
    }

    /// Render and broadcast one event.
    pub async fn notify(
        &self,
        event: &NotificationEvent,
        subscribers: &[String],
    ) -> Result<DeliveryReport> {
        let text = render_message(event)?;
        log::info!(
            "New {} site: {} ({} subscribers)",
            event.category,
            text.lines().nth(1).unwrap_or_default(),
            subscribers.len()
        );
        Ok(self.broadcast(&text, subscribers).await)
    }
}

/// Event sink bound to one subscriber snapshot.
pub struct Broadcast<'a> {
    notifier: &'a Notifier,
    subscribers: &'a [String],
    report: DeliveryReport,
}

impl<'a> Broadcast<'a> {
    pub fn new(notifier: &'a Notifier, subscribers: &'a [String]) -> Self {
        Self {
            notifier,
            subscribers,
            report: DeliveryReport::default(),
        }
    }

    /// Deliveries so far.
    pub fn report(&self) -> DeliveryReport {
        self.report
    }
}

#[async_trait]
impl EventSink for Broadcast<'_> {
    async fn publish(&mut self, event: &NotificationEvent) -> Result<()> {
        let report = self.notifier.notify(event, self.subscribers).await?;
        self.report.merge(report);
        Ok(())
    }
}
