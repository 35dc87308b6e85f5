//! Service layer for the exposure watcher.
//!
//! This module contains the business logic for:
//! - Page extraction (`TableExtractor`)
//! - Record fingerprinting (`fingerprint`)
//! - Change detection (`ChangeDetector`)
//! - Subscriber notification (`Notifier`)
//! - Page retrieval (`PageSource`)

pub mod detector;
pub mod extractor;
pub mod fingerprint;
pub mod notifier;
pub mod source;

pub use detector::{ChangeDetector, DetectionSummary, EventSink};
pub use extractor::TableExtractor;
pub use fingerprint::fingerprint;
pub use notifier::{Broadcast, DeliveryReport, Notifier, render_message};
pub use source::{FilePageSource, HttpPageSource, PageSource};
