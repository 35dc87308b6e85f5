//! Exposure site records and their identities.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::ExposureCategory;

/// Fields that identify an exposure event, in hashing order.
pub const FINGERPRINT_FIELDS: [&str; 5] =
    ["suburb", "place", "date", "arrival time", "departure time"];

/// Field that is empty when the page marks a site as historic.
pub const STATUS_FIELD: &str = "status";

/// One row of an exposure table, keyed by lower-cased column header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ExposureRecord {
    fields: BTreeMap<String, String>,
}

impl ExposureRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from `(field, value)` pairs. Field names are lower-cased.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut record = Self::new();
        for (key, value) in pairs {
            record.insert(key.as_ref(), value);
        }
        record
    }

    pub fn insert(&mut self, field: &str, value: impl Into<String>) {
        self.fields.insert(field.to_lowercase(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// Look up a field the pipeline cannot work without.
    pub fn require(&self, field: &str) -> Result<&str> {
        self.get(field).ok_or_else(|| AppError::missing_field(field))
    }

    /// Whether the page marked this site as no longer active.
    pub fn is_historic(&self) -> Result<bool> {
        Ok(self.require(STATUS_FIELD)?.is_empty())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Stable identity of an exposure event (hex SHA-256).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub(crate) fn from_hex(hex: String) -> Self {
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A record that has not been notified before.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEvent {
    pub category: ExposureCategory,
    pub record: ExposureRecord,
}

/// Everything one fetch of the page yields.
#[derive(Debug, Clone, Default)]
pub struct ExposurePage {
    /// Page-reported "last updated" text, compared verbatim
    pub marker: String,
    pub monitor: Vec<ExposureRecord>,
    pub close: Vec<ExposureRecord>,
    pub casual: Vec<ExposureRecord>,
}

impl ExposurePage {
    pub fn records(&self, category: ExposureCategory) -> &[ExposureRecord] {
        match category {
            ExposureCategory::Monitor => &self.monitor,
            ExposureCategory::Close => &self.close,
            ExposureCategory::Casual => &self.casual,
        }
    }

    pub fn record_count(&self) -> usize {
        self.monitor.len() + self.close.len() + self.casual.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> ExposureRecord {
        ExposureRecord::from_pairs([
            ("Suburb", "Civic"),
            ("Place", "Cafe X"),
            ("Status", "Contact"),
        ])
    }

    #[test]
    fn test_field_names_lower_cased() {
        let record = sample_record();
        assert_eq!(record.get("suburb"), Some("Civic"));
        assert_eq!(record.get("Suburb"), None);
    }

    #[test]
    fn test_require_missing_field() {
        let record = sample_record();
        let err = record.require("date").unwrap_err();
        assert!(matches!(err, AppError::MissingField { field } if field == "date"));
    }

    #[test]
    fn test_is_historic() {
        let mut record = sample_record();
        assert!(!record.is_historic().unwrap());
        record.insert("status", "");
        assert!(record.is_historic().unwrap());
    }

    #[test]
    fn test_is_historic_without_status_is_error() {
        let record = ExposureRecord::from_pairs([("suburb", "Civic")]);
        assert!(record.is_historic().is_err());
    }

    #[test]
    fn test_page_records_by_category() {
        let page = ExposurePage {
            marker: "1 August".into(),
            close: vec![sample_record()],
            ..ExposurePage::default()
        };
        assert_eq!(page.records(ExposureCategory::Close).len(), 1);
        assert!(page.records(ExposureCategory::Casual).is_empty());
        assert_eq!(page.record_count(), 1);
    }
}
