// src/services/extractor.rs

//! Exposure table extraction.
//!
//! Turns the raw exposure page into typed records. Each configured table's
//! first row names the columns; every later row is mapped onto those names.
//! A missing table yields no records, a table missing a required column is a
//! layout error.

use std::collections::HashMap;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{
    Config, ExposureCategory, ExposurePage, ExposureRecord, FINGERPRINT_FIELDS, STATUS_FIELD,
    TablesConfig,
};

/// Parses exposure pages.
#[derive(Debug, Clone)]
pub struct TableExtractor {
    tables: TablesConfig,
    marker_prefix: String,
    marker_pattern: Regex,
    required_columns: Vec<&'static str>,
}

impl TableExtractor {
    /// Create an extractor for the given tables.
    ///
    /// `status` is only required when historic rows are filtered out.
    pub fn new(tables: TablesConfig, marker_prefix: &str, include_historic: bool) -> Result<Self> {
        let pattern = format!(r"{}\s*(\S.*)", regex::escape(marker_prefix.trim()));
        let marker_pattern = Regex::new(&pattern)
            .map_err(|e| AppError::config(format!("Invalid marker prefix: {e}")))?;

        let mut required_columns = FINGERPRINT_FIELDS.to_vec();
        if !include_historic {
            required_columns.push(STATUS_FIELD);
        }

        Ok(Self {
            tables,
            marker_prefix: marker_prefix.trim().to_string(),
            marker_pattern,
            required_columns,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.tables.clone(),
            &config.source.marker_prefix,
            config.poll.include_historic,
        )
    }

    /// Read only the page's last-updated marker.
    pub fn extract_marker(&self, html: &str) -> Result<String> {
        let document = Html::parse_document(html);
        self.marker(&document)
    }

    /// Read the marker and all three tables.
    pub fn extract(&self, html: &str) -> Result<ExposurePage> {
        let document = Html::parse_document(html);
        let marker = self.marker(&document)?;

        let mut page = ExposurePage {
            marker,
            ..ExposurePage::default()
        };
        for category in ExposureCategory::ALL {
            let records = self.table(&document, self.tables.table_id(category))?;
            log::debug!("Extracted {} {} records", records.len(), category);
            match category {
                ExposureCategory::Monitor => page.monitor = records,
                ExposureCategory::Close => page.close = records,
                ExposureCategory::Casual => page.casual = records,
            }
        }
        Ok(page)
    }

    fn marker(&self, document: &Html) -> Result<String> {
        let strong = parse_selector("strong")?;
        document
            .select(&strong)
            .map(|el| normalize_whitespace(&element_text(&el)))
            .find_map(|text| {
                self.marker_pattern
                    .captures(&text)
                    .and_then(|caps| caps.get(1))
                    .map(|m| m.as_str().trim().to_string())
            })
            .ok_or_else(|| AppError::MissingMarker {
                prefix: self.marker_prefix.clone(),
            })
    }

    fn table(&self, document: &Html, table_id: &str) -> Result<Vec<ExposureRecord>> {
        let table_sel = parse_selector("table")?;
        let Some(table) = document
            .select(&table_sel)
            .find(|t| t.value().attr("id") == Some(table_id))
        else {
            log::debug!("Table '{}' not on page", table_id);
            return Ok(Vec::new());
        };

        let row_sel = parse_selector("tr")?;
        let th_sel = parse_selector("th")?;
        let td_sel = parse_selector("td")?;

        let mut rows = table.select(&row_sel);
        let Some(header_row) = rows.next() else {
            return Ok(Vec::new());
        };

        let mut header_cells: Vec<ElementRef> = header_row.select(&th_sel).collect();
        if header_cells.is_empty() {
            header_cells = header_row.select(&td_sel).collect();
        }
        let headers: Vec<String> = header_cells
            .iter()
            .map(|cell| normalize_whitespace(&element_text(cell)).to_lowercase())
            .collect();

        let columns: HashMap<&str, usize> = headers
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.as_str(), idx))
            .collect();
        for column in &self.required_columns {
            if !columns.contains_key(column) {
                return Err(AppError::missing_column(table_id, *column));
            }
        }

        let mut records = Vec::new();
        for row in rows {
            let cells: Vec<String> = row.select(&td_sel).map(|cell| cell_text(&cell)).collect();
            if cells.is_empty() {
                continue;
            }
            // Short rows leave trailing columns out of the record.
            let record = ExposureRecord::from_pairs(
                headers
                    .iter()
                    .zip(cells)
                    .map(|(name, value)| (name.as_str(), value)),
            );
            records.push(record);
        }
        Ok(records)
    }
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

fn element_text(el: &ElementRef) -> String {
    el.text().collect()
}

/// Cell value: edge whitespace trimmed, embedded line breaks removed.
fn cell_text(el: &ElementRef) -> String {
    element_text(el).trim().replace(['\n', '\r'], "")
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
        <p><strong>Page last updated: 4:00pm 01 August 2021</strong></p>
        <table id="closeT">
          <thead><tr><th>Status</th><th>Suburb</th><th>Place</th><th>Date</th>
            <th>Arrival Time</th><th>Departure Time</th></tr></thead>
          <tbody>
            <tr><td>New</td><td> Civic </td><td>Cafe
            X</td><td>2021-08-01</td><td>10:00am</td><td>11:00am</td></tr>
            <tr><td></td><td>Belconnen</td><td>Mall</td><td>2021-07-30</td>
              <td>1:00pm</td><td>2:00pm</td></tr>
          </tbody>
        </table>
        <table id="casualT">
          <tr><th>Status</th><th>Suburb</th><th>Place</th><th>Date</th>
            <th>Arrival Time</th><th>Departure Time</th></tr>
          <tr><td>Updated</td><td>Gungahlin</td><td>Library</td></tr>
        </table>
        </body></html>
    "#;

    fn tables() -> TablesConfig {
        TablesConfig {
            monitor: "monitorT".into(),
            close: "closeT".into(),
            casual: "casualT".into(),
        }
    }

    fn extractor() -> TableExtractor {
        TableExtractor::new(tables(), "Page last updated:", false).unwrap()
    }

    #[test]
    fn test_marker() {
        assert_eq!(
            extractor().extract_marker(PAGE).unwrap(),
            "4:00pm 01 August 2021"
        );
    }

    #[test]
    fn test_missing_marker() {
        let err = extractor()
            .extract_marker("<html><strong>Hello</strong></html>")
            .unwrap_err();
        assert!(matches!(err, AppError::MissingMarker { .. }));
    }

    #[test]
    fn test_rows_keyed_by_lowercase_headers() {
        let page = extractor().extract(PAGE).unwrap();
        assert_eq!(page.close.len(), 2);

        let first = &page.close[0];
        assert_eq!(first.get("suburb"), Some("Civic"));
        let place = first.get("place").unwrap();
        assert!(place.starts_with("Cafe") && place.ends_with('X'));
        assert!(!place.contains('\n'));
        assert_eq!(first.get("arrival time"), Some("10:00am"));
        assert_eq!(first.get("status"), Some("New"));
        assert_eq!(page.close[1].get("status"), Some(""));
    }

    #[test]
    fn test_rows_keep_page_order() {
        let page = extractor().extract(PAGE).unwrap();
        let suburbs: Vec<_> = page.close.iter().map(|r| r.get("suburb").unwrap()).collect();
        assert_eq!(suburbs, vec!["Civic", "Belconnen"]);
    }

    #[test]
    fn test_missing_table_is_empty() {
        let page = extractor().extract(PAGE).unwrap();
        assert!(page.monitor.is_empty());
    }

    #[test]
    fn test_short_row_yields_partial_record() {
        let page = extractor().extract(PAGE).unwrap();
        let partial = &page.casual[0];
        assert_eq!(partial.get("place"), Some("Library"));
        assert_eq!(partial.get("date"), None);
        assert_eq!(partial.len(), 3);
    }

    #[test]
    fn test_missing_required_column() {
        let html = r#"<strong>Page last updated: today</strong>
            <table id="closeT"><tr><th>Suburb</th><th>Place</th></tr>
            <tr><td>Civic</td><td>Cafe</td></tr></table>"#;
        let err = extractor().extract(html).unwrap_err();
        assert!(matches!(
            err,
            AppError::MissingColumn { ref table, ref column } if table == "closeT" && column == "date"
        ));
    }

    #[test]
    fn test_status_column_optional_with_historic() {
        let html = r#"<strong>Page last updated: today</strong>
            <table id="closeT"><tr><th>Suburb</th><th>Place</th><th>Date</th>
            <th>Arrival Time</th><th>Departure Time</th></tr>
            <tr><td>Civic</td><td>Cafe</td><td>1/8</td><td>1pm</td><td>2pm</td></tr></table>"#;
        assert!(extractor().extract(html).is_err());

        let lenient = TableExtractor::new(tables(), "Page last updated:", true).unwrap();
        let page = lenient.extract(html).unwrap();
        assert_eq!(page.close.len(), 1);
    }

    #[test]
    fn test_columns_found_by_name_not_position() {
        let html = r#"<strong>Page last updated: today</strong>
            <table id="closeT"><tr><th>Departure Time</th><th>Date</th><th>Place</th>
            <th>Suburb</th><th>Arrival Time</th><th>Status</th></tr>
            <tr><td>2pm</td><td>1/8</td><td>Cafe</td><td>Civic</td><td>1pm</td><td>New</td></tr>
            </table>"#;
        let page = extractor().extract(html).unwrap();
        assert_eq!(page.close[0].get("suburb"), Some("Civic"));
        assert_eq!(page.close[0].get("departure time"), Some("2pm"));
    }
}
