// src/error.rs

//! Unified error handling for the exposure watcher.

use std::fmt;

use thiserror::Error;

/// Result type alias for watcher operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Coarse classification used in operator-facing log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network failure, timeout or non-success status while fetching the page
    Fetch,
    /// The page no longer looks the way the extractor expects
    Layout,
    /// A message could not be handed to a subscriber
    Delivery,
    /// The key/value store rejected or failed an operation
    Store,
    /// Bad or missing configuration
    Config,
    /// Anything else (I/O, serialization)
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Fetch => "fetch",
            ErrorKind::Layout => "layout",
            ErrorKind::Delivery => "delivery",
            ErrorKind::Store => "store",
            ErrorKind::Config => "config",
            ErrorKind::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Page fetch answered with a non-success status
    #[error("Fetch of {url} returned status {status}")]
    Status { url: String, status: u16 },

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Store operation failed
    #[error("Store error: {0}")]
    Store(#[from] redis::RedisError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// A table header row lacks a column the pipeline needs
    #[error("Table '{table}' has no '{column}' column")]
    MissingColumn { table: String, column: String },

    /// A record lacks a field the pipeline needs
    #[error("Record is missing required field '{field}'")]
    MissingField { field: String },

    /// The page carries no last-updated marker
    #[error("Page has no last-updated marker (expected text starting with '{prefix}')")]
    MissingMarker { prefix: String },

    /// Other page-structure mismatch
    #[error("Layout error: {0}")]
    Layout(String),

    /// Sending to a single subscriber failed
    #[error("Delivery to {chat_id} failed: {message}")]
    Delivery { chat_id: String, message: String },

    /// The bot API answered `ok: false`
    #[error("Telegram API error in {method}: {description}")]
    Telegram { method: String, description: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a missing-field error.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Create a missing-column error.
    pub fn missing_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::MissingColumn {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Create a generic layout error.
    pub fn layout(message: impl Into<String>) -> Self {
        Self::Layout(message.into())
    }

    /// Create a delivery error for one subscriber.
    pub fn delivery(chat_id: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Delivery {
            chat_id: chat_id.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Http(_) | AppError::Status { .. } => ErrorKind::Fetch,
            AppError::Selector { .. }
            | AppError::MissingColumn { .. }
            | AppError::MissingField { .. }
            | AppError::MissingMarker { .. }
            | AppError::Layout(_) => ErrorKind::Layout,
            AppError::Delivery { .. } | AppError::Telegram { .. } => ErrorKind::Delivery,
            AppError::Store(_) => ErrorKind::Store,
            AppError::Config(_) | AppError::Validation(_) | AppError::Toml(_) | AppError::Url(_) => {
                ErrorKind::Config
            }
            AppError::Io(_) | AppError::Json(_) => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_errors_classified() {
        assert_eq!(AppError::missing_field("suburb").kind(), ErrorKind::Layout);
        assert_eq!(
            AppError::missing_column("table14458", "place").kind(),
            ErrorKind::Layout
        );
        assert_eq!(
            AppError::MissingMarker {
                prefix: "Page last updated:".into()
            }
            .kind(),
            ErrorKind::Layout
        );
    }

    #[test]
    fn test_fetch_and_delivery_classified() {
        let status = AppError::Status {
            url: "https://example.com".into(),
            status: 503,
        };
        assert_eq!(status.kind(), ErrorKind::Fetch);
        assert_eq!(AppError::delivery("42", "blocked").kind(), ErrorKind::Delivery);
    }

    #[test]
    fn test_missing_field_message() {
        let err = AppError::missing_field("arrival time");
        assert_eq!(
            err.to_string(),
            "Record is missing required field 'arrival time'"
        );
    }
}
