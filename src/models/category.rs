//! Exposure categories.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which exposure table a record came from.
///
/// Each category keeps its own fingerprint set; the sets never interact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExposureCategory {
    Monitor,
    Close,
    Casual,
}

impl ExposureCategory {
    /// Categories in the order a cycle processes them (page order).
    pub const ALL: [ExposureCategory; 3] = [
        ExposureCategory::Close,
        ExposureCategory::Casual,
        ExposureCategory::Monitor,
    ];

    /// Message header, icon included.
    pub fn header(&self) -> &'static str {
        match self {
            ExposureCategory::Monitor => "ℹ️ MONITOR FOR SYMPTOMS",
            ExposureCategory::Close => "☣️ CLOSE CONTACT",
            ExposureCategory::Casual => "😷 CASUAL CONTACT",
        }
    }

    /// Suffix of this category's fingerprint-set key.
    pub fn key_suffix(&self) -> &'static str {
        match self {
            ExposureCategory::Monitor => "MONITOR",
            ExposureCategory::Close => "CLOSE",
            ExposureCategory::Casual => "CASUAL",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExposureCategory::Monitor => "monitor",
            ExposureCategory::Close => "close",
            ExposureCategory::Casual => "casual",
        }
    }
}

impl fmt::Display for ExposureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_are_upper_case() {
        for category in ExposureCategory::ALL {
            let header = category.header();
            assert_eq!(header, header.to_uppercase());
        }
    }

    #[test]
    fn test_key_suffixes_distinct() {
        let [a, b, c] = ExposureCategory::ALL.map(|c| c.key_suffix());
        assert!(a != b && b != c && a != c);
    }
}
