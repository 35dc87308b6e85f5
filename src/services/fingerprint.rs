// src/services/fingerprint.rs

//! Row canonicalization.
//!
//! Reduces an exposure record to a SHA-256 fingerprint over the fields that
//! identify the event. Fields outside [`FINGERPRINT_FIELDS`] (e.g. `status`)
//! never affect identity.

use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::models::{ExposureRecord, FINGERPRINT_FIELDS, Fingerprint};

/// Characters dropped from every field before hashing.
const NOISE: [char; 5] = [',', '\n', '\r', '(', ')'];

/// Canonical form of one field value.
fn canonical_field(value: &str) -> String {
    value
        .trim()
        .chars()
        .filter(|c| !NOISE.contains(c))
        .collect::<String>()
        .to_uppercase()
}

/// Compute the fingerprint of a record.
///
/// Fails with `MissingField` if any identifying field is absent.
pub fn fingerprint(record: &ExposureRecord) -> Result<Fingerprint> {
    let mut hasher = Sha256::new();
    for field in FINGERPRINT_FIELDS {
        let value = record.require(field)?;
        hasher.update(canonical_field(value).as_bytes());
    }
    Ok(Fingerprint::from_hex(hex::encode(hasher.finalize())))
}
