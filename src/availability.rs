//! Domain availability heuristic over raw WHOIS text.
//!
//! Registries signal "no such registration" with free-form phrases. The
//! marker list below covers the common gTLD wordings only; registries that
//! phrase it differently (many ccTLDs) are reported as registered, and error
//! pages that happen to contain a marker are reported as available.

use serde::Serialize;

use crate::parser::ParsedFields;

/// Lowercase phrases whose presence marks a domain as available.
pub const AVAILABILITY_MARKERS: &[&str] =
    &["no match", "not found", "no entries found", "no data found"];

/// Parsed fields tried, in order, for the expiry date.
pub const EXPIRY_KEYS: &[&str] = &["Registry Expiry Date", "Expiration Date"];

/// Parsed field holding the sponsoring registrar.
pub const REGISTRAR_KEY: &str = "Registrar";

/// How much the availability verdict can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Confidence {
    #[serde(rename = "high")]
    High,
    #[serde(rename = "likely registered")]
    LikelyRegistered,
}

/// Result of `check_availability`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Availability {
    pub domain: String,
    pub available: bool,
    pub confidence: Confidence,
    pub registrar: Option<String>,
    pub expiry: Option<String>,
    /// Invocation failure description; absent when the query completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// True if the raw response contains any availability marker (case-insensitive).
pub fn indicates_available(raw: &str) -> bool {
    let lower = raw.to_lowercase();
    AVAILABILITY_MARKERS
        .iter()
        .any(|marker| lower.contains(marker))
}

/// Build the availability verdict for `domain` from its raw response and
/// the fields parsed out of it.
pub fn assess(domain: &str, raw: &str, fields: &ParsedFields) -> Availability {
    let available = indicates_available(raw);
    Availability {
        domain: domain.to_string(),
        available,
        confidence: if available {
            Confidence::High
        } else {
            Confidence::LikelyRegistered
        },
        registrar: fields.first_of(&[REGISTRAR_KEY]).map(str::to_string),
        expiry: fields.first_of(EXPIRY_KEYS).map(str::to_string),
        error: None,
    }
}
