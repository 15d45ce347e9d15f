//! Structured output of the external field-extraction (OCR) collaborator.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Fields extracted from a document by the OCR collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrResult {
    /// Extracted field text by field name (e.g. `amount`, `payee`).
    pub fields: BTreeMap<String, String>,
    /// Per-field confidence (0.0-1.0).
    pub field_confidences: BTreeMap<String, f64>,
    /// Overall extraction confidence (0.0-1.0).
    pub extraction_confidence: f64,
    /// Whether a signature was found.
    pub signature_detected: bool,
}

impl OcrResult {
    /// Returns the trimmed text of a field, or `None` when absent or blank.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Returns the confidence recorded for a field.
    #[must_use]
    pub fn field_confidence(&self, name: &str) -> Option<f64> {
        self.field_confidences.get(name).copied()
    }
}

/// Parses a monetary amount such as `$1,234.50` or `1 234.50 USD`.
///
/// Returns `None` unless the text holds a single finite, non-negative number.
#[must_use]
pub fn parse_amount(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| !matches!(c, '$' | '€' | '£' | ',' | ' ' | '\u{a0}'))
        .collect();
    let cleaned = cleaned
        .trim_end_matches(|c: char| c.is_ascii_alphabetic())
        .trim_start_matches(|c: char| c.is_ascii_alphabetic());

    if cleaned.is_empty() {
        return None;
    }
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1250.00"), Some(1250.0));
        assert_eq!(parse_amount("$1,250.75"), Some(1250.75));
        assert_eq!(parse_amount("1 250.75 USD"), Some(1250.75));
        assert_eq!(parse_amount("**one hundred**"), None);
        assert_eq!(parse_amount("$"), None);
        assert_eq!(parse_amount("-5"), None);
        assert_eq!(parse_amount("NaN"), None);
    }

    #[test]
    fn test_blank_field_is_absent() {
        let mut ocr = OcrResult::default();
        ocr.fields.insert("amount".into(), "   ".into());
        ocr.fields.insert("payee".into(), " ACME Corp ".into());

        assert_eq!(ocr.field("amount"), None);
        assert_eq!(ocr.field("payee"), Some("ACME Corp"));
        assert_eq!(ocr.field("date"), None);
    }

    #[test]
    fn test_deserialize_partial_json() {
        let ocr: OcrResult =
            serde_json::from_str(r#"{"fields":{"amount":"10.00"},"signature_detected":true}"#)
                .expect("parse ocr json");
        assert_eq!(ocr.field("amount"), Some("10.00"));
        assert!(ocr.signature_detected);
        assert!(ocr.field_confidences.is_empty());
        assert!(ocr.extraction_confidence.abs() < f64::EPSILON);
    }
}
