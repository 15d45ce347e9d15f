//! Rule definitions and validated rule sets.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::{anomaly, parse_amount, ForensicsResult, OcrResult, Subsystem};
use crate::error::{ForensicsError, Result};

/// The predicate a rule checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleKind {
    /// Overall extraction confidence below `threshold`.
    LowOcrConfidence {
        /// Confidence cutoff (0.0-1.0).
        threshold: f64,
    },
    /// No signature was detected.
    SignatureMissing,
    /// A field is absent or blank.
    FieldMissing {
        /// Field name.
        field: String,
    },
    /// A field is present but does not parse as an amount.
    FieldUnparsable {
        /// Field name.
        field: String,
    },
    /// A field is present but its confidence is below `threshold`.
    FieldLowConfidence {
        /// Field name.
        field: String,
        /// Confidence cutoff (0.0-1.0).
        threshold: f64,
    },
    /// Overall forensic score at or above `threshold`.
    ForensicScoreAbove {
        /// Score cutoff (0.0-1.0).
        threshold: f64,
    },
    /// A forensic anomaly label was detected.
    AnomalyPresent {
        /// Anomaly label.
        anomaly: String,
    },
}

/// Result of checking one rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The predicate held.
    Triggered,
    /// The predicate did not hold.
    Passed,
    /// The rule's input was absent.
    Skipped,
}

impl RuleKind {
    /// Input subsystem this rule reads.
    #[must_use]
    pub const fn subsystem(&self) -> Subsystem {
        match self {
            Self::ForensicScoreAbove { .. } | Self::AnomalyPresent { .. } => Subsystem::Forensics,
            Self::LowOcrConfidence { .. }
            | Self::SignatureMissing
            | Self::FieldMissing { .. }
            | Self::FieldUnparsable { .. }
            | Self::FieldLowConfidence { .. } => Subsystem::Ocr,
        }
    }

    /// Field this rule is about, if any.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::FieldMissing { field }
            | Self::FieldUnparsable { field }
            | Self::FieldLowConfidence { field, .. } => Some(field.as_str()),
            _ => None,
        }
    }

    fn threshold(&self) -> Option<f64> {
        match self {
            Self::LowOcrConfidence { threshold }
            | Self::FieldLowConfidence { threshold, .. }
            | Self::ForensicScoreAbove { threshold } => Some(*threshold),
            _ => None,
        }
    }
}

/// A weighted, described predicate over the assessment inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Unique id.
    pub id: String,
    /// Predicate.
    #[serde(flatten)]
    pub kind: RuleKind,
    /// Contribution to the risk score when triggered (0.0-1.0).
    pub weight: f64,
    /// Human-readable description.
    pub description: String,
}

impl Rule {
    /// Creates a rule.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        kind: RuleKind,
        weight: f64,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            weight,
            description: description.into(),
        }
    }

    /// Checks the rule against whichever inputs are present.
    ///
    /// # Errors
    ///
    /// Returns [`ForensicsError::RuleEvaluation`] when a field-confidence rule
    /// meets a present field without a recorded confidence.
    pub fn check(
        &self,
        forensics: Option<&ForensicsResult>,
        ocr: Option<&OcrResult>,
    ) -> Result<Outcome> {
        let triggered = match (&self.kind, forensics, ocr) {
            (RuleKind::ForensicScoreAbove { threshold }, Some(f), _) => {
                f.overall_score >= *threshold
            }
            (RuleKind::AnomalyPresent { anomaly }, Some(f), _) => f.has_anomaly(anomaly),
            (RuleKind::LowOcrConfidence { threshold }, _, Some(o)) => {
                o.extraction_confidence < *threshold
            }
            (RuleKind::SignatureMissing, _, Some(o)) => !o.signature_detected,
            (RuleKind::FieldMissing { field }, _, Some(o)) => o.field(field).is_none(),
            (RuleKind::FieldUnparsable { field }, _, Some(o)) => {
                o.field(field).is_some_and(|text| parse_amount(text).is_none())
            }
            (RuleKind::FieldLowConfidence { field, threshold }, _, Some(o)) => {
                if o.field(field).is_none() {
                    false
                } else {
                    let confidence =
                        o.field_confidence(field)
                            .ok_or_else(|| ForensicsError::RuleEvaluation {
                                rule: self.id.clone(),
                                reason: format!("field '{field}' has no confidence entry"),
                            })?;
                    confidence < *threshold
                }
            }
            _ => return Ok(Outcome::Skipped),
        };

        Ok(if triggered {
            Outcome::Triggered
        } else {
            Outcome::Passed
        })
    }
}

/// An ordered rule list with unique ids and valid weights.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Validates and wraps a rule list.
    ///
    /// # Errors
    ///
    /// Returns [`ForensicsError::InvalidRuleSet`] on an empty or duplicate id,
    /// a weight outside 0.0-1.0, or a threshold outside 0.0-1.0.
    pub fn new(rules: Vec<Rule>) -> Result<Self> {
        let mut seen = BTreeSet::new();
        for rule in &rules {
            if rule.id.trim().is_empty() {
                return Err(ForensicsError::InvalidRuleSet("rule id is empty".into()));
            }
            if !seen.insert(rule.id.as_str()) {
                return Err(ForensicsError::InvalidRuleSet(format!(
                    "duplicate rule id '{}'",
                    rule.id
                )));
            }
            if !rule.weight.is_finite() || !(0.0..=1.0).contains(&rule.weight) {
                return Err(ForensicsError::InvalidRuleSet(format!(
                    "rule '{}' has weight {} outside 0.0-1.0",
                    rule.id, rule.weight
                )));
            }
            if let Some(threshold) = rule.kind.threshold() {
                if !(0.0..=1.0).contains(&threshold) {
                    return Err(ForensicsError::InvalidRuleSet(format!(
                        "rule '{}' has threshold {threshold} outside 0.0-1.0",
                        rule.id
                    )));
                }
            }
        }
        Ok(Self { rules })
    }

    /// The default check-fraud rules.
    #[must_use]
    pub fn default_rules() -> Vec<Rule> {
        vec![
            Rule::new(
                "ocr_low_confidence",
                RuleKind::LowOcrConfidence { threshold: 0.6 },
                0.15,
                "Field extraction confidence is low",
            ),
            Rule::new(
                "signature_missing",
                RuleKind::SignatureMissing,
                0.25,
                "No signature detected",
            ),
            Rule::new(
                "amount_missing",
                RuleKind::FieldMissing {
                    field: "amount".into(),
                },
                0.2,
                "Amount field is missing",
            ),
            Rule::new(
                "amount_unparsable",
                RuleKind::FieldUnparsable {
                    field: "amount".into(),
                },
                0.15,
                "Amount field cannot be parsed",
            ),
            Rule::new(
                "amount_low_confidence",
                RuleKind::FieldLowConfidence {
                    field: "amount".into(),
                    threshold: 0.5,
                },
                0.1,
                "Amount field was extracted with low confidence",
            ),
            Rule::new(
                "forensics_high_score",
                RuleKind::ForensicScoreAbove { threshold: 0.5 },
                0.3,
                "Forensic analysis indicates likely tampering",
            ),
            Rule::new(
                "cloned_region_anomaly",
                RuleKind::AnomalyPresent {
                    anomaly: anomaly::CLONED_REGION.into(),
                },
                0.25,
                "Duplicated image regions detected",
            ),
            Rule::new(
                "recompression_anomaly",
                RuleKind::AnomalyPresent {
                    anomaly: anomaly::RECOMPRESSION.into(),
                },
                0.15,
                "Image shows signs of recompression",
            ),
            Rule::new(
                "font_inconsistency",
                RuleKind::AnomalyPresent {
                    anomaly: anomaly::STROKE_WIDTH_VARIATION.into(),
                },
                0.15,
                "Handwriting or font strokes are inconsistent",
            ),
        ]
    }

    /// Rules in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if the set holds no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            rules: Self::default_rules(),
        }
    }
}
