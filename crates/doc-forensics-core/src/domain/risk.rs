//! Risk assessment produced by the rule engine.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Input subsystem a rule draws its evidence from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subsystem {
    /// Image forensics.
    Forensics,
    /// Field extraction.
    Ocr,
}

impl Subsystem {
    /// Key used in `confidence_factors`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Forensics => "forensics",
            Self::Ocr => "ocr",
        }
    }
}

/// A triggered rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Rule id.
    pub rule_id: String,
    /// Human-readable description of the rule.
    pub description: String,
    /// Weight contributed to the risk score.
    pub weight: f64,
}

/// Whether a subsystem took part in an assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorStatus {
    /// Input was present and its rules were evaluated.
    Evaluated,
    /// Input was absent; its rules were skipped.
    Skipped,
}

/// How much one subsystem contributed to the assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceFactor {
    /// Evaluated or skipped.
    pub status: FactorStatus,
    /// Share of the assessment attributed to this subsystem (0.0-1.0).
    pub weight: f64,
    /// The subsystem's confidence in its own evidence (0.0-1.0).
    pub confidence: f64,
    /// Sum of triggered rule weights from this subsystem, before clamping.
    pub risk_contribution: f64,
}

impl ConfidenceFactor {
    /// A factor for a subsystem whose input was absent.
    #[must_use]
    pub const fn skipped() -> Self {
        Self {
            status: FactorStatus::Skipped,
            weight: 0.0,
            confidence: 0.0,
            risk_contribution: 0.0,
        }
    }
}

/// Explainable fraud risk assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Sum of triggered rule weights, clamped to 0.0-1.0.
    pub risk_score: f64,
    /// Triggered rules in rule-set order.
    pub violations: Vec<Violation>,
    /// Ids of every rule that did not trigger, including skipped ones.
    pub passed_rules: Vec<String>,
    /// Ids of rules whose input was absent.
    pub skipped_rules: Vec<String>,
    /// Post-weight contribution of every rule (0.0 when not triggered).
    pub rule_scores: BTreeMap<String, f64>,
    /// Per-subsystem breakdown keyed by `forensics` / `ocr`.
    pub confidence_factors: BTreeMap<String, ConfidenceFactor>,
    /// Follow-up actions derived from the violations.
    pub recommendations: Vec<String>,
}

impl RiskAssessment {
    /// Returns true if the given rule triggered.
    #[must_use]
    pub fn violated(&self, rule_id: &str) -> bool {
        self.violations.iter().any(|v| v.rule_id == rule_id)
    }
}
