//! Fuses forensic scores and extracted fields into a risk assessment.

use std::collections::BTreeMap;

use tracing::{debug, info};

use super::rule::{Outcome, Rule, RuleKind, RuleSet};
use crate::domain::{
    ConfidenceFactor, FactorStatus, ForensicsResult, OcrResult, RiskAssessment, Subsystem,
    Violation,
};
use crate::error::Result;

/// Recommendation texts, in the order they are emitted.
pub mod recommendation {
    /// Risk at or above the manual review threshold.
    pub const MANUAL_REVIEW: &str = "Manual review recommended";
    /// Signature missing.
    pub const VERIFY_SIGNATURE: &str = "Verify signature with account holder";
    /// Low overall extraction confidence.
    pub const RESCAN: &str = "Rescan document at higher resolution";
    /// A forensic rule triggered.
    pub const INSPECT_IMAGE: &str = "Inspect image for tampering";
    /// Nothing triggered.
    pub const NO_ACTION: &str = "No action required";
    /// Neither input was available.
    pub const INSUFFICIENT_DATA: &str = "Insufficient data for assessment";

    /// A field rule triggered.
    #[must_use]
    pub fn confirm_field(field: &str) -> String {
        format!("Confirm {field} with issuer")
    }
}

/// Base share of each subsystem in the confidence breakdown.
const FORENSICS_FACTOR_WEIGHT: f64 = 0.6;
const OCR_FACTOR_WEIGHT: f64 = 0.4;

/// Assessment-level policy outside individual rules.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskPolicy {
    /// Risk score at or above which manual review is recommended.
    pub manual_review_threshold: f64,
}

impl Default for RiskPolicy {
    fn default() -> Self {
        Self {
            manual_review_threshold: 0.5,
        }
    }
}

/// Evaluates a rule set against forensic and OCR evidence.
///
/// Pure: identical inputs give identical assessments.
#[derive(Debug, Clone, Default)]
pub struct RuleEngine {
    rules: RuleSet,
    policy: RiskPolicy,
}

impl RuleEngine {
    /// Creates an engine from a validated rule set.
    #[must_use]
    pub const fn new(rules: RuleSet, policy: RiskPolicy) -> Self {
        Self { rules, policy }
    }

    /// Returns the rule set.
    #[must_use]
    pub const fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Returns the policy.
    #[must_use]
    pub const fn policy(&self) -> &RiskPolicy {
        &self.policy
    }

    /// Evaluates every rule and builds the assessment.
    ///
    /// Rules whose input is absent are skipped; with both inputs absent the
    /// risk is 0.0 and both confidence factors are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ForensicsError::RuleEvaluation`] if a rule cannot be
    /// evaluated against the inputs.
    pub fn evaluate(
        &self,
        forensics: Option<&ForensicsResult>,
        ocr: Option<&OcrResult>,
    ) -> Result<RiskAssessment> {
        let mut violations = Vec::new();
        let mut triggered: Vec<&Rule> = Vec::new();
        let mut passed_rules = Vec::new();
        let mut skipped_rules = Vec::new();
        let mut rule_scores = BTreeMap::new();

        for rule in self.rules.rules() {
            let outcome = rule.check(forensics, ocr)?;
            let score = if outcome == Outcome::Triggered {
                rule.weight
            } else {
                0.0
            };
            rule_scores.insert(rule.id.clone(), score);

            match outcome {
                Outcome::Triggered => {
                    debug!("Rule {} triggered (weight {})", rule.id, rule.weight);
                    violations.push(Violation {
                        rule_id: rule.id.clone(),
                        description: rule.description.clone(),
                        weight: rule.weight,
                    });
                    triggered.push(rule);
                }
                Outcome::Passed => passed_rules.push(rule.id.clone()),
                Outcome::Skipped => {
                    passed_rules.push(rule.id.clone());
                    skipped_rules.push(rule.id.clone());
                }
            }
        }

        let risk_score = triggered
            .iter()
            .map(|r| r.weight)
            .sum::<f64>()
            .clamp(0.0, 1.0);
        let confidence_factors = confidence_factors(forensics, ocr, &triggered);
        let recommendations = self.recommendations(risk_score, &triggered, forensics, ocr);

        info!(
            "Risk assessment: score={risk_score:.3}, violations={}, skipped={}",
            violations.len(),
            skipped_rules.len()
        );

        Ok(RiskAssessment {
            risk_score,
            violations,
            passed_rules,
            skipped_rules,
            rule_scores,
            confidence_factors,
            recommendations,
        })
    }

    fn recommendations(
        &self,
        risk_score: f64,
        triggered: &[&Rule],
        forensics: Option<&ForensicsResult>,
        ocr: Option<&OcrResult>,
    ) -> Vec<String> {
        if forensics.is_none() && ocr.is_none() {
            return vec![recommendation::INSUFFICIENT_DATA.to_string()];
        }
        if triggered.is_empty() {
            return vec![recommendation::NO_ACTION.to_string()];
        }

        let any = |pred: fn(&RuleKind) -> bool| triggered.iter().any(|r| pred(&r.kind));
        let mut out = Vec::new();

        if risk_score >= self.policy.manual_review_threshold {
            out.push(recommendation::MANUAL_REVIEW.to_string());
        }
        if any(|k| matches!(k, RuleKind::SignatureMissing)) {
            out.push(recommendation::VERIFY_SIGNATURE.to_string());
        }
        for field in triggered.iter().filter_map(|r| r.kind.field()) {
            let text = recommendation::confirm_field(field);
            if !out.contains(&text) {
                out.push(text);
            }
        }
        if any(|k| matches!(k, RuleKind::LowOcrConfidence { .. })) {
            out.push(recommendation::RESCAN.to_string());
        }
        if any(|k| k.subsystem() == Subsystem::Forensics) {
            out.push(recommendation::INSPECT_IMAGE.to_string());
        }
        out
    }
}

/// Per-subsystem breakdown with base weights renormalized over the
/// subsystems that were evaluated.
fn confidence_factors(
    forensics: Option<&ForensicsResult>,
    ocr: Option<&OcrResult>,
    triggered: &[&Rule],
) -> BTreeMap<String, ConfidenceFactor> {
    let contribution = |subsystem: Subsystem| {
        triggered
            .iter()
            .filter(|r| r.kind.subsystem() == subsystem)
            .map(|r| r.weight)
            .sum::<f64>()
    };

    let evaluated_weight = forensics.map_or(0.0, |_| FORENSICS_FACTOR_WEIGHT)
        + ocr.map_or(0.0, |_| OCR_FACTOR_WEIGHT);

    let forensics_factor = forensics.map_or_else(ConfidenceFactor::skipped, |f| ConfidenceFactor {
        status: FactorStatus::Evaluated,
        weight: FORENSICS_FACTOR_WEIGHT / evaluated_weight,
        confidence: score_agreement(f),
        risk_contribution: contribution(Subsystem::Forensics),
    });
    let ocr_factor = ocr.map_or_else(ConfidenceFactor::skipped, |o| ConfidenceFactor {
        status: FactorStatus::Evaluated,
        weight: OCR_FACTOR_WEIGHT / evaluated_weight,
        confidence: o.extraction_confidence.clamp(0.0, 1.0),
        risk_contribution: contribution(Subsystem::Ocr),
    });

    BTreeMap::from([
        (Subsystem::Forensics.as_str().to_string(), forensics_factor),
        (Subsystem::Ocr.as_str().to_string(), ocr_factor),
    ])
}

/// Agreement of the three analyzer scores with the overall score
/// (1.0 when they all agree).
fn score_agreement(forensics: &ForensicsResult) -> f64 {
    let overall = forensics.overall_score;
    let spread = [
        forensics.edge_score,
        forensics.compression_score,
        forensics.font_score,
    ]
    .iter()
    .map(|s| (s - overall).abs())
    .sum::<f64>()
        / 3.0;
    (1.0 - 2.0 * spread).clamp(0.0, 1.0)
}
