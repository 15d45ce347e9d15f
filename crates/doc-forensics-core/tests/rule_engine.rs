//! Rule engine behaviour on realistic evidence combinations.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use doc_forensics_core::rules::recommendation;
use doc_forensics_core::{anomaly, ForensicsError, RiskPolicy, Rule, RuleEngine, RuleKind, RuleSet};
use doc_forensics_test_support::{ForensicsResultBuilder, OcrBuilder};

#[test]
fn test_identical_inputs_give_identical_json() {
    let engine = RuleEngine::default();
    let forensics = ForensicsResultBuilder::new()
        .scores(0.7, 0.4, 0.2)
        .anomaly(anomaly::RECOMPRESSION)
        .build();
    let ocr = OcrBuilder::new()
        .field("amount", "twelve", 0.4)
        .signature(false)
        .build();

    let first = engine.evaluate(Some(&forensics), Some(&ocr)).expect("first");
    let second = engine.evaluate(Some(&forensics), Some(&ocr)).expect("second");

    assert_eq!(
        serde_json::to_string(&first).expect("serialize"),
        serde_json::to_string(&second).expect("serialize")
    );
}

#[test]
fn test_no_evidence() {
    let assessment = RuleEngine::default().evaluate(None, None).expect("evaluates");

    assert!(assessment.risk_score.abs() < f64::EPSILON);
    assert!(assessment.violations.is_empty());
    assert_eq!(assessment.skipped_rules.len(), RuleSet::default_rules().len());
    assert_eq!(
        assessment.recommendations,
        vec![recommendation::INSUFFICIENT_DATA]
    );
}

#[test]
fn test_clean_check_needs_no_action() {
    let assessment = RuleEngine::default()
        .evaluate(
            Some(&ForensicsResultBuilder::new().build()),
            Some(&OcrBuilder::clean_check()),
        )
        .expect("evaluates");

    assert!(assessment.risk_score.abs() < f64::EPSILON);
    assert!(assessment.skipped_rules.is_empty());
    assert_eq!(assessment.recommendations, vec![recommendation::NO_ACTION]);
}

#[test]
fn test_tampered_unsigned_check() {
    let forensics = ForensicsResultBuilder::new()
        .scores(0.9, 0.9, 0.9)
        .anomaly(anomaly::CLONED_REGION)
        .build();
    let ocr = OcrBuilder::new()
        .field("amount", "$980.00", 0.9)
        .signature(false)
        .build();

    let assessment = RuleEngine::default()
        .evaluate(Some(&forensics), Some(&ocr))
        .expect("evaluates");

    assert!(assessment.violated("forensics_high_score"));
    assert!(assessment.violated("cloned_region_anomaly"));
    assert!(assessment.violated("signature_missing"));
    assert!((assessment.risk_score - 0.8).abs() < 1e-9);
    assert_eq!(
        assessment.recommendations,
        vec![
            recommendation::MANUAL_REVIEW,
            recommendation::VERIFY_SIGNATURE,
            recommendation::INSPECT_IMAGE,
        ]
    );
    let passed_and_violated = assessment.passed_rules.len() + assessment.violations.len();
    assert_eq!(passed_and_violated, RuleSet::default_rules().len());
}

#[test]
fn test_custom_rules_from_json() {
    let rules: Vec<Rule> = serde_json::from_str(
        r#"[
            {"id": "memo_missing", "kind": "field_missing", "field": "memo",
             "weight": 0.4, "description": "Memo line is empty"},
            {"id": "any_tampering", "kind": "forensic_score_above", "threshold": 0.1,
             "weight": 0.4, "description": "Any forensic signal"}
        ]"#,
    )
    .expect("rules parse");
    let engine = RuleEngine::new(
        RuleSet::new(rules).expect("valid rules"),
        RiskPolicy {
            manual_review_threshold: 0.3,
        },
    );

    let assessment = engine
        .evaluate(None, Some(&OcrBuilder::clean_check()))
        .expect("evaluates");

    assert_eq!(assessment.skipped_rules, vec!["any_tampering"]);
    assert!(assessment.violated("memo_missing"));
    assert_eq!(
        assessment.recommendations,
        vec![
            recommendation::MANUAL_REVIEW.to_string(),
            recommendation::confirm_field("memo"),
        ]
    );
}

#[test]
fn test_invalid_rule_sets_rejected() {
    let dup = || Rule::new("dup", RuleKind::SignatureMissing, 0.2, "duplicate");
    assert!(matches!(
        RuleSet::new(vec![dup(), dup()]),
        Err(ForensicsError::InvalidRuleSet(_))
    ));

    let negative = Rule::new("neg", RuleKind::SignatureMissing, -0.1, "negative weight");
    assert!(matches!(
        RuleSet::new(vec![negative]),
        Err(ForensicsError::InvalidRuleSet(_))
    ));
}
