//! End-to-end forensic scenarios on synthetic documents.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use doc_forensics_core::{anomaly, ForensicsError, ForensicsOrchestrator, ForensicsResult};
use doc_forensics_test_support::SyntheticDocumentBuilder;
use proptest::prelude::*;

const FONT_LABELS: [&str; 2] = [anomaly::STROKE_WIDTH_VARIATION, anomaly::DENSITY_VARIATION];

fn assert_well_formed(result: &ForensicsResult) {
    for score in [
        result.edge_score,
        result.compression_score,
        result.font_score,
        result.overall_score,
    ] {
        assert!((0.0..=1.0).contains(&score), "score out of range: {result:?}");
    }
    let expected = ForensicsResult::weighted_score(
        result.edge_score,
        result.compression_score,
        result.font_score,
    );
    assert!((result.overall_score - expected).abs() < 1e-9);
}

#[test]
fn test_blank_page_from_bytes() {
    let page = SyntheticDocumentBuilder::blank_page(96, 96);
    let bytes = SyntheticDocumentBuilder::png_bytes(&page).expect("encode");

    let result = ForensicsOrchestrator::default()
        .analyze_image(bytes.as_slice())
        .expect("analysis succeeds");

    assert_well_formed(&result);
    assert!(result.overall_score.abs() < f64::EPSILON);
    assert!(result.detected_anomalies.is_empty());
    let digest = result.source_digest.expect("digest attached");
    assert_eq!(digest.len(), 64);
}

#[test]
fn test_same_bytes_same_result() {
    let page = SyntheticDocumentBuilder::glyph_row(&[2, 3, 4]);
    let bytes = SyntheticDocumentBuilder::png_bytes(&page).expect("encode");
    let orchestrator = ForensicsOrchestrator::default();

    let first = orchestrator.analyze_image(bytes.as_slice()).expect("first");
    let second = orchestrator.analyze_image(bytes.as_slice()).expect("second");

    assert_eq!(first, second);
}

#[test]
fn test_cloned_patch_scores_above_noise() {
    let orchestrator = ForensicsOrchestrator::default();
    let cloned = SyntheticDocumentBuilder::cloned_patch(128, 128, 3, 32, (8, 8), (80, 80));
    let noise = SyntheticDocumentBuilder::noise(128, 128, 3);

    let cloned = orchestrator
        .analyze_raw(&SyntheticDocumentBuilder::raw(&cloned).expect("raw"))
        .expect("cloned analysis");
    let noise = orchestrator
        .analyze_raw(&SyntheticDocumentBuilder::raw(&noise).expect("raw"))
        .expect("noise analysis");

    assert_well_formed(&cloned);
    assert_well_formed(&noise);
    assert!(cloned.edge_analysis.cloned_regions.high_correlations > 0);
    assert_eq!(noise.edge_analysis.cloned_regions.high_correlations, 0);
    assert!(cloned.edge_analysis.cloned_regions.score > noise.edge_analysis.cloned_regions.score);
    assert!(!noise.has_anomaly(anomaly::CLONED_REGION));
}

#[test]
fn test_clone_found_off_the_block_grid() {
    let orchestrator = ForensicsOrchestrator::default();
    for to in [(83, 83), (81, 80), (76, 90)] {
        let cloned = SyntheticDocumentBuilder::cloned_patch(128, 128, 3, 32, (8, 8), to);
        let result = orchestrator
            .analyze_raw(&SyntheticDocumentBuilder::raw(&cloned).expect("raw"))
            .expect("cloned analysis");

        assert_well_formed(&result);
        assert!(
            result.edge_analysis.cloned_regions.high_correlations > 0,
            "copy to {to:?}: {:?}",
            result.edge_analysis.cloned_regions
        );
        assert!(result.has_anomaly(anomaly::CLONED_REGION), "copy to {to:?}");
    }
}

#[test]
fn test_faded_edges_report_discontinuity() {
    let page = SyntheticDocumentBuilder::faded_edges(72, 24);
    let result = ForensicsOrchestrator::default()
        .analyze_raw(&SyntheticDocumentBuilder::raw(&page).expect("raw"))
        .expect("analysis");

    assert_well_formed(&result);
    let continuity = &result.edge_analysis.continuity;
    assert_eq!(continuity.total_regions, 6);
    assert_eq!(continuity.broken_edges, 6);
    assert!(result.has_anomaly(anomaly::EDGE_DISCONTINUITY));
}

#[test]
fn test_mixed_quality_is_less_consistent() {
    let orchestrator = ForensicsOrchestrator::default();
    let mixed = SyntheticDocumentBuilder::mixed_quality(128, 128, 5, 95, 10).expect("mixed");
    let uniform = SyntheticDocumentBuilder::uniform_quality(128, 128, 5, 90).expect("uniform");

    let mixed = orchestrator
        .analyze_raw(&SyntheticDocumentBuilder::raw(&mixed).expect("raw"))
        .expect("mixed analysis");
    let uniform = orchestrator
        .analyze_raw(&SyntheticDocumentBuilder::raw(&uniform).expect("raw"))
        .expect("uniform analysis");

    assert_well_formed(&mixed);
    assert_well_formed(&uniform);
    assert!(
        mixed.compression_analysis.inconsistencies.score
            > uniform.compression_analysis.inconsistencies.score,
        "mixed {:?} vs uniform {:?}",
        mixed.compression_analysis.inconsistencies,
        uniform.compression_analysis.inconsistencies
    );
}

#[test]
fn test_varying_strokes_raise_font_score() {
    let orchestrator = ForensicsOrchestrator::default();
    let uniform = SyntheticDocumentBuilder::glyph_row(&[3; 6]);
    let varying = SyntheticDocumentBuilder::glyph_row(&[1, 2, 3, 4, 5, 6]);

    let uniform = orchestrator
        .analyze_raw(&SyntheticDocumentBuilder::raw(&uniform).expect("raw"))
        .expect("uniform analysis");
    let varying = orchestrator
        .analyze_raw(&SyntheticDocumentBuilder::raw(&varying).expect("raw"))
        .expect("varying analysis");

    assert!(varying.font_score > uniform.font_score);
    assert!(varying.has_anomaly(anomaly::STROKE_WIDTH_VARIATION));
    assert!(!uniform.has_anomaly(anomaly::STROKE_WIDTH_VARIATION));
}

#[test]
fn test_font_labels_follow_image_labels() {
    let varying = SyntheticDocumentBuilder::glyph_row(&[1, 2, 3, 4, 5, 6]);
    let result = ForensicsOrchestrator::default()
        .analyze_raw(&SyntheticDocumentBuilder::raw(&varying).expect("raw"))
        .expect("analysis");

    let first_font = result
        .detected_anomalies
        .iter()
        .position(|a| FONT_LABELS.contains(&a.as_str()))
        .expect("font label present");
    assert!(result.detected_anomalies[first_font..]
        .iter()
        .all(|a| FONT_LABELS.contains(&a.as_str())));
}

#[test]
fn test_missing_file_is_not_found() {
    let err = ForensicsOrchestrator::default()
        .analyze_image(std::path::Path::new("/nonexistent/check-404.png"))
        .expect_err("missing file");

    assert!(matches!(err, ForensicsError::ImageNotFound { .. }), "got {err:?}");
    assert!(err.is_client_error());
}

#[test]
fn test_loads_from_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("check.png");
    SyntheticDocumentBuilder::glyph_row(&[3; 4])
        .save(&path)
        .expect("write page");

    let result = ForensicsOrchestrator::default()
        .analyze_image(path.as_path())
        .expect("analysis succeeds");

    assert_well_formed(&result);
    assert_eq!(result.font_analysis.text_regions.len(), 4);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_scores_bounded_and_weighted(
        width in 16u32..80,
        height in 16u32..80,
        seed in any::<u64>(),
    ) {
        let page = SyntheticDocumentBuilder::noise(width, height, seed);
        let raw = SyntheticDocumentBuilder::raw(&page).expect("raw");
        let result = ForensicsOrchestrator::default()
            .analyze_raw(&raw)
            .expect("analysis succeeds");

        for score in [
            result.edge_score,
            result.compression_score,
            result.font_score,
            result.overall_score,
        ] {
            prop_assert!((0.0..=1.0).contains(&score));
        }
        let expected = 0.4 * result.edge_score
            + 0.3 * result.compression_score
            + 0.3 * result.font_score;
        prop_assert!((result.overall_score - expected).abs() < 1e-9);
    }
}
