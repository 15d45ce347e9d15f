//! Runs the three analyzers over one image and fuses their results.

use tracing::{debug, info};

use crate::analyzers::{CompressionAnalyzer, EdgeAnalyzer, FontAnalyzer};
use crate::domain::{
    anomaly, CompressionAnalysisResult, EdgeAnalysisResult, FontAnalysisResult,
    ForensicAnalyzer, ForensicsResult, ImageInput, RawImage,
};
use crate::error::{ForensicsError, Result};
use crate::preprocess::Preprocessor;

/// Sub-score levels at which an anomaly label is emitted.
#[derive(Debug, Clone, PartialEq)]
pub struct AnomalyThresholds {
    /// Clone score at or above which cloning is reported.
    pub clone: f64,
    /// Continuity score below which edges are reported as discontinuous.
    pub continuity: f64,
    /// Edge regions required before continuity is trusted.
    pub min_continuity_regions: usize,
    /// Artifact strength at or above which recompression is reported.
    pub artifact: f64,
    /// Periodicity at or above which recompression is reported.
    pub pattern: f64,
    /// Inconsistency score at or above which it is reported.
    pub inconsistency: f64,
}

impl Default for AnomalyThresholds {
    fn default() -> Self {
        Self {
            clone: 0.3,
            continuity: 0.5,
            min_continuity_regions: 5,
            artifact: 0.85,
            pattern: 0.6,
            inconsistency: 0.5,
        }
    }
}

/// Coordinates the Preprocessor and the three analyzers.
///
/// Holds only immutable configuration; one instance can serve concurrent
/// callers.
#[derive(Default)]
pub struct ForensicsOrchestrator {
    preprocessor: Preprocessor,
    edge: EdgeAnalyzer,
    compression: CompressionAnalyzer,
    font: FontAnalyzer,
    thresholds: AnomalyThresholds,
}

impl ForensicsOrchestrator {
    /// Creates an orchestrator from configured analyzers.
    #[must_use]
    pub fn new(
        edge: EdgeAnalyzer,
        compression: CompressionAnalyzer,
        font: FontAnalyzer,
        thresholds: AnomalyThresholds,
    ) -> Self {
        Self {
            preprocessor: Preprocessor::new(),
            edge,
            compression,
            font,
            thresholds,
        }
    }

    /// Returns the edge analyzer.
    #[must_use]
    pub const fn edge(&self) -> &EdgeAnalyzer {
        &self.edge
    }

    /// Returns the compression analyzer.
    #[must_use]
    pub const fn compression(&self) -> &CompressionAnalyzer {
        &self.compression
    }

    /// Returns the font analyzer.
    #[must_use]
    pub const fn font(&self) -> &FontAnalyzer {
        &self.font
    }

    /// Returns the anomaly thresholds.
    #[must_use]
    pub const fn thresholds(&self) -> &AnomalyThresholds {
        &self.thresholds
    }

    /// Decodes and analyzes a document image from a path or bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ForensicsError::ImageNotFound`] or [`ForensicsError::ImageFormat`]
    /// if the image cannot be loaded, and [`ForensicsError::Analysis`] if an
    /// analyzer fails.
    pub fn analyze_image<'a>(&self, input: impl Into<ImageInput<'a>>) -> Result<ForensicsResult> {
        let image = self.preprocessor.prepare(input.into())?;
        self.analyze_raw(&image)
    }

    /// Analyzes an already decoded image.
    ///
    /// All three analyzers run to completion concurrently. If any fails, the
    /// first failure in edge, compression, font order is returned and no
    /// partial result is produced.
    ///
    /// # Errors
    ///
    /// Returns [`ForensicsError::Analysis`] naming the failing analyzer.
    pub fn analyze_raw(&self, image: &RawImage) -> Result<ForensicsResult> {
        let (edge, (compression, font)) = rayon::join(
            || self.edge.analyze(image),
            || {
                rayon::join(
                    || self.compression.analyze(image),
                    || self.font.analyze(image),
                )
            },
        );

        let edge = edge.map_err(|e| ForensicsError::analysis(self.edge.name(), e))?;
        let compression =
            compression.map_err(|e| ForensicsError::analysis(self.compression.name(), e))?;
        let font = font.map_err(|e| ForensicsError::analysis(self.font.name(), e))?;

        let detected_anomalies = self.compile_anomalies(&edge, &compression, &font);
        let overall_score =
            ForensicsResult::weighted_score(edge.score, compression.score, font.score);

        info!(
            "Forensics: overall={overall_score:.3} \
             (edge={:.3}, compression={:.3}, font={:.3}), anomalies={}",
            edge.score,
            compression.score,
            font.score,
            detected_anomalies.len()
        );

        Ok(ForensicsResult {
            edge_score: edge.score,
            compression_score: compression.score,
            font_score: font.score,
            overall_score,
            detected_anomalies,
            edge_analysis: edge,
            compression_analysis: compression,
            font_analysis: font,
            source_digest: image.digest().map(str::to_string),
        })
    }

    /// Derives anomaly labels: edge first, then compression, then font.
    #[must_use]
    pub fn compile_anomalies(
        &self,
        edge: &EdgeAnalysisResult,
        compression: &CompressionAnalysisResult,
        font: &FontAnalysisResult,
    ) -> Vec<String> {
        let t = &self.thresholds;
        let mut anomalies = Vec::new();

        if edge.cloned_regions.high_correlations > 0 && edge.cloned_regions.score >= t.clone {
            anomalies.push(anomaly::CLONED_REGION.to_string());
        }
        if edge.continuity.total_regions >= t.min_continuity_regions
            && edge.continuity.score < t.continuity
        {
            anomalies.push(anomaly::EDGE_DISCONTINUITY.to_string());
        }

        if compression.jpeg_artifacts.score >= t.artifact
            || compression.recompression_patterns.score >= t.pattern
        {
            anomalies.push(anomaly::RECOMPRESSION.to_string());
        }
        if compression.inconsistencies.score >= t.inconsistency {
            anomalies.push(anomaly::COMPRESSION_INCONSISTENCY.to_string());
        }

        anomalies.extend(font.inconsistencies.messages.iter().cloned());

        debug!("Compiled anomalies: {anomalies:?}");
        anomalies
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::analyzers::{CompressionConfig, EdgeConfig, FontConfig};
    use crate::domain::{
        ClonedRegions, CompressionInconsistencies, EdgeContinuity, FontCharacteristics,
        FontInconsistencies, JpegArtifacts, RecompressionPatterns, TextAlignment,
    };

    fn blank(width: u32, height: u32) -> RawImage {
        let gray = image::GrayImage::from_pixel(width, height, image::Luma([235]));
        RawImage::from_dynamic(&image::DynamicImage::ImageLuma8(gray)).expect("valid image")
    }

    fn edge_result(
        clone_score: f64,
        high: usize,
        continuity: f64,
        regions: usize,
    ) -> EdgeAnalysisResult {
        EdgeAnalysisResult {
            score: 0.0,
            continuity: EdgeContinuity {
                score: continuity,
                total_regions: regions,
                broken_edges: 0,
            },
            sharpness: 0.0,
            cloned_regions: ClonedRegions {
                score: clone_score,
                high_correlations: high,
                total_comparisons: high,
            },
        }
    }

    fn compression_result(
        artifacts: f64,
        pattern: f64,
        inconsistency: f64,
    ) -> CompressionAnalysisResult {
        CompressionAnalysisResult {
            score: 0.0,
            jpeg_artifacts: JpegArtifacts {
                score: artifacts,
                blocks_analyzed: 0,
                textured_blocks: 0,
            },
            inconsistencies: CompressionInconsistencies {
                score: inconsistency,
                flagged_regions: 0,
                regions_analyzed: 0,
                heterogeneity: 0.0,
            },
            recompression_patterns: RecompressionPatterns {
                score: pattern,
                dominant_period: None,
            },
        }
    }

    fn font_result(messages: &[&str]) -> FontAnalysisResult {
        FontAnalysisResult {
            score: 0.0,
            text_regions: Vec::new(),
            characteristics: FontCharacteristics {
                regions: Vec::new(),
                consistency_score: 1.0,
            },
            inconsistencies: FontInconsistencies {
                penalty: 0.0,
                messages: messages.iter().map(ToString::to_string).collect(),
            },
            alignment: TextAlignment::regular(),
        }
    }

    #[test]
    fn test_blank_page_is_clean() {
        let result = ForensicsOrchestrator::default()
            .analyze_raw(&blank(64, 64))
            .expect("analysis should succeed");

        assert!(result.overall_score.abs() < f64::EPSILON);
        assert!(result.detected_anomalies.is_empty());
        assert!(result.source_digest.is_none());
    }

    #[test]
    fn test_anomaly_order() {
        let orchestrator = ForensicsOrchestrator::default();
        let anomalies = orchestrator.compile_anomalies(
            &edge_result(0.9, 9, 0.2, 10),
            &compression_result(0.9, 0.0, 0.8),
            &font_result(&[anomaly::STROKE_WIDTH_VARIATION]),
        );

        assert_eq!(
            anomalies,
            vec![
                anomaly::CLONED_REGION,
                anomaly::EDGE_DISCONTINUITY,
                anomaly::RECOMPRESSION,
                anomaly::COMPRESSION_INCONSISTENCY,
                anomaly::STROKE_WIDTH_VARIATION,
            ]
        );
    }

    #[test]
    fn test_recompression_reported_once() {
        let anomalies = ForensicsOrchestrator::default().compile_anomalies(
            &edge_result(0.0, 0, 1.0, 0),
            &compression_result(0.95, 0.9, 0.0),
            &font_result(&[]),
        );
        assert_eq!(anomalies, vec![anomaly::RECOMPRESSION]);
    }

    #[test]
    fn test_few_regions_do_not_report_discontinuity() {
        let anomalies = ForensicsOrchestrator::default().compile_anomalies(
            &edge_result(0.0, 0, 0.0, 2),
            &compression_result(0.0, 0.0, 0.0),
            &font_result(&[]),
        );
        assert!(anomalies.is_empty());
    }

    #[test]
    fn test_analyzer_failure_names_analyzer() {
        let orchestrator = ForensicsOrchestrator::new(
            EdgeAnalyzer::default(),
            CompressionAnalyzer::new(CompressionConfig {
                max_lag: 0,
                ..Default::default()
            }),
            FontAnalyzer::default(),
            AnomalyThresholds::default(),
        );
        let err = orchestrator
            .analyze_raw(&blank(16, 16))
            .expect_err("invalid compression config");

        assert!(
            matches!(err, ForensicsError::Analysis { analyzer: "compression", .. }),
            "got {err:?}"
        );
    }

    #[test]
    fn test_first_failure_in_declared_order_wins() {
        let orchestrator = ForensicsOrchestrator::new(
            EdgeAnalyzer::new(EdgeConfig {
                block_stride: 0,
                ..Default::default()
            }),
            CompressionAnalyzer::default(),
            FontAnalyzer::new(FontConfig {
                max_region_fraction: 0.0,
                ..Default::default()
            }),
            AnomalyThresholds::default(),
        );
        let err = orchestrator
            .analyze_raw(&blank(16, 16))
            .expect_err("two analyzers fail");
        assert!(matches!(err, ForensicsError::Analysis { analyzer: "edge", .. }));
    }

    #[test]
    fn test_analyze_bytes_rejects_garbage() {
        let err = ForensicsOrchestrator::default()
            .analyze_image(&b"not an image"[..])
            .expect_err("garbage bytes");
        assert!(matches!(err, ForensicsError::ImageFormat(_)));
    }
}
