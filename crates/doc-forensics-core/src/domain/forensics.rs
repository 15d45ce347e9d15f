//! Forensic analysis result types.
//!
//! Top-level analyzer scores are tamper likelihoods: 0.0 is clean and 1.0 is
//! strongly suspicious. Nested `continuity`, `consistency` and `alignment`
//! scores measure integrity instead, 1.0 meaning fully consistent.

use serde::{Deserialize, Serialize};

/// Weight of the edge score in the overall score.
pub const EDGE_WEIGHT: f64 = 0.4;
/// Weight of the compression score in the overall score.
pub const COMPRESSION_WEIGHT: f64 = 0.3;
/// Weight of the font score in the overall score.
pub const FONT_WEIGHT: f64 = 0.3;

/// Anomaly labels produced by the orchestrator.
pub mod anomaly {
    /// A pixel block is duplicated elsewhere in the image.
    pub const CLONED_REGION: &str = "cloned_region_detected";
    /// Edge regions end abruptly, typical of spliced content.
    pub const EDGE_DISCONTINUITY: &str = "edge_discontinuity_detected";
    /// Strong or periodic recompression artifacts.
    pub const RECOMPRESSION: &str = "recompression_detected";
    /// Neighbouring regions carry different compression histories.
    pub const COMPRESSION_INCONSISTENCY: &str = "compression_inconsistency_detected";
    /// Stroke widths vary beyond a single writing pass.
    pub const STROKE_WIDTH_VARIATION: &str = "High stroke width variation";
    /// Ink density varies beyond a single writing pass.
    pub const DENSITY_VARIATION: &str = "Inconsistent text density";
}

/// Edge continuity and clone detection results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeAnalysisResult {
    /// Edge tamper score (0.0-1.0).
    pub score: f64,
    /// Continuity of connected edge regions.
    pub continuity: EdgeContinuity,
    /// Mean gradient magnitude along detected edges.
    pub sharpness: f64,
    /// Duplicated block detection.
    pub cloned_regions: ClonedRegions,
}

/// Continuity of connected edge regions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeContinuity {
    /// Fraction of regions without broken edges (1.0 = fully continuous).
    pub score: f64,
    /// Number of edge regions considered.
    pub total_regions: usize,
    /// Regions whose discontinuity exceeded the threshold.
    pub broken_edges: usize,
}

/// Duplicated block detection results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClonedRegions {
    /// Clone score (0.0-1.0).
    pub score: f64,
    /// Block pairs whose correlation exceeded the similarity threshold.
    pub high_correlations: usize,
    /// Block pairs whose correlation was computed.
    pub total_comparisons: usize,
}

/// Compression artifact analysis results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressionAnalysisResult {
    /// Compression tamper score (0.0-1.0).
    pub score: f64,
    /// Mean artifact strength over textured blocks.
    pub jpeg_artifacts: JpegArtifacts,
    /// Local heterogeneity of artifact strength.
    pub inconsistencies: CompressionInconsistencies,
    /// Periodicity consistent with double compression.
    pub recompression_patterns: RecompressionPatterns,
}

/// Block artifact strength summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JpegArtifacts {
    /// Mean artifact strength (0.0-1.0).
    pub score: f64,
    /// Number of 8x8 blocks in the image.
    pub blocks_analyzed: usize,
    /// Blocks with enough texture to carry compression traces.
    pub textured_blocks: usize,
}

/// Regions whose compression history differs from their surroundings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressionInconsistencies {
    /// Inconsistency score (0.0-1.0).
    pub score: f64,
    /// Neighbourhoods whose variance exceeded the baseline multiple.
    pub flagged_regions: usize,
    /// Neighbourhoods evaluated.
    pub regions_analyzed: usize,
    /// Global variance over the mean neighbourhood variance (about 1.0 when homogeneous).
    pub heterogeneity: f64,
}

/// Double-compression periodicity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecompressionPatterns {
    /// Periodicity strength (0.0-1.0).
    pub score: f64,
    /// Histogram lag with the strongest periodicity, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dominant_period: Option<usize>,
}

/// A candidate word or character box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextRegion {
    /// Left edge in pixels.
    pub x: u32,
    /// Top edge in pixels.
    pub y: u32,
    /// Box width in pixels.
    pub width: u32,
    /// Box height in pixels.
    pub height: u32,
    /// Box area in pixels.
    pub area: u32,
    /// Width divided by height.
    pub aspect_ratio: f64,
}

impl TextRegion {
    /// Creates a region from its bounding box.
    #[must_use]
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            area: width * height,
            aspect_ratio: f64::from(width) / f64::from(height.max(1)),
        }
    }

    /// Bottom edge (exclusive).
    #[must_use]
    pub const fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// Right edge (exclusive).
    #[must_use]
    pub const fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Vertical centre.
    #[must_use]
    pub fn center_y(&self) -> f64 {
        f64::from(self.y) + f64::from(self.height) / 2.0
    }
}

/// Measured ink characteristics of one region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionCharacteristics {
    /// Estimated stroke width in pixels.
    pub stroke_width: f64,
    /// Fraction of ink pixels in the region box.
    pub text_density: f64,
}

/// Per-region characteristics and their aggregate consistency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontCharacteristics {
    /// One entry per text region, in the same order.
    pub regions: Vec<RegionCharacteristics>,
    /// Consistency across regions (1.0 = identical strokes and density).
    pub consistency_score: f64,
}

/// Font inconsistencies found across regions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FontInconsistencies {
    /// Penalty (0.0-1.0).
    pub penalty: f64,
    /// Human-readable issues, empty when consistent.
    pub messages: Vec<String>,
}

/// Baseline and spacing regularity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextAlignment {
    /// Mean of the alignment and spacing scores.
    pub score: f64,
    /// Penalizes baseline drift within a line (1.0 = level).
    pub alignment_score: f64,
    /// Penalizes irregular gaps within a line (1.0 = regular).
    pub spacing_score: f64,
}

impl TextAlignment {
    /// Alignment of a document without comparable regions.
    #[must_use]
    pub const fn regular() -> Self {
        Self {
            score: 1.0,
            alignment_score: 1.0,
            spacing_score: 1.0,
        }
    }
}

/// Font and handwriting consistency results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontAnalysisResult {
    /// Font tamper score (0.0-1.0).
    pub score: f64,
    /// Detected text regions in reading order.
    pub text_regions: Vec<TextRegion>,
    /// Per-region measurements.
    pub characteristics: FontCharacteristics,
    /// Detected inconsistencies.
    pub inconsistencies: FontInconsistencies,
    /// Baseline and spacing regularity.
    pub alignment: TextAlignment,
}

/// Complete forensic analysis of one document image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForensicsResult {
    /// Edge tamper score.
    pub edge_score: f64,
    /// Compression tamper score.
    pub compression_score: f64,
    /// Font tamper score.
    pub font_score: f64,
    /// Weighted sum of the three scores.
    pub overall_score: f64,
    /// Anomaly labels: edge first, then compression, then font.
    pub detected_anomalies: Vec<String>,
    /// Raw edge analysis.
    pub edge_analysis: EdgeAnalysisResult,
    /// Raw compression analysis.
    pub compression_analysis: CompressionAnalysisResult,
    /// Raw font analysis.
    pub font_analysis: FontAnalysisResult,
    /// SHA-256 of the analyzed bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_digest: Option<String>,
}

impl ForensicsResult {
    /// Combines the three sub-scores with the fixed weights.
    #[must_use]
    pub fn weighted_score(edge: f64, compression: f64, font: f64) -> f64 {
        (EDGE_WEIGHT * edge + COMPRESSION_WEIGHT * compression + FONT_WEIGHT * font)
            .clamp(0.0, 1.0)
    }

    /// Returns true if the given anomaly label was detected.
    #[must_use]
    pub fn has_anomaly(&self, label: &str) -> bool {
        self.detected_anomalies.iter().any(|a| a == label)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_sum_to_one() {
        assert!((EDGE_WEIGHT + COMPRESSION_WEIGHT + FONT_WEIGHT - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_weighted_score() {
        let score = ForensicsResult::weighted_score(1.0, 0.5, 0.0);
        assert!((score - 0.55).abs() < 1e-9, "got {score}");
        assert!((ForensicsResult::weighted_score(1.0, 1.0, 1.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_text_region_geometry() {
        let region = TextRegion::new(10, 20, 8, 16);
        assert_eq!(region.area, 128);
        assert!((region.aspect_ratio - 0.5).abs() < f64::EPSILON);
        assert_eq!(region.bottom(), 36);
        assert_eq!(region.right(), 18);
        assert!((region.center_y() - 28.0).abs() < f64::EPSILON);
    }
}
