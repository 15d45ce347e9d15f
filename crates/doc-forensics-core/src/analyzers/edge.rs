//! Edge analysis.
//!
//! Flags splicing through broken edge continuity and copy-paste duplication
//! through correlated blocks:
//! - Sobel gradient mask segmented into connected edge regions
//! - Endpoint density of the thinned mask per region as a discontinuity measure
//! - Sorted block matching with normalized cross-correlation

use anyhow::ensure;
use tracing::debug;

use crate::domain::{ClonedRegions, EdgeAnalysisResult, EdgeContinuity, ForensicAnalyzer, RawImage};
use crate::imaging::blocks::{self, Block};
use crate::imaging::components::{connected_regions, neighbour_count, thin};
use crate::imaging::gradient::{sobel_magnitude, SOBEL_MAX};

/// Configuration for edge analysis.
#[derive(Debug, Clone)]
pub struct EdgeConfig {
    /// Sobel magnitude at or above which a pixel is an edge.
    pub edge_threshold: f64,
    /// Edge regions smaller than this are ignored.
    pub min_region_pixels: usize,
    /// Endpoints per thinned edge pixel above which a region counts as broken.
    pub continuity_threshold: f64,
    /// Side of the square blocks compared for cloning.
    pub block_size: usize,
    /// Step between overlapping blocks; 1 finds copies at any offset.
    pub block_stride: usize,
    /// Upper bound on compared blocks; the most textured are kept.
    pub max_blocks: usize,
    /// Blocks flatter than this standard deviation are not compared.
    pub min_block_std: f64,
    /// Correlation at or above which a block pair counts as cloned.
    pub similarity_threshold: f64,
    /// Largest mean difference between blocks worth correlating.
    pub mean_tolerance: f64,
    /// Successors in sorted order compared with each block.
    pub max_neighbors: usize,
    /// Number of cloned pairs that saturates the clone score.
    pub clone_scaling: f64,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            edge_threshold: 100.0,
            min_region_pixels: 8,
            continuity_threshold: 0.15,
            block_size: 16,
            block_stride: 1,
            max_blocks: 16_384,
            min_block_std: 8.0,
            similarity_threshold: 0.95,
            mean_tolerance: 1.0,
            max_neighbors: 16,
            clone_scaling: 32.0,
        }
    }
}

impl EdgeConfig {
    /// Checks the settings the analyzer relies on.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid setting.
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.block_size > 0, "block_size must be positive");
        ensure!(self.block_stride > 0, "block_stride must be positive");
        ensure!(self.max_blocks > 0, "max_blocks must be positive");
        ensure!(
            self.similarity_threshold > 0.0 && self.similarity_threshold <= 1.0,
            "similarity_threshold must be in (0, 1], got {}",
            self.similarity_threshold
        );
        ensure!(
            self.clone_scaling > 0.0,
            "clone_scaling must be positive, got {}",
            self.clone_scaling
        );
        ensure!(
            self.edge_threshold.is_finite() && self.edge_threshold >= 0.0,
            "edge_threshold must be a non-negative number"
        );
        Ok(())
    }
}

/// Edge continuity and clone detection analyzer.
pub struct EdgeAnalyzer {
    config: EdgeConfig,
}

impl EdgeAnalyzer {
    /// Creates a new edge analyzer with the given configuration.
    #[must_use]
    pub const fn new(config: EdgeConfig) -> Self {
        Self { config }
    }

    /// Returns the analyzer configuration.
    #[must_use]
    pub const fn config(&self) -> &EdgeConfig {
        &self.config
    }
}

impl Default for EdgeAnalyzer {
    fn default() -> Self {
        Self::new(EdgeConfig::default())
    }
}

impl ForensicAnalyzer for EdgeAnalyzer {
    type Output = EdgeAnalysisResult;

    fn name(&self) -> &'static str {
        "edge"
    }

    fn analyze(&self, image: &RawImage) -> anyhow::Result<EdgeAnalysisResult> {
        self.config.validate()?;
        let (width, height) = image.shape();
        let pixels = image.gray_pixels();

        let (continuity, sharpness) = edge_continuity(pixels, width, height, &self.config);
        let cloned_regions = detect_cloned_regions(pixels, width, height, &self.config);
        let score = composite_score(&continuity, sharpness, &cloned_regions);

        debug!(
            "Edge analysis: score={score:.3}, regions={}, broken={}, clones={}/{}",
            continuity.total_regions,
            continuity.broken_edges,
            cloned_regions.high_correlations,
            cloned_regions.total_comparisons
        );

        Ok(EdgeAnalysisResult {
            score,
            continuity,
            sharpness,
            cloned_regions,
        })
    }
}

/// Measures continuity of connected edge regions and mean edge sharpness.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn edge_continuity(
    pixels: &[u8],
    width: usize,
    height: usize,
    config: &EdgeConfig,
) -> (EdgeContinuity, f64) {
    let magnitude = sobel_magnitude(pixels, width, height);
    let mask: Vec<bool> = magnitude
        .iter()
        .map(|&m| m >= config.edge_threshold && m > 0.0)
        .collect();

    let (edge_count, edge_sum) = magnitude
        .iter()
        .zip(&mask)
        .filter(|&(_, &e)| e)
        .fold((0usize, 0.0), |(n, sum), (&m, _)| (n + 1, sum + m));
    let sharpness = if edge_count == 0 {
        0.0
    } else {
        edge_sum / edge_count as f64
    };

    // Endpoints are counted on one-pixel lines; a Sobel band is two or more
    // pixels thick and hides where an edge stops.
    let skeleton = thin(&mask, width, height);
    let mut total_regions = 0;
    let mut broken_edges = 0;
    for region in connected_regions(&mask, width, height) {
        if region.len() < config.min_region_pixels {
            continue;
        }
        total_regions += 1;

        let (length, endpoints) = region
            .iter()
            .filter(|&&index| skeleton[index])
            .fold((0usize, 0usize), |(length, endpoints), &index| {
                let end = neighbour_count(&skeleton, index, width, height) <= 1;
                (length + 1, endpoints + usize::from(end))
            });
        let discontinuity = endpoints as f64 / length.max(1) as f64;
        if discontinuity > config.continuity_threshold {
            broken_edges += 1;
        }
    }

    let score = if total_regions == 0 {
        1.0
    } else {
        1.0 - broken_edges as f64 / total_regions as f64
    };

    (
        EdgeContinuity {
            score,
            total_regions,
            broken_edges,
        },
        sharpness,
    )
}

/// Counts highly correlated block pairs that lie farther apart than one
/// block diagonal.
///
/// When more than `max_blocks` blocks are textured enough to compare, only the
/// most textured are kept. Exact copies share their variance, so a copy and
/// its source are kept or dropped together.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn detect_cloned_regions(
    pixels: &[u8],
    width: usize,
    height: usize,
    config: &EdgeConfig,
) -> ClonedRegions {
    let size = config.block_size;
    let min_variance = config.min_block_std * config.min_block_std;

    let mut candidates: Vec<Block> =
        blocks::partition(pixels, width, height, size, config.block_stride)
            .into_iter()
            .filter(|b| b.variance >= min_variance)
            .collect();
    if candidates.len() > config.max_blocks {
        if let Some(last) = config.max_blocks.checked_sub(1) {
            candidates.select_nth_unstable_by(last, |a, b| b.variance.total_cmp(&a.variance));
        }
        candidates.truncate(config.max_blocks);
    }
    candidates.sort_by(|a, b| {
        a.mean
            .total_cmp(&b.mean)
            .then(a.variance.total_cmp(&b.variance))
            .then(a.y.cmp(&b.y))
            .then(a.x.cmp(&b.x))
    });

    // Centres closer than the block diagonal are trivially similar neighbours.
    let diagonal_sq = 2.0 * (size * size) as f64;
    let mut total_comparisons = 0usize;
    let mut high_correlations = 0usize;

    for (i, a) in candidates.iter().enumerate() {
        for b in candidates.iter().skip(i + 1).take(config.max_neighbors) {
            if b.mean - a.mean > config.mean_tolerance {
                break;
            }
            if a.center_distance_sq(b) <= diagonal_sq {
                continue;
            }
            total_comparisons += 1;
            let ncc = blocks::normalized_cross_correlation(pixels, width, size, a, b);
            if ncc >= config.similarity_threshold {
                high_correlations += 1;
            }
        }
    }

    ClonedRegions {
        score: (high_correlations as f64 / config.clone_scaling).min(1.0),
        high_correlations,
        total_comparisons,
    }
}

/// Combines continuity and clone evidence; clones dominate when present.
fn composite_score(continuity: &EdgeContinuity, sharpness: f64, cloned: &ClonedRegions) -> f64 {
    let sharpness_norm = (sharpness / SOBEL_MAX).clamp(0.0, 1.0);
    let continuity_anomaly = (1.0 - continuity.score) * (1.0 - 0.5 * sharpness_norm);

    let score = if cloned.high_correlations > 0 {
        0.7 * cloned.score + 0.3 * continuity_anomaly
    } else {
        0.5 * continuity_anomaly
    };
    score.clamp(0.0, 1.0)
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
mod tests {
    use super::*;

    /// Deterministic per-pixel noise.
    fn noise(x: usize, y: usize, seed: u64) -> u8 {
        let mut v = (x as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
            ^ (y as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F)
            ^ seed;
        v ^= v >> 33;
        v = v.wrapping_mul(0xFF51_AFD7_ED55_8CCD);
        v ^= v >> 33;
        (v & 0xFF) as u8
    }

    fn noise_plane(width: usize, height: usize, seed: u64) -> Vec<u8> {
        (0..width * height)
            .map(|i| noise(i % width, i / width, seed))
            .collect()
    }

    /// Copies the `size`x`size` patch at `from` onto `to`.
    fn copy_patch(
        pixels: &mut [u8],
        width: usize,
        size: usize,
        from: (usize, usize),
        to: (usize, usize),
    ) {
        for y in 0..size {
            for x in 0..size {
                pixels[(to.1 + y) * width + to.0 + x] = pixels[(from.1 + y) * width + from.0 + x];
            }
        }
    }

    /// Short vertical edges whose contrast fades out above and below, so each
    /// edge ends without closing into a contour.
    fn faded_edges(width: usize, height: usize) -> Vec<u8> {
        let centre = height / 2;
        (0..width * height)
            .map(|i| {
                let (x, y) = (i % width, i / width);
                let amplitude = (40.0 - 8.0 * y.abs_diff(centre) as f64).max(0.0);
                let offset: f64 = (8..width)
                    .step_by(12)
                    .map(|cx| x as f64 - cx as f64 + 0.5)
                    .filter(|d| d.abs() < 6.0)
                    .map(|d| amplitude * (1.0 - d.abs() / 6.0) * d.signum())
                    .sum();
                (128.0 + offset).round() as u8
            })
            .collect()
    }

    fn raw(pixels: Vec<u8>, width: u32, height: u32) -> RawImage {
        let gray = image::GrayImage::from_raw(width, height, pixels).expect("buffer size");
        RawImage::from_dynamic(&image::DynamicImage::ImageLuma8(gray)).expect("valid image")
    }

    #[test]
    fn test_default_config() {
        let config = EdgeConfig::default();
        assert_eq!(config.block_size, 16);
        assert!((config.similarity_threshold - 0.95).abs() < f64::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_analyzer_name() {
        assert_eq!(EdgeAnalyzer::default().name(), "edge");
    }

    #[test]
    fn test_blank_page_is_clean() {
        let result = EdgeAnalyzer::default()
            .analyze(&raw(vec![245; 64 * 64], 64, 64))
            .expect("analysis should succeed");

        assert!(result.score.abs() < f64::EPSILON);
        assert_eq!(result.continuity.total_regions, 0);
        assert!((result.continuity.score - 1.0).abs() < f64::EPSILON);
        assert!(result.sharpness.abs() < f64::EPSILON);
        assert_eq!(result.cloned_regions.total_comparisons, 0);
    }

    #[test]
    fn test_clone_detected() {
        let (w, h) = (128, 128);
        let mut pixels = noise_plane(w, h, 7);
        copy_patch(&mut pixels, w, 32, (8, 8), (80, 80));

        let result = detect_cloned_regions(&pixels, w, h, &EdgeConfig::default());
        assert!(result.high_correlations >= 9, "got {result:?}");
        assert!(result.score > 0.0);
    }

    #[test]
    fn test_clone_detected_at_any_offset() {
        let (w, h) = (128, 128);
        for to in [(83, 83), (81, 80), (84, 84), (76, 90)] {
            let mut pixels = noise_plane(w, h, 3);
            copy_patch(&mut pixels, w, 32, (8, 8), to);

            let result = detect_cloned_regions(&pixels, w, h, &EdgeConfig::default());
            // Every one of the 17x17 block positions inside the patch has a twin.
            assert!(result.high_correlations >= 17 * 17, "copy to {to:?}: {result:?}");
            assert!((result.score - 1.0).abs() < f64::EPSILON, "copy to {to:?}: {result:?}");
        }
    }

    #[test]
    fn test_noise_has_no_clones() {
        let pixels = noise_plane(128, 128, 11);
        let result = detect_cloned_regions(&pixels, 128, 128, &EdgeConfig::default());

        assert_eq!(result.high_correlations, 0);
        assert!(result.score.abs() < f64::EPSILON);
        assert!(result.total_comparisons > 0);
    }

    #[test]
    fn test_neighbouring_blocks_not_compared() {
        // A single textured stripe: every block has the same statistics and
        // offsets 0..=24 along one row.
        let (w, h) = (40, 16);
        let pixels: Vec<u8> = (0..w * h).map(|i| if (i / w) % 2 == 0 { 0 } else { 200 }).collect();

        let result = detect_cloned_regions(&pixels, w, h, &EdgeConfig::default());
        assert_eq!(result.total_comparisons, 0, "16 successors all overlap");

        let config = EdgeConfig {
            max_neighbors: 32,
            ..Default::default()
        };
        let result = detect_cloned_regions(&pixels, w, h, &config);
        // Only (0, 23), (0, 24) and (1, 24) are more than a diagonal apart.
        assert_eq!(result.total_comparisons, 3);
        assert_eq!(result.high_correlations, 3);
    }

    #[test]
    fn test_block_cap_keeps_textured_copies() {
        // Low-contrast texture with a full-range patch copied far away.
        let (w, h) = (128, 128);
        let mut pixels: Vec<u8> = (0..w * h).map(|i| 112 + noise(i % w, i / w, 5) % 32).collect();
        for y in 0..24 {
            for x in 0..24 {
                let v = noise(x, y, 9);
                pixels[(10 + y) * w + 10 + x] = v;
                pixels[(83 + y) * w + 85 + x] = v;
            }
        }
        let config = EdgeConfig {
            max_blocks: 400,
            ..Default::default()
        };

        let result = detect_cloned_regions(&pixels, w, h, &config);
        assert!(result.total_comparisons <= 400 * config.max_neighbors);
        assert!(result.high_correlations > 0, "got {result:?}");
    }

    #[test]
    fn test_continuity_of_solid_rectangle() {
        let (w, h) = (40, 40);
        let pixels: Vec<u8> = (0..w * h)
            .map(|i| {
                let (x, y) = (i % w, i / w);
                if (10..30).contains(&x) && (10..30).contains(&y) {
                    0
                } else {
                    255
                }
            })
            .collect();
        let (continuity, sharpness) = edge_continuity(&pixels, w, h, &EdgeConfig::default());

        assert_eq!(continuity.total_regions, 1);
        assert_eq!(continuity.broken_edges, 0);
        assert!(sharpness > 100.0);
    }

    #[test]
    fn test_faded_edges_are_broken() {
        // Six open edge segments, each a short open line once thinned.
        let (w, h) = (72, 24);
        let (continuity, _) = edge_continuity(&faded_edges(w, h), w, h, &EdgeConfig::default());

        assert_eq!(continuity.total_regions, 6);
        assert_eq!(continuity.broken_edges, 6);
        assert!(continuity.score.abs() < f64::EPSILON);
    }

    #[test]
    fn test_invalid_config_fails() {
        let analyzer = EdgeAnalyzer::new(EdgeConfig {
            block_size: 0,
            ..Default::default()
        });
        let err = analyzer
            .analyze(&raw(vec![0; 16], 4, 4))
            .expect_err("zero block size must fail");
        assert!(err.to_string().contains("block_size"));
    }

    #[test]
    fn test_tiny_image() {
        let result = EdgeAnalyzer::default()
            .analyze(&raw(vec![0, 255, 255, 0], 2, 2))
            .expect("tiny image should not fail");
        assert!((0.0..=1.0).contains(&result.score));
    }

    #[test]
    fn test_composite_prefers_clones() {
        let continuity = EdgeContinuity {
            score: 1.0,
            total_regions: 3,
            broken_edges: 0,
        };
        let cloned = ClonedRegions {
            score: 1.0,
            high_correlations: 12,
            total_comparisons: 40,
        };
        let score = composite_score(&continuity, 500.0, &cloned);
        assert!((score - 0.7).abs() < 1e-9);

        let none = ClonedRegions {
            score: 0.0,
            high_correlations: 0,
            total_comparisons: 40,
        };
        let broken = EdgeContinuity {
            score: 0.0,
            total_regions: 3,
            broken_edges: 3,
        };
        let score = composite_score(&broken, 0.0, &none);
        assert!((score - 0.5).abs() < 1e-9);
    }
}
