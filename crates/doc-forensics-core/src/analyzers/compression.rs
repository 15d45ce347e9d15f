//! Compression artifact analysis.
//!
//! Works on the 8x8 DCT grid JPEG uses. Each textured block gets an artifact
//! strength (how many high-frequency coefficients were quantized away);
//! pasted content carries a different compression history than its
//! surroundings, which shows up as local heterogeneity of that strength.
//! Double compression leaves periodic gaps in the low-frequency coefficient
//! histogram.

use anyhow::ensure;
use tracing::debug;

use crate::domain::{
    CompressionAnalysisResult, CompressionInconsistencies, ForensicAnalyzer, JpegArtifacts,
    RawImage, RecompressionPatterns,
};
use crate::imaging::dct::{Dct8, BLOCK};
use crate::imaging::stats;

/// Minimum textured blocks in a 3x3 neighbourhood for it to be evaluated.
const MIN_NEIGHBOURHOOD: usize = 5;

/// Smallest baseline variance used as a divisor.
const BASELINE_EPSILON: f64 = 1e-4;

/// Configuration for compression analysis.
#[derive(Debug, Clone)]
pub struct CompressionConfig {
    /// AC energy below which a block is flat and carries no compression trace.
    pub flat_energy: f64,
    /// Coefficient magnitude treated as quantized to zero.
    pub zero_tolerance: f64,
    /// Neighbourhood variance multiple of the baseline that flags a region.
    pub variance_multiplier: f64,
    /// Absolute neighbourhood variance a flagged region must exceed.
    pub variance_floor: f64,
    /// Heterogeneity excess that saturates the inconsistency score.
    pub heterogeneity_scale: f64,
    /// Flagged fraction of neighbourhoods that saturates the inconsistency score.
    pub flagged_fraction_scale: f64,
    /// Bins of the low-frequency coefficient histogram (values 1..=bins).
    pub histogram_bins: usize,
    /// Largest histogram lag searched for periodicity.
    pub max_lag: usize,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            flat_energy: 100.0,
            zero_tolerance: 1.0,
            variance_multiplier: 3.0,
            variance_floor: 1e-3,
            heterogeneity_scale: 4.0,
            flagged_fraction_scale: 0.1,
            histogram_bins: 64,
            max_lag: 16,
        }
    }
}

impl CompressionConfig {
    /// Checks the settings the analyzer relies on.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid setting.
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.zero_tolerance > 0.0,
            "zero_tolerance must be positive, got {}",
            self.zero_tolerance
        );
        ensure!(
            self.variance_multiplier > 0.0,
            "variance_multiplier must be positive, got {}",
            self.variance_multiplier
        );
        ensure!(
            self.heterogeneity_scale > 0.0 && self.flagged_fraction_scale > 0.0,
            "score scales must be positive"
        );
        ensure!(self.max_lag >= 2, "max_lag must be at least 2");
        ensure!(
            self.histogram_bins > self.max_lag,
            "histogram_bins ({}) must exceed max_lag ({})",
            self.histogram_bins,
            self.max_lag
        );
        Ok(())
    }
}

/// JPEG block artifact analyzer.
pub struct CompressionAnalyzer {
    config: CompressionConfig,
    dct: Dct8,
}

impl CompressionAnalyzer {
    /// Creates a new compression analyzer with the given configuration.
    #[must_use]
    pub fn new(config: CompressionConfig) -> Self {
        Self {
            config,
            dct: Dct8::new(),
        }
    }

    /// Returns the analyzer configuration.
    #[must_use]
    pub const fn config(&self) -> &CompressionConfig {
        &self.config
    }

    /// Artifact strength of every block, `None` for flat blocks, plus the
    /// histogram of rounded first-order AC magnitudes over textured blocks.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn block_grid(&self, pixels: &[u8], grid_w: usize, grid_h: usize, width: usize) -> BlockGrid {
        let mut strengths = Vec::with_capacity(grid_w * grid_h);
        let mut histogram = vec![0.0; self.config.histogram_bins];

        for by in 0..grid_h {
            for bx in 0..grid_w {
                let coeffs = self.dct.forward(pixels, width, bx * BLOCK, by * BLOCK);

                let ac_energy: f64 = coeffs
                    .iter()
                    .flatten()
                    .skip(1)
                    .map(|c| c * c)
                    .sum();
                if ac_energy < self.config.flat_energy {
                    strengths.push(None);
                    continue;
                }

                let mut high = 0usize;
                let mut suppressed = 0usize;
                for (v, row) in coeffs.iter().enumerate() {
                    for (u, c) in row.iter().enumerate() {
                        if u + v >= BLOCK {
                            high += 1;
                            if c.abs() < self.config.zero_tolerance {
                                suppressed += 1;
                            }
                        }
                    }
                }
                strengths.push(Some(suppressed as f64 / high as f64));

                for c in [coeffs[0][1], coeffs[1][0]] {
                    let bin = c.abs().round() as usize;
                    if (1..=self.config.histogram_bins).contains(&bin) {
                        histogram[bin - 1] += 1.0;
                    }
                }
            }
        }

        BlockGrid {
            strengths,
            histogram,
        }
    }
}

impl Default for CompressionAnalyzer {
    fn default() -> Self {
        Self::new(CompressionConfig::default())
    }
}

struct BlockGrid {
    strengths: Vec<Option<f64>>,
    histogram: Vec<f64>,
}

impl ForensicAnalyzer for CompressionAnalyzer {
    type Output = CompressionAnalysisResult;

    fn name(&self) -> &'static str {
        "compression"
    }

    fn analyze(&self, image: &RawImage) -> anyhow::Result<CompressionAnalysisResult> {
        self.config.validate()?;
        let (width, height) = image.shape();
        let (grid_w, grid_h) = (width / BLOCK, height / BLOCK);

        let grid = self.block_grid(image.gray_pixels(), grid_w, grid_h, width);
        let textured: Vec<f64> = grid.strengths.iter().flatten().copied().collect();

        let jpeg_artifacts = JpegArtifacts {
            score: stats::mean(&textured).clamp(0.0, 1.0),
            blocks_analyzed: grid.strengths.len(),
            textured_blocks: textured.len(),
        };
        let inconsistencies = local_inconsistencies(&grid.strengths, grid_w, grid_h, &self.config);
        let recompression_patterns = periodicity(&grid.histogram, self.config.max_lag);

        let score = (0.6 * inconsistencies.score
            + 0.25 * recompression_patterns.score
            + 0.15 * jpeg_artifacts.score)
            .clamp(0.0, 1.0);

        debug!(
            "Compression analysis: score={score:.3}, textured={}/{}, \
             heterogeneity={:.2}, flagged={}/{}",
            jpeg_artifacts.textured_blocks,
            jpeg_artifacts.blocks_analyzed,
            inconsistencies.heterogeneity,
            inconsistencies.flagged_regions,
            inconsistencies.regions_analyzed
        );

        Ok(CompressionAnalysisResult {
            score,
            jpeg_artifacts,
            inconsistencies,
            recompression_patterns,
        })
    }
}

/// Evaluates 3x3 neighbourhoods of block strengths against the image-wide
/// baseline.
///
/// `strengths` is a row-major `grid_w`x`grid_h` grid with `None` for flat blocks.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn local_inconsistencies(
    strengths: &[Option<f64>],
    grid_w: usize,
    grid_h: usize,
    config: &CompressionConfig,
) -> CompressionInconsistencies {
    let mut local = Vec::new();
    let mut window = Vec::with_capacity(9);

    for by in 0..grid_h {
        for bx in 0..grid_w {
            if strengths[by * grid_w + bx].is_none() {
                continue;
            }
            window.clear();
            for ny in by.saturating_sub(1)..=(by + 1).min(grid_h - 1) {
                for nx in bx.saturating_sub(1)..=(bx + 1).min(grid_w - 1) {
                    if let Some(s) = strengths[ny * grid_w + nx] {
                        window.push(s);
                    }
                }
            }
            if window.len() >= MIN_NEIGHBOURHOOD {
                local.push(stats::variance(&window));
            }
        }
    }

    if local.is_empty() {
        return CompressionInconsistencies {
            score: 0.0,
            flagged_regions: 0,
            regions_analyzed: 0,
            heterogeneity: 0.0,
        };
    }

    let textured: Vec<f64> = strengths.iter().flatten().copied().collect();
    let baseline = stats::mean(&local);
    let heterogeneity = stats::variance(&textured) / baseline.max(BASELINE_EPSILON);

    let flagged_regions = local
        .iter()
        .filter(|&&v| v > config.variance_multiplier * baseline && v > config.variance_floor)
        .count();
    let flagged_fraction = flagged_regions as f64 / local.len() as f64;

    let score = f64::max(
        ((heterogeneity - 1.0) / config.heterogeneity_scale).clamp(0.0, 1.0),
        (flagged_fraction / config.flagged_fraction_scale).clamp(0.0, 1.0),
    );

    CompressionInconsistencies {
        score,
        flagged_regions,
        regions_analyzed: local.len(),
        heterogeneity,
    }
}

/// Strongest positive normalized autocorrelation of a histogram over lags
/// `2..=max_lag`.
#[must_use]
pub fn periodicity(histogram: &[f64], max_lag: usize) -> RecompressionPatterns {
    let mean = stats::mean(histogram);
    let centred: Vec<f64> = histogram.iter().map(|h| h - mean).collect();
    let energy: f64 = centred.iter().map(|c| c * c).sum();

    let none = RecompressionPatterns {
        score: 0.0,
        dominant_period: None,
    };
    if energy <= f64::EPSILON {
        return none;
    }

    (2..=max_lag.min(centred.len().saturating_sub(1)))
        .map(|lag| {
            let r: f64 = centred
                .iter()
                .zip(&centred[lag..])
                .map(|(a, b)| a * b)
                .sum::<f64>()
                / energy;
            (lag, r)
        })
        .filter(|&(_, r)| r > 0.0)
        .fold(none, |best, (lag, r)| {
            if r > best.score {
                RecompressionPatterns {
                    score: r.min(1.0),
                    dominant_period: Some(lag),
                }
            } else {
                best
            }
        })
}
