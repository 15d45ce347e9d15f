//! Font and handwriting consistency analysis.
//!
//! Text written in one pass with one pen or font has similar stroke width,
//! ink density, baselines and spacing. Altered fields usually break at
//! least one of these.

use anyhow::ensure;
use tracing::debug;

use crate::domain::{
    anomaly, FontAnalysisResult, FontCharacteristics, FontInconsistencies, ForensicAnalyzer,
    RawImage, RegionCharacteristics, TextAlignment, TextRegion,
};
use crate::imaging::components::{bounding_box, connected_regions, dilate};
use crate::imaging::{stats, stroke, Histogram};

/// Configuration for font analysis.
#[derive(Debug, Clone)]
pub struct FontConfig {
    /// Minimum 1st-99th percentile luminance range for a page to carry ink.
    pub min_contrast: u8,
    /// Smallest region box area in pixels.
    pub min_region_area: u32,
    /// Largest region box as a fraction of the image area.
    pub max_region_fraction: f64,
    /// Narrowest accepted box (width / height).
    pub min_aspect_ratio: f64,
    /// Widest accepted box (width / height).
    pub max_aspect_ratio: f64,
    /// Regions kept in reading order.
    pub max_regions: usize,
    /// Stroke width coefficient of variation tolerated.
    pub stroke_cv_tolerance: f64,
    /// Ink density coefficient of variation tolerated.
    pub density_cv_tolerance: f64,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            min_contrast: 40,
            min_region_area: 20,
            max_region_fraction: 0.25,
            min_aspect_ratio: 0.1,
            max_aspect_ratio: 10.0,
            max_regions: 500,
            stroke_cv_tolerance: 0.25,
            density_cv_tolerance: 0.35,
        }
    }
}

impl FontConfig {
    /// Checks the settings the analyzer relies on.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid setting.
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.min_aspect_ratio > 0.0 && self.min_aspect_ratio <= self.max_aspect_ratio,
            "aspect ratio range [{}, {}] is invalid",
            self.min_aspect_ratio,
            self.max_aspect_ratio
        );
        ensure!(
            self.max_region_fraction > 0.0 && self.max_region_fraction <= 1.0,
            "max_region_fraction must be in (0, 1], got {}",
            self.max_region_fraction
        );
        ensure!(
            self.stroke_cv_tolerance > 0.0 && self.density_cv_tolerance > 0.0,
            "cv tolerances must be positive"
        );
        Ok(())
    }
}

/// Text region stroke and alignment analyzer.
pub struct FontAnalyzer {
    config: FontConfig,
}

impl FontAnalyzer {
    /// Creates a new font analyzer with the given configuration.
    #[must_use]
    pub const fn new(config: FontConfig) -> Self {
        Self { config }
    }

    /// Returns the analyzer configuration.
    #[must_use]
    pub const fn config(&self) -> &FontConfig {
        &self.config
    }
}

impl Default for FontAnalyzer {
    fn default() -> Self {
        Self::new(FontConfig::default())
    }
}

impl ForensicAnalyzer for FontAnalyzer {
    type Output = FontAnalysisResult;

    fn name(&self) -> &'static str {
        "font"
    }

    fn analyze(&self, image: &RawImage) -> anyhow::Result<FontAnalysisResult> {
        self.config.validate()?;
        let (width, height) = image.shape();
        let pixels = image.gray_pixels();

        let ink = ink_mask(pixels, &self.config);
        let boxes = detect_text_regions(&ink, width, height, &self.config);

        let regions: Vec<RegionCharacteristics> = boxes
            .iter()
            .map(|&rect| RegionCharacteristics {
                stroke_width: stroke::stroke_width(&ink, width, rect),
                text_density: stroke::ink_density(&ink, width, rect),
            })
            .collect();
        let text_regions: Vec<TextRegion> = boxes.iter().map(|&rect| to_region(rect)).collect();

        let characteristics = FontCharacteristics {
            consistency_score: consistency_score(&regions),
            regions,
        };
        let inconsistencies = find_inconsistencies(&characteristics.regions, &self.config);
        let alignment = text_alignment(&text_regions);

        let score = (0.5 * inconsistencies.penalty
            + 0.2 * (1.0 - characteristics.consistency_score)
            + 0.3 * (1.0 - alignment.score))
            .clamp(0.0, 1.0);

        debug!(
            "Font analysis: score={score:.3}, regions={}, consistency={:.3}, issues={:?}",
            text_regions.len(),
            characteristics.consistency_score,
            inconsistencies.messages
        );

        Ok(FontAnalysisResult {
            score,
            text_regions,
            characteristics,
            inconsistencies,
            alignment,
        })
    }
}

/// Binarizes a grayscale plane with Otsu's threshold; dark pixels are ink.
///
/// A page without enough contrast has no ink.
#[must_use]
pub fn ink_mask(pixels: &[u8], config: &FontConfig) -> Vec<bool> {
    let histogram = Histogram::from_pixels(pixels);
    let contrast = histogram
        .percentile(0.99)
        .saturating_sub(histogram.percentile(0.01));
    let threshold = if contrast < config.min_contrast {
        None
    } else {
        histogram.otsu_threshold()
    };

    match threshold {
        Some(t) => pixels.iter().map(|&p| p <= t).collect(),
        None => vec![false; pixels.len()],
    }
}

/// Groups ink into candidate word/character boxes, in reading order.
///
/// Boxes come from the 3x3-dilated ink components and are inclusive
/// `(min_x, min_y, max_x, max_y)` rectangles.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn detect_text_regions(
    ink: &[bool],
    width: usize,
    height: usize,
    config: &FontConfig,
) -> Vec<stroke::Rect> {
    let grouped = dilate(ink, width, height);
    let max_area = config.max_region_fraction * (width * height) as f64;

    let mut boxes: Vec<stroke::Rect> = connected_regions(&grouped, width, height)
        .iter()
        .filter_map(|region| bounding_box(region, width))
        .filter(|&(x0, y0, x1, y1)| {
            let (w, h) = (x1 - x0 + 1, y1 - y0 + 1);
            let area = (w * h) as f64;
            let aspect = w as f64 / h as f64;
            area >= f64::from(config.min_region_area)
                && area <= max_area
                && (config.min_aspect_ratio..=config.max_aspect_ratio).contains(&aspect)
        })
        .collect();

    boxes.sort_by_key(|&(x0, y0, _, _)| (y0, x0));
    boxes.truncate(config.max_regions);
    boxes
}

#[allow(clippy::cast_possible_truncation)]
fn to_region((x0, y0, x1, y1): stroke::Rect) -> TextRegion {
    TextRegion::new(
        x0 as u32,
        y0 as u32,
        (x1 - x0 + 1) as u32,
        (y1 - y0 + 1) as u32,
    )
}

fn stroke_widths(regions: &[RegionCharacteristics]) -> Vec<f64> {
    regions.iter().map(|r| r.stroke_width).collect()
}

fn densities(regions: &[RegionCharacteristics]) -> Vec<f64> {
    regions.iter().map(|r| r.text_density).collect()
}

/// Consistency of stroke width and density across regions (1.0 = uniform).
#[must_use]
pub fn consistency_score(regions: &[RegionCharacteristics]) -> f64 {
    if regions.len() < 2 {
        return 1.0;
    }
    let cv_stroke = stats::coefficient_of_variation(&stroke_widths(regions));
    let cv_density = stats::coefficient_of_variation(&densities(regions));
    1.0 - (0.7 * cv_stroke + 0.3 * cv_density).clamp(0.0, 1.0)
}

/// Flags stroke and density variation beyond the configured tolerances.
#[must_use]
pub fn find_inconsistencies(
    regions: &[RegionCharacteristics],
    config: &FontConfig,
) -> FontInconsistencies {
    if regions.len() < 2 {
        return FontInconsistencies::default();
    }
    let cv_stroke = stats::coefficient_of_variation(&stroke_widths(regions));
    let cv_density = stats::coefficient_of_variation(&densities(regions));

    let excess = |cv: f64, tolerance: f64| ((cv - tolerance) / tolerance).max(0.0);
    let stroke_excess = excess(cv_stroke, config.stroke_cv_tolerance);
    let density_excess = excess(cv_density, config.density_cv_tolerance);

    let mut messages = Vec::new();
    if cv_stroke > config.stroke_cv_tolerance {
        messages.push(anomaly::STROKE_WIDTH_VARIATION.to_string());
    }
    if cv_density > config.density_cv_tolerance {
        messages.push(anomaly::DENSITY_VARIATION.to_string());
    }

    FontInconsistencies {
        penalty: (stroke_excess + 0.5 * density_excess).clamp(0.0, 1.0),
        messages,
    }
}

/// Groups regions into lines by vertical centre, each ordered left to right.
fn group_lines(regions: &[TextRegion], tolerance: f64) -> Vec<Vec<TextRegion>> {
    let mut sorted = regions.to_vec();
    sorted.sort_by(|a, b| a.center_y().total_cmp(&b.center_y()));

    let mut lines: Vec<Vec<TextRegion>> = Vec::new();
    for region in sorted {
        match lines.last_mut() {
            Some(line) if (region.center_y() - line[0].center_y()).abs() <= tolerance => {
                line.push(region);
            }
            _ => lines.push(vec![region]),
        }
    }
    for line in &mut lines {
        line.sort_by_key(|r| r.x);
    }
    lines
}

/// Scores baseline drift and gap regularity of regions in reading order.
#[must_use]
pub fn text_alignment(regions: &[TextRegion]) -> TextAlignment {
    if regions.len() < 2 {
        return TextAlignment::regular();
    }
    let heights: Vec<f64> = regions.iter().map(|r| f64::from(r.height)).collect();
    let median_height = stats::median(&heights).max(1.0);

    let mut baseline_spread = Vec::new();
    let mut gap_variation = Vec::new();
    for line in group_lines(regions, median_height / 2.0) {
        if line.len() < 2 {
            continue;
        }
        let baselines: Vec<f64> = line.iter().map(|r| f64::from(r.bottom())).collect();
        baseline_spread.push(stats::std_dev(&baselines));

        if line.len() >= 3 {
            let gaps: Vec<f64> = line
                .windows(2)
                .map(|pair| (f64::from(pair[1].x) - f64::from(pair[0].right())).max(0.0))
                .collect();
            gap_variation.push(stats::coefficient_of_variation(&gaps));
        }
    }

    let alignment_score = if baseline_spread.is_empty() {
        1.0
    } else {
        1.0 - (stats::mean(&baseline_spread) / median_height * 2.0).clamp(0.0, 1.0)
    };
    let spacing_score = if gap_variation.is_empty() {
        1.0
    } else {
        1.0 - stats::mean(&gap_variation).clamp(0.0, 1.0)
    };

    TextAlignment {
        score: (alignment_score + spacing_score) / 2.0,
        alignment_score,
        spacing_score,
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    /// Draws "H" glyphs with the given strokes on one baseline, 8px apart.
    fn glyph_row(strokes: &[usize]) -> RawImage {
        let glyph_h = 18;
        let total: usize = strokes.iter().map(|s| 3 * s + 6 + 8).sum();
        let (width, height) = (total + 16, glyph_h + 16);
        let mut pixels = vec![250u8; width * height];

        let mut left = 8;
        for &s in strokes {
            let gw = 3 * s + 6;
            let mid = glyph_h / 2 - s / 2;
            for y in 0..glyph_h {
                for x in 0..gw {
                    if x < s || x >= gw - s || (mid..mid + s).contains(&y) {
                        pixels[(y + 8) * width + left + x] = 20;
                    }
                }
            }
            left += gw + 8;
        }

        let gray = image::GrayImage::from_raw(
            u32::try_from(width).expect("width"),
            u32::try_from(height).expect("height"),
            pixels,
        )
        .expect("buffer size");
        RawImage::from_dynamic(&image::DynamicImage::ImageLuma8(gray)).expect("valid image")
    }

    fn characteristics(stroke_width: f64, text_density: f64) -> RegionCharacteristics {
        RegionCharacteristics {
            stroke_width,
            text_density,
        }
    }

    #[test]
    fn test_analyzer_name() {
        assert_eq!(FontAnalyzer::default().name(), "font");
    }

    #[test]
    fn test_uniform_strokes_are_consistent() {
        let result = FontAnalyzer::default()
            .analyze(&glyph_row(&[3; 6]))
            .expect("analysis should succeed");

        assert_eq!(result.text_regions.len(), 6);
        assert!(result.characteristics.consistency_score > 0.8);
        assert!(result.inconsistencies.messages.is_empty());
        assert!(result.inconsistencies.penalty.abs() < f64::EPSILON);
        assert!((result.alignment.score - 1.0).abs() < 1e-9);
        for region in &result.characteristics.regions {
            assert!((region.stroke_width - 3.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn test_varying_strokes_are_flagged() {
        let result = FontAnalyzer::default()
            .analyze(&glyph_row(&[1, 2, 3, 4, 5, 6]))
            .expect("analysis should succeed");

        assert_eq!(result.text_regions.len(), 6);
        assert!(result
            .inconsistencies
            .messages
            .iter()
            .any(|m| m == anomaly::STROKE_WIDTH_VARIATION));
        assert!(result.inconsistencies.penalty > 0.0);
        assert!(result.score > 0.0);
    }

    #[test]
    fn test_blank_page_has_no_regions() {
        let gray = image::GrayImage::from_pixel(40, 30, image::Luma([230]));
        let raw = RawImage::from_dynamic(&image::DynamicImage::ImageLuma8(gray))
            .expect("valid image");
        let result = FontAnalyzer::default()
            .analyze(&raw)
            .expect("analysis should succeed");

        assert!(result.text_regions.is_empty());
        assert!((result.characteristics.consistency_score - 1.0).abs() < f64::EPSILON);
        assert!(result.score.abs() < f64::EPSILON);
    }

    #[test]
    fn test_low_contrast_has_no_ink() {
        let pixels: Vec<u8> = (0..100).map(|i| if i % 2 == 0 { 120 } else { 130 }).collect();
        let ink = ink_mask(&pixels, &FontConfig::default());
        assert!(ink.iter().all(|&i| !i));
    }

    #[test]
    fn test_reading_order() {
        let row = glyph_row(&[2, 2, 2]);
        let (w, h) = row.shape();
        let config = FontConfig::default();
        let boxes = detect_text_regions(&ink_mask(row.gray_pixels(), &config), w, h, &config);
        let xs: Vec<usize> = boxes.iter().map(|b| b.0).collect();
        assert_eq!(xs, vec![7, 27, 47]);
    }

    #[test]
    fn test_density_message() {
        let regions = [
            characteristics(2.0, 0.1),
            characteristics(2.0, 0.5),
            characteristics(2.0, 0.9),
        ];
        let found = find_inconsistencies(&regions, &FontConfig::default());
        assert_eq!(found.messages, vec![anomaly::DENSITY_VARIATION.to_string()]);
        assert!(found.penalty > 0.0);
    }

    #[test]
    fn test_single_region_is_consistent() {
        let regions = [characteristics(4.0, 0.3)];
        assert!((consistency_score(&regions) - 1.0).abs() < f64::EPSILON);
        assert!(find_inconsistencies(&regions, &FontConfig::default())
            .messages
            .is_empty());
    }

    #[test]
    fn test_baseline_drift_lowers_alignment() {
        let level = [
            TextRegion::new(0, 10, 10, 20),
            TextRegion::new(20, 10, 10, 20),
            TextRegion::new(40, 10, 10, 20),
        ];
        let drifting = [
            TextRegion::new(0, 10, 10, 20),
            TextRegion::new(20, 14, 10, 20),
            TextRegion::new(40, 6, 10, 20),
        ];
        let level = text_alignment(&level);
        let drifting = text_alignment(&drifting);

        assert!((level.alignment_score - 1.0).abs() < f64::EPSILON);
        assert!(drifting.alignment_score < level.alignment_score);
    }

    #[test]
    fn test_irregular_spacing_lowers_spacing_score() {
        let regions = [
            TextRegion::new(0, 0, 10, 20),
            TextRegion::new(12, 0, 10, 20),
            TextRegion::new(60, 0, 10, 20),
        ];
        let alignment = text_alignment(&regions);
        assert!(alignment.spacing_score < 1.0);
        assert!((alignment.alignment_score - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_separate_lines() {
        let regions = [
            TextRegion::new(0, 0, 10, 20),
            TextRegion::new(20, 0, 10, 20),
            TextRegion::new(0, 40, 10, 20),
            TextRegion::new(20, 40, 10, 20),
        ];
        let lines = group_lines(&regions, 10.0);
        assert_eq!(lines.len(), 2);
        assert!((text_alignment(&regions).score - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_invalid_config_fails() {
        let analyzer = FontAnalyzer::new(FontConfig {
            min_aspect_ratio: 5.0,
            max_aspect_ratio: 1.0,
            ..Default::default()
        });
        let gray = image::GrayImage::from_pixel(4, 4, image::Luma([0]));
        let raw = RawImage::from_dynamic(&image::DynamicImage::ImageLuma8(gray))
            .expect("valid image");
        assert!(analyzer.analyze(&raw).is_err());
    }
}
