//! Synthetic document and evidence builders for testing.

use std::io::Cursor;

use anyhow::Context;
use doc_forensics_core::domain::{
    ClonedRegions, CompressionAnalysisResult, CompressionInconsistencies, EdgeAnalysisResult,
    EdgeContinuity, FontAnalysisResult, FontCharacteristics, FontInconsistencies,
    ForensicsResult, JpegArtifacts, RecompressionPatterns, TextAlignment,
};
use doc_forensics_core::{Document, OcrResult, RawImage};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GrayImage, ImageFormat, Luma};

/// Builder for creating synthetic document images.
///
/// Every generator is deterministic: the same arguments give the same pixels.
pub struct SyntheticDocumentBuilder;

impl SyntheticDocumentBuilder {
    // === Plain pages ===

    /// Creates an evenly lit blank page.
    #[must_use]
    pub fn blank_page(width: u32, height: u32) -> GrayImage {
        GrayImage::from_pixel(width, height, Luma([245]))
    }

    /// Creates full-range pseudo-random noise.
    #[must_use]
    pub fn noise(width: u32, height: u32, seed: u64) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| Luma([hash_noise(x, y, seed)]))
    }

    // === Tampered content ===

    /// Creates noise with a `size`x`size` patch copied from `from` to `to`.
    #[must_use]
    pub fn cloned_patch(
        width: u32,
        height: u32,
        seed: u64,
        size: u32,
        from: (u32, u32),
        to: (u32, u32),
    ) -> GrayImage {
        let mut img = Self::noise(width, height, seed);
        for dy in 0..size {
            for dx in 0..size {
                let pixel = *img.get_pixel(from.0 + dx, from.1 + dy);
                img.put_pixel(to.0 + dx, to.1 + dy, pixel);
            }
        }
        img
    }

    /// Creates a mid-gray page with short vertical edges every 12px whose
    /// contrast fades out above and below the middle row.
    ///
    /// Each edge ends without closing into a contour, the way strokes do
    /// where a pasted region cuts them.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn faded_edges(width: u32, height: u32) -> GrayImage {
        let centre = height / 2;
        GrayImage::from_fn(width, height, |x, y| {
            let amplitude = (40.0 - 8.0 * f64::from(y.abs_diff(centre))).max(0.0);
            let offset: f64 = (8..width)
                .step_by(12)
                .map(|cx| f64::from(x) - f64::from(cx) + 0.5)
                .filter(|d| d.abs() < 6.0)
                .map(|d| amplitude * (1.0 - d.abs() / 6.0) * d.signum())
                .sum();
            Luma([(128.0 + offset).round() as u8])
        })
    }

    /// Creates noise whose top half went through JPEG at `top_quality` and
    /// bottom half at `bottom_quality`.
    ///
    /// Use a height that is a multiple of 16 so the halves split on block
    /// boundaries.
    ///
    /// # Errors
    ///
    /// Returns an error if JPEG encoding or decoding fails.
    pub fn mixed_quality(
        width: u32,
        height: u32,
        seed: u64,
        top_quality: u8,
        bottom_quality: u8,
    ) -> anyhow::Result<GrayImage> {
        let source = Self::noise(width, height, seed);
        let top = Self::jpeg_roundtrip(&source, top_quality)?;
        let bottom = Self::jpeg_roundtrip(&source, bottom_quality)?;
        let split = height / 2;

        Ok(GrayImage::from_fn(width, height, |x, y| {
            if y < split {
                *top.get_pixel(x, y)
            } else {
                *bottom.get_pixel(x, y)
            }
        }))
    }

    /// Creates noise that went through JPEG once at `quality`.
    ///
    /// # Errors
    ///
    /// Returns an error if JPEG encoding or decoding fails.
    pub fn uniform_quality(
        width: u32,
        height: u32,
        seed: u64,
        quality: u8,
    ) -> anyhow::Result<GrayImage> {
        Self::jpeg_roundtrip(&Self::noise(width, height, seed), quality)
    }

    /// Encodes as JPEG at `quality` and decodes again.
    ///
    /// # Errors
    ///
    /// Returns an error if JPEG encoding or decoding fails.
    pub fn jpeg_roundtrip(img: &GrayImage, quality: u8) -> anyhow::Result<GrayImage> {
        let mut bytes = Vec::new();
        DynamicImage::ImageLuma8(img.clone())
            .write_with_encoder(JpegEncoder::new_with_quality(&mut bytes, quality))
            .context("failed to encode JPEG")?;
        let decoded = image::load_from_memory_with_format(&bytes, ImageFormat::Jpeg)
            .context("failed to decode JPEG")?;
        Ok(decoded.to_luma8())
    }

    // === Text ===

    /// Draws one "H" glyph per stroke width on a shared baseline, 8px apart.
    ///
    /// Glyphs are 18px tall and `3 * stroke + 6` px wide.
    #[must_use]
    pub fn glyph_row(strokes: &[u32]) -> GrayImage {
        const GLYPH_HEIGHT: u32 = 18;
        const GAP: u32 = 8;

        let total: u32 = strokes.iter().map(|s| 3 * s + 6 + GAP).sum();
        let mut img = GrayImage::from_pixel(total + 2 * GAP, GLYPH_HEIGHT + 2 * GAP, Luma([250]));

        let mut left = GAP;
        for &stroke in strokes {
            let glyph_width = 3 * stroke + 6;
            let mid = GLYPH_HEIGHT / 2 - stroke / 2;
            for y in 0..GLYPH_HEIGHT {
                for x in 0..glyph_width {
                    let bar = x < stroke || x >= glyph_width - stroke;
                    let cross = (mid..mid + stroke).contains(&y);
                    if bar || cross {
                        img.put_pixel(left + x, GAP + y, Luma([20]));
                    }
                }
            }
            left += glyph_width + GAP;
        }
        img
    }

    // === Conversions ===

    /// Encodes losslessly as PNG.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn png_bytes(img: &GrayImage) -> anyhow::Result<Vec<u8>> {
        let mut bytes = Vec::new();
        DynamicImage::ImageLuma8(img.clone())
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .context("failed to encode PNG")?;
        Ok(bytes)
    }

    /// Wraps as a decoded image without a source digest.
    ///
    /// # Errors
    ///
    /// Returns an error if the image has a zero dimension.
    pub fn raw(img: &GrayImage) -> anyhow::Result<RawImage> {
        Ok(RawImage::from_dynamic(&DynamicImage::ImageLuma8(img.clone()))?)
    }

    /// Wraps as an in-memory PNG document.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn document(id: &str, img: &GrayImage) -> anyhow::Result<Document> {
        Ok(Document::from_bytes(id, Self::png_bytes(img)?))
    }
}

/// Deterministic per-pixel noise (splitmix-style finalizer).
#[allow(clippy::cast_possible_truncation)]
fn hash_noise(x: u32, y: u32, seed: u64) -> u8 {
    let mut v = u64::from(x).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ u64::from(y).wrapping_mul(0xC2B2_AE3D_27D4_EB4F)
        ^ seed.wrapping_mul(0x1656_67B1_9E37_79F9);
    v ^= v >> 33;
    v = v.wrapping_mul(0xFF51_AFD7_ED55_8CCD);
    v ^= v >> 33;
    (v & 0xFF) as u8
}

/// Builder for extraction output.
#[derive(Debug, Clone, Default)]
pub struct OcrBuilder {
    result: OcrResult,
}

impl OcrBuilder {
    /// Starts from a confident extraction with a signature and no fields.
    #[must_use]
    pub fn new() -> Self {
        Self {
            result: OcrResult {
                extraction_confidence: 0.95,
                signature_detected: true,
                ..OcrResult::default()
            },
        }
    }

    /// A clean check: amount, payee and date all extracted confidently.
    #[must_use]
    pub fn clean_check() -> OcrResult {
        Self::new()
            .field("amount", "$1,250.00", 0.93)
            .field("payee", "ACME Supplies Ltd", 0.9)
            .field("date", "2024-03-18", 0.88)
            .build()
    }

    /// Sets the overall extraction confidence.
    #[must_use]
    pub const fn confidence(mut self, confidence: f64) -> Self {
        self.result.extraction_confidence = confidence;
        self
    }

    /// Sets whether a signature was detected.
    #[must_use]
    pub const fn signature(mut self, detected: bool) -> Self {
        self.result.signature_detected = detected;
        self
    }

    /// Adds a field with its confidence.
    #[must_use]
    pub fn field(mut self, name: &str, text: &str, confidence: f64) -> Self {
        self.result.fields.insert(name.into(), text.into());
        self.result.field_confidences.insert(name.into(), confidence);
        self
    }

    /// Adds a field without a confidence entry.
    #[must_use]
    pub fn field_without_confidence(mut self, name: &str, text: &str) -> Self {
        self.result.fields.insert(name.into(), text.into());
        self
    }

    /// Finishes the builder.
    #[must_use]
    pub fn build(self) -> OcrResult {
        self.result
    }
}

/// Builder for forensic results with chosen scores, for rule engine tests.
#[derive(Debug, Clone, Default)]
pub struct ForensicsResultBuilder {
    edge: f64,
    compression: f64,
    font: f64,
    anomalies: Vec<String>,
}

impl ForensicsResultBuilder {
    /// Starts from an all-clean result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the three analyzer scores.
    #[must_use]
    pub const fn scores(mut self, edge: f64, compression: f64, font: f64) -> Self {
        self.edge = edge;
        self.compression = compression;
        self.font = font;
        self
    }

    /// Adds an anomaly label.
    #[must_use]
    pub fn anomaly(mut self, label: &str) -> Self {
        self.anomalies.push(label.to_string());
        self
    }

    /// Finishes the builder; the overall score is the weighted sum.
    #[must_use]
    pub fn build(self) -> ForensicsResult {
        ForensicsResult {
            edge_score: self.edge,
            compression_score: self.compression,
            font_score: self.font,
            overall_score: ForensicsResult::weighted_score(self.edge, self.compression, self.font),
            detected_anomalies: self.anomalies,
            edge_analysis: EdgeAnalysisResult {
                score: self.edge,
                continuity: EdgeContinuity {
                    score: 1.0,
                    total_regions: 0,
                    broken_edges: 0,
                },
                sharpness: 0.0,
                cloned_regions: ClonedRegions {
                    score: 0.0,
                    high_correlations: 0,
                    total_comparisons: 0,
                },
            },
            compression_analysis: CompressionAnalysisResult {
                score: self.compression,
                jpeg_artifacts: JpegArtifacts {
                    score: 0.0,
                    blocks_analyzed: 0,
                    textured_blocks: 0,
                },
                inconsistencies: CompressionInconsistencies {
                    score: 0.0,
                    flagged_regions: 0,
                    regions_analyzed: 0,
                    heterogeneity: 0.0,
                },
                recompression_patterns: RecompressionPatterns {
                    score: 0.0,
                    dominant_period: None,
                },
            },
            font_analysis: FontAnalysisResult {
                score: self.font,
                text_regions: Vec::new(),
                characteristics: FontCharacteristics {
                    regions: Vec::new(),
                    consistency_score: 1.0,
                },
                inconsistencies: FontInconsistencies::default(),
                alignment: TextAlignment::regular(),
            },
            source_digest: None,
        }
    }
}
