//! Core domain types for document forensics.

mod analyzer;
mod document;
mod forensics;
mod ocr;
mod raw_image;
mod record;
mod risk;

pub use analyzer::ForensicAnalyzer;
pub use document::{Document, DocumentImage};
#[cfg(test)]
pub(crate) use forensics::fixtures;
pub use forensics::{
    anomaly, ClonedRegions, CompressionAnalysisResult, CompressionInconsistencies,
    EdgeAnalysisResult, EdgeContinuity, FontAnalysisResult, FontCharacteristics,
    FontInconsistencies, ForensicsResult, JpegArtifacts, RecompressionPatterns,
    RegionCharacteristics, TextAlignment, TextRegion, COMPRESSION_WEIGHT, EDGE_WEIGHT,
    FONT_WEIGHT,
};
pub use ocr::{parse_amount, OcrResult};
pub use raw_image::{ImageInput, RawImage};
pub use record::AssessmentRecord;
pub use risk::{ConfidenceFactor, FactorStatus, RiskAssessment, Subsystem, Violation};
