//! A document submitted for assessment.

use std::path::PathBuf;

use super::{ImageInput, OcrResult};

/// Where a document's image lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentImage {
    /// A file on disk, read when the document is analyzed.
    Path(PathBuf),
    /// Encoded bytes already in memory.
    Bytes(Vec<u8>),
}

/// A document image plus whatever field extraction produced for it.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Caller-supplied identifier carried into the stored record.
    pub id: String,
    /// The scanned image.
    pub image: DocumentImage,
    /// Extraction output, if extraction ran.
    pub ocr: Option<OcrResult>,
}

impl Document {
    /// Creates a document backed by a file.
    #[must_use]
    pub fn from_path(id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            image: DocumentImage::Path(path.into()),
            ocr: None,
        }
    }

    /// Creates a document backed by in-memory bytes.
    #[must_use]
    pub fn from_bytes(id: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            image: DocumentImage::Bytes(bytes),
            ocr: None,
        }
    }

    /// Attaches extraction output.
    #[must_use]
    pub fn with_ocr(mut self, ocr: OcrResult) -> Self {
        self.ocr = Some(ocr);
        self
    }

    /// Borrows the image as analyzer input.
    #[must_use]
    pub fn image_input(&self) -> ImageInput<'_> {
        match &self.image {
            DocumentImage::Path(path) => ImageInput::Path(path),
            DocumentImage::Bytes(bytes) => ImageInput::Bytes(bytes),
        }
    }
}
