//! Filesystem adapter for loading documents.
//!
//! Each supported image becomes one document. Extraction output, when
//! present, sits next to the image as `<image>.ocr.json`.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use doc_forensics_core::{Document, DocumentSource, OcrResult};
use tracing::{debug, warn};

/// Supported image extensions.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tiff", "tif", "webp", "bmp", "gif"];

/// Suffix appended to an image path to find its extraction output.
pub const OCR_SIDECAR_SUFFIX: &str = ".ocr.json";

/// Filesystem document source adapter.
pub struct FsDocumentSource {
    paths: Vec<PathBuf>,
    recursive: bool,
}

impl FsDocumentSource {
    /// Creates a new filesystem document source.
    ///
    /// # Arguments
    ///
    /// * `paths` - Files or directories to scan
    /// * `recursive` - Whether to recurse into subdirectories
    #[must_use]
    pub const fn new(paths: Vec<PathBuf>, recursive: bool) -> Self {
        Self { paths, recursive }
    }

    /// Collects all image files from the configured paths, sorted.
    fn collect_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();

        for path in &self.paths {
            if path.is_file() {
                if is_supported_image(path) {
                    files.push(path.clone());
                } else {
                    warn!("Unsupported file type: {}", path.display());
                }
            } else if path.is_dir() {
                self.collect_from_dir(path, &mut files);
            } else {
                warn!("Path does not exist: {}", path.display());
            }
        }

        files.sort();
        files
    }

    fn collect_from_dir(&self, dir: &Path, files: &mut Vec<PathBuf>) {
        let entries = match std::fs::read_dir(dir) {
            Ok(e) => e,
            Err(e) => {
                warn!("Failed to read directory {}: {e}", dir.display());
                return;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_file() && is_supported_image(&path) {
                files.push(path);
            } else if path.is_dir() && self.recursive {
                self.collect_from_dir(&path, files);
            }
        }
    }
}

impl DocumentSource for FsDocumentSource {
    fn documents(&self) -> Box<dyn Iterator<Item = Result<Document>> + Send + '_> {
        let files = self.collect_files();
        debug!("Found {} document images", files.len());

        Box::new(files.into_iter().map(|path| load_document(&path)))
    }

    fn count_hint(&self) -> Option<usize> {
        Some(self.collect_files().len())
    }
}

/// Checks if a path has a supported image extension.
fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.as_str()))
}

/// Path of the extraction sidecar for an image.
#[must_use]
pub fn sidecar_path(image: &Path) -> PathBuf {
    let mut name = OsString::from(image.as_os_str());
    name.push(OCR_SIDECAR_SUFFIX);
    PathBuf::from(name)
}

/// Builds a document for an image, attaching its sidecar if one exists.
///
/// The image itself is read later, when the document is analyzed.
fn load_document(path: &Path) -> Result<Document> {
    let document = Document::from_path(path.to_string_lossy(), path);
    let sidecar = sidecar_path(path);
    if !sidecar.is_file() {
        debug!("No extraction output for {}", path.display());
        return Ok(document);
    }

    let text = std::fs::read_to_string(&sidecar)
        .with_context(|| format!("Failed to read {}", sidecar.display()))?;
    let ocr: OcrResult = serde_json::from_str(&text)
        .with_context(|| format!("Invalid extraction output: {}", sidecar.display()))?;
    Ok(document.with_ocr(ocr))
}
