//! Decoding raw bytes into validated pixel buffers.

use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::domain::{ImageInput, RawImage};
use crate::error::{ForensicsError, Result};

/// Decodes document images into [`RawImage`]s.
///
/// Only decodability and dimensions are checked here; content-type policy
/// belongs to the upload layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Preprocessor;

impl Preprocessor {
    /// Creates a preprocessor.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Reads and decodes an image from either source.
    ///
    /// # Errors
    ///
    /// See [`Preprocessor::load`] and [`Preprocessor::decode`].
    pub fn prepare(&self, input: ImageInput<'_>) -> Result<RawImage> {
        match input {
            ImageInput::Path(path) => self.load(path),
            ImageInput::Bytes(bytes) => self.decode(bytes),
        }
    }

    /// Reads and decodes an image file.
    ///
    /// # Errors
    ///
    /// Returns [`ForensicsError::ImageNotFound`] if the file cannot be read and
    /// [`ForensicsError::ImageFormat`] if its contents are not a valid image.
    pub fn load(&self, path: &Path) -> Result<RawImage> {
        let bytes = std::fs::read(path).map_err(|source| ForensicsError::ImageNotFound {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Read {} bytes from {}", bytes.len(), path.display());
        self.decode(&bytes)
    }

    /// Decodes encoded image bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ForensicsError::ImageFormat`] if the bytes do not decode into a
    /// raster image or the image has a zero dimension.
    pub fn decode(&self, bytes: &[u8]) -> Result<RawImage> {
        if bytes.is_empty() {
            return Err(ForensicsError::ImageFormat("empty input".into()));
        }
        let image = image::load_from_memory(bytes)
            .map_err(|e| ForensicsError::ImageFormat(e.to_string()))?;
        let raw = RawImage::from_dynamic(&image)?;
        debug!("Decoded {}x{} image", raw.width(), raw.height());

        Ok(raw.with_digest(hex_digest(bytes)))
    }
}

/// Lowercase hex SHA-256 of `bytes`.
fn hex_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::cast_possible_truncation)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::GrayImage::from_fn(width, height, |x, _| image::Luma([(x * 10) as u8]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageLuma8(img)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .expect("encode png");
        bytes
    }

    #[test]
    fn test_decode_png() {
        let raw = Preprocessor::new()
            .decode(&png_bytes(12, 7))
            .expect("valid png");
        assert_eq!((raw.width(), raw.height()), (12, 7));
        assert_eq!(raw.digest().map(str::len), Some(64));
    }

    #[test]
    fn test_digest_is_stable() {
        let bytes = png_bytes(4, 4);
        let a = Preprocessor::new().decode(&bytes).expect("decode");
        let b = Preprocessor::new().decode(&bytes).expect("decode");
        assert_eq!(a.digest(), b.digest());
    }

    #[test]
    fn test_non_image_bytes() {
        let err = Preprocessor::new()
            .decode(b"%PDF-1.4 definitely not a raster")
            .expect_err("text is not an image");
        assert!(matches!(err, ForensicsError::ImageFormat(_)));
    }

    #[test]
    fn test_empty_bytes() {
        let err = Preprocessor::new().decode(&[]).expect_err("empty input");
        assert!(matches!(err, ForensicsError::ImageFormat(_)));
    }

    #[test]
    fn test_truncated_png() {
        let bytes = png_bytes(16, 16);
        let err = Preprocessor::new()
            .decode(&bytes[..bytes.len() / 2])
            .expect_err("truncated png");
        assert!(matches!(err, ForensicsError::ImageFormat(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = Preprocessor::new()
            .load(Path::new("/nonexistent/check-front.png"))
            .expect_err("missing file");
        assert!(matches!(err, ForensicsError::ImageNotFound { .. }));
    }
}
