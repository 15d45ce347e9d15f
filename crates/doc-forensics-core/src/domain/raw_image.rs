//! Decoded document image.

use std::path::Path;

use image::{DynamicImage, GenericImageView, GrayImage, RgbImage};

use crate::error::{ForensicsError, Result};

/// A decoded, validated document image.
///
/// Holds the RGB pixels and the derived grayscale plane every analyzer works
/// on. The buffers are never mutated after construction, so a single
/// `RawImage` can be shared by concurrent analyzers.
#[derive(Debug, Clone)]
pub struct RawImage {
    width: u32,
    height: u32,
    rgb: RgbImage,
    gray: GrayImage,
    digest: Option<String>,
}

impl RawImage {
    /// Builds a raw image from a decoded image.
    ///
    /// # Errors
    ///
    /// Returns [`ForensicsError::ImageFormat`] if either dimension is zero.
    pub fn from_dynamic(image: &DynamicImage) -> Result<Self> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(ForensicsError::ImageFormat(format!(
                "image has invalid dimensions {width}x{height}"
            )));
        }

        Ok(Self {
            width,
            height,
            rgb: image.to_rgb8(),
            gray: image.to_luma8(),
            digest: None,
        })
    }

    /// Attaches the hex SHA-256 digest of the source bytes.
    #[must_use]
    pub fn with_digest(mut self, digest: String) -> Self {
        self.digest = Some(digest);
        self
    }

    /// Image width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// RGB pixel buffer.
    #[must_use]
    pub const fn rgb(&self) -> &RgbImage {
        &self.rgb
    }

    /// Grayscale pixel buffer.
    #[must_use]
    pub const fn gray(&self) -> &GrayImage {
        &self.gray
    }

    /// Grayscale samples in row-major order, `width * height` long.
    #[must_use]
    pub fn gray_pixels(&self) -> &[u8] {
        self.gray.as_raw()
    }

    /// Width and height as `usize`, for indexing the pixel planes.
    #[must_use]
    pub const fn shape(&self) -> (usize, usize) {
        (self.width as usize, self.height as usize)
    }

    /// Hex SHA-256 of the bytes this image was decoded from, if known.
    #[must_use]
    pub fn digest(&self) -> Option<&str> {
        self.digest.as_deref()
    }
}

/// Where an image to analyze comes from.
#[derive(Debug, Clone, Copy)]
pub enum ImageInput<'a> {
    /// A file on disk.
    Path(&'a Path),
    /// Encoded image bytes already in memory.
    Bytes(&'a [u8]),
}

impl<'a> From<&'a Path> for ImageInput<'a> {
    fn from(path: &'a Path) -> Self {
        Self::Path(path)
    }
}

impl<'a> From<&'a [u8]> for ImageInput<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Self::Bytes(bytes)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_dynamic_derives_gray() {
        let img = RgbImage::from_fn(4, 3, |_, _| image::Rgb([255, 255, 255]));
        let raw = RawImage::from_dynamic(&DynamicImage::ImageRgb8(img)).expect("valid image");

        assert_eq!(raw.width(), 4);
        assert_eq!(raw.height(), 3);
        assert_eq!(raw.shape(), (4, 3));
        assert_eq!(raw.gray_pixels().len(), 12);
        assert!(raw.gray_pixels().iter().all(|&p| p == 255));
        assert!(raw.digest().is_none());
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        let img = DynamicImage::new_luma8(0, 10);
        let err = RawImage::from_dynamic(&img).expect_err("zero width must fail");
        assert!(matches!(err, ForensicsError::ImageFormat(_)));
    }
}
