//! Gradient magnitude.

/// Largest possible Sobel magnitude for 8-bit input (`4 * 255 * sqrt(2)`).
pub const SOBEL_MAX: f64 = 1442.497_833_620_557_7;

/// Sobel gradient magnitude of a grayscale plane.
///
/// The one-pixel border has no full neighbourhood and is reported as zero.
#[must_use]
pub fn sobel_magnitude(pixels: &[u8], width: usize, height: usize) -> Vec<f64> {
    let mut out = vec![0.0; width * height];
    if width < 3 || height < 3 {
        return out;
    }

    let at = |x: usize, y: usize| f64::from(pixels[y * width + x]);
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let gx = (at(x + 1, y - 1) + 2.0 * at(x + 1, y) + at(x + 1, y + 1))
                - (at(x - 1, y - 1) + 2.0 * at(x - 1, y) + at(x - 1, y + 1));
            let gy = (at(x - 1, y + 1) + 2.0 * at(x, y + 1) + at(x + 1, y + 1))
                - (at(x - 1, y - 1) + 2.0 * at(x, y - 1) + at(x + 1, y - 1));
            out[y * width + x] = gx.hypot(gy);
        }
    }
    out
}
