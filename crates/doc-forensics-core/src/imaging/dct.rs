//! 8x8 discrete cosine transform, as used by JPEG.

/// Side length of a JPEG block.
pub const BLOCK: usize = 8;

/// Orthonormal 8x8 DCT-II.
///
/// Coefficients are in the same scale JPEG quantizes, so a coefficient zeroed
/// by quantization stays near zero after decoding.
#[derive(Debug, Clone)]
pub struct Dct8 {
    basis: [[f64; BLOCK]; BLOCK],
}

impl Default for Dct8 {
    fn default() -> Self {
        Self::new()
    }
}

impl Dct8 {
    /// Precomputes the cosine basis.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn new() -> Self {
        let mut basis = [[0.0; BLOCK]; BLOCK];
        for (u, row) in basis.iter_mut().enumerate() {
            let scale = if u == 0 {
                (1.0 / BLOCK as f64).sqrt()
            } else {
                (2.0 / BLOCK as f64).sqrt()
            };
            for (x, value) in row.iter_mut().enumerate() {
                *value = scale
                    * ((2 * x + 1) as f64 * u as f64 * std::f64::consts::PI
                        / (2 * BLOCK) as f64)
                        .cos();
            }
        }
        Self { basis }
    }

    /// Transforms the block at `(x, y)` of a grayscale plane, level-shifted by 128.
    ///
    /// Returns coefficients indexed `[v][u]` (vertical, horizontal frequency).
    #[must_use]
    pub fn forward(
        &self,
        pixels: &[u8],
        width: usize,
        x: usize,
        y: usize,
    ) -> [[f64; BLOCK]; BLOCK] {
        let mut rows = [[0.0; BLOCK]; BLOCK];
        for (j, row) in rows.iter_mut().enumerate() {
            let line = &pixels[(y + j) * width + x..(y + j) * width + x + BLOCK];
            for (u, out) in row.iter_mut().enumerate() {
                *out = line
                    .iter()
                    .zip(&self.basis[u])
                    .map(|(&p, b)| (f64::from(p) - 128.0) * b)
                    .sum();
            }
        }

        let mut coeffs = [[0.0; BLOCK]; BLOCK];
        for (v, out_row) in coeffs.iter_mut().enumerate() {
            for (u, out) in out_row.iter_mut().enumerate() {
                *out = (0..BLOCK).map(|j| rows[j][u] * self.basis[v][j]).sum();
            }
        }
        coeffs
    }
}
