//! Block partitioning and block correlation.

/// A square block of a grayscale plane with its first-order statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Block {
    /// Left edge.
    pub x: usize,
    /// Top edge.
    pub y: usize,
    /// Mean intensity.
    pub mean: f64,
    /// Intensity variance.
    pub variance: f64,
}

impl Block {
    /// Standard deviation of the block intensities.
    #[must_use]
    pub fn std_dev(&self) -> f64 {
        self.variance.sqrt()
    }

    /// Squared distance between the centres of two equally sized blocks.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn center_distance_sq(&self, other: &Self) -> f64 {
        let dx = self.x as f64 - other.x as f64;
        let dy = self.y as f64 - other.y as f64;
        dx * dx + dy * dy
    }
}

/// Top-left offsets of `size`-wide windows at `stride` along one axis.
#[must_use]
pub fn block_offsets(extent: usize, size: usize, stride: usize) -> Vec<usize> {
    if size == 0 || stride == 0 || extent < size {
        return Vec::new();
    }
    (0..=extent - size).step_by(stride).collect()
}

/// Running sums of intensities and squared intensities, one row and column
/// larger than the plane so every window is four lookups.
struct SummedArea {
    stride: usize,
    sums: Vec<u64>,
    squares: Vec<u64>,
}

impl SummedArea {
    fn new(pixels: &[u8], width: usize, height: usize) -> Self {
        let stride = width + 1;
        let mut sums = vec![0u64; stride * (height + 1)];
        let mut squares = vec![0u64; stride * (height + 1)];
        for y in 0..height {
            let (mut row_sum, mut row_sq) = (0u64, 0u64);
            for x in 0..width {
                let v = u64::from(pixels[y * width + x]);
                row_sum += v;
                row_sq += v * v;
                let at = (y + 1) * stride + x + 1;
                sums[at] = sums[at - stride] + row_sum;
                squares[at] = squares[at - stride] + row_sq;
            }
        }
        Self {
            stride,
            sums,
            squares,
        }
    }

    /// Sum and sum of squares over the `size`x`size` window at `(x, y)`.
    fn window(&self, x: usize, y: usize, size: usize) -> (u64, u64) {
        let corners = |table: &[u64]| {
            let (top, bottom) = (y * self.stride, (y + size) * self.stride);
            table[bottom + x + size] + table[top + x] - table[top + x + size] - table[bottom + x]
        };
        (corners(&self.sums), corners(&self.squares))
    }
}

/// Partitions a plane into `size`x`size` blocks at `stride`, computing each
/// block's mean and variance.
///
/// Statistics come from summed-area tables, so a stride of one costs the
/// same per block as a coarse grid.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn partition(
    pixels: &[u8],
    width: usize,
    height: usize,
    size: usize,
    stride: usize,
) -> Vec<Block> {
    let xs = block_offsets(width, size, stride);
    let ys = block_offsets(height, size, stride);
    if xs.is_empty() || ys.is_empty() {
        return Vec::new();
    }
    let table = SummedArea::new(pixels, width, height);
    let n = (size * size) as f64;

    let mut blocks = Vec::with_capacity(xs.len() * ys.len());
    for &y in &ys {
        for &x in &xs {
            let (sum, sum_sq) = table.window(x, y, size);
            let mean = sum as f64 / n;
            let variance = (sum_sq as f64 / n - mean * mean).max(0.0);
            blocks.push(Block {
                x,
                y,
                mean,
                variance,
            });
        }
    }
    blocks
}

/// Normalized cross-correlation between two blocks of the same plane.
///
/// Returns 0.0 when either block is flat.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn normalized_cross_correlation(
    pixels: &[u8],
    width: usize,
    size: usize,
    a: &Block,
    b: &Block,
) -> f64 {
    let denom = (a.variance * b.variance).sqrt();
    if denom <= f64::EPSILON {
        return 0.0;
    }

    let mut covariance = 0.0;
    for row in 0..size {
        let ra = &pixels[(a.y + row) * width + a.x..(a.y + row) * width + a.x + size];
        let rb = &pixels[(b.y + row) * width + b.x..(b.y + row) * width + b.x + size];
        for (&pa, &pb) in ra.iter().zip(rb) {
            covariance += (f64::from(pa) - a.mean) * (f64::from(pb) - b.mean);
        }
    }
    covariance / (size * size) as f64 / denom
}

#[cfg(test)]
#[allow(clippy::cast_possible_truncation)]
mod tests {
    use super::*;

    #[test]
    fn test_block_offsets() {
        assert_eq!(block_offsets(32, 16, 8), vec![0, 8, 16]);
        assert_eq!(block_offsets(20, 8, 8), vec![0, 8]);
        assert!(block_offsets(7, 8, 8).is_empty());
        assert!(block_offsets(32, 0, 8).is_empty());
    }

    #[test]
    fn test_partition_statistics() {
        // 4x4 plane: left half 0, right half 100.
        let pixels: Vec<u8> = (0..16).map(|i| if i % 4 < 2 { 0 } else { 100 }).collect();
        let blocks = partition(&pixels, 4, 4, 2, 2);

        assert_eq!(blocks.len(), 4);
        assert!(blocks[0].mean.abs() < f64::EPSILON);
        assert!((blocks[1].mean - 100.0).abs() < f64::EPSILON);
        assert!(blocks[1].variance.abs() < f64::EPSILON);

        let straddling = partition(&pixels, 4, 4, 2, 1);
        assert_eq!(straddling.len(), 9);
        assert!((straddling[1].mean - 50.0).abs() < f64::EPSILON);
        assert!((straddling[1].variance - 2500.0).abs() < 1e-9);
    }

    #[test]
    fn test_dense_partition_matches_direct_sums() {
        let (w, h) = (7, 5);
        let pixels: Vec<u8> = (0..w * h).map(|i| ((i * 37) % 251) as u8).collect();
        let blocks = partition(&pixels, w, h, 3, 1);
        assert_eq!(blocks.len(), 5 * 3);

        for block in &blocks {
            let values: Vec<f64> = (0..3)
                .flat_map(|row| (0..3).map(move |col| (row, col)))
                .map(|(row, col)| f64::from(pixels[(block.y + row) * w + block.x + col]))
                .collect();
            let mean = values.iter().sum::<f64>() / 9.0;
            let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / 9.0;
            let at = (block.x, block.y);
            assert!((block.mean - mean).abs() < 1e-9, "mean at {at:?}");
            assert!((block.variance - variance).abs() < 1e-6, "variance at {at:?}");
        }
    }

    #[test]
    fn test_partition_smaller_than_block() {
        assert!(partition(&[1, 2, 3, 4], 2, 2, 3, 1).is_empty());
    }

    #[test]
    fn test_ncc_inverted_block() {
        let pixels: Vec<u8> = vec![
            10, 200, 245, 55, //
            90, 40, 165, 215,
        ];
        let blocks = partition(&pixels, 4, 2, 2, 2);
        let ncc = normalized_cross_correlation(&pixels, 4, 2, &blocks[0], &blocks[1]);
        assert!((ncc + 1.0).abs() < 1e-9, "inverted copy should anti-correlate, got {ncc}");
    }

    #[test]
    fn test_ncc_flat_block_is_zero() {
        let pixels = [50u8, 50, 10, 90, 50, 50, 30, 70];
        let blocks = partition(&pixels, 4, 2, 2, 2);
        let ncc = normalized_cross_correlation(&pixels, 4, 2, &blocks[0], &blocks[1]);
        assert!(ncc.abs() < f64::EPSILON);
    }

    #[test]
    fn test_ncc_duplicate_block() {
        // Two copies of the same 2x2 texture side by side.
        let pixels: Vec<u8> = vec![
            10, 200, 10, 200, //
            90, 40, 90, 40,
        ];
        let blocks = partition(&pixels, 4, 2, 2, 2);
        let ncc = normalized_cross_correlation(&pixels, 4, 2, &blocks[0], &blocks[1]);
        assert!((ncc - 1.0).abs() < 1e-9, "duplicate should correlate fully, got {ncc}");
    }

    #[test]
    fn test_center_distance() {
        let a = Block { x: 0, y: 0, mean: 0.0, variance: 0.0 };
        let b = Block { x: 3, y: 4, mean: 0.0, variance: 0.0 };
        assert!((a.center_distance_sq(&b) - 25.0).abs() < f64::EPSILON);
    }
}
