//! Luminance histogram and threshold selection.

/// 256-bin histogram of luminance values.
#[derive(Debug, Clone)]
pub struct Histogram {
    bins: [u64; 256],
    total: u64,
}

impl Histogram {
    /// Compute histogram from grayscale samples.
    #[must_use]
    pub fn from_pixels(pixels: &[u8]) -> Self {
        let mut bins = [0u64; 256];
        for &p in pixels {
            bins[usize::from(p)] += 1;
        }
        let total = bins.iter().sum();
        Self { bins, total }
    }

    /// Returns the total pixel count.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }

    /// Calculate percentile value (0.0-1.0 → luminance 0-255).
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    #[must_use]
    pub fn percentile(&self, p: f64) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let target = (self.total as f64 * p).round() as u64;
        let mut cumulative = 0u64;
        for (i, &count) in self.bins.iter().enumerate() {
            cumulative += count;
            if cumulative >= target {
                return i as u8;
            }
        }
        255
    }

    /// Calculate mean luminance.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn mean(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let sum: u64 = self
            .bins
            .iter()
            .enumerate()
            .map(|(i, &count)| (i as u64) * count)
            .sum();
        sum as f64 / self.total as f64
    }

    /// Otsu threshold: the level maximizing between-class variance, where the
    /// dark class is `0..=threshold`.
    ///
    /// Returns `None` for an empty histogram or a single-valued image.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    #[must_use]
    pub fn otsu_threshold(&self) -> Option<u8> {
        if self.total == 0 {
            return None;
        }
        let total = self.total as f64;
        let sum_all: f64 = self
            .bins
            .iter()
            .enumerate()
            .map(|(i, &c)| i as f64 * c as f64)
            .sum();

        let mut best: Option<(u8, f64)> = None;
        let mut weight_dark = 0.0;
        let mut sum_dark = 0.0;
        for (level, &count) in self.bins.iter().enumerate().take(255) {
            weight_dark += count as f64;
            sum_dark += level as f64 * count as f64;
            let weight_light = total - weight_dark;
            if weight_dark == 0.0 || weight_light == 0.0 {
                continue;
            }
            let mean_dark = sum_dark / weight_dark;
            let mean_light = (sum_all - sum_dark) / weight_light;
            let between = weight_dark * weight_light * (mean_dark - mean_light).powi(2);
            if best.map_or(true, |(_, b)| between > b) {
                best = Some((level as u8, between));
            }
        }
        best.map(|(level, _)| level)
    }
}

#[cfg(test)]
#[allow(clippy::cast_possible_truncation)]
mod tests {
    use super::*;

    #[test]
    fn test_histogram_percentiles() {
        let pixels: Vec<u8> = (0..100).flat_map(|_| 0..=255u8).collect();
        let hist = Histogram::from_pixels(&pixels);

        assert_eq!(hist.total(), 25_600);
        let p50 = hist.percentile(0.5);
        assert!(p50 > 120 && p50 < 136, "p50 should be ~128, got {p50}");
        assert_eq!(hist.percentile(0.0), 0);
        assert_eq!(hist.percentile(1.0), 255);
    }

    #[test]
    fn test_empty_histogram() {
        let hist = Histogram::from_pixels(&[]);
        assert_eq!(hist.percentile(0.5), 0);
        assert!(hist.mean().abs() < f64::EPSILON);
        assert_eq!(hist.otsu_threshold(), None);
    }

    #[test]
    fn test_mean_uniform() {
        let hist = Histogram::from_pixels(&[128; 400]);
        assert!((hist.mean() - 128.0).abs() < 1e-9);
    }

    #[test]
    fn test_otsu_two_levels() {
        let mut pixels = vec![230u8; 300];
        pixels.extend(std::iter::repeat(20u8).take(100));
        let hist = Histogram::from_pixels(&pixels);

        let t = hist.otsu_threshold().expect("bimodal image has a threshold");
        assert!((20..230).contains(&t), "threshold {t} should split the modes");
    }

    #[test]
    fn test_otsu_black_and_white() {
        let pixels = [0u8, 255, 255, 0, 255];
        let t = Histogram::from_pixels(&pixels)
            .otsu_threshold()
            .expect("threshold");
        assert_eq!(t, 0);
    }

    #[test]
    fn test_otsu_single_value() {
        assert_eq!(Histogram::from_pixels(&[90; 64]).otsu_threshold(), None);
    }
}
