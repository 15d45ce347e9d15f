//! Stroke width and ink density of binarized text.

use super::stats;

/// Inclusive pixel rectangle `(min_x, min_y, max_x, max_y)`.
pub type Rect = (usize, usize, usize, usize);

/// Estimates stroke width inside `rect` of an ink mask.
///
/// Every ink pixel is assigned the shorter of the horizontal and vertical
/// ink runs passing through it; the estimate is the median over all ink
/// pixels, so crossings and corners do not inflate it. Returns 0.0 when the
/// rectangle holds no ink.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn stroke_width(ink: &[bool], width: usize, rect: Rect) -> f64 {
    let (x0, y0, x1, y1) = rect;
    let (w, h) = (x1 - x0 + 1, y1 - y0 + 1);
    let at = |x: usize, y: usize| ink[(y0 + y) * width + x0 + x];

    let mut horizontal = vec![0usize; w * h];
    for y in 0..h {
        let mut x = 0;
        while x < w {
            if !at(x, y) {
                x += 1;
                continue;
            }
            let start = x;
            while x < w && at(x, y) {
                x += 1;
            }
            horizontal[y * w + start..y * w + x].fill(x - start);
        }
    }

    let mut vertical = vec![0usize; w * h];
    for x in 0..w {
        let mut y = 0;
        while y < h {
            if !at(x, y) {
                y += 1;
                continue;
            }
            let start = y;
            while y < h && at(x, y) {
                y += 1;
            }
            for yy in start..y {
                vertical[yy * w + x] = y - start;
            }
        }
    }

    let widths: Vec<f64> = horizontal
        .iter()
        .zip(&vertical)
        .filter(|(&hr, _)| hr > 0)
        .map(|(&hr, &vr)| hr.min(vr) as f64)
        .collect();
    stats::median(&widths)
}

/// Fraction of ink pixels inside `rect`.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn ink_density(ink: &[bool], width: usize, rect: Rect) -> f64 {
    let (x0, y0, x1, y1) = rect;
    let area = (x1 - x0 + 1) * (y1 - y0 + 1);
    let count = (y0..=y1)
        .map(|y| ink[y * width + x0..=y * width + x1].iter().filter(|&&i| i).count())
        .sum::<usize>();
    count as f64 / area as f64
}
