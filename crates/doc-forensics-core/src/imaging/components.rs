//! Connected regions, thinning and binary morphology over row-major masks.

/// Offsets of the 8-neighbourhood.
const NEIGHBOURS: [(isize, isize); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// The 8-neighbourhood clockwise from north, the order thinning walks it in.
const RING: [(isize, isize); 8] = [
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];

/// Indices of the in-bounds 8-neighbours of `(x, y)`.
fn neighbours(x: usize, y: usize, width: usize, height: usize) -> impl Iterator<Item = usize> {
    NEIGHBOURS.iter().filter_map(move |&(dx, dy)| {
        let nx = x.checked_add_signed(dx)?;
        let ny = y.checked_add_signed(dy)?;
        (nx < width && ny < height).then_some(ny * width + nx)
    })
}

/// Number of set 8-neighbours of a pixel.
#[must_use]
pub fn neighbour_count(mask: &[bool], index: usize, width: usize, height: usize) -> usize {
    neighbours(index % width, index / width, width, height)
        .filter(|&n| mask[n])
        .count()
}

/// Labels 8-connected regions of set pixels.
///
/// Each region is returned as its pixel indices; regions appear in the
/// row-major order of their first pixel.
#[must_use]
pub fn connected_regions(mask: &[bool], width: usize, height: usize) -> Vec<Vec<usize>> {
    let mut visited = vec![false; mask.len()];
    let mut regions = Vec::new();
    let mut stack = Vec::new();

    for start in 0..mask.len() {
        if !mask[start] || visited[start] {
            continue;
        }
        visited[start] = true;
        stack.push(start);
        let mut region = Vec::new();

        while let Some(index) = stack.pop() {
            region.push(index);
            for n in neighbours(index % width, index / width, width, height) {
                if mask[n] && !visited[n] {
                    visited[n] = true;
                    stack.push(n);
                }
            }
        }
        regions.push(region);
    }
    regions
}

/// Thins a mask to one-pixel-wide lines (Zhang-Suen).
///
/// Connectivity and holes survive: a closed band becomes a closed loop and an
/// open band becomes a line with two endpoints.
#[must_use]
pub fn thin(mask: &[bool], width: usize, height: usize) -> Vec<bool> {
    let mut out = mask.to_vec();
    let mut live: Vec<usize> = (0..mask.len()).filter(|&i| mask[i]).collect();

    loop {
        let mut changed = false;
        for pass in [Pass::First, Pass::Second] {
            let removable: Vec<usize> = live
                .iter()
                .copied()
                .filter(|&i| out[i] && thinning_removes(&out, i, width, height, pass))
                .collect();
            for &i in &removable {
                out[i] = false;
            }
            changed |= !removable.is_empty();
        }
        if !changed {
            break;
        }
        live.retain(|&i| out[i]);
    }
    out
}

#[derive(Clone, Copy)]
enum Pass {
    First,
    Second,
}

/// Whether a set pixel is a deletable boundary pixel in the given sub-pass.
fn thinning_removes(mask: &[bool], index: usize, width: usize, height: usize, pass: Pass) -> bool {
    let (x, y) = (index % width, index / width);
    let ring = RING.map(|(dx, dy)| {
        match (x.checked_add_signed(dx), y.checked_add_signed(dy)) {
            (Some(nx), Some(ny)) if nx < width && ny < height => mask[ny * width + nx],
            _ => false,
        }
    });

    let set = ring.iter().filter(|&&on| on).count();
    let transitions = (0..8).filter(|&k| !ring[k] && ring[(k + 1) % 8]).count();
    if !(2..=6).contains(&set) || transitions != 1 {
        return false;
    }

    let [north, _, east, _, south, _, west, _] = ring;
    match pass {
        Pass::First => !(north && east && south) && !(east && south && west),
        Pass::Second => !(north && east && west) && !(north && south && west),
    }
}

/// Dilation with a 3x3 square structuring element.
#[must_use]
pub fn dilate(mask: &[bool], width: usize, height: usize) -> Vec<bool> {
    let mut out = mask.to_vec();
    for (index, _) in mask.iter().enumerate().filter(|(_, &set)| set) {
        for n in neighbours(index % width, index / width, width, height) {
            out[n] = true;
        }
    }
    out
}

/// Bounding box `(min_x, min_y, max_x, max_y)` of a region, inclusive.
#[must_use]
pub fn bounding_box(region: &[usize], width: usize) -> Option<(usize, usize, usize, usize)> {
    region.iter().fold(None, |acc, &index| {
        let (x, y) = (index % width, index / width);
        Some(match acc {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        })
    })
}
