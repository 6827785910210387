// Statistics for panels: correlation, 2D density and 2D binning

use crate::ir::BandCell;

/// Pearson product-moment correlation of paired observations.
///
/// `None` with fewer than two pairs or when either variable is constant.
pub fn pearson(points: &[(f64, f64)]) -> Option<f64> {
    let n = points.len();
    if n < 2 {
        return None;
    }

    let x_mean = points.iter().map(|p| p.0).sum::<f64>() / n as f64;
    let y_mean = points.iter().map(|p| p.1).sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;

    for &(x, y) in points {
        let dx = x - x_mean;
        let dy = y - y_mean;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x <= 0.0 || var_y <= 0.0 {
        return None;
    }
    Some((cov / (var_x * var_y).sqrt()).clamp(-1.0, 1.0))
}

/// Silverman's rule of thumb for bandwidth selection
pub fn silverman_bandwidth(data: &[f64]) -> f64 {
    let n = data.len() as f64;
    if n < 2.0 {
        return 1.0;
    }

    let mean = data.iter().sum::<f64>() / n;
    let variance = data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std_dev = variance.sqrt();

    // IQR-based estimate for robustness
    let mut sorted = data.to_vec();
    sorted.sort_by(f64::total_cmp);
    let q1 = percentile(&sorted, 0.25);
    let q3 = percentile(&sorted, 0.75);
    let iqr = q3 - q1;

    // h = 0.9 * min(std, IQR/1.34) * n^(-1/5)
    let scale = if iqr > 0.0 { std_dev.min(iqr / 1.34) } else { std_dev };
    if scale <= 0.0 {
        return 1.0;
    }
    0.9 * scale * n.powf(-0.2)
}

fn gaussian_kernel(u: f64) -> f64 {
    const SQRT_2PI: f64 = 2.5066282746310002;
    (-0.5 * u * u).exp() / SQRT_2PI
}

fn percentile(sorted_data: &[f64], p: f64) -> f64 {
    let n = sorted_data.len();
    if n == 0 {
        return 0.0;
    }
    if n == 1 {
        return sorted_data[0];
    }

    let rank = p * (n - 1) as f64;
    let lower_idx = rank.floor() as usize;
    let upper_idx = rank.ceil() as usize;

    if lower_idx == upper_idx {
        sorted_data[lower_idx]
    } else {
        let weight = rank - lower_idx as f64;
        sorted_data[lower_idx] * (1.0 - weight) + sorted_data[upper_idx] * weight
    }
}

/// Values on a regular grid of cells, normalized so the largest is 1.0
#[derive(Debug, Clone)]
pub struct Grid2d {
    pub x_edges: Vec<f64>,
    pub y_edges: Vec<f64>,
    /// Row-major: `values[j * nx + i]` is cell (i, j)
    pub values: Vec<f64>,
}

impl Grid2d {
    pub fn nx(&self) -> usize {
        self.x_edges.len() - 1
    }

    pub fn ny(&self) -> usize {
        self.y_edges.len() - 1
    }

    pub fn value(&self, i: usize, j: usize) -> f64 {
        self.values[j * self.nx() + i]
    }

    /// Quantize into `levels` bands. Cells with a zero value are left out.
    pub fn bands(&self, levels: usize) -> Vec<BandCell> {
        let mut cells = Vec::new();
        for j in 0..self.ny() {
            for i in 0..self.nx() {
                let v = self.value(i, j);
                if v <= 0.0 {
                    continue;
                }
                cells.push(BandCell {
                    x0: self.x_edges[i],
                    x1: self.x_edges[i + 1],
                    y0: self.y_edges[j],
                    y1: self.y_edges[j + 1],
                    level: quantize(v, levels),
                });
            }
        }
        cells
    }

    fn normalize(&mut self) {
        let max = self.values.iter().fold(0.0f64, |a, &b| a.max(b));
        if max > 0.0 {
            for v in &mut self.values {
                *v /= max;
            }
        }
    }
}

/// Band index of a normalized value in [0, 1]
pub fn quantize(value: f64, levels: usize) -> usize {
    let levels = levels.max(1);
    ((value * levels as f64).floor().max(0.0) as usize).min(levels - 1)
}

fn edges(start: f64, end: f64, cells: usize) -> Vec<f64> {
    let step = (end - start) / cells as f64;
    (0..=cells).map(|i| start + i as f64 * step).collect()
}

fn extent(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)))
}

/// Gaussian kernel density estimate on a `resolution` x `resolution` grid.
///
/// The grid extends three bandwidths past the data on each side.
pub fn kde2d(points: &[(f64, f64)], resolution: usize) -> Option<Grid2d> {
    if points.is_empty() || resolution == 0 {
        return None;
    }
    let xs: Vec<f64> = points.iter().map(|p| p.0).collect();
    let ys: Vec<f64> = points.iter().map(|p| p.1).collect();
    let hx = silverman_bandwidth(&xs);
    let hy = silverman_bandwidth(&ys);

    let (x_min, x_max) = extent(xs.iter().copied());
    let (y_min, y_max) = extent(ys.iter().copied());
    let x_edges = edges(x_min - 3.0 * hx, x_max + 3.0 * hx, resolution);
    let y_edges = edges(y_min - 3.0 * hy, y_max + 3.0 * hy, resolution);

    let centers = |e: &[f64]| e.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect::<Vec<_>>();
    let xc = centers(&x_edges);
    let yc = centers(&y_edges);

    // Kernel weights per (point, center), computed once per axis
    let kx: Vec<f64> = xs
        .iter()
        .flat_map(|&x| xc.iter().map(move |&c| gaussian_kernel((c - x) / hx)))
        .collect();
    let ky: Vec<f64> = ys
        .iter()
        .flat_map(|&y| yc.iter().map(move |&c| gaussian_kernel((c - y) / hy)))
        .collect();

    let n = points.len();
    let (nx, ny) = (xc.len(), yc.len());
    let mut values = vec![0.0; nx.checked_mul(ny)?];
    for j in 0..ny {
        for i in 0..nx {
            let mut d = 0.0;
            for p in 0..n {
                d += kx[p * nx + i] * ky[p * ny + j];
            }
            values[j * nx + i] = d / (n as f64 * hx * hy);
        }
    }

    let mut grid = Grid2d { x_edges, y_edges, values };
    grid.normalize();
    Some(grid)
}

/// Count points into `bins` x `bins` equal-width cells spanning the data
pub fn bin2d(points: &[(f64, f64)], bins: usize) -> Option<Grid2d> {
    if points.is_empty() || bins == 0 {
        return None;
    }
    let cells = bins.checked_mul(bins)?;
    let span = |(lo, hi): (f64, f64)| if lo == hi { (lo - 0.5, hi + 0.5) } else { (lo, hi) };
    let (x_min, x_max) = span(extent(points.iter().map(|p| p.0)));
    let (y_min, y_max) = span(extent(points.iter().map(|p| p.1)));

    let x_width = (x_max - x_min) / bins as f64;
    let y_width = (y_max - y_min) / bins as f64;
    let index = |v: f64, min: f64, width: f64| (((v - min) / width).floor() as usize).min(bins - 1);

    let mut values = vec![0.0; cells];
    for &(x, y) in points {
        let i = index(x, x_min, x_width);
        let j = index(y, y_min, y_width);
        values[j * bins + i] += 1.0;
    }

    let mut grid = Grid2d {
        x_edges: edges(x_min, x_max, bins),
        y_edges: edges(y_min, y_max, bins),
        values,
    };
    grid.normalize();
    Some(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_pearson_perfect() {
        let pts: Vec<(f64, f64)> = (0..10).map(|i| (i as f64, 2.0 * i as f64 + 1.0)).collect();
        assert_relative_eq!(pearson(&pts).unwrap(), 1.0, epsilon = 1e-12);
        let neg: Vec<(f64, f64)> = pts.iter().map(|&(x, y)| (x, -y)).collect();
        assert_relative_eq!(pearson(&neg).unwrap(), -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_pearson_known_value() {
        let pts = [(1.0, 2.0), (2.0, 4.0), (3.0, 5.0), (4.0, 4.0), (5.0, 5.0)];
        // cov = 6, var_x = 10, var_y = 6
        assert_relative_eq!(pearson(&pts).unwrap(), 6.0 / 60f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_pearson_degenerate() {
        assert_eq!(pearson(&[]), None);
        assert_eq!(pearson(&[(1.0, 1.0)]), None);
        assert_eq!(pearson(&[(1.0, 1.0), (1.0, 2.0), (1.0, 3.0)]), None);
    }

    #[test]
    fn test_silverman_bandwidth() {
        assert_eq!(silverman_bandwidth(&[3.0]), 1.0);
        assert_eq!(silverman_bandwidth(&[2.0, 2.0, 2.0]), 1.0);
        let h = silverman_bandwidth(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert!(h > 0.0 && h < 2.0);
    }

    #[test]
    fn test_percentile() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&sorted, 0.0), 1.0);
        assert_eq!(percentile(&sorted, 1.0), 4.0);
        assert_relative_eq!(percentile(&sorted, 0.5), 2.5);
    }

    #[test]
    fn test_quantize() {
        assert_eq!(quantize(0.0, 8), 0);
        assert_eq!(quantize(0.5, 8), 4);
        assert_eq!(quantize(1.0, 8), 7);
        assert_eq!(quantize(0.99, 1), 0);
    }

    #[test]
    fn test_kde2d_peak_near_data() {
        let pts: Vec<(f64, f64)> = (0..50)
            .map(|i| (10.0 + (i % 5) as f64 * 0.1, 20.0 + (i % 7) as f64 * 0.1))
            .collect();
        let grid = kde2d(&pts, 20).unwrap();
        assert_eq!(grid.nx(), 20);
        assert_eq!(grid.ny(), 20);
        let max = grid.values.iter().fold(0.0f64, |a, &b| a.max(b));
        assert_relative_eq!(max, 1.0);
        // Corners are three bandwidths out and much lower than the peak
        assert!(grid.value(0, 0) < 0.1);
        assert!(grid.x_edges[0] < 10.0 && *grid.x_edges.last().unwrap() > 10.4);
    }

    #[test]
    fn test_kde2d_empty() {
        assert!(kde2d(&[], 20).is_none());
    }

    #[test]
    fn test_bin2d_counts() {
        let pts = [(0.0, 0.0), (0.1, 0.1), (1.0, 1.0)];
        let grid = bin2d(&pts, 2).unwrap();
        assert_eq!(grid.value(0, 0), 1.0);
        assert_eq!(grid.value(1, 1), 0.5);
        assert_eq!(grid.value(1, 0), 0.0);
        // Empty bins produce no cells
        let cells = grid.bands(4);
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].level, 3);
        assert_eq!(cells[1].level, 2);
    }

    #[test]
    fn test_bin2d_single_value() {
        let grid = bin2d(&[(5.0, 5.0), (5.0, 5.0)], 3).unwrap();
        assert_eq!(grid.x_edges[0], 4.5);
        assert_eq!(*grid.x_edges.last().unwrap(), 5.5);
        assert_eq!(grid.bands(5).len(), 1);
    }

    #[test]
    fn test_bin2d_grid_too_large() {
        assert!(bin2d(&[(0.0, 0.0), (1.0, 1.0)], usize::MAX).is_none());
    }
}
