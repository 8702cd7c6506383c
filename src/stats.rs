//! Statistical summaries consumed by the mapped visuals.

use crate::error::{FacetError, Result};

/// Points in a density grid unless the caller asks for another resolution.
pub const DEFAULT_GRID_LEN: usize = 512;

/// Probability mass of the default credible interval.
pub const DEFAULT_PROB: f64 = 0.94;

/// Finite values in ascending order.
fn finite_sorted(values: &[f64]) -> Result<Vec<f64>> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return Err(FacetError::EmptyData);
    }
    sorted.sort_by(f64::total_cmp);
    Ok(sorted)
}

/// Linear-interpolated percentile of already sorted data, `p` in `[0, 1]`.
pub fn percentile(sorted_data: &[f64], p: f64) -> f64 {
    let n = sorted_data.len();
    if n == 0 {
        return 0.0;
    }
    if n == 1 {
        return sorted_data[0];
    }

    let rank = p.clamp(0.0, 1.0) * (n - 1) as f64;
    let lower_idx = rank.floor() as usize;
    let upper_idx = rank.ceil() as usize;

    if lower_idx == upper_idx {
        sorted_data[lower_idx]
    } else {
        let weight = rank - lower_idx as f64;
        sorted_data[lower_idx] * (1.0 - weight) + sorted_data[upper_idx] * weight
    }
}

/// Silverman's rule: h = 0.9 * min(std, IQR/1.34) * n^(-1/5)
fn silverman_bandwidth(sorted: &[f64]) -> f64 {
    let n = sorted.len() as f64;
    if n < 2.0 {
        return 1.0;
    }

    let mean = sorted.iter().sum::<f64>() / n;
    let variance = sorted.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std_dev = variance.sqrt();

    let iqr = percentile(sorted, 0.75) - percentile(sorted, 0.25);
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

/// Gaussian KDE on a [`DEFAULT_GRID_LEN`]-point grid.
pub fn density_estimate(values: &[f64]) -> Result<(Vec<f64>, Vec<f64>)> {
    density_estimate_with(values, DEFAULT_GRID_LEN)
}

/// Gaussian KDE evaluated on `grid_len` evenly spaced points spanning the data
/// extended by three bandwidths on each side.
pub fn density_estimate_with(values: &[f64], grid_len: usize) -> Result<(Vec<f64>, Vec<f64>)> {
    if grid_len < 2 {
        return Err(FacetError::Validation(format!(
            "a density grid needs at least 2 points, got {}",
            grid_len
        )));
    }
    let data = finite_sorted(values)?;
    let bandwidth = silverman_bandwidth(&data);
    let n = data.len() as f64;

    let extend = 3.0 * bandwidth;
    let start = data[0] - extend;
    let end = data[data.len() - 1] + extend;
    let step = (end - start) / (grid_len - 1) as f64;

    let grid: Vec<f64> = (0..grid_len).map(|i| start + i as f64 * step).collect();
    let density = grid
        .iter()
        .map(|&y| {
            let d: f64 = data.iter().map(|&xi| gaussian_kernel((y - xi) / bandwidth)).sum();
            d / (n * bandwidth)
        })
        .collect();
    Ok((grid, density))
}

/// Highest density interval: the narrowest window of sorted samples holding
/// `prob` of the mass.
pub fn interval_estimate(values: &[f64], prob: f64) -> Result<(f64, f64)> {
    check_prob(prob)?;
    let sorted = finite_sorted(values)?;
    let n = sorted.len();
    let inc = (prob * n as f64).floor() as usize;
    if inc >= n {
        return Ok((sorted[0], sorted[n - 1]));
    }
    let best = (0..n - inc)
        .min_by(|&a, &b| {
            let wa = sorted[a + inc] - sorted[a];
            let wb = sorted[b + inc] - sorted[b];
            wa.total_cmp(&wb)
        })
        .unwrap_or(0);
    Ok((sorted[best], sorted[best + inc]))
}

/// Equal-tailed interval holding `prob` of the mass.
pub fn equal_tail_interval(values: &[f64], prob: f64) -> Result<(f64, f64)> {
    check_prob(prob)?;
    let sorted = finite_sorted(values)?;
    let tail = (1.0 - prob) / 2.0;
    Ok((percentile(&sorted, tail), percentile(&sorted, 1.0 - tail)))
}

fn check_prob(prob: f64) -> Result<()> {
    if prob > 0.0 && prob <= 1.0 {
        Ok(())
    } else {
        Err(FacetError::Validation(format!(
            "interval probability must be in (0, 1], got {}",
            prob
        )))
    }
}

/// Mean of the finite values.
pub fn point_estimate(values: &[f64]) -> Result<f64> {
    let data = finite_sorted(values)?;
    Ok(data.iter().sum::<f64>() / data.len() as f64)
}

pub fn median(values: &[f64]) -> Result<f64> {
    Ok(percentile(&finite_sorted(values)?, 0.5))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn test_percentile() {
        let data = [1.0, 2.0, 3.0, 4.0];
        assert_relative_eq!(percentile(&data, 0.5), 2.5);
        assert_relative_eq!(percentile(&data, 0.0), 1.0);
        assert_relative_eq!(percentile(&data, 1.0), 4.0);
        assert_relative_eq!(percentile(&[7.0], 0.3), 7.0);
    }

    #[test]
    fn test_density_integrates_to_one() {
        let values: Vec<f64> = (0..200).map(|i| ((i * 37) % 101) as f64 / 10.0).collect();
        let (grid, density) = density_estimate(&values).unwrap();
        assert_eq!(grid.len(), DEFAULT_GRID_LEN);
        let step = grid[1] - grid[0];
        let area: f64 = density.windows(2).map(|w| (w[0] + w[1]) / 2.0 * step).sum();
        assert_abs_diff_eq!(area, 1.0, epsilon = 1e-2);
        assert!(density.iter().all(|d| *d >= 0.0));
    }

    #[test]
    fn test_density_constant_input() {
        let (grid, density) = density_estimate_with(&[2.0, 2.0, 2.0], 64).unwrap();
        assert_eq!(grid.len(), 64);
        assert_relative_eq!(grid[0], -1.0);
        assert!(density.iter().any(|d| *d > 0.0));
    }

    #[test]
    fn test_empty_data() {
        assert!(matches!(density_estimate(&[]), Err(FacetError::EmptyData)));
        assert!(matches!(point_estimate(&[f64::NAN]), Err(FacetError::EmptyData)));
        assert!(matches!(interval_estimate(&[], 0.9), Err(FacetError::EmptyData)));
    }

    #[test]
    fn test_hdi_prefers_dense_region() {
        let mut values: Vec<f64> = (0..90).map(|i| i as f64 / 90.0).collect();
        values.extend([50.0, 60.0, 70.0, 80.0, 90.0, 100.0, 110.0, 120.0, 130.0, 140.0]);
        let (lo, hi) = interval_estimate(&values, 0.89).unwrap();
        assert_relative_eq!(lo, 0.0);
        assert_relative_eq!(hi, 89.0 / 90.0);
    }

    #[test]
    fn test_hdi_full_mass() {
        assert_eq!(interval_estimate(&[3.0, 1.0, 2.0], 1.0).unwrap(), (1.0, 3.0));
        assert!(matches!(interval_estimate(&[1.0], 0.0), Err(FacetError::Validation(_))));
    }

    #[test]
    fn test_equal_tail_interval() {
        let values: Vec<f64> = (0..=100).map(f64::from).collect();
        let (lo, hi) = equal_tail_interval(&values, 0.9).unwrap();
        assert_relative_eq!(lo, 5.0, epsilon = 1e-9);
        assert_relative_eq!(hi, 95.0, epsilon = 1e-9);
    }

    #[test]
    fn test_point_estimates() {
        assert_relative_eq!(point_estimate(&[1.0, 2.0, 6.0, f64::NAN]).unwrap(), 3.0);
        assert_relative_eq!(median(&[5.0, 1.0, 3.0]).unwrap(), 3.0);
    }
}
