//! Asymmetry reduction and histogram estimator
//!
//! Both AMI estimators reduce a square surface over the Poincaré plane (histogram
//! counts or an evaluated density) to one score: the Frobenius norm of its
//! max-normalized antisymmetric part, divided by the norm of the maximally
//! asymmetric reference pattern of the same size.

use nalgebra::DMatrix;

use crate::types::Bounds;

/// Score a square surface against the maximally asymmetric pattern.
///
/// Returns a value in `[0, 1]`; `0.0` when the surface is symmetric, not square,
/// or smaller than 2×2.
pub fn normalized_asymmetry(surface: &DMatrix<f64>) -> f64 {
    let n = surface.nrows();
    if n < 2 || !surface.is_square() {
        return 0.0;
    }

    let diff = surface - surface.transpose();
    let max_abs = diff.amax();
    if max_abs == 0.0 || !max_abs.is_finite() {
        return 0.0;
    }

    let scaled = diff / max_abs;
    scaled.norm() / reference_norm(n)
}

/// `+1` strictly above the diagonal, `-1` strictly below, `0` on it
pub fn reference_pattern(n: usize) -> DMatrix<f64> {
    DMatrix::from_fn(n, n, |i, j| match j.cmp(&i) {
        std::cmp::Ordering::Greater => 1.0,
        std::cmp::Ordering::Less => -1.0,
        std::cmp::Ordering::Equal => 0.0,
    })
}

/// Frobenius norm of the max-normalized reference pattern: √(n(n−1))
fn reference_norm(n: usize) -> f64 {
    ((n * (n - 1)) as f64).sqrt()
}

/// Joint histogram of (RRₙ, RRₙ₊₁) over `bins × bins` equal-width cells spanning `bounds`.
///
/// Rows index RRₙ, columns RRₙ₊₁. The upper edge belongs to the last cell;
/// pairs with either value outside `bounds` are not counted.
pub fn lag_histogram(intervals: &[f64], bins: usize, bounds: Bounds) -> DMatrix<f64> {
    let mut counts = DMatrix::zeros(bins, bins);
    if bins == 0 || !bounds.is_valid() {
        return counts;
    }

    let width = bounds.span() / bins as f64;
    let bin_of = |value: f64| -> Option<usize> {
        if !bounds.contains(value) {
            return None;
        }
        let idx = ((value - bounds.lower_ms) / width).floor() as usize;
        Some(idx.min(bins - 1))
    };

    for w in intervals.windows(2) {
        if let (Some(row), Some(col)) = (bin_of(w[0]), bin_of(w[1])) {
            counts[(row, col)] += 1.0;
        }
    }
    counts
}

/// Histogram-based AMI for one filtered sequence at a given bin resolution
pub fn histogram_ami(intervals: &[f64], bins: usize, bounds: Bounds) -> f64 {
    if intervals.len() < 2 {
        return 0.0;
    }
    normalized_asymmetry(&lag_histogram(intervals, bins, bounds))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symmetric_surface_scores_zero() {
        let symmetric = DMatrix::from_row_slice(3, 3, &[1.0, 2.0, 3.0, 2.0, 5.0, 4.0, 3.0, 4.0, 0.0]);
        assert_eq!(normalized_asymmetry(&symmetric), 0.0);
        assert_eq!(normalized_asymmetry(&DMatrix::zeros(4, 4)), 0.0);
    }

    #[test]
    fn test_reference_pattern_scores_one() {
        for n in [2, 5, 25] {
            let score = normalized_asymmetry(&reference_pattern(n));
            assert!((score - 1.0).abs() < 1e-12, "n={n}: {score}");
        }
    }

    #[test]
    fn test_reference_norm_matches_pattern() {
        let pattern = reference_pattern(7);
        assert!((pattern.norm() - reference_norm(7)).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_shapes() {
        assert_eq!(normalized_asymmetry(&DMatrix::from_element(1, 1, 3.0)), 0.0);
        assert_eq!(normalized_asymmetry(&DMatrix::zeros(2, 3)), 0.0);
    }

    #[test]
    fn test_single_off_diagonal_cell() {
        // D has one +1 and one -1 entry -> sqrt(2) / sqrt(n(n-1))
        let mut surface = DMatrix::zeros(4, 4);
        surface[(0, 3)] = 7.0;
        let expected = 2f64.sqrt() / 12f64.sqrt();
        assert!((normalized_asymmetry(&surface) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_lag_histogram_binning() {
        let bounds = Bounds::new(0.0, 100.0);
        let counts = lag_histogram(&[5.0, 55.0, 100.0, 5.0], 2, bounds);
        assert_eq!(counts[(0, 1)], 1.0); // 5 -> 55
        assert_eq!(counts[(1, 1)], 1.0); // 55 -> 100 (upper edge in last bin)
        assert_eq!(counts[(1, 0)], 1.0); // 100 -> 5
        assert_eq!(counts.sum(), 3.0);
    }

    #[test]
    fn test_histogram_ami_range() {
        let rr = [800.0, 820.0, 840.0, 860.0, 880.0, 700.0, 720.0, 740.0, 900.0, 650.0];
        for bins in [25, 50, 100] {
            let score = histogram_ami(&rr, bins, Bounds::default());
            assert!((0.0..=1.0).contains(&score));
            assert!(score > 0.0);
        }
    }

    #[test]
    fn test_histogram_ami_constant_series() {
        assert_eq!(histogram_ami(&[800.0; 20], 50, Bounds::default()), 0.0);
    }
}
