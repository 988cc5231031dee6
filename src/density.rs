//! Density-based asymmetry estimator
//!
//! Fits a bivariate Gaussian kernel density estimate to the lag-1 pairs
//! (x = RRₙ₊₁, y = RRₙ), evaluates it on a fixed `G × G` grid spanning the
//! physiological bounds and scores the surface with
//! [`normalized_asymmetry`](crate::asymmetry::normalized_asymmetry).
//!
//! Bandwidth follows Scott's rule: the kernel covariance is the sample
//! covariance of the pairs scaled by `n^(-1/3)` (factor `n^(-1/6)` squared).
//! The result does not depend on any histogram resolution.

use std::f64::consts::PI;

use log::debug;
use nalgebra::{DMatrix, Matrix2, Vector2};
use rayon::prelude::*;

use crate::asymmetry::normalized_asymmetry;
use crate::descriptors::MIN_POINTS;
use crate::types::Bounds;

/// Default evaluation grid side length
pub const DEFAULT_GRID_SIZE: usize = 1000;

/// Relative determinant below which the kernel covariance counts as singular
const SINGULAR_TOLERANCE: f64 = 1e-10;

/// Bivariate Gaussian KDE with a full kernel covariance
#[derive(Debug, Clone)]
pub struct GaussianKde {
    points: Vec<Vector2<f64>>,
    inv_cov: Matrix2<f64>,
    norm_factor: f64,
}

impl GaussianKde {
    /// Fit to a set of points; `None` when the kernel covariance is singular
    pub fn fit(points: Vec<Vector2<f64>>) -> Option<Self> {
        let n = points.len();
        if n < 2 {
            return None;
        }

        let mean = points.iter().fold(Vector2::zeros(), |acc, p| acc + p) / n as f64;
        let scatter = points.iter().fold(Matrix2::zeros(), |acc, p| {
            let centered = p - mean;
            acc + centered * centered.transpose()
        });
        let covariance = scatter / (n as f64 - 1.0);

        let factor = (n as f64).powf(-1.0 / 6.0);
        let kernel_cov = covariance * factor.powi(2);

        // Collinear pairs leave a rounding-level determinant
        let det = kernel_cov.determinant();
        let scale = kernel_cov[(0, 0)] * kernel_cov[(1, 1)];
        if !det.is_finite() || det <= SINGULAR_TOLERANCE * scale {
            return None;
        }
        let inv_cov = kernel_cov.try_inverse()?;

        Some(Self {
            norm_factor: 1.0 / (n as f64 * 2.0 * PI * det.sqrt()),
            points,
            inv_cov,
        })
    }

    /// Density at `(x, y)`
    pub fn evaluate(&self, x: f64, y: f64) -> f64 {
        let a = self.inv_cov[(0, 0)];
        let b = self.inv_cov[(0, 1)];
        let c = self.inv_cov[(1, 1)];

        let sum: f64 = self
            .points
            .iter()
            .map(|p| {
                let dx = x - p.x;
                let dy = y - p.y;
                (-0.5 * (a * dx * dx + 2.0 * b * dx * dy + c * dy * dy)).exp()
            })
            .sum();
        sum * self.norm_factor
    }
}

/// Evenly spaced values over `[start, end]`, both ends included
fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (count - 1) as f64;
            (0..count).map(|i| start + step * i as f64).collect()
        }
    }
}

/// Evaluate the KDE of the lag pairs on a `grid_size × grid_size` grid.
///
/// Row index follows y (RRₙ), column index follows x (RRₙ₊₁). Returns `None`
/// for fewer than [`MIN_POINTS`] intervals or a singular kernel covariance.
pub fn density_surface(intervals: &[f64], grid_size: usize, bounds: Bounds) -> Option<DMatrix<f64>> {
    if intervals.len() < MIN_POINTS || grid_size == 0 {
        return None;
    }

    let points: Vec<Vector2<f64>> = intervals
        .windows(2)
        .map(|w| Vector2::new(w[1], w[0]))
        .collect();
    let kde = GaussianKde::fit(points)?;

    let axis = linspace(bounds.lower_ms, bounds.upper_ms, grid_size);
    let rows: Vec<Vec<f64>> = axis
        .par_iter()
        .map(|&y| axis.iter().map(|&x| kde.evaluate(x, y)).collect())
        .collect();

    Some(DMatrix::from_row_iterator(
        grid_size,
        grid_size,
        rows.into_iter().flatten(),
    ))
}

/// Density-based AMI for one filtered sequence
pub fn density_ami(intervals: &[f64], grid_size: usize, bounds: Bounds) -> f64 {
    match density_surface(intervals, grid_size, bounds) {
        Some(surface) => normalized_asymmetry(&surface),
        None => {
            debug!(
                "density surface unavailable for {} intervals, using 0",
                intervals.len()
            );
            0.0
        }
    }
}
