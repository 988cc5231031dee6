//! Descriptor library
//!
//! Poincaré plot spread measures (SD1, SD2) and heart rate asymmetry indices
//! computed from a filtered RR sequence or its lag-1 pairing.
//!
//! Every descriptor returns a finite value. Sequences with fewer than
//! [`MIN_POINTS`] intervals, and any zero defining denominator, yield `0.0`.
//!
//! # Example
//! ```rust
//! use hra_flux::descriptors::{sd1, sd2, porta_index, LagPairs};
//!
//! let rr = [800.0, 810.0, 818.0, 830.0, 842.0];
//! let pairs = LagPairs::from_intervals(&rr);
//! assert!(sd1(&rr) < sd2(&rr));
//! assert!(porta_index(&pairs) >= 0.0);
//! ```

use std::f64::consts::{FRAC_PI_4, SQRT_2};

use crate::asymmetry::histogram_ami;
use crate::types::{Bounds, DescriptorRow};

/// Minimum number of filtered intervals for a non-zero descriptor
pub const MIN_POINTS: usize = 3;

/// One point of the Poincaré plot: (RRₙ, RRₙ₊₁)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LagPair {
    pub current: f64,
    pub next: f64,
}

impl LagPair {
    /// Strictly above the identity line (RRₙ₊₁ > RRₙ)
    pub fn is_above(&self) -> bool {
        self.next > self.current
    }

    pub fn is_below(&self) -> bool {
        self.next < self.current
    }

    pub fn is_tied(&self) -> bool {
        self.next == self.current
    }

    /// Distance from the identity line
    pub fn perpendicular_distance(&self) -> f64 {
        (self.current - self.next).abs() / SQRT_2
    }

    /// Angular deviation of the point's polar angle from the identity line
    pub fn angle_from_identity(&self) -> f64 {
        (self.next.atan2(self.current) - FRAC_PI_4).abs()
    }

    pub fn radius(&self) -> f64 {
        self.current.hypot(self.next)
    }

    pub fn arc_length(&self) -> f64 {
        self.angle_from_identity() * self.radius()
    }

    pub fn sector_area(&self) -> f64 {
        0.5 * self.radius().powi(2) * self.angle_from_identity()
    }
}

/// Lag-1 pairing of a filtered RR sequence
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LagPairs {
    pairs: Vec<LagPair>,
}

impl LagPairs {
    pub fn from_intervals(intervals: &[f64]) -> Self {
        let pairs = intervals
            .windows(2)
            .map(|w| LagPair {
                current: w[0],
                next: w[1],
            })
            .collect();
        Self { pairs }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LagPair> + '_ {
        self.pairs.iter()
    }

    /// Fewer pairs than a `MIN_POINTS` sequence produces
    fn is_degenerate(&self) -> bool {
        self.pairs.len() < MIN_POINTS - 1
    }
}

/// Sample variance (ddof = 1); `None` with fewer than two values
fn sample_variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    Some(ss / (n - 1.0))
}

fn successive_differences(intervals: &[f64]) -> Vec<f64> {
    intervals.windows(2).map(|w| w[1] - w[0]).collect()
}

/// `2 * |part / total - 0.5|`, or 0 when `total` is zero
fn doubled_asymmetry(part: f64, total: f64) -> f64 {
    if total == 0.0 || !total.is_finite() {
        return 0.0;
    }
    2.0 * (part / total - 0.5).abs()
}

/// Short-term variability: SD of successive differences over √2
pub fn sd1(intervals: &[f64]) -> f64 {
    if intervals.len() < MIN_POINTS {
        return 0.0;
    }
    sample_variance(&successive_differences(intervals))
        .map(|var| var.sqrt() / SQRT_2)
        .unwrap_or(0.0)
}

/// Long-term variability: √(2·SDRR² − 0.5·SDSD²)
pub fn sd2(intervals: &[f64]) -> f64 {
    if intervals.len() < MIN_POINTS {
        return 0.0;
    }
    match (
        sample_variance(intervals),
        sample_variance(&successive_differences(intervals)),
    ) {
        (Some(var_rr), Some(var_diff)) => {
            let radicand = 2.0 * var_rr - 0.5 * var_diff;
            if radicand > 0.0 {
                radicand.sqrt()
            } else {
                0.0
            }
        }
        _ => 0.0,
    }
}

/// Porta's index: share of points above the identity line among non-tied points
pub fn porta_index(pairs: &LagPairs) -> f64 {
    if pairs.is_degenerate() {
        return 0.0;
    }
    let above = pairs.iter().filter(|p| p.is_above()).count();
    let below = pairs.iter().filter(|p| p.is_below()).count();
    doubled_asymmetry(above as f64, (above + below) as f64)
}

/// Guzik's index: Porta's ratio weighted by squared distance to the identity line
pub fn guzik_index(pairs: &LagPairs) -> f64 {
    if pairs.is_degenerate() {
        return 0.0;
    }
    let (above, below) = pairs.iter().fold((0.0, 0.0), |(above, below), p| {
        let weight = p.perpendicular_distance().powi(2);
        if p.is_above() {
            (above + weight, below)
        } else if p.is_below() {
            (above, below + weight)
        } else {
            (above, below)
        }
    });
    doubled_asymmetry(above, above + below)
}

/// Spread of arc lengths above the identity line relative to all non-tied points, halved
pub fn asymmetric_spread_index(pairs: &LagPairs) -> f64 {
    if pairs.is_degenerate() {
        return 0.0;
    }
    let above: Vec<f64> = pairs
        .iter()
        .filter(|p| p.is_above())
        .map(LagPair::arc_length)
        .collect();
    let non_tied: Vec<f64> = pairs
        .iter()
        .filter(|p| !p.is_tied())
        .map(LagPair::arc_length)
        .collect();
    if above.is_empty() || non_tied.is_empty() {
        return 0.0;
    }

    match (sample_variance(&above), sample_variance(&non_tied)) {
        (Some(var_above), Some(var_total)) if var_total > 0.0 => {
            var_above.sqrt() / (2.0 * var_total.sqrt())
        }
        _ => 0.0,
    }
}

/// Area index: share of total sector area contributed by points above the identity line
pub fn area_index(pairs: &LagPairs) -> f64 {
    if pairs.is_degenerate() {
        return 0.0;
    }
    let total: f64 = pairs.iter().map(LagPair::sector_area).sum();
    let above: f64 = pairs
        .iter()
        .filter(|p| p.is_above())
        .map(LagPair::sector_area)
        .sum();
    doubled_asymmetry(above, total)
}

/// Slope index: Area index weighted by angle alone
pub fn slope_index(pairs: &LagPairs) -> f64 {
    if pairs.is_degenerate() {
        return 0.0;
    }
    let total: f64 = pairs.iter().map(LagPair::angle_from_identity).sum();
    let above: f64 = pairs
        .iter()
        .filter(|p| p.is_above())
        .map(LagPair::angle_from_identity)
        .sum();
    doubled_asymmetry(above, total)
}

/// Compute a full descriptor row for one subject.
///
/// `kde_ami` is passed in because the density estimate does not depend on the
/// bin count and is computed once per subject ahead of the resolution loop.
pub fn compute_row(intervals: &[f64], bins: usize, bounds: Bounds, kde_ami: f64) -> DescriptorRow {
    if intervals.len() < MIN_POINTS {
        return DescriptorRow::zeros();
    }
    let pairs = LagPairs::from_intervals(intervals);

    DescriptorRow {
        sd1: sd1(intervals),
        sd2: sd2(intervals),
        porta_index: porta_index(&pairs),
        guzik_index: guzik_index(&pairs),
        asymmetric_spread_index: asymmetric_spread_index(&pairs),
        area_index: area_index(&pairs),
        slope_index: slope_index(&pairs),
        hb_ami: histogram_ami(intervals, bins, bounds),
        kde_ami,
    }
}
