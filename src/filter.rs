//! Interval filtering
//!
//! Clamps a raw RR sequence to a physiologically plausible bound. Values outside
//! the bound (and non-finite values) are discarded; order is preserved.

use crate::types::Bounds;

/// Keep the intervals satisfying `lower <= v <= upper`, in their original order.
pub fn filter_intervals(intervals: &[f64], bounds: Bounds) -> Vec<f64> {
    intervals
        .iter()
        .copied()
        .filter(|&v| bounds.contains(v))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_drops_out_of_range() {
        let filtered = filter_intervals(&[100.0, 500.0, 2500.0, 800.0], Bounds::new(300.0, 2000.0));
        assert_eq!(filtered, vec![500.0, 800.0]);
    }

    #[test]
    fn test_filter_keeps_bound_values() {
        let filtered = filter_intervals(&[300.0, 2000.0, 1000.0], Bounds::default());
        assert_eq!(filtered, vec![300.0, 2000.0, 1000.0]);
    }

    #[test]
    fn test_filter_empty_and_nan() {
        assert!(filter_intervals(&[], Bounds::default()).is_empty());
        assert!(filter_intervals(&[f64::NAN, 50.0], Bounds::default()).is_empty());
    }
}
