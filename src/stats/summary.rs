//! Descriptive statistics.
//!
//! Standard definitions: sample standard deviation (`n - 1`) and quartiles by
//! linear interpolation between order statistics. Non-finite values are
//! dropped before anything is computed.

use serde::Serialize;

use crate::domain::{Outcome, Unavailable};

/// Count, mean, spread and quartiles of a numeric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    /// Absent for a single value.
    pub std: Option<f64>,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// Box-plot statistics (1.5 × IQR whiskers).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxStats {
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub iqr: f64,
    /// Lowest value within `q25 - 1.5 * iqr`.
    pub whisker_low: f64,
    /// Highest value within `q75 + 1.5 * iqr`.
    pub whisker_high: f64,
    /// Values outside the whiskers, ascending.
    pub outliers: Vec<f64>,
}

const WHISKER_SPAN: f64 = 1.5;

/// Finite values, ascending.
pub(crate) fn sorted_finite(values: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Quantile `q` in `[0, 1]` of an ascending, non-empty slice.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

pub fn describe(values: &[f64]) -> Outcome<Summary> {
    let sorted = sorted_finite(values);
    if sorted.is_empty() {
        return Outcome::Unavailable(Unavailable::NoData);
    }

    let count = sorted.len();
    let n = count as f64;
    let mean = sorted.iter().sum::<f64>() / n;
    let std = (count > 1).then(|| {
        let ss = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
        (ss / (n - 1.0)).sqrt()
    });

    Outcome::Ready(Summary {
        count,
        mean,
        std,
        min: sorted[0],
        q25: quantile_sorted(&sorted, 0.25),
        median: quantile_sorted(&sorted, 0.5),
        q75: quantile_sorted(&sorted, 0.75),
        max: sorted[count - 1],
    })
}

pub fn box_stats(values: &[f64]) -> Outcome<BoxStats> {
    let sorted = sorted_finite(values);
    if sorted.is_empty() {
        return Outcome::Unavailable(Unavailable::NoData);
    }

    let q25 = quantile_sorted(&sorted, 0.25);
    let median = quantile_sorted(&sorted, 0.5);
    let q75 = quantile_sorted(&sorted, 0.75);
    let iqr = q75 - q25;
    let fence_low = q25 - WHISKER_SPAN * iqr;
    let fence_high = q75 + WHISKER_SPAN * iqr;

    let inside = sorted.iter().copied().filter(|v| *v >= fence_low && *v <= fence_high);
    let whisker_low = inside.clone().next().unwrap_or(q25);
    let whisker_high = inside.last().unwrap_or(q75);
    let outliers = sorted
        .iter()
        .copied()
        .filter(|v| *v < fence_low || *v > fence_high)
        .collect();

    Outcome::Ready(BoxStats {
        q25,
        median,
        q75,
        iqr,
        whisker_low,
        whisker_high,
        outliers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_matches_standard_definitions() {
        let s = describe(&[1.0, 2.0, 3.0, 4.0]).into_ready().unwrap();
        assert_eq!(s.count, 4);
        assert!((s.mean - 2.5).abs() < 1e-12);
        // Sample variance of 1..4 is 5/3.
        assert!((s.std.unwrap() - (5.0_f64 / 3.0).sqrt()).abs() < 1e-12);
        assert_eq!(s.min, 1.0);
        assert!((s.q25 - 1.75).abs() < 1e-12);
        assert!((s.median - 2.5).abs() < 1e-12);
        assert!((s.q75 - 3.25).abs() < 1e-12);
        assert_eq!(s.max, 4.0);
    }

    #[test]
    fn describe_drops_nan_and_handles_single_value() {
        let s = describe(&[f64::NAN, 7.0]).into_ready().unwrap();
        assert_eq!(s.count, 1);
        assert_eq!(s.std, None);
        assert_eq!(s.q25, 7.0);
        assert_eq!(s.q75, 7.0);
    }

    #[test]
    fn describe_empty_is_unavailable() {
        assert_eq!(describe(&[]), Outcome::Unavailable(Unavailable::NoData));
        assert_eq!(describe(&[f64::NAN]), Outcome::Unavailable(Unavailable::NoData));
    }

    #[test]
    fn box_stats_flags_outliers() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 100.0];
        let b = box_stats(&values).into_ready().unwrap();
        assert_eq!(b.outliers, vec![100.0]);
        assert_eq!(b.whisker_low, 1.0);
        assert_eq!(b.whisker_high, 5.0);
    }
}
