//! Histogram bins and pie-style buckets.
//!
//! Both use equal-width ranges over `[min, max]`: every range is half-open
//! `[lo, hi)` except the last, which also includes `max`, so no finite value
//! is ever dropped.

use std::collections::HashMap;

use serde::Serialize;

use crate::domain::{Outcome, Unavailable};
use crate::stats::summary::sorted_finite;

/// Bin count used for aggregated multi-document data.
pub const DEFAULT_HISTOGRAM_BINS: usize = 10;
/// Columns with at most this many distinct values are bucketed by value.
pub const DISTINCT_BUCKET_LIMIT: usize = 10;
/// Number of ranges used when there are more distinct values than that.
pub const RANGED_BUCKET_COUNT: usize = 5;

/// A numeric range with its observation count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bin {
    pub lo: f64,
    pub hi: f64,
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketMode {
    /// One bucket per distinct value.
    Distinct,
    /// Equal-width ranges.
    Ranged,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket {
    pub label: String,
    pub lo: f64,
    pub hi: f64,
    pub count: usize,
    /// Share of all values, in percent.
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketView {
    pub mode: BucketMode,
    pub buckets: Vec<Bucket>,
}

/// Equal-width histogram with `bins` bins over `[min, max]`.
///
/// When every value is the same there is no width to split, so the result is a
/// single bin `[v, v]` holding all of them.
pub fn histogram(values: &[f64], bins: usize) -> Outcome<Vec<Bin>> {
    let sorted = sorted_finite(values);
    if sorted.is_empty() {
        return Outcome::Unavailable(Unavailable::NoData);
    }
    Outcome::Ready(equal_width_bins(&sorted, bins.max(1)))
}

fn equal_width_bins(sorted: &[f64], n: usize) -> Vec<Bin> {
    let lo = sorted[0];
    let hi = sorted[sorted.len() - 1];

    if hi <= lo {
        return vec![Bin {
            lo,
            hi,
            label: range_label(lo, hi),
            count: sorted.len(),
        }];
    }

    let edges: Vec<f64> = (0..=n).map(|i| edge(lo, hi, i, n)).collect();

    let mut counts = vec![0usize; n];
    for &v in sorted {
        counts[bin_index(v, &edges)] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| Bin {
            lo: edges[i],
            hi: edges[i + 1],
            label: range_label(edges[i], edges[i + 1]),
            count,
        })
        .collect()
}

/// The `i`-th of `n + 1` equal-width edges over `[lo, hi]`.
///
/// Falls back to interpolation when `hi - lo` overflows.
fn edge(lo: f64, hi: f64, i: usize, n: usize) -> f64 {
    if i == n {
        return hi;
    }
    let span = hi - lo;
    if span.is_finite() {
        lo + i as f64 * (span / n as f64)
    } else {
        let t = i as f64 / n as f64;
        lo * (1.0 - t) + hi * t
    }
}

fn bin_index(v: f64, edges: &[f64]) -> usize {
    let n = edges.len() - 1;
    let (lo, hi) = (edges[0], edges[n]);
    let span = hi - lo;
    let fraction = if span.is_finite() {
        (v - lo) / span
    } else {
        (v / 2.0 - lo / 2.0) / (hi / 2.0 - lo / 2.0)
    };
    let mut idx = (fraction * n as f64) as usize;
    idx = idx.min(n - 1);
    // The scaled index can be off by one near an edge; settle it against the
    // actual edge values.
    if idx > 0 && v < edges[idx] {
        idx -= 1;
    } else if idx < n - 1 && v >= edges[idx + 1] {
        idx += 1;
    }
    idx
}

/// Pie-style buckets: by exact value when there are few distinct values,
/// otherwise by five equal-width ranges.
pub fn bucketize(values: &[f64]) -> Outcome<BucketView> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return Outcome::Unavailable(Unavailable::NoData);
    }
    let total = finite.len() as f64;

    let distinct = distinct_counts(&finite);
    if distinct.len() <= DISTINCT_BUCKET_LIMIT {
        let buckets = distinct
            .into_iter()
            .map(|(value, count)| Bucket {
                label: python_float(value),
                lo: value,
                hi: value,
                count,
                percent: count as f64 / total * 100.0,
            })
            .collect();
        return Outcome::Ready(BucketView {
            mode: BucketMode::Distinct,
            buckets,
        });
    }

    let sorted = sorted_finite(&finite);
    let buckets = equal_width_bins(&sorted, RANGED_BUCKET_COUNT)
        .into_iter()
        .map(|bin| Bucket {
            percent: bin.count as f64 / total * 100.0,
            label: bin.label,
            lo: bin.lo,
            hi: bin.hi,
            count: bin.count,
        })
        .collect();
    Outcome::Ready(BucketView {
        mode: BucketMode::Ranged,
        buckets,
    })
}

/// Distinct values with counts; most frequent first, ties in order of first
/// appearance.
fn distinct_counts(values: &[f64]) -> Vec<(f64, usize)> {
    let mut index: HashMap<u64, usize> = HashMap::new();
    let mut out: Vec<(f64, usize)> = Vec::new();
    for &v in values {
        // Fold -0.0 into 0.0 so they count as one value.
        let v = if v == 0.0 { 0.0 } else { v };
        match index.get(&v.to_bits()) {
            Some(&pos) => out[pos].1 += 1,
            None => {
                index.insert(v.to_bits(), out.len());
                out.push((v, 1));
            }
        }
    }
    out.sort_by(|a, b| b.1.cmp(&a.1));
    out
}

/// `"{round(lo,2)} - {round(hi,2)}"`.
pub fn range_label(lo: f64, hi: f64) -> String {
    format!("{} - {}", python_float(round2(lo)), python_float(round2(hi)))
}

fn round2(v: f64) -> f64 {
    let scaled = v * 100.0;
    if scaled.is_finite() { scaled.round() / 100.0 } else { v }
}

/// Float formatting in the shape of Python's `str(float)`.
///
/// Whole numbers keep a trailing `.0` (`10.0`); magnitudes from `1e16` up or
/// below `1e-4` use exponent form with a signed, two-digit exponent
/// (`1e+16`, `1.5e-05`).
pub fn python_float(v: f64) -> String {
    if !v.is_finite() {
        return format!("{v}");
    }
    let abs = v.abs();
    if abs != 0.0 && !(1e-4..1e16).contains(&abs) {
        let sci = format!("{v:e}");
        let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
        let exp: i32 = exp.parse().unwrap_or(0);
        let sign = if exp < 0 { '-' } else { '+' };
        return format!("{mantissa}e{sign}{:02}", exp.unsigned_abs());
    }
    if v.fract() == 0.0 {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_to(n: usize) -> Vec<f64> {
        (1..=n).map(|i| i as f64).collect()
    }

    #[test]
    fn ten_bins_over_one_to_ten() {
        let bins = histogram(&one_to(10), 10).into_ready().unwrap();
        assert_eq!(bins.len(), 10);
        for bin in &bins {
            assert!((bin.hi - bin.lo - 0.9).abs() < 1e-9);
        }
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 10);
        assert_eq!(bins[0].lo, 1.0);
        assert_eq!(bins[9].hi, 10.0);
        // The maximum lands in the closed last bin.
        assert_eq!(bins[9].count, 1);
    }

    #[test]
    fn histogram_of_constant_values_is_single_bin() {
        let bins = histogram(&[4.2, 4.2, 4.2], 10).into_ready().unwrap();
        assert_eq!(bins.len(), 1);
        assert_eq!(bins[0].count, 3);
        assert_eq!(bins[0].lo, 4.2);
        assert_eq!(bins[0].hi, 4.2);
    }

    #[test]
    fn histogram_of_nothing_is_unavailable() {
        assert_eq!(histogram(&[], 10), Outcome::Unavailable(Unavailable::NoData));
        assert_eq!(bucketize(&[f64::NAN]), Outcome::Unavailable(Unavailable::NoData));
    }

    #[test]
    fn histogram_counts_edge_values_once() {
        let values = [0.0, 0.1, 0.2, 0.30000000000000004, 0.7, 1.0];
        let bins = histogram(&values, 10).into_ready().unwrap();
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), values.len());
        assert_eq!(bins[0].count, 1);
        assert_eq!(bins[9].count, 1);
    }

    #[test]
    fn ten_distinct_values_bucket_by_value() {
        let view = bucketize(&one_to(10)).into_ready().unwrap();
        assert_eq!(view.mode, BucketMode::Distinct);
        assert_eq!(view.buckets.len(), 10);
        assert_eq!(view.buckets[0].label, "1.0");
    }

    #[test]
    fn eleven_distinct_values_bucket_by_range() {
        let view = bucketize(&one_to(11)).into_ready().unwrap();
        assert_eq!(view.mode, BucketMode::Ranged);
        assert_eq!(view.buckets.len(), 5);
        assert_eq!(view.buckets[0].label, "1.0 - 3.0");
        assert_eq!(view.buckets[4].label, "9.0 - 11.0");
        assert_eq!(view.buckets.iter().map(|b| b.count).sum::<usize>(), 11);
    }

    #[test]
    fn distinct_buckets_order_by_frequency() {
        let view = bucketize(&[2.5, 1.0, 2.5, 3.0, 1.0, 2.5]).into_ready().unwrap();
        let labels: Vec<&str> = view.buckets.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["2.5", "1.0", "3.0"]);
        assert!((view.buckets[0].percent - 50.0).abs() < 1e-9);
    }

    #[test]
    fn range_labels_round_to_two_places() {
        assert_eq!(range_label(1.23456, 7.891), "1.23 - 7.89");
        assert_eq!(range_label(0.0, 12.5), "0.0 - 12.5");
    }

    #[test]
    fn histogram_spanning_the_whole_range_keeps_finite_edges() {
        let bins = histogram(&[-1e308, 0.0, 1e308], 10).into_ready().unwrap();
        assert_eq!(bins.len(), 10);
        assert!(bins.iter().all(|b| b.lo.is_finite() && b.hi.is_finite()));
        assert!(bins.windows(2).all(|w| w[0].hi == w[1].lo && w[0].lo < w[0].hi));
        assert_eq!(bins[0].count, 1);
        assert_eq!(bins[5].count, 1);
        assert_eq!(bins[9].count, 1);
        assert!(bins.iter().all(|b| !b.label.contains("NaN") && !b.label.contains("inf")));
        assert_eq!(bins[0].lo, -1e308);
        assert_eq!(bins[9].hi, 1e308);
    }

    #[test]
    fn ranged_buckets_over_huge_spread_split_evenly() {
        let values = [
            -1e308, -8e307, -6e307, -4e307, -2e307, 0.0, 2e307, 4e307, 6e307, 8e307, 1e308,
        ];
        let view = bucketize(&values).into_ready().unwrap();
        assert_eq!(view.mode, BucketMode::Ranged);
        assert_eq!(view.buckets.len(), 5);
        assert_eq!(view.buckets.iter().map(|b| b.count).sum::<usize>(), 11);
        assert!(view.buckets.iter().all(|b| b.count >= 2));
        assert!(view.buckets[0].label.starts_with("-1e+308 - -"));
        assert!(view.buckets[4].label.ends_with(" - 1e+308"));
    }

    #[test]
    fn python_float_uses_exponent_form_at_the_extremes() {
        assert_eq!(python_float(10.0), "10.0");
        assert_eq!(python_float(-2.5), "-2.5");
        assert_eq!(python_float(0.0), "0.0");
        assert_eq!(python_float(0.0001), "0.0001");
        assert_eq!(python_float(1e16), "1e+16");
        assert_eq!(python_float(1.5e16), "1.5e+16");
        assert_eq!(python_float(1.5e-5), "1.5e-05");
        assert_eq!(python_float(-1e308), "-1e+308");
        assert_eq!(python_float(9999999999999998.0), "9999999999999998.0");
    }
}
