//! Seeded k-means over a single numeric column.
//!
//! Lloyd's iterations with k-means++ initialisation. Every restart draws from
//! its own `StdRng` seeded with a fixed value, restarts run in parallel, and
//! the lowest-inertia run wins (ties go to the lower seed), so identical input
//! always yields identical assignments.
//!
//! Cluster ids are relabelled by ascending centroid before returning.

use rand::prelude::*;
use rand::rngs::StdRng;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::{Outcome, Unavailable};

/// Number of groups used by the analysis screens.
pub const CLUSTER_COUNT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KMeansConfig {
    pub k: usize,
    pub restarts: usize,
    pub max_iter: usize,
    /// Convergence threshold, relative to the data variance.
    pub tol: f64,
    pub seed: u64,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            k: CLUSTER_COUNT,
            restarts: 10,
            max_iter: 300,
            tol: 1e-4,
            seed: 0,
        }
    }
}

/// Partition of a column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterAssignment {
    pub k: usize,
    /// One entry per input row; `None` for rows without a usable value.
    pub labels: Vec<Option<usize>>,
    /// Ascending; `centroids[id]` is the centre of cluster `id`.
    pub centroids: Vec<f64>,
    pub sizes: Vec<usize>,
    /// Sum of squared distances to the assigned centroid.
    pub inertia: f64,
    pub iterations: usize,
}

/// Cluster a column with nulls using the default configuration.
pub fn cluster_column(column: &[Option<f64>]) -> Outcome<ClusterAssignment> {
    kmeans(column, &KMeansConfig::default())
}

/// Cluster plain values; NaN entries are treated as missing.
pub fn cluster_values(values: &[f64]) -> Outcome<ClusterAssignment> {
    let column: Vec<Option<f64>> = values.iter().map(|&v| Some(v)).collect();
    cluster_column(&column)
}

pub fn kmeans(column: &[Option<f64>], config: &KMeansConfig) -> Outcome<ClusterAssignment> {
    let k = config.k.max(1);
    let rows: Vec<(usize, f64)> = column
        .iter()
        .enumerate()
        .filter_map(|(idx, v)| v.filter(|v| v.is_finite()).map(|v| (idx, v)))
        .collect();

    if rows.len() < k {
        warn!(available = rows.len(), required = k, "clustering unavailable");
        return Outcome::Unavailable(Unavailable::InsufficientData {
            required: k,
            available: rows.len(),
        });
    }

    // Work in units of a power of two so squared distances stay finite for
    // values near f64::MAX; the scaling itself is exact.
    let scale = unit_scale(rows.iter().map(|&(_, v)| v.abs()).fold(0.0, f64::max));
    let points: Vec<f64> = rows.iter().map(|&(_, v)| v / scale).collect();
    let tol = config.tol * variance(&points);

    let runs: Vec<Run> = (0..config.restarts.max(1) as u64)
        .into_par_iter()
        .map(|offset| lloyd(&points, k, config.seed.wrapping_add(offset), config.max_iter, tol))
        .collect();

    let mut best = &runs[0];
    for run in &runs[1..] {
        if run.inertia < best.inertia {
            best = run;
        }
    }
    debug!(inertia = best.inertia, iterations = best.iterations, "k-means converged");

    // Relabel so cluster 0 has the smallest centroid.
    let mut order: Vec<usize> = (0..k).collect();
    order.sort_by(|&a, &b| best.centroids[a].total_cmp(&best.centroids[b]));
    let mut relabel = vec![0usize; k];
    for (new_id, &old_id) in order.iter().enumerate() {
        relabel[old_id] = new_id;
    }

    let mut labels = vec![None; column.len()];
    let mut sizes = vec![0usize; k];
    for (&(idx, _), &label) in rows.iter().zip(&best.labels) {
        let id = relabel[label];
        labels[idx] = Some(id);
        sizes[id] += 1;
    }

    Outcome::Ready(ClusterAssignment {
        k,
        labels,
        centroids: order.iter().map(|&old| best.centroids[old] * scale).collect(),
        sizes,
        inertia: best.inertia * scale * scale,
        iterations: best.iterations,
    })
}

#[derive(Debug, Clone)]
struct Run {
    centroids: Vec<f64>,
    labels: Vec<usize>,
    inertia: f64,
    iterations: usize,
}

fn lloyd(points: &[f64], k: usize, seed: u64, max_iter: usize, tol: f64) -> Run {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut centroids = init_plus_plus(points, k, &mut rng);
    let mut labels = vec![0usize; points.len()];
    let mut iterations = 0;

    for _ in 0..max_iter {
        iterations += 1;
        assign(points, &centroids, &mut labels);

        let mut sums = vec![0.0; k];
        let mut counts = vec![0usize; k];
        for (&p, &label) in points.iter().zip(&labels) {
            sums[label] += p;
            counts[label] += 1;
        }

        let mut shift = 0.0;
        for c in 0..k {
            // An empty cluster keeps its previous centre.
            if counts[c] > 0 {
                let next = sums[c] / counts[c] as f64;
                shift += (next - centroids[c]).powi(2);
                centroids[c] = next;
            }
        }

        if shift <= tol {
            break;
        }
    }

    let inertia = assign(points, &centroids, &mut labels);
    Run {
        centroids,
        labels,
        inertia,
        iterations,
    }
}

/// k-means++ seeding: each next centre is drawn with probability
/// proportional to its squared distance from the nearest chosen centre.
fn init_plus_plus(points: &[f64], k: usize, rng: &mut StdRng) -> Vec<f64> {
    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[rng.gen_range(0..points.len())]);

    let mut d2: Vec<f64> = points.iter().map(|&p| (p - centroids[0]).powi(2)).collect();
    while centroids.len() < k {
        let total: f64 = d2.iter().sum();
        let next = if total > 0.0 && total.is_finite() {
            let target = rng.gen_range(0.0..total);
            let mut acc = 0.0;
            let mut pick = points.len() - 1;
            for (idx, &d) in d2.iter().enumerate() {
                acc += d;
                if acc > target {
                    pick = idx;
                    break;
                }
            }
            points[pick]
        } else {
            // Every point already coincides with a centre.
            points[rng.gen_range(0..points.len())]
        };

        centroids.push(next);
        for (d, &p) in d2.iter_mut().zip(points) {
            *d = d.min((p - next).powi(2));
        }
    }
    centroids
}

/// Assign each point to its nearest centre (ties to the lower index) and
/// return the inertia.
fn assign(points: &[f64], centroids: &[f64], labels: &mut [usize]) -> f64 {
    let mut inertia = 0.0;
    for (label, &p) in labels.iter_mut().zip(points) {
        let mut best = 0;
        let mut best_d = f64::INFINITY;
        for (c, &centre) in centroids.iter().enumerate() {
            let d = (p - centre).powi(2);
            if d < best_d {
                best = c;
                best_d = d;
            }
        }
        *label = best;
        inertia += best_d;
    }
    inertia
}

/// Smallest power of two at or above `max_abs`, or 1 for an all-zero column.
fn unit_scale(max_abs: f64) -> f64 {
    if max_abs <= 0.0 || !max_abs.is_finite() {
        return 1.0;
    }
    let exp = (max_abs.log2().ceil() as i32).clamp(-1000, 1023);
    2f64.powi(exp)
}

fn variance(points: &[f64]) -> f64 {
    let n = points.len() as f64;
    let mean = points.iter().sum::<f64>() / n;
    points.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / n
}
