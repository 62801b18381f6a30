//! Weighted k-means over histogram cells.
//!
//! Cells stand in for pixels: a cell contributes its CIELAB sum to the
//! centroid of the seed it is assigned to, and its pixel count to that
//! seed's weight.

use crate::color::Lab;
use crate::error::{PaletteError, Result};
use crate::histogram::{HISTOGRAM_SIZE, Histogram};

/// Default safety cap on refinement passes.
pub const DEFAULT_MAX_ITERATIONS: usize = 256;

/// Outcome of [`refine`].
#[derive(Clone, Debug, PartialEq)]
pub struct Clustering {
    /// Final centroids, in the order of the seeds they started from.
    pub centroids: Vec<Lab>,
    /// Pixels assigned to each centroid in the last pass.
    pub weights: Vec<u64>,
    /// Centroid index per histogram cell. Empty cells keep index 0.
    pub assignments: Vec<usize>,
    pub iterations: usize,
    /// `false` when the iteration cap stopped the loop.
    pub converged: bool,
}

/// Index of the centroid nearest to `color`, lowest index on ties.
#[inline]
fn nearest(color: &Lab, centroids: &[Lab]) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (i, c) in centroids.iter().enumerate() {
        let d = color.distance_squared(c);
        if d < best_dist {
            best_dist = d;
            best = i;
        }
    }
    best
}

/// Nearest centroid for every non-empty cell; empty cells map to 0.
pub fn assign(histogram: &Histogram, centroids: &[Lab]) -> Vec<usize> {
    histogram
        .cells()
        .iter()
        .map(|cell| cell.average().map_or(0, |avg| nearest(&avg, centroids)))
        .collect()
}

/// Runs weighted k-means starting from `seeds` until no cell changes
/// cluster, or `max_iterations` passes have run.
///
/// A centroid that ends a pass with no cells collapses to the Lab origin.
pub fn refine(histogram: &Histogram, seeds: &[Lab], max_iterations: usize) -> Result<Clustering> {
    if seeds.is_empty() {
        return Err(PaletteError::SequenceNotReady("no seeds to refine"));
    }
    if max_iterations == 0 {
        return Err(PaletteError::InvalidInput("max_iterations must be at least 1".into()));
    }

    let mut centroids = seeds.to_vec();
    let mut weights = vec![0u64; seeds.len()];
    let mut assignments = vec![0usize; HISTOGRAM_SIZE];
    let mut iterations = 0;
    let mut converged = false;

    while iterations < max_iterations {
        iterations += 1;

        let next = assign(histogram, &centroids);

        let mut sums = vec![Lab::ZERO; centroids.len()];
        weights.fill(0);
        for (cell, &cluster) in histogram.cells().iter().zip(&next) {
            if cell.is_empty() {
                continue;
            }
            sums[cluster] += cell.sum;
            weights[cluster] += cell.count;
        }

        for ((centroid, sum), &weight) in centroids.iter_mut().zip(&sums).zip(&weights) {
            *centroid = if weight == 0 {
                Lab::ZERO
            } else {
                *sum * (1.0 / weight as f64)
            };
        }

        let changed = next != assignments;
        assignments = next;
        if !changed {
            converged = true;
            break;
        }
    }

    if converged {
        tracing::debug!(iterations, clusters = centroids.len(), "clustering converged");
    } else {
        tracing::warn!(
            iterations,
            clusters = centroids.len(),
            "clustering hit the iteration cap before converging"
        );
    }

    Ok(Clustering {
        centroids,
        weights,
        assignments,
        iterations,
        converged,
    })
}
