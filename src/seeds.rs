//! Greedy seed selection with distance-based repulsion.

use crate::color::Lab;
use crate::histogram::{HISTOGRAM_SIZE, Histogram};

/// Default attenuation constant `C` in `1 - exp(-d²/C)`. Larger values push
/// seeds farther apart; 900–6400 is the usual range for photographs.
pub const DEFAULT_ATTENUATION: f64 = 3650.0;

/// An initial cluster center picked from the histogram.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Seed {
    /// Histogram cell the seed was copied from.
    pub cell: usize,
    pub color: Lab,
}

/// Index of the heaviest weight, lowest index on ties.
fn heaviest(weights: &[f64]) -> Option<(usize, f64)> {
    weights
        .iter()
        .copied()
        .enumerate()
        .fold(None, |best, (i, w)| match best {
            Some((_, bw)) if w <= bw => best,
            _ => Some((i, w)),
        })
}

/// Picks up to `k` seeds from the non-empty cells of `histogram`.
///
/// Each round takes the cell with the largest remaining weight, then scales
/// every other non-empty cell's weight by `1 - exp(-d²/attenuation)` where
/// `d` is its distance to the new seed. Selection stops early once the
/// heaviest remaining weight is zero.
pub fn select_seeds(histogram: &Histogram, k: usize, attenuation: f64) -> Vec<Seed> {
    let mut weights = histogram.weights();
    let mut seeds = Vec::with_capacity(k.min(HISTOGRAM_SIZE));

    for _ in 0..k {
        let Some((index, weight)) = heaviest(&weights) else {
            break;
        };
        if weight <= 0.0 {
            break;
        }
        let Some(color) = histogram.cell(index).average() else {
            break;
        };

        seeds.push(Seed { cell: index, color });
        weights[index] = 0.0;

        for (i, cell) in histogram.cells().iter().enumerate() {
            if i == index || weights[i] == 0.0 {
                continue;
            }
            if let Some(avg) = cell.average() {
                let d2 = avg.distance_squared(&color);
                weights[i] *= 1.0 - (-d2 / attenuation).exp();
            }
        }
    }

    tracing::debug!(requested = k, selected = seeds.len(), "seeds selected");
    seeds
}
