//! Density-biased roulette wheel for leader selection.
//!
//! Particles steer toward a *leader* drawn from the archive. To spread the
//! swarm along the front, the draw is biased toward isolated archive
//! members: each front point is projected into the unit cube (per-objective
//! min/max normalization), its neighbors within a fixed radius are counted
//! as a local density estimate, and densities are inverted so sparse
//! regions receive more probability mass.

use crate::pareto::FrontEntry;

/// Neighborhood radius in normalized objective space.
pub const DENSITY_RADIUS: f64 = 0.05;

/// Builds the cumulative selection distribution over `front`.
///
/// Returns one cumulative probability per front entry, ending at 1.0, or an
/// empty vector when the front has fewer than two entries (no meaningful
/// density estimate exists).
///
/// Degenerate fronts fall back to uniform weighting rather than failing: a
/// zero-width objective axis normalizes to 0.0 everywhere on that axis, and
/// a front with zero total density (every point isolated) weighs all
/// entries equally.
#[must_use]
pub fn build_distribution(front: &[FrontEntry]) -> Vec<f64> {
    let n = front.len();
    if n < 2 {
        return Vec::new();
    }

    let normalized = normalize(front);
    let density = local_density(&normalized);
    let density_sum: usize = density.iter().sum();

    #[allow(clippy::cast_precision_loss)]
    let weights: Vec<f64> = if density_sum == 0 {
        vec![1.0; n]
    } else {
        density
            .iter()
            .map(|&d| (density_sum - d) as f64)
            .collect()
    };

    let total: f64 = weights.iter().sum();
    let mut cumulative = Vec::with_capacity(n);
    let mut acc = 0.0;
    for w in weights {
        acc += w / total;
        cumulative.push(acc);
    }
    cumulative
}

/// Projects the front's objective tuples into the unit cube, axis by axis.
///
/// A zero-width axis maps to 0.0 for every point.
fn normalize(front: &[FrontEntry]) -> Vec<Vec<f64>> {
    let m = front[0].objectives.len();

    let mut mins = vec![f64::INFINITY; m];
    let mut maxs = vec![f64::NEG_INFINITY; m];
    for entry in front {
        for (axis, &v) in entry.objectives.iter().enumerate() {
            mins[axis] = mins[axis].min(v);
            maxs[axis] = maxs[axis].max(v);
        }
    }

    front
        .iter()
        .map(|entry| {
            entry
                .objectives
                .iter()
                .enumerate()
                .map(|(axis, &v)| {
                    let width = maxs[axis] - mins[axis];
                    if width > 0.0 {
                        (v - mins[axis]) / width
                    } else {
                        0.0
                    }
                })
                .collect()
        })
        .collect()
}

/// Counts, for each normalized point, the neighbors within
/// [`DENSITY_RADIUS`] (excluding the point itself).
///
/// Fronts are small enough that the pairwise scan is the whole cost model;
/// a spatial index would only pay off for archives far beyond practical
/// swarm sizes.
fn local_density(points: &[Vec<f64>]) -> Vec<usize> {
    let radius_sq = DENSITY_RADIUS * DENSITY_RADIUS;
    points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            points
                .iter()
                .enumerate()
                .filter(|&(j, q)| {
                    i != j
                        && p.iter()
                            .zip(q)
                            .map(|(&a, &b)| (a - b) * (a - b))
                            .sum::<f64>()
                            <= radius_sq
                })
                .count()
        })
        .collect()
}
