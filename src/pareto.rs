//! The non-dominated archive and its domination rule.
//!
//! All objectives are maximized. A solution **dominates** another when it is
//! strictly better in every objective; component-wise equal tuples collapse
//! to one representative. The archive kept across iterations is elitist:
//! candidates are only evicted by being dominated, never by age.

/// One archive entry: a position in parameter space together with its
/// measured objectives and their uncertainties.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FrontEntry {
    /// Abstract-coordinate position the objectives were measured at.
    pub position: Vec<f64>,
    /// Measured objective means, one per objective (maximize convention).
    pub objectives: Vec<f64>,
    /// Standard error of each objective measurement.
    pub error: Vec<f64>,
    /// Standard deviation of each objective measurement.
    pub std_dev: Vec<f64>,
}

/// Returns `true` if `a` strictly dominates `b`: better in every objective.
///
/// Both tuples are in maximize convention and must have equal length.
#[must_use]
pub fn dominates(a: &[f64], b: &[f64]) -> bool {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).all(|(&av, &bv)| av > bv)
}

/// Computes the non-dominated front of `candidates`.
///
/// Domination is evaluated pairwise over the full candidate set. An entry is
/// removed when another entry strictly dominates it, or when it is an exact
/// objective-tuple duplicate of an earlier entry (one representative is
/// kept). Removal happens in descending index order so the surviving
/// entries keep their relative order.
///
/// The result is idempotent: running `compute_front` on its own output
/// returns the same set.
#[must_use]
pub fn compute_front(mut candidates: Vec<FrontEntry>) -> Vec<FrontEntry> {
    let mut dominated: Vec<usize> = Vec::new();

    for i in 0..candidates.len() {
        for j in (i + 1)..candidates.len() {
            let a = &candidates[i].objectives;
            let b = &candidates[j].objectives;

            if a == b {
                // Exact tie: keep the earlier entry as the representative.
                dominated.push(j);
            } else if dominates(a, b) {
                dominated.push(j);
            } else if dominates(b, a) {
                dominated.push(i);
            }
        }
    }

    dominated.sort_unstable();
    dominated.dedup();
    for &index in dominated.iter().rev() {
        candidates.remove(index);
    }

    candidates
}

/// Returns `true` if no entry dominates another and no two entries share an
/// objective tuple — the archive invariant.
#[must_use]
pub fn is_non_dominated(front: &[FrontEntry]) -> bool {
    for (i, a) in front.iter().enumerate() {
        for (j, b) in front.iter().enumerate() {
            if i == j {
                continue;
            }
            if a.objectives == b.objectives || dominates(&a.objectives, &b.objectives) {
                return false;
            }
        }
    }
    true
}
