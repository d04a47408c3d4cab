//! Minor-isotopologue filtering.
//!
//! Chlorine occurs as Cl-35 and Cl-37 in a roughly 3:1 ratio, so every
//! strong line of an HCl or DCl band has a weaker twin a few wavenumbers
//! away. The twin sits between two stronger lines of the main species,
//! which gives the filtering rule: a candidate that is lower than both of
//! its neighboring candidates belongs to the minor species.
//!
//! Two refinements keep the rule honest. The first and last candidates
//! and the designated branch anchors are never removed, since a band edge
//! or origin-adjacent line has no second neighbor to compare against. And
//! when the right-hand neighbor is itself dramatically weaker than the
//! candidate, the comparison skips ahead one position so that a pair of
//! adjacent minor lines cannot shield each other.

use ndarray::Array1;

/// Applies the minor-isotopologue rule to a candidate list.
///
/// # Arguments
///
/// * `y` - Absorption array the candidates index into
/// * `candidates` - Peak sample indices in ascending order
/// * `protected` - Sample indices that must survive (the branch anchors)
/// * `neighbor_skip_frac` - Relative height difference above which the
///   right-hand neighbor is presumed minor and the comparison moves to
///   the candidate after it
///
/// # Returns
///
/// Positions into `candidates` of the retained peaks, in ascending order.
/// Neighbor comparisons always use the original list, so a removal never
/// changes the outcome for the peaks around it.
pub fn filter_minor_isotope(
    y: &Array1<f64>,
    candidates: &[usize],
    protected: &[usize],
    neighbor_skip_frac: f64,
) -> Vec<usize> {
    let mut removed = vec![false; candidates.len()];

    for i in 1..candidates.len().saturating_sub(1) {
        let peak = candidates[i];
        let prev = candidates[i - 1];
        let mut next = candidates[i + 1];

        // A far weaker right neighbor is itself a minor-species line, so
        // judge this candidate against the next position over instead. At
        // the end of the list there is no further position and the plain
        // neighbor stands.
        let next_diff = (y[peak] - y[next]).abs() / y[next];
        if next_diff > neighbor_skip_frac && i + 2 < candidates.len() {
            next = candidates[i + 2];
        }

        if y[peak] < y[prev] && y[peak] < y[next] && !protected.contains(&peak) {
            removed[i] = true;
        }
    }

    (0..candidates.len()).filter(|&i| !removed[i]).collect()
}
