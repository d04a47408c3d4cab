//! Peak-finding primitives over a sampled absorption array.
//!
//! These functions mirror the conventions of the classic signal-processing
//! toolkits: a peak is a strict local maximum (plateaus report their middle
//! sample), selection by height keeps samples at or above a threshold,
//! selection by distance keeps the tallest peak of any crowded cluster, and
//! prominence measures how far a peak rises above its surroundings.
//!
//! All functions take the absorption array plus a list of candidate sample
//! indices and leave the candidates in ascending index order.

use ndarray::Array1;

/// Indices of all local maxima in `y`, in ascending order.
///
/// A sample qualifies when it is strictly greater than its neighbors on
/// both sides. Flat-topped peaks report the middle sample of the plateau.
/// The first and last samples never qualify.
pub fn local_maxima(y: &Array1<f64>) -> Vec<usize> {
    let n = y.len();
    let mut maxima = Vec::new();
    if n < 3 {
        return maxima;
    }

    let mut i = 1;
    while i < n - 1 {
        if y[i - 1] < y[i] {
            if y[i] > y[i + 1] {
                maxima.push(i);
            } else if y[i] == y[i + 1] {
                // Plateau: scan to the first sample past the flat top.
                let mut ahead = i + 1;
                while ahead < n - 1 && y[ahead] == y[i] {
                    ahead += 1;
                }
                if y[ahead] < y[i] {
                    maxima.push((i + ahead - 1) / 2);
                }
                i = ahead;
                continue;
            }
        }
        i += 1;
    }
    maxima
}

/// Keeps the candidates whose height is at least `min_height`.
pub fn select_by_height(y: &Array1<f64>, candidates: &[usize], min_height: f64) -> Vec<usize> {
    candidates
        .iter()
        .copied()
        .filter(|&i| y[i] >= min_height)
        .collect()
}

/// Keeps candidates that are at least `distance` samples apart.
///
/// Candidates are visited from tallest to shortest; each survivor evicts
/// any not-yet-kept neighbor closer than `distance` samples. Two peaks
/// separated by exactly `distance` samples both survive.
pub fn select_by_distance(y: &Array1<f64>, candidates: &[usize], distance: usize) -> Vec<usize> {
    if distance <= 1 || candidates.len() < 2 {
        return candidates.to_vec();
    }

    let mut keep = vec![true; candidates.len()];
    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|&i, &j| y[candidates[j]].total_cmp(&y[candidates[i]]));

    for &k in &order {
        if !keep[k] {
            continue;
        }
        let mut j = k;
        while j > 0 {
            j -= 1;
            if candidates[k] - candidates[j] >= distance {
                break;
            }
            keep[j] = false;
        }
        let mut j = k + 1;
        while j < candidates.len() {
            if candidates[j] - candidates[k] >= distance {
                break;
            }
            keep[j] = false;
            j += 1;
        }
    }

    candidates
        .iter()
        .zip(&keep)
        .filter(|(_, &kept)| kept)
        .map(|(&i, _)| i)
        .collect()
}

/// Topographic prominence of each candidate, aligned with `candidates`.
///
/// For a peak the search extends left and right until a strictly higher
/// sample or the edge of the array; the prominence is the peak height minus
/// the higher of the two lowest samples found on either side.
pub fn prominences(y: &Array1<f64>, candidates: &[usize]) -> Vec<f64> {
    candidates
        .iter()
        .map(|&peak| {
            let height = y[peak];

            let mut left_min = height;
            let mut i = peak as isize;
            while i >= 0 {
                let v = y[i as usize];
                if v > height {
                    break;
                }
                if v < left_min {
                    left_min = v;
                }
                i -= 1;
            }

            let mut right_min = height;
            let mut i = peak;
            while i < y.len() {
                if y[i] > height {
                    break;
                }
                if y[i] < right_min {
                    right_min = y[i];
                }
                i += 1;
            }

            height - left_min.max(right_min)
        })
        .collect()
}

/// Keeps candidates with prominence of at least `min_prominence`.
///
/// Returns the retained indices together with their prominences, both in
/// candidate order.
pub fn select_by_prominence(
    y: &Array1<f64>,
    candidates: &[usize],
    min_prominence: f64,
) -> (Vec<usize>, Vec<f64>) {
    let proms = prominences(y, candidates);
    candidates
        .iter()
        .zip(&proms)
        .filter(|(_, &p)| p >= min_prominence)
        .map(|(&i, &p)| (i, p))
        .unzip()
}
