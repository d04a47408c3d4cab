//! Absorption trace data model.
//!
//! A [`Trace`] owns one scan of an infrared absorption spectrum: a
//! wavenumber grid in instrument order (monotonically decreasing) and the
//! absorption sampled on that grid. Construction validates the invariants
//! the detection and fitting stages rely on, so downstream code never
//! re-checks them.

use crate::error::{Result, RovibError};
use ndarray::{s, Array1};

/// One scan of an absorption spectrum on a descending wavenumber grid.
#[derive(Debug, Clone)]
pub struct Trace {
    wavenumber: Array1<f64>,
    absorption: Array1<f64>,
}

impl Trace {
    /// Create a trace from a wavenumber grid and matching absorption samples.
    ///
    /// # Arguments
    ///
    /// * `wavenumber` - Sample positions in cm^-1, strictly decreasing
    /// * `absorption` - Absorbance at each sample position
    ///
    /// # Returns
    ///
    /// * The validated trace, or `InvalidInput` when the arrays are empty,
    ///   differ in length, contain non-finite values, or are out of order
    pub fn new(wavenumber: Array1<f64>, absorption: Array1<f64>) -> Result<Self> {
        if wavenumber.len() != absorption.len() {
            return Err(RovibError::InvalidInput(format!(
                "Wavenumber and absorption lengths differ: {} vs {}",
                wavenumber.len(),
                absorption.len()
            )));
        }
        if wavenumber.is_empty() {
            return Err(RovibError::InvalidInput(
                "Trace contains no samples".to_string(),
            ));
        }
        if wavenumber.iter().any(|w| !w.is_finite())
            || absorption.iter().any(|a| !a.is_finite())
        {
            return Err(RovibError::InvalidInput(
                "Trace contains non-finite samples".to_string(),
            ));
        }
        for i in 1..wavenumber.len() {
            if wavenumber[i] >= wavenumber[i - 1] {
                return Err(RovibError::InvalidInput(format!(
                    "Wavenumber grid must be strictly decreasing; violated at sample {}",
                    i
                )));
            }
        }

        Ok(Self {
            wavenumber,
            absorption,
        })
    }

    /// The wavenumber grid, in instrument order (decreasing).
    pub fn wavenumber(&self) -> &Array1<f64> {
        &self.wavenumber
    }

    /// The absorption samples, aligned with the wavenumber grid.
    pub fn absorption(&self) -> &Array1<f64> {
        &self.absorption
    }

    /// Number of samples in the trace.
    pub fn len(&self) -> usize {
        self.wavenumber.len()
    }

    /// Whether the trace has no samples. Always false for a constructed trace.
    pub fn is_empty(&self) -> bool {
        self.wavenumber.is_empty()
    }

    /// Mean absorption over the whole trace.
    pub fn mean_absorption(&self) -> f64 {
        self.absorption.sum() / self.absorption.len() as f64
    }

    /// Extract the sub-trace covering the wavenumber interval `[lo, hi]`.
    ///
    /// Both bounds are inclusive; samples are matched against the grid by
    /// binary search, so the caller does not need to know the instrument's
    /// sampling convention.
    ///
    /// # Arguments
    ///
    /// * `hi` - Upper wavenumber bound of the window (cm^-1)
    /// * `lo` - Lower wavenumber bound of the window (cm^-1)
    ///
    /// # Returns
    ///
    /// * The windowed trace, or `InvalidInput` when the bounds are inverted
    ///   or no samples fall inside them
    pub fn window(&self, hi: f64, lo: f64) -> Result<Trace> {
        if !(hi > lo) {
            return Err(RovibError::InvalidInput(format!(
                "Window bounds are inverted or equal: hi = {}, lo = {}",
                hi, lo
            )));
        }

        let start = self.first_at_or_below(hi);
        let end = self.first_below(lo);

        if start >= end {
            return Err(RovibError::InvalidInput(format!(
                "Window [{}, {}] cm^-1 contains no samples",
                lo, hi
            )));
        }

        Ok(Trace {
            wavenumber: self.wavenumber.slice(s![start..end]).to_owned(),
            absorption: self.absorption.slice(s![start..end]).to_owned(),
        })
    }

    /// First index whose wavenumber is `<= bound` on the descending grid.
    fn first_at_or_below(&self, bound: f64) -> usize {
        let (mut lo, mut hi) = (0usize, self.wavenumber.len());
        while lo < hi {
            let mid = (lo + hi) / 2;
            if self.wavenumber[mid] > bound {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo
    }

    /// First index whose wavenumber is `< bound` on the descending grid.
    fn first_below(&self, bound: f64) -> usize {
        let (mut lo, mut hi) = (0usize, self.wavenumber.len());
        while lo < hi {
            let mid = (lo + hi) / 2;
            if self.wavenumber[mid] >= bound {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn descending_grid(hi: f64, lo: f64, step: f64) -> Array1<f64> {
        let n = ((hi - lo) / step).round() as usize + 1;
        Array1::from_shape_fn(n, |i| hi - i as f64 * step)
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let result = Trace::new(array![3.0, 2.0, 1.0], array![0.1, 0.2]);
        assert!(matches!(result, Err(RovibError::InvalidInput(_))));
    }

    #[test]
    fn test_empty_rejected() {
        let result = Trace::new(Array1::zeros(0), Array1::zeros(0));
        assert!(matches!(result, Err(RovibError::InvalidInput(_))));
    }

    #[test]
    fn test_increasing_grid_rejected() {
        let result = Trace::new(array![1.0, 2.0, 3.0], array![0.1, 0.2, 0.3]);
        assert!(matches!(result, Err(RovibError::InvalidInput(_))));
    }

    #[test]
    fn test_non_finite_rejected() {
        let result = Trace::new(array![3.0, 2.0, 1.0], array![0.1, f64::NAN, 0.3]);
        assert!(matches!(result, Err(RovibError::InvalidInput(_))));
    }

    #[test]
    fn test_mean_absorption() {
        let trace = Trace::new(array![3.0, 2.0, 1.0], array![0.1, 0.2, 0.6]).unwrap();
        assert_relative_eq!(trace.mean_absorption(), 0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_window_bounds_inclusive() {
        let grid = descending_grid(10.0, 0.0, 1.0);
        let absorption = Array1::zeros(grid.len());
        let trace = Trace::new(grid, absorption).unwrap();

        let windowed = trace.window(7.0, 3.0).unwrap();
        assert_eq!(windowed.len(), 5);
        assert_relative_eq!(windowed.wavenumber()[0], 7.0);
        assert_relative_eq!(windowed.wavenumber()[4], 3.0);
    }

    #[test]
    fn test_window_between_samples() {
        let grid = descending_grid(10.0, 0.0, 1.0);
        let absorption = Array1::zeros(grid.len());
        let trace = Trace::new(grid, absorption).unwrap();

        let windowed = trace.window(7.5, 2.5).unwrap();
        assert_eq!(windowed.len(), 5);
        assert_relative_eq!(windowed.wavenumber()[0], 7.0);
        assert_relative_eq!(windowed.wavenumber()[4], 3.0);
    }

    #[test]
    fn test_window_outside_grid_is_rejected() {
        let grid = descending_grid(10.0, 5.0, 1.0);
        let absorption = Array1::zeros(grid.len());
        let trace = Trace::new(grid, absorption).unwrap();

        assert!(trace.window(4.0, 1.0).is_err());
    }

    #[test]
    fn test_inverted_window_rejected() {
        let grid = descending_grid(10.0, 5.0, 1.0);
        let absorption = Array1::zeros(grid.len());
        let trace = Trace::new(grid, absorption).unwrap();

        assert!(trace.window(6.0, 8.0).is_err());
    }

    #[test]
    fn test_window_preserves_alignment() {
        let grid = array![5.0, 4.0, 3.0, 2.0, 1.0];
        let absorption = array![0.5, 0.4, 0.3, 0.2, 0.1];
        let trace = Trace::new(grid, absorption).unwrap();

        let windowed = trace.window(4.0, 2.0).unwrap();
        assert_eq!(windowed.len(), 3);
        assert_relative_eq!(windowed.wavenumber()[1], 3.0);
        assert_relative_eq!(windowed.absorption()[1], 0.3);
    }
}
