//! Branch model fitting.
//!
//! This module turns a quantum-number-labeled branch into molecular
//! constants. The optimizer works over the internal parameter order
//! `(c, b, a, d)`; fitted values and their standard errors are reported in
//! the output order `(a, b, c, d)`. The reordering between the two layouts
//! happens in exactly one place, [`internal_to_output_order`], so the
//! alignment between values and uncertainties stays auditable.

use log::debug;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::band::{BandModel, BandParams};
use crate::error::{Result, RovibError};
use crate::lm::{LevenbergMarquardt, LmConfig};
use crate::problem::Problem;
use crate::uncertainty::{calculate_covariance, standard_errors_from_covariance};

/// Internal optimizer ordering of the four model parameters.
pub const INTERNAL_PARAMETER_ORDER: &str = "(c, b, a, d)";

/// Number of model parameters.
const PARAM_COUNT: usize = 4;

/// Configuration for branch model fits.
#[derive(Debug, Clone)]
pub struct FitConfig {
    /// Optimizer settings.
    pub lm: LmConfig,

    /// Initial guess used for every internal parameter. Default: 1.0
    pub initial_guess: f64,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            lm: LmConfig::default(),
            initial_guess: 1.0,
        }
    }
}

impl FitConfig {
    /// Set the maximum number of optimizer iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.lm.max_iterations = max_iterations;
        self
    }

    /// Set the initial guess used for every internal parameter.
    pub fn with_initial_guess(mut self, guess: f64) -> Self {
        self.initial_guess = guess;
        self
    }
}

/// Fitted molecular constants for one branch, with 1-sigma standard errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BandFit {
    /// The model that was fitted.
    pub model: BandModel,

    /// Fitted constants in output order (a, b, c, d).
    pub params: BandParams,

    /// Standard errors aligned positionally with (a, b, c, d).
    ///
    /// Infinite when the fit had zero degrees of freedom.
    pub errors: [f64; 4],

    /// Sum of squared residuals at the solution.
    pub cost: f64,

    /// Accepted optimizer iterations.
    pub iterations: usize,

    /// Number of (J, wavenumber) pairs fitted.
    pub points: usize,
}

/// Reorder a parameter-aligned quadruple from the internal optimizer order
/// `(c, b, a, d)` into the output order `(a, b, c, d)`.
///
/// Applied to both the fitted values and the standard errors pulled off the
/// covariance diagonal, so the two stay positionally aligned by
/// construction.
pub fn internal_to_output_order(internal: [f64; 4]) -> [f64; 4] {
    let [c, b, a, d] = internal;
    [a, b, c, d]
}

/// Least-squares problem over one branch, in internal parameter order.
struct BranchProblem<'a> {
    model: BandModel,
    j: &'a Array1<f64>,
    nu: &'a Array1<f64>,
}

impl Problem for BranchProblem<'_> {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        if params.len() != PARAM_COUNT {
            return Err(RovibError::DimensionMismatch(format!(
                "Expected {} parameters, got {}",
                PARAM_COUNT,
                params.len()
            )));
        }

        let p = [params[0], params[1], params[2], params[3]];
        Ok(self
            .j
            .iter()
            .zip(self.nu.iter())
            .map(|(&j, &nu)| self.model.nu_internal(j, &p) - nu)
            .collect())
    }

    fn parameter_count(&self) -> usize {
        PARAM_COUNT
    }

    fn residual_count(&self) -> usize {
        self.j.len()
    }

    fn jacobian(&self, _params: &Array1<f64>) -> Result<Array2<f64>> {
        // Linear in the parameters, so the Jacobian depends only on J
        let mut jac = Array2::zeros((self.j.len(), PARAM_COUNT));
        for (i, &j) in self.j.iter().enumerate() {
            let row = self.model.jacobian_row(j);
            for (k, value) in row.iter().enumerate() {
                jac[[i, k]] = *value;
            }
        }
        Ok(jac)
    }

    fn has_custom_jacobian(&self) -> bool {
        true
    }
}

/// Fits branch models to (J, wavenumber) sequences.
#[derive(Debug, Clone, Default)]
pub struct BranchModelFitter {
    config: FitConfig,
}

impl BranchModelFitter {
    /// Create a fitter with default configuration.
    pub fn new() -> Self {
        Self {
            config: FitConfig::default(),
        }
    }

    /// Create a fitter with the given configuration.
    pub fn with_config(config: FitConfig) -> Self {
        Self { config }
    }

    /// Fit a branch model to assigned quantum numbers and line positions.
    ///
    /// # Arguments
    ///
    /// * `model` - Which branch/order combination to fit
    /// * `j` - Rotational quantum numbers, one per observed line
    /// * `nu` - Observed line positions in cm^-1, aligned with `j`
    ///
    /// # Returns
    ///
    /// * The fitted constants with standard errors, or an error when the
    ///   inputs are inconsistent, underdetermined, or the optimizer fails
    pub fn fit(&self, model: BandModel, j: &Array1<f64>, nu: &Array1<f64>) -> Result<BandFit> {
        if j.len() != nu.len() {
            return Err(RovibError::InvalidInput(format!(
                "Quantum number and wavenumber lengths differ: {} vs {}",
                j.len(),
                nu.len()
            )));
        }
        if j.iter().any(|v| !v.is_finite()) || nu.iter().any(|v| !v.is_finite()) {
            return Err(RovibError::InvalidInput(
                "Branch data contains non-finite values".to_string(),
            ));
        }

        let distinct = distinct_count(j);
        if distinct < PARAM_COUNT {
            return Err(RovibError::UnderdeterminedFit {
                points: distinct,
                params: PARAM_COUNT,
            });
        }

        let problem = BranchProblem { model, j, nu };
        let lm = LevenbergMarquardt::with_config(self.config.lm.clone()).with_calc_jacobian(true);
        let initial = Array1::from_elem(PARAM_COUNT, self.config.initial_guess);

        let result = lm.minimize(&problem, initial)?;
        if !result.success {
            return Err(RovibError::FitConvergence {
                message: result.message,
                parameter_order: INTERNAL_PARAMETER_ORDER,
            });
        }

        debug!(
            "{} converged in {} iterations, cost {:.3e}",
            model, result.iterations, result.cost
        );

        let internal_errors = self.internal_errors(&result.jacobian, result.cost, j.len())?;

        let p = &result.params;
        let [a, b, c, d] = internal_to_output_order([p[0], p[1], p[2], p[3]]);
        let errors = internal_to_output_order(internal_errors);

        Ok(BandFit {
            model,
            params: BandParams::new(a, b, c, d),
            errors,
            cost: result.cost,
            iterations: result.iterations,
            points: j.len(),
        })
    }

    /// Standard errors in internal order (c, b, a, d).
    ///
    /// With zero degrees of freedom the model interpolates the data exactly
    /// and the uncertainties are undefined; they are reported as infinite.
    fn internal_errors(
        &self,
        jacobian: &Option<Array2<f64>>,
        cost: f64,
        points: usize,
    ) -> Result<[f64; 4]> {
        if points <= PARAM_COUNT {
            return Ok([f64::INFINITY; PARAM_COUNT]);
        }

        let jac = jacobian
            .as_ref()
            .ok_or_else(|| RovibError::Other("Optimizer returned no solution Jacobian".to_string()))?;

        let redchi = cost / (points - PARAM_COUNT) as f64;
        let covar = calculate_covariance(jac, redchi)?;
        let se = standard_errors_from_covariance(&covar);
        Ok([se[0], se[1], se[2], se[3]])
    }
}

/// Number of distinct quantum numbers in a branch.
fn distinct_count(j: &Array1<f64>) -> usize {
    let mut seen: Vec<f64> = Vec::with_capacity(j.len());
    for &value in j.iter() {
        if !seen.iter().any(|&s| s == value) {
            seen.push(value);
        }
    }
    seen.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::band::{Branch, TransitionOrder};
    use approx::assert_relative_eq;

    fn quantum_numbers(range: std::ops::RangeInclusive<u32>) -> Array1<f64> {
        range.map(f64::from).collect()
    }

    fn line_positions(model: BandModel, j: &Array1<f64>, params: &BandParams) -> Array1<f64> {
        j.mapv(|j| model.nu(j, params))
    }

    #[test]
    fn test_internal_to_output_order() {
        // Internal layout (c, b, a, d) maps to output layout (a, b, c, d)
        let internal = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(internal_to_output_order(internal), [3.0, 2.0, 1.0, 4.0]);
    }

    #[test]
    fn test_noiseless_round_trip() {
        let model = BandModel::new(Branch::P, TransitionOrder::Fundamental);
        let truth = BandParams::new(0.3, 10.59, 2886.0, 0.0);
        let j = quantum_numbers(1..=10);
        let nu = line_positions(model, &j, &truth);

        let fit = BranchModelFitter::new().fit(model, &j, &nu).unwrap();

        assert_relative_eq!(fit.params.a, truth.a, epsilon = 1e-6);
        assert_relative_eq!(fit.params.b, truth.b, epsilon = 1e-6);
        assert_relative_eq!(fit.params.c, truth.c, epsilon = 1e-6);
        assert_relative_eq!(fit.params.d, truth.d, epsilon = 1e-6);
        assert!(fit.cost < 1e-10);
    }

    #[test]
    fn test_underdetermined_is_rejected() {
        let model = BandModel::new(Branch::R, TransitionOrder::Fundamental);
        let j = quantum_numbers(0..=2);
        let nu = Array1::from_vec(vec![2906.0, 2925.0, 2944.0]);

        let result = BranchModelFitter::new().fit(model, &j, &nu);
        assert!(matches!(
            result,
            Err(RovibError::UnderdeterminedFit { points: 3, params: 4 })
        ));
    }

    #[test]
    fn test_duplicate_quantum_numbers_are_underdetermined() {
        let model = BandModel::new(Branch::P, TransitionOrder::Fundamental);
        let j = Array1::from_vec(vec![1.0, 1.0, 2.0, 2.0, 3.0]);
        let nu = Array1::from_vec(vec![2865.0, 2865.1, 2844.0, 2844.1, 2822.0]);

        let result = BranchModelFitter::new().fit(model, &j, &nu);
        assert!(matches!(
            result,
            Err(RovibError::UnderdeterminedFit { points: 3, params: 4 })
        ));
    }

    #[test]
    fn test_exactly_determined_fit_has_infinite_errors() {
        let model = BandModel::new(Branch::P, TransitionOrder::FirstOvertone);
        let truth = BandParams::new(0.302, 10.136, 5668.1, 5.0e-4);
        let j = quantum_numbers(1..=4);
        let nu = line_positions(model, &j, &truth);

        let fit = BranchModelFitter::new().fit(model, &j, &nu).unwrap();

        assert_relative_eq!(fit.params.b, truth.b, epsilon = 1e-4);
        assert!(fit.errors.iter().all(|e| e.is_infinite()));
    }

    #[test]
    fn test_convergence_failure_carries_parameter_order() {
        let model = BandModel::new(Branch::P, TransitionOrder::Fundamental);
        let truth = BandParams::new(0.3, 10.59, 2886.0, 0.0);
        let j = quantum_numbers(1..=8);
        let nu = line_positions(model, &j, &truth);

        let config = FitConfig::default().with_max_iterations(0);
        let result = BranchModelFitter::with_config(config).fit(model, &j, &nu);

        match result {
            Err(RovibError::FitConvergence {
                message,
                parameter_order,
            }) => {
                assert_eq!(parameter_order, INTERNAL_PARAMETER_ORDER);
                assert!(message.contains("Maximum iterations"));
            }
            other => panic!("Expected FitConvergence, got {:?}", other),
        }
    }

    #[test]
    fn test_errors_align_with_output_order() {
        // Fit noisy data, then recompute the internal-order standard errors
        // independently and check the fit reports them permuted to (a, b, c, d).
        let model = BandModel::new(Branch::R, TransitionOrder::Fundamental);
        let truth = BandParams::new(0.3, 10.59, 2886.0, 1.0e-4);
        let j = quantum_numbers(0..=9);
        let noise = [
            0.012, -0.008, 0.015, -0.011, 0.004, 0.009, -0.014, 0.006, -0.003, 0.010,
        ];
        let nu = Array1::from_shape_fn(10, |i| model.nu(i as f64, &truth) + noise[i]);

        let fit = BranchModelFitter::new().fit(model, &j, &nu).unwrap();

        let problem = BranchProblem {
            model,
            j: &j,
            nu: &nu,
        };
        let jac = problem.jacobian(&Array1::ones(4)).unwrap();
        let redchi = fit.cost / (10.0 - 4.0);
        let covar = calculate_covariance(&jac, redchi).unwrap();
        let se = standard_errors_from_covariance(&covar); // internal order (c, b, a, d)

        assert_relative_eq!(fit.errors[0], se[2], max_relative = 1e-8); // a
        assert_relative_eq!(fit.errors[1], se[1], max_relative = 1e-8); // b
        assert_relative_eq!(fit.errors[2], se[0], max_relative = 1e-8); // c
        assert_relative_eq!(fit.errors[3], se[3], max_relative = 1e-8); // d
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let model = BandModel::new(Branch::P, TransitionOrder::Fundamental);
        let j = quantum_numbers(1..=5);
        let nu = Array1::zeros(4);
        let result = BranchModelFitter::new().fit(model, &j, &nu);
        assert!(matches!(result, Err(RovibError::InvalidInput(_))));
    }
}
