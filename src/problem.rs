//! Problem definition trait for least-squares fitting.
//!
//! This module defines the `Problem` trait, which represents a nonlinear
//! least squares problem to be minimized with the Levenberg-Marquardt
//! algorithm. Branch models implement it with analytic Jacobians; anything
//! else falls back to numerical differentiation.

use crate::error::Result;
use ndarray::{Array1, Array2};

/// A trait representing a nonlinear least squares problem.
///
/// Implementors supply residuals (model minus data) as a function of the
/// parameter vector; the optimizer drives the parameters toward the
/// least-squares minimum.
pub trait Problem {
    /// Evaluate the residuals at the given parameters.
    ///
    /// # Arguments
    ///
    /// * `params` - The parameter values at which to evaluate the residuals
    ///
    /// # Returns
    ///
    /// * A vector of residuals, or an error if the evaluation fails
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>>;

    /// Get the number of parameters in the problem.
    fn parameter_count(&self) -> usize;

    /// Get the number of residuals in the problem.
    fn residual_count(&self) -> usize;

    /// Evaluate the Jacobian matrix at the given parameters.
    ///
    /// The Jacobian is the matrix of partial derivatives of the residuals
    /// with respect to the parameters, used to compute the step direction.
    ///
    /// # Arguments
    ///
    /// * `params` - The parameter values at which to evaluate the Jacobian
    ///
    /// # Returns
    ///
    /// * The Jacobian matrix, or an error if the evaluation fails
    ///
    /// # Default Implementation
    ///
    /// The default implementation uses forward finite differences.
    fn jacobian(&self, params: &Array1<f64>) -> Result<Array2<f64>>
    where
        Self: Sized,
    {
        crate::utils::finite_difference::jacobian(self, params, None)
    }

    /// Check if this problem provides a custom Jacobian implementation.
    ///
    /// When true, the optimizer calls the problem's `jacobian` method
    /// directly instead of differentiating numerically.
    fn has_custom_jacobian(&self) -> bool {
        false
    }

    /// Evaluate the sum of squared residuals at the given parameters.
    ///
    /// # Arguments
    ///
    /// * `params` - The parameter values at which to evaluate the cost
    ///
    /// # Returns
    ///
    /// * The cost value (sum of squared residuals), or an error if the evaluation fails
    fn eval_cost(&self, params: &Array1<f64>) -> Result<f64> {
        let residuals = self.eval(params)?;
        Ok(residuals.iter().map(|r| r.powi(2)).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RovibError;
    use approx::assert_relative_eq;
    use ndarray::array;

    /// A quadratic test model: f(x) = a * x^2 + b
    struct QuadraticModel {
        x_data: Array1<f64>,
        y_data: Array1<f64>,
    }

    impl Problem for QuadraticModel {
        fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
            if params.len() != 2 {
                return Err(RovibError::DimensionMismatch(format!(
                    "Expected 2 parameters, got {}",
                    params.len()
                )));
            }

            let a = params[0];
            let b = params[1];

            Ok(self
                .x_data
                .iter()
                .zip(self.y_data.iter())
                .map(|(x, y)| a * x * x + b - y)
                .collect())
        }

        fn parameter_count(&self) -> usize {
            2
        }

        fn residual_count(&self) -> usize {
            self.x_data.len()
        }

        fn jacobian(&self, _params: &Array1<f64>) -> Result<Array2<f64>> {
            let n = self.x_data.len();
            let mut jac = Array2::zeros((n, 2));
            for i in 0..n {
                jac[[i, 0]] = self.x_data[i] * self.x_data[i];
                jac[[i, 1]] = 1.0;
            }
            Ok(jac)
        }

        fn has_custom_jacobian(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_quadratic_model_eval() {
        let x = array![0.0, 1.0, 2.0, 3.0];
        let y = array![1.0, 3.0, 9.0, 19.0]; // y = 2x^2 + 1
        let model = QuadraticModel { x_data: x, y_data: y };

        let params = array![2.0, 1.0];
        let residuals = model.eval(&params).unwrap();
        assert_eq!(residuals.len(), 4);
        for r in residuals.iter() {
            assert_relative_eq!(*r, 0.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_custom_jacobian_matches_finite_difference() {
        let x = array![0.5, 1.5, 2.5];
        let y = array![0.0, 0.0, 0.0];
        let model = QuadraticModel { x_data: x, y_data: y };

        let params = array![1.2, -0.7];
        let analytic = model.jacobian(&params).unwrap();
        let numeric =
            crate::utils::finite_difference::jacobian(&model, &params, None).unwrap();

        assert_eq!(analytic.shape(), numeric.shape());
        for (a, n) in analytic.iter().zip(numeric.iter()) {
            assert_relative_eq!(*a, *n, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_eval_cost() {
        let x = array![1.0, 2.0];
        let y = array![2.0, 8.0]; // y = 2x^2
        let model = QuadraticModel { x_data: x, y_data: y };

        let params = array![2.0, 0.0];
        assert_relative_eq!(model.eval_cost(&params).unwrap(), 0.0, epsilon = 1e-10);

        // a = 1, b = 0 leaves residuals [-1, -4]
        let params = array![1.0, 0.0];
        assert_relative_eq!(model.eval_cost(&params).unwrap(), 17.0, epsilon = 1e-10);
    }

    #[test]
    fn test_wrong_parameter_count_is_rejected() {
        let model = QuadraticModel {
            x_data: array![1.0],
            y_data: array![1.0],
        };
        let result = model.eval(&array![1.0, 2.0, 3.0]);
        assert!(matches!(result, Err(RovibError::DimensionMismatch(_))));
    }
}
