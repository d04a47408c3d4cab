//! # Covariance and Standard Error Calculations
//!
//! This module provides functions for estimating parameter uncertainties
//! from the Jacobian at a least-squares solution.

use crate::error::{Result, RovibError};
use crate::utils::{nalgebra_to_ndarray, ndarray_to_nalgebra};
use ndarray::{Array1, Array2};

/// Tolerance for the SVD pseudo-inverse fallback.
const PSEUDO_INVERSE_EPS: f64 = 1e-12;

/// Calculate the covariance matrix from the Jacobian at the solution.
///
/// For nonlinear least-squares problems, the covariance matrix is estimated as:
///   covar = redchi * inv(J^T * J)
/// where:
///   - J is the Jacobian matrix at the solution
///   - redchi is the reduced chi-square (chi^2 / dof)
///
/// The inverse goes through a direct LU-based inversion first; if `J^T J` is
/// singular to working precision, an SVD pseudo-inverse is used instead.
pub fn calculate_covariance(jacobian: &Array2<f64>, redchi: f64) -> Result<Array2<f64>> {
    let jtj = jacobian.t().dot(jacobian);
    let jtj_na = ndarray_to_nalgebra(&jtj)?;

    let inverse = match jtj_na.clone().try_inverse() {
        Some(inv) => inv,
        None => jtj_na
            .svd(true, true)
            .pseudo_inverse(PSEUDO_INVERSE_EPS)
            .map_err(|e| RovibError::LinearAlgebraError(format!("Pseudo-inverse failed: {}", e)))?,
    };

    let mut covar = nalgebra_to_ndarray(&inverse)?;
    covar.mapv_inplace(|v| v * redchi);
    Ok(covar)
}

/// Calculate the correlation matrix from a covariance matrix.
///
/// The correlation matrix is calculated as:
///   correl[i,j] = covar[i,j] / sqrt(covar[i,i] * covar[j,j])
///
/// Diagonal elements are 1.0; off-diagonal elements are correlation
/// coefficients between -1 and 1.
pub fn calculate_correlation(covar: &Array2<f64>) -> Array2<f64> {
    let n = covar.nrows();
    let mut correl = Array2::zeros((n, n));

    for i in 0..n {
        for j in 0..n {
            if i == j {
                correl[[i, j]] = 1.0;
            } else {
                let denom = (covar[[i, i]] * covar[[j, j]]).sqrt();
                if denom > 0.0 {
                    correl[[i, j]] = covar[[i, j]] / denom;
                } else {
                    correl[[i, j]] = 0.0;
                }
            }
        }
    }

    correl
}

/// Extract standard errors from the covariance matrix.
///
/// Standard errors are the square roots of the diagonal elements of the
/// covariance matrix. Non-positive diagonal entries yield a zero error
/// rather than a NaN.
pub fn standard_errors_from_covariance(covar: &Array2<f64>) -> Array1<f64> {
    let n = covar.nrows();
    let mut errors = Array1::zeros(n);

    for i in 0..n {
        errors[i] = if covar[[i, i]] > 0.0 {
            covar[[i, i]].sqrt()
        } else {
            0.0
        };
    }

    errors
}
