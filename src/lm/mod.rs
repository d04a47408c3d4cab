//! Levenberg-Marquardt algorithm implementation.
//!
//! This module provides the nonlinear least-squares minimizer used to fit
//! branch models. The branch models are linear in their parameters, so the
//! damped normal-equations iteration converges in a handful of steps, but
//! the implementation is a general LM loop and accepts any [`Problem`].
//!
//! [`Problem`]: crate::problem::Problem

pub mod algorithm;
pub mod config;

// Re-export key types
pub use algorithm::{LevenbergMarquardt, LmResult};
pub use config::LmConfig;
