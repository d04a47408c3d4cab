//! Ro-vibrational band models.
//!
//! This module defines the closed set of line-position models for the P and
//! R branches of a diatomic vibrational band. Each model expresses the line
//! wavenumber as a cubic polynomial in the rotational quantum number J whose
//! coefficients are linear combinations of four molecular constants:
//!
//! - `a`: the vibration-rotation interaction constant alpha_e
//! - `b`: the equilibrium rotational constant B_e
//! - `c`: the band origin term
//! - `d`: the centrifugal distortion constant D
//!
//! All values are in wavenumbers (cm^-1). The four branch/order combinations
//! are a closed enumeration: adding a new transition type means adding a
//! variant here, next to the existing forms, not scattering formulas across
//! call sites.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The two rotational transition branches of a vibrational band.
///
/// P-branch lines (ΔJ = -1) lie below the band origin, R-branch lines
/// (ΔJ = +1) above it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Branch {
    /// ΔJ = -1 lines, below the band origin.
    P,
    /// ΔJ = +1 lines, above the band origin.
    R,
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Branch::P => write!(f, "P"),
            Branch::R => write!(f, "R"),
        }
    }
}

/// Which vibrational transition the band corresponds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransitionOrder {
    /// The v = 0 -> 1 transition.
    Fundamental,
    /// The v = 0 -> 2 transition.
    FirstOvertone,
}

impl TransitionOrder {
    /// The upper vibrational state of the transition.
    pub fn upper_state(&self) -> u32 {
        match self {
            TransitionOrder::Fundamental => 1,
            TransitionOrder::FirstOvertone => 2,
        }
    }
}

impl fmt::Display for TransitionOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionOrder::Fundamental => write!(f, "fundamental"),
            TransitionOrder::FirstOvertone => write!(f, "first overtone"),
        }
    }
}

/// Molecular constants for a band, in output order (a, b, c, d).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandParams {
    /// Vibration-rotation interaction constant alpha_e (cm^-1).
    pub a: f64,
    /// Equilibrium rotational constant B_e (cm^-1).
    pub b: f64,
    /// Band origin term (cm^-1).
    pub c: f64,
    /// Centrifugal distortion constant D (cm^-1).
    pub d: f64,
}

impl BandParams {
    pub fn new(a: f64, b: f64, c: f64, d: f64) -> Self {
        Self { a, b, c, d }
    }
}

/// A line-position model for one branch of one transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BandModel {
    pub branch: Branch,
    pub order: TransitionOrder,
}

impl BandModel {
    pub fn new(branch: Branch, order: TransitionOrder) -> Self {
        Self { branch, order }
    }

    /// Line wavenumber at quantum number `j` for the given constants.
    pub fn nu(&self, j: f64, params: &BandParams) -> f64 {
        self.nu_cbad(j, params.c, params.b, params.a, params.d)
    }

    /// Line wavenumber with parameters supplied in internal order (c, b, a, d).
    ///
    /// The optimizer works in this order; [`nu`](Self::nu) is the named-constant
    /// entry point.
    pub fn nu_internal(&self, j: f64, p: &[f64]) -> f64 {
        self.nu_cbad(j, p[0], p[1], p[2], p[3])
    }

    fn nu_cbad(&self, j: f64, c: f64, b: f64, a: f64, d: f64) -> f64 {
        match (self.branch, self.order) {
            (Branch::P, TransitionOrder::FirstOvertone) => {
                c - (2.0 * b - 3.0 * a) * j - 2.0 * a * j.powi(2) + 4.0 * d * j.powi(3)
            }
            (Branch::P, TransitionOrder::Fundamental) => {
                c - (2.0 * b - 2.0 * a) * j - a * j.powi(2) + 4.0 * d * j.powi(3)
            }
            (Branch::R, TransitionOrder::FirstOvertone) => {
                c + (2.0 * b - 5.0 * a - 4.0 * d) + (2.0 * b - 7.0 * a - 12.0 * d) * j
                    - (2.0 * a + 12.0 * d) * j.powi(2)
                    - 4.0 * d * j.powi(3)
            }
            (Branch::R, TransitionOrder::Fundamental) => {
                c + (2.0 * b - 3.0 * a - 4.0 * d) + (2.0 * b - 4.0 * a - 12.0 * d) * j
                    - (a + 12.0 * d) * j.powi(2)
                    - 4.0 * d * j.powi(3)
            }
        }
    }

    /// Partial derivatives of the line position with respect to the internal
    /// parameter order (c, b, a, d), evaluated at quantum number `j`.
    ///
    /// Every model form is linear in the constants, so these rows are exact
    /// and independent of the parameter values.
    pub fn jacobian_row(&self, j: f64) -> [f64; 4] {
        let j2 = j * j;
        let j3 = j2 * j;
        match (self.branch, self.order) {
            (Branch::P, TransitionOrder::FirstOvertone) => {
                [1.0, -2.0 * j, 3.0 * j - 2.0 * j2, 4.0 * j3]
            }
            (Branch::P, TransitionOrder::Fundamental) => [1.0, -2.0 * j, 2.0 * j - j2, 4.0 * j3],
            (Branch::R, TransitionOrder::FirstOvertone) => [
                1.0,
                2.0 + 2.0 * j,
                -5.0 - 7.0 * j - 2.0 * j2,
                -4.0 - 12.0 * j - 12.0 * j2 - 4.0 * j3,
            ],
            (Branch::R, TransitionOrder::Fundamental) => [
                1.0,
                2.0 + 2.0 * j,
                -3.0 - 4.0 * j - j2,
                -4.0 - 12.0 * j - 12.0 * j2 - 4.0 * j3,
            ],
        }
    }

    /// All four branch/order combinations.
    pub fn all() -> [BandModel; 4] {
        [
            BandModel::new(Branch::P, TransitionOrder::Fundamental),
            BandModel::new(Branch::P, TransitionOrder::FirstOvertone),
            BandModel::new(Branch::R, TransitionOrder::Fundamental),
            BandModel::new(Branch::R, TransitionOrder::FirstOvertone),
        ]
    }
}

impl fmt::Display for BandModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-branch {} model", self.branch, self.order)
    }
}
