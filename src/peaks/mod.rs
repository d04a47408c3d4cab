//! Peak detection for ro-vibrational absorption spectra.
//!
//! Detection runs in three stages, each in its own submodule:
//!
//! - [`find`]: generic peak primitives (local maxima, height, distance and
//!   prominence selection) over an absorption array
//! - [`isotope`]: the minor-isotopologue filter that removes the weaker
//!   species' lines from a candidate list
//! - [`detect`]: the [`PeakDetector`] itself, which splits candidates into
//!   P and R branches at the band origin and assigns quantum numbers
//!
//! The stages are deliberately separate so the filtering heuristic can be
//! audited and tested away from the branch bookkeeping.

pub mod detect;
pub mod find;
pub mod isotope;

pub use detect::{
    Detection, DetectionMode, DetectorConfig, PeakDetector, DEFAULT_ANCHOR_PROMINENCE_TOL,
    DEFAULT_HEIGHT_FACTOR, DEFAULT_MANUAL_DISTANCE, DEFAULT_MIN_PROMINENCE,
    DEFAULT_NEIGHBOR_SKIP_FRAC,
};

use serde::{Deserialize, Serialize};

/// A detected absorption peak.
///
/// Peaks are derived from a trace on every detection call and never
/// persisted; the sample index refers to the trace the detector ran on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    /// Sample index into the trace.
    pub index: usize,
    /// Wavenumber at the sample (cm^-1).
    pub wavenumber: f64,
    /// Absorbance at the sample.
    pub absorption: f64,
    /// Topographic prominence of the peak.
    pub prominence: f64,
}
