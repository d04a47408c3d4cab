//! The isotope-aware peak detector.
//!
//! Given a windowed trace holding one ro-vibrational band, the detector
//! selects candidate peaks, removes minor-isotopologue lines, splits the
//! remainder into R and P branches at the band origin, and assigns lower
//! state rotational quantum numbers to every retained line.
//!
//! Branch assignment leans on one structural fact: the gap between R(0)
//! and P(1) at the band origin is wider than any rotational line spacing,
//! so the widest gap in the candidate list marks the origin.

use log::{debug, warn};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::band::Branch;
use crate::error::{Result, RovibError};
use crate::peaks::{find, isotope, Peak};
use crate::trace::Trace;

/// Default multiple of the mean absorbance for the automatic threshold.
pub const DEFAULT_HEIGHT_FACTOR: f64 = 1.005;

/// Default minimum topographic prominence for automatic candidates.
pub const DEFAULT_MIN_PROMINENCE: f64 = 0.015;

/// Default relative prominence difference that reseats the R anchor.
pub const DEFAULT_ANCHOR_PROMINENCE_TOL: f64 = 0.20;

/// Default relative neighbor difference for the isotope filter's skip rule.
pub const DEFAULT_NEIGHBOR_SKIP_FRAC: f64 = 0.90;

/// Default manual-mode peak separation, in samples.
pub const DEFAULT_MANUAL_DISTANCE: usize = 40;

/// How candidate peaks are selected from a trace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DetectionMode {
    /// Height threshold derived from the trace mean, candidates screened
    /// by prominence, minor-isotopologue lines filtered out.
    Automatic,
    /// Caller-supplied height threshold and peak separation; no isotope
    /// filtering.
    Manual {
        /// Absolute absorbance threshold. Without one the detector logs a
        /// warning and falls back to automatic mode.
        height: Option<f64>,
        /// Minimum separation between peaks, in samples.
        distance: usize,
    },
}

impl DetectionMode {
    /// Manual mode with the given threshold and the default separation.
    pub fn manual(height: f64) -> Self {
        DetectionMode::Manual {
            height: Some(height),
            distance: DEFAULT_MANUAL_DISTANCE,
        }
    }
}

/// Tuning knobs for [`PeakDetector`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorConfig {
    /// Candidate selection mode.
    pub mode: DetectionMode,
    /// Automatic height threshold as a multiple of the mean absorbance.
    pub height_factor: f64,
    /// Minimum prominence for automatic candidates.
    pub min_prominence: f64,
    /// Relative prominence difference between the branch anchors above
    /// which the R anchor is taken for a minor-species line.
    pub anchor_prominence_tol: f64,
    /// Relative neighbor difference above which the isotope filter skips
    /// a position when comparing.
    pub neighbor_skip_frac: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        DetectorConfig {
            mode: DetectionMode::Automatic,
            height_factor: DEFAULT_HEIGHT_FACTOR,
            min_prominence: DEFAULT_MIN_PROMINENCE,
            anchor_prominence_tol: DEFAULT_ANCHOR_PROMINENCE_TOL,
            neighbor_skip_frac: DEFAULT_NEIGHBOR_SKIP_FRAC,
        }
    }
}

/// Result of peak detection on one trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    /// R-branch peaks in instrument order (descending wavenumber).
    pub r_peaks: Vec<Peak>,
    /// P-branch peaks in instrument order (descending wavenumber).
    pub p_peaks: Vec<Peak>,
    /// Lower-state quantum numbers aligned with `r_peaks`; J counts down
    /// to 0 at the line nearest the origin.
    pub r_j: Vec<u32>,
    /// Lower-state quantum numbers aligned with `p_peaks`; J counts up
    /// from 1 at the line nearest the origin.
    pub p_j: Vec<u32>,
    /// Wavenumber of the inter-branch gap, an estimate of the band origin.
    pub split_wavenumber: f64,
}

impl Detection {
    /// Quantum numbers and line positions of one branch, shaped for the
    /// branch-model fitter.
    pub fn branch_data(&self, branch: Branch) -> (Array1<f64>, Array1<f64>) {
        let (peaks, j) = match branch {
            Branch::R => (&self.r_peaks, &self.r_j),
            Branch::P => (&self.p_peaks, &self.p_j),
        };
        let j = j.iter().map(|&q| f64::from(q)).collect();
        let nu = peaks.iter().map(|p| p.wavenumber).collect();
        (j, nu)
    }

    /// Peaks of one branch, in instrument order.
    pub fn branch_peaks(&self, branch: Branch) -> &[Peak] {
        match branch {
            Branch::R => &self.r_peaks,
            Branch::P => &self.p_peaks,
        }
    }

    /// Total number of retained peaks across both branches.
    pub fn peak_count(&self) -> usize {
        self.r_peaks.len() + self.p_peaks.len()
    }
}

/// Finds and labels the rotational lines of one band.
///
/// # Example
///
/// ```no_run
/// use rovib_rs::peaks::PeakDetector;
/// use rovib_rs::Trace;
///
/// # fn demo(trace: &Trace) -> rovib_rs::Result<()> {
/// let detection = PeakDetector::new().detect(trace)?;
/// println!(
///     "{} R lines, {} P lines, origin near {:.1} cm^-1",
///     detection.r_peaks.len(),
///     detection.p_peaks.len(),
///     detection.split_wavenumber
/// );
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct PeakDetector {
    config: DetectorConfig,
}

impl PeakDetector {
    /// Detector with the default automatic configuration.
    pub fn new() -> Self {
        PeakDetector::default()
    }

    /// Detector with the given configuration.
    pub fn with_config(config: DetectorConfig) -> Self {
        PeakDetector { config }
    }

    /// Sets the detection mode.
    pub fn with_mode(mut self, mode: DetectionMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Sets the automatic height threshold factor.
    pub fn with_height_factor(mut self, factor: f64) -> Self {
        self.config.height_factor = factor;
        self
    }

    /// Sets the minimum prominence for automatic candidates.
    pub fn with_min_prominence(mut self, prominence: f64) -> Self {
        self.config.min_prominence = prominence;
        self
    }

    /// Sets the anchor prominence tolerance.
    pub fn with_anchor_prominence_tol(mut self, tol: f64) -> Self {
        self.config.anchor_prominence_tol = tol;
        self
    }

    /// Sets the isotope filter's neighbor skip fraction.
    pub fn with_neighbor_skip_frac(mut self, frac: f64) -> Self {
        self.config.neighbor_skip_frac = frac;
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Runs detection on a windowed trace.
    ///
    /// # Arguments
    ///
    /// * `trace` - Spectrum window holding exactly one band
    ///
    /// # Returns
    ///
    /// A [`Detection`] with both branches populated, or an error when
    /// fewer than two candidates survive selection or a branch ends up
    /// empty.
    pub fn detect(&self, trace: &Trace) -> Result<Detection> {
        match self.config.mode {
            DetectionMode::Automatic => self.detect_automatic(trace),
            DetectionMode::Manual {
                height: Some(height),
                distance,
            } => self.detect_manual(trace, height, distance),
            DetectionMode::Manual { height: None, .. } => {
                warn!("manual detection without a height threshold; falling back to automatic mode");
                self.detect_automatic(trace)
            }
        }
    }

    fn detect_automatic(&self, trace: &Trace) -> Result<Detection> {
        let y = trace.absorption();
        let maxima = find::local_maxima(y);
        let threshold = self.config.height_factor * trace.mean_absorption();
        let tall = find::select_by_height(y, &maxima, threshold);
        let (candidates, proms) =
            find::select_by_prominence(y, &tall, self.config.min_prominence);
        debug!(
            "automatic selection: {} maxima, {} above {:.4}, {} prominent",
            maxima.len(),
            tall.len(),
            threshold,
            candidates.len()
        );
        ensure_enough(candidates.len())?;

        // Anchor the branches on either side of the widest candidate gap.
        let split = widest_gap(&candidates);
        let p_anchor = candidates[split + 1];
        let mut r_anchor = candidates[split];

        // A minor-species twin of R(0) sits inside the origin gap and can
        // masquerade as the R anchor. Its prominence gives it away; the
        // true anchor is then the next candidate toward higher wavenumber.
        let p_prom = proms[split + 1];
        let r_prom = proms[split];
        if (p_prom - r_prom).abs() / p_prom > self.config.anchor_prominence_tol && split > 0 {
            r_anchor = candidates[split - 1];
            debug!(
                "R anchor moved off a minor-species line (prominence {:.4} vs {:.4})",
                r_prom, p_prom
            );
        }

        let kept = isotope::filter_minor_isotope(
            y,
            &candidates,
            &[p_anchor, r_anchor],
            self.config.neighbor_skip_frac,
        );
        debug!(
            "isotope filter removed {} of {} candidates",
            candidates.len() - kept.len(),
            candidates.len()
        );
        let retained: Vec<usize> = kept.iter().map(|&i| candidates[i]).collect();
        let retained_proms: Vec<f64> = kept.iter().map(|&i| proms[i]).collect();

        self.assemble(trace, &retained, &retained_proms)
    }

    fn detect_manual(&self, trace: &Trace, height: f64, distance: usize) -> Result<Detection> {
        let y = trace.absorption();
        let maxima = find::local_maxima(y);
        let tall = find::select_by_height(y, &maxima, height);
        let candidates = find::select_by_distance(y, &tall, distance);
        let proms = find::prominences(y, &candidates);
        debug!(
            "manual selection: {} maxima, {} above {:.4}, {} after distance {}",
            maxima.len(),
            tall.len(),
            height,
            candidates.len(),
            distance
        );
        ensure_enough(candidates.len())?;

        self.assemble(trace, &candidates, &proms)
    }

    /// Splits an accepted candidate list at the band origin and assigns
    /// quantum numbers.
    fn assemble(&self, trace: &Trace, candidates: &[usize], proms: &[f64]) -> Result<Detection> {
        let split = widest_gap(candidates);
        let mid = (candidates[split] + candidates[split + 1]) / 2;
        let split_wavenumber = trace.wavenumber()[mid];

        let mut r_peaks = Vec::new();
        let mut p_peaks = Vec::new();
        for (&index, &prominence) in candidates.iter().zip(proms) {
            let peak = Peak {
                index,
                wavenumber: trace.wavenumber()[index],
                absorption: trace.absorption()[index],
                prominence,
            };
            if peak.wavenumber > split_wavenumber {
                r_peaks.push(peak);
            } else {
                p_peaks.push(peak);
            }
        }

        if r_peaks.is_empty() {
            return Err(RovibError::EmptyBranch(Branch::R));
        }
        if p_peaks.is_empty() {
            return Err(RovibError::EmptyBranch(Branch::P));
        }

        let r_j: Vec<u32> = (0..r_peaks.len() as u32).rev().collect();
        let p_j: Vec<u32> = (1..=p_peaks.len() as u32).collect();

        debug!(
            "split at {:.2} cm^-1: {} R lines, {} P lines",
            split_wavenumber,
            r_peaks.len(),
            p_peaks.len()
        );

        Ok(Detection {
            r_peaks,
            p_peaks,
            r_j,
            p_j,
            split_wavenumber,
        })
    }
}

fn ensure_enough(found: usize) -> Result<()> {
    if found < 2 {
        return Err(RovibError::InsufficientPeaks { found, needed: 2 });
    }
    Ok(())
}

/// Position of the widest gap between consecutive candidates.
///
/// Ties resolve to the first occurrence. Callers guarantee at least two
/// candidates.
fn widest_gap(candidates: &[usize]) -> usize {
    let mut best = 0;
    let mut best_gap = 0;
    for i in 0..candidates.len() - 1 {
        let gap = candidates[i + 1] - candidates[i];
        if gap > best_gap {
            best_gap = gap;
            best = i;
        }
    }
    best
}
