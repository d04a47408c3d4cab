//! Batch analysis of transition windows.
//!
//! A survey scan covers several bands at once: HCl and DCl each show a
//! fundamental and a first overtone in a typical run. Each band lives in
//! its own wavenumber window and is analyzed independently, so windows
//! run in parallel and a failure in one never poisons the others.

use log::info;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::band::{BandModel, Branch, TransitionOrder};
use crate::error::Result;
use crate::fit::{BandFit, BranchModelFitter};
use crate::peaks::{Detection, PeakDetector};
use crate::plot::format_title;
use crate::trace::Trace;

/// One transition band to carve out of a survey scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionWindow {
    /// Short name used in logs and file names, e.g. `hcl-fundamental`.
    pub label: String,
    /// Compound the band belongs to, e.g. `HCl`.
    pub compound: String,
    /// High wavenumber edge of the window (cm^-1).
    pub hi: f64,
    /// Low wavenumber edge of the window (cm^-1).
    pub lo: f64,
    /// Vibrational transition contained in the window.
    pub order: TransitionOrder,
}

impl TransitionWindow {
    pub fn new(
        label: impl Into<String>,
        compound: impl Into<String>,
        hi: f64,
        lo: f64,
        order: TransitionOrder,
    ) -> Self {
        TransitionWindow {
            label: label.into(),
            compound: compound.into(),
            hi,
            lo,
            order,
        }
    }

    /// Plot title for this window, e.g. `HCl (v = 0 -> 2)`.
    pub fn title(&self) -> String {
        format_title(&self.compound, self.order)
    }
}

/// Detection and both branch fits for one window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowAnalysis {
    pub window: TransitionWindow,
    pub detection: Detection,
    pub r_fit: BandFit,
    pub p_fit: BandFit,
}

impl WindowAnalysis {
    /// Fit of one branch.
    pub fn branch_fit(&self, branch: Branch) -> &BandFit {
        match branch {
            Branch::R => &self.r_fit,
            Branch::P => &self.p_fit,
        }
    }

    /// Multi-line report of the window's results.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("{} [{}]\n", self.window.title(), self.window.label));
        out.push_str(&format!(
            "  Window: {:.1} - {:.1} cm^-1\n",
            self.window.hi, self.window.lo
        ));
        out.push_str(&format!(
            "  Peaks: {} R, {} P; split at {:.2} cm^-1\n",
            self.detection.r_peaks.len(),
            self.detection.p_peaks.len(),
            self.detection.split_wavenumber
        ));
        for branch in [Branch::R, Branch::P] {
            let fit = self.branch_fit(branch);
            out.push_str(&format!(
                "  {} branch: {} ({} points, cost {:.3e})\n",
                branch,
                constants_line(fit),
                fit.points,
                fit.cost
            ));
        }
        out
    }
}

fn constants_line(fit: &BandFit) -> String {
    format!(
        "a = {:.5} +/- {:.5}, b = {:.5} +/- {:.5}, c = {:.3} +/- {:.3}, d = {:.2e} +/- {:.2e}",
        fit.params.a,
        fit.errors[0],
        fit.params.b,
        fit.errors[1],
        fit.params.c,
        fit.errors[2],
        fit.params.d,
        fit.errors[3],
    )
}

/// Runs detection and both branch fits on one window of a survey trace.
///
/// # Arguments
///
/// * `trace` - Full survey scan
/// * `window` - Band to carve out and analyze
/// * `detector` - Peak detector to apply
/// * `fitter` - Branch model fitter to apply
pub fn analyze_window(
    trace: &Trace,
    window: &TransitionWindow,
    detector: &PeakDetector,
    fitter: &BranchModelFitter,
) -> Result<WindowAnalysis> {
    let windowed = trace.window(window.hi, window.lo)?;
    let detection = detector.detect(&windowed)?;
    let r_fit = fit_branch(&detection, Branch::R, window.order, fitter)?;
    let p_fit = fit_branch(&detection, Branch::P, window.order, fitter)?;

    info!(
        "{}: {} peaks, R b = {:.4} +/- {:.4}, P b = {:.4} +/- {:.4}",
        window.label,
        detection.peak_count(),
        r_fit.params.b,
        r_fit.errors[1],
        p_fit.params.b,
        p_fit.errors[1]
    );

    Ok(WindowAnalysis {
        window: window.clone(),
        detection,
        r_fit,
        p_fit,
    })
}

fn fit_branch(
    detection: &Detection,
    branch: Branch,
    order: TransitionOrder,
    fitter: &BranchModelFitter,
) -> Result<BandFit> {
    let (j, nu) = detection.branch_data(branch);
    fitter.fit(BandModel::new(branch, order), &j, &nu)
}

/// Analyzes every window in parallel.
///
/// Results come back in window order. Each window stands alone: an error
/// in one slot leaves the other analyses intact.
pub fn analyze_windows(
    trace: &Trace,
    windows: &[TransitionWindow],
    detector: &PeakDetector,
    fitter: &BranchModelFitter,
) -> Vec<Result<WindowAnalysis>> {
    windows
        .par_iter()
        .map(|window| analyze_window(trace, window, detector, fitter))
        .collect()
}
