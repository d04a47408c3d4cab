//! Spectrum annotation over a write-only drawing surface.
//!
//! Analysis code never renders anything itself; it issues drawing calls
//! through the [`SpectrumCanvas`] trait and leaves the backend choice to
//! the caller. [`crate::plot::SvgCanvas`] renders to a file,
//! [`NullCanvas`] discards everything for headless runs, and
//! [`RecordingCanvas`] keeps the calls around for inspection.

use crate::peaks::Detection;
use crate::trace::Trace;

/// Vertical frame margin as a fraction of the absorption range.
pub const Y_MARGIN_FRAC: f64 = 0.2;

/// Quantum-number labels sit this fraction of the absorption range
/// below the lowest sample.
pub const J_LABEL_DROP_FRAC: f64 = 0.05;

/// Branch-name labels sit this much further below the quantum numbers.
pub const BRANCH_LABEL_DROP_FRAC: f64 = 0.075;

/// Write-only drawing surface in data coordinates.
pub trait SpectrumCanvas {
    /// Places a text label at data coordinates.
    fn annotate(&mut self, x: f64, y: f64, text: &str);

    /// Draws a vertical line across the full height of the plot.
    fn vline(&mut self, x: f64);

    /// Sets the horizontal range, left edge first. Spectra are framed
    /// with wavenumber decreasing to the right, so left > right.
    fn set_xlim(&mut self, left: f64, right: f64);

    /// Sets the vertical range.
    fn set_ylim(&mut self, bottom: f64, top: f64);

    /// Sets the horizontal axis label.
    fn set_xlabel(&mut self, label: &str);

    /// Sets the vertical axis label.
    fn set_ylabel(&mut self, label: &str);
}

/// Draws the working-up annotations for one detected band: every kept
/// line gets a vertical marker and its truncated wavenumber, the
/// quantum numbers form a row below the trace with a branch name under
/// the middle of each half, and the frame follows the spectroscopy
/// convention with wavenumber decreasing to the right.
pub fn annotate_detection(canvas: &mut dyn SpectrumCanvas, trace: &Trace, detection: &Detection) {
    let (y_min, y_max) = absorption_range(trace);
    let absrange = y_max - y_min;

    for peak in detection.r_peaks.iter().chain(&detection.p_peaks) {
        canvas.annotate(
            peak.wavenumber,
            peak.absorption,
            &format!("{}", peak.wavenumber as i64),
        );
        canvas.vline(peak.wavenumber);
    }

    let label_height = y_min - J_LABEL_DROP_FRAC * absrange;
    for (peak, j) in detection
        .r_peaks
        .iter()
        .zip(&detection.r_j)
        .chain(detection.p_peaks.iter().zip(&detection.p_j))
    {
        canvas.annotate(peak.wavenumber, label_height, &j.to_string());
    }

    let branch_height = label_height - BRANCH_LABEL_DROP_FRAC * absrange;
    for (peaks, name) in [
        (&detection.r_peaks, "R-Branch"),
        (&detection.p_peaks, "P-Branch"),
    ] {
        if let (Some(first), Some(last)) = (peaks.first(), peaks.last()) {
            let center = 0.5 * (first.wavenumber - last.wavenumber) + last.wavenumber;
            canvas.annotate(center, branch_height, name);
        }
    }

    canvas.set_xlim(trace.wavenumber()[0], trace.wavenumber()[trace.len() - 1]);
    canvas.set_ylim(
        y_min - Y_MARGIN_FRAC * absrange,
        y_max + Y_MARGIN_FRAC * absrange,
    );
    canvas.set_xlabel("Wavenumber (cm^-1)");
    canvas.set_ylabel("Absorbance");
}

fn absorption_range(trace: &Trace) -> (f64, f64) {
    trace
        .absorption()
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

/// Canvas that discards every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCanvas;

impl SpectrumCanvas for NullCanvas {
    fn annotate(&mut self, _x: f64, _y: f64, _text: &str) {}
    fn vline(&mut self, _x: f64) {}
    fn set_xlim(&mut self, _left: f64, _right: f64) {}
    fn set_ylim(&mut self, _bottom: f64, _top: f64) {}
    fn set_xlabel(&mut self, _label: &str) {}
    fn set_ylabel(&mut self, _label: &str) {}
}

/// Canvas that records every call for later inspection.
#[derive(Debug, Clone, Default)]
pub struct RecordingCanvas {
    annotations: Vec<(f64, f64, String)>,
    vlines: Vec<f64>,
    xlim: Option<(f64, f64)>,
    ylim: Option<(f64, f64)>,
    xlabel: Option<String>,
    ylabel: Option<String>,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        RecordingCanvas::default()
    }

    /// Recorded labels as (x, y, text).
    pub fn annotations(&self) -> &[(f64, f64, String)] {
        &self.annotations
    }

    /// Recorded vertical line positions.
    pub fn vlines(&self) -> &[f64] {
        &self.vlines
    }

    /// Last horizontal range set, left edge first.
    pub fn xlim(&self) -> Option<(f64, f64)> {
        self.xlim
    }

    /// Last vertical range set.
    pub fn ylim(&self) -> Option<(f64, f64)> {
        self.ylim
    }

    pub fn xlabel(&self) -> Option<&str> {
        self.xlabel.as_deref()
    }

    pub fn ylabel(&self) -> Option<&str> {
        self.ylabel.as_deref()
    }
}

impl SpectrumCanvas for RecordingCanvas {
    fn annotate(&mut self, x: f64, y: f64, text: &str) {
        self.annotations.push((x, y, text.to_string()));
    }

    fn vline(&mut self, x: f64) {
        self.vlines.push(x);
    }

    fn set_xlim(&mut self, left: f64, right: f64) {
        self.xlim = Some((left, right));
    }

    fn set_ylim(&mut self, bottom: f64, top: f64) {
        self.ylim = Some((bottom, top));
    }

    fn set_xlabel(&mut self, label: &str) {
        self.xlabel = Some(label.to_string());
    }

    fn set_ylabel(&mut self, label: &str) {
        self.ylabel = Some(label.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peaks::Peak;
    use approx::assert_relative_eq;
    use ndarray::Array1;

    fn sample_detection() -> Detection {
        let peak = |index, wavenumber, absorption| Peak {
            index,
            wavenumber,
            absorption,
            prominence: 0.5,
        };
        Detection {
            r_peaks: vec![peak(10, 2926.4, 0.9), peak(40, 2906.2, 0.6)],
            p_peaks: vec![peak(90, 2865.1, 0.7)],
            r_j: vec![1, 0],
            p_j: vec![1],
            split_wavenumber: 2886.0,
        }
    }

    /// Flat trace at 0.1 with one sample spiking to 0.9, so the
    /// absorption range is exactly 0.8.
    fn sample_trace() -> Trace {
        let n = 400;
        let wavenumber = Array1::from_shape_fn(n, |i| 2930.0 - 0.25 * i as f64);
        let mut absorption = Array1::from_elem(n, 0.1);
        absorption[16] = 0.9;
        Trace::new(wavenumber, absorption).unwrap()
    }

    #[test]
    fn test_peaks_get_wavenumber_labels_and_markers() {
        let mut canvas = RecordingCanvas::new();
        annotate_detection(&mut canvas, &sample_trace(), &sample_detection());

        let texts: Vec<&str> = canvas.annotations()[..3]
            .iter()
            .map(|(_, _, text)| text.as_str())
            .collect();
        assert_eq!(texts, vec!["2926", "2906", "2865"]);

        let (x, y, _) = &canvas.annotations()[0];
        assert_relative_eq!(*x, 2926.4);
        assert_relative_eq!(*y, 0.9);

        assert_eq!(canvas.vlines(), &[2926.4, 2906.2, 2865.1]);
    }

    #[test]
    fn test_quantum_numbers_form_a_row_below_the_trace() {
        let mut canvas = RecordingCanvas::new();
        annotate_detection(&mut canvas, &sample_trace(), &sample_detection());

        // label_height = 0.1 - 0.05 * 0.8
        let j_labels = &canvas.annotations()[3..6];
        let texts: Vec<&str> = j_labels.iter().map(|(_, _, text)| text.as_str()).collect();
        assert_eq!(texts, vec!["1", "0", "1"]);
        for (_, y, _) in j_labels {
            assert_relative_eq!(*y, 0.06);
        }
    }

    #[test]
    fn test_branch_names_sit_under_branch_centers() {
        let mut canvas = RecordingCanvas::new();
        annotate_detection(&mut canvas, &sample_trace(), &sample_detection());

        let annotations = canvas.annotations();
        let (r_x, r_y, r_text) = &annotations[annotations.len() - 2];
        let (p_x, p_y, p_text) = &annotations[annotations.len() - 1];

        assert_eq!(r_text, "R-Branch");
        assert_eq!(p_text, "P-Branch");
        // Midway between the first and last R line; the single P line
        // is its own center.
        assert_relative_eq!(*r_x, 0.5 * (2926.4 + 2906.2), epsilon = 1e-9);
        assert_relative_eq!(*p_x, 2865.1);
        // branch_height = 0.06 - 0.075 * 0.8
        assert_relative_eq!(*r_y, 0.0);
        assert_relative_eq!(*p_y, 0.0);
    }

    #[test]
    fn test_reversed_frame_with_vertical_margin() {
        let mut canvas = RecordingCanvas::new();
        let trace = sample_trace();
        annotate_detection(&mut canvas, &trace, &sample_detection());

        let (left, right) = canvas.xlim().unwrap();
        assert!(left > right);
        assert_relative_eq!(left, 2930.0);
        assert_relative_eq!(right, 2830.25);

        // 0.2 of the 0.8 absorption range on both sides.
        let (bottom, top) = canvas.ylim().unwrap();
        assert_relative_eq!(bottom, 0.1 - 0.16);
        assert_relative_eq!(top, 0.9 + 0.16);

        assert_eq!(canvas.xlabel(), Some("Wavenumber (cm^-1)"));
        assert_eq!(canvas.ylabel(), Some("Absorbance"));
    }

    #[test]
    fn test_null_canvas_accepts_everything() {
        let mut canvas = NullCanvas;
        annotate_detection(&mut canvas, &sample_trace(), &sample_detection());
    }
}
