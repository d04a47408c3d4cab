//! SVG rendering of spectra and branch fits.
//!
//! [`SvgCanvas`] implements [`SpectrumCanvas`] by buffering drawing calls
//! and rendering the finished scene with plotters. Buffering matters:
//! plotters needs the coordinate ranges before the first element is
//! placed, while the annotation pass only knows them at the end.

use std::path::Path;

use log::debug;
use ndarray::Array1;
use plotters::prelude::*;

use crate::annotate::SpectrumCanvas;
use crate::band::TransitionOrder;
use crate::error::{Result, RovibError};
use crate::fit::BandFit;
use crate::trace::Trace;

/// Number of samples along a fitted model curve.
pub const CURVE_SAMPLES: usize = 100;

/// Plot title for a transition, e.g. `HCl (v = 0 -> 2)`.
pub fn format_title(compound: &str, order: TransitionOrder) -> String {
    format!("{} (v = 0 -> {})", compound, order.upper_state())
}

/// Buffered drawing surface rendered to an SVG file.
#[derive(Debug, Clone, Default)]
pub struct SvgCanvas {
    title: String,
    traces: Vec<Vec<(f64, f64)>>,
    curves: Vec<Vec<(f64, f64)>>,
    points: Vec<(f64, f64)>,
    annotations: Vec<(f64, f64, String)>,
    vlines: Vec<f64>,
    xlim: Option<(f64, f64)>,
    ylim: Option<(f64, f64)>,
    xlabel: String,
    ylabel: String,
}

impl SvgCanvas {
    pub fn new(title: impl Into<String>) -> Self {
        SvgCanvas {
            title: title.into(),
            ..SvgCanvas::default()
        }
    }

    /// Buffers the trace as a connected line.
    pub fn draw_trace(&mut self, trace: &Trace) {
        self.traces.push(
            trace
                .wavenumber()
                .iter()
                .zip(trace.absorption())
                .map(|(&w, &a)| (w, a))
                .collect(),
        );
    }

    /// Buffers an arbitrary curve as a connected line.
    pub fn draw_curve(&mut self, points: Vec<(f64, f64)>) {
        self.curves.push(points);
    }

    /// Buffers free-standing point markers.
    pub fn draw_points(&mut self, points: impl IntoIterator<Item = (f64, f64)>) {
        self.points.extend(points);
    }

    /// Renders everything buffered so far to an SVG file.
    pub fn render_svg<P: AsRef<Path>>(&self, path: P, width: u32, height: u32) -> Result<()> {
        let path = path.as_ref();
        let root = SVGBackend::new(path, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(plot_err)?;

        let (x_left, x_right) = self.xlim.unwrap_or_else(|| self.data_xlim());
        let (y_bottom, y_top) = self.ylim.unwrap_or_else(|| self.data_ylim());

        let mut chart = ChartBuilder::on(&root)
            .caption(&self.title, ("sans-serif", 20).into_font())
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(x_left..x_right, y_bottom..y_top)
            .map_err(plot_err)?;

        chart
            .configure_mesh()
            .x_desc(self.xlabel.as_str())
            .y_desc(self.ylabel.as_str())
            .draw()
            .map_err(plot_err)?;

        for trace in &self.traces {
            chart
                .draw_series(LineSeries::new(trace.iter().copied(), &BLUE))
                .map_err(plot_err)?;
        }
        for curve in &self.curves {
            chart
                .draw_series(LineSeries::new(curve.iter().copied(), &RED))
                .map_err(plot_err)?;
        }
        if !self.points.is_empty() {
            chart
                .draw_series(
                    self.points
                        .iter()
                        .map(|&(x, y)| Circle::new((x, y), 3, BLUE.filled())),
                )
                .map_err(plot_err)?;
        }
        for &x in &self.vlines {
            chart
                .draw_series(LineSeries::new([(x, y_bottom), (x, y_top)], &BLACK))
                .map_err(plot_err)?;
        }
        for (x, y, text) in &self.annotations {
            chart
                .draw_series(std::iter::once(Text::new(
                    text.clone(),
                    (*x, *y),
                    ("sans-serif", 12).into_font(),
                )))
                .map_err(plot_err)?;
        }

        root.present().map_err(plot_err)?;
        debug!("rendered {}", path.display());
        Ok(())
    }

    /// Horizontal extent of the buffered content, slightly padded.
    fn data_xlim(&self) -> (f64, f64) {
        pad_range(self.data_values(|&(x, _)| x))
    }

    /// Vertical extent of the buffered content, slightly padded.
    fn data_ylim(&self) -> (f64, f64) {
        pad_range(self.data_values(|&(_, y)| y))
    }

    fn data_values<F>(&self, pick: F) -> (f64, f64)
    where
        F: Fn(&(f64, f64)) -> f64 + Copy,
    {
        self.traces
            .iter()
            .chain(&self.curves)
            .flatten()
            .chain(&self.points)
            .map(pick)
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            })
    }
}

fn pad_range((lo, hi): (f64, f64)) -> (f64, f64) {
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    if lo == hi {
        return (lo - 1.0, hi + 1.0);
    }
    let pad = 0.05 * (hi - lo);
    (lo - pad, hi + pad)
}

fn plot_err<E: std::fmt::Display>(e: E) -> RovibError {
    RovibError::PlotError(e.to_string())
}

impl SpectrumCanvas for SvgCanvas {
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
        self.xlabel = label.to_string();
    }

    fn set_ylabel(&mut self, label: &str) {
        self.ylabel = label.to_string();
    }
}

/// Renders one branch fit as observed line positions over the fitted
/// model curve, wavenumber against quantum number.
///
/// # Arguments
///
/// * `path` - Output SVG file
/// * `fit` - Converged branch fit
/// * `j` - Observed quantum numbers
/// * `nu` - Observed line positions (cm^-1)
/// * `title` - Plot title, typically from [`format_title`]
pub fn plot_branch_fit<P: AsRef<Path>>(
    path: P,
    fit: &BandFit,
    j: &Array1<f64>,
    nu: &Array1<f64>,
    title: &str,
) -> Result<()> {
    if j.is_empty() || j.len() != nu.len() {
        return Err(RovibError::InvalidInput(format!(
            "branch fit plot needs matching non-empty data, got {} J values and {} wavenumbers",
            j.len(),
            nu.len()
        )));
    }

    let (j_min, j_max) = j
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let span = (j_max - j_min).max(1.0);
    let curve: Vec<(f64, f64)> = (0..CURVE_SAMPLES)
        .map(|i| {
            let q = j_min + span * i as f64 / (CURVE_SAMPLES - 1) as f64;
            (q, fit.model.nu(q, &fit.params))
        })
        .collect();

    let mut canvas = SvgCanvas::new(format!("{} {}-branch fit", title, fit.model.branch));
    canvas.set_xlabel("J");
    canvas.set_ylabel("Wavenumber (cm^-1)");
    canvas.draw_curve(curve);
    canvas.draw_points(j.iter().zip(nu).map(|(&q, &w)| (q, w)));
    canvas.render_svg(path, 640, 480)
}
