//! Synthetic band generation.
//!
//! Builds absorption traces with known molecular constants so detection
//! and fitting can be exercised against ground truth. Lines are Gaussian,
//! their heights follow a room-temperature Boltzmann envelope, and an
//! optional minor isotopologue adds a weaker shifted twin to every line,
//! mimicking the Cl-35 / Cl-37 pattern of real HCl and DCl spectra.

use ndarray::Array1;
use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::band::{BandModel, BandParams, Branch, TransitionOrder};
use crate::error::{Result, RovibError};
use crate::trace::Trace;

/// Rotational thermal energy kT/hc at 296 K, in cm^-1.
pub const ROOM_TEMPERATURE_KT: f64 = 205.7;

/// Builder for a synthetic two-isotopologue ro-vibrational band.
///
/// # Example
///
/// ```
/// use rovib_rs::synthetic::SyntheticBand;
/// use rovib_rs::{BandParams, TransitionOrder};
///
/// let band = SyntheticBand::new(
///     BandParams::new(0.3, 10.59, 2886.0, 0.0005),
///     TransitionOrder::Fundamental,
/// )
/// .with_minor(-4.0, 1.0 / 3.0);
/// let (hi, lo) = band.suggested_window();
/// let trace = band.render(hi, lo, 0.125).unwrap();
/// assert!(trace.len() > 1000);
/// ```
#[derive(Debug, Clone)]
pub struct SyntheticBand {
    params: BandParams,
    order: TransitionOrder,
    max_j: u32,
    line_sigma: f64,
    amplitude: f64,
    baseline: f64,
    minor_shift: f64,
    minor_fraction: f64,
    extra_lines: Vec<(f64, f64)>,
}

impl SyntheticBand {
    /// Band with the given constants, nine R lines and eight P lines, and
    /// no minor species.
    pub fn new(params: BandParams, order: TransitionOrder) -> Self {
        SyntheticBand {
            params,
            order,
            max_j: 8,
            line_sigma: 0.5,
            amplitude: 1.0,
            baseline: 0.02,
            minor_shift: -4.0,
            minor_fraction: 0.0,
            extra_lines: Vec::new(),
        }
    }

    /// Sets the highest lower-state quantum number (at least 1).
    pub fn with_max_j(mut self, max_j: u32) -> Self {
        self.max_j = max_j.max(1);
        self
    }

    /// Sets the Gaussian line width (standard deviation, cm^-1).
    pub fn with_line_sigma(mut self, sigma: f64) -> Self {
        self.line_sigma = sigma;
        self
    }

    /// Sets the absorbance of the strongest line.
    pub fn with_amplitude(mut self, amplitude: f64) -> Self {
        self.amplitude = amplitude;
        self
    }

    /// Sets the flat baseline absorbance.
    pub fn with_baseline(mut self, baseline: f64) -> Self {
        self.baseline = baseline;
        self
    }

    /// Enables the minor isotopologue: every line gains a twin offset by
    /// `shift` cm^-1 at `fraction` of its height.
    pub fn with_minor(mut self, shift: f64, fraction: f64) -> Self {
        self.minor_shift = shift;
        self.minor_fraction = fraction;
        self
    }

    /// Adds one free-standing Gaussian line.
    pub fn with_extra_line(mut self, center: f64, amplitude: f64) -> Self {
        self.extra_lines.push((center, amplitude));
        self
    }

    /// The molecular constants the band is built from.
    pub fn params(&self) -> &BandParams {
        &self.params
    }

    /// The vibrational transition the band models.
    pub fn order(&self) -> TransitionOrder {
        self.order
    }

    /// Major-species line centers for one branch, in descending
    /// wavenumber order.
    pub fn line_positions(&self, branch: Branch) -> Vec<f64> {
        let model = BandModel::new(branch, self.order);
        let js: Vec<u32> = match branch {
            Branch::R => (0..=self.max_j).rev().collect(),
            Branch::P => (1..=self.max_j).collect(),
        };
        js.iter()
            .map(|&j| model.nu(f64::from(j), &self.params))
            .collect()
    }

    /// Window bounds covering every major line with a margin.
    ///
    /// The low edge stops short of the minor twin of the last P line,
    /// which would otherwise survive filtering as the final candidate in
    /// the list. Assumes the minor species sits at lower wavenumber.
    pub fn suggested_window(&self) -> (f64, f64) {
        let r = self.line_positions(Branch::R);
        let p = self.line_positions(Branch::P);
        (r[0] + 5.0, p[p.len() - 1] - 2.0)
    }

    /// Renders the band on a descending grid from `hi` to `lo`.
    pub fn render(&self, hi: f64, lo: f64, step: f64) -> Result<Trace> {
        if hi <= lo || step <= 0.0 {
            return Err(RovibError::InvalidInput(format!(
                "synthetic grid needs hi > lo and step > 0, got hi = {}, lo = {}, step = {}",
                hi, lo, step
            )));
        }
        let n = ((hi - lo) / step).floor() as usize + 1;
        let wavenumber = Array1::from_shape_fn(n, |i| hi - step * i as f64);
        let lines = self.components();
        let two_sigma_sq = 2.0 * self.line_sigma * self.line_sigma;
        let absorption = wavenumber.mapv(|w| {
            self.baseline
                + lines
                    .iter()
                    .map(|&(center, height)| {
                        height * (-(w - center).powi(2) / two_sigma_sq).exp()
                    })
                    .sum::<f64>()
        });
        Trace::new(wavenumber, absorption)
    }

    /// All Gaussian components: major lines, minor twins, extras.
    fn components(&self) -> Vec<(f64, f64)> {
        let mut lines = Vec::new();
        for branch in [Branch::R, Branch::P] {
            let model = BandModel::new(branch, self.order);
            let js = match branch {
                Branch::R => 0..=self.max_j,
                Branch::P => 1..=self.max_j,
            };
            for j in js {
                let center = model.nu(f64::from(j), &self.params);
                let height = self.amplitude * self.envelope(j);
                lines.push((center, height));
                if self.minor_fraction > 0.0 {
                    lines.push((center + self.minor_shift, height * self.minor_fraction));
                }
            }
        }
        lines.extend(self.extra_lines.iter().copied());
        lines
    }

    /// Boltzmann population factor for lower state J, normalized so the
    /// strongest line has factor 1.
    fn envelope(&self, j: u32) -> f64 {
        let weight = |q: u32| {
            let q = f64::from(q);
            (2.0 * q + 1.0) * (-q * (q + 1.0) * self.params.b / ROOM_TEMPERATURE_KT).exp()
        };
        let max = (0..=self.max_j).map(weight).fold(0.0, f64::max);
        weight(j) / max
    }
}

/// Returns a copy of the trace with zero-mean Gaussian noise added to
/// the absorption channel.
pub fn add_noise<R: Rng + ?Sized>(trace: &Trace, sigma: f64, rng: &mut R) -> Result<Trace> {
    let normal = Normal::new(0.0, sigma).map_err(|e| {
        RovibError::InvalidInput(format!("invalid noise sigma {}: {}", sigma, e))
    })?;
    let absorption = trace.absorption().mapv(|a| a + normal.sample(rng));
    Trace::new(trace.wavenumber().clone(), absorption)
}
