//! # rovib-rs
//!
//! `rovib-rs` analyzes ro-vibrational infrared absorption spectra of
//! diatomic hydrogen halides (HCl, DCl), from raw instrument trace to
//! molecular constants with uncertainties.
//!
//! The library provides:
//! - Isotope-aware peak detection: candidate lines screened by height and
//!   prominence, with the weaker Cl-37 twins filtered out
//! - Branch splitting at the band origin and rotational quantum number
//!   assignment
//! - Levenberg-Marquardt fits of the branch models (P and R, fundamental
//!   and first overtone) with analytic Jacobians and standard errors from
//!   the scaled covariance
//! - Parallel batch analysis of several transition windows, CSV spectrum
//!   ingestion, and SVG rendering through a write-only canvas
//!
//! ## Basic Usage
//!
//! ```
//! use rovib_rs::{
//!     analyze_window, BandParams, BranchModelFitter, PeakDetector, SyntheticBand,
//!     TransitionOrder, TransitionWindow,
//! };
//!
//! # fn main() -> rovib_rs::Result<()> {
//! // Synthesize an HCl fundamental band in place of an instrument file.
//! let band = SyntheticBand::new(
//!     BandParams::new(0.3, 10.59, 2886.0, 0.0005),
//!     TransitionOrder::Fundamental,
//! )
//! .with_minor(-4.0, 1.0 / 3.0);
//! let (hi, lo) = band.suggested_window();
//! let trace = band.render(hi, lo, 0.125)?;
//!
//! let window = TransitionWindow::new("hcl-fund", "HCl", hi, lo, TransitionOrder::Fundamental);
//! let analysis = analyze_window(
//!     &trace,
//!     &window,
//!     &PeakDetector::new(),
//!     &BranchModelFitter::new(),
//! )?;
//! println!("{}", analysis.summary());
//! # Ok(())
//! # }
//! ```

// Public modules
pub mod error;

// Core data model
pub mod band;
pub mod trace;

// Peak detection
pub mod peaks;

// Model fitting
pub mod fit;
pub mod lm;
pub mod problem;
pub mod uncertainty;

mod utils;

// Ingestion, presentation and batch analysis
pub mod annotate;
pub mod batch;
pub mod ingest;
pub mod plot;
pub mod synthetic;

// Re-exports for convenience
pub use annotate::{annotate_detection, NullCanvas, RecordingCanvas, SpectrumCanvas};
pub use band::{BandModel, BandParams, Branch, TransitionOrder};
pub use batch::{analyze_window, analyze_windows, TransitionWindow, WindowAnalysis};
pub use error::{Result, RovibError};
pub use fit::{BandFit, BranchModelFitter, FitConfig};
pub use ingest::read_spectrum;
pub use lm::{LevenbergMarquardt, LmConfig, LmResult};
pub use peaks::{Detection, DetectionMode, DetectorConfig, Peak, PeakDetector};
pub use plot::{format_title, plot_branch_fit, SvgCanvas};
pub use problem::Problem;
pub use synthetic::SyntheticBand;
pub use trace::Trace;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
