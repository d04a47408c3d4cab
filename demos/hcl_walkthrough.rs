//! Walkthrough of a complete HCl/DCl rotation-vibration analysis.
//!
//! Builds a synthetic survey scan holding four bands (the fundamental and
//! first overtone of both HCl and DCl), detects and assigns the lines in
//! each, fits the branch models, and writes annotated plots plus a JSON
//! report into the system temp directory.
//!
//! Run with:
//!
//! ```bash
//! cargo run --example hcl_walkthrough
//! ```

use ndarray::Array1;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use rovib_rs::synthetic::add_noise;
use rovib_rs::{
    analyze_windows, annotate_detection, plot_branch_fit, BandParams, Branch, BranchModelFitter,
    DetectionMode, PeakDetector, Result, SvgCanvas, SyntheticBand, Trace, TransitionOrder,
    TransitionWindow, WindowAnalysis,
};

const GRID_STEP: f64 = 0.125;

fn main() -> Result<()> {
    env_logger::init();

    println!("HCl/DCl rotation-vibration walkthrough");
    println!("======================================\n");

    // 1. Synthesize a survey scan.
    //
    // Literature-grade constants for the four bands. The HCl bands carry
    // the natural-abundance H(37)Cl twin lines at one third amplitude; the
    // DCl bands are rendered for the major isotopologue only.
    let hcl_fundamental = SyntheticBand::new(
        BandParams::new(0.3, 10.59, 2886.0, 5.0e-4),
        TransitionOrder::Fundamental,
    )
    .with_minor(-4.0, 1.0 / 3.0);
    let hcl_overtone = SyntheticBand::new(
        BandParams::new(0.3, 10.59, 5668.0, 5.0e-4),
        TransitionOrder::FirstOvertone,
    )
    .with_minor(-4.0, 1.0 / 3.0);
    let dcl_fundamental = SyntheticBand::new(
        BandParams::new(0.11, 5.28, 2091.0, 1.4e-4),
        TransitionOrder::Fundamental,
    );
    let dcl_overtone = SyntheticBand::new(
        BandParams::new(0.11, 5.28, 4128.0, 1.4e-4),
        TransitionOrder::FirstOvertone,
    );

    // Instrument order: descending wavenumber across the whole scan.
    let band_sequence = [
        &hcl_overtone,
        &dcl_overtone,
        &hcl_fundamental,
        &dcl_fundamental,
    ];
    let mut pieces = Vec::new();
    for band in band_sequence {
        let (hi, lo) = band.suggested_window();
        pieces.push(band.render(hi, lo, GRID_STEP)?);
    }
    let survey = concat_traces(&pieces)?;

    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let survey = add_noise(&survey, 0.002, &mut rng)?;
    println!(
        "Survey scan: {} samples, {:.1} to {:.1} cm^-1\n",
        survey.len(),
        survey.wavenumber()[0],
        survey.wavenumber()[survey.len() - 1]
    );

    // 2. Analyze the HCl windows with automatic detection.
    //
    // The isotope-aware heuristics assume the Cl-37 twins are present, so
    // they are the right tool for the HCl bands.
    let fitter = BranchModelFitter::new();
    let automatic = PeakDetector::new();

    let hcl_windows = vec![
        window_for(&hcl_overtone, "hcl-overtone", "HCl"),
        window_for(&hcl_fundamental, "hcl-fundamental", "HCl"),
    ];
    let hcl_results = analyze_windows(&survey, &hcl_windows, &automatic, &fitter);

    println!("HCl windows (automatic detection)");
    println!("---------------------------------");
    report(&hcl_windows, &hcl_results);

    // 3. Analyze the DCl windows in manual mode.
    //
    // DCl's shallow Boltzmann envelope leaves R(0) faint, which defeats
    // the anchor heuristics; a plain height/spacing cut is more reliable.
    let manual = PeakDetector::new().with_mode(DetectionMode::Manual {
        height: Some(0.1),
        distance: 40,
    });

    let dcl_windows = vec![
        window_for(&dcl_overtone, "dcl-overtone", "DCl"),
        window_for(&dcl_fundamental, "dcl-fundamental", "DCl"),
    ];
    let dcl_results = analyze_windows(&survey, &dcl_windows, &manual, &fitter);

    println!("DCl windows (manual detection)");
    println!("------------------------------");
    report(&dcl_windows, &dcl_results);

    // 4. Plot the HCl fundamental: annotated spectrum plus one branch fit.
    let out_dir = std::env::temp_dir();
    if let Some(Ok(analysis)) = hcl_results.last().map(|r| r.as_ref()) {
        let windowed = survey.window(analysis.window.hi, analysis.window.lo)?;

        let mut canvas = SvgCanvas::new(analysis.window.title());
        canvas.draw_trace(&windowed);
        annotate_detection(&mut canvas, &windowed, &analysis.detection);
        let spectrum_path = out_dir.join("hcl_fundamental_detection.svg");
        canvas.render_svg(&spectrum_path, 900, 540)?;
        println!("Annotated spectrum: {}", spectrum_path.display());

        let (j, nu) = analysis.detection.branch_data(Branch::R);
        let fit_path = out_dir.join("hcl_fundamental_r_fit.svg");
        plot_branch_fit(
            &fit_path,
            &analysis.r_fit,
            &j,
            &nu,
            &analysis.window.title(),
        )?;
        println!("R-branch fit:       {}", fit_path.display());
    }

    // 5. Dump every successful analysis as JSON.
    let analyses: Vec<&WindowAnalysis> = hcl_results
        .iter()
        .chain(dcl_results.iter())
        .filter_map(|r| r.as_ref().ok())
        .collect();
    let report_path = out_dir.join("rovib_report.json");
    std::fs::write(&report_path, serde_json::to_string_pretty(&analyses)?)?;
    println!("JSON report:        {}", report_path.display());

    Ok(())
}

/// Window that spans one band's suggested analysis range.
fn window_for(band: &SyntheticBand, label: &str, compound: &str) -> TransitionWindow {
    let (hi, lo) = band.suggested_window();
    TransitionWindow::new(label, compound, hi, lo, band.order())
}

/// Joins per-band traces into one descending survey scan.
fn concat_traces(pieces: &[Trace]) -> Result<Trace> {
    let wavenumber: Array1<f64> = pieces
        .iter()
        .flat_map(|t| t.wavenumber().iter().copied())
        .collect();
    let absorption: Array1<f64> = pieces
        .iter()
        .flat_map(|t| t.absorption().iter().copied())
        .collect();
    Trace::new(wavenumber, absorption)
}

fn report(windows: &[TransitionWindow], results: &[Result<WindowAnalysis>]) {
    for (window, result) in windows.iter().zip(results) {
        match result {
            Ok(analysis) => println!("{}\n", analysis.summary()),
            Err(err) => println!("{}: analysis failed: {}\n", window.label, err),
        }
    }
}
