//! Benchmarks for peak detection and branch model fitting.
//!
//! Times the two analysis stages separately and then the combined window
//! pipeline, on a synthetic HCl fundamental band.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rovib_rs::{
    analyze_window, BandModel, BandParams, Branch, BranchModelFitter, PeakDetector, SyntheticBand,
    Trace, TransitionOrder, TransitionWindow,
};

fn hcl_fundamental() -> SyntheticBand {
    SyntheticBand::new(
        BandParams::new(0.3, 10.59, 2886.0, 0.0005),
        TransitionOrder::Fundamental,
    )
    .with_minor(-4.0, 1.0 / 3.0)
}

fn rendered(step: f64) -> Trace {
    let band = hcl_fundamental();
    let (hi, lo) = band.suggested_window();
    band.render(hi, lo, step).unwrap()
}

fn bench_peak_detection(c: &mut Criterion) {
    let detector = PeakDetector::new();

    let mut group = c.benchmark_group("peak_detection");
    for step in [0.25, 0.125, 0.0625] {
        let trace = rendered(step);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("step_{step}")),
            &trace,
            |b, trace| b.iter(|| detector.detect(black_box(trace)).unwrap()),
        );
    }
    group.finish();
}

fn bench_branch_fit(c: &mut Criterion) {
    let trace = rendered(0.125);
    let detection = PeakDetector::new().detect(&trace).unwrap();
    let (j, nu) = detection.branch_data(Branch::R);

    let fitter = BranchModelFitter::new();
    let model = BandModel::new(Branch::R, TransitionOrder::Fundamental);

    c.bench_function("fit_r_branch", |b| {
        b.iter(|| fitter.fit(model, black_box(&j), black_box(&nu)).unwrap())
    });
}

fn bench_window_analysis(c: &mut Criterion) {
    let band = hcl_fundamental();
    let (hi, lo) = band.suggested_window();
    let trace = band.render(hi, lo, 0.125).unwrap();
    let window =
        TransitionWindow::new("hcl-fundamental", "HCl", hi, lo, TransitionOrder::Fundamental);

    let detector = PeakDetector::new();
    let fitter = BranchModelFitter::new();

    c.bench_function("analyze_window", |b| {
        b.iter(|| analyze_window(black_box(&trace), &window, &detector, &fitter).unwrap())
    });
}

criterion_group!(
    benches,
    bench_peak_detection,
    bench_branch_fit,
    bench_window_analysis
);
criterion_main!(benches);
