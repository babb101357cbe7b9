use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use estrannaise::prelude::simulator::*;
use estrannaise::*;
use std::hint::black_box;

/// A year of weekly injections
fn weekly_schedule(formulation: Formulation) -> DoseSeries {
    DoseSeries::builder()
        .dose(0.0, 5.0, formulation)
        .repeat(51, 7.0)
        .build()
}

fn superposition_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("Superposition");

    for formulation in [Formulation::EvIm, Formulation::EUnCasubq, Formulation::PatchTw] {
        let series = weekly_schedule(formulation);
        group.bench_with_input(
            BenchmarkId::new("Single time point", formulation.tag()),
            &series,
            |b, s| b.iter(|| black_box(s.concentration(black_box(200.5)))),
        );
    }

    let series = weekly_schedule(Formulation::EvIm);
    let options = CurveOptions::default();
    group.bench_with_input(
        BenchmarkId::new("Curve", "365 days, 6h steps"),
        &series,
        |b, s| b.iter(|| black_box(s.sample(&options, 0.0, 365.0).unwrap())),
    );

    let times = time_grid(0.0, 365.0, 1.0).unwrap();
    group.bench_with_input(
        BenchmarkId::new("Contribution matrix", "365 days"),
        &series,
        |b, s| b.iter(|| black_box(s.contributions(&times))),
    );

    group.finish();
}

fn steady_state_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("Steady state");
    let p = Formulation::EcIm.parameters();

    group.bench_function("Closed form", |b| {
        b.iter(|| black_box(steady_state(black_box(3.3), 5.0, 7.0, p)))
    });

    let doses = vec![5.0; 200];
    let times: Vec<f64> = (0..200).map(|i| i as f64 * 7.0).collect();
    let formulations = vec![Formulation::EcIm; 200];
    group.bench_function("200 summed doses", |b| {
        b.iter(|| {
            black_box(multidose(
                black_box(1393.3),
                &doses,
                &times,
                &formulations,
                1.0,
                TimeMode::Absolute,
            ))
        })
    });

    group.finish();
}

criterion_group!(benches, superposition_benchmark, steady_state_benchmark);
criterion_main!(benches);
