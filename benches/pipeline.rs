//! Benchmark the per-frame tracking pipeline.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use drishti_track::{PolarSample, TrackingConfig, TrackingEngine};

/// Room scan with two people walking through it.
fn scan_with_people(num_points: usize, t: u32) -> Vec<PolarSample> {
    let step = 360.0 / num_points as f32;
    let mut scan: Vec<PolarSample> = (0..num_points)
        .map(|i| PolarSample::new(i as f32 * step, 5000.0))
        .collect();

    let phase = t as f32 * 0.2;
    for (center_deg, range_mm) in [
        (90.0 + 20.0 * phase.sin(), 2000.0),
        (270.0 - 15.0 * phase.cos(), 3000.0),
    ] {
        for i in 0..12 {
            scan.push(PolarSample::new(
                center_deg - 3.0 + i as f32 * 0.5,
                range_mm + (i % 3) as f32 * 10.0,
            ));
        }
    }
    scan
}

fn learned_engine(num_points: usize) -> TrackingEngine {
    let mut engine = TrackingEngine::new(TrackingConfig::default()).unwrap();
    for t in 0..30 {
        engine.process_scan(scan_with_people(num_points, t));
    }
    engine
}

fn bench_process_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("process_scan");

    for num_points in [360usize, 720, 1440] {
        group.bench_with_input(
            BenchmarkId::from_parameter(num_points),
            &num_points,
            |b, &n| {
                let mut engine = learned_engine(n);
                let mut t = 30u32;
                b.iter(|| {
                    t += 1;
                    let frame = engine.process_scan(black_box(scan_with_people(n, t)));
                    black_box(frame)
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_process_scan);
criterion_main!(benches);
