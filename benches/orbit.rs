use criterion::{black_box, criterion_group, criterion_main, Criterion};
use num::Complex;

use buddhabrot::orbit::{escape_time, Trajectory};
use buddhabrot::planes::{BoundingBox, PlaneMapper};
use buddhabrot::seed::SeedStrategy;
use buddhabrot::tracer::{SamplingLimits, Tracer};

fn bench_escape_time(c: &mut Criterion) {
    let mut trajectory = Trajectory::new(1000);
    c.bench_function("escape_time border point", move |b| {
        b.iter(|| escape_time(black_box(Complex::new(-0.7454, 0.1130)), 1000, &mut trajectory))
    });
}

fn bench_adaptive_session(c: &mut Criterion) {
    let plane = PlaneMapper::square(256).unwrap();
    let limits = SamplingLimits {
        iterations: 500,
        max_samples: 48,
    };
    let bb = BoundingBox::new(-0.76, -0.74, 0.10, 0.12);
    c.bench_function("adaptive session on the border", move |b| {
        let mut tracer = Tracer::new(&plane, limits, SeedStrategy::Fixed(1).rng_for(0));
        b.iter(|| tracer.sample_adaptive(black_box(&bb)))
    });
}

criterion_group!(benches, bench_escape_time, bench_adaptive_session);
criterion_main!(benches);
