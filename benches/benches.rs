use std::path::Path;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lockin_scan::{
    checkpoint::estimate_duration, config::BatchFile, sweep::Step, FrequencyAxis, SweepState,
};
use rand::prelude::*;

const POINTS: usize = 4096;

fn batch_text(windows: usize) -> String {
    (0..windows)
        .map(|i| {
            format!(
                "[[entry]]\nstart_mhz = {}.0\nstop_mhz = {}.0\nstep_mhz = 0.25\naverages = 8\n\
                 sensitivity = 17\ntime_constant = 4\nintegration_ms = 60\nsettle_ms = 10\n",
                30000 + 100 * i,
                30050 + 100 * i
            )
        })
        .collect()
}

fn benchmark(c: &mut Criterion) {
    let mut rng = rand::thread_rng();
    let mut readings = vec![0f64; POINTS];
    readings.iter_mut().for_each(|r| *r = rng.gen());

    c.bench_function("axis generation", |b| {
        b.iter(|| FrequencyAxis::generate(black_box(30000.0), black_box(31023.75), black_box(0.25)))
    });

    let mut sweep = SweepState::new(POINTS);
    c.bench_function("zig-zag sweep", |b| {
        b.iter(|| loop {
            sweep.record(black_box(readings[sweep.index()]));
            if sweep.advance() == Step::SweepDone {
                break;
            }
        })
    });

    let batch = BatchFile::parse(&batch_text(64), Path::new("bench.toml")).unwrap();
    c.bench_function("batch estimate", |b| {
        b.iter(|| estimate_duration(black_box(&batch.entries)))
    });
}

criterion_group!(benches, benchmark);
criterion_main!(benches);
