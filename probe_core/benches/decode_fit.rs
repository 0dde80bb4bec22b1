use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use probe_core::calibration::{CalibrationPoint, fit};
use probe_core::config::ScaleHypothesis;
use probe_core::decode;
use probe_core::sampler::trimmed_mean;

// Synthetic raw counts: slow drift with additive noise
fn synth_counts(n: usize, noise_amp: f64, seed: u32) -> Vec<f64> {
    // tiny PRNG
    let mut state = seed.max(1);
    let mut next_f64 = || {
        let mut x = state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        state = x;
        f64::from(x) / (f64::from(u32::MAX) + 1.0)
    };
    (0..n)
        .map(|i| 400.0 + (i as f64 / 200.0).sin() * 3.0 + (next_f64() * 2.0 - 1.0) * noise_amp)
        .collect()
}

pub fn bench_decode(c: &mut Criterion) {
    let scales = [
        ScaleHypothesis::new("per_1", 1.0),
        ScaleHypothesis::new("per_5", 5.0),
        ScaleHypothesis::new("per_10", 10.0),
        ScaleHypothesis::new("per_16", 16.0),
    ];
    c.bench_function("decode_4_scales", |b| {
        b.iter(|| decode(black_box(0x01), black_box(0x90), &scales, 70.0, 12.0))
    });
}

pub fn bench_trimmed_mean(c: &mut Criterion) {
    let counts = synth_counts(1000, 5.0, 0xC0FFEE);
    c.bench_function("trimmed_mean_1000_trim_100", |b| {
        b.iter_batched(
            || counts.clone(),
            |mut v| trimmed_mean(black_box(&mut v), 100),
            BatchSize::SmallInput,
        )
    });
}

pub fn bench_fit(c: &mut Criterion) {
    let counts = synth_counts(64, 0.5, 7);
    let pts: Vec<_> = counts
        .iter()
        .enumerate()
        .map(|(i, &raw)| CalibrationPoint::new(raw + i as f64 * 10.0, i as f64))
        .collect();
    c.bench_function("fit_64_points", |b| b.iter(|| fit(black_box(&pts))));
}

criterion_group!(benches, bench_decode, bench_trimmed_mean, bench_fit);
criterion_main!(benches);
