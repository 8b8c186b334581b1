use std::f64::consts::PI;
use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use eegtf::{estimate, EpochSet, Event, TfrParams};
use ndarray::Array3;

/// 60 epochs × 32 channels × 615 samples at 1024 Hz, a 10 Hz burst in each.
fn synthetic_epochs() -> EpochSet {
    let (n_e, n_c, n_t, sfreq) = (60, 32, 615, 1024.0);
    let data = Array3::from_shape_fn((n_e, n_c, n_t), |(e, c, t)| {
        let time = t as f64 / sfreq - 0.2;
        (2.0 * PI * 10.0 * time + 0.1 * c as f64).sin() + 0.01 * ((e * 31 + t * 7) % 13) as f64
    });
    let times = (0..n_t).map(|t| t as f64 / sfreq - 0.2).collect();
    let ch_names = (0..n_c).map(|c| format!("EEG {c:03}")).collect();
    let events = (0..n_e).map(|e| Event::new(1000 + e * 2000, "33273")).collect();
    EpochSet::from_parts(data, times, sfreq, ch_names, events).unwrap()
}

fn bench_estimate(c: &mut Criterion) {
    let epochs = synthetic_epochs();
    let params = TfrParams::default();
    c.bench_function("estimate 60×32×615, 10 freqs, decim 3", |b| {
        b.iter(|| {
            let tfr = estimate(black_box(&epochs), &params).unwrap();
            black_box(tfr.times().len())
        })
    });
}

fn bench_estimate_no_itc(c: &mut Criterion) {
    let epochs = synthetic_epochs();
    let params = TfrParams { return_itc: false, decim: 1, ..TfrParams::default() };
    c.bench_function("estimate power only, decim 1", |b| {
        b.iter(|| {
            let tfr = estimate(black_box(&epochs), &params).unwrap();
            black_box(tfr.freqs().len())
        })
    });
}

criterion_group!(benches, bench_estimate, bench_estimate_no_itc);
criterion_main!(benches);
