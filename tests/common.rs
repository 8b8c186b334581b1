/// Shared synthetic-data builders for the integration tests.
use eegtf::{ContinuousSignal, Event};
use ndarray::{Array, Array2, Dimension};
use std::f64::consts::PI;

pub const TARGET: &str = "33273";

#[allow(unused)]
/// `n_ch` channels of `dur` seconds; every channel carries a phase-locked
/// `freq` Hz burst of amplitude `amp` lasting `burst` seconds after each onset
/// in `onsets`, over a small deterministic background.
pub fn burst_signal(
    n_ch: usize,
    sfreq: f64,
    dur: f64,
    freq: f64,
    amp: f64,
    burst: f64,
    onsets: &[usize],
) -> ContinuousSignal {
    let n_t = (dur * sfreq).round() as usize;
    let mut data = Array2::from_shape_fn((n_ch, n_t), |(c, t)| {
        0.05 * (((c * 7919 + t * 104_729) % 1000) as f64 / 1000.0 - 0.5)
    });
    let n_burst = (burst * sfreq).round() as usize;
    for &s in onsets {
        for k in 0..n_burst.min(n_t.saturating_sub(s)) {
            let v = amp * (2.0 * PI * freq * k as f64 / sfreq).sin();
            data.column_mut(s + k).mapv_inplace(|x| x + v);
        }
    }
    ContinuousSignal::with_default_names(data, sfreq).unwrap()
}

#[allow(unused)]
/// Target events every `every` samples from `first`, stopping before `n_times`,
/// interleaved with a distractor label one sample later.
pub fn target_events(first: usize, every: usize, n_times: usize) -> Vec<Event> {
    (first..n_times)
        .step_by(every)
        .flat_map(|s| [Event::new(s, TARGET), Event::new(s + 1, "distractor")])
        .collect()
}

#[allow(unused)]
pub fn max_abs_diff<D: Dimension>(a: &Array<f64, D>, b: &Array<f64, D>) -> f64 {
    assert_eq!(a.shape(), b.shape(), "shape mismatch");
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).fold(0.0, f64::max)
}

#[allow(unused)]
pub fn array_std<D: Dimension>(a: &Array<f64, D>) -> f64 {
    let n = a.len() as f64;
    let mean = a.sum() / n;
    (a.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}
