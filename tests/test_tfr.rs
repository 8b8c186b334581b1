mod common;
use eegtf::tfr::band_power;
use eegtf::{
    estimate, Baseline, BaselineMode, EpochSet, Error, Event, NCycles, TfrParams, TfrPower,
};
use ndarray::Array3;
use std::f64::consts::PI;

/// `n_e` epochs × `n_c` channels of a `freq` Hz sine over `[tmin, tmin + (n_t-1)/sfreq]`;
/// epoch `e` is shifted by `phase(e)` radians.
fn sine_epochs(
    n_e: usize,
    n_c: usize,
    n_t: usize,
    sfreq: f64,
    tmin: f64,
    freq: f64,
    phase: impl Fn(usize) -> f64,
) -> EpochSet {
    let times: Vec<f64> = (0..n_t).map(|t| tmin + t as f64 / sfreq).collect();
    let data = Array3::from_shape_fn((n_e, n_c, n_t), |(e, _, t)| {
        (2.0 * PI * freq * times[t] + phase(e)).sin()
    });
    let ch_names = (0..n_c).map(|c| format!("EEG {c:03}")).collect();
    let events = (0..n_e).map(|e| Event::new(500 + 200 * e, common::TARGET)).collect();
    EpochSet::from_parts(data, times, sfreq, ch_names, events).unwrap()
}

fn tutorial_epochs(n_e: usize) -> EpochSet {
    // 61 samples at 100 Hz: -0.2 … 0.4 s.
    sine_epochs(n_e, 2, 61, 100.0, -0.2, 10.0, |e| e as f64 * 0.3)
}

fn params(freqs: &[f64]) -> TfrParams {
    TfrParams { freqs: freqs.to_vec(), ..TfrParams::default() }
}

// ── Error paths ──────────────────────────────────────────────────────────────

#[test]
fn empty_epoch_set_is_rejected() {
    let empty = tutorial_epochs(3).select(&[]).unwrap();
    assert!(matches!(estimate(&empty, &params(&[6.0])), Err(Error::EmptyEpochSet)));
}

#[test]
fn freqs_below_nyquist_accepted() {
    let tfr = estimate(&tutorial_epochs(3), &params(&[6.0, 35.0])).unwrap();
    assert_eq!(tfr.freqs(), &[6.0, 35.0]);
}

#[test]
fn freq_above_nyquist_rejected() {
    match estimate(&tutorial_epochs(3), &params(&[60.0])) {
        Err(Error::InvalidFrequency { freq, nyquist }) => {
            assert_eq!(freq, 60.0);
            assert_eq!(nyquist, 50.0);
        }
        other => panic!("expected InvalidFrequency, got {other:?}"),
    }
}

#[test]
fn wavelet_longer_than_epoch_rejected() {
    // 1 Hz with 2 cycles needs far more than 61 samples at 100 Hz.
    assert!(matches!(
        estimate(&tutorial_epochs(3), &params(&[1.0])),
        Err(Error::WaveletTooLong { .. })
    ));
}

#[test]
fn itc_without_average_rejected() {
    let p = TfrParams { average: false, return_itc: true, ..params(&[10.0]) };
    assert!(matches!(estimate(&tutorial_epochs(3), &p), Err(Error::InvalidParameter(_))));
}

// ── Shapes and axes ──────────────────────────────────────────────────────────

#[test]
fn decimated_time_axis() {
    let tfr = estimate(&tutorial_epochs(4), &params(&[6.0, 10.0, 35.0])).unwrap();
    // ceil(61 / 3) = 21 samples, starting at the first epoch sample.
    assert_eq!(tfr.times().len(), 21);
    approx::assert_abs_diff_eq!(tfr.times()[0], -0.2, epsilon = 1e-12);
    approx::assert_abs_diff_eq!(tfr.times()[1] - tfr.times()[0], 0.03, epsilon = 1e-12);
    assert_eq!(tfr.average_power().unwrap().dim(), (2, 3, 21));
    assert_eq!(tfr.itc().unwrap().dim(), (2, 3, 21));
    assert_eq!(tfr.nave(), 4);
}

#[test]
fn per_epoch_power_is_four_dimensional() {
    let p = TfrParams { average: false, return_itc: false, decim: 1, ..params(&[10.0, 20.0]) };
    let tfr = estimate(&tutorial_epochs(5), &p).unwrap();
    match tfr.power() {
        TfrPower::Epochs(pw) => assert_eq!(pw.dim(), (5, 2, 2, 61)),
        TfrPower::Average(_) => panic!("expected per-epoch power"),
    }
    assert!(tfr.itc().is_none());
}

#[test]
fn per_epoch_power_averages_to_average_power() {
    let set = tutorial_epochs(5);
    let freqs = [8.0, 12.0];
    let avg = estimate(&set, &TfrParams { return_itc: false, ..params(&freqs) }).unwrap();
    let per = estimate(&set, &TfrParams { return_itc: false, average: false, ..params(&freqs) })
        .unwrap();
    let mean = per.epochs_power().unwrap().mean_axis(ndarray::Axis(0)).unwrap();
    let diff = common::max_abs_diff(&mean, avg.average_power().unwrap());
    assert!(diff < 1e-9, "mean of per-epoch power differs by {diff:.2e}");
}

#[test]
fn unsorted_freqs_are_sorted_with_their_cycles() {
    let p = TfrParams {
        freqs: vec![35.0, 6.0, 12.0],
        n_cycles: NCycles::PerFreq(vec![4.0, 2.0, 3.0]),
        ..TfrParams::default()
    };
    let tfr = estimate(&tutorial_epochs(2), &p).unwrap();
    assert_eq!(tfr.freqs(), &[6.0, 12.0, 35.0]);
    assert_eq!(tfr.n_cycles(), &[2.0, 3.0, 4.0]);
}

// ── Values ───────────────────────────────────────────────────────────────────

#[test]
fn itc_is_bounded() {
    let tfr = estimate(&tutorial_epochs(6), &params(&[6.0, 10.0, 20.0, 35.0])).unwrap();
    for &v in tfr.itc().unwrap() {
        assert!((0.0..=1.0).contains(&v), "ITC {v} outside [0, 1]");
    }
}

#[test]
fn phase_locked_trials_have_unit_itc() {
    let set = sine_epochs(8, 1, 101, 100.0, -0.5, 10.0, |_| 0.0);
    let tfr = estimate(&set, &TfrParams { decim: 1, ..params(&[10.0]) }).unwrap();
    let itc = tfr.itc().unwrap();
    for t in 0..101 {
        approx::assert_abs_diff_eq!(itc[[0, 0, t]], 1.0, epsilon = 1e-9);
    }
}

#[test]
fn spread_phases_have_low_itc() {
    let n_e = 8;
    let set = sine_epochs(n_e, 1, 101, 100.0, -0.5, 10.0, |e| 2.0 * PI * e as f64 / n_e as f64);
    let tfr = estimate(&set, &TfrParams { decim: 1, ..params(&[10.0]) }).unwrap();
    let centre = tfr.itc().unwrap()[[0, 0, 50]];
    assert!(centre < 0.05, "ITC at centre = {centre}, expected ≈ 0");
}

#[test]
fn power_peaks_at_signal_frequency() {
    let set = sine_epochs(4, 1, 101, 100.0, -0.5, 10.0, |e| e as f64);
    let p = TfrParams { decim: 1, n_cycles: NCycles::Fixed(3.0), ..params(&[5.0, 10.0, 20.0, 30.0]) };
    let tfr = estimate(&set, &p).unwrap();
    let power = tfr.channel_power("EEG 000").unwrap();
    let col = power.column(50);
    let (best, _) = col
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .unwrap();
    assert_eq!(tfr.freqs()[best], 10.0, "power at centre: {col:?}");
}

#[test]
fn rejected_subset_is_accepted_unchanged() {
    let set = tutorial_epochs(6);
    let subset = set.select(&[0, 2, 5]).unwrap();
    let tfr = estimate(&subset, &params(&[6.0, 35.0])).unwrap();
    assert_eq!(tfr.nave(), 3);
    assert_eq!(tfr.ch_names(), set.ch_names());
}

// ── Baseline rescaling and band power ────────────────────────────────────────

#[test]
fn mean_baseline_zeroes_interval() {
    let tfr = estimate(&tutorial_epochs(4), &TfrParams { decim: 1, ..params(&[10.0, 20.0]) })
        .unwrap();
    let b = Baseline::new(Some(-0.2), Some(0.0));
    let rescaled = tfr.apply_baseline(b, BaselineMode::Mean).unwrap();
    let p = rescaled.average_power().unwrap();
    // t = -0.2 … 0.0 → samples 0..=20.
    for c in 0..2 {
        for f in 0..2 {
            let m: f64 = (0..=20).map(|t| p[[c, f, t]]).sum::<f64>() / 21.0;
            assert!(m.abs() < 1e-9, "ch={c} f={f} baseline mean {m:.2e}");
        }
    }
    assert_eq!(rescaled.baseline(), Some((b, BaselineMode::Mean)));
    // ITC is not rescaled.
    assert_eq!(rescaled.itc(), tfr.itc());
}

#[test]
fn band_power_averages_selected_freqs() {
    let tfr = estimate(&tutorial_epochs(3), &params(&[6.0, 10.0, 35.0])).unwrap();
    let band = band_power(&tfr, 5.0, 11.0).unwrap();
    let p = tfr.average_power().unwrap();
    assert_eq!(band.dim(), (2, 21));
    approx::assert_abs_diff_eq!(band[[1, 7]], (p[[1, 0, 7]] + p[[1, 1, 7]]) / 2.0, epsilon = 1e-12);
    assert!(band_power(&tfr, 40.0, 45.0).is_err());
}
