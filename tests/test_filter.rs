mod common;
use common::array_std;
use eegtf::filter::{apply_fir_zero_phase, design_bandpass, design_highpass};
use eegtf::ContinuousSignal;
use ndarray::Array2;
use std::f64::consts::PI;

fn rms(x: &[f64]) -> f64 {
    (x.iter().map(|v| v * v).sum::<f64>() / x.len() as f64).sqrt()
}

// ── Coefficient tests ─────────────────────────────────────────────────────────

#[test]
fn highpass_coeffs_sum_near_zero() {
    // Highpass: sum of coefficients ≈ 0 (zero DC gain).
    let h = design_highpass(0.5, 256.0);
    let s: f64 = h.iter().sum();
    assert!(s.abs() < 1e-6, "sum(h) = {s:.2e}, expected ≈ 0 for highpass");
}

#[test]
fn bandpass_coeffs_symmetric_and_odd() {
    let h = design_bandpass(1.0, 45.0, 256.0);
    let n = h.len();
    assert_eq!(n % 2, 1, "zero-phase FIR needs an odd length, got {n}");
    for i in 0..n / 2 {
        let diff = (h[i] - h[n - 1 - i]).abs();
        assert!(diff < 1e-12, "h[{i}]={} ≠ h[{}]={}", h[i], n - 1 - i, h[n - 1 - i]);
    }
}

// ── Application tests ─────────────────────────────────────────────────────────

#[test]
fn highpass_removes_sub_hz_content() {
    // After highpass at 0.5 Hz, a 0.1 Hz sine should be heavily attenuated.
    let sfreq = 256.0;
    let n = 60 * 256;
    let row: Vec<f64> = (0..n)
        .map(|i| {
            let t = i as f64 / sfreq;
            (2.0 * PI * 0.1 * t).sin() + (2.0 * PI * 5.0 * t).sin()
        })
        .collect();
    let mut data = Array2::from_shape_vec((1, n), row).unwrap();
    let h = design_highpass(0.5, sfreq);
    apply_fir_zero_phase(&mut data, &h).unwrap();

    // Skip edges (transient region).
    let filtered = data.row(0).to_vec();
    let guard = h.len();
    let r = rms(&filtered[guard..n - guard]);
    // Pure 5 Hz sine has RMS = 1/sqrt(2) ≈ 0.707; 0.1 Hz mostly removed.
    assert!(r > 0.6, "RMS too low ({r:.3}), pass-band signal attenuated?");
    assert!(r < 0.8, "RMS too high ({r:.3}), stop-band not attenuated?");
}

#[test]
fn bandpass_keeps_alpha_and_drops_dc_and_gamma() {
    let sfreq = 256.0;
    let n = 20 * 256;
    let data = Array2::from_shape_fn((2, n), |(c, i)| {
        let t = i as f64 / sfreq;
        5.0 * (c + 1) as f64 + (2.0 * PI * 10.0 * t).sin() + (2.0 * PI * 80.0 * t).sin()
    });
    let signal = ContinuousSignal::with_default_names(data.clone(), sfreq).unwrap();
    let filtered = signal.filter(Some(1.0), Some(45.0)).unwrap();

    // The input is left untouched.
    assert_eq!(signal.data(), &data);

    let guard = design_bandpass(1.0, 45.0, sfreq).len();
    for c in 0..2 {
        let row = filtered.data().row(c).to_vec();
        let interior = &row[guard..n - guard];
        let mean = interior.iter().sum::<f64>() / interior.len() as f64;
        let r = rms(interior);
        assert!(mean.abs() < 0.01, "ch={c}: DC survived ({mean:.4})");
        assert!((r - 0.5f64.sqrt()).abs() < 0.02, "ch={c}: RMS {r:.4}, expected ≈ 0.707");
    }
}

#[test]
fn filter_preserves_shape_and_names() {
    let data = Array2::from_shape_fn((3, 2000), |(c, t)| ((c + 1) * t % 17) as f64);
    let signal = ContinuousSignal::new(
        data,
        200.0,
        vec!["Fz".into(), "Cz".into(), "Pz".into()],
    )
    .unwrap();
    let out = signal.filter(None, Some(30.0)).unwrap();
    assert_eq!(out.data().dim(), (3, 2000));
    assert_eq!(out.ch_names(), signal.ch_names());
    assert!(array_std(out.data()) < array_std(signal.data()));
}
