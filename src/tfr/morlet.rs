//! Complex Morlet wavelets.
//!
//! Matches `mne.time_frequency.morlet(sfreq, freqs, n_cycles, zero_mean)`:
//!
//! ```text
//! σ_t  = n_cycles / (2π f)
//! t    = k / sfreq,   k ∈ (-K, K),  K = ceil(5 σ_t sfreq)
//! W(t) = exp(2iπ f t) · exp(-t² / 2σ_t²)
//! W   /= sqrt(0.5) · ‖W‖₂
//! ```
use std::f64::consts::PI;

use rustfft::num_complex::Complex;

/// Gaussian support in standard deviations on each side of the centre.
const SUPPORT_SIGMAS: f64 = 5.0;

/// Temporal standard deviation (s) of the Gaussian envelope.
pub fn sigma_t(freq: f64, n_cycles: f64) -> f64 {
    n_cycles / (2.0 * PI * freq)
}

/// Number of samples of the wavelet for `freq` at `sfreq`; always odd.
pub fn wavelet_len(sfreq: f64, freq: f64, n_cycles: f64) -> usize {
    2 * half_len(sfreq, freq, n_cycles) - 1
}

/// Samples from the centre (inclusive) to one edge.
fn half_len(sfreq: f64, freq: f64, n_cycles: f64) -> usize {
    ((SUPPORT_SIGMAS * sigma_t(freq, n_cycles) * sfreq).ceil() as usize).max(1)
}

/// Build the complex Morlet wavelet for one frequency.
///
/// With `zero_mean` the Gaussian-weighted DC offset is removed from the
/// oscillation so the wavelet integrates to (approximately) zero.
pub fn morlet(sfreq: f64, freq: f64, n_cycles: f64, zero_mean: bool) -> Vec<Complex<f64>> {
    let sigma = sigma_t(freq, n_cycles);
    let half = half_len(sfreq, freq, n_cycles) as i64;
    let dc = if zero_mean { (-2.0 * (PI * freq * sigma).powi(2)).exp() } else { 0.0 };

    let mut w: Vec<Complex<f64>> = (1 - half..half)
        .map(|k| {
            let t = k as f64 / sfreq;
            let osc = Complex::from_polar(1.0, 2.0 * PI * freq * t) - dc;
            osc * (-(t * t) / (2.0 * sigma * sigma)).exp()
        })
        .collect();

    let norm = w.iter().map(|z| z.norm_sqr()).sum::<f64>().sqrt() * 0.5_f64.sqrt();
    w.iter_mut().for_each(|z| *z /= norm);
    w
}
