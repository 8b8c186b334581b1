//! FIR filter design matching MNE / `scipy.signal.firwin`.
//!
//! For a cutoff at `f` Hz with sampling rate `sfreq`:
//!   • high-pass transition bandwidth = min(max(0.25 * f, 2.0), f)
//!   • low-pass transition bandwidth  = min(max(0.25 * f, 2.0), nyq - f)
//!   • filter length N = ceil(3.3 / min(trans_bw) * sfreq), rounded to odd
//!   • each transition contributes a Hamming-windowed sinc step of its own
//!     length, centred in the N-tap kernel
use std::f64::consts::PI;

use crate::error::{Error, Result};

/// Hamming window main-lobe length factor used by MNE's `filter_length='auto'`.
const HAMMING_LENGTH_FACTOR: f64 = 3.3;

/// MNE-compatible transition bandwidth for a high-pass edge at `l_freq`.
///
/// Rule: `min(max(0.25 * l_freq, 2.0), l_freq)`
pub fn auto_trans_bandwidth(l_freq: f64) -> f64 {
    (0.25 * l_freq).max(2.0).min(l_freq)
}

/// MNE-compatible transition bandwidth for a low-pass edge at `h_freq`.
///
/// Rule: `min(max(0.25 * h_freq, 2.0), sfreq / 2 - h_freq)`
pub fn auto_trans_bandwidth_low(h_freq: f64, sfreq: f64) -> f64 {
    (0.25 * h_freq).max(2.0).min(sfreq / 2.0 - h_freq)
}

/// Number of FIR taps for a given transition bandwidth.
/// Returns an odd integer (required for zero-phase linear-phase FIR).
///
/// Formula: `ceil(3.3 / trans_bw * sfreq)` rounded up to odd.
pub fn auto_filter_length(trans_bw: f64, sfreq: f64) -> usize {
    let n_raw = (HAMMING_LENGTH_FACTOR / trans_bw * sfreq).ceil() as usize;
    if n_raw % 2 == 0 { n_raw + 1 } else { n_raw }
}

/// Design a zero-phase FIR filter for the given edges.
///
/// * `(Some(l), Some(h))` — band-pass `l..h`
/// * `(Some(l), None)`    — high-pass at `l`
/// * `(None, Some(h))`    — low-pass at `h`
///
/// # Errors
///
/// [`Error::InvalidParameter`] when both edges are `None`, an edge is not in
/// `(0, sfreq / 2)`, or `l >= h`.
pub fn design_filter(l_freq: Option<f64>, h_freq: Option<f64>, sfreq: f64) -> Result<Vec<f64>> {
    let nyq = sfreq / 2.0;
    for f in [l_freq, h_freq].into_iter().flatten() {
        if !(f > 0.0 && f < nyq) {
            return Err(Error::InvalidParameter(format!(
                "filter edge {f} Hz must lie in (0, {nyq}) Hz"
            )));
        }
    }
    match (l_freq, h_freq) {
        (Some(l), Some(h)) if l >= h => Err(Error::InvalidParameter(format!(
            "band-pass requires l_freq < h_freq, got {l} >= {h}"
        ))),
        (Some(l), Some(h)) => Ok(design_bandpass(l, h, sfreq)),
        (Some(l), None) => Ok(design_highpass(l, sfreq)),
        (None, Some(h)) => Ok(design_lowpass(h, sfreq)),
        (None, None) => Err(Error::InvalidParameter(
            "at least one of l_freq / h_freq is required".into(),
        )),
    }
}

/// Zero-phase high-pass FIR at `l_freq`.
///
/// Matches `mne.filter.create_filter(None, sfreq, l_freq=l_freq, h_freq=None,
///   filter_length='auto', fir_window='hamming', fir_design='firwin', phase='zero')`.
pub fn design_highpass(l_freq: f64, sfreq: f64) -> Vec<f64> {
    let trans_bw = auto_trans_bandwidth(l_freq);
    let n = auto_filter_length(trans_bw, sfreq);
    // Midpoint of transition band → firwin cutoff.
    let cutoff_hz = l_freq - trans_bw / 2.0;
    firwin(n, cutoff_hz, sfreq, false)
}

/// Zero-phase low-pass FIR at `h_freq`.
pub fn design_lowpass(h_freq: f64, sfreq: f64) -> Vec<f64> {
    let trans_bw = auto_trans_bandwidth_low(h_freq, sfreq);
    let n = auto_filter_length(trans_bw, sfreq);
    firwin(n, h_freq + trans_bw / 2.0, sfreq, true)
}

/// Zero-phase band-pass FIR between `l_freq` and `h_freq`.
///
/// Built as `lowpass(h) - lowpass(l)`; the narrower transition sets the
/// overall length and the wider one gets a shorter kernel centred inside it.
pub fn design_bandpass(l_freq: f64, h_freq: f64, sfreq: f64) -> Vec<f64> {
    let l_trans = auto_trans_bandwidth(l_freq);
    let h_trans = auto_trans_bandwidth_low(h_freq, sfreq);
    let n = auto_filter_length(l_trans.min(h_trans), sfreq);

    let n_l = auto_filter_length(l_trans, sfreq).min(n);
    let n_h = auto_filter_length(h_trans, sfreq).min(n);
    let lp_high = firwin(n_h, h_freq + h_trans / 2.0, sfreq, true);
    let lp_low = firwin(n_l, l_freq - l_trans / 2.0, sfreq, true);

    let mut h = vec![0.0_f64; n];
    let off_h = (n - n_h) / 2;
    for (i, v) in lp_high.iter().enumerate() {
        h[off_h + i] += v;
    }
    let off_l = (n - n_l) / 2;
    for (i, v) in lp_low.iter().enumerate() {
        h[off_l + i] -= v;
    }
    h
}

/// Design a lowpass FIR filter using a Hamming-windowed sinc.
///
/// `pass_zero=true` means the DC component passes (lowpass); `false`
/// spectrally inverts to a highpass.
/// `cutoff_hz` is the -6 dB point.
pub fn firwin(n: usize, cutoff_hz: f64, sfreq: f64, pass_zero: bool) -> Vec<f64> {
    assert!(n % 2 == 1, "firwin requires odd N for linear-phase filter");
    let alpha = (n - 1) as f64 / 2.0;
    let nyq = sfreq / 2.0;
    let fc = cutoff_hz / nyq;   // normalised [0, 1]

    let win = hamming(n);

    let mut h: Vec<f64> = (0..n)
        .map(|i| {
            let x = i as f64 - alpha;
            // f(x) = sin(π·fc·x) / (π·x);  lim_{x→0} f(x) = fc  (L'Hôpital)
            let sinc = if x == 0.0 { fc } else { (PI * fc * x).sin() / (PI * x) };
            sinc * win[i]
        })
        .collect();

    // Normalise so sum = 1 (unit DC gain for lowpass).
    let s: f64 = h.iter().sum();
    h.iter_mut().for_each(|v| *v /= s);

    if !pass_zero {
        h.iter_mut().for_each(|v| *v = -*v);
        h[n / 2] += 1.0;
    }

    h
}

/// Hamming window of length `n`.
pub fn hamming(n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![1.0];
    }
    (0..n)
        .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f64 / (n - 1) as f64).cos())
        .collect()
}
