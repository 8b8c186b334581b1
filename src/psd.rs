//! Welch power spectral density of epochs.
//!
//! Follows `mne.time_frequency.psd_array_welch` with its defaults
//! (Hamming window, no detrending, density scaling, one-sided spectrum,
//! mean across segments). This is not the multitaper estimate that
//! `Epochs.compute_psd` uses by default; on short epochs the single
//! Hamming segment gives a resolution of `sfreq / n_times` with more
//! variance than a DPSS taper average.
use ndarray::{Array1, Array2, Array3, Axis};
use rayon::prelude::*;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use serde::{Deserialize, Serialize};

use crate::epoch::EpochSet;
use crate::error::{Error, Result};
use crate::filter::hamming;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WelchParams {
    pub fmin: f64,
    pub fmax: f64,
    /// Segment / FFT length; capped at the epoch length.
    pub n_fft: usize,
    pub n_overlap: usize,
}

impl Default for WelchParams {
    fn default() -> Self {
        Self { fmin: 1.0, fmax: 45.0, n_fft: 256, n_overlap: 0 }
    }
}

/// `[E, C, F]` spectral density.
#[derive(Debug, Clone)]
pub struct Spectrum {
    psd: Array3<f64>,
    freqs: Vec<f64>,
    ch_names: Vec<String>,
}

impl Spectrum {
    pub fn data(&self) -> &Array3<f64> {
        &self.psd
    }

    pub fn freqs(&self) -> &[f64] {
        &self.freqs
    }

    pub fn ch_names(&self) -> &[String] {
        &self.ch_names
    }

    /// `[C, F]` mean over epochs.
    pub fn mean_over_epochs(&self) -> Array2<f64> {
        self.psd
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array2::zeros((self.ch_names.len(), self.freqs.len())))
    }

    /// `[F]` mean over epochs and channels.
    pub fn mean_over_channels(&self) -> Array1<f64> {
        self.mean_over_epochs()
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(self.freqs.len()))
    }
}

/// Welch PSD of every epoch and channel, restricted to `[fmin, fmax]`.
///
/// # Errors
///
/// * [`Error::EmptyEpochSet`] for an empty set.
/// * [`Error::InvalidParameter`] for `n_overlap >= n_fft`, `n_fft == 0` or an
///   empty frequency band.
pub fn welch(epochs: &EpochSet, params: &WelchParams) -> Result<Spectrum> {
    if epochs.is_empty() {
        return Err(Error::EmptyEpochSet);
    }
    let n_fft = params.n_fft.min(epochs.n_times());
    if n_fft == 0 || params.n_overlap >= n_fft {
        return Err(Error::InvalidParameter(format!(
            "Welch needs 0 <= n_overlap < n_fft, got n_overlap={} n_fft={n_fft}",
            params.n_overlap
        )));
    }
    if n_fft < params.n_fft {
        log::debug!("n_fft reduced from {} to the epoch length {n_fft}", params.n_fft);
    }

    let sfreq = epochs.sfreq();
    let bins: Vec<usize> = (0..=n_fft / 2)
        .filter(|&k| {
            let f = k as f64 * sfreq / n_fft as f64;
            f >= params.fmin && f <= params.fmax
        })
        .collect();
    if bins.is_empty() {
        return Err(Error::InvalidParameter(format!(
            "no frequency bin in [{}, {}] Hz at resolution {:.3} Hz",
            params.fmin,
            params.fmax,
            sfreq / n_fft as f64
        )));
    }

    let window = hamming(n_fft);
    let win_energy: f64 = window.iter().map(|w| w * w).sum();
    let step = n_fft - params.n_overlap;
    let n_seg = (epochs.n_times() - params.n_overlap) / step;
    let fft = FftPlanner::<f64>::new().plan_fft_forward(n_fft);
    let nyquist_bin = (n_fft % 2 == 0).then_some(n_fft / 2);

    let (n_e, n_c) = (epochs.n_epochs(), epochs.n_channels());
    let rows: Vec<Vec<f64>> = (0..n_e * n_c)
        .into_par_iter()
        .map(|i| {
            let trace = epochs.data().slice(ndarray::s![i / n_c, i % n_c, ..]);
            let mut acc = vec![0.0_f64; bins.len()];
            let mut buf = vec![Complex::<f64>::default(); n_fft];
            for seg in 0..n_seg {
                let start = seg * step;
                for (j, b) in buf.iter_mut().enumerate() {
                    *b = Complex { re: trace[start + j] * window[j], im: 0.0 };
                }
                fft.process(&mut buf);
                for (a, &k) in acc.iter_mut().zip(&bins) {
                    let one_sided = if k == 0 || Some(k) == nyquist_bin { 1.0 } else { 2.0 };
                    *a += one_sided * buf[k].norm_sqr() / (sfreq * win_energy);
                }
            }
            acc.iter_mut().for_each(|a| *a /= n_seg as f64);
            acc
        })
        .collect();

    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    let psd = Array3::from_shape_vec((n_e, n_c, bins.len()), flat)
        .map_err(|e| Error::ShapeMismatch(e.to_string()))?;
    Ok(Spectrum {
        psd,
        freqs: bins.iter().map(|&k| k as f64 * sfreq / n_fft as f64).collect(),
        ch_names: epochs.ch_names().to_vec(),
    })
}
