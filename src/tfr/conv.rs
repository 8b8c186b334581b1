//! FFT convolution of real traces with a bank of complex wavelets.
//!
//! Matches MNE's `_cwt_gen`: one FFT size `next_fast_len(n + max_len - 1)`
//! for the whole bank, full linear convolution, then the central `n`
//! samples ("same" mode) decimated by keeping every `decim`-th sample.
use std::sync::Arc;

use ndarray::{Array2, ArrayView1};
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::error::{Error, Result};
use crate::fft::{complex_spectrum, next_fast_len};

/// Precomputed wavelet spectra for traces of a fixed length.
///
/// Immutable after construction and `Send + Sync`, so one plan is shared by
/// every worker.
pub struct CwtPlan {
    spectra: Vec<Vec<Complex<f64>>>,
    lens: Vec<usize>,
    n_times: usize,
    n_fft: usize,
    decim: usize,
    fwd: Arc<dyn Fft<f64>>,
    inv: Arc<dyn Fft<f64>>,
}

impl CwtPlan {
    /// # Errors
    ///
    /// * [`Error::InvalidParameter`] if `decim == 0` or `wavelets` is empty.
    /// * [`Error::WaveletTooLong`] if a wavelet has more samples than the trace.
    pub fn new(wavelets: &[(f64, Vec<Complex<f64>>)], n_times: usize, decim: usize) -> Result<Self> {
        if decim == 0 {
            return Err(Error::InvalidParameter("decim must be >= 1".into()));
        }
        let max_len = wavelets
            .iter()
            .map(|(_, w)| w.len())
            .max()
            .ok_or_else(|| Error::InvalidParameter("no wavelets to convolve with".into()))?;
        if let Some((freq, w)) = wavelets.iter().find(|(_, w)| w.len() > n_times) {
            return Err(Error::WaveletTooLong { freq: *freq, wavelet_len: w.len(), n_times });
        }

        let n_fft = next_fast_len(n_times + max_len - 1);
        let mut planner = FftPlanner::<f64>::new();
        Ok(Self {
            spectra: wavelets.iter().map(|(_, w)| complex_spectrum(w, n_fft)).collect(),
            lens: wavelets.iter().map(|(_, w)| w.len()).collect(),
            n_times,
            n_fft,
            decim,
            fwd: planner.plan_fft_forward(n_fft),
            inv: planner.plan_fft_inverse(n_fft),
        })
    }

    /// Length of the decimated output: `ceil(n_times / decim)`.
    pub fn n_out(&self) -> usize {
        self.n_times.div_ceil(self.decim)
    }

    pub fn n_freqs(&self) -> usize {
        self.spectra.len()
    }

    /// Convolve one trace with every wavelet → `[F, n_out]`.
    pub fn transform(&self, x: ArrayView1<'_, f64>) -> Array2<Complex<f64>> {
        debug_assert_eq!(x.len(), self.n_times);
        let mut x_fft: Vec<Complex<f64>> = x
            .iter()
            .map(|&re| Complex { re, im: 0.0 })
            .chain(std::iter::repeat(Complex::default()))
            .take(self.n_fft)
            .collect();
        self.fwd.process(&mut x_fft);

        let scale = 1.0 / self.n_fft as f64;
        let mut out = Array2::<Complex<f64>>::zeros((self.n_freqs(), self.n_out()));
        let mut buf = vec![Complex::default(); self.n_fft];
        for (f, (spec, &len)) in self.spectra.iter().zip(&self.lens).enumerate() {
            for ((b, xf), wf) in buf.iter_mut().zip(&x_fft).zip(spec) {
                *b = *xf * *wf;
            }
            self.inv.process(&mut buf);

            // Full convolution has n + len - 1 samples; keep the centred n.
            let start = (len - 1) / 2;
            for (o, i) in (start..start + self.n_times).step_by(self.decim).enumerate() {
                out[[f, o]] = buf[i] * scale;
            }
        }
        out
    }
}
