//! Continuous multi-channel recording.
//!
//! [`ContinuousSignal`] is immutable: cropping, filtering and ICA cleaning
//! all return a new signal and leave the receiver untouched.
use ndarray::{s, Array1, Array2};

use crate::error::{Error, Result};
use crate::filter;

/// A `[C, T]` recording sampled at a single rate.
#[derive(Debug, Clone)]
pub struct ContinuousSignal {
    data: Array2<f64>,
    sfreq: f64,
    ch_names: Vec<String>,
}

impl ContinuousSignal {
    /// Wrap `data` (`[C, T]`) sampled at `sfreq` Hz.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidParameter`] if `sfreq` is not a positive finite number.
    /// * [`Error::ShapeMismatch`] if `ch_names.len()` differs from the row count.
    pub fn new(data: Array2<f64>, sfreq: f64, ch_names: Vec<String>) -> Result<Self> {
        if !(sfreq.is_finite() && sfreq > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "sampling rate must be positive, got {sfreq}"
            )));
        }
        if ch_names.len() != data.nrows() {
            return Err(Error::ShapeMismatch(format!(
                "{} channel names for {} data rows",
                ch_names.len(),
                data.nrows()
            )));
        }
        Ok(Self { data, sfreq, ch_names })
    }

    /// Same as [`ContinuousSignal::new`] with names `"EEG 000"`, `"EEG 001"`, …
    pub fn with_default_names(data: Array2<f64>, sfreq: f64) -> Result<Self> {
        let names = (0..data.nrows()).map(|i| format!("EEG {i:03}")).collect();
        Self::new(data, sfreq, names)
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn sfreq(&self) -> f64 {
        self.sfreq
    }

    pub fn ch_names(&self) -> &[String] {
        &self.ch_names
    }

    pub fn n_channels(&self) -> usize {
        self.data.nrows()
    }

    pub fn n_times(&self) -> usize {
        self.data.ncols()
    }

    /// Duration in seconds of the last sample relative to the first.
    pub fn duration(&self) -> f64 {
        self.n_times().saturating_sub(1) as f64 / self.sfreq
    }

    /// Time of every sample in seconds, starting at 0.
    pub fn times(&self) -> Array1<f64> {
        Array1::from_shape_fn(self.n_times(), |i| i as f64 / self.sfreq)
    }

    /// Replace the samples while keeping rate and channel layout.
    pub(crate) fn with_data(&self, data: Array2<f64>) -> Self {
        debug_assert_eq!(data.nrows(), self.n_channels());
        Self { data, sfreq: self.sfreq, ch_names: self.ch_names.clone() }
    }

    /// Sample range `[first, last]` (inclusive) kept by [`ContinuousSignal::crop`].
    ///
    /// `tmax` past the end of the recording is clamped to the last sample.
    pub fn crop_bounds(&self, tmin: f64, tmax: f64) -> Result<(usize, usize)> {
        if !(tmin >= 0.0 && tmin <= tmax) {
            return Err(Error::InvalidParameter(format!(
                "crop requires 0 <= tmin <= tmax, got tmin={tmin} tmax={tmax}"
            )));
        }
        let n = self.n_times();
        let first = (tmin * self.sfreq).round() as usize;
        if first >= n {
            return Err(Error::InvalidParameter(format!(
                "crop tmin={tmin} s is past the end of the {:.3} s recording",
                self.duration()
            )));
        }
        let mut last = (tmax * self.sfreq).round() as usize;
        if last >= n {
            log::warn!(
                "crop tmax={tmax} s exceeds recording ({:.3} s), clamping",
                self.duration()
            );
            last = n - 1;
        }
        Ok((first, last))
    }

    /// Keep the samples between `tmin` and `tmax` seconds, both inclusive.
    pub fn crop(&self, tmin: f64, tmax: f64) -> Result<Self> {
        let (first, last) = self.crop_bounds(tmin, tmax)?;
        Ok(self.crop_samples(first, last))
    }

    /// Keep samples `first..=last` of bounds returned by [`ContinuousSignal::crop_bounds`].
    pub(crate) fn crop_samples(&self, first: usize, last: usize) -> Self {
        self.with_data(self.data.slice(s![.., first..=last]).to_owned())
    }

    /// Zero-phase FIR filter every channel.
    ///
    /// `(Some(l), Some(h))` is a band-pass, `(Some(l), None)` a high-pass and
    /// `(None, Some(h))` a low-pass; see [`filter::design_filter`].
    pub fn filter(&self, l_freq: Option<f64>, h_freq: Option<f64>) -> Result<Self> {
        let h = filter::design_filter(l_freq, h_freq, self.sfreq)?;
        log::debug!(
            "filtering {} ch with {}-tap FIR (l_freq={l_freq:?}, h_freq={h_freq:?})",
            self.n_channels(),
            h.len()
        );
        let mut data = self.data.clone();
        filter::apply_fir_zero_phase(&mut data, &h)?;
        Ok(self.with_data(data))
    }
}
