//! Morlet-wavelet time-frequency representation of epochs.
//!
//! [`estimate`] matches `mne.time_frequency.tfr_morlet(epochs, freqs,
//! n_cycles, return_itc, average, decim)`: every (epoch, channel) trace is
//! convolved with one complex Morlet wavelet per frequency, power is `|z|²`
//! and inter-trial coherence is `|mean_e(z / |z|)|`.
//!
//! - [`morlet`]: wavelet construction
//! - [`conv`]: FFT convolution + decimation

pub mod conv;
pub mod morlet;

use ndarray::{s, Array2, Array3, Array4, ArrayView2, ArrayView3, Axis};
use rayon::prelude::*;
use rustfft::num_complex::Complex;
use serde::{Deserialize, Serialize};

use crate::baseline::{rescale_inplace, Baseline, BaselineMode};
use crate::epoch::EpochSet;
use crate::error::{Error, Result};

use conv::CwtPlan;

/// `n` frequencies evenly spaced on a log axis from `fmin` to `fmax`
/// (`np.logspace(log10(fmin), log10(fmax), n)`).
pub fn logspace(fmin: f64, fmax: f64, n: usize) -> Vec<f64> {
    match n {
        0 => vec![],
        1 => vec![fmin],
        _ => {
            let (a, b) = (fmin.log10(), fmax.log10());
            let step = (b - a) / (n - 1) as f64;
            let mut out: Vec<f64> = (0..n).map(|i| 10f64.powf(a + step * i as f64)).collect();
            out[0] = fmin;
            out[n - 1] = fmax;
            out
        }
    }
}

/// Cycles per wavelet: one value for every frequency, or one per frequency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NCycles {
    Fixed(f64),
    PerFreq(Vec<f64>),
}

impl NCycles {
    fn resolve(&self, n_freqs: usize) -> Result<Vec<f64>> {
        let cycles = match self {
            NCycles::Fixed(c) => vec![*c; n_freqs],
            NCycles::PerFreq(v) if v.len() == n_freqs => v.clone(),
            NCycles::PerFreq(v) => {
                return Err(Error::InvalidParameter(format!(
                    "{} n_cycles given for {n_freqs} frequencies",
                    v.len()
                )))
            }
        };
        if let Some(bad) = cycles.iter().find(|c| !(c.is_finite() && **c > 0.0)) {
            return Err(Error::InvalidParameter(format!("n_cycles must be positive, got {bad}")));
        }
        Ok(cycles)
    }
}

impl From<f64> for NCycles {
    fn from(c: f64) -> Self {
        NCycles::Fixed(c)
    }
}

/// Parameters of [`estimate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TfrParams {
    /// Frequencies in Hz; any order, sorted ascending in the result.
    pub freqs: Vec<f64>,
    pub n_cycles: NCycles,
    /// Keep every `decim`-th output sample, starting at the first.
    pub decim: usize,
    pub return_itc: bool,
    /// Average power across epochs (`[C, F, T]`) instead of keeping
    /// `[E, C, F, T]`.
    pub average: bool,
    /// Remove the wavelets' DC component.
    pub zero_mean: bool,
}

impl Default for TfrParams {
    /// 10 log-spaced frequencies 6–35 Hz, 2 cycles, `decim = 3`, ITC on.
    fn default() -> Self {
        Self {
            freqs: logspace(6.0, 35.0, 10),
            n_cycles: NCycles::Fixed(2.0),
            decim: 3,
            return_itc: true,
            average: true,
            zero_mean: false,
        }
    }
}

impl TfrParams {
    /// Frequencies sorted ascending with their matching cycle counts.
    fn sorted_freqs(&self, sfreq: f64) -> Result<Vec<(f64, f64)>> {
        if self.freqs.is_empty() {
            return Err(Error::InvalidParameter("at least one frequency is required".into()));
        }
        let nyquist = sfreq / 2.0;
        if let Some(&freq) = self.freqs.iter().find(|&&f| !(f > 0.0 && f < nyquist)) {
            return Err(Error::InvalidFrequency { freq, nyquist });
        }
        let cycles = self.n_cycles.resolve(self.freqs.len())?;
        let mut pairs: Vec<(f64, f64)> = self.freqs.iter().copied().zip(cycles).collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(pairs)
    }
}

/// Power of a TFR, averaged or per epoch.
#[derive(Debug, Clone)]
pub enum TfrPower {
    /// `[C, F, T]`
    Average(Array3<f64>),
    /// `[E, C, F, T]`
    Epochs(Array4<f64>),
}

/// Output of [`estimate`].
#[derive(Debug, Clone)]
pub struct TfrResult {
    power: TfrPower,
    itc: Option<Array3<f64>>,
    freqs: Vec<f64>,
    n_cycles: Vec<f64>,
    times: Vec<f64>,
    ch_names: Vec<String>,
    nave: usize,
    baseline: Option<(Baseline, BaselineMode)>,
}

impl TfrResult {
    pub fn power(&self) -> &TfrPower {
        &self.power
    }

    /// `[C, F, T]` power when the result was averaged across epochs.
    pub fn average_power(&self) -> Option<&Array3<f64>> {
        match &self.power {
            TfrPower::Average(p) => Some(p),
            TfrPower::Epochs(_) => None,
        }
    }

    /// `[E, C, F, T]` power when per-epoch power was kept.
    pub fn epochs_power(&self) -> Option<&Array4<f64>> {
        match &self.power {
            TfrPower::Epochs(p) => Some(p),
            TfrPower::Average(_) => None,
        }
    }

    /// `[C, F, T]` inter-trial coherence in `[0, 1]`.
    pub fn itc(&self) -> Option<&Array3<f64>> {
        self.itc.as_ref()
    }

    /// Ascending frequencies in Hz.
    pub fn freqs(&self) -> &[f64] {
        &self.freqs
    }

    /// Cycles used for each entry of [`TfrResult::freqs`].
    pub fn n_cycles(&self) -> &[f64] {
        &self.n_cycles
    }

    /// Decimated time axis in seconds.
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn ch_names(&self) -> &[String] {
        &self.ch_names
    }

    /// Number of epochs the result was computed from.
    pub fn nave(&self) -> usize {
        self.nave
    }

    pub fn baseline(&self) -> Option<(Baseline, BaselineMode)> {
        self.baseline
    }

    /// `[F, T]` average power of channel `name`.
    pub fn channel_power(&self, name: &str) -> Option<ArrayView2<'_, f64>> {
        let idx = self.ch_names.iter().position(|n| n == name)?;
        self.average_power().map(|p| p.index_axis(Axis(0), idx))
    }

    /// A copy with power rescaled against `baseline`; ITC is left as is.
    pub fn apply_baseline(&self, baseline: Baseline, mode: BaselineMode) -> Result<Self> {
        let range = baseline.sample_range(&self.times)?;
        let mut out = self.clone();
        match &mut out.power {
            TfrPower::Average(p) => rescale_inplace(p, range, mode),
            TfrPower::Epochs(p) => rescale_inplace(p, range, mode),
        }
        out.baseline = Some((baseline, mode));
        Ok(out)
    }
}

/// Per-channel output of one worker.
struct ChannelTfr {
    power: ChannelPower,
    itc: Option<Array2<f64>>,
}

enum ChannelPower {
    /// `[F, T]`
    Average(Array2<f64>),
    /// `[E, F, T]`
    Epochs(Array3<f64>),
}

/// Morlet time-frequency decomposition of `epochs`.
///
/// Channels are processed in parallel; each worker reads the shared epoch
/// array and owns its slice of the result.
///
/// # Errors
///
/// * [`Error::EmptyEpochSet`] if `epochs` holds no epoch.
/// * [`Error::InvalidFrequency`] for a frequency outside `(0, sfreq / 2)`.
/// * [`Error::InvalidParameter`] for `decim == 0`, bad `n_cycles`, or ITC
///   requested without averaging.
/// * [`Error::WaveletTooLong`] if a wavelet outgrows the epoch.
pub fn estimate(epochs: &EpochSet, params: &TfrParams) -> Result<TfrResult> {
    if epochs.is_empty() {
        return Err(Error::EmptyEpochSet);
    }
    if params.decim == 0 {
        return Err(Error::InvalidParameter("decim must be >= 1".into()));
    }
    if params.return_itc && !params.average {
        return Err(Error::InvalidParameter(
            "inter-trial coherence requires average = true".into(),
        ));
    }
    let sfreq = epochs.sfreq();
    let pairs = params.sorted_freqs(sfreq)?;
    let wavelets: Vec<(f64, Vec<Complex<f64>>)> = pairs
        .iter()
        .map(|&(f, c)| (f, morlet::morlet(sfreq, f, c, params.zero_mean)))
        .collect();
    let plan = CwtPlan::new(&wavelets, epochs.n_times(), params.decim)?;

    log::info!(
        "Morlet TFR: {} epochs × {} ch × {} freqs ({:.2}–{:.2} Hz), decim={}",
        epochs.n_epochs(),
        epochs.n_channels(),
        pairs.len(),
        pairs[0].0,
        pairs[pairs.len() - 1].0,
        params.decim
    );

    let data = epochs.data();
    let per_channel: Vec<ChannelTfr> = (0..epochs.n_channels())
        .into_par_iter()
        .map(|ch| {
            let traces = data.index_axis(Axis(1), ch);
            if params.average {
                let (power, itc) = channel_average(&plan, traces, params.return_itc);
                ChannelTfr { power: ChannelPower::Average(power), itc }
            } else {
                ChannelTfr { power: ChannelPower::Epochs(channel_epochs(&plan, traces)), itc: None }
            }
        })
        .collect();

    let (n_e, n_c, n_f, n_t) = (epochs.n_epochs(), epochs.n_channels(), pairs.len(), plan.n_out());
    let mut itc = params.return_itc.then(|| Array3::<f64>::zeros((n_c, n_f, n_t)));
    let power = if params.average {
        let mut p = Array3::<f64>::zeros((n_c, n_f, n_t));
        for (ch, out) in per_channel.into_iter().enumerate() {
            if let ChannelPower::Average(cp) = out.power {
                p.index_axis_mut(Axis(0), ch).assign(&cp);
            }
            if let (Some(dst), Some(src)) = (itc.as_mut(), out.itc) {
                dst.index_axis_mut(Axis(0), ch).assign(&src);
            }
        }
        TfrPower::Average(p)
    } else {
        let mut p = Array4::<f64>::zeros((n_e, n_c, n_f, n_t));
        for (ch, out) in per_channel.into_iter().enumerate() {
            if let ChannelPower::Epochs(cp) = out.power {
                p.slice_mut(s![.., ch, .., ..]).assign(&cp);
            }
        }
        TfrPower::Epochs(p)
    };

    Ok(TfrResult {
        power,
        itc,
        freqs: pairs.iter().map(|p| p.0).collect(),
        n_cycles: pairs.iter().map(|p| p.1).collect(),
        times: epochs.times().iter().copied().step_by(params.decim).collect(),
        ch_names: epochs.ch_names().to_vec(),
        nave: n_e,
        baseline: None,
    })
}

/// Mean power `[F, T]` and optional ITC `[F, T]` over the `[E, T]` traces of one channel.
fn channel_average(
    plan: &CwtPlan,
    traces: ArrayView2<'_, f64>,
    with_itc: bool,
) -> (Array2<f64>, Option<Array2<f64>>) {
    let shape = (plan.n_freqs(), plan.n_out());
    let mut power = Array2::<f64>::zeros(shape);
    let mut phase_sum = Array2::<Complex<f64>>::zeros(shape);
    for trace in traces.rows() {
        let z = plan.transform(trace);
        power.zip_mut_with(&z, |p, z| *p += z.norm_sqr());
        if with_itc {
            phase_sum.zip_mut_with(&z, |acc, z| {
                let mag = z.norm();
                if mag > 0.0 {
                    *acc += *z / mag;
                }
            });
        }
    }
    let n = traces.nrows() as f64;
    power /= n;
    let itc = with_itc.then(|| phase_sum.mapv(|s| (s.norm() / n).min(1.0)));
    (power, itc)
}

/// Per-epoch power `[E, F, T]` of one channel.
fn channel_epochs(plan: &CwtPlan, traces: ArrayView2<'_, f64>) -> Array3<f64> {
    let mut out = Array3::<f64>::zeros((traces.nrows(), plan.n_freqs(), plan.n_out()));
    for (e, trace) in traces.rows().into_iter().enumerate() {
        out.index_axis_mut(Axis(0), e)
            .assign(&plan.transform(trace).mapv(|z| z.norm_sqr()));
    }
    out
}

/// Mean power over the frequencies in `[fmin, fmax]` → `[C, T]`.
pub fn band_power(result: &TfrResult, fmin: f64, fmax: f64) -> Result<Array2<f64>> {
    let power: ArrayView3<'_, f64> = result
        .average_power()
        .ok_or_else(|| Error::InvalidParameter("band power needs averaged power".into()))?
        .view();
    let picks: Vec<usize> = result
        .freqs
        .iter()
        .enumerate()
        .filter(|(_, &f)| f >= fmin && f <= fmax)
        .map(|(i, _)| i)
        .collect();
    if picks.is_empty() {
        return Err(Error::InvalidParameter(format!(
            "no frequency in [{fmin}, {fmax}] Hz"
        )));
    }
    power
        .select(Axis(1), &picks)
        .mean_axis(Axis(1))
        .ok_or_else(|| Error::InvalidParameter("empty frequency selection".into()))
}
