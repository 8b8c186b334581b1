//! Baseline intervals and rescaling.
//!
//! [`Baseline`] describes an interval on an epoch's relative time axis;
//! either end may be open (`None` = first / last sample). Epoch data is
//! corrected by subtracting the interval mean (`epochs.apply_baseline`);
//! time-frequency power can additionally be rescaled with any
//! [`BaselineMode`] (`mne.baseline.rescale`).
use ndarray::{s, Array, Array3, Axis, Dimension};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Tolerance when matching interval edges against sample times.
const TIME_EPS: f64 = 1e-9;

/// A `(start, end)` interval in seconds relative to the event.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Baseline {
    pub start: Option<f64>,
    pub end: Option<f64>,
}

impl Baseline {
    pub fn new(start: Option<f64>, end: Option<f64>) -> Self {
        Self { start, end }
    }

    /// Half-open sample range `[imin, imax)` of `times` covered by the interval.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidParameter`] if the interval is inverted, reaches
    /// more than one sample period outside `times`, or contains no sample.
    /// Edges within one period of the axis are clamped to it, so `tmin`
    /// itself is accepted when `tmin * sfreq` falls between samples.
    pub fn sample_range(&self, times: &[f64]) -> Result<(usize, usize)> {
        let (Some(&t_first), Some(&t_last)) = (times.first(), times.last()) else {
            return Err(Error::InvalidParameter("baseline on an empty time axis".into()));
        };
        let tstep = match times {
            [a, b, ..] => (b - a).abs().max(TIME_EPS),
            _ => TIME_EPS,
        };
        let bmin = self.start.unwrap_or(t_first);
        let bmax = self.end.unwrap_or(t_last);
        if bmin > bmax {
            return Err(Error::InvalidParameter(format!(
                "baseline start {bmin} s is after its end {bmax} s"
            )));
        }
        if bmin < t_first - tstep || bmax > t_last + tstep {
            return Err(Error::InvalidParameter(format!(
                "baseline ({bmin}, {bmax}) s is outside the data range ({t_first}, {t_last}) s"
            )));
        }
        let (bmin, bmax) = (bmin.max(t_first), bmax.min(t_last));
        let imin = times.iter().position(|&t| t >= bmin - TIME_EPS).unwrap_or(times.len());
        let imax = times.iter().rposition(|&t| t <= bmax + TIME_EPS).map_or(0, |i| i + 1);
        if imin >= imax {
            return Err(Error::InvalidParameter(format!(
                "baseline ({bmin}, {bmax}) s contains no samples"
            )));
        }
        Ok((imin, imax))
    }
}

/// How power is expressed relative to its baseline.
///
/// With `m` the baseline mean and `σ` the baseline standard deviation:
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaselineMode {
    /// `x - m`
    Mean,
    /// `x / m`
    Ratio,
    /// `log10(x / m)`
    #[default]
    LogRatio,
    /// `(x - m) / m`
    Percent,
    /// `(x - m) / σ`
    ZScore,
    /// `log10(x / m) / σ(log10(baseline / m))`
    ZLogRatio,
}

/// Per-epoch, per-channel baseline subtraction.
///
/// `epochs`: `[E, C, T]`  →  `epoch[e, c, :] -= mean(epoch[e, c, imin..imax])`
pub fn subtract_baseline_inplace(epochs: &mut Array3<f64>, (imin, imax): (usize, usize)) {
    for mut trace in epochs.lanes_mut(Axis(2)) {
        let m = trace.slice(s![imin..imax]).mean().unwrap_or(0.0);
        trace -= m;
    }
}

/// Rescale every trace along the last axis of `data` against
/// `data[..., imin..imax]`.
pub fn rescale_inplace<D: Dimension>(
    data: &mut Array<f64, D>,
    (imin, imax): (usize, usize),
    mode: BaselineMode,
) {
    let last = Axis(data.ndim() - 1);
    for mut trace in data.lanes_mut(last) {
        let base = trace.slice(s![imin..imax]).to_owned();
        let n = base.len() as f64;
        let m = base.sum() / n;
        match mode {
            BaselineMode::Mean => trace -= m,
            BaselineMode::Ratio => trace /= m,
            BaselineMode::LogRatio => trace.mapv_inplace(|v| (v / m).log10()),
            BaselineMode::Percent => trace.mapv_inplace(|v| (v - m) / m),
            BaselineMode::ZScore => {
                let sd = (base.mapv(|v| (v - m).powi(2)).sum() / n).sqrt();
                trace.mapv_inplace(|v| (v - m) / sd);
            }
            BaselineMode::ZLogRatio => {
                let logs = base.mapv(|v| (v / m).log10());
                let lm = logs.sum() / n;
                let sd = (logs.mapv(|v| (v - lm).powi(2)).sum() / n).sqrt();
                trace.mapv_inplace(|v| (v / m).log10() / sd);
            }
        }
    }
}
