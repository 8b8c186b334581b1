//! Event-locked epoching.
//!
//! Cuts a fixed-length window around every event carrying the target label
//! out of a continuous `[C, T]` recording, producing an [`EpochSet`] of shape
//! `[E, C, n_times]`. Optional baseline correction is applied before the set
//! is returned, matching `mne.Epochs(raw, events, event_id, tmin, tmax,
//! baseline=...)`.
use std::collections::HashMap;

use ndarray::{s, Array3, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::baseline::{subtract_baseline_inplace, Baseline};
use crate::error::{Error, Result};
use crate::events::{unique_labels, Event};
use crate::evoked::Evoked;
use crate::signal::ContinuousSignal;

/// What to do when several target events fall on the same sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Fail with [`Error::DuplicateEvent`].
    Error,
    /// Keep the first event at that sample, ignore the others.
    Merge,
}

/// What to do when an epoch window reaches outside the recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Fail with [`Error::OutOfBounds`].
    #[default]
    Abort,
    /// Skip the event, log a warning and report it in [`Extraction::dropped`].
    Drop,
}

/// Window and policies for [`extract`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochParams {
    /// Window start relative to the event, in seconds (usually negative).
    pub tmin: f64,
    /// Window end relative to the event, in seconds (inclusive).
    pub tmax: f64,
    /// Interval whose mean is subtracted from each epoch and channel.
    pub baseline: Option<Baseline>,
    pub on_duplicate: DuplicatePolicy,
    pub on_overflow: OverflowPolicy,
}

impl EpochParams {
    /// Both policies are required: neither has a silent default.
    pub fn new(tmin: f64, tmax: f64, on_duplicate: DuplicatePolicy, on_overflow: OverflowPolicy) -> Self {
        Self { tmin, tmax, baseline: None, on_duplicate, on_overflow }
    }

    pub fn with_baseline(mut self, baseline: Baseline) -> Self {
        self.baseline = Some(baseline);
        self
    }

    /// Offset of the first window sample from the event, in samples.
    pub fn start_offset(&self, sfreq: f64) -> i64 {
        (self.tmin * sfreq).round() as i64
    }

    /// Samples per epoch: `round((tmax - tmin) * sfreq) + 1`.
    pub fn n_times(&self, sfreq: f64) -> usize {
        ((self.tmax - self.tmin) * sfreq).round() as usize + 1
    }

    /// Relative time axis in seconds.
    pub fn times(&self, sfreq: f64) -> Vec<f64> {
        let start = self.start_offset(sfreq);
        (0..self.n_times(sfreq))
            .map(|i| (start + i as i64) as f64 / sfreq)
            .collect()
    }

    fn validate(&self) -> Result<()> {
        if !(self.tmin.is_finite() && self.tmax.is_finite() && self.tmin <= self.tmax) {
            return Err(Error::InvalidParameter(format!(
                "epoch window requires finite tmin <= tmax, got tmin={} tmax={}",
                self.tmin, self.tmax
            )));
        }
        Ok(())
    }
}

/// Result of [`extract`].
#[derive(Debug, Clone)]
pub struct Extraction {
    pub epochs: EpochSet,
    /// Indices (into the caller's `events` slice) skipped under
    /// [`OverflowPolicy::Drop`].
    pub dropped: Vec<usize>,
}

/// Equal-shape trials `[E, C, n_times]` sharing one channel layout and time axis.
#[derive(Debug, Clone)]
pub struct EpochSet {
    data: Array3<f64>,
    times: Vec<f64>,
    sfreq: f64,
    ch_names: Vec<String>,
    events: Vec<Event>,
    baseline: Option<Baseline>,
}

impl EpochSet {
    /// Assemble an epoch set from its parts, e.g. after an external
    /// rejection or repair stage.
    ///
    /// # Errors
    ///
    /// [`Error::ShapeMismatch`] unless `data` is `[events.len(), ch_names.len(), times.len()]`.
    pub fn from_parts(
        data: Array3<f64>,
        times: Vec<f64>,
        sfreq: f64,
        ch_names: Vec<String>,
        events: Vec<Event>,
    ) -> Result<Self> {
        let expected = (events.len(), ch_names.len(), times.len());
        if data.dim() != expected {
            return Err(Error::ShapeMismatch(format!(
                "epoch data is {:?}, expected {expected:?} (epochs, channels, times)",
                data.dim()
            )));
        }
        if !(sfreq.is_finite() && sfreq > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "sampling rate must be positive, got {sfreq}"
            )));
        }
        Ok(Self { data, times, sfreq, ch_names, events, baseline: None })
    }

    /// `[E, C, n_times]`
    pub fn data(&self) -> &Array3<f64> {
        &self.data
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn sfreq(&self) -> f64 {
        self.sfreq
    }

    pub fn ch_names(&self) -> &[String] {
        &self.ch_names
    }

    /// The event that triggered each epoch.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Baseline interval applied to the data, if any.
    pub fn baseline(&self) -> Option<Baseline> {
        self.baseline
    }

    pub fn n_epochs(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    pub fn n_channels(&self) -> usize {
        self.ch_names.len()
    }

    pub fn n_times(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.n_epochs() == 0
    }

    /// `[C, n_times]` view of epoch `idx`.
    pub fn epoch(&self, idx: usize) -> ArrayView2<'_, f64> {
        self.data.index_axis(Axis(0), idx)
    }

    /// Keep the epochs at `indices`, in the given order.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidParameter`] for an index `>= n_epochs()`.
    pub fn select(&self, indices: &[usize]) -> Result<Self> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.n_epochs()) {
            return Err(Error::InvalidParameter(format!(
                "epoch index {bad} out of range for {} epochs",
                self.n_epochs()
            )));
        }
        Ok(Self {
            data: self.data.select(Axis(0), indices),
            times: self.times.clone(),
            sfreq: self.sfreq,
            ch_names: self.ch_names.clone(),
            events: indices.iter().map(|&i| self.events[i].clone()).collect(),
            baseline: self.baseline,
        })
    }

    /// A copy with `baseline` subtracted from every epoch and channel.
    pub fn apply_baseline(&self, baseline: Baseline) -> Result<Self> {
        let range = baseline.sample_range(&self.times)?;
        let mut data = self.data.clone();
        subtract_baseline_inplace(&mut data, range);
        Ok(Self { data, baseline: Some(baseline), ..self.clone() })
    }

    /// Average across epochs.
    pub fn average(&self) -> Result<Evoked> {
        let data = self.data.mean_axis(Axis(0)).ok_or(Error::EmptyEpochSet)?;
        Evoked::new(data, self.times.clone(), self.ch_names.clone(), self.n_epochs())
    }
}

/// Cut epochs around every event labelled `target_label`.
///
/// For an event at sample `s` the window starts at `s + round(tmin * sfreq)`
/// and holds `round((tmax - tmin) * sfreq) + 1` samples. The time axis keeps
/// the recording's sampling rate.
///
/// # Errors
///
/// * [`Error::InvalidParameter`] for an inverted window or a baseline outside it.
/// * [`Error::NoMatchingEvents`] if no event carries `target_label`.
/// * [`Error::DuplicateEvent`] for target events sharing a sample under
///   [`DuplicatePolicy::Error`].
/// * [`Error::OutOfBounds`] for a window leaving the recording under
///   [`OverflowPolicy::Abort`].
pub fn extract(
    signal: &ContinuousSignal,
    events: &[Event],
    target_label: &str,
    params: &EpochParams,
) -> Result<Extraction> {
    params.validate()?;
    let sfreq = signal.sfreq();
    let times = params.times(sfreq);
    let baseline_range = params
        .baseline
        .map(|b| b.sample_range(&times))
        .transpose()?;

    let matching: Vec<(usize, &Event)> = events
        .iter()
        .enumerate()
        .filter(|(_, e)| e.label == target_label)
        .collect();
    if matching.is_empty() {
        return Err(Error::NoMatchingEvents {
            target: target_label.to_string(),
            available: unique_labels(events),
        });
    }

    let mut first_at: HashMap<usize, usize> = HashMap::new();
    let mut unique = Vec::with_capacity(matching.len());
    for (idx, ev) in matching {
        match first_at.get(&ev.sample) {
            None => {
                first_at.insert(ev.sample, idx);
                unique.push((idx, ev));
            }
            Some(&first) => match params.on_duplicate {
                DuplicatePolicy::Error => {
                    return Err(Error::DuplicateEvent { sample: ev.sample, first, second: idx });
                }
                DuplicatePolicy::Merge => {
                    log::debug!("event #{idx} merged into #{first} at sample {}", ev.sample);
                }
            },
        }
    }

    let n_total = signal.n_times();
    let n_times = times.len();
    let offset = params.start_offset(sfreq);
    let mut windows = Vec::with_capacity(unique.len());
    let mut dropped = Vec::new();
    for (idx, ev) in unique {
        let start = ev.sample as i64 + offset;
        let stop = start + n_times as i64 - 1;
        if start >= 0 && stop < n_total as i64 {
            windows.push((start as usize, ev.clone()));
            continue;
        }
        match params.on_overflow {
            OverflowPolicy::Abort => {
                return Err(Error::OutOfBounds {
                    event_index: idx,
                    sample: ev.sample,
                    start,
                    stop,
                    n_times: n_total,
                });
            }
            OverflowPolicy::Drop => {
                log::warn!(
                    "dropping event #{idx} at sample {}: window [{start}, {stop}] outside [0, {n_total})",
                    ev.sample
                );
                dropped.push(idx);
            }
        }
    }
    if windows.is_empty() {
        log::warn!("every {target_label:?} epoch was dropped, returning an empty set");
    }

    let mut data = Array3::<f64>::zeros((windows.len(), signal.n_channels(), n_times));
    for (e, (start, _)) in windows.iter().enumerate() {
        data.slice_mut(s![e, .., ..])
            .assign(&signal.data().slice(s![.., *start..*start + n_times]));
    }
    if let Some(range) = baseline_range {
        subtract_baseline_inplace(&mut data, range);
    }

    log::info!(
        "extracted {} epochs of {n_times} samples for {target_label:?} ({} dropped)",
        windows.len(),
        dropped.len()
    );

    let epochs = EpochSet {
        data,
        times,
        sfreq,
        ch_names: signal.ch_names().to_vec(),
        events: windows.into_iter().map(|(_, ev)| ev).collect(),
        baseline: params.baseline,
    };
    Ok(Extraction { epochs, dropped })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn ramp_signal(n_ch: usize, n_t: usize, sfreq: f64) -> ContinuousSignal {
        let data = Array2::from_shape_fn((n_ch, n_t), |(c, t)| (c * 10_000 + t) as f64);
        ContinuousSignal::with_default_names(data, sfreq).unwrap()
    }

    fn params(tmin: f64, tmax: f64) -> EpochParams {
        EpochParams::new(tmin, tmax, DuplicatePolicy::Error, OverflowPolicy::Abort)
    }

    #[test]
    fn window_copies_expected_samples() {
        let sig = ramp_signal(2, 1000, 100.0);
        let ev = [Event::new(500, "33273")];
        let out = extract(&sig, &ev, "33273", &params(-0.2, 0.4)).unwrap();
        let epochs = out.epochs;
        assert_eq!(epochs.data().dim(), (1, 2, 61));
        assert_eq!(epochs.data()[[0, 0, 0]], 480.0);
        assert_eq!(epochs.data()[[0, 1, 60]], 10_540.0);
        assert!(out.dropped.is_empty());
    }

    #[test]
    fn other_labels_ignored() {
        let sig = ramp_signal(1, 1000, 100.0);
        let ev = [Event::new(100, "a"), Event::new(300, "b"), Event::new(600, "a")];
        let out = extract(&sig, &ev, "a", &params(0.0, 0.1)).unwrap();
        assert_eq!(out.epochs.n_epochs(), 2);
        assert_eq!(out.epochs.events()[1].sample, 600);
    }

    #[test]
    fn no_match_lists_available_labels() {
        let sig = ramp_signal(1, 100, 100.0);
        let ev = [Event::new(10, "a")];
        match extract(&sig, &ev, "zzz", &params(0.0, 0.1)) {
            Err(Error::NoMatchingEvents { target, available }) => {
                assert_eq!(target, "zzz");
                assert_eq!(available, vec!["a".to_string()]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn inverted_window_rejected() {
        let sig = ramp_signal(1, 100, 100.0);
        let ev = [Event::new(10, "a")];
        assert!(matches!(
            extract(&sig, &ev, "a", &params(0.3, 0.1)),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn select_reorders_epochs_and_events() {
        let sig = ramp_signal(1, 1000, 100.0);
        let ev = [Event::new(100, "a"), Event::new(200, "a"), Event::new(300, "a")];
        let set = extract(&sig, &ev, "a", &params(0.0, 0.05)).unwrap().epochs;
        let sub = set.select(&[2, 0]).unwrap();
        assert_eq!(sub.n_epochs(), 2);
        assert_eq!(sub.events()[0].sample, 300);
        assert_eq!(sub.epoch(1)[[0, 0]], 100.0);
        assert!(set.select(&[3]).is_err());
    }

    #[test]
    fn from_parts_checks_shape() {
        let data = Array3::zeros((2, 3, 4));
        let names: Vec<String> = (0..3).map(|i| i.to_string()).collect();
        let events = vec![Event::new(0, "x"), Event::new(5, "x")];
        assert!(EpochSet::from_parts(data.clone(), vec![0.0; 4], 10.0, names.clone(), events.clone()).is_ok());
        assert!(matches!(
            EpochSet::from_parts(data, vec![0.0; 5], 10.0, names, events),
            Err(Error::ShapeMismatch(_))
        ));
    }
}
