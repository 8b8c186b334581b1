//! # eegtf — event-locked EEG epoching and Morlet time-frequency analysis
//!
//! `eegtf` takes a continuous multi-channel recording and a list of labelled
//! events, cuts baseline-corrected epochs around a target event and
//! computes Morlet-wavelet power and inter-trial coherence. Every numerical
//! step follows the corresponding [MNE-Python](https://mne.tools) routine.
//!
//! ## Pipeline overview
//!
//! ```text
//! recording.safetensors
//!   │
//!   ├─ io::Recording::load()        [C, T] + events (+ optional ICA model)
//!   ├─ ContinuousSignal::crop()     keep 50 … 550 s
//!   ├─ ContinuousSignal::filter()   zero-phase FIR band-pass 1–45 Hz
//!   ├─ IcaModel::apply()            remove caller-chosen components
//!   ├─ epoch::extract()             −0.2 … 0.4 s around "33273", baseline (None, 0)
//!   ├─ EpochRejector::reject()      optional bad-epoch rejection
//!   ├─ EpochSet::average()          evoked response
//!   ├─ psd::welch()                 1–45 Hz Welch spectrum (not multitaper)
//!   └─ tfr::estimate()              Morlet power + ITC, decim 3
//!        │
//!        └─→ TfrResult::apply_baseline((−0.2, 0), logratio)
//! ```
//!
//! ## Quick start
//!
//! ```no_run
//! use eegtf::{extract, estimate, ContinuousSignal, EpochParams, Event, TfrParams};
//! use eegtf::{DuplicatePolicy, OverflowPolicy};
//! use ndarray::Array2;
//!
//! let signal = ContinuousSignal::with_default_names(Array2::zeros((4, 1000)), 100.0).unwrap();
//! let events = vec![Event::new(500, "33273")];
//!
//! let params = EpochParams::new(-0.2, 0.4, DuplicatePolicy::Error, OverflowPolicy::Abort);
//! let epochs = extract(&signal, &events, "33273", &params).unwrap().epochs;
//! assert_eq!(epochs.n_times(), 61);
//!
//! let tfr = estimate(&epochs, &TfrParams { freqs: vec![6.0, 35.0], ..TfrParams::default() }).unwrap();
//! println!("power {:?}", tfr.average_power().unwrap().dim());
//! ```

pub mod baseline;
pub mod config;
pub mod epoch;
pub mod error;
pub mod events;
pub mod evoked;
pub mod fft;
pub mod filter;
pub mod ica;
pub mod io;
pub mod psd;
pub mod reject;
pub mod signal;
pub mod tfr;

use std::path::Path;

use anyhow::Result;

// ── Crate-root re-exports ─────────────────────────────────────────────────

pub use baseline::{Baseline, BaselineMode};
pub use config::PipelineConfig;
pub use epoch::{extract, DuplicatePolicy, EpochParams, EpochSet, Extraction, OverflowPolicy};
pub use error::Error;
pub use events::{events_from_annotations, shift_events, shift_events_indexed, Annotation, Event};
pub use evoked::Evoked;
pub use ica::IcaModel;
pub use io::{Recording, StWriter};
pub use psd::{welch, Spectrum, WelchParams};
pub use reject::{EpochRejector, PeakToPeakRejector};
pub use signal::ContinuousSignal;
pub use tfr::{estimate, logspace, NCycles, TfrParams, TfrPower, TfrResult};

/// Everything [`run_pipeline`] produces.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Epochs after rejection.
    pub epochs: EpochSet,
    /// Indices into the caller's `events` of targets skipped at the recording edges.
    pub dropped: Vec<usize>,
    pub evoked: Evoked,
    pub spectrum: Spectrum,
    pub tfr: TfrResult,
}

/// Run the **full epoching + time-frequency pipeline** on one recording.
///
/// # Pipeline steps
///
/// 1. Crop to [`PipelineConfig::crop`] and re-base the events.
/// 2. Zero-phase FIR filter between [`PipelineConfig::l_freq`] and [`PipelineConfig::h_freq`].
/// 3. If `ica` is given, remove the components in [`PipelineConfig::ica_exclude`].
/// 4. Extract epochs around [`PipelineConfig::target_label`] with the
///    configured window, baseline and duplicate/overflow policies.
/// 5. Reject bad epochs with `rejector`, or with a [`PeakToPeakRejector`]
///    when [`PipelineConfig::reject_ptp`] / [`PipelineConfig::flat_ptp`] is set.
/// 6. Average into an [`Evoked`] response.
/// 7. Welch PSD ([`PipelineConfig::psd`]).
/// 8. Morlet TFR ([`PipelineConfig::tfr`]), then rescale power against
///    [`PipelineConfig::tfr_baseline`].
///
/// The inputs are never modified. Event indices, in
/// [`PipelineOutput::dropped`] and in errors, refer to `events` as passed in.
///
/// # Errors
///
/// Any stage error, e.g. [`Error::NoMatchingEvents`] or, when rejection
/// removes every epoch, [`Error::EmptyEpochSet`].
pub fn run_pipeline(
    signal: &ContinuousSignal,
    events: &[Event],
    ica: Option<&IcaModel>,
    rejector: Option<&dyn EpochRejector>,
    cfg: &PipelineConfig,
) -> Result<PipelineOutput> {
    // 1. Crop. `origin[i]` is the caller's index of the i-th kept event.
    let (signal, events, origin) = match cfg.crop {
        Some((tmin, tmax)) => {
            let (first, last) = signal.crop_bounds(tmin, tmax)?;
            let cropped = signal.crop_samples(first, last);
            let (events, origin) = shift_events_indexed(events, first, cropped.n_times());
            (cropped, events, origin)
        }
        None => (signal.clone(), events.to_vec(), (0..events.len()).collect()),
    };

    // 2. Filter.
    let signal = if cfg.l_freq.is_some() || cfg.h_freq.is_some() {
        signal.filter(cfg.l_freq, cfg.h_freq)?
    } else {
        signal
    };

    // 3. ICA.
    let signal = match ica {
        Some(model) => model.apply(&signal, &cfg.ica_exclude)?,
        None => {
            if !cfg.ica_exclude.is_empty() {
                log::debug!("no ICA model supplied, ignoring exclude list {:?}", cfg.ica_exclude);
            }
            signal
        }
    };

    // 4. Epochs.
    let Extraction { epochs, dropped } =
        extract(&signal, &events, &cfg.target_label, &cfg.epoch_params())
            .map_err(|e| to_caller_indices(e, &origin))?;
    let dropped: Vec<usize> = dropped.into_iter().map(|i| origin[i]).collect();

    // 5. Rejection.
    let ptp;
    let rejector = match rejector {
        Some(r) => Some(r),
        None if cfg.reject_ptp.is_some() || cfg.flat_ptp.is_some() => {
            ptp = PeakToPeakRejector::new(cfg.reject_ptp, cfg.flat_ptp)?;
            Some(&ptp as &dyn EpochRejector)
        }
        None => None,
    };
    let epochs = match rejector {
        Some(r) => r.reject(&epochs)?,
        None => epochs,
    };

    // 6–8. Aggregates.
    let evoked = epochs.average()?;
    let spectrum = welch(&epochs, &cfg.psd)?;
    let mut tfr = estimate(&epochs, &cfg.tfr)?;
    if let Some(b) = cfg.tfr_baseline {
        tfr = tfr.apply_baseline(b, cfg.tfr_baseline_mode)?;
    }

    Ok(PipelineOutput { epochs, dropped, evoked, spectrum, tfr })
}

/// Rewrite event indices in an extraction error from the cropped list to the caller's.
fn to_caller_indices(err: Error, origin: &[usize]) -> Error {
    match err {
        Error::OutOfBounds { event_index, sample, start, stop, n_times } => Error::OutOfBounds {
            event_index: origin[event_index],
            sample,
            start,
            stop,
            n_times,
        },
        Error::DuplicateEvent { sample, first, second } => Error::DuplicateEvent {
            sample,
            first: origin[first],
            second: origin[second],
        },
        other => other,
    }
}

impl PipelineOutput {
    /// Write evoked, PSD and TFR arrays plus their axes to a safetensors file.
    ///
    /// Output keys:
    ///   evoked        [C, T]        f64
    ///   epoch_times   [T]           f64
    ///   psd           [C, F_psd]    f64  mean over epochs
    ///   psd_freqs     [F_psd]       f64
    ///   power         [C, F, T'] or [E, C, F, T']  f64
    ///   itc           [C, F, T']    f64  (when computed)
    ///   tfr_freqs     [F]           f64
    ///   tfr_times     [T']          f64
    ///   ch_names      U8            newline-separated
    ///   n_epochs      [1]           i32
    ///   dropped       [D]           i64
    pub fn write(&self, path: &Path) -> Result<()> {
        let mut w = StWriter::new();
        w.add_f64_array("evoked", self.evoked.data());
        w.add_f64("epoch_times", self.epochs.times(), &[self.epochs.n_times()]);
        w.add_f64_array("psd", &self.spectrum.mean_over_epochs());
        w.add_f64("psd_freqs", self.spectrum.freqs(), &[self.spectrum.freqs().len()]);
        match self.tfr.power() {
            TfrPower::Average(p) => w.add_f64_array("power", p),
            TfrPower::Epochs(p) => w.add_f64_array("power", p),
        }
        if let Some(itc) = self.tfr.itc() {
            w.add_f64_array("itc", itc);
        }
        w.add_f64("tfr_freqs", self.tfr.freqs(), &[self.tfr.freqs().len()]);
        w.add_f64("tfr_times", self.tfr.times(), &[self.tfr.times().len()]);
        w.add_strings("ch_names", self.epochs.ch_names());
        w.add_i32("n_epochs", &[self.epochs.n_epochs() as i32], &[1]);
        let dropped: Vec<i64> = self.dropped.iter().map(|&d| d as i64).collect();
        w.add_i64("dropped", &dropped, &[dropped.len()]);
        if let Some((b, mode)) = self.tfr.baseline() {
            w.add_metadata("tfr_baseline", &serde_json::json!({ "baseline": b, "mode": mode }).to_string());
        }
        w.write(path)
    }
}
