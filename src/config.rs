//! Pipeline configuration.
//!
//! [`PipelineConfig`] holds every tunable parameter of [`run_pipeline`](crate::run_pipeline).
//! The defaults reproduce the picture-naming tutorial: 1–45 Hz band-pass,
//! epochs of −0.2…0.4 s around event `"33273"`, Morlet power at 10
//! log-spaced frequencies between 6 and 35 Hz.
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::baseline::{Baseline, BaselineMode};
use crate::epoch::{DuplicatePolicy, EpochParams, OverflowPolicy};
use crate::psd::WelchParams;
use crate::tfr::TfrParams;

/// Configuration for the full epoching + time-frequency pipeline.
///
/// All fields are `pub` so you can construct one with struct-update syntax:
///
/// ```
/// use eegtf::PipelineConfig;
///
/// let cfg = PipelineConfig {
///     target_label: "42".into(),
///     h_freq: Some(30.0),
///     ..PipelineConfig::default()
/// };
/// ```
///
/// Any subset of fields can also be given in a JSON file, see
/// [`PipelineConfig::from_json_file`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Keep only `[crop_tmin, crop_tmax]` seconds of the recording.
    ///
    /// `None` keeps the whole recording.
    ///
    /// Default: `Some((50.0, 550.0))`.
    pub crop: Option<(f64, f64)>,

    /// High-pass edge of the FIR filter in Hz (`None` = no high-pass).
    ///
    /// Default: `Some(1.0)`.
    pub l_freq: Option<f64>,

    /// Low-pass edge of the FIR filter in Hz (`None` = no low-pass).
    ///
    /// Default: `Some(45.0)`.
    pub h_freq: Option<f64>,

    /// ICA components to remove when a model is supplied.
    ///
    /// Default: `[0, 1, 6]`.
    pub ica_exclude: Vec<usize>,

    /// Label of the events to epoch around.
    ///
    /// Default: `"33273"` (picture onset).
    pub target_label: String,

    /// Epoch start relative to the event in seconds.
    ///
    /// Default: `-0.2`.
    pub tmin: f64,

    /// Epoch end relative to the event in seconds (inclusive).
    ///
    /// Default: `0.4`.
    pub tmax: f64,

    /// Baseline subtracted from every epoch.
    ///
    /// Default: `(None, 0.0)`, from the epoch start to the event.
    pub epoch_baseline: Option<Baseline>,

    /// Default: [`DuplicatePolicy::Merge`].
    pub on_duplicate: DuplicatePolicy,

    /// Default: [`OverflowPolicy::Abort`].
    pub on_overflow: OverflowPolicy,

    /// Peak-to-peak rejection threshold (signal units); `None` disables it.
    ///
    /// Default: `None`.
    pub reject_ptp: Option<f64>,

    /// Minimum peak-to-peak amplitude; `None` disables it.
    ///
    /// Default: `None`.
    pub flat_ptp: Option<f64>,

    /// Welch PSD parameters.
    pub psd: WelchParams,

    /// Morlet TFR parameters.
    pub tfr: TfrParams,

    /// Baseline interval for TFR power rescaling; `None` leaves power raw.
    ///
    /// Default: `(-0.2, 0.0)`.
    pub tfr_baseline: Option<Baseline>,

    /// Default: [`BaselineMode::LogRatio`].
    pub tfr_baseline_mode: BaselineMode,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            crop: Some((50.0, 550.0)),
            l_freq: Some(1.0),
            h_freq: Some(45.0),
            ica_exclude: vec![0, 1, 6],
            target_label: "33273".into(),
            tmin: -0.2,
            tmax: 0.4,
            epoch_baseline: Some(Baseline::new(None, Some(0.0))),
            on_duplicate: DuplicatePolicy::Merge,
            on_overflow: OverflowPolicy::Abort,
            reject_ptp: None,
            flat_ptp: None,
            psd: WelchParams::default(),
            tfr: TfrParams::default(),
            tfr_baseline: Some(Baseline::new(Some(-0.2), Some(0.0))),
            tfr_baseline_mode: BaselineMode::LogRatio,
        }
    }
}

impl PipelineConfig {
    /// Read a JSON file; missing fields keep their defaults.
    ///
    /// ```json
    /// { "target_label": "7", "tmax": 0.8, "tfr": { "decim": 1 } }
    /// ```
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Epoching parameters derived from this configuration.
    pub fn epoch_params(&self) -> EpochParams {
        let params = EpochParams::new(self.tmin, self.tmax, self.on_duplicate, self.on_overflow);
        match self.epoch_baseline {
            Some(b) => params.with_baseline(b),
            None => params,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_tutorial() {
        let cfg = PipelineConfig::default();
        let p = cfg.epoch_params();
        assert_eq!(p.n_times(1024.0), 615);
        assert_eq!(p.on_duplicate, DuplicatePolicy::Merge);
        assert_eq!(cfg.tfr.decim, 3);
        assert_eq!(cfg.tfr.freqs.len(), 10);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: PipelineConfig = serde_json::from_str(
            r#"{ "target_label": "7", "on_overflow": "drop", "tfr": { "decim": 1 },
                 "epoch_baseline": null }"#,
        )
        .unwrap();
        assert_eq!(cfg.target_label, "7");
        assert_eq!(cfg.on_overflow, OverflowPolicy::Drop);
        assert_eq!(cfg.tfr.decim, 1);
        assert_eq!(cfg.tfr.freqs.len(), 10);
        assert!(cfg.epoch_baseline.is_none());
        assert_eq!(cfg.tmin, -0.2);
    }

    #[test]
    fn config_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        std::fs::write(&path, r#"{ "tmax": 0.8, "l_freq": null }"#).unwrap();
        let cfg = PipelineConfig::from_json_file(&path).unwrap();
        assert_eq!(cfg.tmax, 0.8);
        assert_eq!(cfg.l_freq, None);
        assert_eq!(cfg.h_freq, Some(45.0));
    }
}
