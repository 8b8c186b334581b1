//! Bad-epoch rejection.
//!
//! [`EpochRejector`] is the seam for any rejection or repair stage (an
//! AutoReject-style model, manual inspection, …). Implementations return an
//! [`EpochSet`] with the same channels and time axis and possibly fewer
//! epochs. [`PeakToPeakRejector`] is the built-in amplitude criterion, the
//! equivalent of `mne.Epochs(..., reject=..., flat=...)`.
use serde::{Deserialize, Serialize};

use crate::epoch::EpochSet;
use crate::error::{Error, Result};

pub trait EpochRejector {
    fn reject(&self, epochs: &EpochSet) -> Result<EpochSet>;
}

/// Drop epochs where any channel's peak-to-peak amplitude exceeds `reject`
/// or falls below `flat`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PeakToPeakRejector {
    pub reject: Option<f64>,
    pub flat: Option<f64>,
}

impl PeakToPeakRejector {
    pub fn new(reject: Option<f64>, flat: Option<f64>) -> Result<Self> {
        for (name, v) in [("reject", reject), ("flat", flat)] {
            if let Some(v) = v {
                if !(v.is_finite() && v >= 0.0) {
                    return Err(Error::InvalidParameter(format!(
                        "{name} threshold must be a non-negative number, got {v}"
                    )));
                }
            }
        }
        Ok(Self { reject, flat })
    }

    /// Name of the first channel of `epoch` violating a threshold.
    fn offending_channel<'a>(&self, epochs: &'a EpochSet, epoch: usize) -> Option<&'a str> {
        epochs.epoch(epoch).rows().into_iter().enumerate().find_map(|(c, row)| {
            let (lo, hi) = row
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
            let ptp = hi - lo;
            let too_big = self.reject.is_some_and(|r| ptp > r);
            let too_flat = self.flat.is_some_and(|f| ptp < f);
            (too_big || too_flat).then(|| epochs.ch_names()[c].as_str())
        })
    }
}

impl EpochRejector for PeakToPeakRejector {
    fn reject(&self, epochs: &EpochSet) -> Result<EpochSet> {
        let keep: Vec<usize> = (0..epochs.n_epochs())
            .filter(|&e| match self.offending_channel(epochs, e) {
                Some(ch) => {
                    log::warn!("rejecting epoch #{e}: peak-to-peak out of range on {ch}");
                    false
                }
                None => true,
            })
            .collect();
        log::info!("kept {} of {} epochs", keep.len(), epochs.n_epochs());
        epochs.select(&keep)
    }
}
