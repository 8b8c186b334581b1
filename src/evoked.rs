//! Evoked response: the epoch average.
use ndarray::Array2;

use crate::error::{Error, Result};

/// `[C, T]` average of `nave` epochs.
#[derive(Debug, Clone)]
pub struct Evoked {
    data: Array2<f64>,
    times: Vec<f64>,
    ch_names: Vec<String>,
    nave: usize,
}

impl Evoked {
    pub fn new(data: Array2<f64>, times: Vec<f64>, ch_names: Vec<String>, nave: usize) -> Result<Self> {
        if data.dim() != (ch_names.len(), times.len()) {
            return Err(Error::ShapeMismatch(format!(
                "evoked data is {:?}, expected ({}, {})",
                data.dim(),
                ch_names.len(),
                times.len()
            )));
        }
        Ok(Self { data, times, ch_names, nave })
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn ch_names(&self) -> &[String] {
        &self.ch_names
    }

    /// Number of epochs averaged.
    pub fn nave(&self) -> usize {
        self.nave
    }

    /// Waveform of channel `name`, if present.
    pub fn channel(&self, name: &str) -> Option<ndarray::ArrayView1<'_, f64>> {
        let idx = self.ch_names.iter().position(|n| n == name)?;
        Some(self.data.row(idx))
    }

    /// Channel and sample of the largest absolute deflection, with its latency.
    pub fn peak(&self) -> Option<(usize, f64, f64)> {
        self.data
            .indexed_iter()
            .max_by(|a, b| a.1.abs().total_cmp(&b.1.abs()))
            .map(|((c, t), &v)| (c, self.times[t], v))
    }
}
