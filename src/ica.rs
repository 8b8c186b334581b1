//! Artifact removal with a pre-fitted ICA decomposition.
//!
//! Fitting is done elsewhere; this module only back-projects. The caller
//! lists the components to remove (typically chosen by inspecting their
//! topographies and time courses), matching `ica.exclude = [...]` followed
//! by `ica.apply(raw)`.
use ndarray::{Array1, Array2, Axis};

use crate::error::{Error, Result};
use crate::signal::ContinuousSignal;

/// Linear unmixing `S = W (X - μ)` and mixing `X ≈ A S + μ`.
#[derive(Debug, Clone)]
pub struct IcaModel {
    /// `A`: `[C, K]`
    mixing: Array2<f64>,
    /// `W`: `[K, C]`
    unmixing: Array2<f64>,
    /// `μ`: `[C]`
    mean: Array1<f64>,
}

impl IcaModel {
    /// # Errors
    ///
    /// [`Error::ShapeMismatch`] unless `mixing` is `[C, K]`, `unmixing`
    /// `[K, C]` and `mean` `[C]`.
    pub fn new(mixing: Array2<f64>, unmixing: Array2<f64>, mean: Array1<f64>) -> Result<Self> {
        let (c, k) = mixing.dim();
        if unmixing.dim() != (k, c) || mean.len() != c {
            return Err(Error::ShapeMismatch(format!(
                "mixing {:?}, unmixing {:?}, mean {} are not consistent",
                mixing.dim(),
                unmixing.dim(),
                mean.len()
            )));
        }
        Ok(Self { mixing, unmixing, mean })
    }

    /// Model for data that was already centred before fitting.
    pub fn without_mean(mixing: Array2<f64>, unmixing: Array2<f64>) -> Result<Self> {
        let c = mixing.nrows();
        Self::new(mixing, unmixing, Array1::zeros(c))
    }

    pub fn n_components(&self) -> usize {
        self.unmixing.nrows()
    }

    pub fn n_channels(&self) -> usize {
        self.mixing.nrows()
    }

    /// Component time courses `[K, T]`.
    pub fn sources(&self, signal: &ContinuousSignal) -> Result<Array2<f64>> {
        self.check_channels(signal)?;
        let centred = signal.data() - &self.mean.view().insert_axis(Axis(1));
        Ok(self.unmixing.dot(&centred))
    }

    /// Remove the back-projection of the `exclude`d components.
    ///
    /// An empty `exclude` returns an unchanged copy.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidParameter`] for a component index `>= n_components()`.
    /// * [`Error::ShapeMismatch`] if the signal's channel count differs.
    pub fn apply(&self, signal: &ContinuousSignal, exclude: &[usize]) -> Result<ContinuousSignal> {
        self.check_channels(signal)?;
        if let Some(&bad) = exclude.iter().find(|&&k| k >= self.n_components()) {
            return Err(Error::InvalidParameter(format!(
                "ICA component {bad} out of range for {} components",
                self.n_components()
            )));
        }
        if exclude.is_empty() {
            return Ok(signal.clone());
        }
        let mut picks = exclude.to_vec();
        picks.sort_unstable();
        picks.dedup();
        log::info!("removing {} ICA components: {picks:?}", picks.len());

        let sources = self.sources(signal)?.select(Axis(0), &picks);
        let artifact = self.mixing.select(Axis(1), &picks).dot(&sources);
        Ok(signal.with_data(signal.data() - &artifact))
    }

    fn check_channels(&self, signal: &ContinuousSignal) -> Result<()> {
        if signal.n_channels() != self.n_channels() {
            return Err(Error::ShapeMismatch(format!(
                "ICA model has {} channels, signal has {}",
                self.n_channels(),
                signal.n_channels()
            )));
        }
        Ok(())
    }
}
