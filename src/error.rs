//! Error type shared by every pipeline stage.
//!
//! Every failure is permanent: the offending values are carried in the
//! variant and no partial result is returned alongside an error.
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("no events with label {target:?} (available labels: {available:?})")]
    NoMatchingEvents {
        target: String,
        available: Vec<String>,
    },

    #[error(
        "epoch window [{start}, {stop}] for event #{event_index} at sample {sample} \
         exceeds signal bounds [0, {n_times})"
    )]
    OutOfBounds {
        event_index: usize,
        sample: usize,
        start: i64,
        stop: i64,
        n_times: usize,
    },

    #[error("events #{first} and #{second} share sample {sample}")]
    DuplicateEvent {
        sample: usize,
        first: usize,
        second: usize,
    },

    #[error("epoch set is empty")]
    EmptyEpochSet,

    #[error("frequency {freq} Hz must lie in (0, {nyquist}) Hz")]
    InvalidFrequency { freq: f64, nyquist: f64 },

    #[error("wavelet for {freq} Hz has {wavelet_len} samples, longer than the {n_times}-sample epoch")]
    WaveletTooLong {
        freq: f64,
        wavelet_len: usize,
        n_times: usize,
    },

    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
