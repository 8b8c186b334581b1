//! Overlap-add zero-phase FIR convolution.
//!
//! Matches MNE's `_overlap_add_filter` + `_1d_overlap_filter`.
//!
//! Zero-phase is achieved by shifting the output left by `(N-1)/2` samples,
//! NOT by running filtfilt. The edge transient is suppressed by
//! reflect-limited padding of `N-1` samples on each side.
use ndarray::{Array2, ArrayView1};
use rayon::prelude::*;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use crate::error::{Error, Result};
use crate::fft::real_spectrum;

/// Apply a zero-phase FIR filter to each channel of `data` (`[C, T]`) in-place.
///
/// Channels are filtered in parallel. `h` must have odd length
/// (guaranteed by every `design_*` helper).
pub fn apply_fir_zero_phase(data: &mut Array2<f64>, h: &[f64]) -> Result<()> {
    check_odd(h)?;
    let filtered: Vec<Vec<f64>> = (0..data.nrows())
        .into_par_iter()
        .map(|ch| filter_1d(&data.row(ch).to_vec(), h))
        .collect::<Result<_>>()?;
    for (ch, row) in filtered.iter().enumerate() {
        data.row_mut(ch).assign(&ArrayView1::from(row.as_slice()));
    }
    Ok(())
}

/// Filter a single 1-D signal with the overlap-add algorithm.
///
/// Returns a vector of the same length as `x`.
pub fn filter_1d(x: &[f64], h: &[f64]) -> Result<Vec<f64>> {
    if x.is_empty() {
        return Ok(vec![]);
    }
    check_odd(h)?;

    let n_h = h.len();
    let shift = (n_h - 1) / 2;
    let n_edge = n_h - 1;

    let x_ext = reflect_limited_pad(x, n_edge, n_edge);
    let n_ext = x_ext.len();
    let n_fft = choose_fft_len(n_h, n_ext);
    let h_fft = real_spectrum(h, n_fft);

    let mut planner = FftPlanner::<f64>::new();
    let fwd = planner.plan_fft_forward(n_fft);
    let inv = planner.plan_fft_inverse(n_fft);
    let scale = 1.0 / n_fft as f64;

    let n_seg = n_fft - n_h + 1;
    let mut acc = vec![0.0_f64; n_ext];
    let mut buf = vec![Complex::<f64>::default(); n_fft];

    for start in (0..n_ext).step_by(n_seg) {
        let stop = (start + n_seg).min(n_ext);
        buf.fill(Complex::default());
        for (b, &v) in buf.iter_mut().zip(&x_ext[start..stop]) {
            b.re = v;
        }
        fwd.process(&mut buf);
        buf.iter_mut().zip(&h_fft).for_each(|(b, hf)| *b *= *hf);
        inv.process(&mut buf);

        // Segment output lands `shift` samples earlier for zero phase.
        let skip = shift.saturating_sub(start);
        let out_start = start.saturating_sub(shift);
        for (o, p) in (out_start..n_ext).zip(skip..n_fft) {
            acc[o] += buf[p].re * scale;
        }
    }

    Ok(acc[n_edge..n_edge + x.len()].to_vec())
}

fn check_odd(h: &[f64]) -> Result<()> {
    if h.len() % 2 == 0 {
        return Err(Error::InvalidParameter(format!(
            "zero-phase FIR needs an odd number of taps, got {}",
            h.len()
        )));
    }
    Ok(())
}

/// Reflect-limited padding (matches MNE's `_smart_pad`).
///
/// Left:  `pad[i] = 2*x[0] - x[n_l-i]`  for i in 1..=n_l
/// Right: `pad[i] = 2*x[-1] - x[-(i+1)]` for i in 1..=n_r
///
/// Padding beyond what the signal can mirror is zero-filled.
fn reflect_limited_pad(x: &[f64], n_l: usize, n_r: usize) -> Vec<f64> {
    let n = x.len();
    let mirror_l = n_l.min(n - 1);
    let mirror_r = n_r.min(n - 1);
    let first = x[0];
    let last = x[n - 1];

    let mut out = Vec::with_capacity(n_l + n + n_r);
    out.extend(std::iter::repeat(0.0).take(n_l - mirror_l));
    out.extend((1..=mirror_l).rev().map(|i| 2.0 * first - x[i]));
    out.extend_from_slice(x);
    out.extend((1..=mirror_r).map(|i| 2.0 * last - x[n - 1 - i]));
    out.extend(std::iter::repeat(0.0).take(n_r - mirror_r));
    out
}

/// Choose the FFT block size (power of 2 minimising operation count).
///
/// Matches MNE's cost function:
///   `cost = ceil(n_x / (N - n_h + 1)) * N * (log2(N) + 1) + 4e-5 * N * n_x`
fn choose_fft_len(n_h: usize, n_x: usize) -> usize {
    let min_fft = 2 * n_h - 1;
    let min_pow = (min_fft as f64).log2().ceil() as u32;
    let max_pow = ((n_x as f64).log2().ceil() as u32 + 1).max(min_pow);

    (min_pow..=max_pow)
        .map(|pow| {
            let n = 1_usize << pow;
            let n_seg = (n - n_h + 1) as f64;
            let cost = (n_x as f64 / n_seg).ceil() * n as f64 * (pow as f64 + 1.0)
                + 4e-5 * n as f64 * n_x as f64;
            (n, cost)
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(n, _)| n)
        .unwrap_or(1 << max_pow)
}
