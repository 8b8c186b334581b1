//! Small FFT helpers shared by the FIR filter, the Morlet convolution and
//! the Welch PSD.
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

/// Forward FFT of the real sequence `x`, zero-padded (or truncated) to `n_fft`.
pub fn real_spectrum(x: &[f64], n_fft: usize) -> Vec<Complex<f64>> {
    let mut buf: Vec<Complex<f64>> = x
        .iter()
        .map(|&re| Complex { re, im: 0.0 })
        .chain(std::iter::repeat(Complex::default()))
        .take(n_fft)
        .collect();
    FftPlanner::<f64>::new().plan_fft_forward(n_fft).process(&mut buf);
    buf
}

/// Forward FFT of the complex sequence `x`, zero-padded to `n_fft`.
pub fn complex_spectrum(x: &[Complex<f64>], n_fft: usize) -> Vec<Complex<f64>> {
    let mut buf: Vec<Complex<f64>> = x
        .iter()
        .copied()
        .chain(std::iter::repeat(Complex::default()))
        .take(n_fft)
        .collect();
    FftPlanner::<f64>::new().plan_fft_forward(n_fft).process(&mut buf);
    buf
}

/// Smallest 5-smooth number (`2^a · 3^b · 5^c`) that is `>= n`.
///
/// Same role as `scipy.fft.next_fast_len`: these sizes keep rustfft on its
/// fast mixed-radix paths.
pub fn next_fast_len(n: usize) -> usize {
    if n <= 1 {
        return 1;
    }
    let mut m = n;
    loop {
        let mut r = m;
        for p in [2, 3, 5] {
            while r % p == 0 {
                r /= p;
            }
        }
        if r == 1 {
            return m;
        }
        m += 1;
    }
}
