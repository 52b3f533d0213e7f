//! Linear convolution and correlation, 1D and 2D.
//!
//! Functions located in the [`Convolution` section of
//! `scipy.signal`](https://docs.scipy.org/doc/scipy/reference/signal.html#convolution).

use sigtwin_core::num_rs::{apply_mode, convolve_full, next_fast_len, ConvolveMode};
use sigtwin_core::{Error, Result};

use crate::signal::fft::{self, PlanSource};
use crate::signal::Sample;

mod kernels;
mod method;
mod two_d;

pub use kernels::*;
pub use method::*;
pub use two_d::*;

pub(crate) fn validate_operands<T>(a: &[T], b: &[T]) -> Result<()> {
    if a.is_empty() {
        return Err(Error::invalid_arg("in1", "input must be non-empty."));
    }
    if b.is_empty() {
        return Err(Error::invalid_arg("in2", "input must be non-empty."));
    }
    Ok(())
}

/// Full-length convolution through zero-padded transforms of length
/// `next_fast_len(len(a) + len(b) - 1)`.
pub(crate) fn fft_convolve_full<T: Sample>(a: &[T], b: &[T], source: PlanSource) -> Vec<T> {
    let full = a.len() + b.len() - 1;
    let n = next_fast_len(full);
    let mut fa = fft::to_complex_padded(a, n);
    let mut fb = fft::to_complex_padded(b, n);
    fft::forward(&mut fa, source);
    fft::forward(&mut fb, source);
    fa.iter_mut().zip(fb.iter()).for_each(|(x, y)| *x *= *y);
    fft::inverse_normalized(&mut fa, source);
    fa.truncate(full);
    fa.into_iter().map(T::from_complex).collect()
}

/// Reverse and conjugate: turns a correlation into a convolution.
pub(crate) fn reverse_conj<T: Sample>(b: &[T]) -> Vec<T> {
    b.iter().rev().map(|v| v.conj_sample()).collect()
}

///
/// Convolve two 1D signals.
///
/// <https://docs.scipy.org/doc/scipy/reference/generated/scipy.signal.convolve.html>
///
/// * `mode`: output extent, see [`ConvolveMode`]. `Valid` does not require
///   `in1` to be the longer operand.
/// * `method`: [`ConvMethod::Auto`] defers to [`choose_conv_method`].
///
/// ```
/// use sigtwin::signal::convolve::{convolve, ConvMethod};
/// use sigtwin_core::num_rs::ConvolveMode;
///
/// let y = convolve(&[1., 2., 3.], &[0., 1., 0.5], ConvolveMode::Full, ConvMethod::Direct).unwrap();
/// assert_eq!(y, vec![0., 1., 2.5, 4., 1.5]);
/// ```
///
pub fn convolve<T: Sample>(
    in1: &[T],
    in2: &[T],
    mode: ConvolveMode,
    method: ConvMethod,
) -> Result<Vec<T>> {
    validate_operands(in1, in2)?;
    let method = ConvCostModel::default().resolve(method, in1.len(), in2.len(), mode);
    tracing::trace!(
        in1 = in1.len(),
        in2 = in2.len(),
        mode = mode.as_str(),
        method = method.as_str(),
        "convolve"
    );
    let full = match method {
        ConvMethod::Fft => fft_convolve_full(in1, in2, PlanSource::Fresh),
        _ => convolve_full(in1, in2),
    };
    Ok(apply_mode(&full, in1.len(), in2.len(), mode))
}

///
/// Cross-correlate two 1D signals.
///
/// <https://docs.scipy.org/doc/scipy/reference/generated/scipy.signal.correlate.html>
///
/// Computed as `convolve(in1, conj(reverse(in2)))` with the same `mode` and
/// `method`.
///
pub fn correlate<T: Sample>(
    in1: &[T],
    in2: &[T],
    mode: ConvolveMode,
    method: ConvMethod,
) -> Result<Vec<T>> {
    validate_operands(in1, in2)?;
    convolve(in1, &reverse_conj(in2), mode, method)
}

///
/// Convolve two 1D signals using the FFT.
///
/// <https://docs.scipy.org/doc/scipy/reference/generated/scipy.signal.fftconvolve.html>
///
pub fn fftconvolve<T: Sample>(in1: &[T], in2: &[T], mode: ConvolveMode) -> Result<Vec<T>> {
    convolve(in1, in2, mode, ConvMethod::Fft)
}
