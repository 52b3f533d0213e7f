//! Trait interfaces for configured 1D signal kernels.
//!
//! Each capability has a `run_into` entrypoint writing into a caller-provided
//! buffer and a `run_alloc` entrypoint returning a fresh `Vec`.

use crate::kernel::{ExecInvariantViolation, Read1D, Write1D};
use nalgebra::Complex;

/// 1D convolution capability.
pub trait Convolve1D<T> {
    /// Run convolution into a caller-provided output buffer.
    fn run_into<I1, I2, O>(
        &self,
        in1: &I1,
        in2: &I2,
        out: &mut O,
    ) -> Result<(), ExecInvariantViolation>
    where
        I1: Read1D<T> + ?Sized,
        I2: Read1D<T> + ?Sized,
        O: Write1D<T> + ?Sized;

    /// Run convolution and allocate output.
    fn run_alloc<I1, I2>(&self, in1: &I1, in2: &I2) -> Result<Vec<T>, ExecInvariantViolation>
    where
        I1: Read1D<T> + ?Sized,
        I2: Read1D<T> + ?Sized;
}

/// 1D correlation capability.
pub trait Correlate1D<T> {
    /// Run correlation into a caller-provided output buffer.
    fn run_into<I1, I2, O>(
        &self,
        in1: &I1,
        in2: &I2,
        out: &mut O,
    ) -> Result<(), ExecInvariantViolation>
    where
        I1: Read1D<T> + ?Sized,
        I2: Read1D<T> + ?Sized,
        O: Write1D<T> + ?Sized;

    /// Run correlation and allocate output.
    fn run_alloc<I1, I2>(&self, in1: &I1, in2: &I2) -> Result<Vec<T>, ExecInvariantViolation>
    where
        I1: Read1D<T> + ?Sized,
        I2: Read1D<T> + ?Sized;
}

/// 1D resampling capability (Fourier or polyphase).
pub trait Resample1D<T> {
    /// Run resampling into a caller-provided output buffer.
    fn run_into<I, O>(&self, input: &I, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        I: Read1D<T> + ?Sized,
        O: Write1D<T> + ?Sized;

    /// Run resampling and allocate output.
    fn run_alloc<I>(&self, input: &I) -> Result<Vec<T>, ExecInvariantViolation>
    where
        I: Read1D<T> + ?Sized;
}

/// 1D upsample, FIR filter, downsample capability.
pub trait UpFirDn1D<T> {
    /// Run `upfirdn` into a caller-provided output buffer.
    fn run_into<I, O>(&self, input: &I, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        I: Read1D<T> + ?Sized,
        O: Write1D<T> + ?Sized;

    /// Run `upfirdn` and allocate output.
    fn run_alloc<I>(&self, input: &I) -> Result<Vec<T>, ExecInvariantViolation>
    where
        I: Read1D<T> + ?Sized;
}

/// 1D `sosfilt` capability.
///
/// Takes `&mut self`: filter state carries over between calls.
pub trait SosFilt1D<T> {
    /// Run second-order-sections filtering into a caller-provided output buffer.
    fn run_into<I, O>(&mut self, input: &I, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        I: Read1D<T> + ?Sized,
        O: Write1D<T> + ?Sized;

    /// Run second-order-sections filtering and allocate output.
    fn run_alloc<I>(&mut self, input: &I) -> Result<Vec<T>, ExecInvariantViolation>
    where
        I: Read1D<T> + ?Sized;
}

/// 1D Wiener denoising capability.
pub trait Wiener1D<T> {
    /// Run the Wiener filter into a caller-provided output buffer.
    fn run_into<I, O>(&self, input: &I, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        I: Read1D<T> + ?Sized,
        O: Write1D<T> + ?Sized;

    /// Run the Wiener filter and allocate output.
    fn run_alloc<I>(&self, input: &I) -> Result<Vec<T>, ExecInvariantViolation>
    where
        I: Read1D<T> + ?Sized;
}

/// 1D analytic-signal capability.
pub trait Hilbert1D<T> {
    /// Compute the analytic signal into a caller-provided output buffer.
    fn run_into<I, O>(&self, input: &I, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        I: Read1D<T> + ?Sized,
        O: Write1D<Complex<T>> + ?Sized;

    /// Compute the analytic signal and allocate output.
    fn run_alloc<I>(&self, input: &I) -> Result<Vec<Complex<T>>, ExecInvariantViolation>
    where
        I: Read1D<T> + ?Sized;
}

/// FIR design capability.
pub trait FirWinDesign<T> {
    /// Run FIR design into a caller-provided output buffer.
    fn run_into<O>(&self, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        O: Write1D<T> + ?Sized;

    /// Run FIR design and allocate output coefficients.
    fn run_alloc(&self) -> Result<Vec<T>, ExecInvariantViolation>;
}

/// Window generation capability.
pub trait WindowGenerate<T> {
    /// Run window generation into a caller-provided output buffer.
    fn run_into<O>(&self, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        O: Write1D<T> + ?Sized;

    /// Run window generation and allocate output samples.
    fn run_alloc(&self) -> Result<Vec<T>, ExecInvariantViolation>;
}
