//! Signal processing primitives analogous to `scipy.signal`.
//!
//! Every function here is the host-executed reference form of an operation;
//! [`crate::backend`] pairs each one with a data-parallel counterpart.

/// Convolution and correlation.
pub mod convolve;
/// Spectral engine.
pub mod fft;
/// Digital filtering.
pub mod filter;
/// Analytic signal.
pub mod hilbert;
/// `upfirdn` and polyphase resampling.
pub mod multirate;
/// Fourier resampling.
pub mod resample;
/// Capability traits implemented by configured kernels.
pub mod traits;
/// Wiener denoising.
pub mod wiener;
/// Window functions.
pub mod windows;

mod sample;

pub use sample::{Real, Sample};
