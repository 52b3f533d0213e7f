//! Configured kernels for the 1D signal primitives.
//!
//! Each family (`ResampleKernel`, `ResamplePolyKernel`, `UpFirDnKernel`,
//! `ConvolveKernel`, `SosFiltKernel`, `WienerKernel`, `HilbertKernel`,
//! `FirWinKernel`, `WindowKernel`) is built once through
//! [`KernelLifecycle::try_new`], which rejects a bad config with a
//! [`ConfigError`] before any samples are touched. Running a kernel reads
//! through [`Read1D`] and writes through [`Write1D`], so slices, arrays,
//! `Vec` and contiguous `ndarray::Array1` all work as buffers. Failures at
//! run time are [`ExecInvariantViolation`]s, which convert into
//! [`sigtwin::Error`](crate::Error) for callers of the function API.

mod errors;
mod io;
mod lifecycle;

pub use errors::*;
pub use io::*;
pub use lifecycle::*;
