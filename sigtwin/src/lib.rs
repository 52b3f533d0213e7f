#![deny(unsafe_code)]
#![warn(missing_docs)]
//! Dual-backend signal processing kernels.
//!
//! Each operation exists twice: a straightforward host implementation in
//! [`signal`] (exposed as [`backend::Reference`]) and an independent
//! data-parallel one ([`backend::Accelerated`]). The [`oracle`] checks that
//! the two agree within an absolute-plus-relative tolerance.

/// Re-export of the `nalgebra` crate (source of [`na::Complex`]).
pub use nalgebra as na;

pub use sigtwin_core::{num_rs, Deviation, Error, Result};

/// Execution backends behind a shared capability interface.
pub mod backend;

/// Trait-first kernel lifecycle and buffer adapters.
pub mod kernel;

/// Backend equivalence checking.
pub mod oracle;

/// Signal processing.
pub mod signal;
