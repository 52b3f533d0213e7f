//! Cascaded second-order-section filtering and FIR design.
//!
//! Functions located in the [`Filtering` section of
//! `scipy.signal`](https://docs.scipy.org/doc/scipy/reference/signal.html#filtering).

/// Digital FIR filter design and the SOS representation.
pub mod design;

mod kernels;
mod sosfilt;

pub use kernels::*;
pub use sosfilt::*;
