//! Core contracts shared across the sigtwin workspace.
//!
//! Holds the crate-wide [`Error`] type and the numpy-style convolution
//! helpers that both execution backends agree on.

mod error;

/// numpy-style numeric helpers.
pub mod num_rs;

pub use error::{Deviation, Error, Result};
