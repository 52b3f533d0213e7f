use std::{error, fmt};

/// Location and magnitude of the worst element-wise disagreement found by the
/// equivalence oracle.
#[derive(Debug, Clone, PartialEq)]
pub struct Deviation {
    /// Multi-index of the worst element.
    pub index: Vec<usize>,
    /// Absolute difference at `index`.
    pub abs_diff: f64,
    /// Allowed absolute difference at `index` (`atol + rtol * |reference|`).
    pub allowed: f64,
    /// Number of elements outside tolerance.
    pub violations: usize,
    /// Number of elements compared.
    pub total: usize,
}

impl fmt::Display for Deviation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "max |ref - acc| = {:e} at {:?} (allowed {:e}); {} of {} elements out of tolerance",
            self.abs_diff, self.index, self.allowed, self.violations, self.total
        )
    }
}

/// Errors raised whilst running sigtwin.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Argument parsed into function were invalid.
    InvalidArg {
        /// The invalid arg
        arg: String,
        /// Explaining why arg is invalid.
        reason: String,
    },
    /// Two or more optional arguments passed into functions conflict.
    ConflictArg {
        /// Explaining what arg is invalid.
        reason: String,
    },
    /// Execution was attempted with a violated kernel invariant.
    ExecInvariantViolation {
        /// Why execution could not proceed.
        reason: String,
    },
    /// Reference and accelerated outputs do not have the same shape.
    ShapeMismatch {
        /// Shape of the reference output.
        reference: Vec<usize>,
        /// Shape of the accelerated output.
        accelerated: Vec<usize>,
    },
    /// Reference and accelerated outputs disagree beyond tolerance.
    EquivalenceViolation(Deviation),
}

impl Error {
    /// Shorthand for [`Error::InvalidArg`].
    pub fn invalid_arg(arg: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidArg {
            arg: arg.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidArg { arg, reason } => {
                write!(f, "Invalid argument `{arg}`: {reason}")
            }
            Error::ConflictArg { reason } => write!(f, "Conflicting arguments: {reason}"),
            Error::ExecInvariantViolation { reason } => {
                write!(f, "Execution invariant violation: {reason}")
            }
            Error::ShapeMismatch {
                reference,
                accelerated,
            } => write!(
                f,
                "Output shape mismatch: reference {reference:?}, accelerated {accelerated:?}"
            ),
            Error::EquivalenceViolation(deviation) => {
                write!(f, "Equivalence violation: {deviation}")
            }
        }
    }
}

impl error::Error for Error {}

/// Result alias for sigtwin operations.
pub type Result<T> = core::result::Result<T, Error>;
