//! Element-wise equivalence checking between backend outputs.

use ndarray::{ArrayView, Dimension};
use sigtwin_core::{Deviation, Error, Result};

use crate::signal::{Real, Sample};

/// Absolute-plus-relative tolerance: `|ref - acc| <= atol + rtol * |ref|`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    /// Relative tolerance.
    pub rtol: f64,
    /// Absolute tolerance.
    pub atol: f64,
    /// Require bit-for-bit equality instead.
    pub exact: bool,
}

impl Tolerance {
    /// Tolerance with the given bounds.
    pub fn new(rtol: f64, atol: f64) -> Self {
        Self {
            rtol,
            atol,
            exact: false,
        }
    }

    /// Default bounds for a float width: `1e-7 / 1e-5` for `f64`,
    /// `1e-3 / 1e-3` for `f32`.
    pub fn for_dtype<F: Real>() -> Self {
        if core::mem::size_of::<F>() == core::mem::size_of::<f32>() {
            Self::new(1e-3, 1e-3)
        } else {
            Self::new(1e-7, 1e-5)
        }
    }

    /// Bit equality.
    pub fn exact() -> Self {
        Self {
            rtol: 0.0,
            atol: 0.0,
            exact: true,
        }
    }

    fn allowed(&self, reference: f64) -> f64 {
        if self.exact {
            0.0
        } else {
            self.atol + self.rtol * reference
        }
    }
}

/// Summary of a passing comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct EquivalenceReport {
    /// Largest absolute difference seen.
    pub max_abs_diff: f64,
    /// Multi-index of that difference; empty when all elements are equal.
    pub index: Vec<usize>,
    /// Number of elements compared.
    pub total: usize,
}

///
/// Check that `accelerated` matches `reference` element by element.
///
/// Complex elements are compared by the modulus of their difference. Equal
/// elements always pass, including matching infinities. Otherwise a NaN or
/// infinite difference counts as a violation. Shapes must match exactly.
///
/// Returns [`Error::ShapeMismatch`] or [`Error::EquivalenceViolation`] (with
/// the worst element and the violation count) on failure.
///
pub fn assert_equivalent<T, D>(
    reference: ArrayView<'_, T, D>,
    accelerated: ArrayView<'_, T, D>,
    tolerance: Tolerance,
) -> Result<EquivalenceReport>
where
    T: Sample,
    D: Dimension,
{
    if reference.shape() != accelerated.shape() {
        return Err(Error::ShapeMismatch {
            reference: reference.shape().to_vec(),
            accelerated: accelerated.shape().to_vec(),
        });
    }

    let reference = reference.into_dyn();
    let accelerated = accelerated.into_dyn();
    let mut max_abs_diff = 0.0f64;
    let mut index = Vec::new();
    let mut worst: Option<(Vec<usize>, f64, f64, f64)> = None;
    let mut violations = 0usize;

    for ((idx, &r), &a) in reference.indexed_iter().zip(accelerated.iter()) {
        // Equal infinities subtract to NaN.
        let diff = if r == a {
            0.0
        } else {
            (r - a).modulus().widen()
        };
        let allowed = tolerance.allowed(r.modulus().widen());
        let ok = r == a || (!tolerance.exact && diff.is_finite() && diff <= allowed);
        if !ok {
            violations += 1;
            let excess = if diff.is_finite() { diff - allowed } else { f64::INFINITY };
            if worst.as_ref().map_or(true, |w| excess > w.3) {
                worst = Some((idx.slice().to_vec(), diff, allowed, excess));
            }
        }
        if diff > max_abs_diff {
            max_abs_diff = diff;
            index = idx.slice().to_vec();
        }
    }

    match worst {
        Some((index, abs_diff, allowed, _)) => {
            tracing::trace!(violations, %abs_diff, "equivalence violated");
            Err(Error::EquivalenceViolation(Deviation {
                index,
                abs_diff,
                allowed,
                violations,
                total: reference.len(),
            }))
        }
        None => Ok(EquivalenceReport {
            max_abs_diff,
            index,
            total: reference.len(),
        }),
    }
}
