use ndarray::{s, Array2, ArrayView2};
use sigtwin_core::num_rs::ConvolveMode;
use sigtwin_core::{Error, Result};

use crate::signal::Sample;

/// How `in1` is extended past its edges in 2D convolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Boundary {
    /// Pad with zeros.
    #[default]
    Fill,
    /// Circular extension.
    Wrap,
    /// Mirror with the edge sample repeated (`-1 -> 0`, `n -> n - 1`).
    Symm,
}

impl Boundary {
    /// Map a possibly out-of-range index into `0..n`, or `None` for a
    /// zero-filled position.
    pub fn resolve(self, i: isize, n: usize) -> Option<usize> {
        let n_i = n as isize;
        if (0..n_i).contains(&i) {
            return Some(i as usize);
        }
        match self {
            Boundary::Fill => None,
            Boundary::Wrap => Some(i.rem_euclid(n_i) as usize),
            Boundary::Symm => {
                let r = i.rem_euclid(2 * n_i);
                let mirrored = if r < n_i { r } else { 2 * n_i - 1 - r };
                Some(mirrored as usize)
            }
        }
    }

    /// Lower-case name as used by `scipy.signal`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Boundary::Fill => "fill",
            Boundary::Wrap => "wrap",
            Boundary::Symm => "symm",
        }
    }
}

/// Output geometry shared by both 2D backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Conv2dPlan {
    /// Operands were exchanged for `Valid` mode.
    pub swapped: bool,
    pub out_shape: (usize, usize),
    /// Offset of the first output cell inside the full result.
    pub start: (usize, usize),
}

pub(crate) fn plan_2d(
    a_shape: (usize, usize),
    b_shape: (usize, usize),
    mode: ConvolveMode,
) -> Result<Conv2dPlan> {
    if a_shape.0 == 0 || a_shape.1 == 0 {
        return Err(Error::invalid_arg("in1", "input must be non-empty."));
    }
    if b_shape.0 == 0 || b_shape.1 == 0 {
        return Err(Error::invalid_arg("in2", "input must be non-empty."));
    }
    let mut swapped = false;
    let (a_shape, b_shape) = if mode == ConvolveMode::Valid {
        let a_dominates = a_shape.0 >= b_shape.0 && a_shape.1 >= b_shape.1;
        let b_dominates = b_shape.0 >= a_shape.0 && b_shape.1 >= a_shape.1;
        if !a_dominates && !b_dominates {
            return Err(Error::invalid_arg(
                "in1",
                "For 'valid' mode, one must be at least as large as the other in every dimension",
            ));
        }
        swapped = !a_dominates;
        if swapped {
            (b_shape, a_shape)
        } else {
            (a_shape, b_shape)
        }
    } else {
        (a_shape, b_shape)
    };
    Ok(Conv2dPlan {
        swapped,
        out_shape: (
            mode.output_len(a_shape.0, b_shape.0),
            mode.output_len(a_shape.1, b_shape.1),
        ),
        start: (
            mode.slice_start(a_shape.0, b_shape.0),
            mode.slice_start(a_shape.1, b_shape.1),
        ),
    })
}

/// One cell of the full convolution: `sum_{k,l} ext(a)[i - k, j - l] * b[k, l]`,
/// accumulated row-major over `b`.
fn full_cell<T: Sample>(
    a: &ArrayView2<'_, T>,
    b: &ArrayView2<'_, T>,
    i: isize,
    j: isize,
    boundary: Boundary,
) -> T {
    let (m, n) = a.dim();
    let (p, q) = b.dim();
    let mut acc = T::zero();
    for k in 0..p {
        let row = boundary.resolve(i - k as isize, m);
        for l in 0..q {
            let value = match (row, boundary.resolve(j - l as isize, n)) {
                (Some(r), Some(c)) => a[[r, c]],
                _ => T::zero(),
            };
            acc += value * b[[k, l]];
        }
    }
    acc
}

///
/// Convolve two 2D arrays.
///
/// <https://docs.scipy.org/doc/scipy/reference/generated/scipy.signal.convolve2d.html>
///
/// Direct summation only. `boundary` decides what `in1` holds past its
/// edges. In `Valid` mode the operands are exchanged when `in2` is at least
/// as large as `in1` on both axes; shapes where neither dominates are
/// rejected.
///
pub fn convolve2d<T: Sample>(
    in1: ArrayView2<'_, T>,
    in2: ArrayView2<'_, T>,
    mode: ConvolveMode,
    boundary: Boundary,
) -> Result<Array2<T>> {
    let plan = plan_2d(in1.dim(), in2.dim(), mode)?;
    let (in1, in2) = (in1.view(), in2.view());
    let (a, b) = if plan.swapped { (in2, in1) } else { (in1, in2) };
    tracing::trace!(
        in1 = ?a.dim(),
        in2 = ?b.dim(),
        mode = mode.as_str(),
        boundary = boundary.as_str(),
        "convolve2d"
    );
    let (r0, c0) = plan.start;
    Ok(Array2::from_shape_fn(plan.out_shape, |(i, j)| {
        full_cell(&a, &b, (i + r0) as isize, (j + c0) as isize, boundary)
    }))
}

/// `in2` rotated by 180 degrees and conjugated.
pub(crate) fn rot180_conj<T: Sample>(in2: ArrayView2<'_, T>) -> Array2<T> {
    in2.slice(s![..;-1, ..;-1]).mapv(|v| v.conj_sample())
}

///
/// Cross-correlate two 2D arrays.
///
/// <https://docs.scipy.org/doc/scipy/reference/generated/scipy.signal.correlate2d.html>
///
/// Computed as [`convolve2d`] of `in1` with `in2` rotated by 180 degrees
/// (and conjugated), under the same `mode` and `boundary`.
///
pub fn correlate2d<T: Sample>(
    in1: ArrayView2<'_, T>,
    in2: ArrayView2<'_, T>,
    mode: ConvolveMode,
    boundary: Boundary,
) -> Result<Array2<T>> {
    let flipped = rot180_conj(in2);
    convolve2d(in1, flipped.view(), mode, boundary)
}

#[cfg(test)]
mod tests {
    use ndarray::{array, Array2};

    use super::*;

    #[test]
    fn boundary_resolution() {
        assert_eq!(Boundary::Fill.resolve(-1, 4), None);
        assert_eq!(Boundary::Fill.resolve(2, 4), Some(2));
        assert_eq!(Boundary::Wrap.resolve(-1, 4), Some(3));
        assert_eq!(Boundary::Wrap.resolve(9, 4), Some(1));
        assert_eq!(Boundary::Symm.resolve(-1, 4), Some(0));
        assert_eq!(Boundary::Symm.resolve(-2, 4), Some(1));
        assert_eq!(Boundary::Symm.resolve(4, 4), Some(3));
        assert_eq!(Boundary::Symm.resolve(5, 4), Some(2));
        assert_eq!(Boundary::Symm.resolve(8, 4), Some(0));
    }

    #[test]
    fn full_fill_matches_scipy() {
        // scipy.signal.convolve2d([[1, 2], [3, 4]], [[1, 1], [1, 1]])
        let a = array![[1.0f64, 2.0], [3.0, 4.0]];
        let b = array![[1.0f64, 1.0], [1.0, 1.0]];
        let y = convolve2d(a.view(), b.view(), ConvolveMode::Full, Boundary::Fill).unwrap();
        assert_eq!(
            y,
            array![[1.0, 3.0, 2.0], [4.0, 10.0, 6.0], [3.0, 7.0, 4.0]]
        );
    }

    #[test]
    fn same_wrap_and_symm() {
        let a = array![[1.0f64, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]];
        let ones = Array2::<f64>::ones((3, 3));
        // Every cell sees the whole grid once under circular extension.
        let wrap = convolve2d(a.view(), ones.view(), ConvolveMode::Same, Boundary::Wrap).unwrap();
        assert!(wrap.iter().all(|&v| v == 45.0));

        // Corner (0, 0) under mirroring: rows [0, 0, 1] x cols [0, 0, 1].
        let symm = convolve2d(a.view(), ones.view(), ConvolveMode::Same, Boundary::Symm).unwrap();
        assert_eq!(symm[[0, 0]], 1.0 + 1.0 + 2.0 + 1.0 + 1.0 + 2.0 + 4.0 + 4.0 + 5.0);
        assert_eq!(symm[[1, 1]], 45.0);
    }

    #[test]
    fn valid_swaps_larger_second_operand() {
        let small = array![[1.0f64, 2.0]];
        let large = Array2::from_shape_fn((3, 4), |(i, j)| (i * 4 + j) as f64);
        let forward = convolve2d(large.view(), small.view(), ConvolveMode::Valid, Boundary::Fill)
            .unwrap();
        let swapped = convolve2d(small.view(), large.view(), ConvolveMode::Valid, Boundary::Fill)
            .unwrap();
        assert_eq!(forward.dim(), (3, 3));
        assert_eq!(forward, swapped);
    }

    #[test]
    fn valid_correlate_with_dominating_kernel() {
        let small = array![[1.0f64, 2.0]];
        let large = Array2::from_shape_fn((2, 3), |(i, j)| (i * 3 + j) as f64);
        let y = correlate2d(small.view(), large.view(), ConvolveMode::Valid, Boundary::Fill)
            .unwrap();
        // scipy.signal.correlate2d([[1, 2]], [[0, 1, 2], [3, 4, 5]], 'valid')
        assert_eq!(y, array![[14.0, 11.0], [5.0, 2.0]]);
    }

    #[test]
    fn valid_rejects_non_dominating_shapes() {
        let a = Array2::<f64>::zeros((2, 5));
        let b = Array2::<f64>::zeros((4, 3));
        let err = convolve2d(a.view(), b.view(), ConvolveMode::Valid, Boundary::Fill)
            .expect_err("neither operand dominates");
        assert!(matches!(err, Error::InvalidArg { .. }));
    }

    #[test]
    fn correlate2d_matches_scipy() {
        // scipy.signal.correlate2d([[1, 2], [3, 4]], [[1, 0], [0, 2]])
        let a = array![[1.0f64, 2.0], [3.0, 4.0]];
        let b = array![[1.0f64, 0.0], [0.0, 2.0]];
        let y = correlate2d(a.view(), b.view(), ConvolveMode::Full, Boundary::Fill).unwrap();
        assert_eq!(
            y,
            array![[2.0, 4.0, 0.0], [6.0, 9.0, 2.0], [0.0, 3.0, 4.0]]
        );
    }
}
