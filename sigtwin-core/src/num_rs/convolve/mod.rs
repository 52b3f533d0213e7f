use crate::{Error, Result};
use num_traits::Zero;
use std::ops::{Add, Mul};

/// Convolution mode determines behavior near edges and output size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConvolveMode {
    /// Full convolution, output size is `in1.len() + in2.len() - 1`
    #[default]
    Full,
    /// Valid convolution, output size is `max(in1.len(), in2.len()) - min(in1.len(), in2.len()) + 1`
    Valid,
    /// Same convolution, output size is `in1.len()`
    Same,
}

impl ConvolveMode {
    /// Output length along one axis for operands of length `n1` and `n2`.
    pub fn output_len(&self, n1: usize, n2: usize) -> usize {
        match self {
            ConvolveMode::Full => n1 + n2 - 1,
            ConvolveMode::Valid => n1.max(n2) - n1.min(n2) + 1,
            ConvolveMode::Same => n1,
        }
    }

    /// Offset of the first kept sample inside the full-length result.
    pub fn slice_start(&self, n1: usize, n2: usize) -> usize {
        let full = n1 + n2 - 1;
        (full - self.output_len(n1, n2)) / 2
    }

    /// Lower-case name as used by `scipy.signal`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConvolveMode::Full => "full",
            ConvolveMode::Valid => "valid",
            ConvolveMode::Same => "same",
        }
    }
}

/// Truncate a full-length convolution result according to `mode`.
pub fn apply_mode<T: Copy>(full: &[T], n1: usize, n2: usize, mode: ConvolveMode) -> Vec<T> {
    let start = mode.slice_start(n1, n2);
    full[start..start + mode.output_len(n1, n2)].to_vec()
}

/// Full-length linear convolution by direct summation.
///
/// `out[k] = sum_j a[k - j] * v[j]`, accumulated in increasing `j`.
pub fn convolve_full<T>(a: &[T], v: &[T]) -> Vec<T>
where
    T: Zero + Copy + Add<Output = T> + Mul<Output = T>,
{
    if a.is_empty() || v.is_empty() {
        return Vec::new();
    }
    let n = a.len() + v.len() - 1;
    let mut out = Vec::with_capacity(n);
    for k in 0..n {
        let lo = k.saturating_sub(a.len() - 1);
        let hi = k.min(v.len() - 1);
        let mut acc = T::zero();
        for j in lo..=hi {
            acc = acc + a[k - j] * v[j];
        }
        out.push(acc);
    }
    out
}

/// Best effort parallel behaviour with numpy's convolve method. We take `v` as the convolution
/// kernel.
///
/// Returns the discrete, linear convolution of two one-dimensional sequences.
///
/// # Parameters
/// * `a` : (N,)
///   Signal to be (linearly) convolved.
/// * `v` : (M,)
///   Second one-dimensional input array.
/// * `mode` : [ConvolveMode]
///   [ConvolveMode::Full]:
///   By default, mode is 'full'.  This returns the convolution at each point of overlap, with an
///   output shape of (N+M-1,). At the end-points of the convolution, the signals do not overlap
///   completely, and boundary effects may be seen.
///
///   [ConvolveMode::Same]:
///   Mode 'same' returns output of length ``N``, centered with respect to the 'full' output.
///
///   [ConvolveMode::Valid]:
///   Mode 'valid' returns output of length ``max(M, N) - min(M, N) + 1``.  The convolution
///   product is only given for points where the signals overlap completely.  Values outside the
///   signal boundary have no effect.
///
/// # Examples
/// ```
/// use sigtwin_core::num_rs::{ConvolveMode, convolve};
///
/// let a = [1., 2., 3.];
/// let v = [0., 1., 0.5];
///
/// let result = convolve(&a, &v, ConvolveMode::Full).unwrap();
/// assert_eq!(result, vec![0., 1., 2.5, 4., 1.5]);
/// ```
pub fn convolve<T>(a: &[T], v: &[T], mode: ConvolveMode) -> Result<Vec<T>>
where
    T: Zero + Copy + Add<Output = T> + Mul<Output = T>,
{
    if a.is_empty() {
        return Err(Error::invalid_arg("a", "input must be non-empty."));
    }
    if v.is_empty() {
        return Err(Error::invalid_arg("v", "input must be non-empty."));
    }
    let full = convolve_full(a, v);
    Ok(apply_mode(&full, a.len(), v.len(), mode))
}
