use nalgebra::Complex;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rayon::prelude::*;
use sigtwin_core::num_rs::{next_fast_len, ConvolveMode};
use sigtwin_core::{Error, Result};

use crate::signal::convolve::{plan_2d, Boundary, ConvCostModel, ConvMethod};
use crate::signal::fft::{self, PlanSource};
use crate::signal::{Real, Sample};

pub(super) fn convolve<T: Sample>(
    in1: ArrayView1<'_, T>,
    in2: ArrayView1<'_, T>,
    mode: ConvolveMode,
    method: ConvMethod,
) -> Result<Array1<T>> {
    if in1.is_empty() {
        return Err(Error::invalid_arg("in1", "input must be non-empty."));
    }
    if in2.is_empty() {
        return Err(Error::invalid_arg("in2", "input must be non-empty."));
    }
    let a = in1.to_vec();
    let b = in2.to_vec();
    let (n1, n2) = (a.len(), b.len());
    let start = mode.slice_start(n1, n2);
    let len = mode.output_len(n1, n2);
    let y = match ConvCostModel::default().resolve(method, n1, n2, mode) {
        ConvMethod::Fft => spectral(&a, &b, start, len),
        _ => direct(&a, &b, start, len),
    };
    Ok(Array1::from(y))
}

/// Direct convolution over output cells `start..start + len` of the full
/// result, one cell per task.
fn direct<T: Sample>(a: &[T], b: &[T], start: usize, len: usize) -> Vec<T> {
    (start..start + len)
        .into_par_iter()
        .map(|k| {
            let lo = k.saturating_sub(a.len() - 1);
            let hi = k.min(b.len() - 1);
            (lo..=hi).fold(T::zero(), |acc, j| acc + a[k - j] * b[j])
        })
        .collect()
}

/// FFT convolution: both forward transforms run concurrently on cached plans.
fn spectral<T: Sample>(a: &[T], b: &[T], start: usize, len: usize) -> Vec<T> {
    let n = next_fast_len(a.len() + b.len() - 1);
    let lift = |x: &[T]| {
        let mut buf = vec![Complex::new(T::Real::cast(0.0), T::Real::cast(0.0)); n];
        buf.par_iter_mut()
            .zip(x.par_iter())
            .for_each(|(dst, src)| *dst = src.to_complex());
        fft::forward(&mut buf, PlanSource::Shared);
        buf
    };
    let (mut fa, fb) = rayon::join(|| lift(a), || lift(b));
    fa.par_iter_mut().zip(fb.par_iter()).for_each(|(x, y)| *x *= *y);
    fft::inverse(&mut fa, PlanSource::Shared);
    let k = T::Real::cast(1.0) / T::Real::cast_usize(n);
    fa[start..start + len]
        .par_iter()
        .map(|c| T::from_complex(Complex::new(c.re * k, c.im * k)))
        .collect()
}

/// Direct 2D convolution over a boundary-extended copy of `a`, one output
/// row per task.
pub(super) fn convolve2d<T: Sample>(
    in1: ArrayView2<'_, T>,
    in2: ArrayView2<'_, T>,
    mode: ConvolveMode,
    boundary: Boundary,
) -> Result<Array2<T>> {
    let plan = plan_2d(in1.dim(), in2.dim(), mode)?;
    let (in1, in2) = (in1.view(), in2.view());
    let (a, b) = if plan.swapped { (in2, in1) } else { (in1, in2) };
    let (m, n) = a.dim();
    let (p, q) = b.dim();
    let (out_r, out_c) = plan.out_shape;
    let (r0, c0) = plan.start;

    // ext[u, v] holds a[r0 + u - (p - 1), c0 + v - (q - 1)] under `boundary`.
    let row_origin = r0 as isize - (p as isize - 1);
    let col_origin = c0 as isize - (q as isize - 1);
    let ext = Array2::from_shape_fn((out_r + p - 1, out_c + q - 1), |(u, v)| {
        match (
            boundary.resolve(row_origin + u as isize, m),
            boundary.resolve(col_origin + v as isize, n),
        ) {
            (Some(r), Some(c)) => a[[r, c]],
            _ => T::zero(),
        }
    });
    let b = b.to_owned();

    let mut out = Array2::<T>::zeros((out_r, out_c));
    out.axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .for_each(|(i, mut row)| {
            for (j, cell) in row.iter_mut().enumerate() {
                let mut acc = T::zero();
                for k in 0..p {
                    for l in 0..q {
                        acc += ext[[i + p - 1 - k, j + q - 1 - l]] * b[[k, l]];
                    }
                }
                *cell = acc;
            }
        });
    Ok(out)
}
