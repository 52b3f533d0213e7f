use ndarray::{Array, ArrayView, Axis, Dimension, Zip};
use rayon::prelude::*;
use sigtwin_core::{Error, Result};

use crate::signal::multirate::{
    normalize_axis, padded_taps, poly_plan, reduce_ratio, resample_axis, resample_poly_taps,
    upfirdn_output_len, validate_upfirdn,
};
use crate::signal::windows::Window;
use crate::signal::Sample;

/// Polyphase `upfirdn` of one lane.
///
/// Output `m` sits at stuffed position `t = m * down`, which only meets taps
/// of phase `t % up`: `y[m] = sum_k h[t % up + k * up] * x[t / up - k]`.
/// The zero-stuffed signal is never built.
fn polyphase_lane<T: Sample>(h: &[T::Real], x: &[T], up: usize, down: usize) -> Vec<T> {
    let n_out = upfirdn_output_len(x.len(), h.len(), up, down);
    (0..n_out)
        .into_par_iter()
        .map(|m| {
            let t = m * down;
            let (phase, q) = (t % up, t / up);
            let mut acc = T::zero();
            let mut k = q.saturating_sub(x.len() - 1);
            while k <= q && phase + k * up < h.len() {
                acc += x[q - k].scale(h[phase + k * up]);
                k += 1;
            }
            acc
        })
        .collect()
}

pub(super) fn upfirdn<T, D>(
    h: &[T::Real],
    x: ArrayView<'_, T, D>,
    up: usize,
    down: usize,
    axis: isize,
) -> Result<Array<T, D>>
where
    T: Sample,
    D: Dimension,
{
    validate_upfirdn(h, up, down)?;
    let ax = normalize_axis(axis, x.ndim())?;
    let n = x.len_of(Axis(ax));
    if n == 0 {
        return Err(Error::invalid_arg("x", "input must be non-empty."));
    }
    tracing::debug!(phases = up, taps = h.len(), down, "polyphase upfirdn");

    let mut shape = x.raw_dim();
    shape[ax] = upfirdn_output_len(n, h.len(), up, down);
    let mut out = Array::<T, D>::zeros(shape);
    Zip::from(out.lanes_mut(Axis(ax)))
        .and(x.lanes(Axis(ax)))
        .par_for_each(|mut o, lane| {
            let y = match lane.as_slice() {
                Some(s) => polyphase_lane(h, s, up, down),
                None => polyphase_lane(h, &lane.to_vec(), up, down),
            };
            o.iter_mut().zip(y).for_each(|(dst, v)| *dst = v);
        });
    Ok(out)
}

pub(super) fn resample_poly<T, D>(
    x: ArrayView<'_, T, D>,
    up: usize,
    down: usize,
    window: Option<&Window<T::Real>>,
    axis: isize,
) -> Result<Array<T, D>>
where
    T: Sample,
    D: Dimension,
{
    let (up, down) = reduce_ratio(up, down)?;
    let (ax, n_in) = resample_axis(&x, axis)?;
    if up == 1 && down == 1 {
        return Ok(x.to_owned());
    }
    let taps = resample_poly_taps(up, down, window)?;
    let plan = poly_plan(n_in, taps.len(), up, down);
    let h = padded_taps(&taps, &plan);
    let y = upfirdn(&h, x, up, down, axis)?;
    Ok(y
        .slice_axis(
            Axis(ax),
            (plan.n_pre_remove..plan.n_pre_remove + plan.n_out).into(),
        )
        .to_owned())
}
