use ndarray::{Array, ArrayView, Axis, Dimension, Zip};
use rayon::prelude::*;
use sigtwin_core::{Error, Result};

use crate::signal::wiener::{wiener_point, window_shape};
use crate::signal::Real;

/// Zero-padded box sums of width `w` along `axis`, lanes in parallel.
///
/// Sample `i` sums `[i - w/2, i + (w-1)/2]` clipped to the lane.
fn box_sum<F: Real, D: Dimension>(x: &Array<F, D>, axis: usize, w: usize) -> Array<F, D> {
    let mut out = Array::<F, D>::zeros(x.raw_dim());
    let before = w / 2;
    let after = (w - 1) / 2;
    Zip::from(out.lanes_mut(Axis(axis)))
        .and(x.lanes(Axis(axis)))
        .par_for_each(|mut o, lane| {
            let n = lane.len();
            for (i, dst) in o.iter_mut().enumerate() {
                let lo = i.saturating_sub(before);
                let hi = (i + after).min(n - 1);
                let mut acc = F::zero();
                for p in lo..=hi {
                    acc += lane[p];
                }
                *dst = acc;
            }
        });
    out
}

/// Wiener filter from separable box sums, one axis at a time.
pub(super) fn wiener<F, D>(
    x: ArrayView<'_, F, D>,
    window_size: Option<&[usize]>,
    noise: Option<F>,
) -> Result<Array<F, D>>
where
    F: Real,
    D: Dimension,
{
    if x.is_empty() {
        return Err(Error::invalid_arg("im", "input must be non-empty."));
    }
    let window = window_shape(window_size, x.ndim())?;
    let count = F::cast_usize(window.iter().product());

    let mut sum = x.to_owned();
    let mut sum_sq = x.mapv(|v| v * v);
    for (axis, &w) in window.iter().enumerate() {
        sum = box_sum(&sum, axis, w);
        sum_sq = box_sum(&sum_sq, axis, w);
    }

    let mean = sum.mapv(|s| s / count);
    let mut var = Array::<F, D>::zeros(x.raw_dim());
    Zip::from(&mut var)
        .and(&sum_sq)
        .and(&mean)
        .par_for_each(|v, &s2, &m| *v = s2 / count - m * m);
    let noise = match noise {
        Some(n) => n,
        None => {
            let total: F = var
                .as_slice_memory_order()
                .map(|s| s.par_iter().copied().sum())
                .unwrap_or_else(|| var.iter().copied().sum());
            total / F::cast_usize(var.len())
        }
    };

    let mut out = Array::<F, D>::zeros(x.raw_dim());
    Zip::from(&mut out)
        .and(&x)
        .and(&mean)
        .and(&var)
        .par_for_each(|o, &v, &m, &s| *o = wiener_point(v, m, s, noise));
    Ok(out)
}
