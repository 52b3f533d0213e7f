use ndarray::{Array, ArrayView, Axis, Dimension, Zip};
use sigtwin_core::{Error, Result};

use crate::signal::filter::design::{validate_sos, Sos};
use crate::signal::Real;

/// Run one section over a whole lane in place, starting from zero state.
#[inline]
fn section_pass<F: Real>(s: &Sos<F>, lane: &mut [F]) {
    let (b0, b1, b2) = (s.b[0], s.b[1], s.b[2]);
    let (a1, a2) = (s.a[1], s.a[2]);
    let (mut z0, mut z1) = (F::zero(), F::zero());
    for v in lane.iter_mut() {
        let x = *v;
        let y = b0 * x + z0;
        z0 = b1 * x - a1 * y + z1;
        z1 = b2 * x - a2 * y;
        *v = y;
    }
}

/// Section-major `sosfilt`: lanes run in parallel, and within a lane each
/// section sweeps the whole lane before the next one starts.
pub(super) fn sosfilt<F, D>(sos: &[Sos<F>], x: ArrayView<'_, F, D>) -> Result<Array<F, D>>
where
    F: Real,
    D: Dimension,
{
    validate_sos(sos)?;
    if x.ndim() == 0 || x.is_empty() {
        return Err(Error::invalid_arg("x", "input must be non-empty."));
    }
    let axis = Axis(x.ndim() - 1);
    let mut out = x.to_owned();
    Zip::from(out.lanes_mut(axis)).par_for_each(|mut lane| match lane.as_slice_mut() {
        Some(buf) => sos.iter().for_each(|s| section_pass(s, buf)),
        None => {
            let mut buf = lane.to_vec();
            sos.iter().for_each(|s| section_pass(s, &mut buf));
            lane.iter_mut().zip(buf).for_each(|(dst, v)| *dst = v);
        }
    });
    Ok(out)
}
