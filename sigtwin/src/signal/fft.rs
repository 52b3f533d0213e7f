//! Spectral engine: forward and inverse complex DFTs over `rustfft`.
//!
//! Plans come either from a planner created for the call
//! ([`PlanSource::Fresh`], used by the reference backend) or from the
//! process-wide planner per float width ([`PlanSource::Shared`], used by the
//! accelerated backend). `FftPlanner` memoizes every plan it hands out, so the
//! shared planner doubles as the plan cache.

use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use nalgebra::Complex;
use ndarray::parallel::prelude::*;
use ndarray::{Array2, ArrayViewMut1, Axis};
use num_traits::Zero;
use rustfft::{Fft, FftDirection, FftPlanner};

use super::Real;

/// Process-wide planners, one per float width.
pub(crate) struct FftCache {
    pub(crate) f32: Mutex<FftPlanner<f32>>,
    pub(crate) f64: Mutex<FftPlanner<f64>>,
}

static PLAN_CACHE: OnceLock<FftCache> = OnceLock::new();

pub(crate) fn plan_cache() -> &'static FftCache {
    PLAN_CACHE.get_or_init(|| {
        tracing::debug!("initializing shared fft plan cache");
        FftCache {
            f32: Mutex::new(FftPlanner::new()),
            f64: Mutex::new(FftPlanner::new()),
        }
    })
}

/// Where a transform plan is obtained from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlanSource {
    /// A planner built for this call and dropped afterwards.
    #[default]
    Fresh,
    /// The process-wide cached planner.
    Shared,
}

/// Plan a transform of length `len`.
pub fn plan<F: Real>(len: usize, direction: FftDirection, source: PlanSource) -> Arc<dyn Fft<F>> {
    match source {
        PlanSource::Fresh => FftPlanner::<F>::new().plan_fft(len, direction),
        PlanSource::Shared => F::plan_cache()
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .plan_fft(len, direction),
    }
}

/// In-place forward DFT.
pub fn forward<F: Real>(buf: &mut [Complex<F>], source: PlanSource) {
    if buf.is_empty() {
        return;
    }
    plan::<F>(buf.len(), FftDirection::Forward, source).process(buf);
}

/// In-place inverse DFT, unnormalized (no `1/n` factor).
pub fn inverse<F: Real>(buf: &mut [Complex<F>], source: PlanSource) {
    if buf.is_empty() {
        return;
    }
    plan::<F>(buf.len(), FftDirection::Inverse, source).process(buf);
}

/// In-place inverse DFT scaled by `1/n`.
pub fn inverse_normalized<F: Real>(buf: &mut [Complex<F>], source: PlanSource) {
    inverse(buf, source);
    let k = F::one() / F::cast_usize(buf.len().max(1));
    buf.iter_mut().for_each(|v| *v = Complex::new(v.re * k, v.im * k));
}

/// In-place 2D DFT over a row-major grid: every row, then every column.
///
/// With [`PlanSource::Shared`] rows and columns are transformed in parallel.
pub fn transform_2d<F: Real>(
    grid: &mut Array2<Complex<F>>,
    direction: FftDirection,
    source: PlanSource,
) {
    let (rows, cols) = grid.dim();
    if rows == 0 || cols == 0 {
        return;
    }
    let row_plan = plan::<F>(cols, direction, source);
    let col_plan = plan::<F>(rows, direction, source);
    match source {
        PlanSource::Fresh => {
            for row in grid.axis_iter_mut(Axis(0)) {
                run_lane(row_plan.as_ref(), row);
            }
            for col in grid.axis_iter_mut(Axis(1)) {
                run_lane(col_plan.as_ref(), col);
            }
        }
        PlanSource::Shared => {
            grid.axis_iter_mut(Axis(0))
                .into_par_iter()
                .for_each(|row| run_lane(row_plan.as_ref(), row));
            grid.axis_iter_mut(Axis(1))
                .into_par_iter()
                .for_each(|col| run_lane(col_plan.as_ref(), col));
        }
    }
}

fn run_lane<F: Real>(plan: &dyn Fft<F>, mut lane: ArrayViewMut1<'_, Complex<F>>) {
    match lane.as_slice_mut() {
        Some(slice) => plan.process(slice),
        None => {
            let mut buf = lane.to_vec();
            plan.process(&mut buf);
            lane.iter_mut().zip(buf).for_each(|(dst, src)| *dst = src);
        }
    }
}

/// Lift a real or complex slice into a complex buffer of length `len`,
/// zero-padding the tail.
pub fn to_complex_padded<T: super::Sample>(x: &[T], len: usize) -> Vec<Complex<T::Real>> {
    let mut buf: Vec<Complex<T::Real>> = vec![Complex::zero(); len];
    buf.iter_mut().zip(x.iter()).for_each(|(dst, src)| *dst = src.to_complex());
    buf
}
