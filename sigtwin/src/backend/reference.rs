use std::borrow::Cow;

use nalgebra::Complex;
use ndarray::{Array, Array1, Array2, ArrayView, ArrayView1, ArrayView2, Dimension};
use sigtwin_core::num_rs::ConvolveMode;
use sigtwin_core::Result;

use super::{ConvolveOps, DesignOps, FilterOps, HilbertOps, ResampleOps, SignalBackend, WienerOps};
use crate::signal::convolve::{self, Boundary, ConvMethod};
use crate::signal::filter::{self, design::Sos};
use crate::signal::windows::Window;
use crate::signal::{hilbert, multirate, resample, wiener, Real, Sample};

/// Host-executed backend: every operation is the straightforward
/// implementation in [`crate::signal`], with a planner built per call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reference;

/// Contiguous copy of a possibly strided 1D view.
pub(super) fn contiguous<'a, T: Clone>(x: &ArrayView1<'a, T>) -> Cow<'a, [T]> {
    match x.to_slice() {
        Some(s) => Cow::Borrowed(s),
        None => Cow::Owned(x.to_vec()),
    }
}

impl ResampleOps for Reference {
    fn resample<T: Sample>(
        &self,
        x: ArrayView1<'_, T>,
        num: usize,
        window: Option<&Window<T::Real>>,
    ) -> Result<Array1<T>> {
        resample::resample(&contiguous(&x), num, window).map(Array1::from)
    }

    fn resample_poly<T: Sample, D: Dimension>(
        &self,
        x: ArrayView<'_, T, D>,
        up: usize,
        down: usize,
        window: Option<&Window<T::Real>>,
        axis: isize,
    ) -> Result<Array<T, D>> {
        multirate::resample_poly(x, up, down, window, axis)
    }

    fn upfirdn<T: Sample, D: Dimension>(
        &self,
        h: &[T::Real],
        x: ArrayView<'_, T, D>,
        up: usize,
        down: usize,
        axis: isize,
    ) -> Result<Array<T, D>> {
        multirate::upfirdn(h, x, up, down, axis)
    }
}

impl ConvolveOps for Reference {
    fn convolve<T: Sample>(
        &self,
        in1: ArrayView1<'_, T>,
        in2: ArrayView1<'_, T>,
        mode: ConvolveMode,
        method: ConvMethod,
    ) -> Result<Array1<T>> {
        convolve::convolve(&contiguous(&in1), &contiguous(&in2), mode, method).map(Array1::from)
    }

    fn correlate<T: Sample>(
        &self,
        in1: ArrayView1<'_, T>,
        in2: ArrayView1<'_, T>,
        mode: ConvolveMode,
        method: ConvMethod,
    ) -> Result<Array1<T>> {
        convolve::correlate(&contiguous(&in1), &contiguous(&in2), mode, method).map(Array1::from)
    }

    fn convolve2d<T: Sample>(
        &self,
        in1: ArrayView2<'_, T>,
        in2: ArrayView2<'_, T>,
        mode: ConvolveMode,
        boundary: Boundary,
    ) -> Result<Array2<T>> {
        convolve::convolve2d(in1, in2, mode, boundary)
    }

    fn correlate2d<T: Sample>(
        &self,
        in1: ArrayView2<'_, T>,
        in2: ArrayView2<'_, T>,
        mode: ConvolveMode,
        boundary: Boundary,
    ) -> Result<Array2<T>> {
        convolve::correlate2d(in1, in2, mode, boundary)
    }
}

impl FilterOps for Reference {
    fn sosfilt<F: Real, D: Dimension>(
        &self,
        sos: &[Sos<F>],
        x: ArrayView<'_, F, D>,
    ) -> Result<Array<F, D>> {
        filter::sosfilt(sos, x)
    }
}

impl WienerOps for Reference {
    fn wiener<F: Real, D: Dimension>(
        &self,
        x: ArrayView<'_, F, D>,
        window_size: Option<&[usize]>,
        noise: Option<F>,
    ) -> Result<Array<F, D>> {
        wiener::wiener(x, window_size, noise)
    }
}

impl HilbertOps for Reference {
    fn hilbert<F: Real>(&self, x: ArrayView1<'_, F>) -> Result<Array1<Complex<F>>> {
        hilbert::hilbert(&contiguous(&x)).map(Array1::from)
    }

    fn hilbert2<F: Real>(&self, x: ArrayView2<'_, F>) -> Result<Array2<Complex<F>>> {
        hilbert::hilbert2(x)
    }
}

impl DesignOps for Reference {}

impl SignalBackend for Reference {
    fn name(&self) -> &'static str {
        "reference"
    }
}
