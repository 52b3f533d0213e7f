//! Data-parallel backend.
//!
//! Work is split across the rayon pool (lanes, rows, output chunks) and every
//! transform plan comes from the shared cache. Algorithms are written
//! independently of [`crate::signal`]; only parameter validation, filter
//! design and the spectral bin bookkeeping of `resample` are shared.

use nalgebra::Complex;
use ndarray::{Array, Array1, Array2, ArrayView, ArrayView1, ArrayView2, Dimension};
use sigtwin_core::num_rs::ConvolveMode;
use sigtwin_core::Result;

use super::{ConvolveOps, DesignOps, FilterOps, HilbertOps, ResampleOps, SignalBackend, WienerOps};
use crate::signal::convolve::{Boundary, ConvMethod};
use crate::signal::filter::design::Sos;
use crate::signal::windows::Window;
use crate::signal::{Real, Sample};

mod convolve;
mod filter;
mod hilbert;
mod multirate;
mod resample;
mod wiener;

/// Data-parallel backend sharing the process-wide FFT plan cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Accelerated;

impl ResampleOps for Accelerated {
    fn resample<T: Sample>(
        &self,
        x: ArrayView1<'_, T>,
        num: usize,
        window: Option<&Window<T::Real>>,
    ) -> Result<Array1<T>> {
        resample::resample(x, num, window)
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

impl ConvolveOps for Accelerated {
    fn convolve<T: Sample>(
        &self,
        in1: ArrayView1<'_, T>,
        in2: ArrayView1<'_, T>,
        mode: ConvolveMode,
        method: ConvMethod,
    ) -> Result<Array1<T>> {
        convolve::convolve(in1, in2, mode, method)
    }

    fn correlate<T: Sample>(
        &self,
        in1: ArrayView1<'_, T>,
        in2: ArrayView1<'_, T>,
        mode: ConvolveMode,
        method: ConvMethod,
    ) -> Result<Array1<T>> {
        let flipped: Array1<T> = in2.iter().rev().map(|v| v.conj_sample()).collect();
        convolve::convolve(in1, flipped.view(), mode, method)
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
        let flipped = in2.slice(ndarray::s![..;-1, ..;-1]).mapv(|v| v.conj_sample());
        convolve::convolve2d(in1, flipped.view(), mode, boundary)
    }
}

impl FilterOps for Accelerated {
    fn sosfilt<F: Real, D: Dimension>(
        &self,
        sos: &[Sos<F>],
        x: ArrayView<'_, F, D>,
    ) -> Result<Array<F, D>> {
        filter::sosfilt(sos, x)
    }
}

impl WienerOps for Accelerated {
    fn wiener<F: Real, D: Dimension>(
        &self,
        x: ArrayView<'_, F, D>,
        window_size: Option<&[usize]>,
        noise: Option<F>,
    ) -> Result<Array<F, D>> {
        wiener::wiener(x, window_size, noise)
    }
}

impl HilbertOps for Accelerated {
    fn hilbert<F: Real>(&self, x: ArrayView1<'_, F>) -> Result<Array1<Complex<F>>> {
        hilbert::hilbert(x)
    }

    fn hilbert2<F: Real>(&self, x: ArrayView2<'_, F>) -> Result<Array2<Complex<F>>> {
        hilbert::hilbert2(x)
    }
}

impl DesignOps for Accelerated {}

impl SignalBackend for Accelerated {
    fn name(&self) -> &'static str {
        "accelerated"
    }
}
