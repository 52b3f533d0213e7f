//! Execution backends.
//!
//! Every operation is a method on one of the capability traits below.
//! [`Reference`] forwards to the host implementations in [`crate::signal`];
//! [`Accelerated`] carries independent data-parallel implementations that
//! share the process-wide FFT plan cache. Callers stay generic over
//! [`SignalBackend`] and can swap one for the other.

use std::sync::Once;

use nalgebra::Complex;
use ndarray::{Array, Array1, Array2, ArrayView, ArrayView1, ArrayView2, Dimension};
use rustfft::FftDirection;
use sigtwin_core::num_rs::ConvolveMode;
use sigtwin_core::Result;

use crate::signal::convolve::{Boundary, ConvMethod};
use crate::signal::filter::design::{firwin_dyn, Sos};
use crate::signal::fft::{self, PlanSource};
use crate::signal::windows::{get_window, Window};
use crate::signal::{Real, Sample};

mod accelerated;
mod reference;

pub use accelerated::Accelerated;
pub use reference::Reference;

/// Fourier and polyphase resampling.
pub trait ResampleOps {
    /// Fourier resampling of `x` to `num` samples.
    fn resample<T: Sample>(
        &self,
        x: ArrayView1<'_, T>,
        num: usize,
        window: Option<&Window<T::Real>>,
    ) -> Result<Array1<T>>;

    /// Polyphase resampling by `up / down` along `axis`.
    fn resample_poly<T: Sample, D: Dimension>(
        &self,
        x: ArrayView<'_, T, D>,
        up: usize,
        down: usize,
        window: Option<&Window<T::Real>>,
        axis: isize,
    ) -> Result<Array<T, D>>;

    /// Upsample, FIR filter, downsample along `axis`.
    fn upfirdn<T: Sample, D: Dimension>(
        &self,
        h: &[T::Real],
        x: ArrayView<'_, T, D>,
        up: usize,
        down: usize,
        axis: isize,
    ) -> Result<Array<T, D>>;
}

/// Convolution and correlation.
pub trait ConvolveOps {
    /// 1D convolution.
    fn convolve<T: Sample>(
        &self,
        in1: ArrayView1<'_, T>,
        in2: ArrayView1<'_, T>,
        mode: ConvolveMode,
        method: ConvMethod,
    ) -> Result<Array1<T>>;

    /// 1D cross-correlation.
    fn correlate<T: Sample>(
        &self,
        in1: ArrayView1<'_, T>,
        in2: ArrayView1<'_, T>,
        mode: ConvolveMode,
        method: ConvMethod,
    ) -> Result<Array1<T>>;

    /// 1D convolution through the FFT.
    fn fftconvolve<T: Sample>(
        &self,
        in1: ArrayView1<'_, T>,
        in2: ArrayView1<'_, T>,
        mode: ConvolveMode,
    ) -> Result<Array1<T>> {
        self.convolve(in1, in2, mode, ConvMethod::Fft)
    }

    /// 2D convolution.
    fn convolve2d<T: Sample>(
        &self,
        in1: ArrayView2<'_, T>,
        in2: ArrayView2<'_, T>,
        mode: ConvolveMode,
        boundary: Boundary,
    ) -> Result<Array2<T>>;

    /// 2D cross-correlation.
    fn correlate2d<T: Sample>(
        &self,
        in1: ArrayView2<'_, T>,
        in2: ArrayView2<'_, T>,
        mode: ConvolveMode,
        boundary: Boundary,
    ) -> Result<Array2<T>>;
}

/// Cascaded biquad filtering.
pub trait FilterOps {
    /// One-shot `sosfilt` along the last axis, zero initial state per lane.
    fn sosfilt<F: Real, D: Dimension>(
        &self,
        sos: &[Sos<F>],
        x: ArrayView<'_, F, D>,
    ) -> Result<Array<F, D>>;
}

/// Wiener denoising.
pub trait WienerOps {
    /// Wiener filter over an N-dimensional array.
    fn wiener<F: Real, D: Dimension>(
        &self,
        x: ArrayView<'_, F, D>,
        window_size: Option<&[usize]>,
        noise: Option<F>,
    ) -> Result<Array<F, D>>;
}

/// Analytic signal.
pub trait HilbertOps {
    /// 1D analytic signal.
    fn hilbert<F: Real>(&self, x: ArrayView1<'_, F>) -> Result<Array1<Complex<F>>>;

    /// 2D analytic signal.
    fn hilbert2<F: Real>(&self, x: ArrayView2<'_, F>) -> Result<Array2<Complex<F>>>;
}

/// FIR and window design.
///
/// Design runs on the host for every backend.
pub trait DesignOps {
    /// Windowed-sinc FIR design.
    #[allow(clippy::too_many_arguments)]
    fn firwin<F: Real>(
        &self,
        numtaps: usize,
        cutoff: &[F],
        width: Option<F>,
        window: Option<&Window<F>>,
        pass_zero: bool,
        scale: bool,
        fs: Option<F>,
    ) -> Result<Array1<F>> {
        firwin_dyn(numtaps, cutoff, width, window, pass_zero, scale, fs).map(Array1::from)
    }

    /// Window of length `nx`; periodic when `fftbins`.
    fn get_window<F: Real>(&self, window: &Window<F>, nx: usize, fftbins: bool) -> Result<Array1<F>> {
        get_window(window, nx, fftbins).map(Array1::from)
    }
}

/// Every capability an execution backend provides.
pub trait SignalBackend:
    ResampleOps + ConvolveOps + FilterOps + WienerOps + HilbertOps + DesignOps + Send + Sync
{
    /// Short name for logs and reports.
    fn name(&self) -> &'static str;
}

static PRECOMPILE: Once = Once::new();

/// Transform lengths planned ahead of time: powers of two from 64 to 16384.
const WARM_FFT_LENS: [usize; 9] = [64, 128, 256, 512, 1024, 2048, 4096, 8192, 16384];

/// Plan forward and inverse transforms of every warm length, for both float
/// widths, in the shared cache. Returns the number of plans requested.
fn warm_fft_plans() -> usize {
    fn warm<F: Real>() -> usize {
        let mut planned = 0;
        for &len in &WARM_FFT_LENS {
            for direction in [FftDirection::Forward, FftDirection::Inverse] {
                fft::plan::<F>(len, direction, PlanSource::Shared);
                planned += 1;
            }
        }
        planned
    }
    warm::<f64>() + warm::<f32>()
}

///
/// Warm up the accelerated backend.
///
/// Plans forward and inverse FFTs of the power-of-two lengths 64..=16384 in
/// the shared plan cache for `f32` and `f64`, and starts the rayon worker
/// pool. Only the first call does any work; later calls return immediately.
/// Calling it is optional, since plans and the pool are also created on
/// first use.
///
pub fn precompile_kernels() {
    PRECOMPILE.call_once(|| {
        let plans = warm_fft_plans();
        let threads = rayon::current_num_threads();
        tracing::debug!(plans, threads, "accelerated backend warmed up");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precompile_is_idempotent() {
        precompile_kernels();
        precompile_kernels();
        assert!(PRECOMPILE.is_completed());
    }

    #[test]
    fn precompile_plans_land_in_the_shared_cache() {
        use rustfft::{Direction, Length};

        precompile_kernels();
        assert_eq!(warm_fft_plans(), 4 * WARM_FFT_LENS.len());
        for &len in &WARM_FFT_LENS {
            let first = fft::plan::<f64>(len, FftDirection::Forward, PlanSource::Shared);
            let again = fft::plan::<f64>(len, FftDirection::Forward, PlanSource::Shared);
            assert_eq!(first.len(), len);
            assert!(std::sync::Arc::ptr_eq(&first, &again));
            let inverse = fft::plan::<f32>(len, FftDirection::Inverse, PlanSource::Shared);
            assert_eq!(inverse.len(), len);
            assert_eq!(inverse.fft_direction(), FftDirection::Inverse);
        }
    }

    #[test]
    fn design_is_shared_by_both_backends() {
        let a = Reference
            .firwin(31, &[0.2f64], None, None, true, true, None)
            .unwrap();
        let b = Accelerated
            .firwin(31, &[0.2f64], None, None, true, true, None)
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(Reference.name(), "reference");
        assert_eq!(Accelerated.name(), "accelerated");
    }
}
