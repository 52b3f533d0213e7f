use nalgebra::Complex;
use ndarray::{Array1, ArrayView1};
use rayon::prelude::*;
use sigtwin_core::{Error, Result};

use crate::signal::fft::{self, PlanSource};
use crate::signal::resample::{complex_spectrum, hermitian_spectrum, spectral_window};
use crate::signal::windows::Window;
use crate::signal::{Real, Sample};

/// Fourier resampling with cached plans and parallel spectral passes.
pub(super) fn resample<T: Sample>(
    x: ArrayView1<'_, T>,
    num: usize,
    window: Option<&Window<T::Real>>,
) -> Result<Array1<T>> {
    if x.is_empty() {
        return Err(Error::invalid_arg("x", "input must be non-empty."));
    }
    if num == 0 {
        return Err(Error::invalid_arg("num", "num must be greater than zero."));
    }
    let nx = x.len();
    let mut spectrum: Vec<Complex<T::Real>> = x.iter().map(|v| v.to_complex()).collect();
    fft::forward(&mut spectrum, PlanSource::Shared);
    if let Some(window) = window {
        let weights = spectral_window(window, nx, T::IS_COMPLEX)?;
        spectrum
            .par_iter_mut()
            .zip(weights.par_iter())
            .for_each(|(bin, &w)| *bin = Complex::new(bin.re * w, bin.im * w));
    }

    let mut y = if T::IS_COMPLEX {
        complex_spectrum(&spectrum, num)
    } else {
        hermitian_spectrum(&spectrum, num)
    };
    fft::inverse(&mut y, PlanSource::Shared);
    let k = T::Real::cast(1.0) / T::Real::cast_usize(nx);
    tracing::trace!(nx, num, "accelerated resample");
    Ok(y
        .into_par_iter()
        .map(|c| T::from_complex(Complex::new(c.re * k, c.im * k)))
        .collect::<Vec<T>>()
        .into())
}
