use crate::kernel::{
    ensure_out_len, ConfigError, ExecInvariantViolation, KernelLifecycle, Read1D, Write1D,
};
use crate::signal::fft::{self, PlanSource};
use crate::signal::traits::Resample1D;
use crate::signal::windows::{get_window, Window};
use crate::signal::{Real, Sample};
use nalgebra::Complex;
use num_traits::Zero;
use sigtwin_core::{Error, Result};

/// Constructor config for [`ResampleKernel`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResampleConfig<F> {
    /// Target number of output samples.
    pub target_len: usize,
    /// Optional spectral window applied before truncation or padding.
    pub window: Option<Window<F>>,
}

/// Trait-first 1D Fourier resampling kernel.
#[derive(Debug, Clone, PartialEq)]
pub struct ResampleKernel<F> {
    target_len: usize,
    window: Option<Window<F>>,
}

impl<F> ResampleKernel<F> {
    /// Return configured target output length.
    pub fn target_len(&self) -> usize {
        self.target_len
    }
}

impl<F: Real> KernelLifecycle for ResampleKernel<F> {
    type Config = ResampleConfig<F>;

    fn try_new(config: Self::Config) -> core::result::Result<Self, ConfigError> {
        if config.target_len == 0 {
            return Err(ConfigError::InvalidArgument {
                arg: "target_len",
                reason: "target length must be > 0",
            });
        }
        Ok(Self {
            target_len: config.target_len,
            window: config.window,
        })
    }
}

impl<F: Real, T: Sample<Real = F>> Resample1D<T> for ResampleKernel<F> {
    fn run_into<I, O>(
        &self,
        input: &I,
        out: &mut O,
    ) -> core::result::Result<(), ExecInvariantViolation>
    where
        I: Read1D<T> + ?Sized,
        O: Write1D<T> + ?Sized,
    {
        let input = input.read_slice()?;
        let out_slice = out.write_slice_mut()?;
        ensure_out_len(out_slice, self.target_len)?;
        let y = resample(input, self.target_len, self.window.as_ref())?;
        out_slice.copy_from_slice(&y);
        Ok(())
    }

    fn run_alloc<I>(&self, input: &I) -> core::result::Result<Vec<T>, ExecInvariantViolation>
    where
        I: Read1D<T> + ?Sized,
    {
        let input = input.read_slice()?;
        Ok(resample(input, self.target_len, self.window.as_ref())?)
    }
}

///
/// Resample `x` to `num` samples using the Fourier method.
///
/// <https://docs.scipy.org/doc/scipy/reference/generated/scipy.signal.resample.html>
///
/// Procedure:
/// 1. Convert to the frequency domain. Real input keeps only the
///    non-negative half of the spectrum.
/// 2. Optionally weight the spectrum by the `ifftshift`ed periodic window of
///    the input length.
/// 3. Copy the lowest `min(num, len)` bins into a zero spectrum of length
///    `num`, splitting or joining the Nyquist bin when that count is even.
/// 4. Convert back to the time domain. The unnormalized inverse scaled by
///    `1 / len` keeps the amplitude, i.e. a factor of `num / len` over the
///    normalized inverse.
///
/// Real input yields real output.
///
pub fn resample<T: Sample>(x: &[T], num: usize, window: Option<&Window<T::Real>>) -> Result<Vec<T>> {
    resample_with(x, num, window, PlanSource::Fresh)
}

pub(crate) fn resample_with<T: Sample>(
    x: &[T],
    num: usize,
    window: Option<&Window<T::Real>>,
    source: PlanSource,
) -> Result<Vec<T>> {
    if x.is_empty() {
        return Err(Error::invalid_arg("x", "input must be non-empty."));
    }
    if num == 0 {
        return Err(Error::invalid_arg("num", "num must be greater than zero."));
    }
    let nx = x.len();
    let mut spectrum = fft::to_complex_padded(x, nx);
    fft::forward(&mut spectrum, source);
    if let Some(window) = window {
        let weights = spectral_window(window, nx, T::IS_COMPLEX)?;
        spectrum
            .iter_mut()
            .zip(weights.iter())
            .for_each(|(bin, &w)| *bin = bin.scale(w));
    }
    let mut y = if T::IS_COMPLEX {
        complex_spectrum(&spectrum, num)
    } else {
        hermitian_spectrum(&spectrum, num)
    };
    fft::inverse(&mut y, source);
    let k = T::Real::cast(1.0) / T::Real::cast_usize(nx);
    Ok(y.into_iter().map(|c| T::from_complex(c.scale(k))).collect())
}

/// Window weights per input bin.
///
/// Real input only keeps the non-negative half, so each kept bin takes the
/// mean of the weights of `k` and `-k`.
pub(crate) fn spectral_window<F: Real>(
    window: &Window<F>,
    nx: usize,
    complex_input: bool,
) -> Result<Vec<F>> {
    let w = get_window(window, nx, true)?;
    let shifted: Vec<F> = (0..nx).map(|i| w[(i + nx / 2) % nx]).collect();
    if complex_input {
        return Ok(shifted);
    }
    let half = F::cast(0.5);
    Ok((0..nx / 2 + 1)
        .map(|k| {
            if k == 0 {
                shifted[0]
            } else {
                (shifted[k] + shifted[nx - k]) * half
            }
        })
        .collect())
}

/// Full `num`-bin spectrum whose inverse DFT is real, built from the
/// non-negative bins of a real signal's spectrum.
pub(crate) fn hermitian_spectrum<F: Real>(x: &[Complex<F>], num: usize) -> Vec<Complex<F>> {
    let nx = x.len();
    let n = num.min(nx);
    let nyq = n / 2 + 1;
    let mut half = vec![Complex::<F>::zero(); num / 2 + 1];
    half[..nyq].copy_from_slice(&x[..nyq]);
    if n % 2 == 0 {
        if num < nx {
            half[n / 2] = half[n / 2].scale(F::cast(2.0));
        } else if nx < num {
            half[n / 2] = half[n / 2].scale(F::cast(0.5));
        }
    }

    let mut y = vec![Complex::<F>::zero(); num];
    y[0] = Complex::new(half[0].re, F::zero());
    for k in 1..=(num - 1) / 2 {
        y[k] = half[k];
        y[num - k] = half[k].conj();
    }
    if num % 2 == 0 {
        y[num / 2] = Complex::new(half[num / 2].re, F::zero());
    }
    y
}

/// Full `num`-bin spectrum built from both halves of a complex signal's
/// spectrum.
pub(crate) fn complex_spectrum<F: Real>(x: &[Complex<F>], num: usize) -> Vec<Complex<F>> {
    let nx = x.len();
    let n = num.min(nx);
    let nyq = n / 2 + 1;
    let mut y = vec![Complex::<F>::zero(); num];
    y[..nyq].copy_from_slice(&x[..nyq]);
    if n > 2 {
        let negative = n - nyq;
        y[num - negative..].copy_from_slice(&x[nx - negative..]);
    }
    if n % 2 == 0 {
        if num < nx {
            // scipy's negative-index slice is empty when n == 2.
            if n > 2 {
                y[num - n / 2] += x[nx - n / 2];
            }
        } else if nx < num {
            y[n / 2] = y[n / 2].scale(F::cast(0.5));
            y[num - n / 2] = y[n / 2];
        }
    }
    y
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::kernel::KernelLifecycle;
    use crate::signal::traits::Resample1D;

    #[test]
    fn can_resample_like_scipy() {
        let x = vec![1., 2., 3., 4., 5., 6., 7., 8., 9.];
        let y = resample(&x, 5, None).expect("resample should succeed");
        let expected = vec![3., 2.18649851, 5.01849831, 5.98150169, 8.81350149];
        assert_eq!(y.len(), expected.len());
        for (y, expected) in y.iter().zip(expected.iter()) {
            assert_abs_diff_eq!(y, expected, epsilon = 1e-8);
        }
    }

    #[test]
    fn can_resample_to_exact_number() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let len = rng.random_range(10..500);
            let target_len = rng.random_range(1..2000);
            let x: Vec<f64> = (0..len).map(|_| rng.random_range(-100.0..100.)).collect();
            let y = resample(&x, target_len, None).expect("resample should succeed");
            assert_eq!(y.len(), target_len);
        }
    }

    #[test]
    fn upsampling_by_two_keeps_original_samples() {
        let mut rng = StdRng::seed_from_u64(11);
        for len in [16usize, 17] {
            let x: Vec<f64> = (0..len).map(|_| rng.random_range(-1.0..1.0)).collect();
            let y = resample(&x, 2 * len, None).unwrap();
            for (k, xk) in x.iter().enumerate() {
                assert_abs_diff_eq!(y[2 * k], *xk, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn same_length_is_identity() {
        let x: Vec<f64> = (0..12).map(|i| (i as f64).sqrt()).collect();
        let y = resample(&x, 12, None).unwrap();
        x.iter()
            .zip(y.iter())
            .for_each(|(a, b)| assert_abs_diff_eq!(a, b, epsilon = 1e-12));
    }

    #[test]
    fn complex_input_matches_real_input_on_real_data() {
        let x: Vec<f64> = (0..20).map(|i| (i as f64 * 0.4).sin()).collect();
        let xc: Vec<Complex<f64>> = x.iter().map(|&v| Complex::new(v, 0.0)).collect();
        for num in [7usize, 20, 33, 40] {
            let real = resample(&x, num, None).unwrap();
            let complex = resample(&xc, num, None).unwrap();
            for (r, c) in real.iter().zip(complex.iter()) {
                assert_abs_diff_eq!(*r, c.re, epsilon = 1e-12);
                assert_abs_diff_eq!(c.im, 0.0, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn boxcar_window_is_transparent() {
        let x: Vec<f64> = (0..32).map(|i| (i as f64 * 0.3).cos()).collect();
        let plain = resample(&x, 48, None).unwrap();
        let windowed = resample(&x, 48, Some(&Window::Boxcar)).unwrap();
        plain
            .iter()
            .zip(windowed.iter())
            .for_each(|(a, b)| assert_abs_diff_eq!(a, b, epsilon = 1e-12));
    }

    #[test]
    fn kernel_run_into_slice() {
        let kernel = ResampleKernel::try_new(ResampleConfig {
            target_len: 16,
            window: Some(Window::Kaiser { beta: 0.5f32 }),
        })
        .expect("kernel should initialize");
        let input = [1.0f32, 2.0, 3.0, 4.0];
        let mut out = [0.0f32; 16];
        kernel
            .run_into(&input, &mut out)
            .expect("resample kernel run_into should succeed");
        assert!(out.iter().all(|v| !v.is_nan()));
    }

    #[test]
    fn kernel_rejects_invalid_target_len() {
        let result = ResampleKernel::<f64>::try_new(ResampleConfig {
            target_len: 0,
            window: None,
        });
        assert!(result.is_err());
        assert!(resample::<f64>(&[], 4, None).is_err());
    }
}
