//! Analytic signal via the Hilbert transform.

use nalgebra::Complex;
use ndarray::{Array2, ArrayView2};
use rustfft::FftDirection;
use sigtwin_core::{Error, Result};

use crate::kernel::{
    ensure_out_len, ConfigError, ExecInvariantViolation, KernelLifecycle, Read1D, Write1D,
};
use crate::signal::fft::{self, PlanSource};
use crate::signal::traits::Hilbert1D;
use crate::signal::Real;

/// Spectral mask turning a DFT into that of the analytic signal.
///
/// `h[0] = 1`, positive bins are doubled, the Nyquist bin of an even length
/// is kept once and negative bins are zeroed.
pub fn hilbert_mask<F: Real>(n: usize) -> Vec<F> {
    let mut h = vec![F::zero(); n];
    if n == 0 {
        return h;
    }
    h[0] = F::one();
    let two = F::cast(2.0);
    if n % 2 == 0 {
        h[n / 2] = F::one();
        h[1..n / 2].iter_mut().for_each(|v| *v = two);
    } else {
        h[1..n.div_ceil(2)].iter_mut().for_each(|v| *v = two);
    }
    h
}

///
/// Compute the analytic signal using the Hilbert transform.
///
/// <https://docs.scipy.org/doc/scipy/reference/generated/scipy.signal.hilbert.html>
///
/// The real part of the result reproduces `x`; the imaginary part is the
/// Hilbert transform of `x`.
///
pub fn hilbert<F: Real>(x: &[F]) -> Result<Vec<Complex<F>>> {
    hilbert_n(x, x.len())
}

/// [`hilbert`] over `n` Fourier components: `x` is truncated or zero-padded
/// to length `n` first.
pub fn hilbert_n<F: Real>(x: &[F], n: usize) -> Result<Vec<Complex<F>>> {
    if x.is_empty() {
        return Err(Error::invalid_arg("x", "input must be non-empty."));
    }
    if n == 0 {
        return Err(Error::invalid_arg("N", "N must be positive."));
    }
    let mut spectrum = fft::to_complex_padded(&x[..x.len().min(n)], n);
    fft::forward(&mut spectrum, PlanSource::Fresh);
    let h = hilbert_mask::<F>(n);
    spectrum
        .iter_mut()
        .zip(h.iter())
        .for_each(|(bin, &k)| *bin = Complex::new(bin.re * k, bin.im * k));
    fft::inverse_normalized(&mut spectrum, PlanSource::Fresh);
    Ok(spectrum)
}

///
/// Compute the 2D analytic signal.
///
/// <https://docs.scipy.org/doc/scipy/reference/generated/scipy.signal.hilbert2.html>
///
/// The 2D spectrum is weighted by the outer product of the row and column
/// masks of [`hilbert_mask`].
///
pub fn hilbert2<F: Real>(x: ArrayView2<'_, F>) -> Result<Array2<Complex<F>>> {
    let (rows, cols) = x.dim();
    if rows == 0 || cols == 0 {
        return Err(Error::invalid_arg("x", "input must be non-empty."));
    }
    let mut grid = x.mapv(|v| Complex::new(v, F::zero()));
    fft::transform_2d(&mut grid, FftDirection::Forward, PlanSource::Fresh);
    let h_rows = hilbert_mask::<F>(rows);
    let h_cols = hilbert_mask::<F>(cols);
    let scale = F::one() / F::cast_usize(rows * cols);
    grid.indexed_iter_mut().for_each(|((i, j), bin)| {
        let k = h_rows[i] * h_cols[j] * scale;
        *bin = Complex::new(bin.re * k, bin.im * k);
    });
    fft::transform_2d(&mut grid, FftDirection::Inverse, PlanSource::Fresh);
    Ok(grid)
}

/// Constructor config for [`HilbertKernel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HilbertConfig {
    /// Number of Fourier components; the input length when unset.
    pub n: Option<usize>,
}

/// Trait-first 1D analytic-signal kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HilbertKernel {
    n: Option<usize>,
}

impl HilbertKernel {
    fn output_len(&self, input_len: usize) -> usize {
        self.n.unwrap_or(input_len)
    }
}

impl KernelLifecycle for HilbertKernel {
    type Config = HilbertConfig;

    fn try_new(config: Self::Config) -> core::result::Result<Self, ConfigError> {
        if config.n == Some(0) {
            return Err(ConfigError::InvalidArgument {
                arg: "n",
                reason: "number of Fourier components must be greater than 0",
            });
        }
        Ok(Self { n: config.n })
    }
}

impl<F: Real> Hilbert1D<F> for HilbertKernel {
    fn run_into<I, O>(
        &self,
        input: &I,
        out: &mut O,
    ) -> core::result::Result<(), ExecInvariantViolation>
    where
        I: Read1D<F> + ?Sized,
        O: Write1D<Complex<F>> + ?Sized,
    {
        let input = input.read_slice()?;
        let out = out.write_slice_mut()?;
        ensure_out_len(out, self.output_len(input.len()))?;
        out.copy_from_slice(&hilbert_n(input, self.output_len(input.len()))?);
        Ok(())
    }

    fn run_alloc<I>(
        &self,
        input: &I,
    ) -> core::result::Result<Vec<Complex<F>>, ExecInvariantViolation>
    where
        I: Read1D<F> + ?Sized,
    {
        let input = input.read_slice()?;
        Ok(hilbert_n(input, self.output_len(input.len()))?)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use ndarray::Array2;

    use super::*;

    #[test]
    fn masks_for_even_and_odd_lengths() {
        assert_eq!(hilbert_mask::<f64>(4), vec![1.0, 2.0, 1.0, 0.0]);
        assert_eq!(hilbert_mask::<f64>(5), vec![1.0, 2.0, 2.0, 0.0, 0.0]);
        assert_eq!(hilbert_mask::<f64>(1), vec![1.0]);
        assert_eq!(hilbert_mask::<f64>(2), vec![1.0, 1.0]);
    }

    #[test]
    fn analytic_cosine_is_complex_exponential() {
        let n = 64;
        let w = 2.0 * core::f64::consts::PI * 5.0 / n as f64;
        let x: Vec<f64> = (0..n).map(|i| (w * i as f64).cos()).collect();
        let z = hilbert(&x).unwrap();
        for (i, zi) in z.iter().enumerate() {
            assert_abs_diff_eq!(zi.re, (w * i as f64).cos(), epsilon = 1e-12);
            assert_abs_diff_eq!(zi.im, (w * i as f64).sin(), epsilon = 1e-12);
        }
    }

    #[test]
    fn real_part_reproduces_input() {
        let x: Vec<f32> = (0..33).map(|i| ((i * 17) % 11) as f32 - 5.0).collect();
        let z = hilbert(&x).unwrap();
        x.iter()
            .zip(z.iter())
            .for_each(|(a, b)| assert_abs_diff_eq!(*a, b.re, epsilon = 1e-4));
    }

    #[test]
    fn hilbert_n_pads_and_truncates() {
        let x = [1.0f64, 2.0, 3.0, 4.0];
        assert_eq!(hilbert_n(&x, 8).unwrap().len(), 8);
        let truncated = hilbert_n(&x, 2).unwrap();
        assert_eq!(truncated.len(), 2);
        assert_abs_diff_eq!(truncated[0].re, 1.0, epsilon = 1e-12);
        assert!(hilbert::<f64>(&[]).is_err());
    }

    #[test]
    fn hilbert2_keeps_dc() {
        let x = Array2::from_shape_fn((6, 7), |(i, j)| ((i * 5 + j * 3) % 4) as f64);
        let z = hilbert2(x.view()).unwrap();
        assert_eq!(z.dim(), (6, 7));
        let mean_in = x.sum() / 42.0;
        let mean_out = z.iter().map(|c| c.re).sum::<f64>() / 42.0;
        assert_abs_diff_eq!(mean_in, mean_out, epsilon = 1e-12);
    }

    #[test]
    fn hilbert2_of_separable_cosines() {
        let (m, n) = (16usize, 16usize);
        let wr = 2.0 * core::f64::consts::PI * 3.0 / m as f64;
        let wc = 2.0 * core::f64::consts::PI * 2.0 / n as f64;
        let x = Array2::from_shape_fn((m, n), |(i, j)| {
            (wr * i as f64).cos() * (wc * j as f64).cos()
        });
        let z = hilbert2(x.view()).unwrap();
        // Only the (+, +) quadrant survives, scaled by 4: exp(i (wr i + wc j)).
        for ((i, j), zij) in z.indexed_iter() {
            let phase = wr * i as f64 + wc * j as f64;
            assert_abs_diff_eq!(zij.re, phase.cos(), epsilon = 1e-12);
            assert_abs_diff_eq!(zij.im, phase.sin(), epsilon = 1e-12);
        }
    }

    #[test]
    fn kernel_matches_function() {
        let kernel = HilbertKernel::try_new(HilbertConfig::default()).expect("kernel");
        let x = [0.5f64, -1.0, 2.0, 0.25, 3.0];
        let mut out = vec![Complex::new(0.0, 0.0); 5];
        kernel.run_into(&x, &mut out).expect("hilbert kernel run");
        assert_eq!(out, hilbert(&x).unwrap());
        assert!(HilbertKernel::try_new(HilbertConfig { n: Some(0) }).is_err());
    }
}
