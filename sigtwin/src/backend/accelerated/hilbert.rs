use nalgebra::Complex;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rayon::prelude::*;
use rustfft::FftDirection;
use sigtwin_core::{Error, Result};

use crate::signal::fft::{self, PlanSource};
use crate::signal::hilbert::hilbert_mask;
use crate::signal::Real;

pub(super) fn hilbert<F: Real>(x: ArrayView1<'_, F>) -> Result<Array1<Complex<F>>> {
    let n = x.len();
    if n == 0 {
        return Err(Error::invalid_arg("x", "input must be non-empty."));
    }
    let mut spectrum: Vec<Complex<F>> = x.iter().map(|&v| Complex::new(v, F::zero())).collect();
    fft::forward(&mut spectrum, PlanSource::Shared);
    let h = hilbert_mask::<F>(n);
    let scale = F::one() / F::cast_usize(n);
    spectrum
        .par_iter_mut()
        .zip(h.par_iter())
        .for_each(|(bin, &w)| {
            let k = w * scale;
            *bin = Complex::new(bin.re * k, bin.im * k);
        });
    fft::inverse(&mut spectrum, PlanSource::Shared);
    Ok(Array1::from(spectrum))
}

pub(super) fn hilbert2<F: Real>(x: ArrayView2<'_, F>) -> Result<Array2<Complex<F>>> {
    let (rows, cols) = x.dim();
    if rows == 0 || cols == 0 {
        return Err(Error::invalid_arg("x", "input must be non-empty."));
    }
    let mut grid = x.mapv(|v| Complex::new(v, F::zero()));
    fft::transform_2d(&mut grid, FftDirection::Forward, PlanSource::Shared);
    let h_rows = hilbert_mask::<F>(rows);
    let h_cols = hilbert_mask::<F>(cols);
    let scale = F::one() / F::cast_usize(rows * cols);
    grid.axis_iter_mut(Axis(0))
        .into_par_iter()
        .zip(h_rows.par_iter())
        .for_each(|(mut row, &hr)| {
            row.iter_mut().zip(h_cols.iter()).for_each(|(bin, &hc)| {
                let k = hr * hc * scale;
                *bin = Complex::new(bin.re * k, bin.im * k);
            });
        });
    fft::transform_2d(&mut grid, FftDirection::Inverse, PlanSource::Shared);
    Ok(grid)
}
