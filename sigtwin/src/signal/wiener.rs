//! Local-statistics Wiener denoising analogous to `scipy.signal.wiener`.

use ndarray::{indices, Array, ArrayD, ArrayView, ArrayView1, Dimension, IxDyn, Zip};
use sigtwin_core::{Error, Result};

use crate::kernel::{
    ensure_out_len, ConfigError, ExecInvariantViolation, KernelLifecycle, Read1D, Write1D,
};
use crate::signal::traits::Wiener1D;
use crate::signal::Real;

/// Window edge used when none is given.
pub const DEFAULT_WINDOW: usize = 3;

/// Window extent per axis: one entry is broadcast, otherwise one per axis.
pub fn window_shape(window_size: Option<&[usize]>, ndim: usize) -> Result<Vec<usize>> {
    let window = match window_size {
        None => vec![DEFAULT_WINDOW; ndim],
        Some([w]) => vec![*w; ndim],
        Some(w) if w.len() == ndim => w.to_vec(),
        Some(w) => {
            return Err(Error::invalid_arg(
                "mysize",
                format!(
                    "window has {} entries but the input has {ndim} dimensions",
                    w.len()
                ),
            ))
        }
    };
    if window.iter().any(|&w| w == 0) {
        return Err(Error::invalid_arg("mysize", "window size must be positive."));
    }
    Ok(window)
}

/// Combine the input with its local mean and variance.
///
/// Where the local variance is below the noise power, or not positive, the
/// local mean is used.
#[inline]
pub(crate) fn wiener_point<F: Real>(x: F, mean: F, var: F, noise: F) -> F {
    if var < noise || var <= F::zero() {
        mean
    } else {
        mean + (F::one() - noise / var) * (x - mean)
    }
}

/// Mean of the local variance, used as the noise estimate.
pub(crate) fn mean_of<F: Real>(values: impl Iterator<Item = F>, len: usize) -> F {
    values.fold(F::zero(), |acc, v| acc + v) / F::cast_usize(len)
}

///
/// Apply a Wiener filter to an N-dimensional array.
///
/// <https://docs.scipy.org/doc/scipy/reference/generated/scipy.signal.wiener.html>
///
/// * `window_size`: box window extent per axis (one value broadcasts);
///   defaults to 3 along every axis. The box around index `i` spans
///   `[i - w/2, i + (w-1)/2]`, zero-padded past the edges.
/// * `noise`: noise power; defaults to the mean of the local variance.
///
/// Local sums are divided by the full window size.
///
pub fn wiener<F, D>(
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
    let xd = x.view().into_dyn();
    let shape = xd.shape().to_vec();
    tracing::trace!(shape = ?shape, window = ?window, "wiener");

    let sums: ArrayD<(F, F)> = ArrayD::from_shape_fn(xd.raw_dim(), |idx: IxDyn| {
        let mut pos = vec![0usize; shape.len()];
        let mut s = F::zero();
        let mut s2 = F::zero();
        'window: for offset in indices(IxDyn(&window)) {
            for ax in 0..shape.len() {
                let p = idx[ax] as isize + offset[ax] as isize - (window[ax] / 2) as isize;
                if p < 0 || p >= shape[ax] as isize {
                    continue 'window;
                }
                pos[ax] = p as usize;
            }
            let v = xd[pos.as_slice()];
            s += v;
            s2 += v * v;
        }
        (s, s2)
    });

    let mean = sums.mapv(|(s, _)| s / count);
    let var = Zip::from(&sums)
        .and(&mean)
        .map_collect(|&(_, s2), &m| s2 / count - m * m);
    let noise = noise.unwrap_or_else(|| mean_of(var.iter().copied(), var.len()));

    let out = Zip::from(&xd)
        .and(&mean)
        .and(&var)
        .map_collect(|&v, &m, &s| wiener_point(v, m, s, noise));
    out.into_dimensionality::<D>()
        .map_err(|e| Error::ExecInvariantViolation {
            reason: e.to_string(),
        })
}

/// Constructor config for [`WienerKernel`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WienerConfig<F> {
    /// Window length.
    pub window_size: usize,
    /// Noise power; estimated from the input when unset.
    pub noise: Option<F>,
}

impl<F> Default for WienerConfig<F> {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW,
            noise: None,
        }
    }
}

/// Trait-first 1D Wiener kernel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WienerKernel<F> {
    window_size: usize,
    noise: Option<F>,
}

impl<F: Real> KernelLifecycle for WienerKernel<F> {
    type Config = WienerConfig<F>;

    fn try_new(config: Self::Config) -> core::result::Result<Self, ConfigError> {
        if config.window_size == 0 {
            return Err(ConfigError::InvalidArgument {
                arg: "window_size",
                reason: "window size must be greater than 0",
            });
        }
        if config.noise.is_some_and(|n| n < F::zero()) {
            return Err(ConfigError::InvalidArgument {
                arg: "noise",
                reason: "noise power must be non-negative",
            });
        }
        Ok(Self {
            window_size: config.window_size,
            noise: config.noise,
        })
    }
}

impl<F: Real> WienerKernel<F> {
    fn run(&self, input: &[F]) -> Result<Vec<F>> {
        let y = wiener(
            ArrayView1::from(input),
            Some(&[self.window_size]),
            self.noise,
        )?;
        Ok(y.to_vec())
    }
}

impl<F: Real> Wiener1D<F> for WienerKernel<F> {
    fn run_into<I, O>(
        &self,
        input: &I,
        out: &mut O,
    ) -> core::result::Result<(), ExecInvariantViolation>
    where
        I: Read1D<F> + ?Sized,
        O: Write1D<F> + ?Sized,
    {
        let input = input.read_slice()?;
        let out = out.write_slice_mut()?;
        ensure_out_len(out, input.len())?;
        out.copy_from_slice(&self.run(input)?);
        Ok(())
    }

    fn run_alloc<I>(&self, input: &I) -> core::result::Result<Vec<F>, ExecInvariantViolation>
    where
        I: Read1D<F> + ?Sized,
    {
        Ok(self.run(input.read_slice()?)?)
    }
}
