//! Polyphase multirate primitives analogous to `scipy.signal.upfirdn` and
//! `scipy.signal.resample_poly`.

use ndarray::{Array, ArrayView, ArrayView1, Axis, Dimension, Zip};
use sigtwin_core::{Error, Result};

use crate::kernel::{
    ensure_out_len, ConfigError, ExecInvariantViolation, KernelLifecycle, Read1D, Write1D,
};
use crate::signal::filter::design::firwin_dyn;
use crate::signal::traits::{Resample1D, UpFirDn1D};
use crate::signal::windows::Window;
use crate::signal::{Real, Sample};

/// Resolve a possibly negative `axis` against `ndim`.
pub fn normalize_axis(axis: isize, ndim: usize) -> Result<usize> {
    let resolved = if axis < 0 {
        axis + ndim as isize
    } else {
        axis
    };
    if resolved < 0 || resolved as usize >= ndim {
        return Err(Error::invalid_arg(
            "axis",
            format!("axis {axis} is out of bounds for array of dimension {ndim}"),
        ));
    }
    Ok(resolved as usize)
}

pub(crate) fn gcd(mut a: usize, mut b: usize) -> usize {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Length of `upfirdn` output for `n` input samples and `taps` filter taps.
pub fn upfirdn_output_len(n: usize, taps: usize, up: usize, down: usize) -> usize {
    ((n - 1) * up + taps - 1) / down + 1
}

pub(crate) fn validate_upfirdn<F>(h: &[F], up: usize, down: usize) -> Result<()> {
    if h.is_empty() {
        return Err(Error::invalid_arg("h", "h must be 1-D with non-zero length"));
    }
    if up == 0 {
        return Err(Error::invalid_arg("up", "up must be a positive integer."));
    }
    if down == 0 {
        return Err(Error::invalid_arg("down", "down must be a positive integer."));
    }
    Ok(())
}

/// Upsample, FIR filter, and downsample one contiguous lane.
///
/// The zero-stuffed signal is materialized and filtered by a full-mode
/// direct convolution before decimation.
fn upfirdn_lane<T: Sample>(h: &[T::Real], x: &[T], up: usize, down: usize) -> Vec<T> {
    let mut stuffed = vec![T::zero(); (x.len() - 1) * up + 1];
    x.iter()
        .enumerate()
        .for_each(|(i, &v)| stuffed[i * up] = v);

    let n_out = upfirdn_output_len(x.len(), h.len(), up, down);
    (0..n_out)
        .map(|m| {
            let t = m * down;
            let lo = t.saturating_sub(stuffed.len() - 1);
            let hi = t.min(h.len() - 1);
            let mut acc = T::zero();
            for j in lo..=hi {
                acc += stuffed[t - j].scale(h[j]);
            }
            acc
        })
        .collect()
}

///
/// Upsample, FIR filter, and downsample along `axis`.
///
/// <https://docs.scipy.org/doc/scipy/reference/generated/scipy.signal.upfirdn.html>
///
/// The signal is zero-stuffed by `up`, convolved in full mode with `h`, and
/// every `down`-th sample is kept. Along `axis` the output holds
/// `((n - 1) * up + len(h) - 1) / down + 1` samples; other axes are left
/// alone. A negative `axis` counts from the end.
///
pub fn upfirdn<T, D>(
    h: &[T::Real],
    x: ArrayView<'_, T, D>,
    up: usize,
    down: usize,
    axis: isize,
) -> Result<Array<T, D>>
where
    T: Sample,
    D: Dimension,
{
    validate_upfirdn(h, up, down)?;
    let ax = normalize_axis(axis, x.ndim())?;
    let n = x.len_of(Axis(ax));
    if n == 0 {
        return Err(Error::invalid_arg("x", "input must be non-empty."));
    }

    let n_out = upfirdn_output_len(n, h.len(), up, down);
    tracing::trace!(shape = ?x.shape(), axis = ax, up, down, taps = h.len(), "upfirdn");
    let mut shape = x.raw_dim();
    shape[ax] = n_out;
    let mut out = Array::<T, D>::zeros(shape);
    Zip::from(out.lanes_mut(Axis(ax)))
        .and(x.lanes(Axis(ax)))
        .for_each(|mut o, lane| {
            let y = match lane.as_slice() {
                Some(s) => upfirdn_lane(h, s, up, down),
                None => upfirdn_lane(h, &lane.to_vec(), up, down),
            };
            o.iter_mut().zip(y).for_each(|(dst, v)| *dst = v);
        });
    Ok(out)
}

/// Reduce `up / down` by their greatest common divisor.
pub fn reduce_ratio(up: usize, down: usize) -> Result<(usize, usize)> {
    if up == 0 {
        return Err(Error::invalid_arg("up", "up must be a positive integer."));
    }
    if down == 0 {
        return Err(Error::invalid_arg("down", "down must be a positive integer."));
    }
    let g = gcd(up, down);
    Ok((up / g, down / g))
}

///
/// Anti-aliasing FIR used by [`resample_poly`] for an already reduced ratio.
///
/// `firwin(2 * half_len + 1, 1 / max(up, down), window)` with
/// `half_len = 10 * max(up, down)`, scaled by `up`. The window defaults to
/// `Kaiser { beta: 5.0 }`.
///
pub fn resample_poly_taps<F: Real>(
    up: usize,
    down: usize,
    window: Option<&Window<F>>,
) -> Result<Vec<F>> {
    let max_rate = up.max(down);
    let half_len = 10 * max_rate;
    let default_window;
    let window = match window {
        Some(w) => w,
        None => {
            default_window = Window::Kaiser { beta: F::cast(5.0) };
            &default_window
        }
    };
    let cutoff = F::cast(1.0) / F::cast_usize(max_rate);
    let mut h = firwin_dyn(2 * half_len + 1, &[cutoff], None, Some(window), true, true, None)?;
    let gain = F::cast_usize(up);
    h.iter_mut().for_each(|v| *v *= gain);
    Ok(h)
}

/// Padding plan aligning `upfirdn` output with the ideal resampled signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PolyPlan {
    pub n_out: usize,
    pub n_pre_pad: usize,
    pub n_post_pad: usize,
    pub n_pre_remove: usize,
}

pub(crate) fn poly_plan(n_in: usize, taps: usize, up: usize, down: usize) -> PolyPlan {
    let half_len = (taps - 1) / 2;
    let n_out = (n_in * up).div_ceil(down);
    let n_pre_pad = down - half_len % down;
    let n_pre_remove = (half_len + n_pre_pad) / down;
    let mut n_post_pad = 0;
    while upfirdn_output_len(n_in, taps + n_pre_pad + n_post_pad, up, down) < n_out + n_pre_remove
    {
        n_post_pad += 1;
    }
    PolyPlan {
        n_out,
        n_pre_pad,
        n_post_pad,
        n_pre_remove,
    }
}

/// `taps` with `plan`'s leading and trailing zeros.
pub(crate) fn padded_taps<F: Real>(taps: &[F], plan: &PolyPlan) -> Vec<F> {
    let mut padded = vec![F::zero(); plan.n_pre_pad + taps.len() + plan.n_post_pad];
    padded[plan.n_pre_pad..plan.n_pre_pad + taps.len()].copy_from_slice(taps);
    padded
}

/// Resolved axis and input length along it, rejecting an empty axis.
pub(crate) fn resample_axis<T, D: Dimension>(
    x: &ArrayView<'_, T, D>,
    axis: isize,
) -> Result<(usize, usize)> {
    let ax = normalize_axis(axis, x.ndim())?;
    let n_in = x.len_of(Axis(ax));
    if n_in == 0 {
        return Err(Error::invalid_arg("x", "input must be non-empty."));
    }
    Ok((ax, n_in))
}

///
/// Resample `x` along `axis` by `up / down` using polyphase filtering.
///
/// <https://docs.scipy.org/doc/scipy/reference/generated/scipy.signal.resample_poly.html>
///
/// Along `axis` the output holds `ceil(n * up / down)` samples. The ratio is
/// reduced by its gcd first; a unit ratio returns a copy of `x`.
///
pub fn resample_poly<T, D>(
    x: ArrayView<'_, T, D>,
    up: usize,
    down: usize,
    window: Option<&Window<T::Real>>,
    axis: isize,
) -> Result<Array<T, D>>
where
    T: Sample,
    D: Dimension,
{
    let (up, down) = reduce_ratio(up, down)?;
    resample_axis(&x, axis)?;
    if up == 1 && down == 1 {
        return Ok(x.to_owned());
    }
    let taps = resample_poly_taps(up, down, window)?;
    resample_reduced(x, up, down, &taps, axis)
}

///
/// [`resample_poly`] with a caller-supplied FIR in place of the designed one.
///
/// `taps` is scaled by the reduced `up` before filtering, like a designed
/// filter.
///
pub fn resample_poly_with_taps<T, D>(
    x: ArrayView<'_, T, D>,
    up: usize,
    down: usize,
    taps: &[T::Real],
    axis: isize,
) -> Result<Array<T, D>>
where
    T: Sample,
    D: Dimension,
{
    if taps.is_empty() {
        return Err(Error::invalid_arg("window", "FIR taps must be non-empty."));
    }
    let (up, down) = reduce_ratio(up, down)?;
    resample_axis(&x, axis)?;
    if up == 1 && down == 1 {
        return Ok(x.to_owned());
    }
    let gain = T::Real::cast_usize(up);
    let scaled: Vec<T::Real> = taps.iter().map(|&v| v * gain).collect();
    resample_reduced(x, up, down, &scaled, axis)
}

fn resample_reduced<T, D>(
    x: ArrayView<'_, T, D>,
    up: usize,
    down: usize,
    taps: &[T::Real],
    axis: isize,
) -> Result<Array<T, D>>
where
    T: Sample,
    D: Dimension,
{
    let (ax, n_in) = resample_axis(&x, axis)?;
    let plan = poly_plan(n_in, taps.len(), up, down);
    let h = padded_taps(taps, &plan);
    let y = upfirdn(&h, x, up, down, axis)?;
    Ok(y
        .slice_axis(
            Axis(ax),
            (plan.n_pre_remove..plan.n_pre_remove + plan.n_out).into(),
        )
        .to_owned())
}

/// Constructor config for [`UpFirDnKernel`].
#[derive(Debug, Clone, PartialEq)]
pub struct UpFirDnConfig<F> {
    /// FIR taps.
    pub taps: Vec<F>,
    /// Upsampling factor.
    pub up: usize,
    /// Downsampling factor.
    pub down: usize,
}

/// Trait-first 1D `upfirdn` kernel.
#[derive(Debug, Clone, PartialEq)]
pub struct UpFirDnKernel<F> {
    taps: Vec<F>,
    up: usize,
    down: usize,
}

impl<F: Real> UpFirDnKernel<F> {
    /// Output length for an input of `n` samples.
    pub fn output_len(&self, n: usize) -> usize {
        upfirdn_output_len(n, self.taps.len(), self.up, self.down)
    }
}

impl<F: Real> KernelLifecycle for UpFirDnKernel<F> {
    type Config = UpFirDnConfig<F>;

    fn try_new(config: Self::Config) -> core::result::Result<Self, ConfigError> {
        if config.taps.is_empty() {
            return Err(ConfigError::EmptyInput { arg: "taps" });
        }
        if config.up == 0 || config.down == 0 {
            return Err(ConfigError::InvalidArgument {
                arg: "up/down",
                reason: "resampling factors must be positive",
            });
        }
        Ok(Self {
            taps: config.taps,
            up: config.up,
            down: config.down,
        })
    }
}

impl<F: Real, T: Sample<Real = F>> UpFirDn1D<T> for UpFirDnKernel<F> {
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
        if input.is_empty() {
            return Err(ConfigError::EmptyInput { arg: "input" }.into());
        }
        let out_slice = out.write_slice_mut()?;
        ensure_out_len(out_slice, self.output_len(input.len()))?;
        let y = upfirdn(&self.taps, ArrayView1::from(input), self.up, self.down, 0)?;
        out_slice
            .iter_mut()
            .zip(y.iter())
            .for_each(|(dst, &v)| *dst = v);
        Ok(())
    }

    fn run_alloc<I>(&self, input: &I) -> core::result::Result<Vec<T>, ExecInvariantViolation>
    where
        I: Read1D<T> + ?Sized,
    {
        let input = input.read_slice()?;
        Ok(upfirdn(&self.taps, ArrayView1::from(input), self.up, self.down, 0)?.to_vec())
    }
}

/// Constructor config for [`ResamplePolyKernel`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResamplePolyConfig<F> {
    /// Upsampling factor.
    pub up: usize,
    /// Downsampling factor.
    pub down: usize,
    /// Window for the designed anti-aliasing FIR; `Kaiser { beta: 5.0 }`
    /// when unset.
    pub window: Option<Window<F>>,
}

/// Trait-first 1D polyphase resampling kernel.
///
/// The anti-aliasing filter is designed once at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct ResamplePolyKernel<F> {
    up: usize,
    down: usize,
    taps: Vec<F>,
}

impl<F: Real> ResamplePolyKernel<F> {
    /// Reduced `(up, down)` ratio.
    pub fn ratio(&self) -> (usize, usize) {
        (self.up, self.down)
    }

    /// Designed FIR, already scaled by `up`. Empty for a unit ratio.
    pub fn taps(&self) -> &[F] {
        &self.taps
    }

    /// Output length for an input of `n` samples.
    pub fn output_len(&self, n: usize) -> usize {
        (n * self.up).div_ceil(self.down)
    }
}

impl<F: Real> KernelLifecycle for ResamplePolyKernel<F> {
    type Config = ResamplePolyConfig<F>;

    fn try_new(config: Self::Config) -> core::result::Result<Self, ConfigError> {
        let (up, down) =
            reduce_ratio(config.up, config.down).map_err(|_| ConfigError::InvalidArgument {
                arg: "up/down",
                reason: "resampling factors must be positive",
            })?;
        let taps = if up == 1 && down == 1 {
            Vec::new()
        } else {
            resample_poly_taps(up, down, config.window.as_ref()).map_err(|_| {
                ConfigError::InvalidArgument {
                    arg: "window",
                    reason: "window could not be evaluated for the anti-aliasing filter",
                }
            })?
        };
        Ok(Self { up, down, taps })
    }
}

impl<F: Real> ResamplePolyKernel<F> {
    fn run<T: Sample<Real = F>>(&self, input: &[T]) -> Result<Vec<T>> {
        if input.is_empty() {
            return Err(Error::invalid_arg("x", "input must be non-empty."));
        }
        if self.taps.is_empty() {
            return Ok(input.to_vec());
        }
        Ok(resample_reduced(ArrayView1::from(input), self.up, self.down, &self.taps, 0)?.to_vec())
    }
}

impl<F: Real, T: Sample<Real = F>> Resample1D<T> for ResamplePolyKernel<F> {
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
        ensure_out_len(out_slice, self.output_len(input.len()))?;
        let y = self.run(input)?;
        out_slice.copy_from_slice(&y);
        Ok(())
    }

    fn run_alloc<I>(&self, input: &I) -> core::result::Result<Vec<T>, ExecInvariantViolation>
    where
        I: Read1D<T> + ?Sized,
    {
        Ok(self.run(input.read_slice()?)?)
    }
}
