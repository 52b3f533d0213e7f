//! Digital FIR filter design and the second-order-section representation.
//!
//! Functions located in the [`Filter design` section of
//! `scipy.signal`](https://docs.scipy.org/doc/scipy/reference/signal.html#filter-design).

use core::f64::consts::PI;

use sigtwin_core::{Error, Result};

use crate::signal::windows::{get_window, Window};
use crate::signal::Real;

mod kernels;

pub use kernels::*;

/// One biquad section with its transposed direct-form-II state.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Sos<F> {
    /// Numerator coefficients `b0, b1, b2`.
    pub b: [F; 3],
    /// Denominator coefficients `a0, a1, a2`; `a0` must be one.
    pub a: [F; 3],
    /// First state register.
    pub zi0: F,
    /// Second state register.
    pub zi1: F,
}

impl<F: Real> Sos<F> {
    /// Section with zeroed state.
    pub fn new(b: [F; 3], a: [F; 3]) -> Self {
        Self {
            b,
            a,
            zi0: F::zero(),
            zi1: F::zero(),
        }
    }

    ///
    /// Build `n` sections from the flat `n x 6` row-major layout returned by
    /// `scipy.signal.*(output='sos')`: `[b0, b1, b2, a0, a1, a2]` per row.
    ///
    /// Rows beyond the supplied coefficients are not synthesized.
    ///
    pub fn from_scipy_dyn(n: usize, sos: Vec<F>) -> Vec<Sos<F>> {
        sos.chunks_exact(6)
            .take(n)
            .map(|c| Sos::new([c[0], c[1], c[2]], [c[3], c[4], c[5]]))
            .collect()
    }

    /// Flatten sections back into the `n x 6` scipy layout.
    pub fn to_scipy(sos: &[Sos<F>]) -> Vec<F> {
        sos.iter()
            .flat_map(|s| s.b.iter().chain(s.a.iter()).copied())
            .collect()
    }

    /// Zero both state registers.
    pub fn reset(&mut self) {
        self.zi0 = F::zero();
        self.zi1 = F::zero();
    }
}

/// Check the cascade is usable: non-empty and every `a0 == 1`.
pub fn validate_sos<F: Real>(sos: &[Sos<F>]) -> Result<()> {
    if sos.is_empty() {
        return Err(Error::invalid_arg("sos", "input must be non-empty."));
    }
    if sos.iter().any(|s| s.a[0] != F::one()) {
        return Err(Error::invalid_arg(
            "sos",
            "sos[:, 3] should be all ones (a0 of every section).",
        ));
    }
    Ok(())
}

/// Kaiser window attenuation in dB for `numtaps` taps and normalized
/// transition `width`.
pub fn kaiser_atten(numtaps: usize, width: f64) -> f64 {
    2.285 * (numtaps as f64 - 1.0) * PI * width + 7.95
}

/// Kaiser `beta` achieving attenuation `a` dB.
pub fn kaiser_beta(a: f64) -> f64 {
    if a > 50.0 {
        0.1102 * (a - 8.7)
    } else if a > 21.0 {
        0.5842 * (a - 21.0).powf(0.4) + 0.07886 * (a - 21.0)
    } else {
        0.0
    }
}

fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        let y = PI * x;
        y.sin() / y
    }
}

///
/// FIR filter design using the window method.
///
/// <https://docs.scipy.org/doc/scipy/reference/generated/scipy.signal.firwin.html>
///
/// * `numtaps`: length of the filter. Must be odd if a passband includes the
///   Nyquist frequency.
/// * `cutoff`: band edges in the units of `fs`, strictly increasing and
///   inside `(0, fs/2)`.
/// * `width`: when set, a Kaiser window is designed for this transition
///   width. Cannot be combined with `window`.
/// * `window`: window family, evaluated symmetric. Defaults to Hamming.
/// * `pass_zero`: whether DC is in the passband.
/// * `scale`: normalize to unit gain at the center of the first passband.
/// * `fs`: sampling frequency, default `2.0` so cutoffs are relative to
///   Nyquist.
///
pub fn firwin_dyn<F: Real>(
    numtaps: usize,
    cutoff: &[F],
    width: Option<F>,
    window: Option<&Window<F>>,
    pass_zero: bool,
    scale: bool,
    fs: Option<F>,
) -> Result<Vec<F>> {
    if numtaps == 0 {
        return Err(Error::invalid_arg(
            "numtaps",
            "numtaps must be greater than zero.",
        ));
    }
    if cutoff.is_empty() {
        return Err(Error::invalid_arg(
            "cutoff",
            "At least one cutoff frequency must be given.",
        ));
    }
    if width.is_some() && window.is_some() {
        return Err(Error::ConflictArg {
            reason: "window and width cannot both be set.".into(),
        });
    }

    let nyq = 0.5 * fs.map(|f| f.widen()).unwrap_or(2.0);
    let edges: Vec<f64> = cutoff.iter().map(|c| c.widen() / nyq).collect();
    if edges.iter().any(|&c| c <= 0.0 || c >= 1.0) {
        return Err(Error::invalid_arg(
            "cutoff",
            "Invalid cutoff frequency: frequencies must be greater than 0 and less than fs/2.",
        ));
    }
    if edges.windows(2).any(|pair| pair[1] <= pair[0]) {
        return Err(Error::invalid_arg(
            "cutoff",
            "Invalid cutoff frequencies: the frequencies must be strictly increasing.",
        ));
    }

    let pass_nyquist = (edges.len() % 2 == 1) ^ pass_zero;
    if pass_nyquist && numtaps % 2 == 0 {
        return Err(Error::invalid_arg(
            "numtaps",
            "A filter with an even number of coefficients must have zero response at the Nyquist frequency.",
        ));
    }

    let designed_window;
    let window = match (width, window) {
        (Some(width), None) => {
            let atten = kaiser_atten(numtaps, width.widen() / nyq);
            designed_window = Window::Kaiser {
                beta: F::cast(kaiser_beta(atten)),
            };
            &designed_window
        }
        (None, Some(window)) => window,
        _ => {
            designed_window = Window::Hamming;
            &designed_window
        }
    };

    let mut bounds = Vec::with_capacity(edges.len() + 2);
    if pass_zero {
        bounds.push(0.0);
    }
    bounds.extend_from_slice(&edges);
    if pass_nyquist {
        bounds.push(1.0);
    }
    let bands: Vec<(f64, f64)> = bounds.chunks_exact(2).map(|b| (b[0], b[1])).collect();

    let alpha = 0.5 * (numtaps as f64 - 1.0);
    let m: Vec<f64> = (0..numtaps).map(|i| i as f64 - alpha).collect();
    let mut h: Vec<f64> = m
        .iter()
        .map(|&mi| {
            bands
                .iter()
                .map(|&(left, right)| right * sinc(right * mi) - left * sinc(left * mi))
                .sum::<f64>()
        })
        .collect();

    let win = get_window(window, numtaps, false)?;
    h.iter_mut()
        .zip(win.iter())
        .for_each(|(hi, wi)| *hi *= wi.widen());

    if scale {
        let (left, right) = bands[0];
        let scale_frequency = if left == 0.0 {
            0.0
        } else if right == 1.0 {
            1.0
        } else {
            0.5 * (left + right)
        };
        let s: f64 = h
            .iter()
            .zip(m.iter())
            .map(|(hi, mi)| hi * (PI * mi * scale_frequency).cos())
            .sum();
        h.iter_mut().for_each(|hi| *hi /= s);
    }

    tracing::trace!(numtaps, bands = bands.len(), window = window.name(), "firwin");
    Ok(h.into_iter().map(F::cast).collect())
}
