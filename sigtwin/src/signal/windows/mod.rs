//! Window functions.
//!
//! Functions located in the [`Window functions` section of
//! `scipy.signal`](https://docs.scipy.org/doc/scipy/reference/signal.windows.html).
//!
//! Every family is evaluated in `f64` and narrowed to the requested width, so
//! both execution backends see bit-identical taps.

use core::f64::consts::PI;

use sigtwin_core::{Error, Result};

use super::Real;

mod kernels;

pub use kernels::*;

/// Window family and shape parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Window<F> {
    /// Rectangular window.
    Boxcar,
    /// Triangular window (`scipy.signal.windows.triang`).
    Triangle,
    /// Hann window.
    Hann,
    /// Hamming window.
    Hamming,
    /// Blackman window.
    Blackman,
    /// Kaiser window.
    Kaiser {
        /// Shape parameter `beta`.
        beta: F,
    },
    /// Generalized Hamming window, `alpha - (1 - alpha) cos(..)`.
    GeneralHamming {
        /// Window coefficient.
        alpha: F,
    },
    /// Weighted sum of cosine terms.
    GeneralCosine {
        /// Coefficients for weighted cosine terms.
        weights: Vec<F>,
    },
}

impl<F: Real> Window<F> {
    /// Lower-case family name as accepted by `scipy.signal.get_window`.
    pub fn name(&self) -> &'static str {
        match self {
            Window::Boxcar => "boxcar",
            Window::Triangle => "triang",
            Window::Hann => "hann",
            Window::Hamming => "hamming",
            Window::Blackman => "blackman",
            Window::Kaiser { .. } => "kaiser",
            Window::GeneralHamming { .. } => "general_hamming",
            Window::GeneralCosine { .. } => "general_cosine",
        }
    }

    fn symmetric(&self, m: usize) -> Vec<f64> {
        if m == 1 {
            return vec![1.0];
        }
        match self {
            Window::Boxcar => vec![1.0; m],
            Window::Triangle => triangle(m),
            Window::Hann => general_cosine(m, &[0.5, 0.5]),
            Window::Hamming => general_cosine(m, &[0.54, 0.46]),
            Window::Blackman => general_cosine(m, &[0.42, 0.50, 0.08]),
            Window::Kaiser { beta } => kaiser(m, beta.widen()),
            Window::GeneralHamming { alpha } => {
                let alpha = alpha.widen();
                general_cosine(m, &[alpha, 1.0 - alpha])
            }
            Window::GeneralCosine { weights } => {
                let weights = weights.iter().map(|w| w.widen()).collect::<Vec<_>>();
                general_cosine(m, &weights)
            }
        }
    }
}

///
/// Return a window of a given length and type.
///
/// `fftbins = true` yields the periodic (DFT-even) window, suitable for
/// spectral analysis; `false` yields the symmetric window used in filter
/// design. The periodic window of length `nx` is the symmetric window of
/// length `nx + 1` with its last sample dropped.
///
/// <https://docs.scipy.org/doc/scipy/reference/generated/scipy.signal.get_window.html>
///
pub fn get_window<F: Real>(window: &Window<F>, nx: usize, fftbins: bool) -> Result<Vec<F>> {
    if nx == 0 {
        return Err(Error::invalid_arg("nx", "window length must be positive."));
    }
    if let Window::GeneralCosine { weights } = window {
        if weights.is_empty() {
            return Err(Error::invalid_arg("weights", "input must be non-empty."));
        }
    }
    let w = if fftbins && nx > 1 {
        let mut w = window.symmetric(nx + 1);
        w.truncate(nx);
        w
    } else {
        window.symmetric(nx)
    };
    Ok(w.into_iter().map(F::cast).collect())
}

fn general_cosine(m: usize, a: &[f64]) -> Vec<f64> {
    let step = 2.0 * PI / (m - 1) as f64;
    (0..m)
        .map(|n| {
            let fac = -PI + step * n as f64;
            a.iter()
                .enumerate()
                .map(|(k, ak)| ak * (k as f64 * fac).cos())
                .sum::<f64>()
        })
        .collect()
}

fn triangle(m: usize) -> Vec<f64> {
    let half = m.div_ceil(2);
    let rising: Vec<f64> = if m % 2 == 0 {
        (1..=half).map(|n| (2 * n - 1) as f64 / m as f64).collect()
    } else {
        (1..=half).map(|n| 2.0 * n as f64 / (m + 1) as f64).collect()
    };
    let skip = m % 2;
    rising
        .iter()
        .copied()
        .chain(rising.iter().rev().skip(skip).copied())
        .collect()
}

fn kaiser(m: usize, beta: f64) -> Vec<f64> {
    let alpha = (m - 1) as f64 / 2.0;
    let denom = bessel_i0(beta);
    (0..m)
        .map(|n| {
            let r = (n as f64 - alpha) / alpha;
            bessel_i0(beta * (1.0 - r * r).max(0.0).sqrt()) / denom
        })
        .collect()
}

/// Modified Bessel function of the first kind, order zero.
///
/// Power series `sum_k ((x/2)^k / k!)^2`, summed until terms stop
/// contributing at `f64` precision.
pub fn bessel_i0(x: f64) -> f64 {
    let half = x / 2.0;
    let mut term = 1.0;
    let mut sum = 1.0;
    for k in 1..=500 {
        let r = half / k as f64;
        term *= r * r;
        sum += term;
        if term <= sum * f64::EPSILON {
            break;
        }
    }
    sum
}
