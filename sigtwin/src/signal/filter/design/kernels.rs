//! Trait-first kernel for FIR design.

use crate::kernel::{
    ensure_out_len, ConfigError, ExecInvariantViolation, KernelLifecycle, Write1D,
};
use crate::signal::traits::FirWinDesign;
use crate::signal::windows::Window;
use crate::signal::Real;

use super::firwin_dyn;

/// Constructor config for [`FirWinKernel`].
#[derive(Debug, Clone, PartialEq)]
pub struct FirWinConfig<F> {
    /// Number of filter taps.
    pub numtaps: usize,
    /// Cutoff frequencies.
    pub cutoff: Vec<F>,
    /// Optional transition width (designs a Kaiser window).
    pub width: Option<F>,
    /// Optional window family (evaluated symmetric).
    pub window: Option<Window<F>>,
    /// Whether DC is inside the passband.
    pub pass_zero: bool,
    /// Normalize to unit gain at the center of the first passband.
    pub scale: bool,
    /// Optional sample rate.
    pub fs: Option<F>,
}

impl<F: Real> FirWinConfig<F> {
    /// Lowpass design with Hamming window, unit DC gain, `fs = 2`.
    pub fn lowpass(numtaps: usize, cutoff: F) -> Self {
        Self {
            numtaps,
            cutoff: vec![cutoff],
            width: None,
            window: None,
            pass_zero: true,
            scale: true,
            fs: None,
        }
    }

    /// Bandpass design between `low` and `high` (relative to Nyquist).
    pub fn bandpass(numtaps: usize, low: F, high: F) -> Self {
        Self {
            cutoff: vec![low, high],
            pass_zero: false,
            ..Self::lowpass(numtaps, low)
        }
    }
}

/// Trait-first FIR design kernel.
#[derive(Debug, Clone, PartialEq)]
pub struct FirWinKernel<F> {
    config: FirWinConfig<F>,
}

impl<F: Real> KernelLifecycle for FirWinKernel<F> {
    type Config = FirWinConfig<F>;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        if config.numtaps == 0 {
            return Err(ConfigError::InvalidArgument {
                arg: "numtaps",
                reason: "numtaps must be greater than zero",
            });
        }
        if config.cutoff.is_empty() {
            return Err(ConfigError::EmptyInput { arg: "cutoff" });
        }
        if config.window.is_some() && config.width.is_some() {
            return Err(ConfigError::InvalidArgument {
                arg: "window/width",
                reason: "window and width cannot both be set",
            });
        }
        if config.cutoff.iter().any(|x| *x <= F::zero()) {
            return Err(ConfigError::InvalidArgument {
                arg: "cutoff",
                reason: "cutoff frequencies must be positive",
            });
        }
        if config.cutoff.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(ConfigError::InvalidArgument {
                arg: "cutoff",
                reason: "cutoff frequencies must be strictly increasing",
            });
        }
        Ok(Self { config })
    }
}

impl<F: Real> FirWinDesign<F> for FirWinKernel<F> {
    fn run_into<O>(&self, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        O: Write1D<F> + ?Sized,
    {
        let out_slice = out.write_slice_mut()?;
        ensure_out_len(out_slice, self.config.numtaps)?;
        let coeffs = self.run_alloc()?;
        out_slice.copy_from_slice(&coeffs);
        Ok(())
    }

    fn run_alloc(&self) -> Result<Vec<F>, ExecInvariantViolation> {
        let c = &self.config;
        Ok(firwin_dyn(
            c.numtaps,
            &c.cutoff,
            c.width,
            c.window.as_ref(),
            c.pass_zero,
            c.scale,
            c.fs,
        )?)
    }
}
