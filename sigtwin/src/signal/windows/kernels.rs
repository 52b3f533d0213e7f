//! Trait-first window generation kernel.

use crate::kernel::{
    ensure_out_len, ConfigError, ExecInvariantViolation, KernelLifecycle, Write1D,
};
use crate::signal::traits::WindowGenerate;
use crate::signal::Real;

use super::{get_window, Window};

/// Constructor config for [`WindowKernel`].
#[derive(Debug, Clone, PartialEq)]
pub struct WindowConfig<F> {
    /// Window family and parameters.
    pub window: Window<F>,
    /// Output length.
    pub nx: usize,
    /// `true` for the periodic window, `false` for the symmetric one.
    pub fftbins: bool,
}

/// Trait-first window generation kernel.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowKernel<F> {
    window: Window<F>,
    nx: usize,
    fftbins: bool,
}

impl<F: Real> KernelLifecycle for WindowKernel<F> {
    type Config = WindowConfig<F>;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        if config.nx == 0 {
            return Err(ConfigError::InvalidArgument {
                arg: "nx",
                reason: "window length must be greater than 0",
            });
        }
        if matches!(
            &config.window,
            Window::GeneralCosine { weights } if weights.is_empty()
        ) {
            return Err(ConfigError::EmptyInput { arg: "weights" });
        }

        Ok(Self {
            window: config.window,
            nx: config.nx,
            fftbins: config.fftbins,
        })
    }
}

impl<F: Real> WindowGenerate<F> for WindowKernel<F> {
    fn run_into<O>(&self, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        O: Write1D<F> + ?Sized,
    {
        let out_slice = out.write_slice_mut()?;
        ensure_out_len(out_slice, self.nx)?;
        let generated = self.run_alloc()?;
        out_slice.copy_from_slice(&generated);
        Ok(())
    }

    fn run_alloc(&self) -> Result<Vec<F>, ExecInvariantViolation> {
        Ok(get_window(&self.window, self.nx, self.fftbins)?)
    }
}
