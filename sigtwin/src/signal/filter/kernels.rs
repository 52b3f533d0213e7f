//! Trait-first kernel wrapper for streaming `sosfilt`.

use crate::kernel::{
    ensure_out_len, ConfigError, ExecInvariantViolation, KernelLifecycle, Read1D, Write1D,
};
use crate::signal::traits::SosFilt1D;
use crate::signal::Real;

use super::biquad_step;
use super::design::Sos;

/// Constructor config for [`SosFiltKernel`].
#[derive(Debug, Clone)]
pub struct SosFiltConfig<F> {
    /// Second-order sections; their state registers seed the stream.
    pub sos: Vec<Sos<F>>,
}

/// Stateful 1D `sosfilt` kernel.
///
/// Each call continues from the state left by the previous call, so a long
/// signal can be fed in chunks. `&mut self` on every entrypoint keeps one
/// state object out of concurrent use.
#[derive(Debug, Clone)]
pub struct SosFiltKernel<F> {
    sos: Vec<Sos<F>>,
}

impl<F: Real> SosFiltKernel<F> {
    /// Zero the state of every section.
    pub fn reset(&mut self) {
        self.sos.iter_mut().for_each(Sos::reset);
    }

    /// Current sections, including their state registers.
    pub fn sections(&self) -> &[Sos<F>] {
        &self.sos
    }
}

impl<F: Real> KernelLifecycle for SosFiltKernel<F> {
    type Config = SosFiltConfig<F>;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        if config.sos.is_empty() {
            return Err(ConfigError::EmptyInput { arg: "sos" });
        }
        if config.sos.iter().any(|s| s.a[0] != F::one()) {
            return Err(ConfigError::InvalidArgument {
                arg: "sos",
                reason: "a0 of every section must be one",
            });
        }
        Ok(Self { sos: config.sos })
    }
}

impl<F: Real> SosFilt1D<F> for SosFiltKernel<F> {
    fn run_into<I, O>(&mut self, input: &I, out: &mut O) -> Result<(), ExecInvariantViolation>
    where
        I: Read1D<F> + ?Sized,
        O: Write1D<F> + ?Sized,
    {
        let input = input.read_slice()?;
        let out_slice = out.write_slice_mut()?;
        ensure_out_len(out_slice, input.len())?;
        for (o, &x) in out_slice.iter_mut().zip(input.iter()) {
            *o = self
                .sos
                .iter_mut()
                .fold(x, |acc, section| biquad_step(section, acc));
        }
        Ok(())
    }

    fn run_alloc<I>(&mut self, input: &I) -> Result<Vec<F>, ExecInvariantViolation>
    where
        I: Read1D<F> + ?Sized,
    {
        let input = input.read_slice()?;
        Ok(super::sosfilt_dyn(input.iter(), &mut self.sos))
    }
}
