//! Trait-first kernels for 1D convolution and correlation.

use sigtwin_core::num_rs::ConvolveMode;

use crate::kernel::{
    ensure_out_len, ConfigError, ExecInvariantViolation, KernelLifecycle, Read1D, Write1D,
};
use crate::signal::traits::{Convolve1D, Correlate1D};
use crate::signal::Sample;

use super::{convolve, correlate, ConvMethod};

/// Constructor config for [`ConvolveKernel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConvolveConfig {
    /// Output extent.
    pub mode: ConvolveMode,
    /// Convolution strategy.
    pub method: ConvMethod,
}

/// Trait-first 1D convolution kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvolveKernel {
    mode: ConvolveMode,
    method: ConvMethod,
}

impl KernelLifecycle for ConvolveKernel {
    type Config = ConvolveConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        Ok(Self {
            mode: config.mode,
            method: config.method,
        })
    }
}

impl<T: Sample> Convolve1D<T> for ConvolveKernel {
    fn run_into<I1, I2, O>(
        &self,
        in1: &I1,
        in2: &I2,
        out: &mut O,
    ) -> Result<(), ExecInvariantViolation>
    where
        I1: Read1D<T> + ?Sized,
        I2: Read1D<T> + ?Sized,
        O: Write1D<T> + ?Sized,
    {
        let (a, b) = operands(in1, in2)?;
        let out = out.write_slice_mut()?;
        ensure_out_len(out, self.mode.output_len(a.len(), b.len()))?;
        out.copy_from_slice(&convolve(a, b, self.mode, self.method)?);
        Ok(())
    }

    fn run_alloc<I1, I2>(&self, in1: &I1, in2: &I2) -> Result<Vec<T>, ExecInvariantViolation>
    where
        I1: Read1D<T> + ?Sized,
        I2: Read1D<T> + ?Sized,
    {
        let (a, b) = operands(in1, in2)?;
        Ok(convolve(a, b, self.mode, self.method)?)
    }
}

/// Constructor config for [`CorrelateKernel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CorrelateConfig {
    /// Output extent.
    pub mode: ConvolveMode,
    /// Convolution strategy.
    pub method: ConvMethod,
}

/// Trait-first 1D correlation kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrelateKernel {
    mode: ConvolveMode,
    method: ConvMethod,
}

impl KernelLifecycle for CorrelateKernel {
    type Config = CorrelateConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        Ok(Self {
            mode: config.mode,
            method: config.method,
        })
    }
}

impl<T: Sample> Correlate1D<T> for CorrelateKernel {
    fn run_into<I1, I2, O>(
        &self,
        in1: &I1,
        in2: &I2,
        out: &mut O,
    ) -> Result<(), ExecInvariantViolation>
    where
        I1: Read1D<T> + ?Sized,
        I2: Read1D<T> + ?Sized,
        O: Write1D<T> + ?Sized,
    {
        let (a, b) = operands(in1, in2)?;
        let out = out.write_slice_mut()?;
        ensure_out_len(out, self.mode.output_len(a.len(), b.len()))?;
        out.copy_from_slice(&correlate(a, b, self.mode, self.method)?);
        Ok(())
    }

    fn run_alloc<I1, I2>(&self, in1: &I1, in2: &I2) -> Result<Vec<T>, ExecInvariantViolation>
    where
        I1: Read1D<T> + ?Sized,
        I2: Read1D<T> + ?Sized,
    {
        let (a, b) = operands(in1, in2)?;
        Ok(correlate(a, b, self.mode, self.method)?)
    }
}

fn operands<'a, T, I1, I2>(
    in1: &'a I1,
    in2: &'a I2,
) -> Result<(&'a [T], &'a [T]), ExecInvariantViolation>
where
    I1: Read1D<T> + ?Sized,
    I2: Read1D<T> + ?Sized,
{
    let a = in1.read_slice()?;
    let b = in2.read_slice()?;
    if a.is_empty() {
        return Err(ConfigError::EmptyInput { arg: "in1" }.into());
    }
    if b.is_empty() {
        return Err(ConfigError::EmptyInput { arg: "in2" }.into());
    }
    Ok((a, b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;

    #[test]
    fn convolve_kernel_matches_function() {
        let kernel = ConvolveKernel::try_new(ConvolveConfig {
            mode: ConvolveMode::Same,
            method: ConvMethod::Direct,
        })
        .expect("kernel should initialize");
        let a = Array1::from(vec![1.0f64, 2.0, 3.0]);
        let b = [0.0f64, 1.0, 0.5];
        let mut out = vec![0.0; 3];
        kernel
            .run_into(&a, &b, &mut out)
            .expect("convolve kernel run");
        assert_eq!(out, vec![1.0, 2.5, 4.0]);
    }

    #[test]
    fn correlate_kernel_allocates_full_output() {
        let kernel = CorrelateKernel::try_new(CorrelateConfig::default())
            .expect("kernel should initialize");
        let y = kernel
            .run_alloc(&[1.0f64, 2.0, 3.0], &[0.0, 1.0, 0.5])
            .expect("correlate kernel run");
        assert_eq!(y, vec![0.5, 2.0, 3.5, 3.0, 0.0]);
    }

    #[test]
    fn kernels_reject_empty_operands_and_short_output() {
        let kernel = ConvolveKernel::try_new(ConvolveConfig::default())
            .expect("kernel should initialize");
        let err = kernel
            .run_alloc(&[0.0f64; 0], &[1.0])
            .expect_err("empty in1");
        assert_eq!(
            err,
            ExecInvariantViolation::Config(ConfigError::EmptyInput { arg: "in1" })
        );
        let mut short = [0.0f64; 2];
        let err = kernel
            .run_into(&[1.0f64, 2.0], &[1.0, 1.0], &mut short)
            .expect_err("full output needs three samples");
        assert!(matches!(
            err,
            ExecInvariantViolation::LengthMismatch { expected: 3, got: 2, .. }
        ));
    }
}
