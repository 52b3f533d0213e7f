//! Cost model deciding between direct and FFT convolution.

use sigtwin_core::num_rs::ConvolveMode;

/// Convolution strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConvMethod {
    /// Sliding dot product.
    Direct,
    /// Spectral product over zero-padded transforms.
    Fft,
    /// Pick [`ConvMethod::Direct`] or [`ConvMethod::Fft`] from operand shapes.
    #[default]
    Auto,
}

impl ConvMethod {
    /// Lower-case name as used by `scipy.signal`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConvMethod::Direct => "direct",
            ConvMethod::Fft => "fft",
            ConvMethod::Auto => "auto",
        }
    }
}

/// Seconds-per-operation weights for one output mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostConstants {
    /// Weight applied to the FFT operation count.
    pub fft: f64,
    /// Weight applied to the direct operation count.
    pub direct: f64,
    /// Constant added to the direct side.
    pub offset: f64,
}

impl CostConstants {
    const fn new(fft: f64, direct: f64, offset: f64) -> Self {
        Self {
            fft,
            direct,
            offset,
        }
    }
}

///
/// Linear cost model comparing direct and FFT convolution of 1D operands.
///
/// FFT work is `3 N ln N` for the full output length `N`; direct work is the
/// number of multiply-adds the requested mode needs. The defaults are the
/// empirically fitted constants of `scipy.signal.choose_conv_method`.
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvCostModel {
    /// Weights for [`ConvolveMode::Full`].
    pub full: CostConstants,
    /// Weights for [`ConvolveMode::Valid`].
    pub valid: CostConstants,
    /// Weights for [`ConvolveMode::Same`] when the kernel is no longer than
    /// the signal.
    pub same: CostConstants,
    /// Weights for [`ConvolveMode::Same`] when the kernel is longer than the
    /// signal.
    pub same_long_kernel: CostConstants,
}

impl Default for ConvCostModel {
    fn default() -> Self {
        Self {
            full: CostConstants::new(1.7649070e-9, 2.1414831e-10, -1e-3),
            valid: CostConstants::new(1.89095737e-9, 2.1364985e-10, -1e-3),
            same: CostConstants::new(3.2646654e-9, 2.8478277e-10, -1e-3),
            same_long_kernel: CostConstants::new(3.21635404e-9, 1.1773253e-8, -1e-5),
        }
    }
}

impl ConvCostModel {
    /// Operation counts `(fft_ops, direct_ops)` for operands of length
    /// `a_len` and `b_len`.
    pub fn ops(a_len: usize, b_len: usize, mode: ConvolveMode) -> (f64, f64) {
        let (s1, s2) = (a_len as f64, b_len as f64);
        let direct = match mode {
            ConvolveMode::Full => s1 * s2,
            ConvolveMode::Valid => {
                if b_len >= a_len {
                    (s2 - s1 + 1.0) * s1
                } else {
                    (s1 - s2 + 1.0) * s2
                }
            }
            ConvolveMode::Same => {
                if a_len < b_len {
                    s1 * s2
                } else {
                    s1 * s2 - ((b_len / 2) * b_len.div_ceil(2)) as f64
                }
            }
        };
        let n = (a_len + b_len - 1) as f64;
        (3.0 * n * n.ln(), direct)
    }

    /// Whether the FFT strategy is predicted to be faster.
    pub fn fft_is_faster(&self, a_len: usize, b_len: usize, mode: ConvolveMode) -> bool {
        let c = match mode {
            ConvolveMode::Full => self.full,
            ConvolveMode::Valid => self.valid,
            ConvolveMode::Same if b_len <= a_len => self.same,
            ConvolveMode::Same => self.same_long_kernel,
        };
        let (fft_ops, direct_ops) = Self::ops(a_len, b_len, mode);
        c.fft * fft_ops < c.direct * direct_ops + c.offset
    }

    /// Resolve [`ConvMethod::Auto`] for the given shapes; explicit methods
    /// pass through.
    pub fn resolve(
        &self,
        method: ConvMethod,
        a_len: usize,
        b_len: usize,
        mode: ConvolveMode,
    ) -> ConvMethod {
        match method {
            ConvMethod::Auto => {
                let chosen = if self.fft_is_faster(a_len, b_len, mode) {
                    ConvMethod::Fft
                } else {
                    ConvMethod::Direct
                };
                tracing::debug!(
                    a_len,
                    b_len,
                    mode = mode.as_str(),
                    method = chosen.as_str(),
                    "auto convolution method"
                );
                chosen
            }
            explicit => explicit,
        }
    }
}

///
/// Pick the faster of direct and FFT convolution for these shapes.
///
/// <https://docs.scipy.org/doc/scipy/reference/generated/scipy.signal.choose_conv_method.html>
///
/// A pure function of `a_len`, `b_len` and `mode` under the default
/// [`ConvCostModel`].
///
pub fn choose_conv_method(a_len: usize, b_len: usize, mode: ConvolveMode) -> ConvMethod {
    ConvCostModel::default().resolve(ConvMethod::Auto, a_len, b_len, mode)
}
