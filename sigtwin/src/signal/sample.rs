//! Element model shared by every primitive: real `f32`/`f64` and their
//! complex counterparts.

use core::fmt::{Debug, Display};
use core::iter::Sum;
use core::ops::{Add, AddAssign, Mul, Sub};
use std::sync::Mutex;

use nalgebra::Complex;
use num_traits::{Float, FromPrimitive, NumAssign, Zero};
use rustfft::{FftNum, FftPlanner};

use super::fft;

/// Floating point width a signal is computed in.
///
/// Method calls that exist on both [`Float`] and [`num_traits::Signed`]
/// (`abs`, `signum`) must be written as `Float::abs(x)` in generic code.
pub trait Real:
    Float
    + FftNum
    + FromPrimitive
    + NumAssign
    + Sum
    + Debug
    + Display
    + Default
    + Send
    + Sync
    + Sample<Real = Self>
    + 'static
{
    /// Lossless-enough literal conversion (`as` cast).
    fn cast(v: f64) -> Self;

    /// Length or index conversion (`as` cast).
    fn cast_usize(n: usize) -> Self {
        Self::cast(n as f64)
    }

    /// Widen to `f64` for reporting.
    fn widen(self) -> f64;

    /// Process-wide FFT planner for this width.
    fn plan_cache() -> &'static Mutex<FftPlanner<Self>>;
}

impl Real for f32 {
    fn cast(v: f64) -> Self {
        v as f32
    }

    fn widen(self) -> f64 {
        self as f64
    }

    fn plan_cache() -> &'static Mutex<FftPlanner<Self>> {
        &fft::plan_cache().f32
    }
}

impl Real for f64 {
    fn cast(v: f64) -> Self {
        v
    }

    fn widen(self) -> f64 {
        self
    }

    fn plan_cache() -> &'static Mutex<FftPlanner<Self>> {
        &fft::plan_cache().f64
    }
}

/// A signal element: either a [`Real`] or a `Complex<Real>`.
pub trait Sample:
    Copy
    + Debug
    + Default
    + PartialEq
    + Send
    + Sync
    + Zero
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + AddAssign
    + Sum
    + 'static
{
    /// Underlying float width.
    type Real: Real;

    /// Whether values carry an imaginary part.
    const IS_COMPLEX: bool;

    /// Lift into the complex plane.
    fn to_complex(self) -> Complex<Self::Real>;

    /// Project back from the complex plane; real samples keep the real part.
    fn from_complex(c: Complex<Self::Real>) -> Self;

    /// Multiply by a real factor.
    fn scale(self, k: Self::Real) -> Self;

    /// Absolute value (complex modulus for complex samples).
    fn modulus(self) -> Self::Real;

    /// Complex conjugate; identity for real samples.
    fn conj_sample(self) -> Self;
}

macro_rules! real_sample {
    ($t:ty) => {
        impl Sample for $t {
            type Real = $t;
            const IS_COMPLEX: bool = false;

            #[inline]
            fn to_complex(self) -> Complex<$t> {
                Complex::new(self, 0.0)
            }

            #[inline]
            fn from_complex(c: Complex<$t>) -> Self {
                c.re
            }

            #[inline]
            fn scale(self, k: $t) -> Self {
                self * k
            }

            #[inline]
            fn modulus(self) -> $t {
                Float::abs(self)
            }

            #[inline]
            fn conj_sample(self) -> Self {
                self
            }
        }
    };
}

real_sample!(f32);
real_sample!(f64);

impl<F: Real> Sample for Complex<F> {
    type Real = F;
    const IS_COMPLEX: bool = true;

    #[inline]
    fn to_complex(self) -> Complex<F> {
        self
    }

    #[inline]
    fn from_complex(c: Complex<F>) -> Self {
        c
    }

    #[inline]
    fn scale(self, k: F) -> Self {
        Complex::new(self.re * k, self.im * k)
    }

    #[inline]
    fn modulus(self) -> F {
        self.norm()
    }

    #[inline]
    fn conj_sample(self) -> Self {
        self.conj()
    }
}
