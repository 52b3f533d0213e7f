//! Seeded input generators shared by the integration tests.

#![allow(dead_code)]

use ndarray::{Array, Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sigtwin::na::Complex;
use sigtwin::signal::filter::design::Sos;

pub fn random_1d(n: usize, seed: u64) -> Array1<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    Array::from_shape_fn(n, |_| rng.random_range(-1.0..1.0))
}

pub fn random_2d(rows: usize, cols: usize, seed: u64) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    Array::from_shape_fn((rows, cols), |_| rng.random_range(-1.0..1.0))
}

pub fn random_complex(n: usize, seed: u64) -> Array1<Complex<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    Array::from_shape_fn(n, |_| {
        Complex::new(rng.random_range(-1.0..1.0), rng.random_range(-1.0..1.0))
    })
}

/// `cos(-t^2 / 6)` sampled at `n` points evenly spaced on `[0, 10)`.
pub fn chirp(n: usize) -> Array1<f64> {
    let dt = 10.0 / n as f64;
    Array::from_shape_fn(n, |i| {
        let t = i as f64 * dt;
        (-t * t / 6.0).cos()
    })
}

/// 4th order Butterworth bandpass, 10 to 50 Hz at 1666 Hz.
pub fn butter_bandpass() -> Vec<Sos<f64>> {
    let flat = vec![
        2.677_576_738_259_783_5e-5,
        5.355_153_476_519_567e-5,
        2.677_576_738_259_783_5e-5,
        1.0,
        -1.7991202154617734,
        0.8162578614819005,
        1.0,
        2.0,
        1.0,
        1.0,
        -1.8774769894419825,
        0.9094302413068086,
        1.0,
        -2.0,
        1.0,
        1.0,
        -1.9237959892866103,
        0.9263794671616161,
        1.0,
        -2.0,
        1.0,
        1.0,
        -1.978497311228862,
        0.9799894886973378,
    ];
    Sos::from_scipy_dyn(4, flat)
}
