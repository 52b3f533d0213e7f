//! Both backends over a table of (operation, parameters) cases.

mod common;

use approx::assert_abs_diff_eq;
use itertools::iproduct;
use ndarray::{Array1, Array2, ArrayD, Axis, IxDyn};
use sigtwin::backend::{
    precompile_kernels, Accelerated, ConvolveOps, DesignOps, FilterOps, HilbertOps, Reference,
    ResampleOps, SignalBackend,
};
use sigtwin::na::Complex;
use sigtwin::num_rs::ConvolveMode;
use sigtwin::oracle::{assert_equivalent, Tolerance};
use sigtwin::signal::convolve::{Boundary, ConvMethod};
use sigtwin::signal::windows::Window;
use sigtwin::{Error, Result};

use common::*;

const MODES: [ConvolveMode; 3] = [ConvolveMode::Full, ConvolveMode::Valid, ConvolveMode::Same];

#[derive(Debug, Clone, Copy)]
enum Op {
    Resample { num: usize },
    ResampleKaiser { num: usize },
    ResamplePoly { up: usize, down: usize },
    UpFirDn { up: usize, down: usize },
    Convolve { mode: ConvolveMode, method: ConvMethod },
    Correlate { mode: ConvolveMode, method: ConvMethod },
    FftConvolve { mode: ConvolveMode },
    Convolve2d { mode: ConvolveMode, boundary: Boundary },
    Correlate2d { mode: ConvolveMode, boundary: Boundary },
    Sosfilt,
    Wiener,
    Wiener2d,
    Hilbert,
    Hilbert2,
}

/// Inputs realized once and shared by both backends.
struct Inputs {
    signal: Array1<f64>,
    kernel: Array1<f64>,
    grid: Array2<f64>,
    stencil: Array2<f64>,
    taps: Vec<f64>,
}

impl Inputs {
    fn new() -> Self {
        Self {
            signal: random_1d(1000, 7),
            kernel: random_1d(37, 11),
            grid: random_2d(24, 31, 3),
            stencil: random_2d(5, 4, 5),
            taps: Reference
                .firwin(31, &[0.25], None, None, true, true, None)
                .expect("lowpass design")
                .to_vec(),
        }
    }
}

fn lift(y: ArrayD<f64>) -> ArrayD<Complex<f64>> {
    y.mapv(|v| Complex::new(v, 0.0))
}

fn execute<B: SignalBackend>(backend: &B, op: Op, inputs: &Inputs) -> Result<ArrayD<Complex<f64>>> {
    let x = inputs.signal.view();
    let k = inputs.kernel.view();
    let out = match op {
        Op::Resample { num } => lift(backend.resample(x, num, None)?.into_dyn()),
        Op::ResampleKaiser { num } => {
            let window = Window::Kaiser { beta: 8.6 };
            lift(backend.resample(x, num, Some(&window))?.into_dyn())
        }
        Op::ResamplePoly { up, down } => {
            lift(backend.resample_poly(x, up, down, None, 0)?.into_dyn())
        }
        Op::UpFirDn { up, down } => {
            lift(backend.upfirdn(&inputs.taps, x, up, down, -1)?.into_dyn())
        }
        Op::Convolve { mode, method } => lift(backend.convolve(x, k, mode, method)?.into_dyn()),
        Op::Correlate { mode, method } => lift(backend.correlate(x, k, mode, method)?.into_dyn()),
        Op::FftConvolve { mode } => lift(backend.fftconvolve(x, k, mode)?.into_dyn()),
        Op::Convolve2d { mode, boundary } => lift(
            backend
                .convolve2d(inputs.grid.view(), inputs.stencil.view(), mode, boundary)?
                .into_dyn(),
        ),
        Op::Correlate2d { mode, boundary } => lift(
            backend
                .correlate2d(inputs.grid.view(), inputs.stencil.view(), mode, boundary)?
                .into_dyn(),
        ),
        Op::Sosfilt => lift(backend.sosfilt(&butter_bandpass(), x)?.into_dyn()),
        Op::Wiener => lift(backend.wiener(x, Some(&[5]), None)?.into_dyn()),
        Op::Wiener2d => lift(backend.wiener(inputs.grid.view(), Some(&[3, 5]), None)?.into_dyn()),
        Op::Hilbert => backend.hilbert(x)?.into_dyn(),
        Op::Hilbert2 => backend.hilbert2(inputs.grid.view())?.into_dyn(),
    };
    Ok(out)
}

fn cases() -> Vec<Op> {
    let mut cases = vec![
        Op::Resample { num: 1000 },
        Op::Resample { num: 441 },
        Op::Resample { num: 2048 },
        Op::ResampleKaiser { num: 750 },
        Op::ResamplePoly { up: 3, down: 2 },
        Op::ResamplePoly { up: 1, down: 4 },
        Op::ResamplePoly { up: 160, down: 147 },
        Op::UpFirDn { up: 1, down: 1 },
        Op::UpFirDn { up: 3, down: 2 },
        Op::UpFirDn { up: 2, down: 5 },
        Op::Sosfilt,
        Op::Wiener,
        Op::Wiener2d,
        Op::Hilbert,
        Op::Hilbert2,
    ];
    let methods = [ConvMethod::Direct, ConvMethod::Fft, ConvMethod::Auto];
    for (mode, method) in iproduct!(MODES, methods) {
        cases.push(Op::Convolve { mode, method });
        cases.push(Op::Correlate { mode, method });
    }
    for mode in MODES {
        cases.push(Op::FftConvolve { mode });
    }
    let boundaries = [Boundary::Fill, Boundary::Wrap, Boundary::Symm];
    for (mode, boundary) in iproduct!(MODES, boundaries) {
        cases.push(Op::Convolve2d { mode, boundary });
        cases.push(Op::Correlate2d { mode, boundary });
    }
    cases
}

#[test]
fn every_case_agrees_under_tolerance() {
    precompile_kernels();
    let inputs = Inputs::new();
    for op in cases() {
        let reference = execute(&Reference, op, &inputs).expect("reference run");
        let accelerated = execute(&Accelerated, op, &inputs).expect("accelerated run");
        if let Err(e) = assert_equivalent(
            reference.view(),
            accelerated.view(),
            Tolerance::for_dtype::<f64>(),
        ) {
            panic!("{op:?}: {e}");
        }
    }
}

#[test]
fn single_precision_agrees_under_looser_tolerance() {
    let x = random_1d(513, 21).mapv(|v| v as f32);
    let k = random_1d(64, 22).mapv(|v| v as f32);
    let tol = Tolerance::for_dtype::<f32>();

    let r = Reference.fftconvolve(x.view(), k.view(), ConvolveMode::Same).unwrap();
    let a = Accelerated.fftconvolve(x.view(), k.view(), ConvolveMode::Same).unwrap();
    assert_equivalent(r.view(), a.view(), tol).unwrap();

    let r = Reference.resample(x.view(), 300, None).unwrap();
    let a = Accelerated.resample(x.view(), 300, None).unwrap();
    assert_equivalent(r.view(), a.view(), tol).unwrap();

    let r = Reference.hilbert(x.view()).unwrap();
    let a = Accelerated.hilbert(x.view()).unwrap();
    assert_equivalent(r.view(), a.view(), tol).unwrap();
}

#[test]
fn complex_inputs_agree() {
    let x = random_complex(300, 31);
    let k = random_complex(20, 32);
    let tol = Tolerance::for_dtype::<f64>();
    for mode in MODES {
        let r = Reference.correlate(x.view(), k.view(), mode, ConvMethod::Direct).unwrap();
        let a = Accelerated.correlate(x.view(), k.view(), mode, ConvMethod::Fft).unwrap();
        assert_equivalent(r.view(), a.view(), tol).unwrap();
    }
    let r = Reference.resample(x.view(), 128, None).unwrap();
    let a = Accelerated.resample(x.view(), 128, None).unwrap();
    assert_equivalent(r.view(), a.view(), tol).unwrap();

    let taps = [0.25f64, 0.5, 0.25];
    let r = Reference.upfirdn(&taps, x.view(), 2, 3, 0).unwrap();
    let a = Accelerated.upfirdn(&taps, x.view(), 2, 3, 0).unwrap();
    assert_equivalent(r.view(), a.view(), tol).unwrap();
}

fn direct_matches_fft<B: ConvolveOps>(backend: &B, a: &Array1<f64>, b: &Array1<f64>) {
    for mode in MODES {
        let direct = backend
            .convolve(a.view(), b.view(), mode, ConvMethod::Direct)
            .unwrap();
        let fft = backend
            .convolve(a.view(), b.view(), mode, ConvMethod::Fft)
            .unwrap();
        assert_equivalent(direct.view(), fft.view(), Tolerance::new(1e-9, 1e-9)).unwrap();
    }
}

#[test]
fn direct_and_fft_convolution_agree_in_every_mode() {
    let a = random_1d(211, 41);
    let b = random_1d(19, 42);
    direct_matches_fft(&Reference, &a, &b);
    direct_matches_fft(&Accelerated, &a, &b);
}

#[test]
fn unit_upfirdn_is_identity_along_axis() {
    let grid = random_2d(6, 9, 51);
    for axis in [0isize, 1, -1] {
        let r = Reference.upfirdn(&[1.0], grid.view(), 1, 1, axis).unwrap();
        let a = Accelerated.upfirdn(&[1.0], grid.view(), 1, 1, axis).unwrap();
        assert_eq!(r, grid);
        assert_eq!(a, grid);
    }
}

#[test]
fn equal_ratio_resample_poly_reproduces_input() {
    let x = random_1d(127, 52);
    for k in [1usize, 2, 7] {
        let r = Reference.resample_poly(x.view(), k, k, None, 0).unwrap();
        let a = Accelerated.resample_poly(x.view(), k, k, None, 0).unwrap();
        assert_equivalent(x.view(), r.view(), Tolerance::for_dtype::<f64>()).unwrap();
        assert_equivalent(x.view(), a.view(), Tolerance::for_dtype::<f64>()).unwrap();
    }
}

#[test]
fn sosfilt_is_linear() {
    let sos = butter_bandpass();
    let x = random_1d(2000, 61);
    let y = chirp(2000);
    let (alpha, beta) = (0.75, -2.5);
    let mixed = &x * alpha + &y * beta;
    for combined in [
        Reference.sosfilt(&sos, mixed.view()).unwrap(),
        Accelerated.sosfilt(&sos, mixed.view()).unwrap(),
    ] {
        let fx = Reference.sosfilt(&sos, x.view()).unwrap();
        let fy = Reference.sosfilt(&sos, y.view()).unwrap();
        let expected = fx * alpha + fy * beta;
        combined
            .iter()
            .zip(expected.iter())
            .for_each(|(a, b)| assert_abs_diff_eq!(a, b, epsilon = 1e-10));
    }
}

#[test]
fn sosfilt_filters_every_row_of_a_grid() {
    let sos = butter_bandpass();
    let grid = random_2d(8, 256, 62);
    let r = Reference.sosfilt(&sos, grid.view()).unwrap();
    let a = Accelerated.sosfilt(&sos, grid.view()).unwrap();
    assert_equivalent(r.view(), a.view(), Tolerance::exact()).unwrap();
    let row = Reference.sosfilt(&sos, grid.index_axis(Axis(0), 3)).unwrap();
    assert_eq!(row, r.index_axis(Axis(0), 3));
}

#[test]
fn real_part_of_analytic_signal_round_trips() {
    let x = chirp(1024);
    for twice in [
        Reference
            .hilbert(Reference.hilbert(x.view()).unwrap().mapv(|z| z.re).view())
            .unwrap(),
        Accelerated
            .hilbert(Accelerated.hilbert(x.view()).unwrap().mapv(|z| z.re).view())
            .unwrap(),
    ] {
        x.iter()
            .zip(twice.iter())
            .for_each(|(a, z)| assert_abs_diff_eq!(*a, z.re, epsilon = 1e-10));
    }
}

#[test]
fn correlate2d_box_matches_reference_exactly() {
    let grid = random_2d(8, 8, 71);
    let ones = Array2::<f64>::ones((3, 3));
    let r = Reference
        .correlate2d(grid.view(), ones.view(), ConvolveMode::Same, Boundary::Fill)
        .unwrap();
    let a = Accelerated
        .correlate2d(grid.view(), ones.view(), ConvolveMode::Same, Boundary::Fill)
        .unwrap();
    assert_eq!(r.dim(), (8, 8));
    let report = assert_equivalent(r.view(), a.view(), Tolerance::exact()).unwrap();
    assert_eq!(report.max_abs_diff, 0.0);
    assert_eq!(report.total, 64);
}

#[test]
fn bandpass_upfirdn_on_chirp() {
    let x = chirp(1 << 14);
    let taps = Reference
        .firwin(101, &[0.1f64, 0.3], None, None, false, true, None)
        .unwrap();
    let taps_acc = Accelerated
        .firwin(101, &[0.1f64, 0.3], None, None, false, true, None)
        .unwrap();
    assert_eq!(taps, taps_acc);
    let taps = taps.to_vec();
    let r = Reference.upfirdn(&taps, x.view(), 3, 2, 0).unwrap();
    let a = Accelerated.upfirdn(&taps, x.view(), 3, 2, 0).unwrap();
    assert_eq!(r.len(), (((1usize << 14) - 1) * 3 + 101 - 1) / 2 + 1);
    assert_equivalent(r.view(), a.view(), Tolerance::for_dtype::<f64>()).unwrap();
}

#[test]
fn valid_mode_length_uses_longer_operand() {
    let a = random_1d(4, 81);
    let b = random_1d(10, 82);
    for method in [ConvMethod::Direct, ConvMethod::Fft, ConvMethod::Auto] {
        let r = Reference.convolve(a.view(), b.view(), ConvolveMode::Valid, method).unwrap();
        let acc = Accelerated.convolve(a.view(), b.view(), ConvolveMode::Valid, method).unwrap();
        assert_eq!(r.len(), 7);
        assert_eq!(acc.len(), 7);
    }
}

#[test]
fn oracle_flags_a_perturbed_backend_output() {
    let inputs = Inputs::new();
    let op = Op::Convolve {
        mode: ConvolveMode::Same,
        method: ConvMethod::Fft,
    };
    let reference = execute(&Reference, op, &inputs).unwrap();
    let mut accelerated = execute(&Accelerated, op, &inputs).unwrap();
    accelerated[IxDyn(&[500])] += Complex::new(1e-3, 0.0);
    match assert_equivalent(reference.view(), accelerated.view(), Tolerance::for_dtype::<f64>()) {
        Err(Error::EquivalenceViolation(d)) => {
            assert_eq!(d.index, vec![500]);
            assert_eq!(d.violations, 1);
        }
        other => panic!("expected a violation, got {other:?}"),
    }
}

#[test]
fn backends_reject_the_same_bad_arguments() {
    let x = random_1d(16, 91);
    let empty = Array1::<f64>::zeros(0);
    assert!(Reference.resample(x.view(), 0, None).is_err());
    assert!(Accelerated.resample(x.view(), 0, None).is_err());
    assert!(Reference.resample_poly(x.view(), 0, 2, None, 0).is_err());
    assert!(Accelerated.resample_poly(x.view(), 0, 2, None, 0).is_err());
    assert!(Reference.upfirdn(&[1.0], x.view(), 1, 1, 3).is_err());
    assert!(Accelerated.upfirdn(&[1.0], x.view(), 1, 1, 3).is_err());
    assert!(Reference
        .convolve(empty.view(), x.view(), ConvolveMode::Full, ConvMethod::Auto)
        .is_err());
    assert!(Accelerated
        .convolve(empty.view(), x.view(), ConvolveMode::Full, ConvMethod::Auto)
        .is_err());
    assert!(Reference.hilbert(empty.view()).is_err());
    assert!(Accelerated.hilbert(empty.view()).is_err());
}

#[test]
fn correlate2d_with_larger_kernel_is_bit_exact() {
    let small = random_2d(3, 2, 101);
    let kernel = random_2d(5, 5, 102);
    for (mode, boundary) in iproduct!(
        MODES,
        [Boundary::Fill, Boundary::Wrap, Boundary::Symm]
    ) {
        let r = Reference
            .correlate2d(small.view(), kernel.view(), mode, boundary)
            .unwrap();
        let a = Accelerated
            .correlate2d(small.view(), kernel.view(), mode, boundary)
            .unwrap();
        if let Err(e) = assert_equivalent(r.view(), a.view(), Tolerance::exact()) {
            panic!("{mode:?}/{boundary:?}: {e}");
        }
    }
    let valid = Reference
        .correlate2d(small.view(), kernel.view(), ConvolveMode::Valid, Boundary::Fill)
        .unwrap();
    assert_eq!(valid.dim(), (3, 4));
}

#[test]
fn multirate_on_grid_agrees_along_both_axes() {
    let grid = random_2d(37, 9, 111);
    let taps = Reference
        .firwin(15, &[0.3f64], None, None, true, true, None)
        .unwrap()
        .to_vec();
    let tol = Tolerance::for_dtype::<f64>();
    for ((up, down), axis) in iproduct!([(3usize, 2usize), (2, 5), (1, 3), (4, 1)], [0isize, 1]) {
        let r = Reference.upfirdn(&taps, grid.view(), up, down, axis).unwrap();
        let a = Accelerated.upfirdn(&taps, grid.view(), up, down, axis).unwrap();
        if let Err(e) = assert_equivalent(r.view(), a.view(), tol) {
            panic!("upfirdn {up}/{down} axis {axis}: {e}");
        }

        let r = Reference.resample_poly(grid.view(), up, down, None, axis).unwrap();
        let a = Accelerated.resample_poly(grid.view(), up, down, None, axis).unwrap();
        let n = grid.len_of(Axis(axis as usize));
        assert_eq!(r.len_of(Axis(axis as usize)), (n * up).div_ceil(down));
        if let Err(e) = assert_equivalent(r.view(), a.view(), tol) {
            panic!("resample_poly {up}/{down} axis {axis}: {e}");
        }
    }
}
