use core::borrow::Borrow;

use ndarray::{Array, ArrayView, Axis, Dimension, Zip};
use sigtwin_core::{Error, Result};

use super::design::{validate_sos, Sos};
use crate::signal::Real;

/// Advance one section by one sample (transposed direct form II).
#[inline(always)]
pub fn biquad_step<F: Real>(s: &mut Sos<F>, x: F) -> F {
    let y = s.b[0] * x + s.zi0;
    s.zi0 = s.b[1] * x - s.a[1] * y + s.zi1;
    s.zi1 = s.b[2] * x - s.a[2] * y;
    y
}

///
/// Filter data along one-dimension using cascaded second-order sections,
/// continuing from the state stored in `sos`.
///
/// The state registers of every section are updated in place, so successive
/// calls filter a stream in chunks. Coefficients are not validated; see
/// [`sosfilt_checked_slice`].
///
/// <https://docs.scipy.org/doc/scipy/reference/generated/scipy.signal.sosfilt.html>
///
pub fn sosfilt_dyn<YI, F>(y: YI, sos: &mut [Sos<F>]) -> Vec<F>
where
    F: Real,
    YI: IntoIterator,
    YI::Item: Borrow<F>,
{
    y.into_iter()
        .map(|yi| {
            sos.iter_mut()
                .fold(*yi.borrow(), |x, section| biquad_step(section, x))
        })
        .collect()
}

///
/// Checked stateful `sosfilt` over a slice.
///
/// Rejects empty input, an empty cascade and sections whose `a0` is not one.
///
#[inline]
pub fn sosfilt_checked_slice<F: Real>(y: &[F], sos: &mut [Sos<F>]) -> Result<Vec<F>> {
    validate_sos(sos)?;
    if y.is_empty() {
        return Err(Error::InvalidArg {
            arg: "y".into(),
            reason: "input must be non-empty.".into(),
        });
    }
    Ok(sosfilt_dyn(y.iter(), sos))
}

///
/// One-shot `sosfilt` along the last axis of `x`.
///
/// Every lane starts from zeroed state; the state registers stored in `sos`
/// are ignored and left untouched. Each sample is pushed through the whole
/// cascade before the next sample is read.
///
pub fn sosfilt<F, D>(sos: &[Sos<F>], x: ArrayView<'_, F, D>) -> Result<Array<F, D>>
where
    F: Real,
    D: Dimension,
{
    validate_sos(sos)?;
    if x.ndim() == 0 || x.is_empty() {
        return Err(Error::invalid_arg("x", "input must be non-empty."));
    }
    let axis = Axis(x.ndim() - 1);
    tracing::trace!(shape = ?x.shape(), sections = sos.len(), "sosfilt");

    let mut out = Array::<F, D>::zeros(x.raw_dim());
    Zip::from(out.lanes_mut(axis))
        .and(x.lanes(axis))
        .for_each(|mut lane_out, lane_in| {
            let mut state: Vec<Sos<F>> = sos.iter().map(|s| Sos::new(s.b, s.a)).collect();
            lane_out
                .iter_mut()
                .zip(lane_in.iter())
                .for_each(|(o, &v)| {
                    *o = state
                        .iter_mut()
                        .fold(v, |acc, section| biquad_step(section, acc));
                });
        });
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array1, Array2};

    fn butter4_bandpass() -> Vec<Sos<f64>> {
        // scipy.signal.butter(4, [10, 50], 'bandpass', fs=1666, output='sos')
        let filter: [f64; 24] = [
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
        Sos::from_scipy_dyn(4, filter.to_vec())
    }

    #[test]
    fn first_order_recursion() {
        // y[n] = x[n] + 0.5 y[n-1]
        let mut sos = vec![Sos::new([1.0f64, 0.0, 0.0], [1.0, -0.5, 0.0])];
        let y = sosfilt_dyn([1.0, 0.0, 0.0, 0.0].iter(), &mut sos);
        assert_eq!(y, vec![1.0, 0.5, 0.25, 0.125]);
    }

    #[test]
    fn chunked_stream_matches_whole() {
        let x: Vec<f64> = (0..400).map(|i| (i as f64 * 0.13).sin()).collect();
        let mut whole = butter4_bandpass();
        let expected = sosfilt_dyn(x.iter(), &mut whole);

        let mut chunked = butter4_bandpass();
        let mut actual = sosfilt_dyn(x[..150].iter(), &mut chunked);
        actual.extend(sosfilt_dyn(x[150..].iter(), &mut chunked));
        assert_eq!(actual, expected);
    }

    #[test]
    fn one_shot_ignores_stored_state() {
        let mut sos = butter4_bandpass();
        sos.iter_mut().for_each(|s| {
            s.zi0 = 3.0;
            s.zi1 = -2.0;
        });
        let x = Array1::from_iter((0..64).map(|i| i as f64));
        let y = sosfilt(&sos, x.view()).unwrap();
        let expected = sosfilt_dyn(x.iter(), &mut butter4_bandpass());
        assert_eq!(y.to_vec(), expected);
        assert_eq!(sos[0].zi0, 3.0);
    }

    #[test]
    fn rows_are_filtered_independently() {
        let sos = butter4_bandpass();
        let x: Array2<f64> = array![[1.0, 0.0, 0.0, 0.0, 0.0], [0.0, 1.0, 2.0, 3.0, 4.0]];
        let y = sosfilt(&sos, x.view()).unwrap();
        for (row_in, row_out) in x.outer_iter().zip(y.outer_iter()) {
            let expected = sosfilt_dyn(row_in.iter(), &mut butter4_bandpass());
            row_out
                .iter()
                .zip(expected.iter())
                .for_each(|(a, b)| assert_abs_diff_eq!(a, b, epsilon = 0.0));
        }
    }

    #[test]
    fn sosfilt_is_linear() {
        let sos = butter4_bandpass();
        let a = Array1::from_iter((0..256).map(|i| (i as f64 * 0.07).cos()));
        let b = Array1::from_iter((0..256).map(|i| ((i * 7 % 13) as f64) - 6.0));
        let combined = &a * 2.0 - &b * 0.5;
        let ya = sosfilt(&sos, a.view()).unwrap();
        let yb = sosfilt(&sos, b.view()).unwrap();
        let y = sosfilt(&sos, combined.view()).unwrap();
        for i in 0..256 {
            assert_abs_diff_eq!(y[i], 2.0 * ya[i] - 0.5 * yb[i], epsilon = 1e-12);
        }
    }

    #[test]
    fn invalid_arguments_are_rejected() {
        let x = Array1::from(vec![1.0f64, 2.0]);
        assert!(sosfilt::<f64, _>(&[], x.view()).is_err());
        let bad = vec![Sos::new([1.0, 0.0, 0.0], [0.5, 0.0, 0.0])];
        assert!(sosfilt(&bad, x.view()).is_err());
        let empty = Array1::<f64>::zeros(0);
        assert!(sosfilt(&butter4_bandpass(), empty.view()).is_err());
        assert!(sosfilt_checked_slice(&[], &mut butter4_bandpass()).is_err());
    }
}
