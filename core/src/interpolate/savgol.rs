//! Savitzky-Golay smoothing.
use nalgebra::{DMatrix, DVector};

use crate::error::{Error, Result};

/// Replace every value by a least squares polynomial of degree `polyorder`
/// fitted over `window` neighbouring values.
///
/// Points closer than half a window to either end are taken from the
/// polynomial fitted to the first or last full window instead of a centered
/// one.
pub fn savgol_filter(values: &[f64], window: usize, polyorder: usize) -> Result<Vec<f64>> {
    if window % 2 == 0 || window <= polyorder {
        return Err(Error::InvalidArgument(format!(
            "smoothing window must be odd and longer than the polynomial order {polyorder}, got {window}"
        )));
    }
    if window > values.len() {
        return Err(Error::InvalidArgument(format!(
            "smoothing window {window} is longer than the {} values",
            values.len()
        )));
    }

    let n = values.len();
    let half = window / 2;
    let mut smoothed = Vec::with_capacity(n);

    for i in 0..n {
        let start = i.saturating_sub(half).min(n - window);
        // positions relative to the window center keep the fit well conditioned
        let center = (start + half) as f64;
        let coefficients = fit_polynomial(
            (start..start + window).map(|k| k as f64 - center),
            &values[start..start + window],
            polyorder,
        )?;

        let t = i as f64 - center;
        smoothed.push(coefficients.as_slice().iter().rev().fold(0.0, |acc, c| acc * t + c));
    }

    Ok(smoothed)
}

fn fit_polynomial(
    positions: impl Iterator<Item = f64>,
    values: &[f64],
    degree: usize,
) -> Result<DVector<f64>> {
    let positions = positions.collect::<Vec<_>>();
    let vandermonde = DMatrix::from_fn(positions.len(), degree + 1, |row, power| {
        positions[row].powi(power as i32)
    });

    vandermonde
        .svd(true, true)
        .solve(&DVector::from_column_slice(values), 1e-12)
        .map_err(|message| Error::InvalidArgument(format!("smoothing fit failed: {message}")))
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::savgol_filter;

    #[test]
    fn cubics_pass_unchanged() {
        let values = (0..11)
            .map(|i| {
                let x = i as f64 * 0.3;
                x * x * x - 2.0 * x * x + 0.5
            })
            .collect::<Vec<_>>();

        let smoothed = savgol_filter(&values, 7, 3).unwrap();
        for (a, b) in smoothed.iter().zip(&values) {
            assert_relative_eq!(*a, *b, epsilon = 1e-9);
        }
    }

    #[test]
    fn noise_is_damped() {
        let values = (0..21)
            .map(|i| if i % 2 == 0 { 1.0 } else { -1.0 })
            .collect::<Vec<_>>();
        let smoothed = savgol_filter(&values, 21, 3).unwrap();
        let largest = smoothed[5..16].iter().fold(0.0f64, |m, v| m.max(v.abs()));
        assert!(largest < 0.5, "{largest}");
    }

    #[test]
    fn invalid_windows() {
        let values = [1.0; 10];
        assert!(savgol_filter(&values, 4, 3).is_err());
        assert!(savgol_filter(&values, 3, 3).is_err());
        assert!(savgol_filter(&values, 11, 3).is_err());
        assert!(savgol_filter(&values, 9, 3).is_ok());
    }
}
