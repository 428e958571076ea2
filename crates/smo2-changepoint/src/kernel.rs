//! Numeric kernels shared by the detectors
//!
//! - [`PolynomialKernel`]: least-squares polynomial fitting on `nalgebra`,
//!   used for Savitzky-Golay weights and boundary fits
//! - [`WindowKernel`]: statistics over fixed-width sliding windows
//! - [`solve_normal_equations`]: Cholesky solve with an SVD fallback

use nalgebra::{DMatrix, DVector};
use smo2_core::{Error, Result};

/// Solve `A β = b` for a symmetric positive (semi-)definite `A`
///
/// Uses Cholesky first and falls back to SVD for rank-deficient systems.
pub fn solve_normal_equations(a: DMatrix<f64>, b: &DVector<f64>) -> Result<DVector<f64>> {
    match a.clone().cholesky() {
        Some(chol) => Ok(chol.solve(b)),
        None => {
            let svd = a.svd(true, true);
            svd.solve(b, 1e-10).map_err(|_| {
                Error::Computation("Failed to solve least-squares system".to_string())
            })
        }
    }
}

/// Kernel for polynomial fitting operations
#[derive(Clone, Debug)]
pub struct PolynomialKernel {
    degree: usize,
}

impl PolynomialKernel {
    pub fn new(degree: usize) -> Self {
        Self { degree }
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Build design matrix for polynomial regression
    /// X[i,j] = x[i]^j for j in 0..=degree
    pub fn build_design_matrix(&self, x: &[f64]) -> DMatrix<f64> {
        DMatrix::from_fn(x.len(), self.degree + 1, |i, j| x[i].powi(j as i32))
    }

    /// Fit polynomial coefficients (ascending powers) by least squares
    pub fn fit_polynomial(&self, x: &[f64], y: &[f64]) -> Result<Vec<f64>> {
        if x.len() != y.len() || x.is_empty() {
            return Err(Error::InvalidInput(
                "Input vectors must have same non-zero length".to_string(),
            ));
        }
        if x.len() <= self.degree {
            return Err(Error::InsufficientData {
                expected: self.degree + 1,
                actual: x.len(),
            });
        }

        let design = self.build_design_matrix(x);
        let xt = design.transpose();
        let xtx = &xt * &design;
        let xty = &xt * DVector::from_column_slice(y);

        let coeffs = solve_normal_equations(xtx, &xty)?;
        Ok(coeffs.as_slice().to_vec())
    }

    /// Evaluate ascending-power coefficients at `x` (Horner)
    pub fn evaluate(coeffs: &[f64], x: f64) -> f64 {
        coeffs.iter().rev().fold(0.0, |acc, &c| acc * x + c)
    }

    /// Convolution weights returning the fitted value at the window centre
    ///
    /// Row 0 of the pseudo-inverse of the design matrix over offsets
    /// `-half..=half`, i.e. the Savitzky-Golay smoothing weights.
    pub fn smoothing_weights(&self, half_window: usize) -> Result<Vec<f64>> {
        let window = 2 * half_window + 1;
        if window <= self.degree {
            return Err(Error::InvalidParameter(format!(
                "window of {window} samples cannot support a degree {} polynomial",
                self.degree
            )));
        }

        let offsets: Vec<f64> = (0..window)
            .map(|i| i as f64 - half_window as f64)
            .collect();
        let design = self.build_design_matrix(&offsets);
        let xtx = design.transpose() * &design;

        let mut e0 = DVector::zeros(self.degree + 1);
        e0[0] = 1.0;
        let z = solve_normal_equations(xtx, &e0)?;
        Ok((design * z).as_slice().to_vec())
    }
}

/// Kernel for sliding window operations
#[derive(Clone, Debug)]
pub struct WindowKernel {
    window_size: usize,
}

impl WindowKernel {
    pub fn new(window_size: usize) -> Self {
        Self { window_size }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Compute a statistic for every full window, in start order
    pub fn compute_window_stats<F>(&self, data: &[f64], stat_fn: F) -> Vec<f64>
    where
        F: Fn(&[f64]) -> f64,
    {
        if self.window_size == 0 || data.len() < self.window_size {
            return vec![];
        }
        data.windows(self.window_size).map(stat_fn).collect()
    }

    /// Start index of the first window maximising `stat_fn`
    pub fn argmax_window<F>(&self, data: &[f64], stat_fn: F) -> Option<(usize, f64)>
    where
        F: Fn(&[f64]) -> f64,
    {
        self.compute_window_stats(data, stat_fn)
            .into_iter()
            .enumerate()
            .fold(None, |best, (i, v)| match best {
                Some((_, b)) if v <= b => best,
                _ => Some((i, v)),
            })
    }
}

/// Arithmetic mean of a non-empty slice
pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_savitzky_golay_weights_window_5() {
        let kernel = PolynomialKernel::new(2);
        let weights = kernel.smoothing_weights(2).unwrap();
        let expected = [-3.0, 12.0, 17.0, 12.0, -3.0].map(|w| w / 35.0);
        for (w, e) in weights.iter().zip(expected.iter()) {
            assert_relative_eq!(w, e, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_weights_sum_to_one() {
        let kernel = PolynomialKernel::new(2);
        for half in 2..8 {
            let weights = kernel.smoothing_weights(half).unwrap();
            assert_relative_eq!(weights.iter().sum::<f64>(), 1.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_fit_quadratic() {
        let kernel = PolynomialKernel::new(2);
        let x: Vec<f64> = (0..11).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|&v| 1.0 - 2.0 * v + 0.5 * v * v).collect();
        let coeffs = kernel.fit_polynomial(&x, &y).unwrap();
        assert_relative_eq!(coeffs[0], 1.0, epsilon = 1e-8);
        assert_relative_eq!(coeffs[1], -2.0, epsilon = 1e-8);
        assert_relative_eq!(coeffs[2], 0.5, epsilon = 1e-8);

        for (&xi, &yi) in x.iter().zip(&y) {
            assert_relative_eq!(PolynomialKernel::evaluate(&coeffs, xi), yi, epsilon = 1e-8);
        }
    }

    #[test]
    fn test_argmax_window_prefers_first_maximum() {
        let kernel = WindowKernel::new(2);
        let data = [1.0, 5.0, 5.0, 1.0, 5.0, 5.0];
        let (start, value) = kernel.argmax_window(&data, mean).unwrap();
        assert_eq!(start, 1);
        assert_relative_eq!(value, 5.0);
        assert!(WindowKernel::new(10).argmax_window(&data, mean).is_none());
    }
}
