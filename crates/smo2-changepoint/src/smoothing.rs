//! Savitzky-Golay smoothing
//!
//! Fits a polynomial of fixed order over a sliding window and keeps the
//! fitted centre value. Interior samples use precomputed convolution weights.
//! The first and last `window / 2` samples are taken from the polynomial
//! fitted to the first (resp. last) full window, evaluated at their offsets.

use crate::kernel::PolynomialKernel;
use serde::{Deserialize, Serialize};
use smo2_core::{Error, Result};
use tracing::debug;

/// Parameters for Savitzky-Golay smoothing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SavitzkyGolayParameters {
    /// Window length; odd and at least 5
    pub window_length: usize,
    /// Polynomial order; smaller than the window
    pub polynomial_order: usize,
}

impl Default for SavitzkyGolayParameters {
    fn default() -> Self {
        Self {
            window_length: 11,
            polynomial_order: 2,
        }
    }
}

impl SavitzkyGolayParameters {
    pub fn validate(&self) -> Result<()> {
        if self.window_length < 5 || self.window_length % 2 == 0 {
            return Err(Error::InvalidParameter(format!(
                "smoothing window must be odd and at least 5, got {}",
                self.window_length
            )));
        }
        if self.polynomial_order >= self.window_length {
            return Err(Error::InvalidParameter(format!(
                "polynomial order {} must be smaller than the window length {}",
                self.polynomial_order, self.window_length
            )));
        }
        Ok(())
    }
}

/// Savitzky-Golay filter with precomputed weights
#[derive(Debug, Clone)]
pub struct SavitzkyGolay {
    params: SavitzkyGolayParameters,
    kernel: PolynomialKernel,
    weights: Vec<f64>,
}

impl SavitzkyGolay {
    pub fn new(params: SavitzkyGolayParameters) -> Result<Self> {
        params.validate()?;
        let kernel = PolynomialKernel::new(params.polynomial_order);
        let weights = kernel.smoothing_weights(params.window_length / 2)?;
        Ok(Self {
            params,
            kernel,
            weights,
        })
    }

    pub fn parameters(&self) -> &SavitzkyGolayParameters {
        &self.params
    }

    /// Smooth `values`, returning a curve of the same length
    ///
    /// Fails with `InsufficientData` when `values` is shorter than the window.
    pub fn smooth(&self, values: &[f64]) -> Result<Vec<f64>> {
        let window = self.params.window_length;
        let half = window / 2;
        let n = values.len();

        if n < window {
            return Err(Error::InsufficientData {
                expected: window,
                actual: n,
            });
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(Error::non_finite("smoothing input"));
        }

        let mut smoothed = vec![0.0; n];
        for (centre, out) in smoothed.iter_mut().enumerate().take(n - half).skip(half) {
            let window_values = &values[centre - half..=centre + half];
            *out = window_values
                .iter()
                .zip(&self.weights)
                .map(|(v, w)| v * w)
                .sum();
        }

        let offsets: Vec<f64> = (0..window).map(|i| i as f64).collect();

        let head = self.kernel.fit_polynomial(&offsets, &values[..window])?;
        for (i, out) in smoothed.iter_mut().enumerate().take(half) {
            *out = PolynomialKernel::evaluate(&head, i as f64);
        }

        let tail = self.kernel.fit_polynomial(&offsets, &values[n - window..])?;
        for k in 0..half {
            let i = n - half + k;
            smoothed[i] = PolynomialKernel::evaluate(&tail, (window - half + k) as f64);
        }

        debug!(
            "Smoothed {} samples with window {} / order {}",
            n, window, self.params.polynomial_order
        );
        Ok(smoothed)
    }
}

/// Smooth with the default parameters (window 11, order 2)
pub fn smooth(values: &[f64]) -> Result<Vec<f64>> {
    SavitzkyGolay::new(SavitzkyGolayParameters::default())?.smooth(values)
}

/// Centred moving average of odd width `size`, reflecting at both ends
///
/// Index `-1` mirrors to `0`, `-2` to `1`, and likewise past the last sample.
pub fn moving_average(values: &[f64], size: usize) -> Result<Vec<f64>> {
    if size == 0 || size % 2 == 0 {
        return Err(Error::InvalidParameter(format!(
            "moving average width must be odd, got {size}"
        )));
    }
    let n = values.len();
    if n == 0 {
        return Ok(vec![]);
    }
    let half = (size / 2) as isize;
    let reflect = |i: isize| -> f64 {
        let len = n as isize;
        let mut j = i;
        // repeated reflection covers windows wider than the series
        while j < 0 || j >= len {
            j = if j < 0 { -j - 1 } else { 2 * len - j - 1 };
        }
        values[j as usize]
    };
    Ok((0..n as isize)
        .map(|c| (c - half..=c + half).map(reflect).sum::<f64>() / size as f64)
        .collect())
}
