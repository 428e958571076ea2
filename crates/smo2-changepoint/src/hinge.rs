//! Continuous two-segment (hinge) fit
//!
//! Model: `y = y0 + k1 (x - x0)` for `x < x0` and `y = y0 + k2 (x - x0)` for
//! `x >= x0`. Every sample position is tried as the knot `x0`; for each, the
//! three remaining parameters solve a 3x3 normal system built from prefix
//! sums, so the global optimum over sample knots costs O(n).

use crate::kernel::solve_normal_equations;
use crate::traits::ChangePointDetectorProperties;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use smo2_core::{Error, Result, SegmentSums};
use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HingeParameters {
    /// Minimum number of samples on each side of the knot
    pub min_segment_len: usize,
}

impl Default for HingeParameters {
    fn default() -> Self {
        Self { min_segment_len: 5 }
    }
}

impl HingeParameters {
    pub fn validate(&self) -> Result<()> {
        if self.min_segment_len < 2 {
            return Err(Error::InvalidParameter(format!(
                "hinge segments need at least 2 samples, got {}",
                self.min_segment_len
            )));
        }
        Ok(())
    }
}

/// Fitted hinge
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HingeModel {
    pub knot_index: usize,
    /// Knot position `x0`
    pub knot: f64,
    /// Model value at the knot, `y0`
    pub knot_value: f64,
    pub left_slope: f64,
    pub right_slope: f64,
    pub residual_ss: f64,
}

impl HingeModel {
    pub fn eval(&self, x: f64) -> f64 {
        let dx = x - self.knot;
        let slope = if dx < 0.0 {
            self.left_slope
        } else {
            self.right_slope
        };
        self.knot_value + slope * dx
    }

    /// Model evaluated at every position of `axis`
    pub fn curve(&self, axis: &[f64]) -> Vec<f64> {
        axis.iter().map(|&x| self.eval(x)).collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct HingeFitter {
    params: HingeParameters,
}

impl HingeFitter {
    pub fn new(params: HingeParameters) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn parameters(&self) -> &HingeParameters {
        &self.params
    }

    /// Least-squares hinge over all admissible sample knots
    #[instrument(skip(self, axis, curve), fields(n = curve.len()))]
    pub fn fit(&self, axis: &[f64], curve: &[f64]) -> Result<HingeModel> {
        let sums = SegmentSums::new(axis, curve)?;
        let n = sums.len();
        let min_len = self.params.min_segment_len;
        if n < 2 * min_len {
            return Err(Error::InsufficientData {
                expected: 2 * min_len,
                actual: n,
            });
        }

        let (x_mean, y_mean) = sums.offsets();
        let total = sums.moments(0, n);
        let mut best: Option<HingeModel> = None;

        for k in min_len..=n - min_len {
            let c = axis[k] - x_mean;
            let left = sums.moments(0, k);
            let right = sums.moments(k, n);

            let su = left.sx - left.n * c;
            let suu = left.sxx - 2.0 * c * left.sx + left.n * c * c;
            let suy = left.sxy - c * left.sy;
            let sv = right.sx - right.n * c;
            let svv = right.sxx - 2.0 * c * right.sx + right.n * c * c;
            let svy = right.sxy - c * right.sy;

            #[rustfmt::skip]
            let a = DMatrix::from_row_slice(3, 3, &[
                total.n, su,  sv,
                su,      suu, 0.0,
                sv,      0.0, svv,
            ]);
            let b = DVector::from_column_slice(&[total.sy, suy, svy]);
            let beta = solve_normal_equations(a, &b)?;
            let residual_ss = (total.syy - beta.dot(&b)).max(0.0);

            if best.map_or(true, |m| residual_ss < m.residual_ss) {
                best = Some(HingeModel {
                    knot_index: k,
                    knot: axis[k],
                    knot_value: beta[0] + y_mean,
                    left_slope: beta[1],
                    right_slope: beta[2],
                    residual_ss,
                });
            }
        }

        let model = best.ok_or_else(|| Error::Computation("no admissible hinge knot".to_string()))?;
        debug!(
            "Hinge knot at {:.2} (index {}), slopes {:.4} / {:.4}, residual {:.4}",
            model.knot, model.knot_index, model.left_slope, model.right_slope, model.residual_ss
        );
        Ok(model)
    }
}

impl ChangePointDetectorProperties for HingeFitter {
    fn algorithm_name(&self) -> &'static str {
        "Hinge"
    }

    fn minimum_sample_size(&self) -> usize {
        2 * self.params.min_segment_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_exact_hinge_recovered() {
        let axis: Vec<f64> = (0..80).map(|i| 50.0 + 2.5 * i as f64).collect();
        let curve: Vec<f64> = axis
            .iter()
            .map(|&x| if x < 125.0 { 72.0 - 0.02 * (x - 125.0) } else { 72.0 - 0.4 * (x - 125.0) })
            .collect();
        let model = HingeFitter::default().fit(&axis, &curve).unwrap();
        assert_eq!(model.knot_index, 30);
        assert_relative_eq!(model.knot, 125.0);
        assert_relative_eq!(model.knot_value, 72.0, epsilon = 1e-8);
        assert_relative_eq!(model.left_slope, -0.02, epsilon = 1e-8);
        assert_relative_eq!(model.right_slope, -0.4, epsilon = 1e-8);
        assert!(model.residual_ss < 1e-8);

        let rebuilt = model.curve(&axis);
        for (r, c) in rebuilt.iter().zip(&curve) {
            assert_relative_eq!(r, c, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_too_short() {
        let axis = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let curve = [1.0; 6];
        assert!(matches!(
            HingeFitter::default().fit(&axis, &curve),
            Err(Error::InsufficientData { .. })
        ));
    }
}
