//! Slope analysis of a smoothed curve
//!
//! [`gradient`] differentiates a curve against a possibly non-uniform axis.
//! [`SlopeAnalyzer`] then locates the first threshold where the slope drops
//! below a negative limit, and the second threshold after it by one of two
//! named policies (see [`SecondThresholdPolicy`]).

use serde::{Deserialize, Serialize};
use smo2_core::{Error, Result};
use tracing::debug;

/// Numerical derivative of `values` with respect to `axis`
///
/// Second-order central differences in the interior, first-order one-sided
/// differences at both ends.
pub fn gradient(axis: &[f64], values: &[f64]) -> Result<Vec<f64>> {
    let n = values.len();
    if axis.len() != n {
        return Err(Error::size_mismatch(n, axis.len(), "gradient axis"));
    }
    if n < 2 {
        return Err(Error::InsufficientData {
            expected: 2,
            actual: n,
        });
    }

    let mut out = Vec::with_capacity(n);
    out.push((values[1] - values[0]) / (axis[1] - axis[0]));
    for i in 1..n - 1 {
        let hs = axis[i] - axis[i - 1];
        let hd = axis[i + 1] - axis[i];
        let num = hs * hs * values[i + 1] + (hd * hd - hs * hs) * values[i] - hd * hd * values[i - 1];
        out.push(num / (hs * hd * (hd + hs)));
    }
    out.push((values[n - 1] - values[n - 2]) / (axis[n - 1] - axis[n - 2]));
    Ok(out)
}

/// Interior index of the most negative slope
///
/// Ties go to the earliest index. Fails when no interior slope is negative.
pub fn steepest_decline(slopes: &[f64]) -> Result<usize> {
    let interior = slopes.get(1..slopes.len().saturating_sub(1)).unwrap_or(&[]);
    let (offset, slope) = interior
        .iter()
        .copied()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, s)| match best {
            Some((_, b)) if b <= s => best,
            _ => Some((i, s)),
        })
        .ok_or_else(|| Error::no_threshold("S1", "curve too short to differentiate"))?;
    if slope.is_nan() || slope >= 0.0 {
        return Err(Error::no_threshold("S1", "SmO2 never declines"));
    }
    Ok(offset + 1)
}

/// How the second threshold is located after the first
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum SecondThresholdPolicy {
    /// First index after S1 whose slope rises above `threshold`
    PlateauCrossing { threshold: f64 },
    /// Index after S1 minimising |slope|; ties within `tolerance` go to the
    /// earliest index
    FlattestPoint { tolerance: f64 },
}

impl Default for SecondThresholdPolicy {
    fn default() -> Self {
        Self::PlateauCrossing { threshold: -0.005 }
    }
}

/// Parameters for slope-based threshold detection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlopeParameters {
    /// S1 is the first index with slope below this (SmO2 %/axis unit)
    pub first_threshold: f64,
    pub second: SecondThresholdPolicy,
}

impl Default for SlopeParameters {
    fn default() -> Self {
        Self {
            first_threshold: -0.03,
            second: SecondThresholdPolicy::default(),
        }
    }
}

impl SlopeParameters {
    pub fn validate(&self) -> Result<()> {
        if !(self.first_threshold.is_finite() && self.first_threshold < 0.0) {
            return Err(Error::InvalidParameter(format!(
                "first slope threshold must be negative, got {}",
                self.first_threshold
            )));
        }
        match self.second {
            SecondThresholdPolicy::PlateauCrossing { threshold } => {
                if !threshold.is_finite() || threshold <= self.first_threshold {
                    return Err(Error::InvalidParameter(format!(
                        "plateau threshold {threshold} must be finite and above the first threshold {}",
                        self.first_threshold
                    )));
                }
            }
            SecondThresholdPolicy::FlattestPoint { tolerance } => {
                if !(tolerance.is_finite() && tolerance >= 0.0) {
                    return Err(Error::InvalidParameter(format!(
                        "flattest-point tolerance must be non-negative, got {tolerance}"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// S1/S2 indices located from slopes
#[derive(Debug, Clone, PartialEq)]
pub struct SlopeCrossings {
    pub first: usize,
    pub second: usize,
    pub slopes: Vec<f64>,
}

/// Locates thresholds from the derivative of a curve
#[derive(Debug, Clone)]
pub struct SlopeAnalyzer {
    params: SlopeParameters,
}

impl SlopeAnalyzer {
    pub fn new(params: SlopeParameters) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn parameters(&self) -> &SlopeParameters {
        &self.params
    }

    /// First interior index whose slope drops below the first threshold
    pub fn first_crossing(&self, slopes: &[f64]) -> Result<usize> {
        let limit = self.params.first_threshold;
        let interior = slopes.get(1..slopes.len().saturating_sub(1)).unwrap_or(&[]);
        interior
            .iter()
            .position(|&s| s < limit)
            .map(|i| i + 1)
            .ok_or_else(|| Error::no_threshold("S1", format!("slope never drops below {limit}")))
    }

    /// Second threshold index, strictly after `first` and before the last sample
    pub fn second_threshold(&self, slopes: &[f64], first: usize) -> Result<usize> {
        let start = first + 1;
        let end = slopes.len().saturating_sub(1);
        if start >= end {
            return Err(Error::no_threshold("S2", "no interior samples after S1"));
        }
        let region = &slopes[start..end];

        let offset = match self.params.second {
            SecondThresholdPolicy::PlateauCrossing { threshold } => {
                region.iter().position(|&s| s > threshold).ok_or_else(|| {
                    Error::no_threshold(
                        "S2",
                        format!("slope never rises above {threshold} after S1"),
                    )
                })?
            }
            SecondThresholdPolicy::FlattestPoint { tolerance } => {
                let flattest = region.iter().map(|s| s.abs()).fold(f64::INFINITY, f64::min);
                region
                    .iter()
                    .position(|s| s.abs() <= flattest + tolerance)
                    .ok_or_else(|| Error::non_finite("slope curve"))?
            }
        };
        Ok(start + offset)
    }

    /// Differentiate `curve` and locate both thresholds
    pub fn analyze(&self, axis: &[f64], curve: &[f64]) -> Result<SlopeCrossings> {
        let slopes = gradient(axis, curve)?;
        let first = self.first_crossing(&slopes)?;
        let second = self.second_threshold(&slopes, first)?;
        debug!(
            "Slope crossings: S1 at index {} ({:.4}), S2 at index {} ({:.4})",
            first, slopes[first], second, slopes[second]
        );
        Ok(SlopeCrossings {
            first,
            second,
            slopes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_gradient_uniform_matches_central_difference() {
        let x: Vec<f64> = (0..6).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| v * v).collect();
        let g = gradient(&x, &y).unwrap();
        assert_relative_eq!(g[0], 1.0);
        for i in 1..5 {
            assert_relative_eq!(g[i], 2.0 * x[i], epsilon = 1e-12);
        }
        assert_relative_eq!(g[5], 9.0);
    }

    #[test]
    fn test_gradient_non_uniform_is_exact_for_quadratics() {
        let x = [0.0, 0.5, 2.0, 2.5, 4.0, 7.0];
        let y: Vec<f64> = x.iter().map(|v| 3.0 * v * v - v).collect();
        let g = gradient(&x, &y).unwrap();
        for i in 1..x.len() - 1 {
            assert_relative_eq!(g[i], 6.0 * x[i] - 1.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_no_first_crossing_is_an_error() {
        let analyzer = SlopeAnalyzer::new(SlopeParameters::default()).unwrap();
        let err = analyzer.first_crossing(&[0.0, -0.01, 0.02]).unwrap_err();
        assert!(matches!(err, Error::NoThresholdFound { ref label, .. } if label == "S1"));

        // the end samples never qualify
        assert!(analyzer.first_crossing(&[-1.0, 0.0, 0.0, -1.0]).is_err());
    }

    #[test]
    fn test_steepest_decline() {
        assert_eq!(steepest_decline(&[-5.0, -0.1, -0.4, -0.4, 0.0, -9.0]).unwrap(), 2);
        assert!(matches!(
            steepest_decline(&[-1.0, 0.0, 0.3, -1.0]),
            Err(Error::NoThresholdFound { .. })
        ));
        assert!(steepest_decline(&[-1.0, -1.0]).is_err());
    }

    #[test]
    fn test_plateau_crossing_after_first() {
        let analyzer = SlopeAnalyzer::new(SlopeParameters::default()).unwrap();
        let slopes = [0.0, -0.001, -0.05, -0.2, -0.1, -0.004, 0.0];
        let first = analyzer.first_crossing(&slopes).unwrap();
        assert_eq!(first, 2);
        assert_eq!(analyzer.second_threshold(&slopes, first).unwrap(), 5);
    }

    #[test]
    fn test_flattest_point_prefers_earliest_tie() {
        let params = SlopeParameters {
            second: SecondThresholdPolicy::FlattestPoint { tolerance: 1e-9 },
            ..Default::default()
        };
        let analyzer = SlopeAnalyzer::new(params).unwrap();
        let slopes = [0.0, -0.05, -0.3, -0.01, 1e-12, -1e-12, 0.0];
        assert_eq!(analyzer.second_threshold(&slopes, 1).unwrap(), 4);
    }

    #[test]
    fn test_second_threshold_needs_samples_after_first() {
        let analyzer = SlopeAnalyzer::new(SlopeParameters::default()).unwrap();
        assert!(analyzer.second_threshold(&[0.0, -0.1], 1).is_err());
        assert!(analyzer.second_threshold(&[0.0, -0.1, -0.2], 1).is_err());
    }

    #[test]
    fn test_invalid_parameters() {
        let params = SlopeParameters {
            first_threshold: 0.01,
            ..Default::default()
        };
        assert!(SlopeAnalyzer::new(params).is_err());

        let params = SlopeParameters {
            second: SecondThresholdPolicy::PlateauCrossing { threshold: -0.5 },
            ..Default::default()
        };
        assert!(SlopeAnalyzer::new(params).is_err());
    }
}
