//! Least-squares line fitting and constant-time segment costs
//!
//! [`SegmentSums`] holds prefix sums of `x`, `y`, `x²`, `xy` and `y²` so the
//! residual sum of squares of the best line over any index range is O(1).
//! Both penalized segmentation and the exhaustive search depend on this.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// A fitted line `y = slope * x + intercept`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LineFit {
    #[inline]
    pub fn eval(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Ordinary least-squares line through `(x, y)`
pub fn fit_line(x: &[f64], y: &[f64]) -> Result<LineFit> {
    if x.len() != y.len() {
        return Err(Error::size_mismatch(x.len(), y.len(), "line fit"));
    }
    SegmentSums::new(x, y)?.fit(0, x.len())
}

/// Sums of a range of centred points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Moments {
    pub n: f64,
    pub sx: f64,
    pub sy: f64,
    pub sxx: f64,
    pub sxy: f64,
    pub syy: f64,
}

/// Prefix sums over centred data
#[derive(Debug, Clone)]
pub struct SegmentSums {
    x_mean: f64,
    y_mean: f64,
    sx: Vec<f64>,
    sy: Vec<f64>,
    sxx: Vec<f64>,
    sxy: Vec<f64>,
    syy: Vec<f64>,
}

impl SegmentSums {
    pub fn new(x: &[f64], y: &[f64]) -> Result<Self> {
        if x.len() != y.len() {
            return Err(Error::size_mismatch(x.len(), y.len(), "segment sums"));
        }
        if x.is_empty() {
            return Err(Error::InsufficientData {
                expected: 1,
                actual: 0,
            });
        }
        if x.iter().chain(y).any(|v| !v.is_finite()) {
            return Err(Error::non_finite("segment data"));
        }

        let n = x.len() as f64;
        let x_mean = x.iter().sum::<f64>() / n;
        let y_mean = y.iter().sum::<f64>() / n;

        let len = x.len() + 1;
        let mut sums = Self {
            x_mean,
            y_mean,
            sx: Vec::with_capacity(len),
            sy: Vec::with_capacity(len),
            sxx: Vec::with_capacity(len),
            sxy: Vec::with_capacity(len),
            syy: Vec::with_capacity(len),
        };
        let (mut ax, mut ay, mut axx, mut axy, mut ayy) = (0.0, 0.0, 0.0, 0.0, 0.0);
        sums.push(ax, ay, axx, axy, ayy);
        for (&xi, &yi) in x.iter().zip(y) {
            let (cx, cy) = (xi - x_mean, yi - y_mean);
            ax += cx;
            ay += cy;
            axx += cx * cx;
            axy += cx * cy;
            ayy += cy * cy;
            sums.push(ax, ay, axx, axy, ayy);
        }
        Ok(sums)
    }

    fn push(&mut self, x: f64, y: f64, xx: f64, xy: f64, yy: f64) {
        self.sx.push(x);
        self.sy.push(y);
        self.sxx.push(xx);
        self.sxy.push(xy);
        self.syy.push(yy);
    }

    /// Number of points the sums were built over
    pub fn len(&self) -> usize {
        self.sx.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Offsets subtracted from `x` and `y` before summing
    pub fn offsets(&self) -> (f64, f64) {
        (self.x_mean, self.y_mean)
    }

    /// Raw sums over `[start, end)` in centred coordinates
    pub fn moments(&self, start: usize, end: usize) -> Moments {
        Moments {
            n: (end - start) as f64,
            sx: self.sx[end] - self.sx[start],
            sy: self.sy[end] - self.sy[start],
            sxx: self.sxx[end] - self.sxx[start],
            sxy: self.sxy[end] - self.sxy[start],
            syy: self.syy[end] - self.syy[start],
        }
    }

    /// Central (co)variances over `[start, end)`: (cxx, cxy, cyy, mean_x, mean_y)
    fn central(&self, start: usize, end: usize) -> (f64, f64, f64, f64, f64) {
        let m = self.moments(start, end);
        let mx = m.sx / m.n;
        let my = m.sy / m.n;
        (m.sxx - m.sx * mx, m.sxy - m.sx * my, m.syy - m.sy * my, mx, my)
    }

    /// Residual sum of squares of the least-squares line over `[start, end)`
    ///
    /// Segments of fewer than two points cost nothing.
    pub fn cost(&self, start: usize, end: usize) -> f64 {
        debug_assert!(start <= end && end <= self.len());
        if end - start < 2 {
            return 0.0;
        }
        let (cxx, cxy, cyy, _, _) = self.central(start, end);
        let sse = if cxx > f64::EPSILON {
            cyy - cxy * cxy / cxx
        } else {
            cyy
        };
        sse.max(0.0)
    }

    /// Least-squares line over `[start, end)` in the original coordinates
    pub fn fit(&self, start: usize, end: usize) -> Result<LineFit> {
        if end > self.len() || end < start + 2 {
            return Err(Error::InvalidParameter(format!(
                "line fit needs at least 2 points in range {start}..{end} of {}",
                self.len()
            )));
        }
        let (cxx, cxy, _, mx, my) = self.central(start, end);
        if cxx <= f64::EPSILON {
            return Err(Error::Computation(format!(
                "degenerate axis over {start}..{end}: all positions equal"
            )));
        }
        let slope = cxy / cxx;
        let x_bar = mx + self.x_mean;
        let y_bar = my + self.y_mean;
        Ok(LineFit {
            slope,
            intercept: y_bar - slope * x_bar,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_exact_line_recovered() {
        let x: Vec<f64> = (0..20).map(|i| i as f64 * 0.5).collect();
        let y: Vec<f64> = x.iter().map(|&v| 3.0 - 0.25 * v).collect();
        let fit = fit_line(&x, &y).unwrap();
        assert_relative_eq!(fit.slope, -0.25, epsilon = 1e-12);
        assert_relative_eq!(fit.intercept, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_segment_cost_matches_direct_residuals() {
        let x: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let y: Vec<f64> = (0..30)
            .map(|i| 70.0 - 0.1 * i as f64 + if i % 2 == 0 { 0.3 } else { -0.3 })
            .collect();
        let sums = SegmentSums::new(&x, &y).unwrap();

        let (start, end) = (4, 21);
        let fit = sums.fit(start, end).unwrap();
        let direct: f64 = (start..end).map(|i| (y[i] - fit.eval(x[i])).powi(2)).sum();
        assert_relative_eq!(sums.cost(start, end), direct, epsilon = 1e-9);
    }

    #[test]
    fn test_piecewise_segments_cost_zero() {
        let x: Vec<f64> = (0..40).map(|i| i as f64).collect();
        let y: Vec<f64> = x
            .iter()
            .map(|&v| if v < 20.0 { 50.0 } else { 50.0 - 2.0 * (v - 20.0) })
            .collect();
        let sums = SegmentSums::new(&x, &y).unwrap();
        assert!(sums.cost(0, 20) < 1e-9);
        assert!(sums.cost(20, 40) < 1e-9);
        assert!(sums.cost(0, 40) > 100.0);
    }

    #[test]
    fn test_fit_rejects_single_point() {
        let sums = SegmentSums::new(&[0.0, 1.0, 2.0], &[1.0, 2.0, 3.0]).unwrap();
        assert!(sums.fit(1, 2).is_err());
        assert_eq!(sums.cost(1, 2), 0.0);
    }
}
