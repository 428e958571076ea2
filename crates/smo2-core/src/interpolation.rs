//! Piecewise-linear interpolation of a channel against the domain axis
//!
//! Used to read companion channels (heart rate, SmO2, power) at threshold and
//! zone-bound positions that fall between samples.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Behaviour outside the sampled axis range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Extrapolation {
    /// Extend the first/last segment's line
    #[default]
    Linear,
    /// Hold the first/last sampled value
    Flat,
}

/// Linear interpolator over a strictly increasing axis
#[derive(Debug, Clone, Copy)]
pub struct Interpolator<'a> {
    axis: &'a [f64],
    values: &'a [f64],
    extrapolation: Extrapolation,
}

impl<'a> Interpolator<'a> {
    pub fn new(axis: &'a [f64], values: &'a [f64], extrapolation: Extrapolation) -> Result<Self> {
        if axis.len() != values.len() {
            return Err(Error::size_mismatch(axis.len(), values.len(), "interpolated channel"));
        }
        if axis.len() < 2 {
            return Err(Error::InsufficientData {
                expected: 2,
                actual: axis.len(),
            });
        }
        Ok(Self {
            axis,
            values,
            extrapolation,
        })
    }

    /// Value of the channel at `position`
    ///
    /// Returns the stored sample exactly when `position` is a sampled axis
    /// value.
    pub fn at(&self, position: f64) -> f64 {
        let n = self.axis.len();
        let idx = self.axis.partition_point(|&x| x < position);

        if idx < n && self.axis[idx] == position {
            return self.values[idx];
        }

        let segment = match idx {
            0 => match self.extrapolation {
                Extrapolation::Flat => return self.values[0],
                Extrapolation::Linear => 1,
            },
            i if i == n => match self.extrapolation {
                Extrapolation::Flat => return self.values[n - 1],
                Extrapolation::Linear => n - 1,
            },
            i => i,
        };

        let (x0, x1) = (self.axis[segment - 1], self.axis[segment]);
        let (y0, y1) = (self.values[segment - 1], self.values[segment]);
        y0 + (y1 - y0) * (position - x0) / (x1 - x0)
    }
}
