//! Exercise-test series and the builder that validates them
//!
//! A [`Series`] is a set of aligned channels sampled along one domain axis
//! (elapsed time or power). The axis is strictly increasing and every row is
//! finite; [`SeriesBuilder`] enforces both before any analysis runs.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// The independent variable a series is indexed by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    /// Elapsed time in seconds
    Time,
    /// Power output in watts
    Power,
}

impl Domain {
    /// Channel name used in diagnostics
    pub fn channel_name(&self) -> &'static str {
        match self {
            Domain::Time => "time",
            Domain::Power => "power",
        }
    }

    /// Unit suffix for display
    pub fn unit(&self) -> &'static str {
        match self {
            Domain::Time => "s",
            Domain::Power => "W",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.channel_name())
    }
}

/// One row of a series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Position along the domain axis
    pub position: f64,
    /// Muscle oxygen saturation in percent
    pub smo2: f64,
    /// Heart rate in beats per minute
    pub heart_rate: f64,
}

/// Validated, aligned measurement channels
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    domain: Domain,
    axis: Vec<f64>,
    smo2: Vec<f64>,
    heart_rate: Vec<f64>,
    power: Option<Vec<f64>>,
}

impl Series {
    /// Domain the axis is expressed in
    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn len(&self) -> usize {
        self.axis.len()
    }

    pub fn is_empty(&self) -> bool {
        self.axis.is_empty()
    }

    /// Domain axis values (strictly increasing)
    pub fn axis(&self) -> &[f64] {
        &self.axis
    }

    pub fn smo2(&self) -> &[f64] {
        &self.smo2
    }

    pub fn heart_rate(&self) -> &[f64] {
        &self.heart_rate
    }

    /// Power channel, if known
    ///
    /// For power-domain series the axis itself is the power channel.
    pub fn power(&self) -> Option<&[f64]> {
        match self.domain {
            Domain::Power => Some(&self.axis),
            Domain::Time => self.power.as_deref(),
        }
    }

    /// Power channel or a `MissingChannel` error
    pub fn require_power(&self) -> Result<&[f64]> {
        self.power().ok_or_else(|| Error::missing_channel("power"))
    }

    /// Row `index` as a [`Sample`]
    pub fn sample(&self, index: usize) -> Option<Sample> {
        Some(Sample {
            position: *self.axis.get(index)?,
            smo2: self.smo2[index],
            heart_rate: self.heart_rate[index],
        })
    }

    /// Iterate over all rows
    pub fn samples(&self) -> impl Iterator<Item = Sample> + '_ {
        (0..self.len()).filter_map(move |i| self.sample(i))
    }

    /// First and last axis value
    pub fn span(&self) -> (f64, f64) {
        (self.axis[0], self.axis[self.axis.len() - 1])
    }
}

/// Builder assembling a [`Series`] from named channels
///
/// Rows containing any non-finite value are dropped, mirroring the upstream
/// "drop rows with nulls" step of the ingestion collaborator.
#[derive(Debug, Clone)]
pub struct SeriesBuilder {
    domain: Domain,
    axis: Option<Vec<f64>>,
    smo2: Option<Vec<f64>>,
    heart_rate: Option<Vec<f64>>,
    power: Option<Vec<f64>>,
}

impl SeriesBuilder {
    pub fn new(domain: Domain) -> Self {
        Self {
            domain,
            axis: None,
            smo2: None,
            heart_rate: None,
            power: None,
        }
    }

    /// Domain axis channel (time in seconds or power in watts)
    pub fn axis(mut self, values: Vec<f64>) -> Self {
        self.axis = Some(values);
        self
    }

    pub fn smo2(mut self, values: Vec<f64>) -> Self {
        self.smo2 = Some(values);
        self
    }

    pub fn heart_rate(mut self, values: Vec<f64>) -> Self {
        self.heart_rate = Some(values);
        self
    }

    /// Optional power channel for time-domain series
    ///
    /// Ignored for power-domain series, whose axis already is the power.
    pub fn power(mut self, values: Vec<f64>) -> Self {
        self.power = Some(values);
        self
    }

    pub fn build(self) -> Result<Series> {
        let axis = self
            .axis
            .ok_or_else(|| Error::missing_channel(self.domain.channel_name()))?;
        let smo2 = self.smo2.ok_or_else(|| Error::missing_channel("smo2"))?;
        let heart_rate = self
            .heart_rate
            .ok_or_else(|| Error::missing_channel("heart_rate"))?;
        let power = match self.domain {
            Domain::Power => None,
            Domain::Time => self.power,
        };

        let n = axis.len();
        if smo2.len() != n {
            return Err(Error::size_mismatch(n, smo2.len(), "smo2 channel"));
        }
        if heart_rate.len() != n {
            return Err(Error::size_mismatch(n, heart_rate.len(), "heart_rate channel"));
        }
        if let Some(p) = &power {
            if p.len() != n {
                return Err(Error::size_mismatch(n, p.len(), "power channel"));
            }
        }

        let keep: Vec<usize> = (0..n)
            .filter(|&i| {
                axis[i].is_finite()
                    && smo2[i].is_finite()
                    && heart_rate[i].is_finite()
                    && power.as_ref().map_or(true, |p| p[i].is_finite())
            })
            .collect();

        if keep.len() < n {
            debug!("Dropped {} incomplete rows out of {}", n - keep.len(), n);
        }
        if keep.len() < 2 {
            return Err(Error::InsufficientData {
                expected: 2,
                actual: keep.len(),
            });
        }

        let pick = |v: &[f64]| keep.iter().map(|&i| v[i]).collect::<Vec<_>>();
        let axis = pick(&axis);

        if let Some(i) = axis.windows(2).position(|w| w[1] <= w[0]) {
            return Err(Error::InvalidInput(format!(
                "{} axis must be strictly increasing (row {} = {}, row {} = {})",
                self.domain,
                i,
                axis[i],
                i + 1,
                axis[i + 1]
            )));
        }

        Ok(Series {
            domain: self.domain,
            smo2: pick(&smo2),
            heart_rate: pick(&heart_rate),
            power: power.as_deref().map(pick),
            axis,
        })
    }
}
