//! Types used for change-point detection

use serde::{Deserialize, Serialize};
use smo2_core::{Error, LineFit, Result};
use std::fmt;

/// A detected change in the curve's local behaviour
///
/// `index` is the first sample of the new segment; it is always interior to
/// the series (never the first or last sample).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Breakpoint {
    /// Index into the series
    pub index: usize,
    /// Axis value at `index`
    pub position: f64,
}

impl Breakpoint {
    pub fn new(index: usize, position: f64) -> Self {
        Self { index, position }
    }

    /// Breakpoint at `index` of `axis`
    pub fn at(axis: &[f64], index: usize) -> Self {
        Self::new(index, axis[index])
    }
}

impl fmt::Display for Breakpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Breakpoint {{ index: {}, position: {:.2} }}", self.index, self.position)
    }
}

/// Ordered set of exactly 2 or 3 interior breakpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakpointSet {
    breakpoints: Vec<Breakpoint>,
}

impl BreakpointSet {
    pub const MIN_LEN: usize = 2;
    pub const MAX_LEN: usize = 3;

    /// Validate and wrap breakpoints for a series of `series_len` samples
    pub fn new(breakpoints: Vec<Breakpoint>, series_len: usize) -> Result<Self> {
        if !(Self::MIN_LEN..=Self::MAX_LEN).contains(&breakpoints.len()) {
            return Err(Error::InvalidParameter(format!(
                "a breakpoint set holds {} to {} breakpoints, got {}",
                Self::MIN_LEN,
                Self::MAX_LEN,
                breakpoints.len()
            )));
        }
        if let Some(bp) = breakpoints
            .iter()
            .find(|bp| bp.index == 0 || bp.index + 1 >= series_len)
        {
            return Err(Error::InvalidInput(format!(
                "breakpoint index {} is not interior to a series of {} samples",
                bp.index, series_len
            )));
        }
        if breakpoints.windows(2).any(|w| w[1].index <= w[0].index) {
            return Err(Error::InvalidInput(
                "breakpoints must be strictly increasing".to_string(),
            ));
        }
        Ok(Self { breakpoints })
    }

    pub fn as_slice(&self) -> &[Breakpoint] {
        &self.breakpoints
    }

    pub fn len(&self) -> usize {
        self.breakpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakpoints.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&Breakpoint> {
        self.breakpoints.get(i)
    }

    pub fn indices(&self) -> Vec<usize> {
        self.breakpoints.iter().map(|bp| bp.index).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Breakpoint> {
        self.breakpoints.iter()
    }
}

/// Least-squares line over one segment `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentFit {
    pub start: usize,
    pub end: usize,
    pub line: LineFit,
}

/// Piecewise reconstruction of a curve, one line per segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedCurve {
    values: Vec<f64>,
    segments: Vec<SegmentFit>,
    residual_ss: f64,
}

impl FittedCurve {
    pub fn new(values: Vec<f64>, segments: Vec<SegmentFit>, residual_ss: f64) -> Self {
        Self {
            values,
            segments,
            residual_ss,
        }
    }

    /// Reconstructed value per sample
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn segments(&self) -> &[SegmentFit] {
        &self.segments
    }

    /// Residual sum of squares against the curve that was fitted
    pub fn residual_ss(&self) -> f64 {
        self.residual_ss
    }
}

/// Raw output of a change-point search before count reconciliation
#[derive(Debug, Clone)]
pub struct ChangePointResult {
    candidates: Vec<Breakpoint>,
    algorithm: String,
    sample_size: usize,
    total_cost: f64,
}

impl ChangePointResult {
    pub fn new(
        candidates: Vec<Breakpoint>,
        algorithm: String,
        sample_size: usize,
        total_cost: f64,
    ) -> Self {
        Self {
            candidates,
            algorithm,
            sample_size,
            total_cost,
        }
    }

    /// Candidate breakpoints in index order
    pub fn candidates(&self) -> &[Breakpoint] {
        &self.candidates
    }

    pub fn count(&self) -> usize {
        self.candidates.len()
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    /// Objective value of the search (penalized cost or residual sum)
    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }
}

impl fmt::Display for ChangePointResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ChangePoint Detection Result:")?;
        writeln!(f, "  Algorithm: {}", self.algorithm)?;
        writeln!(f, "  Sample size: {}", self.sample_size)?;
        writeln!(f, "  Candidates detected: {}", self.count())?;
        for bp in &self.candidates {
            writeln!(f, "    {}", bp)?;
        }
        Ok(())
    }
}

/// Reconciled breakpoints plus their segment refit
#[derive(Debug, Clone)]
pub struct SegmentationResult {
    pub breakpoints: BreakpointSet,
    pub fitted: FittedCurve,
    pub search: ChangePointResult,
}
