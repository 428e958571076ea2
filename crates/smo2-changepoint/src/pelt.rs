//! PELT (Pruned Exact Linear Time) penalized segmentation
//!
//! Minimises the sum of per-segment costs plus a penalty per change point.
//! The segment cost is the residual sum of squares of a least-squares line
//! against the domain axis, evaluated in O(1) from prefix sums. Candidates
//! that can no longer start an optimal last segment are pruned, which keeps
//! the search near-linear on curves with few changes.

use crate::segmentation::{reconcile, refit_with, to_breakpoint_set, TruncationPolicy};
use crate::traits::{BreakpointDetector, ChangePointDetectorProperties, ConfigurableDetector};
use crate::types::{Breakpoint, ChangePointResult, SegmentationResult};
use serde::{Deserialize, Serialize};
use smo2_core::{Error, Result, SegmentSums};
use tracing::{debug, instrument};

/// PELT parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeltParameters {
    /// Cost added per change point
    pub penalty: f64,
    /// Minimum number of samples per segment
    pub min_segment_len: usize,
    /// How surplus candidates are reduced to the requested count
    pub truncation: TruncationPolicy,
}

impl Default for PeltParameters {
    fn default() -> Self {
        Self {
            penalty: 5.0,
            min_segment_len: 5,
            truncation: TruncationPolicy::default(),
        }
    }
}

impl PeltParameters {
    pub fn validate(&self) -> Result<()> {
        if !(self.penalty.is_finite() && self.penalty > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "penalty must be positive, got {}",
                self.penalty
            )));
        }
        if self.min_segment_len < 2 {
            return Err(Error::InvalidParameter(format!(
                "minimum segment length must be at least 2, got {}",
                self.min_segment_len
            )));
        }
        Ok(())
    }
}

/// Penalized segmentation detector with a linear-regression cost
#[derive(Debug, Clone)]
pub struct PeltDetector {
    params: PeltParameters,
}

impl PeltDetector {
    pub fn new(params: PeltParameters) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    /// Run the unconstrained search and return every change point found
    #[instrument(skip(self, axis, curve), fields(n = curve.len(), penalty = self.params.penalty))]
    pub fn candidates(&self, axis: &[f64], curve: &[f64]) -> Result<ChangePointResult> {
        let sums = SegmentSums::new(axis, curve)?;
        let (indices, total_cost) = self.search(&sums)?;
        let candidates = indices.iter().map(|&i| Breakpoint::at(axis, i)).collect();
        Ok(ChangePointResult::new(
            candidates,
            self.algorithm_name().to_string(),
            curve.len(),
            total_cost,
        ))
    }

    fn search(&self, sums: &SegmentSums) -> Result<(Vec<usize>, f64)> {
        let n = sums.len();
        let min_len = self.params.min_segment_len;
        let penalty = self.params.penalty;

        if n < min_len {
            return Err(Error::InsufficientData {
                expected: min_len,
                actual: n,
            });
        }

        // f[t]: optimal penalized cost of [0, t); last[t]: start of its final segment
        let mut f = vec![f64::INFINITY; n + 1];
        let mut last = vec![0usize; n + 1];
        f[0] = -penalty;

        let mut admissible: Vec<usize> = Vec::new();
        let mut scored: Vec<(usize, f64)> = Vec::new();
        let mut evaluations = 0usize;

        for t in min_len..=n {
            let s_new = t - min_len;
            if s_new == 0 || s_new >= min_len {
                admissible.push(s_new);
            }

            scored.clear();
            scored.extend(admissible.iter().map(|&s| (s, f[s] + sums.cost(s, t))));
            evaluations += scored.len();

            let (best_s, best) = scored
                .iter()
                .fold((0, f64::INFINITY), |acc, &(s, c)| if c < acc.1 { (s, c) } else { acc });
            f[t] = best + penalty;
            last[t] = best_s;

            let bound = f[t];
            admissible.clear();
            admissible.extend(scored.iter().filter(|&&(_, c)| c <= bound).map(|&(s, _)| s));
        }

        let mut indices = Vec::new();
        let mut t = n;
        while t > 0 {
            let s = last[t];
            if s > 0 {
                indices.push(s);
            }
            t = s;
        }
        indices.reverse();

        debug!(
            "PELT found {} change points over {} samples ({} cost evaluations)",
            indices.len(),
            n,
            evaluations
        );
        Ok((indices, f[n]))
    }
}

impl Default for PeltDetector {
    fn default() -> Self {
        Self {
            params: PeltParameters::default(),
        }
    }
}

impl ChangePointDetectorProperties for PeltDetector {
    fn algorithm_name(&self) -> &'static str {
        "Pelt"
    }

    fn minimum_sample_size(&self) -> usize {
        2 * self.params.min_segment_len
    }
}

impl BreakpointDetector for PeltDetector {
    #[instrument(skip(self, axis, curve), fields(n = curve.len()))]
    fn detect_breakpoints(
        &self,
        axis: &[f64],
        curve: &[f64],
        n_breakpoints: usize,
    ) -> Result<SegmentationResult> {
        if n_breakpoints < 2 || n_breakpoints > 3 {
            return Err(Error::InvalidParameter(format!(
                "PELT segmentation resolves 2 or 3 breakpoints, {n_breakpoints} requested"
            )));
        }

        let sums = SegmentSums::new(axis, curve)?;
        let (indices, total_cost) = self.search(&sums)?;
        let kept = reconcile(&indices, n_breakpoints, self.params.truncation, &sums)?;
        let fitted = refit_with(&sums, axis, curve, &kept)?;

        let candidates = indices.iter().map(|&i| Breakpoint::at(axis, i)).collect();
        let search = ChangePointResult::new(
            candidates,
            self.algorithm_name().to_string(),
            curve.len(),
            total_cost,
        );

        Ok(SegmentationResult {
            breakpoints: to_breakpoint_set(axis, &kept)?,
            fitted,
            search,
        })
    }
}

impl ConfigurableDetector for PeltDetector {
    type Parameters = PeltParameters;

    fn parameters(&self) -> &Self::Parameters {
        &self.params
    }

    fn set_parameters(&mut self, params: Self::Parameters) -> Result<()> {
        params.validate()?;
        self.params = params;
        Ok(())
    }
}
