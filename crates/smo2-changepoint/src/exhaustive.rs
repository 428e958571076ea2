//! Exhaustive three-segment search
//!
//! Tries every pair of breakpoints `(i, j)` separated by at least a fixed
//! fraction of the series and keeps the pair with the lowest total residual of
//! three independent line fits. Quadratic in the series length, so it warns
//! above [`ExhaustiveParameters::WARN_SAMPLES`] and refuses anything longer
//! than `max_samples`.

use crate::segmentation::{refit_with, to_breakpoint_set};
use crate::traits::{BreakpointDetector, ChangePointDetectorProperties, ConfigurableDetector};
use crate::types::{Breakpoint, ChangePointResult, SegmentationResult};
use serde::{Deserialize, Serialize};
use smo2_core::{Error, Result, SegmentSums};
use tracing::{debug, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExhaustiveParameters {
    /// Minimum separation between breakpoints, as a fraction of the length
    pub min_separation_fraction: f64,
    /// Longest series the search accepts
    pub max_samples: usize,
}

impl ExhaustiveParameters {
    pub const WARN_SAMPLES: usize = 500;

    pub fn validate(&self) -> Result<()> {
        if !(self.min_separation_fraction > 0.0 && self.min_separation_fraction < 1.0 / 3.0) {
            return Err(Error::InvalidParameter(format!(
                "separation fraction must lie in (0, 1/3), got {}",
                self.min_separation_fraction
            )));
        }
        if self.max_samples == 0 {
            return Err(Error::InvalidParameter(
                "max_samples must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Minimum separation in samples for a series of `n` samples
    pub fn min_separation(&self, n: usize) -> usize {
        ((n as f64 * self.min_separation_fraction).floor() as usize).max(2)
    }
}

impl Default for ExhaustiveParameters {
    fn default() -> Self {
        Self {
            min_separation_fraction: 0.05,
            max_samples: 4000,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExhaustiveDetector {
    params: ExhaustiveParameters,
}

impl ExhaustiveDetector {
    pub fn new(params: ExhaustiveParameters) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    /// Best breakpoint pair and its total residual
    #[instrument(skip(self, sums), fields(n = sums.len()))]
    fn search(&self, sums: &SegmentSums) -> Result<((usize, usize), f64)> {
        let n = sums.len();
        if n > self.params.max_samples {
            return Err(Error::InvalidParameter(format!(
                "exhaustive search is limited to {} samples, got {n}; use penalized segmentation",
                self.params.max_samples
            )));
        }
        if n > ExhaustiveParameters::WARN_SAMPLES {
            warn!(
                "Exhaustive three-segment search over {} samples is O(n^2); consider penalized segmentation",
                n
            );
        }

        let min_sep = self.params.min_separation(n);
        if n <= 3 * min_sep {
            return Err(Error::InsufficientData {
                expected: 3 * min_sep + 1,
                actual: n,
            });
        }

        let mut best = ((0, 0), f64::INFINITY);
        for i in min_sep..n - 2 * min_sep {
            let head = sums.cost(0, i);
            for j in i + min_sep..n - min_sep {
                let total = head + sums.cost(i, j) + sums.cost(j, n);
                if total < best.1 {
                    best = ((i, j), total);
                }
            }
        }

        debug!(
            "Exhaustive search: best pair {:?} with residual {:.4} (min separation {})",
            best.0, best.1, min_sep
        );
        Ok(best)
    }
}

impl ChangePointDetectorProperties for ExhaustiveDetector {
    fn algorithm_name(&self) -> &'static str {
        "ExhaustiveThreeSegment"
    }

    fn minimum_sample_size(&self) -> usize {
        7
    }
}

impl BreakpointDetector for ExhaustiveDetector {
    fn detect_breakpoints(
        &self,
        axis: &[f64],
        curve: &[f64],
        n_breakpoints: usize,
    ) -> Result<SegmentationResult> {
        if n_breakpoints != 2 {
            return Err(Error::InvalidParameter(format!(
                "exhaustive search yields exactly 2 breakpoints, {n_breakpoints} requested"
            )));
        }

        let sums = SegmentSums::new(axis, curve)?;
        let ((i, j), total) = self.search(&sums)?;
        let fitted = refit_with(&sums, axis, curve, &[i, j])?;
        let search = ChangePointResult::new(
            vec![Breakpoint::at(axis, i), Breakpoint::at(axis, j)],
            self.algorithm_name().to_string(),
            curve.len(),
            total,
        );

        Ok(SegmentationResult {
            breakpoints: to_breakpoint_set(axis, &[i, j])?,
            fitted,
            search,
        })
    }
}

impl ConfigurableDetector for ExhaustiveDetector {
    type Parameters = ExhaustiveParameters;

    fn parameters(&self) -> &Self::Parameters {
        &self.params
    }

    fn set_parameters(&mut self, params: Self::Parameters) -> Result<()> {
        params.validate()?;
        self.params = params;
        Ok(())
    }
}
