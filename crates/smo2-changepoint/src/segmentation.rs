//! Reconciling candidate breakpoints and refitting segments
//!
//! Search algorithms rarely return exactly the number of breakpoints a caller
//! asks for. [`reconcile`] applies an explicit [`TruncationPolicy`] when there
//! are too many and fails when there are too few. [`refit`] then fits an
//! independent least-squares line per segment.

use crate::types::{Breakpoint, BreakpointSet, FittedCurve, SegmentFit};
use serde::{Deserialize, Serialize};
use smo2_core::{Error, LineFit, Result, SegmentSums};
use tracing::warn;

/// How excess candidates are reduced to the requested count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TruncationPolicy {
    /// Keep the first `n` candidates in index order
    #[default]
    KeepFirst,
    /// Keep the `n`-subset of candidates with the lowest refit residual
    BestFit,
}

/// Reduce `candidates` to exactly `n_breakpoints` indices
///
/// `sums` must be built over the curve being segmented.
pub fn reconcile(
    candidates: &[usize],
    n_breakpoints: usize,
    policy: TruncationPolicy,
    sums: &SegmentSums,
) -> Result<Vec<usize>> {
    if candidates.len() < n_breakpoints {
        return Err(Error::InsufficientBreakpoints {
            expected: n_breakpoints,
            detected: candidates.len(),
        });
    }
    if candidates.len() == n_breakpoints {
        return Ok(candidates.to_vec());
    }

    warn!(
        "Search returned {} candidates for {} requested breakpoints; applying {:?}",
        candidates.len(),
        n_breakpoints,
        policy
    );

    match policy {
        TruncationPolicy::KeepFirst => Ok(candidates[..n_breakpoints].to_vec()),
        TruncationPolicy::BestFit => Ok(best_subset(candidates, n_breakpoints, sums)),
    }
}

/// Dynamic programme over candidate subsets minimising the total segment cost
fn best_subset(candidates: &[usize], k: usize, sums: &SegmentSums) -> Vec<usize> {
    let m = candidates.len();
    let n = sums.len();
    if k == 0 {
        return vec![];
    }

    // cost[level][j]: best cost of [0, candidates[j]) using level+1 breakpoints,
    // the last of which is candidates[j]
    let mut cost = vec![vec![f64::INFINITY; m]; k];
    let mut prev = vec![vec![usize::MAX; m]; k];

    for j in 0..m {
        cost[0][j] = sums.cost(0, candidates[j]);
    }
    for level in 1..k {
        for j in level..m {
            for i in (level - 1)..j {
                let c = cost[level - 1][i] + sums.cost(candidates[i], candidates[j]);
                if c < cost[level][j] {
                    cost[level][j] = c;
                    prev[level][j] = i;
                }
            }
        }
    }

    let mut best = (f64::INFINITY, k - 1);
    for j in (k - 1)..m {
        let c = cost[k - 1][j] + sums.cost(candidates[j], n);
        if c < best.0 {
            best = (c, j);
        }
    }

    let mut chosen = Vec::with_capacity(k);
    let mut j = best.1;
    for level in (0..k).rev() {
        chosen.push(candidates[j]);
        if level > 0 {
            j = prev[level][j];
        }
    }
    chosen.reverse();
    chosen
}

/// Fit one least-squares line per segment delimited by `breakpoints`
pub fn refit(axis: &[f64], curve: &[f64], breakpoints: &[usize]) -> Result<FittedCurve> {
    let sums = SegmentSums::new(axis, curve)?;
    refit_with(&sums, axis, curve, breakpoints)
}

pub(crate) fn refit_with(
    sums: &SegmentSums,
    axis: &[f64],
    curve: &[f64],
    breakpoints: &[usize],
) -> Result<FittedCurve> {
    let n = curve.len();
    let mut bounds = Vec::with_capacity(breakpoints.len() + 2);
    bounds.push(0);
    bounds.extend_from_slice(breakpoints);
    bounds.push(n);

    let mut values = vec![0.0; n];
    let mut segments = Vec::with_capacity(bounds.len() - 1);
    let mut residual_ss = 0.0;

    for w in bounds.windows(2) {
        let (start, end) = (w[0], w[1]);
        let line = if end - start >= 2 {
            sums.fit(start, end)?
        } else {
            LineFit {
                slope: 0.0,
                intercept: curve[start],
            }
        };
        for i in start..end {
            values[i] = line.eval(axis[i]);
            residual_ss += (curve[i] - values[i]).powi(2);
        }
        segments.push(SegmentFit { start, end, line });
    }

    Ok(FittedCurve::new(values, segments, residual_ss))
}

/// Wrap reconciled indices into a validated [`BreakpointSet`]
pub fn to_breakpoint_set(axis: &[f64], indices: &[usize]) -> Result<BreakpointSet> {
    let breakpoints = indices.iter().map(|&i| Breakpoint::at(axis, i)).collect();
    BreakpointSet::new(breakpoints, axis.len())
}
