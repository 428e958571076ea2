//! Core traits for change-point detection
//!
//! Detectors work on a curve sampled along a domain axis. They expose their
//! name and minimum input size through [`ChangePointDetectorProperties`] and
//! their tunables through [`ConfigurableDetector`].

use crate::types::SegmentationResult;
use smo2_core::Result;

/// Properties of a detector that don't depend on the data
pub trait ChangePointDetectorProperties {
    /// Name of the detection algorithm
    fn algorithm_name(&self) -> &'static str;

    /// Minimum number of samples the detector can work with
    fn minimum_sample_size(&self) -> usize;
}

/// Detectors producing an exact number of breakpoints plus a segment refit
pub trait BreakpointDetector: ChangePointDetectorProperties {
    /// Detect exactly `n_breakpoints` breakpoints in `curve` against `axis`
    ///
    /// Fails with `InsufficientBreakpoints` when the search yields fewer.
    fn detect_breakpoints(
        &self,
        axis: &[f64],
        curve: &[f64],
        n_breakpoints: usize,
    ) -> Result<SegmentationResult>;
}

/// Runtime access to a detector's parameters
pub trait ConfigurableDetector {
    type Parameters;

    fn parameters(&self) -> &Self::Parameters;
    fn set_parameters(&mut self, params: Self::Parameters) -> Result<()>;
}
