//! Smoothing and change-point detection for SmO₂ curves
//!
//! This crate turns a noisy muscle-oxygenation curve into a small set of
//! breakpoints. Everything operates on a curve sampled along a strictly
//! increasing domain axis (elapsed time or power).
//!
//! # Stages
//!
//! - **Smoothing**: Savitzky-Golay filter with polynomial boundary fits
//! - **Slopes**: non-uniform gradient and slope-crossing threshold location
//! - **Segmentation**:
//!   - [`PeltDetector`]: penalized segmentation with a linear-regression cost
//!   - [`ExhaustiveDetector`]: every admissible three-segment split, O(n²)
//!   - [`HingeFitter`]: continuous two-segment fit over all sample knots
//!
//! ## Usage
//!
//! ```rust
//! use smo2_changepoint::{smooth, BreakpointDetector, PeltDetector};
//!
//! let axis: Vec<f64> = (0..300).map(|i| i as f64).collect();
//! let raw: Vec<f64> = axis
//!     .iter()
//!     .map(|&x| match x {
//!         x if x < 100.0 => 70.0,
//!         x if x < 200.0 => 70.0 - 0.4 * (x - 100.0),
//!         _ => 30.0,
//!     })
//!     .collect();
//!
//! let curve = smooth(&raw).unwrap();
//! let result = PeltDetector::default().detect_breakpoints(&axis, &curve, 2).unwrap();
//! println!("Breakpoints: {:?}", result.breakpoints.indices());
//! ```

pub mod exhaustive;
pub mod hinge;
pub mod kernel;
pub mod pelt;
pub mod segmentation;
pub mod slopes;
pub mod smoothing;
pub mod traits;
pub mod types;

pub use exhaustive::{ExhaustiveDetector, ExhaustiveParameters};
pub use hinge::{HingeFitter, HingeModel, HingeParameters};
pub use pelt::{PeltDetector, PeltParameters};
pub use segmentation::{reconcile, refit, to_breakpoint_set, TruncationPolicy};
pub use slopes::{
    gradient, steepest_decline, SecondThresholdPolicy, SlopeAnalyzer, SlopeCrossings,
    SlopeParameters,
};
pub use smoothing::{moving_average, smooth, SavitzkyGolay, SavitzkyGolayParameters};

pub use traits::{BreakpointDetector, ChangePointDetectorProperties, ConfigurableDetector};

pub use kernel::{PolynomialKernel, WindowKernel};

pub use types::{
    Breakpoint, BreakpointSet, ChangePointResult, FittedCurve, SegmentFit, SegmentationResult,
};
