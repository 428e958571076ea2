//! SmO₂ threshold detection and training zones
//!
//! Combines the smoothing and segmentation stages of `smo2-changepoint` into
//! the full analysis of an incremental exercise test:
//!
//! 1. smooth the SmO₂ channel
//! 2. locate breakpoints with the configured [`ThresholdDetectionStrategy`]
//! 3. resolve S1, S2 and PMA with interpolated companion readings
//! 4. derive training zones
//!
//! ## Usage
//!
//! ```rust
//! use smo2_core::{Domain, SeriesBuilder};
//! use smo2_thresholds::{analyze, AnalysisConfig};
//!
//! let power: Vec<f64> = (0..600).map(|i| i as f64 * 0.5).collect();
//! let smo2 = power
//!     .iter()
//!     .map(|&w| match w {
//!         w if w < 150.0 => 70.0,
//!         w if w < 220.0 => 70.0 - 40.0 * (w - 150.0) / 70.0,
//!         _ => 30.0,
//!     })
//!     .collect();
//! let heart_rate = power.iter().map(|&w| 70.0 + 0.4 * w).collect();
//!
//! let series = SeriesBuilder::new(Domain::Power)
//!     .axis(power)
//!     .smo2(smo2)
//!     .heart_rate(heart_rate)
//!     .build()
//!     .unwrap();
//!
//! let report = analyze(&series, &AnalysisConfig::default()).unwrap();
//! println!("S1 at {:?} W", report.thresholds.s1.power());
//! ```

pub mod analysis;
pub mod config;
pub mod render;
pub mod resolver;
pub mod strategy;
pub mod zones;

pub use analysis::{analyze, AnalysisReport};
pub use config::AnalysisConfig;
pub use render::{NullReportRenderer, RenderContext, ReportRenderer, TextSummary};
pub use resolver::{PmaPolicy, Threshold, ThresholdLabel, ThresholdResolver, ThresholdSet};
pub use strategy::{
    Detection, ExhaustiveThreeSegment, PenalizedSegmentation, PiecewiseFitParameters,
    PiecewiseLinearFit, SlopeCrossing, StrategyConfig, ThresholdDetectionStrategy,
};
pub use zones::{Bounds, HeartRateRange, Zone, ZoneCalculator, ZoneScheme};
