//! # smo2-analysis
//!
//! Muscle oxygen saturation (SmO₂) threshold detection for incremental
//! exercise tests.
//!
//! The toolkit is split into focused crates:
//!
//! - [`core`]: series model, errors, interpolation and segment regression
//! - [`changepoint`]: smoothing, slope analysis and breakpoint search
//! - [`thresholds`]: S1/S2/PMA resolution, training zones and the pipeline
//!
//! ## Quick start
//!
//! ```rust
//! use smo2_analysis::prelude::*;
//!
//! let power: Vec<f64> = (0..500).map(|i| i as f64 * 0.6).collect();
//! let smo2 = power
//!     .iter()
//!     .map(|&w| 70.0 - 0.5 * (w - 140.0).clamp(0.0, 80.0))
//!     .collect();
//! let heart_rate = power.iter().map(|&w| 72.0 + 0.4 * w).collect();
//!
//! let series = SeriesBuilder::new(Domain::Power)
//!     .axis(power)
//!     .smo2(smo2)
//!     .heart_rate(heart_rate)
//!     .build()
//!     .unwrap();
//!
//! let report = analyze(&series, &AnalysisConfig::default()).unwrap();
//! assert_eq!(report.zones.len(), 5);
//! ```

pub use smo2_changepoint as changepoint;
pub use smo2_core as core;
pub use smo2_thresholds as thresholds;

/// Commonly used types for running an analysis
pub mod prelude {
    pub use smo2_core::{Domain, Error, Extrapolation, Result, Series, SeriesBuilder};

    pub use smo2_changepoint::{
        ExhaustiveParameters, PeltParameters, SavitzkyGolayParameters, SecondThresholdPolicy,
        SlopeParameters, TruncationPolicy,
    };

    pub use smo2_thresholds::{
        analyze, AnalysisConfig, AnalysisReport, PiecewiseFitParameters, PmaPolicy,
        RenderContext, ReportRenderer, StrategyConfig, TextSummary, Threshold, ThresholdLabel,
        Zone, ZoneScheme,
    };
}
