//! Core types for SmO2 threshold analysis
//!
//! This crate holds the pieces every analysis stage shares:
//!
//! - [`Series`] / [`SeriesBuilder`]: validated measurement channels along a
//!   time or power axis
//! - [`Interpolator`]: piecewise-linear channel lookup with an explicit
//!   [`Extrapolation`] policy
//! - [`SegmentSums`]: prefix sums giving O(1) least-squares segment costs
//! - [`Error`]: the error taxonomy shared by all smo2 crates
//!
//! # Example
//!
//! ```rust
//! use smo2_core::{Domain, Extrapolation, Interpolator, SeriesBuilder};
//!
//! let series = SeriesBuilder::new(Domain::Power)
//!     .axis(vec![100.0, 150.0, 200.0])
//!     .smo2(vec![68.0, 60.0, 45.0])
//!     .heart_rate(vec![120.0, 140.0, 165.0])
//!     .build()
//!     .unwrap();
//!
//! let hr = Interpolator::new(series.axis(), series.heart_rate(), Extrapolation::Linear).unwrap();
//! assert_eq!(hr.at(175.0), 152.5);
//! ```

pub mod error;
pub mod interpolation;
pub mod regression;
pub mod series;

pub use error::{Error, Result};
pub use interpolation::{Extrapolation, Interpolator};
pub use regression::{fit_line, LineFit, Moments, SegmentSums};
pub use series::{Domain, Sample, Series, SeriesBuilder};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
