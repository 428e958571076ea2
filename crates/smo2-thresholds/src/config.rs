//! Analysis configuration
//!
//! [`AnalysisConfig`] gathers every tunable of the pipeline. All fields have
//! defaults, so a JSON document only needs the ones it changes:
//!
//! ```json
//! {
//!   "domain": "time",
//!   "strategy": { "kind": "penalized_segmentation", "penalty": 8.0 },
//!   "pma": { "method": "from_breakpoint" }
//! }
//! ```

use crate::resolver::PmaPolicy;
use crate::strategy::{StrategyConfig, ThresholdDetectionStrategy};
use crate::zones::ZoneScheme;
use serde::{Deserialize, Serialize};
use smo2_changepoint::SavitzkyGolayParameters;
use smo2_core::{Domain, Error, Extrapolation, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Domain the input series is expected to be indexed by
    pub domain: Domain,
    pub smoothing: SavitzkyGolayParameters,
    pub strategy: StrategyConfig,
    pub pma: PmaPolicy,
    pub zones: ZoneScheme,
    pub extrapolation: Extrapolation,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            domain: Domain::Power,
            smoothing: SavitzkyGolayParameters::default(),
            strategy: StrategyConfig::default(),
            pma: PmaPolicy::default(),
            zones: ZoneScheme::default(),
            extrapolation: Extrapolation::default(),
        }
    }
}

impl AnalysisConfig {
    /// Default configuration for a time-domain test with PMA taken from the
    /// third breakpoint
    pub fn time_domain() -> Self {
        Self {
            domain: Domain::Time,
            pma: PmaPolicy::FromBreakpoint,
            ..Default::default()
        }
    }

    /// Number of breakpoints the strategy has to deliver
    pub fn breakpoint_count(&self) -> usize {
        match self.pma {
            PmaPolicy::FromBreakpoint => 3,
            PmaPolicy::MaxSustainedPower { .. } => 2,
        }
    }

    /// Reject inconsistent combinations before any data is touched
    pub fn validate(&self) -> Result<()> {
        self.build_strategy().map(|_| ())
    }

    /// Validate the whole configuration and instantiate its strategy
    pub fn build_strategy(&self) -> Result<Box<dyn ThresholdDetectionStrategy>> {
        self.smoothing.validate()?;
        let strategy = self.strategy.build()?;

        match self.pma {
            PmaPolicy::FromBreakpoint => {
                if self.domain != Domain::Time {
                    return Err(Error::InvalidParameter(
                        "PMA from a breakpoint is only defined for time-domain series".to_string(),
                    ));
                }
                if strategy.max_breakpoints() < self.breakpoint_count() {
                    return Err(Error::InvalidParameter(format!(
                        "strategy {} yields at most {} breakpoints; PMA from a breakpoint needs {}",
                        strategy.name(),
                        strategy.max_breakpoints(),
                        self.breakpoint_count()
                    )));
                }
            }
            PmaPolicy::MaxSustainedPower { window } => {
                if window == 0 {
                    return Err(Error::InvalidParameter(
                        "PMA window must hold at least one sample".to_string(),
                    ));
                }
            }
        }
        Ok(strategy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smo2_changepoint::{PeltParameters, SlopeParameters};

    #[test]
    fn test_defaults_validate() {
        assert!(AnalysisConfig::default().validate().is_ok());
        assert!(AnalysisConfig::time_domain().validate().is_ok());
        assert_eq!(AnalysisConfig::time_domain().breakpoint_count(), 3);
    }

    #[test]
    fn test_build_strategy_matches_config() {
        let config = AnalysisConfig {
            strategy: StrategyConfig::SlopeCrossing(SlopeParameters::default()),
            ..Default::default()
        };
        assert_eq!(config.build_strategy().unwrap().name(), "slope_crossing");
        assert_eq!(
            AnalysisConfig::default().build_strategy().unwrap().name(),
            "penalized_segmentation"
        );

        let mut invalid = AnalysisConfig::default();
        invalid.smoothing.window_length = 4;
        assert!(invalid.build_strategy().is_err());
    }

    #[test]
    fn test_rejects_even_window() {
        let mut config = AnalysisConfig::default();
        config.smoothing.window_length = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_non_positive_penalty() {
        let config = AnalysisConfig {
            strategy: StrategyConfig::PenalizedSegmentation(PeltParameters {
                penalty: -1.0,
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn test_pma_from_breakpoint_needs_three_breakpoint_strategy() {
        let config = AnalysisConfig {
            strategy: StrategyConfig::SlopeCrossing(SlopeParameters::default()),
            ..AnalysisConfig::time_domain()
        };
        assert!(config.validate().is_err());

        let config = AnalysisConfig {
            domain: Domain::Power,
            ..AnalysisConfig::time_domain()
        };
        assert!(config.validate().is_err());
    }
}
