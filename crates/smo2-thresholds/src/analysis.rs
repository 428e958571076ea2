//! The end-to-end analysis pipeline
//!
//! raw series → smoothing → strategy → threshold resolution → zones

use crate::config::AnalysisConfig;
use crate::resolver::{ThresholdResolver, ThresholdSet};
use crate::zones::{Zone, ZoneCalculator};
use smo2_changepoint::{BreakpointSet, SavitzkyGolay};
use smo2_core::{Domain, Error, Result, Series};
use tracing::{debug, instrument};

/// Everything a renderer needs
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub domain: Domain,
    /// Name of the strategy that produced the breakpoints
    pub strategy: &'static str,
    pub axis: Vec<f64>,
    pub smoothed: Vec<f64>,
    /// Model reconstruction, for strategies that fit one
    pub model: Option<Vec<f64>>,
    pub breakpoints: BreakpointSet,
    pub thresholds: ThresholdSet,
    pub zones: Vec<Zone>,
}

/// Run the full analysis of `series` under `config`
#[instrument(skip(series, config), fields(n = series.len(), domain = %series.domain()))]
pub fn analyze(series: &Series, config: &AnalysisConfig) -> Result<AnalysisReport> {
    let strategy = config.build_strategy()?;
    if series.domain() != config.domain {
        return Err(Error::InvalidInput(format!(
            "series is indexed by {} but the configuration expects {}",
            series.domain(),
            config.domain
        )));
    }

    let smoothed = SavitzkyGolay::new(config.smoothing)?.smooth(series.smo2())?;

    if series.len() < strategy.minimum_sample_size() {
        return Err(Error::InsufficientData {
            expected: strategy.minimum_sample_size(),
            actual: series.len(),
        });
    }
    let detection = strategy.detect(series.axis(), &smoothed, config.breakpoint_count())?;
    debug!(
        "{} placed breakpoints at {:?}",
        strategy.name(),
        detection.breakpoints.indices()
    );

    let resolver = ThresholdResolver::new(config.pma, config.extrapolation)?;
    let thresholds = resolver.resolve(series, &smoothed, &detection.breakpoints)?;

    let zones = ZoneCalculator::new(config.zones, config.extrapolation).compute_zones(
        series,
        thresholds.s1.position(),
        thresholds.s2.position(),
    )?;

    Ok(AnalysisReport {
        domain: series.domain(),
        strategy: strategy.name(),
        axis: series.axis().to_vec(),
        smoothed,
        model: detection.model,
        breakpoints: detection.breakpoints,
        thresholds,
        zones,
    })
}
