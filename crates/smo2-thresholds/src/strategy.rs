//! Threshold detection strategies
//!
//! Every strategy maps a smoothed SmO₂ curve to a [`BreakpointSet`] through
//! the same [`ThresholdDetectionStrategy`] interface. Which one runs is
//! chosen by [`StrategyConfig`]; none of them is canonical.

use serde::{Deserialize, Serialize};
use smo2_changepoint::{
    gradient, moving_average, steepest_decline, to_breakpoint_set, BreakpointDetector,
    BreakpointSet, ChangePointDetectorProperties, ExhaustiveDetector, ExhaustiveParameters, HingeFitter, HingeParameters,
    PeltDetector, PeltParameters, SecondThresholdPolicy, SlopeAnalyzer, SlopeParameters,
};
use smo2_core::{Error, Result};
use tracing::debug;

/// Breakpoints plus the model curve that produced them, if any
#[derive(Debug, Clone)]
pub struct Detection {
    pub breakpoints: BreakpointSet,
    /// Reconstructed curve for charting (segment refit or hinge)
    pub model: Option<Vec<f64>>,
    pub residual_ss: Option<f64>,
}

/// Locates threshold breakpoints on a smoothed curve
pub trait ThresholdDetectionStrategy {
    fn name(&self) -> &'static str;

    /// Largest breakpoint count the strategy can produce
    fn max_breakpoints(&self) -> usize {
        2
    }

    /// Fewest samples the strategy can place breakpoints in
    fn minimum_sample_size(&self) -> usize;

    fn detect(&self, axis: &[f64], curve: &[f64], n_breakpoints: usize) -> Result<Detection>;
}

fn check_count(strategy: &dyn ThresholdDetectionStrategy, n_breakpoints: usize) -> Result<()> {
    if n_breakpoints < BreakpointSet::MIN_LEN || n_breakpoints > strategy.max_breakpoints() {
        return Err(Error::InvalidParameter(format!(
            "{} produces {} to {} breakpoints, {n_breakpoints} requested",
            strategy.name(),
            BreakpointSet::MIN_LEN,
            strategy.max_breakpoints()
        )));
    }
    Ok(())
}

/// S1 and S2 from slope crossings of the smoothed curve
#[derive(Debug, Clone)]
pub struct SlopeCrossing {
    analyzer: SlopeAnalyzer,
}

impl SlopeCrossing {
    pub fn new(params: SlopeParameters) -> Result<Self> {
        Ok(Self {
            analyzer: SlopeAnalyzer::new(params)?,
        })
    }
}

impl ThresholdDetectionStrategy for SlopeCrossing {
    fn name(&self) -> &'static str {
        "slope_crossing"
    }

    fn minimum_sample_size(&self) -> usize {
        4
    }

    fn detect(&self, axis: &[f64], curve: &[f64], n_breakpoints: usize) -> Result<Detection> {
        check_count(self, n_breakpoints)?;
        let crossings = self.analyzer.analyze(axis, curve)?;
        Ok(Detection {
            breakpoints: to_breakpoint_set(axis, &[crossings.first, crossings.second])?,
            model: None,
            residual_ss: None,
        })
    }
}

/// Parameters of the piecewise-linear-fit strategy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PiecewiseFitParameters {
    /// Minimum samples on each side of the hinge knot
    pub min_segment_len: usize,
    /// Width of the moving average applied before differentiating for S2
    pub filter_width: usize,
    /// Tie tolerance for the flattest slope after the steepest decline
    pub tolerance: f64,
}

impl Default for PiecewiseFitParameters {
    fn default() -> Self {
        Self {
            min_segment_len: 5,
            filter_width: 3,
            tolerance: 1e-9,
        }
    }
}

/// S2 at the flattest slope past the steepest decline, S1 at the knot of a
/// hinge fitted to the curve up to S2
///
/// Up to S2 the curve is a plateau followed by the desaturation ramp, which is
/// exactly the two-segment shape the hinge describes. Past S2 the model holds
/// the hinge value at S2.
#[derive(Debug, Clone)]
pub struct PiecewiseLinearFit {
    params: PiecewiseFitParameters,
    fitter: HingeFitter,
    slopes: SlopeAnalyzer,
}

impl PiecewiseLinearFit {
    pub fn new(params: PiecewiseFitParameters) -> Result<Self> {
        if params.filter_width == 0 || params.filter_width % 2 == 0 {
            return Err(Error::InvalidParameter(format!(
                "filter width must be odd, got {}",
                params.filter_width
            )));
        }
        let fitter = HingeFitter::new(HingeParameters {
            min_segment_len: params.min_segment_len,
        })?;
        let slopes = SlopeAnalyzer::new(SlopeParameters {
            second: SecondThresholdPolicy::FlattestPoint {
                tolerance: params.tolerance,
            },
            ..Default::default()
        })?;
        Ok(Self {
            params,
            fitter,
            slopes,
        })
    }
}

impl ThresholdDetectionStrategy for PiecewiseLinearFit {
    fn name(&self) -> &'static str {
        "piecewise_linear_fit"
    }

    fn minimum_sample_size(&self) -> usize {
        // the hinge range ends at S2, which is never the last sample
        self.fitter.minimum_sample_size() + 1
    }

    fn detect(&self, axis: &[f64], curve: &[f64], n_breakpoints: usize) -> Result<Detection> {
        check_count(self, n_breakpoints)?;
        let filtered = moving_average(curve, self.params.filter_width)?;
        let slopes = gradient(axis, &filtered)?;
        let steepest = steepest_decline(&slopes)?;
        let second = self.slopes.second_threshold(&slopes, steepest)?;

        let hinge = self.fitter.fit(&axis[..=second], &curve[..=second])?;
        let knot = hinge.knot_index;
        debug!(
            "Steepest decline at index {}, plateau at {}, hinge knot at {}",
            steepest, second, knot
        );

        let plateau = hinge.eval(axis[second]);
        let model: Vec<f64> = axis
            .iter()
            .enumerate()
            .map(|(i, &x)| if i <= second { hinge.eval(x) } else { plateau })
            .collect();
        let residual_ss = model
            .iter()
            .zip(curve)
            .map(|(m, c)| (m - c).powi(2))
            .sum::<f64>();

        Ok(Detection {
            breakpoints: to_breakpoint_set(axis, &[knot, second])?,
            model: Some(model),
            residual_ss: Some(residual_ss),
        })
    }
}

/// Breakpoints from PELT with a segment refit
#[derive(Debug, Clone)]
pub struct PenalizedSegmentation {
    detector: PeltDetector,
}

impl PenalizedSegmentation {
    pub fn new(params: PeltParameters) -> Result<Self> {
        Ok(Self {
            detector: PeltDetector::new(params)?,
        })
    }
}

impl ThresholdDetectionStrategy for PenalizedSegmentation {
    fn name(&self) -> &'static str {
        "penalized_segmentation"
    }

    fn minimum_sample_size(&self) -> usize {
        self.detector.minimum_sample_size()
    }

    fn max_breakpoints(&self) -> usize {
        BreakpointSet::MAX_LEN
    }

    fn detect(&self, axis: &[f64], curve: &[f64], n_breakpoints: usize) -> Result<Detection> {
        check_count(self, n_breakpoints)?;
        let result = self.detector.detect_breakpoints(axis, curve, n_breakpoints)?;
        let residual_ss = result.fitted.residual_ss();
        Ok(Detection {
            breakpoints: result.breakpoints,
            model: Some(result.fitted.values().to_vec()),
            residual_ss: Some(residual_ss),
        })
    }
}

/// Best three-segment split by brute force
#[derive(Debug, Clone)]
pub struct ExhaustiveThreeSegment {
    detector: ExhaustiveDetector,
}

impl ExhaustiveThreeSegment {
    pub fn new(params: ExhaustiveParameters) -> Result<Self> {
        Ok(Self {
            detector: ExhaustiveDetector::new(params)?,
        })
    }
}

impl ThresholdDetectionStrategy for ExhaustiveThreeSegment {
    fn name(&self) -> &'static str {
        "exhaustive_three_segment"
    }

    fn minimum_sample_size(&self) -> usize {
        self.detector.minimum_sample_size()
    }

    fn detect(&self, axis: &[f64], curve: &[f64], n_breakpoints: usize) -> Result<Detection> {
        check_count(self, n_breakpoints)?;
        let result = self.detector.detect_breakpoints(axis, curve, n_breakpoints)?;
        let residual_ss = result.fitted.residual_ss();
        Ok(Detection {
            breakpoints: result.breakpoints,
            model: Some(result.fitted.values().to_vec()),
            residual_ss: Some(residual_ss),
        })
    }
}

/// Serializable strategy selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyConfig {
    SlopeCrossing(SlopeParameters),
    PiecewiseLinearFit(PiecewiseFitParameters),
    PenalizedSegmentation(PeltParameters),
    ExhaustiveThreeSegment(ExhaustiveParameters),
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self::PenalizedSegmentation(PeltParameters::default())
    }
}

impl StrategyConfig {
    /// Instantiate the configured strategy, validating its parameters
    pub fn build(&self) -> Result<Box<dyn ThresholdDetectionStrategy>> {
        Ok(match self {
            Self::SlopeCrossing(p) => Box::new(SlopeCrossing::new(*p)?),
            Self::PiecewiseLinearFit(p) => Box::new(PiecewiseLinearFit::new(*p)?),
            Self::PenalizedSegmentation(p) => Box::new(PenalizedSegmentation::new(*p)?),
            Self::ExhaustiveThreeSegment(p) => Box::new(ExhaustiveThreeSegment::new(*p)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> (Vec<f64>, Vec<f64>) {
        let axis: Vec<f64> = (0..200).map(|i| 100.0 + i as f64).collect();
        let curve = axis
            .iter()
            .map(|&w| match w {
                w if w < 150.0 => 68.0,
                w if w < 250.0 => 68.0 - 0.3 * (w - 150.0),
                _ => 38.0,
            })
            .collect();
        (axis, curve)
    }

    #[test]
    fn test_every_strategy_builds_and_detects_two() {
        let (axis, curve) = ramp();
        let configs = [
            StrategyConfig::SlopeCrossing(SlopeParameters::default()),
            StrategyConfig::PiecewiseLinearFit(PiecewiseFitParameters::default()),
            StrategyConfig::PenalizedSegmentation(PeltParameters::default()),
            StrategyConfig::ExhaustiveThreeSegment(ExhaustiveParameters::default()),
        ];
        for config in &configs {
            let strategy = config.build().unwrap();
            let detection = strategy.detect(&axis, &curve, 2).unwrap();
            let indices = detection.breakpoints.indices();
            assert_eq!(indices.len(), 2, "{}", strategy.name());
            assert!(indices[0] < indices[1], "{}", strategy.name());
        }
    }

    #[test]
    fn test_three_breakpoints_only_from_segmentation() {
        let (axis, curve) = ramp();
        let slope = StrategyConfig::SlopeCrossing(SlopeParameters::default())
            .build()
            .unwrap();
        assert!(matches!(
            slope.detect(&axis, &curve, 3),
            Err(Error::InvalidParameter(_))
        ));
        assert_eq!(StrategyConfig::default().build().unwrap().max_breakpoints(), 3);
    }

    #[test]
    fn test_minimum_sample_sizes() {
        let piecewise = StrategyConfig::PiecewiseLinearFit(PiecewiseFitParameters::default());
        assert_eq!(piecewise.build().unwrap().minimum_sample_size(), 11);
        assert_eq!(StrategyConfig::default().build().unwrap().minimum_sample_size(), 10);
        let exhaustive = StrategyConfig::ExhaustiveThreeSegment(ExhaustiveParameters::default());
        assert_eq!(exhaustive.build().unwrap().minimum_sample_size(), 7);
    }

    #[test]
    fn test_hinge_fitted_up_to_the_plateau() {
        let (axis, curve) = ramp();
        let strategy = PiecewiseLinearFit::new(PiecewiseFitParameters::default()).unwrap();
        let detection = strategy.detect(&axis, &curve, 2).unwrap();
        let indices = detection.breakpoints.indices();

        // decline from 150 to 250 on a unit axis starting at 100
        assert_eq!(indices[0], 50);
        assert!((150..=153).contains(&indices[1]), "S2 at {}", indices[1]);

        let model = detection.model.unwrap();
        assert_eq!(model.len(), axis.len());
        assert!((model[0] - 68.0).abs() < 0.1);
        assert_eq!(model[indices[1] + 1], model[axis.len() - 1]);
    }

    #[test]
    fn test_curve_without_decline_has_no_threshold() {
        let axis: Vec<f64> = (0..50).map(|i| i as f64).collect();
        let strategy = PiecewiseLinearFit::new(PiecewiseFitParameters::default()).unwrap();
        assert!(matches!(
            strategy.detect(&axis, &vec![60.0; 50], 2),
            Err(Error::NoThresholdFound { .. })
        ));
    }

    #[test]
    fn test_invalid_filter_width() {
        let params = PiecewiseFitParameters {
            filter_width: 4,
            ..Default::default()
        };
        assert!(PiecewiseLinearFit::new(params).is_err());
    }
}
