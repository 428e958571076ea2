//! Mapping breakpoints to labelled thresholds
//!
//! S1 and S2 take their companion readings from piecewise-linear
//! interpolation at the exact breakpoint position. PMA either comes from a
//! third time-domain breakpoint or from the window of highest mean power.

use serde::{Deserialize, Serialize};
use smo2_changepoint::kernel::mean;
use smo2_changepoint::{BreakpointSet, WindowKernel};
use smo2_core::{Domain, Error, Extrapolation, Interpolator, Result, Series};
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThresholdLabel {
    S1,
    S2,
    #[serde(rename = "PMA")]
    Pma,
}

impl fmt::Display for ThresholdLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ThresholdLabel::S1 => "S1",
            ThresholdLabel::S2 => "S2",
            ThresholdLabel::Pma => "PMA",
        };
        f.write_str(label)
    }
}

/// A resolved threshold with its companion readings
///
/// `power` is `None` only for time-domain series recorded without a power
/// channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    label: ThresholdLabel,
    position: f64,
    power: Option<i32>,
    heart_rate: i32,
    smo2: f64,
}

impl Threshold {
    pub fn new(
        label: ThresholdLabel,
        position: f64,
        power: Option<i32>,
        heart_rate: i32,
        smo2: f64,
    ) -> Self {
        Self {
            label,
            position,
            power,
            heart_rate,
            smo2,
        }
    }

    pub fn label(&self) -> ThresholdLabel {
        self.label
    }

    /// Position on the domain axis (seconds or watts)
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Power in watts, rounded
    pub fn power(&self) -> Option<i32> {
        self.power
    }

    /// Heart rate in bpm, rounded
    pub fn heart_rate(&self) -> i32 {
        self.heart_rate
    }

    pub fn smo2(&self) -> f64 {
        self.smo2
    }

    /// Power relative to body mass
    pub fn watts_per_kg(&self, body_mass_kg: f64) -> Result<f64> {
        validate_mass(body_mass_kg)?;
        let power = self.power.ok_or_else(|| Error::missing_channel("power"))?;
        Ok(f64::from(power) / body_mass_kg)
    }
}

pub(crate) fn validate_mass(body_mass_kg: f64) -> Result<()> {
    if !(body_mass_kg.is_finite() && body_mass_kg > 0.0) {
        return Err(Error::InvalidParameter(format!(
            "body mass must be positive, got {body_mass_kg}"
        )));
    }
    Ok(())
}

/// How PMA is located
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum PmaPolicy {
    /// Third breakpoint of a time-domain detection
    FromBreakpoint,
    /// Window of `window` samples with the highest mean power
    MaxSustainedPower { window: usize },
}

impl Default for PmaPolicy {
    fn default() -> Self {
        Self::MaxSustainedPower { window: 3 }
    }
}

/// S1, S2 and PMA
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSet {
    pub s1: Threshold,
    pub s2: Threshold,
    pub pma: Threshold,
}

impl ThresholdSet {
    pub fn iter(&self) -> impl Iterator<Item = &Threshold> {
        [&self.s1, &self.s2, &self.pma].into_iter()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ThresholdResolver {
    pma: PmaPolicy,
    extrapolation: Extrapolation,
}

impl ThresholdResolver {
    pub fn new(pma: PmaPolicy, extrapolation: Extrapolation) -> Result<Self> {
        if let PmaPolicy::MaxSustainedPower { window: 0 } = pma {
            return Err(Error::InvalidParameter(
                "PMA window must hold at least one sample".to_string(),
            ));
        }
        Ok(Self { pma, extrapolation })
    }

    /// Resolve all three thresholds
    ///
    /// `curve` is the smoothed SmO₂ the breakpoints were detected on.
    pub fn resolve(
        &self,
        series: &Series,
        curve: &[f64],
        breakpoints: &BreakpointSet,
    ) -> Result<ThresholdSet> {
        if curve.len() != series.len() {
            return Err(Error::size_mismatch(series.len(), curve.len(), "smoothed curve"));
        }
        let position = |i: usize| {
            breakpoints
                .get(i)
                .map(|bp| bp.position)
                .ok_or(Error::InsufficientBreakpoints {
                    expected: i + 1,
                    detected: breakpoints.len(),
                })
        };

        let s1 = self.at_position(ThresholdLabel::S1, series, curve, position(0)?)?;
        let s2 = self.at_position(ThresholdLabel::S2, series, curve, position(1)?)?;

        let pma = match self.pma {
            PmaPolicy::FromBreakpoint => {
                if series.domain() != Domain::Time {
                    return Err(Error::InvalidParameter(
                        "PMA from a breakpoint requires a time-domain series".to_string(),
                    ));
                }
                self.at_position(ThresholdLabel::Pma, series, curve, position(2)?)?
            }
            PmaPolicy::MaxSustainedPower { window } => self.max_sustained_power(series, window)?,
        };

        debug!(
            "Resolved S1 at {:.1}, S2 at {:.1}, PMA at {:.1} {}",
            s1.position,
            s2.position,
            pma.position,
            series.domain().unit()
        );
        Ok(ThresholdSet { s1, s2, pma })
    }

    /// Threshold with readings interpolated at `position`
    pub fn at_position(
        &self,
        label: ThresholdLabel,
        series: &Series,
        curve: &[f64],
        position: f64,
    ) -> Result<Threshold> {
        let axis = series.axis();
        let heart_rate = Interpolator::new(axis, series.heart_rate(), self.extrapolation)?.at(position);
        let smo2 = Interpolator::new(axis, curve, self.extrapolation)?.at(position);
        let power = match series.power() {
            Some(power) => Some(Interpolator::new(axis, power, self.extrapolation)?.at(position)),
            None => None,
        };

        Ok(Threshold::new(
            label,
            position,
            power.map(round),
            round(heart_rate),
            smo2,
        ))
    }

    /// PMA from the `window`-sample stretch with the highest mean power
    ///
    /// Heart rate is the window maximum, SmO₂ the window mean of the raw
    /// channel, position the mean axis value over the window.
    pub fn max_sustained_power(&self, series: &Series, window: usize) -> Result<Threshold> {
        let power = series.require_power()?;
        if window == 0 || window > power.len() {
            return Err(Error::InsufficientData {
                expected: window.max(1),
                actual: power.len(),
            });
        }

        let (start, mean_power) = WindowKernel::new(window)
            .argmax_window(power, mean)
            .ok_or_else(|| Error::Computation("no power window to evaluate".to_string()))?;
        let range = start..start + window;

        let heart_rate = series.heart_rate()[range.clone()]
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        let smo2 = mean(&series.smo2()[range.clone()]);
        let position = mean(&series.axis()[range]);

        Ok(Threshold::new(
            ThresholdLabel::Pma,
            position,
            Some(round(mean_power)),
            round(heart_rate),
            smo2,
        ))
    }
}

/// Nearest integer, also for heart rate
fn round(value: f64) -> i32 {
    value.round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use smo2_changepoint::Breakpoint;
    use smo2_core::SeriesBuilder;

    fn power_series() -> Series {
        let power: Vec<f64> = (0..20).map(|i| 100.0 + 10.0 * i as f64).collect();
        let smo2 = power.iter().map(|p| 80.0 - 0.1 * p).collect();
        let hr = power.iter().map(|p| 60.0 + 0.4 * p).collect();
        SeriesBuilder::new(Domain::Power)
            .axis(power)
            .smo2(smo2)
            .heart_rate(hr)
            .build()
            .unwrap()
    }

    fn breakpoints(series: &Series, indices: &[usize]) -> BreakpointSet {
        let bps = indices
            .iter()
            .map(|&i| Breakpoint::at(series.axis(), i))
            .collect();
        BreakpointSet::new(bps, series.len()).unwrap()
    }

    #[test]
    fn test_power_domain_resolution() {
        let series = power_series();
        let curve = series.smo2().to_vec();
        let set = ThresholdResolver::default()
            .resolve(&series, &curve, &breakpoints(&series, &[5, 12]))
            .unwrap();

        assert_eq!(set.s1.power(), Some(150));
        assert_eq!(set.s1.heart_rate(), 120);
        assert_relative_eq!(set.s1.smo2(), 65.0, epsilon = 1e-9);
        assert_eq!(set.s2.power(), Some(220));

        // last three samples: 270, 280, 290 W
        assert_eq!(set.pma.label(), ThresholdLabel::Pma);
        assert_eq!(set.pma.power(), Some(280));
        assert_eq!(set.pma.heart_rate(), 176);
        assert_relative_eq!(set.pma.position(), 280.0);
        assert_relative_eq!(set.pma.smo2(), 52.0, epsilon = 1e-9);
    }

    #[test]
    fn test_interpolation_between_samples() {
        let series = power_series();
        let threshold = ThresholdResolver::default()
            .at_position(ThresholdLabel::S1, &series, series.smo2(), 155.0)
            .unwrap();
        assert_eq!(threshold.power(), Some(155));
        assert_eq!(threshold.heart_rate(), 122);
        assert_relative_eq!(threshold.smo2(), 64.5, epsilon = 1e-9);
    }

    #[test]
    fn test_heart_rate_rounds_to_nearest() {
        let series = power_series();
        let threshold = ThresholdResolver::default()
            .at_position(ThresholdLabel::S1, &series, series.smo2(), 157.0)
            .unwrap();
        // 122.8 bpm interpolated
        assert_eq!(threshold.heart_rate(), 123);
        assert_eq!(threshold.power(), Some(157));
    }

    #[test]
    fn test_extrapolation_policies() {
        let series = power_series();
        let linear = ThresholdResolver::new(PmaPolicy::default(), Extrapolation::Linear).unwrap();
        let flat = ThresholdResolver::new(PmaPolicy::default(), Extrapolation::Flat).unwrap();

        let beyond = linear
            .at_position(ThresholdLabel::S2, &series, series.smo2(), 310.0)
            .unwrap();
        assert_eq!(beyond.heart_rate(), 184);

        let clamped = flat
            .at_position(ThresholdLabel::S2, &series, series.smo2(), 310.0)
            .unwrap();
        assert_eq!(clamped.heart_rate(), 176);
        assert_relative_eq!(clamped.smo2(), 51.0, epsilon = 1e-9);
    }

    #[test]
    fn test_time_domain_without_power() {
        let time: Vec<f64> = (0..30).map(|i| 10.0 * i as f64).collect();
        let series = SeriesBuilder::new(Domain::Time)
            .axis(time)
            .smo2(vec![60.0; 30])
            .heart_rate(vec![140.0; 30])
            .build()
            .unwrap();
        let curve = series.smo2().to_vec();

        let from_window = ThresholdResolver::default().resolve(
            &series,
            &curve,
            &breakpoints(&series, &[10, 20]),
        );
        assert_eq!(from_window.unwrap_err(), Error::missing_channel("power"));

        let resolver = ThresholdResolver::new(PmaPolicy::FromBreakpoint, Extrapolation::Linear).unwrap();
        let set = resolver
            .resolve(&series, &curve, &breakpoints(&series, &[8, 16, 24]))
            .unwrap();
        assert_eq!(set.s1.power(), None);
        assert_relative_eq!(set.pma.position(), 240.0);
        assert!(set.pma.watts_per_kg(70.0).is_err());
    }

    #[test]
    fn test_from_breakpoint_needs_three() {
        let time: Vec<f64> = (0..30).map(|i| i as f64).collect();
        let series = SeriesBuilder::new(Domain::Time)
            .axis(time)
            .smo2(vec![60.0; 30])
            .heart_rate(vec![140.0; 30])
            .build()
            .unwrap();
        let resolver = ThresholdResolver::new(PmaPolicy::FromBreakpoint, Extrapolation::Linear).unwrap();
        let err = resolver
            .resolve(&series, series.smo2(), &breakpoints(&series, &[10, 20]))
            .unwrap_err();
        assert_eq!(err, Error::InsufficientBreakpoints { expected: 3, detected: 2 });
    }

    #[test]
    fn test_watts_per_kg() {
        let threshold = Threshold::new(ThresholdLabel::S2, 245.0, Some(245), 168, 31.0);
        assert_relative_eq!(threshold.watts_per_kg(70.0).unwrap(), 3.5);
        assert!(threshold.watts_per_kg(0.0).is_err());
    }
}
