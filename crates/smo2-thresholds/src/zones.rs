//! Training zones derived from S1 and S2
//!
//! Zones are recomputed on every call and never stored. Bounds are in the
//! series' domain unit; heart-rate ranges are interpolated at each bound.

use crate::resolver::validate_mass;
use serde::{Deserialize, Serialize};
use smo2_core::{Domain, Error, Extrapolation, Interpolator, Result, Series};
use std::fmt;

/// Lower edge of Z2 as a fraction of S1
pub const LOWER_RATIO: f64 = 0.85;
/// Upper edge of Z4 as a multiple of S2
pub const UPPER_RATIO: f64 = 1.10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneScheme {
    /// Fixed-ratio five zones around S1 and S2
    #[default]
    FiveZone,
    /// Below S1, between S1 and S2, above S2
    ThreeZone,
}

/// Half-open interval `[lower, upper)`; a missing side is unbounded
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

impl Bounds {
    pub fn contains(&self, value: f64) -> bool {
        self.lower.map_or(true, |l| value >= l) && self.upper.map_or(true, |u| value < u)
    }

    fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            lower: self.lower.map(&f),
            upper: self.upper.map(&f),
        }
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.lower, self.upper) {
            (Some(l), Some(u)) => write!(f, "{l:.0}-{u:.0}"),
            (None, Some(u)) => write!(f, "< {u:.0}"),
            (Some(l), None) => write!(f, "> {l:.0}"),
            (None, None) => f.write_str("all"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartRateRange {
    pub low: Option<i32>,
    pub high: Option<i32>,
}

impl fmt::Display for HeartRateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.low, self.high) {
            (Some(l), Some(h)) => write!(f, "{l}-{h} bpm"),
            (None, Some(h)) => write!(f, "< {h} bpm"),
            (Some(l), None) => write!(f, "> {l} bpm"),
            (None, None) => f.write_str("-"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    number: u8,
    domain: Domain,
    bounds: Bounds,
    heart_rate: HeartRateRange,
    name: String,
    objective: String,
}

impl Zone {
    /// Short label, "Z1" to "Z5"
    pub fn label(&self) -> String {
        format!("Z{}", self.number)
    }

    pub fn number(&self) -> u8 {
        self.number
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn lower_bound(&self) -> Option<f64> {
        self.bounds.lower
    }

    pub fn upper_bound(&self) -> Option<f64> {
        self.bounds.upper
    }

    pub fn heart_rate_range(&self) -> HeartRateRange {
        self.heart_rate
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> String {
        format!("{} ({})", self.name, self.objective)
    }

    /// Power bounds relative to body mass; power-domain zones only
    pub fn watts_per_kg_bounds(&self, body_mass_kg: f64) -> Result<Bounds> {
        validate_mass(body_mass_kg)?;
        if self.domain != Domain::Power {
            return Err(Error::InvalidInput(format!(
                "zone bounds are in {}, not watts",
                self.domain.unit()
            )));
        }
        Ok(self.bounds.map(|w| w / body_mass_kg))
    }
}

const FIVE_ZONES: [(&str, &str); 5] = [
    ("Recovery", "active rest"),
    ("Low aerobic", "base endurance"),
    ("High aerobic", "aerobic threshold"),
    ("Anaerobic threshold", "threshold capacity"),
    ("VO2max", "VO2max"),
];

const THREE_ZONES: [(&str, &str); 3] = [
    ("Moderate", "low-intensity endurance"),
    ("Heavy", "aerobic development"),
    ("Severe", "high intensity"),
];

#[derive(Debug, Clone, Default)]
pub struct ZoneCalculator {
    scheme: ZoneScheme,
    extrapolation: Extrapolation,
}

impl ZoneCalculator {
    pub fn new(scheme: ZoneScheme, extrapolation: Extrapolation) -> Self {
        Self {
            scheme,
            extrapolation,
        }
    }

    /// Zone edges from low to high, excluding the unbounded ends
    pub fn edges(&self, s1: f64, s2: f64) -> Result<Vec<f64>> {
        if !(s1.is_finite() && s2.is_finite() && s1 < s2) {
            return Err(Error::InvalidInput(format!(
                "zones need finite thresholds with S1 < S2, got {s1} and {s2}"
            )));
        }
        match self.scheme {
            ZoneScheme::FiveZone => {
                if s1 <= 0.0 {
                    return Err(Error::InvalidInput(format!(
                        "ratio zones need a positive S1, got {s1}"
                    )));
                }
                Ok(vec![LOWER_RATIO * s1, s1, s2, UPPER_RATIO * s2])
            }
            ZoneScheme::ThreeZone => Ok(vec![s1, s2]),
        }
    }

    /// Zones for thresholds at positions `s1` and `s2` of `series`
    pub fn compute_zones(&self, series: &Series, s1: f64, s2: f64) -> Result<Vec<Zone>> {
        let edges = self.edges(s1, s2)?;
        let hr = Interpolator::new(series.axis(), series.heart_rate(), self.extrapolation)?;
        let hr_at = |edge: Option<f64>| edge.map(|e| hr.at(e).round() as i32);

        let names: &[(&str, &str)] = match self.scheme {
            ZoneScheme::FiveZone => &FIVE_ZONES,
            ZoneScheme::ThreeZone => &THREE_ZONES,
        };

        let zones = names
            .iter()
            .enumerate()
            .map(|(i, (name, objective))| {
                let bounds = Bounds {
                    lower: i.checked_sub(1).map(|k| edges[k]),
                    upper: edges.get(i).copied(),
                };
                Zone {
                    number: i as u8 + 1,
                    domain: series.domain(),
                    bounds,
                    heart_rate: HeartRateRange {
                        low: hr_at(bounds.lower),
                        high: hr_at(bounds.upper),
                    },
                    name: name.to_string(),
                    objective: objective.to_string(),
                }
            })
            .collect();
        Ok(zones)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use smo2_core::SeriesBuilder;

    fn series() -> Series {
        let power: Vec<f64> = (0..31).map(|i| 10.0 * i as f64).collect();
        let hr = power.iter().map(|p| 80.0 + 0.4 * p).collect();
        SeriesBuilder::new(Domain::Power)
            .axis(power)
            .smo2(vec![60.0; 31])
            .heart_rate(hr)
            .build()
            .unwrap()
    }

    #[test]
    fn test_five_zone_bounds() {
        let zones = ZoneCalculator::default()
            .compute_zones(&series(), 200.0, 260.0)
            .unwrap();
        assert_eq!(zones.len(), 5);
        assert_eq!(zones[0].lower_bound(), None);
        assert_relative_eq!(zones[0].upper_bound().unwrap(), 170.0);
        assert_relative_eq!(zones[1].lower_bound().unwrap(), 170.0);
        assert_relative_eq!(zones[2].lower_bound().unwrap(), 200.0);
        assert_relative_eq!(zones[2].upper_bound().unwrap(), 260.0);
        assert_relative_eq!(zones[3].upper_bound().unwrap(), 286.0, epsilon = 1e-9);
        assert_eq!(zones[4].upper_bound(), None);
        assert_eq!(zones[4].label(), "Z5");
    }

    #[test]
    fn test_heart_rate_ranges() {
        let zones = ZoneCalculator::default()
            .compute_zones(&series(), 200.0, 260.0)
            .unwrap();
        assert_eq!(zones[2].heart_rate_range(), HeartRateRange { low: Some(160), high: Some(184) });
        assert_eq!(zones[0].heart_rate_range().low, None);
        assert_eq!(zones[0].heart_rate_range().to_string(), "< 148 bpm");
    }

    #[test]
    fn test_three_zone_scheme() {
        let calculator = ZoneCalculator::new(ZoneScheme::ThreeZone, Extrapolation::Linear);
        let zones = calculator.compute_zones(&series(), 150.0, 240.0).unwrap();
        assert_eq!(zones.len(), 3);
        assert_eq!(zones[1].bounds(), Bounds { lower: Some(150.0), upper: Some(240.0) });
        assert!(zones[2].bounds().contains(1000.0));
    }

    #[test]
    fn test_rejects_unordered_thresholds() {
        let calculator = ZoneCalculator::default();
        assert!(calculator.compute_zones(&series(), 260.0, 200.0).is_err());
        assert!(calculator.compute_zones(&series(), 200.0, 200.0).is_err());
        assert!(calculator.edges(-10.0, 100.0).is_err());
    }

    #[test]
    fn test_watts_per_kg_bounds() {
        let zones = ZoneCalculator::default()
            .compute_zones(&series(), 200.0, 260.0)
            .unwrap();
        let wkg = zones[2].watts_per_kg_bounds(80.0).unwrap();
        assert_relative_eq!(wkg.lower.unwrap(), 2.5);
        assert_relative_eq!(wkg.upper.unwrap(), 3.25);
        assert!(zones[2].watts_per_kg_bounds(-1.0).is_err());
    }
}
