//! Rendering interface for analysis reports
//!
//! Renderers receive the report and an explicit [`RenderContext`] carrying
//! fonts, logo and output location; nothing is read from process state.
//! Typesetting backends live outside this crate and implement
//! [`ReportRenderer`]. [`TextSummary`] covers the tabulated part as plain text.

use crate::analysis::AnalysisReport;
use smo2_core::{Domain, Result};
use std::fmt;
use std::path::PathBuf;

/// Resources and athlete details handed to a renderer
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    pub output_dir: PathBuf,
    pub font_family: Option<String>,
    pub logo: Option<PathBuf>,
    pub athlete_name: Option<String>,
    /// Enables W/kg columns when set
    pub body_mass_kg: Option<f64>,
}

impl RenderContext {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Default::default()
        }
    }

    pub fn with_font_family(mut self, family: impl Into<String>) -> Self {
        self.font_family = Some(family.into());
        self
    }

    pub fn with_logo(mut self, path: impl Into<PathBuf>) -> Self {
        self.logo = Some(path.into());
        self
    }

    pub fn with_athlete(mut self, name: impl Into<String>, body_mass_kg: f64) -> Self {
        self.athlete_name = Some(name.into());
        self.body_mass_kg = Some(body_mass_kg);
        self
    }
}

/// Turns an [`AnalysisReport`] into some output
pub trait ReportRenderer {
    type Output;

    fn render(&self, report: &AnalysisReport, context: &RenderContext) -> Result<Self::Output>;

    /// Check if this renderer produces anything
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Renderer that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReportRenderer;

impl ReportRenderer for NullReportRenderer {
    type Output = ();

    fn render(&self, _report: &AnalysisReport, _context: &RenderContext) -> Result<()> {
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

/// Plain-text threshold and zone tables
#[derive(Debug, Clone, Copy, Default)]
pub struct TextSummary;

impl ReportRenderer for TextSummary {
    type Output = String;

    fn render(&self, report: &AnalysisReport, context: &RenderContext) -> Result<String> {
        if let Some(mass) = context.body_mass_kg {
            crate::resolver::validate_mass(mass)?;
        }
        Ok(Summary { report, context }.to_string())
    }
}

struct Summary<'a> {
    report: &'a AnalysisReport,
    context: &'a RenderContext,
}

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.report;
        let unit = report.domain.unit();
        let mass = self.context.body_mass_kg;

        writeln!(f, "SmO2 threshold analysis")?;
        if let Some(name) = &self.context.athlete_name {
            writeln!(f, "Athlete: {name}")?;
        }
        writeln!(f, "Strategy: {}", report.strategy)?;
        writeln!(f)?;

        writeln!(f, "Thresholds")?;
        for t in report.thresholds.iter() {
            write!(f, "  {:<4}", t.label().to_string())?;
            if report.domain == Domain::Time {
                write!(f, " {:>7.1} {unit}", t.position())?;
            }
            match t.power() {
                Some(p) => write!(f, " {p:>4} W")?,
                None => write!(f, "    - W")?,
            }
            if let Some(w) = mass.and_then(|m| t.watts_per_kg(m).ok()) {
                write!(f, " {w:>5.2} W/kg")?;
            }
            writeln!(f, " {:>4} bpm  SmO2 {:>5.1} %", t.heart_rate(), t.smo2())?;
        }
        writeln!(f)?;

        writeln!(f, "Training zones")?;
        for zone in &report.zones {
            write!(f, "  {:<3} {:>12} {unit}", zone.label(), zone.bounds().to_string())?;
            if let Some(w) = mass.and_then(|m| zone.watts_per_kg_bounds(m).ok()) {
                write!(f, "  {:>14} W/kg", format_wkg(w.lower, w.upper))?;
            }
            writeln!(
                f,
                "  {:>12}  {}",
                zone.heart_rate_range().to_string(),
                zone.description()
            )?;
        }
        Ok(())
    }
}

fn format_wkg(lower: Option<f64>, upper: Option<f64>) -> String {
    match (lower, upper) {
        (Some(l), Some(u)) => format!("{l:.2}-{u:.2}"),
        (None, Some(u)) => format!("< {u:.2}"),
        (Some(l), None) => format!("> {l:.2}"),
        (None, None) => "-".to_string(),
    }
}
