//! Threshold analysis of a synthetic incremental ramp
//!
//! Run with `RUST_LOG=debug` to see the segmentation trace.

use smo2_core::{Domain, Series, SeriesBuilder};
use smo2_thresholds::{
    analyze, AnalysisConfig, RenderContext, ReportRenderer, StrategyConfig, TextSummary,
};
use tracing_subscriber::EnvFilter;

fn ramp() -> anyhow::Result<Series> {
    let power: Vec<f64> = (0..1000).map(|i| 300.0 * i as f64 / 999.0).collect();
    let smo2 = power
        .iter()
        .map(|&w| match w {
            w if w < 150.0 => 70.0,
            w if w < 220.0 => 70.0 - 40.0 * (w - 150.0) / 70.0,
            _ => 30.0,
        })
        .collect();
    let heart_rate = power.iter().map(|&w| 75.0 + 0.35 * w).collect();

    Ok(SeriesBuilder::new(Domain::Power)
        .axis(power)
        .smo2(smo2)
        .heart_rate(heart_rate)
        .build()?)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== SmO2 Ramp Analysis Demo ===\n");

    let series = ramp()?;
    let context = RenderContext::new("reports").with_athlete("Demo Athlete", 70.0);

    let strategies = [
        StrategyConfig::default(),
        StrategyConfig::SlopeCrossing(Default::default()),
        StrategyConfig::ExhaustiveThreeSegment(Default::default()),
    ];

    for strategy in strategies {
        let config = AnalysisConfig {
            strategy,
            ..Default::default()
        };
        let report = analyze(&series, &config)?;
        println!("{}", TextSummary.render(&report, &context)?);
    }

    Ok(())
}
