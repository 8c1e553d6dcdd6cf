//! Demo: pull the latest WHO updates once, then print trend reports for a
//! generated month of readings. Network failures are reported, not fatal.

use anyhow::Result;
use chrono::Utc;
use health_pulse::trends::{analyze_at, latest_display, sample::sample_history};
use health_pulse::{load_config_default, telemetry, FeedAggregator, FetchOptions, MetricKind};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    if let Err(e) = telemetry::init_tracing() {
        eprintln!("tracing init skipped: {e:#}");
    }

    let cfg = load_config_default()?;
    let aggregator = FeedAggregator::from_config(&cfg)?;

    match aggregator.fetch_updates(&FetchOptions::with_limit(5)).await {
        Ok(items) => {
            println!("== WHO updates ({}) ==", items.len());
            for it in &items {
                println!("{}  [{}]  {}", it.date, it.category.label(), it.title);
            }
        }
        Err(e) => tracing::warn!(error = %e, "could not load WHO updates"),
    }

    let now = Utc::now();
    let history = sample_history(now);
    for kind in [MetricKind::BloodPressure, MetricKind::BloodGlucose, MetricKind::HeartRate] {
        for days in [7, 30] {
            let report = analyze_at(history.get(kind), kind, days, now);
            println!(
                "\n== {} / {}d: latest {} · {} ==",
                kind.title(),
                days,
                latest_display(history.get(kind), kind).unwrap_or_else(|| "-".into()),
                report.trend.direction.label()
            );
            println!("{}", serde_json::to_string_pretty(&report.statistics)?);
        }
    }

    println!("\npulse-demo done");
    Ok(())
}
