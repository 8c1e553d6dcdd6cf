// src/telemetry.rs
use anyhow::{Context, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "health_pulse=info,monitor=info,warn";

/// Install a global tracing subscriber. `HEALTH_PULSE_LOG_JSON=1` switches
/// to JSON lines. Returns an error if a subscriber is already set.
pub fn init_tracing() -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let json = std::env::var("HEALTH_PULSE_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json())
            .try_init()
            .context("installing tracing subscriber")
    } else {
        registry
            .with(fmt::layer().compact())
            .try_init()
            .context("installing tracing subscriber")
    }
}

/// Install the Prometheus recorder so the feed counters become scrapeable.
/// The host decides where to serve `handle.render()`.
pub fn install_prometheus() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("prometheus: install recorder")?;
    crate::feeds::ensure_metrics_described();
    Ok(handle)
}
