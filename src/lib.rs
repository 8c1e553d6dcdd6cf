// src/lib.rs
// Public library surface for the demo binary and integration tests.

pub mod error;
pub mod feeds;
pub mod telemetry;
pub mod trends;

// ---- Re-exports for stable public API ----
pub use crate::error::FeedError;
pub use crate::feeds::config::{load_config_default, load_config_from, FeedConfig};
pub use crate::feeds::monitor::MonitorOptions;
pub use crate::feeds::types::{Category, FeedItem, FeedProvider, FeedType};
pub use crate::feeds::{FeedAggregator, FetchOptions, MonitorHandle, SearchOptions};
pub use crate::trends::{MetricKind, Reading, TrendDirection, TrendReport, TrendResult};
