// src/error.rs
use thiserror::Error;

/// Failures surfaced by feed providers and the aggregator.
///
/// Per-feed variants are swallowed by aggregation (logged + counted);
/// only `AllFeedsFailed` reaches callers of `fetch_updates`.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("malformed feed payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("bridge reported status '{0}' or no items")]
    BridgeStatus(String),

    #[error("malformed rss xml: {0}")]
    Xml(String),

    #[error("unknown feed type '{0}'")]
    UnknownFeed(String),

    #[error("no fixture registered for {0}")]
    MissingFixture(String),

    #[error("all {attempted} requested feeds failed")]
    AllFeedsFailed { attempted: usize },
}

impl FeedError {
    /// True for the aggregate error that hosts should render as
    /// "error fetching data" rather than "no data yet".
    pub fn is_total_failure(&self) -> bool {
        matches!(self, FeedError::AllFeedsFailed { .. })
    }
}
