// src/feeds/providers/mod.rs
pub mod direct_rss;
pub mod fixture;
pub mod rss2json;

use std::sync::Arc;

use crate::error::FeedError;
use crate::feeds::cache::CachingProvider;
use crate::feeds::config::{FeedConfig, ProviderMode};
use crate::feeds::types::FeedProvider;

pub use direct_rss::DirectRssProvider;
pub use fixture::FixtureProvider;
pub use rss2json::Rss2JsonProvider;

/// Build the provider stack described by `cfg`: bridge or direct, wrapped
/// in the response cache.
pub fn build_provider(cfg: &FeedConfig) -> Result<Arc<dyn FeedProvider>, FeedError> {
    let inner: Arc<dyn FeedProvider> = match cfg.mode {
        ProviderMode::Bridge => Arc::new(Rss2JsonProvider::with_timeout(
            cfg.bridge_url.clone(),
            cfg.api_key.clone(),
            cfg.request_timeout(),
        )?),
        ProviderMode::Direct => {
            let client = reqwest::Client::builder()
                .user_agent(concat!("health-pulse/", env!("CARGO_PKG_VERSION")))
                .timeout(cfg.request_timeout())
                .build()?;
            Arc::new(DirectRssProvider::new(client))
        }
    };
    Ok(Arc::new(CachingProvider::new(inner, cfg.cache_ttl())))
}
