// src/feeds/aggregator.rs
use chrono::{NaiveDate, Utc};
use futures::future::join_all;
use metrics::counter;
use std::sync::Arc;

use crate::error::FeedError;
use crate::feeds::config::{FeedCatalog, FeedConfig};
use crate::feeds::providers::build_provider;
use crate::feeds::types::{FeedItem, FeedProvider, FeedType};
use crate::feeds::{
    ensure_metrics_described, filter_by_category, matches_query, normalize_feed,
    sort_dedup_truncate,
};

/// Pool size pulled by search; WHO offers no server-side full-text search.
pub const SEARCH_POOL: usize = 100;

#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub limit: usize,
    pub feed_types: Vec<FeedType>,
    /// Case-insensitive substring on category label or title, applied after truncation.
    pub category: Option<String>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            limit: 10,
            feed_types: FeedType::defaults(),
            category: None,
        }
    }
}

impl FetchOptions {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    pub limit: usize,
    pub include_news: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: 20,
            include_news: true,
        }
    }
}

/// Fan-out/fan-in over named WHO feeds.
#[derive(Clone)]
pub struct FeedAggregator {
    provider: Arc<dyn FeedProvider>,
    catalog: FeedCatalog,
}

impl FeedAggregator {
    pub fn new(provider: Arc<dyn FeedProvider>, catalog: FeedCatalog) -> Self {
        ensure_metrics_described();
        Self { provider, catalog }
    }

    pub fn from_config(cfg: &FeedConfig) -> Result<Self, FeedError> {
        Ok(Self::new(build_provider(cfg)?, cfg.catalog.clone()))
    }

    pub fn catalog(&self) -> &FeedCatalog {
        &self.catalog
    }

    /// One feed, normalized. Errors are returned as-is.
    pub async fn fetch_feed(&self, feed: FeedType, count: usize) -> Result<Vec<FeedItem>, FeedError> {
        self.fetch_feed_at(feed, count, Utc::now().date_naive()).await
    }

    async fn fetch_feed_at(
        &self,
        feed: FeedType,
        count: usize,
        today: NaiveDate,
    ) -> Result<Vec<FeedItem>, FeedError> {
        let raw = self
            .provider
            .fetch_raw(self.catalog.url_for(feed), count)
            .await?;
        let items = normalize_feed(raw, feed, today);
        counter!("feed_items_total", "feed" => feed.key()).increment(items.len() as u64);
        Ok(items)
    }

    /// Aggregate several feeds into one sorted, deduplicated, truncated list.
    ///
    /// A failing feed contributes nothing. Only when every requested feed
    /// fails is `FeedError::AllFeedsFailed` returned.
    pub async fn fetch_updates(&self, opts: &FetchOptions) -> Result<Vec<FeedItem>, FeedError> {
        let mut feeds: Vec<FeedType> = Vec::with_capacity(opts.feed_types.len());
        for ft in &opts.feed_types {
            if !feeds.contains(ft) {
                feeds.push(*ft);
            }
        }
        if feeds.is_empty() || opts.limit == 0 {
            tracing::warn!(limit = opts.limit, "fetch_updates called with nothing to fetch");
            return Ok(Vec::new());
        }

        let per_feed = opts.limit.div_ceil(feeds.len());
        let today = Utc::now().date_naive();

        let settled = join_all(feeds.iter().map(|&feed| async move {
            (feed, self.fetch_feed_at(feed, per_feed, today).await)
        }))
        .await;

        let mut all = Vec::new();
        let mut failed = 0usize;
        for (feed, res) in settled {
            match res {
                Ok(mut items) => all.append(&mut items),
                Err(e) => {
                    failed += 1;
                    tracing::warn!(feed = %feed, error = %e, "feed fetch failed, skipping");
                    counter!("feed_fetch_errors_total", "feed" => feed.key()).increment(1);
                }
            }
        }
        if failed == feeds.len() {
            return Err(FeedError::AllFeedsFailed { attempted: failed });
        }

        let (kept, dedup) = sort_dedup_truncate(all, opts.limit);
        counter!("feed_dedup_total").increment(dedup as u64);

        Ok(match opts.category.as_deref().filter(|c| !c.is_empty()) {
            Some(cat) => filter_by_category(kept, cat),
            None => kept,
        })
    }

    /// String-keyed entry point. Unknown keys are warned about and skipped.
    pub async fn fetch_updates_by_keys(
        &self,
        limit: usize,
        keys: &[&str],
        category: Option<&str>,
    ) -> Result<Vec<FeedItem>, FeedError> {
        let mut feed_types = Vec::with_capacity(keys.len());
        for key in keys {
            match key.parse::<FeedType>() {
                Ok(ft) => feed_types.push(ft),
                Err(_) => tracing::warn!(feed = %key, "feed type is not defined and will be skipped"),
            }
        }
        if feed_types.is_empty() {
            return Ok(Vec::new());
        }
        self.fetch_updates(&FetchOptions {
            limit,
            feed_types,
            category: category.map(str::to_string),
        })
        .await
    }

    /// Client-side search over a pool of recent items (title or description).
    pub async fn search_updates(&self, query: &str, limit: usize) -> Result<Vec<FeedItem>, FeedError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let pool = self
            .fetch_updates(&FetchOptions::with_limit(SEARCH_POOL))
            .await?;
        Ok(pool
            .into_iter()
            .filter(|it| matches_query(it, query))
            .take(limit)
            .collect())
    }

    pub async fn search(&self, query: &str, opts: &SearchOptions) -> Result<Vec<FeedItem>, FeedError> {
        if !opts.include_news {
            return Ok(Vec::new());
        }
        self.search_updates(query, opts.limit).await
    }

    /// Outbreak-tagged feed only. A failure surfaces as the upstream error
    /// (`Status`, `Http`, ...) rather than an aggregation error.
    pub async fn get_outbreaks(&self, limit: usize) -> Result<Vec<FeedItem>, FeedError> {
        match self.fetch_feed(FeedType::DiseaseOutbreaks, limit).await {
            Ok(mut items) => {
                items.truncate(limit);
                Ok(items)
            }
            Err(e) => {
                tracing::warn!(error = %e, "outbreak feed fetch failed");
                counter!("feed_fetch_errors_total", "feed" => FeedType::DiseaseOutbreaks.key())
                    .increment(1);
                Err(e)
            }
        }
    }

    pub fn clear_cache(&self) {
        self.provider.clear_cache();
    }
}
