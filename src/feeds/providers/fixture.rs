// src/feeds/providers/fixture.rs
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::FeedError;
use crate::feeds::providers::{direct_rss::parse_rss, rss2json::parse_bridge_body};
use crate::feeds::types::{FeedProvider, RawItem};

enum Canned {
    BridgeJson(String),
    RssXml(String),
    HttpStatus(u16),
}

/// Serves canned upstream bodies per feed URL. Unregistered URLs fail.
#[derive(Default)]
pub struct FixtureProvider {
    by_url: HashMap<String, Canned>,
    calls: AtomicUsize,
}

impl FixtureProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a bridge JSON body for `url`.
    pub fn with_json(mut self, url: &str, body: &str) -> Self {
        self.by_url
            .insert(url.to_string(), Canned::BridgeJson(body.to_string()));
        self
    }

    /// Register an RSS XML document for `url`.
    pub fn with_xml(mut self, url: &str, body: &str) -> Self {
        self.by_url
            .insert(url.to_string(), Canned::RssXml(body.to_string()));
        self
    }

    /// Make `url` answer with a non-2xx status.
    pub fn with_status(mut self, url: &str, status: u16) -> Self {
        self.by_url
            .insert(url.to_string(), Canned::HttpStatus(status));
        self
    }

    /// Number of `fetch_raw` calls served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedProvider for FixtureProvider {
    async fn fetch_raw(&self, feed_url: &str, count: usize) -> Result<Vec<RawItem>, FeedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.by_url.get(feed_url) {
            Some(Canned::BridgeJson(body)) => {
                let mut items = parse_bridge_body(body)?;
                items.truncate(count);
                Ok(items)
            }
            Some(Canned::RssXml(body)) => parse_rss(body, count),
            Some(Canned::HttpStatus(status)) => Err(FeedError::Status {
                status: *status,
                url: feed_url.to_string(),
            }),
            None => Err(FeedError::MissingFixture(feed_url.to_string())),
        }
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}
