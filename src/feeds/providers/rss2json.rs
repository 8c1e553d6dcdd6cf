// src/feeds/providers/rss2json.rs
use async_trait::async_trait;
use metrics::histogram;
use reqwest::Client;
use std::time::{Duration, Instant};

use crate::error::FeedError;
use crate::feeds::types::{BridgeResponse, FeedProvider, RawItem};

/// Fetches feeds through the rss2json bridge:
/// `GET <bridge>?rss_url=<enc>&count=<n>&api_key=<key>`.
pub struct Rss2JsonProvider {
    client: Client,
    bridge_url: String,
    api_key: Option<String>,
}

impl Rss2JsonProvider {
    pub fn new(bridge_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self::with_client(Client::new(), bridge_url, api_key)
    }

    pub fn with_client(client: Client, bridge_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            bridge_url: bridge_url.into(),
            api_key,
        }
    }

    pub fn with_timeout(
        bridge_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, FeedError> {
        let client = Client::builder()
            .user_agent(concat!("health-pulse/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(timeout.min(Duration::from_secs(4)))
            .timeout(timeout)
            .build()?;
        Ok(Self::with_client(client, bridge_url, api_key))
    }

    fn query<'a>(&'a self, feed_url: &'a str, count: &'a str) -> Vec<(&'static str, &'a str)> {
        let mut q = vec![("rss_url", feed_url), ("count", count)];
        if let Some(key) = self.api_key.as_deref() {
            q.push(("api_key", key));
        }
        q
    }
}

/// Unpack a bridge payload; anything but `status == "ok"` with an items
/// array is a failure for that feed.
pub fn parse_bridge_body(body: &str) -> Result<Vec<RawItem>, FeedError> {
    let resp: BridgeResponse = serde_json::from_str(body)?;
    match resp.items {
        Some(items) if resp.status == "ok" => Ok(items),
        _ => Err(FeedError::BridgeStatus(resp.status)),
    }
}

#[async_trait]
impl FeedProvider for Rss2JsonProvider {
    async fn fetch_raw(&self, feed_url: &str, count: usize) -> Result<Vec<RawItem>, FeedError> {
        let t0 = Instant::now();
        let count = count.to_string();
        let resp = self
            .client
            .get(&self.bridge_url)
            .query(&self.query(feed_url, &count))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                status: status.as_u16(),
                url: feed_url.to_string(),
            });
        }
        let body = resp.text().await?;
        let items = parse_bridge_body(&body)?;

        histogram!("feed_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        Ok(items)
    }

    fn name(&self) -> &'static str {
        "rss2json"
    }
}
