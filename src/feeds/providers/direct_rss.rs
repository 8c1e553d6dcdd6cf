// src/feeds/providers/direct_rss.rs
use async_trait::async_trait;
use metrics::histogram;
use quick_xml::de::from_str;
use reqwest::Client;
use serde::Deserialize;
use time::{
    format_description::well_known::{Rfc2822, Rfc3339},
    OffsetDateTime, UtcOffset,
};

use crate::error::FeedError;
use crate::feeds::types::{FeedProvider, RawItem};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    guid: Option<String>,
    author: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
}

/// RFC 2822 → RFC 3339 in UTC; unparseable input passes through so the
/// normalizer can apply its own fallback.
fn rfc2822_to_rfc3339(ts: &str) -> String {
    OffsetDateTime::parse(ts.trim(), &Rfc2822)
        .ok()
        .map(|dt| dt.to_offset(UtcOffset::UTC))
        .and_then(|dt| dt.format(&Rfc3339).ok())
        .unwrap_or_else(|| ts.to_string())
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}

/// Parse an RSS 2.0 document into bridge-shaped raw items, keeping at most `count`.
pub fn parse_rss(xml: &str, count: usize) -> Result<Vec<RawItem>, FeedError> {
    let clean = scrub_html_entities_for_xml(xml);
    let rss: Rss = from_str(&clean).map_err(|e| FeedError::Xml(e.to_string()))?;
    Ok(rss
        .channel
        .item
        .into_iter()
        .take(count)
        .map(|it| RawItem {
            guid: it.guid,
            title: it.title,
            content: it.description.clone(),
            description: it.description,
            pub_date: it.pub_date.as_deref().map(rfc2822_to_rfc3339),
            link: it.link,
            author: it.author,
        })
        .collect())
}

/// Fetches RSS XML straight from the feed URL; no bridge, no API key.
pub struct DirectRssProvider {
    client: Client,
}

impl DirectRssProvider {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FeedProvider for DirectRssProvider {
    async fn fetch_raw(&self, feed_url: &str, count: usize) -> Result<Vec<RawItem>, FeedError> {
        let t0 = std::time::Instant::now();
        let resp = self.client.get(feed_url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                status: status.as_u16(),
                url: feed_url.to_string(),
            });
        }
        let body = resp.text().await?;
        let items = parse_rss(&body, count)?;
        histogram!("feed_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        Ok(items)
    }

    fn name(&self) -> &'static str {
        "direct-rss"
    }
}
