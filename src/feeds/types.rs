// src/feeds/types.rs
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::FeedError;

/// Logical WHO feeds. The string keys match what UI callers pass around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeedType {
    #[serde(rename = "news")]
    News,
    #[serde(rename = "diseaseOutbreaks")]
    DiseaseOutbreaks,
    #[serde(rename = "recommendations")]
    Recommendations,
}

impl FeedType {
    pub const ALL: [FeedType; 3] = [
        FeedType::News,
        FeedType::DiseaseOutbreaks,
        FeedType::Recommendations,
    ];

    pub fn key(self) -> &'static str {
        match self {
            FeedType::News => "news",
            FeedType::DiseaseOutbreaks => "diseaseOutbreaks",
            FeedType::Recommendations => "recommendations",
        }
    }

    /// Default selection used by `fetch_updates`, search and the monitor.
    pub fn defaults() -> Vec<FeedType> {
        vec![FeedType::News, FeedType::DiseaseOutbreaks]
    }
}

impl fmt::Display for FeedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for FeedType {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FeedType::ALL
            .into_iter()
            .find(|ft| ft.key() == s.trim())
            .ok_or_else(|| FeedError::UnknownFeed(s.to_string()))
    }
}

/// Closed set of display categories, derived by keyword scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Emergency Alert")]
    EmergencyAlert,
    #[serde(rename = "Health Data")]
    HealthData,
    #[serde(rename = "Guidelines")]
    Guidelines,
    #[serde(rename = "Health News")]
    HealthNews,
}

impl Category {
    pub fn label(self) -> &'static str {
        match self {
            Category::EmergencyAlert => "Emergency Alert",
            Category::HealthData => "Health Data",
            Category::Guidelines => "Guidelines",
            Category::HealthNews => "Health News",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Normalized news record handed to UI callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub summary: String,
    /// Serialized as `YYYY-MM-DD`.
    pub date: NaiveDate,
    pub url: Option<String>,
    pub category: Category,
    pub feed_type: FeedType,
    pub author: String,
    pub image: Option<String>,
}

/// Payload returned by the rss2json bridge.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BridgeResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub items: Option<Vec<RawItem>>,
}

/// One upstream item, before normalization. Every field is optional
/// because the bridge omits empty ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawItem {
    #[serde(default)]
    pub guid: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "pubDate")]
    pub pub_date: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[async_trait::async_trait]
pub trait FeedProvider: Send + Sync {
    /// Fetch up to `count` raw items for the feed at `feed_url`.
    async fn fetch_raw(&self, feed_url: &str, count: usize) -> Result<Vec<RawItem>, FeedError>;
    fn name(&self) -> &'static str;

    /// Drop any cached responses. No-op for uncached providers.
    fn clear_cache(&self) {}
}

#[async_trait::async_trait]
impl<P: FeedProvider + ?Sized> FeedProvider for std::sync::Arc<P> {
    async fn fetch_raw(&self, feed_url: &str, count: usize) -> Result<Vec<RawItem>, FeedError> {
        (**self).fetch_raw(feed_url, count).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn clear_cache(&self) {
        (**self).clear_cache()
    }
}
