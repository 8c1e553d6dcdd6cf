// src/feeds/config.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::feeds::types::FeedType;

pub const ENV_CONFIG_PATH: &str = "HEALTH_PULSE_CONFIG_PATH";
pub const ENV_API_KEY: &str = "RSS2JSON_API_KEY";

pub const DEFAULT_BRIDGE_URL: &str = "https://api.rss2json.com/v1/api.json";
const WHO_NEWS_FEED: &str = "https://www.who.int/rss-feeds/news-english.xml";
const WHO_STATEMENT_FEED: &str = "https://www.who.int/rss-feeds/statement-english.xml";

/// How raw items are obtained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderMode {
    /// rss2json bridge (JSON).
    #[default]
    Bridge,
    /// Fetch and parse the RSS XML ourselves.
    Direct,
}

/// Upstream URL per feed. The outbreak feed aliases the general news feed
/// by default; WHO publishes no separate stable outbreak RSS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedCatalog {
    pub news: String,
    #[serde(alias = "diseaseOutbreaks")]
    pub disease_outbreaks: String,
    pub recommendations: String,
}

impl Default for FeedCatalog {
    fn default() -> Self {
        Self {
            news: WHO_NEWS_FEED.to_string(),
            disease_outbreaks: WHO_NEWS_FEED.to_string(),
            recommendations: WHO_STATEMENT_FEED.to_string(),
        }
    }
}

impl FeedCatalog {
    pub fn url_for(&self, feed: FeedType) -> &str {
        match feed {
            FeedType::News => &self.news,
            FeedType::DiseaseOutbreaks => &self.disease_outbreaks,
            FeedType::Recommendations => &self.recommendations,
        }
    }
}

fn default_bridge_url() -> String {
    DEFAULT_BRIDGE_URL.to_string()
}
fn default_cache_ttl_secs() -> u64 {
    60
}
fn default_request_timeout_secs() -> u64 {
    10
}
fn default_monitor_interval_secs() -> u64 {
    300
}
fn default_monitor_limit() -> usize {
    10
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_bridge_url")]
    pub bridge_url: String,
    /// `"ENV"` means: read from `RSS2JSON_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub mode: ProviderMode,
    #[serde(default)]
    pub catalog: FeedCatalog,
    /// 0 disables the response cache.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_monitor_interval_secs")]
    pub monitor_interval_secs: u64,
    #[serde(default = "default_monitor_limit")]
    pub monitor_limit: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            bridge_url: default_bridge_url(),
            api_key: None,
            mode: ProviderMode::default(),
            catalog: FeedCatalog::default(),
            cache_ttl_secs: default_cache_ttl_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            monitor_interval_secs: default_monitor_interval_secs(),
            monitor_limit: default_monitor_limit(),
        }
    }
}

impl FeedConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn monitor_interval(&self) -> Duration {
        Duration::from_secs(self.monitor_interval_secs.max(1))
    }
}

/// Load config from an explicit path. Supports TOML or JSON formats.
pub fn load_config_from(path: &Path) -> Result<FeedConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading feed config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let cfg = parse_config(&content, ext.as_str())
        .with_context(|| format!("parsing feed config {}", path.display()))?;
    resolve_api_key(cfg)
}

/// Load config using env var + fallbacks:
/// 1) $HEALTH_PULSE_CONFIG_PATH
/// 2) config/feeds.toml
/// 3) config/feeds.json
/// 4) built-in defaults
pub fn load_config_default() -> Result<FeedConfig> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_config_from(&pb);
        } else {
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from("config/feeds.toml");
    if toml_p.exists() {
        return load_config_from(&toml_p);
    }
    let json_p = PathBuf::from("config/feeds.json");
    if json_p.exists() {
        return load_config_from(&json_p);
    }
    resolve_api_key(FeedConfig::default())
}

fn parse_config(s: &str, hint_ext: &str) -> Result<FeedConfig> {
    let try_toml = hint_ext == "toml" || !s.trim_start().starts_with('{');
    if try_toml {
        if let Ok(v) = toml::from_str::<FeedConfig>(s) {
            return Ok(v);
        }
    }
    if let Ok(v) = serde_json::from_str::<FeedConfig>(s) {
        return Ok(v);
    }
    if !try_toml {
        if let Ok(v) = toml::from_str::<FeedConfig>(s) {
            return Ok(v);
        }
    }
    Err(anyhow!("unsupported feed config format"))
}

fn resolve_api_key(mut cfg: FeedConfig) -> Result<FeedConfig> {
    cfg.api_key = match cfg.api_key.as_deref().map(str::trim) {
        Some(k) if k.eq_ignore_ascii_case("env") => Some(
            std::env::var(ENV_API_KEY).map_err(|_| anyhow!("Missing {ENV_API_KEY} env var"))?,
        ),
        Some("") => None,
        Some(k) => Some(k.to_string()),
        None => std::env::var(ENV_API_KEY).ok().filter(|k| !k.is_empty()),
    };
    Ok(cfg)
}
