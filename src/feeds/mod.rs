// src/feeds/mod.rs
pub mod aggregator;
pub mod cache;
pub mod config;
pub mod monitor;
pub mod providers;
pub mod types;

use crate::feeds::types::{Category, FeedItem, FeedType, RawItem};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;
use std::collections::HashSet;

pub use aggregator::{FeedAggregator, FetchOptions, SearchOptions};
pub use monitor::{start_monitoring, start_outbreak_monitoring, MonitorHandle, Watermark};

const SUMMARY_CHARS: usize = 200;
const DEFAULT_AUTHOR: &str = "WHO";

// A tag must open with a letter, `/`, or `!`; a bare `<` in prose is text.
static RE_TAGS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<(?:/?[a-z][^>]*|!--.*?--|![^>]*)>").unwrap());
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static RE_IMG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)<img[^>]+src="([^">]+)""#).unwrap());

/// One-time metrics registration (so series show up in the exporter).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("feed_items_total", "Items normalized from upstream feeds.");
        describe_counter!(
            "feed_fetch_errors_total",
            "Per-feed fetch/parse failures swallowed by aggregation."
        );
        describe_counter!(
            "feed_dedup_total",
            "Items removed by (title, url) deduplication."
        );
        describe_counter!("feed_cache_hits_total", "Feed responses served from cache.");
        describe_counter!("feed_monitor_polls_total", "Monitor poll cycles.");
        describe_histogram!("feed_fetch_ms", "Per-feed fetch time in milliseconds.");
        describe_gauge!(
            "feed_monitor_last_poll_ts",
            "Unix ts when the monitor last polled."
        );
    });
}

/// Strip markup: tags out, entities decoded, whitespace collapsed.
pub fn strip_html(s: &str) -> String {
    if s.is_empty() {
        return String::new();
    }
    let no_tags = RE_TAGS.replace_all(s, "");
    let decoded = html_escape::decode_html_entities(&no_tags);
    RE_WS.replace_all(&decoded, " ").trim().to_string()
}

/// First 200 chars of the stripped description plus an ellipsis marker.
pub fn make_summary(description: &str) -> String {
    let head: String = description.chars().take(SUMMARY_CHARS).collect();
    format!("{head}...")
}

/// Parse the publish date into a calendar date; unparseable input becomes `today`.
///
/// Accepted: RFC 3339, the bridge's `YYYY-MM-DD HH:MM:SS`, RFC 2822, bare `YYYY-MM-DD`.
pub fn parse_pub_date(raw: Option<&str>, today: NaiveDate) -> NaiveDate {
    let Some(s) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return today;
    };
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc).date_naive();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return dt.date();
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return dt.with_timezone(&Utc).date_naive();
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return d;
    }
    tracing::debug!(raw = s, "unparseable pubDate, using today");
    today
}

/// Keyword scan over the title; precedence is fixed.
pub fn categorize(title: &str, feed: FeedType) -> Category {
    let t = title.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| t.contains(w));

    if has(&["emergency", "alert", "outbreak"]) || feed == FeedType::DiseaseOutbreaks {
        return Category::EmergencyAlert;
    }
    if has(&["surveillance", "data", "report", "statistics"]) {
        return Category::HealthData;
    }
    if has(&["guideline", "recommendation", "strategy"]) || feed == FeedType::Recommendations {
        return Category::Guidelines;
    }
    Category::HealthNews
}

/// First `<img src="...">` URL in raw HTML.
pub fn extract_image(content: &str) -> Option<String> {
    RE_IMG
        .captures(content)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.trim().is_empty())
}

pub fn normalize_item(raw: RawItem, feed: FeedType, index: usize, today: NaiveDate) -> FeedItem {
    let title = strip_html(raw.title.as_deref().unwrap_or_default());
    let description = strip_html(raw.description.as_deref().unwrap_or_default());
    let image = non_empty(raw.content.clone())
        .or_else(|| raw.description.clone())
        .and_then(|html| extract_image(&html));

    FeedItem {
        id: non_empty(raw.guid).unwrap_or_else(|| format!("{}-{}", feed.key(), index)),
        summary: make_summary(&description),
        date: parse_pub_date(raw.pub_date.as_deref(), today),
        url: non_empty(raw.link),
        category: categorize(&title, feed),
        feed_type: feed,
        author: non_empty(raw.author).unwrap_or_else(|| DEFAULT_AUTHOR.to_string()),
        image,
        title,
        description,
    }
}

pub fn normalize_feed(raw: Vec<RawItem>, feed: FeedType, today: NaiveDate) -> Vec<FeedItem> {
    raw.into_iter()
        .enumerate()
        .map(|(i, it)| normalize_item(it, feed, i, today))
        .collect()
}

/// Sort newest first, drop repeated `(title, url)` pairs, cap at `limit`.
/// Returns the kept items and how many duplicates were removed.
pub fn sort_dedup_truncate(mut items: Vec<FeedItem>, limit: usize) -> (Vec<FeedItem>, usize) {
    // stable: equal dates keep feed order
    items.sort_by(|a, b| b.date.cmp(&a.date));

    let mut seen: HashSet<(String, Option<String>)> = HashSet::with_capacity(items.len());
    let mut dedup_out = 0usize;
    let mut kept = Vec::with_capacity(items.len().min(limit));
    for it in items {
        if !seen.insert((it.title.clone(), it.url.clone())) {
            dedup_out += 1;
            continue;
        }
        kept.push(it);
    }
    kept.truncate(limit);
    (kept, dedup_out)
}

/// Case-insensitive substring on category label or title.
pub fn filter_by_category(items: Vec<FeedItem>, category: &str) -> Vec<FeedItem> {
    let needle = category.to_lowercase();
    items
        .into_iter()
        .filter(|it| {
            it.category.label().to_lowercase().contains(&needle)
                || it.title.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Case-insensitive substring on title or description.
pub fn matches_query(item: &FeedItem, query: &str) -> bool {
    let q = query.to_lowercase();
    item.title.to_lowercase().contains(&q) || item.description.to_lowercase().contains(&q)
}

/// Outbreak-relevant updates: the outbreak feed or anything flagged as an alert.
pub fn is_outbreak_update(item: &FeedItem) -> bool {
    item.feed_type == FeedType::DiseaseOutbreaks || item.category == Category::EmergencyAlert
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    #[test]
    fn strip_html_removes_tags_and_decodes() {
        let s = "<p>Cholera&nbsp;<b>update</b> &amp; response</p>";
        assert_eq!(strip_html(s), "Cholera update & response");
    }

    #[test]
    fn bare_angle_brackets_are_text() {
        assert_eq!(
            strip_html("Cases < 5 per day and > 2 regions"),
            "Cases < 5 per day and > 2 regions"
        );
        assert_eq!(strip_html("<p>R0 <2</p>"), "R0 <2");
        assert_eq!(strip_html("a<!-- note -->b<br/>c</DIV>"), "abc");
        assert_eq!(strip_html("<!DOCTYPE html><p>ok</p>"), "ok");
    }

    #[test]
    fn escaped_markup_survives_as_text() {
        assert_eq!(strip_html("a &lt;b&gt; c"), "a <b> c");
    }

    #[test]
    fn summary_caps_at_200_chars_and_appends_ellipsis() {
        let long = "é".repeat(250);
        let s = make_summary(&long);
        assert_eq!(s.chars().count(), 203);
        assert!(s.ends_with("..."));
        assert_eq!(make_summary("short"), "short...");
    }

    #[test]
    fn dates_in_all_supported_shapes() {
        let want = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        assert_eq!(parse_pub_date(Some("2024-05-02 10:00:00"), today()), want);
        assert_eq!(parse_pub_date(Some("2024-05-02T10:00:00Z"), today()), want);
        assert_eq!(
            parse_pub_date(Some("Thu, 02 May 2024 10:00:00 GMT"), today()),
            want
        );
        assert_eq!(parse_pub_date(Some("2024-05-02"), today()), want);
    }

    #[test]
    fn bad_or_missing_dates_fall_back_to_today() {
        assert_eq!(parse_pub_date(Some("yesterday-ish"), today()), today());
        assert_eq!(parse_pub_date(Some("  "), today()), today());
        assert_eq!(parse_pub_date(None, today()), today());
    }

    #[test]
    fn category_precedence() {
        assert_eq!(
            categorize("Outbreak report for region", FeedType::News),
            Category::EmergencyAlert
        );
        assert_eq!(
            categorize("Malaria statistics", FeedType::Recommendations),
            Category::HealthData
        );
        assert_eq!(
            categorize("New strategy on TB", FeedType::News),
            Category::Guidelines
        );
        assert_eq!(
            categorize("Statement by the DG", FeedType::Recommendations),
            Category::Guidelines
        );
        assert_eq!(
            categorize("Statement by the DG", FeedType::DiseaseOutbreaks),
            Category::EmergencyAlert
        );
        assert_eq!(
            categorize("World Health Day", FeedType::News),
            Category::HealthNews
        );
    }

    #[test]
    fn first_image_is_extracted() {
        let html = r#"<p>x</p><IMG class="a" src="https://who.int/a.jpg"><img src="b.jpg">"#;
        assert_eq!(extract_image(html).as_deref(), Some("https://who.int/a.jpg"));
        assert_eq!(extract_image("<p>none</p>"), None);
    }

    #[test]
    fn missing_guid_gets_index_id_and_author_defaults() {
        let raw = RawItem {
            guid: Some("".into()),
            title: Some("<b>Hello</b>".into()),
            description: Some(r#"<img src="pic.png"> body"#.into()),
            ..Default::default()
        };
        let it = normalize_item(raw, FeedType::Recommendations, 4, today());
        assert_eq!(it.id, "recommendations-4");
        assert_eq!(it.title, "Hello");
        assert_eq!(it.description, "body");
        assert_eq!(it.author, "WHO");
        assert_eq!(it.image.as_deref(), Some("pic.png"));
        assert_eq!(it.date, today());
        assert!(it.url.is_none());
    }

    fn item(title: &str, url: &str, date: (i32, u32, u32)) -> FeedItem {
        normalize_item(
            RawItem {
                title: Some(title.into()),
                link: Some(url.into()),
                pub_date: Some(format!("{}-{:02}-{:02}", date.0, date.1, date.2)),
                ..Default::default()
            },
            FeedType::News,
            0,
            today(),
        )
    }

    #[test]
    fn sort_then_dedup_then_truncate() {
        let items = vec![
            item("a", "u1", (2025, 1, 1)),
            item("b", "u2", (2025, 3, 1)),
            item("a", "u1", (2025, 1, 1)),
            item("a", "u3", (2025, 2, 1)),
        ];
        let (kept, dedup) = sort_dedup_truncate(items.clone(), 10);
        assert_eq!(dedup, 1);
        let titles: Vec<_> = kept.iter().map(|i| (i.title.as_str(), i.url.as_deref())).collect();
        assert_eq!(
            titles,
            vec![("b", Some("u2")), ("a", Some("u3")), ("a", Some("u1"))]
        );

        let (kept, _) = sort_dedup_truncate(items, 2);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn category_filter_matches_label_or_title() {
        let items = vec![
            item("Cholera outbreak", "u1", (2025, 1, 1)),
            item("World Health Day", "u2", (2025, 1, 1)),
            item("Data on cholera", "u3", (2025, 1, 1)),
        ];
        let out = filter_by_category(items.clone(), "EMERGENCY");
        assert_eq!(out.len(), 1);
        let out = filter_by_category(items, "cholera");
        assert_eq!(out.len(), 2);
    }
}
