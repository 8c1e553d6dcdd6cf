// tests/metrics_feeds.rs
use health_pulse::feeds::cache::CachingProvider;
use health_pulse::feeds::config::FeedCatalog;
use health_pulse::feeds::providers::FixtureProvider;
use health_pulse::feeds::start_monitoring;
use health_pulse::{telemetry, FeedAggregator, FetchOptions, FeedType, MonitorOptions};
use std::sync::Arc;
use std::time::Duration;

const NEWS_JSON: &str = include_str!("fixtures/who_news.json");

#[tokio::test]
async fn metrics_exposed_after_aggregation() {
    // Install a local recorder for this test binary
    let handle = telemetry::install_prometheus().expect("recorder");

    let p = FixtureProvider::new()
        .with_json("https://feeds.test/news.xml", NEWS_JSON)
        .with_status("https://feeds.test/down.xml", 502);
    let cached = CachingProvider::new(p, Duration::from_secs(60));
    let agg = FeedAggregator::new(
        Arc::new(cached),
        FeedCatalog {
            news: "https://feeds.test/news.xml".into(),
            disease_outbreaks: "https://feeds.test/news.xml".into(),
            recommendations: "https://feeds.test/down.xml".into(),
        },
    );

    let opts = FetchOptions {
        limit: 10,
        feed_types: FeedType::ALL.to_vec(),
        category: None,
    };
    agg.fetch_updates(&opts).await.expect("partial success");
    agg.fetch_updates(&opts).await.expect("cached");

    let monitor = start_monitoring(
        agg.clone(),
        MonitorOptions {
            interval: Duration::from_secs(3600),
            ..MonitorOptions::default()
        },
        |_| {},
    );
    tokio::time::sleep(Duration::from_millis(50)).await;
    monitor.shutdown().await;

    // Scrape metrics text and check series presence by substring
    let out = handle.render();
    assert!(out.contains("feed_items_total"), "{out}");
    assert!(out.contains(r#"feed="news""#));
    assert!(out.contains("feed_fetch_errors_total"));
    assert!(out.contains("feed_dedup_total"));
    assert!(out.contains("feed_cache_hits_total"));
    assert!(out.contains("feed_monitor_polls_total"));
    assert!(out.contains("feed_monitor_last_poll_ts"));
}
