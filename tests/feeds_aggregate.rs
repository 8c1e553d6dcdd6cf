// tests/feeds_aggregate.rs
use chrono::{NaiveDate, Utc};
use health_pulse::feeds::cache::CachingProvider;
use health_pulse::feeds::config::FeedCatalog;
use health_pulse::feeds::providers::FixtureProvider;
use health_pulse::{Category, FeedAggregator, FeedError, FeedType, FetchOptions, SearchOptions};
use std::sync::Arc;
use std::time::Duration;

const NEWS_JSON: &str = include_str!("fixtures/who_news.json");
const STATEMENTS_JSON: &str = include_str!("fixtures/statements.json");

const NEWS_URL: &str = "https://feeds.test/news.xml";
const STMT_URL: &str = "https://feeds.test/statements.xml";
const DOWN_URL: &str = "https://feeds.test/down.xml";

fn catalog(news: &str, outbreaks: &str, recommendations: &str) -> FeedCatalog {
    FeedCatalog {
        news: news.into(),
        disease_outbreaks: outbreaks.into(),
        recommendations: recommendations.into(),
    }
}

fn fixtures() -> Arc<FixtureProvider> {
    Arc::new(
        FixtureProvider::new()
            .with_json(NEWS_URL, NEWS_JSON)
            .with_json(STMT_URL, STATEMENTS_JSON)
            .with_status(DOWN_URL, 500),
    )
}

/// Outbreaks alias the news URL, as in the default catalog.
fn aggregator() -> (FeedAggregator, Arc<FixtureProvider>) {
    let p = fixtures();
    let agg = FeedAggregator::new(p.clone(), catalog(NEWS_URL, NEWS_URL, STMT_URL));
    (agg, p)
}

fn d(m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, m, day).unwrap()
}

fn all_feeds(limit: usize) -> FetchOptions {
    FetchOptions {
        limit,
        feed_types: FeedType::ALL.to_vec(),
        category: None,
    }
}

#[tokio::test]
async fn aliased_feeds_collapse_to_one_copy() {
    let (agg, _) = aggregator();
    let items = agg.fetch_updates(&FetchOptions::default()).await.unwrap();

    assert_eq!(items.len(), 3, "same url twice must not double the items");
    // stable sort keeps the news copy of each duplicate
    assert!(items.iter().all(|i| i.feed_type == FeedType::News));
}

#[tokio::test]
async fn results_are_sorted_newest_first() {
    let (agg, _) = aggregator();
    let items = agg.fetch_updates(&all_feeds(10)).await.unwrap();
    let dates: Vec<NaiveDate> = items.iter().map(|i| i.date).collect();

    assert_eq!(items.len(), 5);
    assert_eq!(dates[0], Utc::now().date_naive(), "undated item lands on today");
    assert_eq!(&dates[1..], &[d(5, 14), d(5, 13), d(5, 12), d(5, 10)]);
    assert!(dates.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn limit_is_split_across_feeds_and_enforced() {
    let (agg, _) = aggregator();
    let opts = FetchOptions {
        limit: 2,
        feed_types: vec![FeedType::News, FeedType::Recommendations],
        category: None,
    };
    let items = agg.fetch_updates(&opts).await.unwrap();
    let titles: Vec<&str> = items.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "Cholera outbreak response scaled up in Sudan",
            "WHO releases new guideline on hypertension treatment",
        ]
    );

    for limit in [1, 3, 4, 7] {
        let got = agg.fetch_updates(&all_feeds(limit)).await.unwrap();
        assert!(got.len() <= limit, "limit {limit} gave {}", got.len());
    }
}

#[tokio::test]
async fn zero_limit_or_no_feeds_is_empty_without_fetching() {
    let (agg, p) = aggregator();
    assert!(agg.fetch_updates(&all_feeds(0)).await.unwrap().is_empty());
    let none = FetchOptions {
        feed_types: Vec::new(),
        ..FetchOptions::default()
    };
    assert!(agg.fetch_updates(&none).await.unwrap().is_empty());
    assert_eq!(p.calls(), 0);
}

#[tokio::test]
async fn one_failing_feed_does_not_fail_the_batch() {
    let p = fixtures();
    let agg = FeedAggregator::new(p, catalog(NEWS_URL, DOWN_URL, DOWN_URL));
    let items = agg.fetch_updates(&all_feeds(10)).await.expect("partial ok");
    assert_eq!(items.len(), 3);
    assert!(items.iter().all(|i| i.feed_type == FeedType::News));
}

#[tokio::test]
async fn every_feed_failing_is_reported() {
    let p = fixtures();
    let agg = FeedAggregator::new(p, catalog(DOWN_URL, "https://feeds.test/unknown", DOWN_URL));
    let err = agg.fetch_updates(&all_feeds(10)).await.unwrap_err();
    assert!(matches!(err, FeedError::AllFeedsFailed { attempted: 3 }), "{err}");
    assert!(err.is_total_failure());
}

#[tokio::test]
async fn category_filter_runs_after_truncation() {
    let (agg, _) = aggregator();

    let mut opts = all_feeds(10);
    opts.category = Some("guidelines".into());
    let guides = agg.fetch_updates(&opts).await.unwrap();
    assert_eq!(guides.len(), 2);
    assert!(guides.iter().all(|i| i.category == Category::Guidelines));

    // title match works too
    opts.category = Some("DENGUE".into());
    assert_eq!(agg.fetch_updates(&opts).await.unwrap().len(), 1);

    // the guideline item is cut by the limit before filtering sees it
    let narrow = FetchOptions {
        limit: 1,
        feed_types: vec![FeedType::News, FeedType::Recommendations],
        category: Some("guideline".into()),
    };
    assert!(agg.fetch_updates(&narrow).await.unwrap().is_empty());
}

#[tokio::test]
async fn string_keys_skip_unknown_feeds() {
    let (agg, p) = aggregator();
    let items = agg
        .fetch_updates_by_keys(10, &["news", "podcasts"], None)
        .await
        .unwrap();
    assert_eq!(items.len(), 3);

    let before = p.calls();
    let none = agg.fetch_updates_by_keys(10, &["podcasts"], None).await.unwrap();
    assert!(none.is_empty());
    assert_eq!(p.calls(), before, "nothing fetched for unknown keys only");

    let data_only = agg
        .fetch_updates_by_keys(10, &["recommendations"], Some("health data"))
        .await
        .unwrap();
    assert!(data_only.is_empty());
}

#[tokio::test]
async fn search_matches_title_or_description() {
    let (agg, _) = aggregator();

    let by_title = agg.search_updates("cholera", 20).await.unwrap();
    assert_eq!(by_title.len(), 1);

    let by_desc = agg.search_updates("  VACCINATION ", 20).await.unwrap();
    assert_eq!(by_desc.len(), 1);
    assert_eq!(by_desc[0].id, by_title[0].id);

    let capped = agg.search_updates("o", 2).await.unwrap();
    assert_eq!(capped.len(), 2);

    // statements are not in the default search pool
    assert!(agg.search_updates("dengue", 20).await.unwrap().is_empty());
}

#[tokio::test]
async fn blank_query_or_news_disabled_is_empty() {
    let (agg, p) = aggregator();
    assert!(agg.search_updates("   ", 20).await.unwrap().is_empty());
    let opts = SearchOptions {
        include_news: false,
        ..SearchOptions::default()
    };
    assert!(agg.search("cholera", &opts).await.unwrap().is_empty());
    assert_eq!(p.calls(), 0);

    let hits = agg.search("statistics", &SearchOptions::default()).await.unwrap();
    assert_eq!(hits.len(), 1);
}

#[tokio::test]
async fn search_surfaces_total_failure() {
    let p = fixtures();
    let agg = FeedAggregator::new(p, catalog(DOWN_URL, DOWN_URL, DOWN_URL));
    let err = agg.search_updates("cholera", 5).await.unwrap_err();
    assert!(err.is_total_failure());
}

#[tokio::test]
async fn outbreaks_come_from_the_outbreak_feed_only() {
    let (agg, _) = aggregator();
    let items = agg.get_outbreaks(2).await.unwrap();
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|i| i.feed_type == FeedType::DiseaseOutbreaks));
    assert!(items.iter().all(|i| i.category == Category::EmergencyAlert));

    let p = fixtures();
    let down = FeedAggregator::new(p, catalog(NEWS_URL, DOWN_URL, STMT_URL));
    match down.get_outbreaks(5).await {
        Err(FeedError::Status { status, url }) => {
            assert_eq!(status, 500);
            assert_eq!(url, DOWN_URL);
        }
        other => panic!("expected the upstream status error, got {other:?}"),
    }
}

#[tokio::test]
async fn clear_cache_forces_a_refetch() {
    let p = fixtures();
    let cached = CachingProvider::new(p.clone(), Duration::from_secs(60));
    let agg = FeedAggregator::new(Arc::new(cached), catalog(NEWS_URL, NEWS_URL, STMT_URL));

    let first = agg.fetch_updates(&FetchOptions::default()).await.unwrap();
    let after_first = p.calls();
    assert!(after_first >= 1);

    let second = agg.fetch_updates(&FetchOptions::default()).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(p.calls(), after_first, "served from cache");

    agg.clear_cache();
    agg.fetch_updates(&FetchOptions::default()).await.unwrap();
    assert!(p.calls() > after_first);
}
