// src/feeds/monitor.rs
use chrono::{NaiveDate, Utc};
use metrics::{counter, gauge};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::feeds::aggregator::{FeedAggregator, FetchOptions};
use crate::feeds::config::FeedConfig;
use crate::feeds::is_outbreak_update;
use crate::feeds::types::{FeedItem, FeedType};

/// Newest item date seen so far; `None` before the first delivery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Watermark {
    last_seen: Option<NaiveDate>,
}

impl Watermark {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_seen(&self) -> Option<NaiveDate> {
        self.last_seen
    }

    /// Keep items strictly newer than the watermark and move the watermark
    /// to the newest of them.
    pub fn advance(&mut self, items: Vec<FeedItem>) -> Vec<FeedItem> {
        let fresh: Vec<FeedItem> = items
            .into_iter()
            .filter(|it| self.last_seen.map_or(true, |seen| it.date > seen))
            .collect();
        if let Some(max) = fresh.iter().map(|it| it.date).max() {
            self.last_seen = Some(max);
        }
        fresh
    }
}

#[derive(Debug, Clone)]
pub struct MonitorOptions {
    pub interval: Duration,
    pub limit: usize,
    pub feed_types: Vec<FeedType>,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300),
            limit: 10,
            feed_types: FeedType::defaults(),
        }
    }
}

impl From<&FeedConfig> for MonitorOptions {
    fn from(cfg: &FeedConfig) -> Self {
        Self {
            interval: cfg.monitor_interval(),
            limit: cfg.monitor_limit,
            ..Self::default()
        }
    }
}

/// Running poll loop. Stops on `stop()` or when dropped.
#[derive(Debug)]
pub struct MonitorHandle {
    stop_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl MonitorHandle {
    pub fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop and wait for the loop to exit.
    pub async fn shutdown(mut self) {
        self.stop();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Poll immediately, then every `opts.interval`; hand items newer than the
/// watermark to `callback` as one batch. Poll errors are logged and the loop
/// keeps going. Must be called inside a tokio runtime.
pub fn start_monitoring<F>(aggregator: FeedAggregator, opts: MonitorOptions, mut callback: F) -> MonitorHandle
where
    F: FnMut(Vec<FeedItem>) + Send + 'static,
{
    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
    let fetch_opts = FetchOptions {
        limit: opts.limit,
        feed_types: opts.feed_types.clone(),
        category: None,
    };

    let task = tokio::spawn(async move {
        let mut watermark = Watermark::new();
        let mut ticker = tokio::time::interval(opts.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = &mut stop_rx => break,
                _ = ticker.tick() => {}
            }

            let res = tokio::select! {
                _ = &mut stop_rx => break,
                res = aggregator.fetch_updates(&fetch_opts) => res,
            };

            counter!("feed_monitor_polls_total").increment(1);
            gauge!("feed_monitor_last_poll_ts").set(Utc::now().timestamp() as f64);

            match res {
                Ok(items) => {
                    let fresh = watermark.advance(items);
                    if !fresh.is_empty() {
                        tracing::info!(
                            target: "monitor",
                            new = fresh.len(),
                            last_seen = ?watermark.last_seen(),
                            "new WHO updates"
                        );
                        callback(fresh);
                    }
                }
                Err(e) => tracing::warn!(target: "monitor", error = %e, "monitor poll failed"),
            }
        }
        tracing::debug!(target: "monitor", "monitor stopped");
    });

    MonitorHandle {
        stop_tx: Some(stop_tx),
        task: Some(task),
    }
}

/// Same loop, but only outbreak-feed items or emergency alerts are delivered.
pub fn start_outbreak_monitoring<F>(
    aggregator: FeedAggregator,
    opts: MonitorOptions,
    mut callback: F,
) -> MonitorHandle
where
    F: FnMut(Vec<FeedItem>) + Send + 'static,
{
    start_monitoring(aggregator, opts, move |batch| {
        let hits: Vec<FeedItem> = batch.into_iter().filter(is_outbreak_update).collect();
        if !hits.is_empty() {
            callback(hits);
        }
    })
}
