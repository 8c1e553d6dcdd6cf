// src/feeds/cache.rs
//! In-memory TTL cache in front of a feed provider.
//!
//! Keyed by `(feed_url, count)` so feed types that alias the same upstream
//! URL share entries. Only successful responses are stored. Concurrent
//! misses on one key wait for a single upstream fetch.

use async_trait::async_trait;
use metrics::counter;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::Instant;

use crate::error::FeedError;
use crate::feeds::types::{FeedProvider, RawItem};

type Key = (String, usize);
type Entries = HashMap<Key, (Instant, Vec<RawItem>)>;

pub struct CachingProvider<P> {
    inner: P,
    ttl: Duration,
    entries: Mutex<Entries>,
    // one in-flight fetch per key
    gates: Mutex<HashMap<Key, Arc<AsyncMutex<()>>>>,
}

impl<P: FeedProvider> CachingProvider<P> {
    /// A zero `ttl` disables caching.
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: Mutex::new(HashMap::new()),
            gates: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn gate(&self, key: &Key) -> Arc<AsyncMutex<()>> {
        let mut gates = self.gates.lock().unwrap_or_else(PoisonError::into_inner);
        gates.entry(key.clone()).or_default().clone()
    }

    fn release(&self, key: &Key, gate: Arc<AsyncMutex<()>>) {
        let mut gates = self.gates.lock().unwrap_or_else(PoisonError::into_inner);
        // the map and `gate` are the only holders: nobody is waiting
        if Arc::strong_count(&gate) == 2 {
            gates.remove(key);
        }
    }

    /// Expired entries go on every write so one-off keys do not pile up.
    fn store(&self, key: Key, items: Vec<RawItem>) {
        let ttl = self.ttl;
        let mut map = self.lock();
        map.retain(|_, (at, _)| at.elapsed() < ttl);
        map.insert(key, (Instant::now(), items));
    }

    fn lookup(&self, key: &Key) -> Option<Vec<RawItem>> {
        let mut map = self.lock();
        match map.get(key) {
            Some((at, items)) if at.elapsed() < self.ttl => Some(items.clone()),
            Some(_) => {
                map.remove(key);
                None
            }
            None => None,
        }
    }
}

#[async_trait]
impl<P: FeedProvider> FeedProvider for CachingProvider<P> {
    async fn fetch_raw(&self, feed_url: &str, count: usize) -> Result<Vec<RawItem>, FeedError> {
        if self.ttl.is_zero() {
            return self.inner.fetch_raw(feed_url, count).await;
        }
        let key = (feed_url.to_string(), count);
        if let Some(hit) = self.lookup(&key) {
            tracing::debug!(feed_url, count, "feed cache hit");
            counter!("feed_cache_hits_total").increment(1);
            return Ok(hit);
        }

        let gate = self.gate(&key);
        let result = {
            let _turn = gate.lock().await;
            match self.lookup(&key) {
                Some(hit) => {
                    tracing::debug!(feed_url, count, "feed cache hit after wait");
                    counter!("feed_cache_hits_total").increment(1);
                    Ok(hit)
                }
                None => self.inner.fetch_raw(feed_url, count).await.map(|items| {
                    self.store(key.clone(), items.clone());
                    items
                }),
            }
        };
        self.release(&key, gate);
        result
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn clear_cache(&self) {
        self.lock().clear();
        self.inner.clear_cache();
    }
}
