//! Collector trait and the caching wrapper used by the scheduler

use crate::constants::{COLLECTOR_CACHE_TTL, COLLECTOR_FETCH_TIMEOUT, FETCH_LOG_CAPACITY};
use crate::error::CollectorError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use homelab_hud_types::SlideData;
use log::{debug, warn};
use serde::Serialize;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Trait for all data collectors
///
/// A collector talks to one upstream service (Pi-hole, Plex, a custom
/// endpoint, ...) and turns its response into [`SlideData`]. Collectors do
/// no caching of their own; wrap them in a [`Collector`] for that.
#[async_trait]
pub trait DataCollector: Send + Sync {
    /// Short name used in logs and diagnostics
    fn name(&self) -> &str;

    /// Nominal poll interval of the service
    ///
    /// Only used for health reporting; the scheduler decides when to fetch.
    fn poll_interval(&self) -> Duration;

    /// Fetch fresh data from the service.
    ///
    /// `Ok(None)` means the service answered and there is nothing to show
    /// (no active stream, no running job). That is a valid result and is
    /// cached like any other.
    async fn fetch(&self) -> Result<Option<SlideData>, CollectorError>;
}

/// Result of one fetch attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchOutcome {
    Data,
    Empty,
    Error,
}

/// One entry in a collector's fetch log
#[derive(Debug, Clone, Serialize)]
pub struct FetchLogEntry {
    pub timestamp: DateTime<Utc>,
    pub outcome: FetchOutcome,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Point-in-time diagnostics for a collector
#[derive(Debug, Clone, Serialize)]
pub struct CollectorStatus {
    pub name: String,
    pub healthy: bool,
    pub last_error: Option<String>,
    /// Seconds since the last successful fetch
    pub last_success_age: Option<f64>,
    pub recent_fetches: Vec<FetchLogEntry>,
}

#[derive(Default)]
struct CacheState {
    /// Result of the last successful fetch; `Some(None)` is a cached "no data"
    cached: Option<Option<SlideData>>,
    /// When `cached` was stored. Cleared by `clear_cache` to force a re-fetch
    /// while keeping the value around as a fallback.
    cached_at: Option<Instant>,
    last_success: Option<Instant>,
    last_error: Option<String>,
    log: VecDeque<FetchLogEntry>,
}

impl CacheState {
    fn record(&mut self, outcome: FetchOutcome, elapsed: Duration, error: Option<String>) {
        if self.log.len() >= FETCH_LOG_CAPACITY {
            self.log.pop_front();
        }
        self.log.push_back(FetchLogEntry {
            timestamp: Utc::now(),
            outcome,
            elapsed_ms: elapsed.as_millis() as u64,
            error,
        });
    }
}

/// A [`DataCollector`] with a TTL cache, stale-on-error fallback and health
/// tracking.
///
/// One instance per slide. All operations are serialised by a single lock,
/// so a status query arriving while the display loop is fetching waits for
/// that fetch and then reads its result instead of issuing a second call.
pub struct Collector {
    source: Box<dyn DataCollector>,
    state: Mutex<CacheState>,
    ttl: Duration,
    fetch_timeout: Duration,
}

impl Collector {
    pub fn new(source: Box<dyn DataCollector>) -> Self {
        Self::with_limits(source, COLLECTOR_CACHE_TTL, COLLECTOR_FETCH_TIMEOUT)
    }

    pub fn with_limits(source: Box<dyn DataCollector>, ttl: Duration, fetch_timeout: Duration) -> Self {
        Self {
            source,
            state: Mutex::new(CacheState::default()),
            ttl,
            fetch_timeout,
        }
    }

    pub fn name(&self) -> &str {
        self.source.name()
    }

    /// Get cached data if fresh, otherwise fetch.
    ///
    /// Never fails: a fetch error is recorded and the previous cached value
    /// (if any) is returned instead.
    pub async fn get_data(&self) -> Option<SlideData> {
        let mut state = self.state.lock().await;

        if let (Some(cached), Some(at)) = (&state.cached, state.cached_at) {
            if at.elapsed() < self.ttl {
                return cached.clone();
            }
        }

        let started = Instant::now();
        let result = match tokio::time::timeout(self.fetch_timeout, self.source.fetch()).await {
            Ok(result) => result,
            Err(_) => Err(CollectorError::Timeout(self.fetch_timeout)),
        };
        let elapsed = started.elapsed();

        match result {
            Ok(data) => {
                let outcome = if data.is_some() {
                    FetchOutcome::Data
                } else {
                    FetchOutcome::Empty
                };
                debug!("{} fetched in {:?} ({:?})", self.name(), elapsed, outcome);
                let now = Instant::now();
                state.cached = Some(data.clone());
                state.cached_at = Some(now);
                state.last_success = Some(now);
                state.last_error = None;
                state.record(outcome, elapsed, None);
                data
            }
            Err(e) => {
                let message = e.to_string();
                warn!("{} fetch failed: {}", self.name(), message);
                state.last_error = Some(message.clone());
                state.record(FetchOutcome::Error, elapsed, Some(message));
                state.cached.clone().flatten()
            }
        }
    }

    /// Force the next [`get_data`](Self::get_data) to fetch regardless of TTL.
    ///
    /// The cached value is kept as the stale-on-error fallback.
    pub async fn clear_cache(&self) {
        self.state.lock().await.cached_at = None;
    }

    pub async fn last_error(&self) -> Option<String> {
        self.state.lock().await.last_error.clone()
    }

    /// True when no error is recorded, or the last successful fetch is
    /// within twice the nominal poll interval.
    pub async fn is_healthy(&self) -> bool {
        let state = self.state.lock().await;
        self.healthy(&state)
    }

    fn healthy(&self, state: &CacheState) -> bool {
        if state.last_error.is_none() {
            return true;
        }
        let window = self.source.poll_interval() * 2;
        state.last_success.map_or(false, |at| at.elapsed() < window)
    }

    pub async fn status(&self) -> CollectorStatus {
        let state = self.state.lock().await;
        CollectorStatus {
            name: self.name().to_string(),
            healthy: self.healthy(&state),
            last_error: state.last_error.clone(),
            last_success_age: state.last_success.map(|at| at.elapsed().as_secs_f64()),
            recent_fetches: state.log.iter().cloned().collect(),
        }
    }
}

impl std::fmt::Debug for Collector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collector")
            .field("name", &self.name())
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex as StdMutex};

    type Script = Arc<StdMutex<VecDeque<Result<Option<SlideData>, String>>>>;

    /// Replays scripted results; repeats the last one when the script runs out
    struct ScriptedCollector {
        script: Script,
        last: StdMutex<Option<Result<Option<SlideData>, String>>>,
        calls: Arc<AtomicUsize>,
        delay: Duration,
    }

    impl ScriptedCollector {
        fn new(results: Vec<Result<Option<SlideData>, String>>) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let collector = Self {
                script: Arc::new(StdMutex::new(results.into())),
                last: StdMutex::new(None),
                calls: calls.clone(),
                delay: Duration::ZERO,
            };
            (collector, calls)
        }
    }

    #[async_trait]
    impl DataCollector for ScriptedCollector {
        fn name(&self) -> &str {
            "scripted"
        }

        fn poll_interval(&self) -> Duration {
            Duration::from_secs(10)
        }

        async fn fetch(&self) -> Result<Option<SlideData>, CollectorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let next = self.script.lock().unwrap().pop_front();
            let result = match next {
                Some(r) => {
                    *self.last.lock().unwrap() = Some(r.clone());
                    r
                }
                None => self.last.lock().unwrap().clone().unwrap_or(Ok(None)),
            };
            result.map_err(CollectorError::Other)
        }
    }

    fn data(value: serde_json::Value) -> Option<SlideData> {
        Some(homelab_hud_types::into_slide_data(value))
    }

    #[tokio::test(start_paused = true)]
    async fn test_reads_within_ttl_fetch_once() {
        let (source, calls) = ScriptedCollector::new(vec![Ok(data(json!({"x": 1})))]);
        let collector = Collector::new(Box::new(source));

        assert_eq!(collector.get_data().await, data(json!({"x": 1})));
        tokio::time::advance(Duration::from_secs(4)).await;
        assert_eq!(collector.get_data().await, data(json!({"x": 1})));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(1)).await;
        collector.get_data().await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_readers_share_one_fetch() {
        let (mut source, calls) = ScriptedCollector::new(vec![Ok(data(json!({"x": 1})))]);
        source.delay = Duration::from_millis(500);
        let collector = Collector::new(Box::new(source));

        let (a, b) = tokio::join!(collector.get_data(), collector.get_data());
        assert_eq!(a, b);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_cache_forces_fetch() {
        let (source, calls) =
            ScriptedCollector::new(vec![Ok(data(json!({"x": 1}))), Ok(data(json!({"x": 2})))]);
        let collector = Collector::new(Box::new(source));

        collector.get_data().await;
        collector.clear_cache().await;
        assert_eq!(collector.get_data().await, data(json!({"x": 2})));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_returns_stale_value() {
        let (source, _) =
            ScriptedCollector::new(vec![Ok(data(json!({"x": 1}))), Err("boom".to_string())]);
        let collector = Collector::new(Box::new(source));

        assert_eq!(collector.get_data().await, data(json!({"x": 1})));
        collector.clear_cache().await;
        assert_eq!(collector.get_data().await, data(json!({"x": 1})));
        assert_eq!(collector.last_error().await.as_deref(), Some("boom"));
        // Recent success keeps the collector healthy despite the error
        assert!(collector.is_healthy().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_without_cache_is_none() {
        let (source, _) = ScriptedCollector::new(vec![Err("down".to_string())]);
        let collector = Collector::new(Box::new(source));

        assert_eq!(collector.get_data().await, None);
        assert!(!collector.is_healthy().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_none_is_cached_like_data() {
        let (source, calls) = ScriptedCollector::new(vec![Ok(None)]);
        let collector = Collector::new(Box::new(source));

        assert_eq!(collector.get_data().await, None);
        assert_eq!(collector.get_data().await, None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let status = collector.status().await;
        assert_eq!(status.recent_fetches.len(), 1);
        assert_eq!(status.recent_fetches[0].outcome, FetchOutcome::Empty);
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_fetch_clears_error() {
        let (source, _) = ScriptedCollector::new(vec![Err("flaky".to_string()), Ok(data(json!({"ok": true})))]);
        let collector = Collector::new(Box::new(source));

        collector.get_data().await;
        assert!(collector.last_error().await.is_some());
        collector.get_data().await;
        assert!(collector.last_error().await.is_none());
        assert!(collector.is_healthy().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_fetch_times_out() {
        let (mut source, _) = ScriptedCollector::new(vec![Ok(data(json!({"late": true})))]);
        source.delay = Duration::from_secs(60);
        let collector = Collector::with_limits(Box::new(source), COLLECTOR_CACHE_TTL, Duration::from_secs(5));

        let started = Instant::now();
        assert_eq!(collector.get_data().await, None);
        assert!(started.elapsed() < Duration::from_secs(6));
        assert!(collector.last_error().await.unwrap().contains("timed out"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_log_is_bounded() {
        let (source, _) = ScriptedCollector::new(vec![Ok(None)]);
        let collector = Collector::new(Box::new(source));

        for _ in 0..(FETCH_LOG_CAPACITY + 10) {
            collector.clear_cache().await;
            collector.get_data().await;
        }
        assert_eq!(collector.status().await.recent_fetches.len(), FETCH_LOG_CAPACITY);
    }
}
