//! Per-slide collector pool
//!
//! Keeps each slide's collector alive across passes so its TTL cache and
//! stale fallback survive the rotation. A collector is rebuilt when the
//! slide's configuration (or the global service config) changes, and dropped
//! when the slide leaves the rotation.

use crate::collector::{Collector, CollectorStatus};
use crate::slide_type::{CollectorContext, SlideType};
use homelab_hud_types::SlideConfig;
use log::debug;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

struct PoolEntry {
    fingerprint: String,
    collector: Option<Arc<Collector>>,
}

/// Collectors keyed by slide id; never shared between slides
#[derive(Clone, Default)]
pub struct CollectorPool {
    entries: Arc<Mutex<HashMap<u32, PoolEntry>>>,
}

impl CollectorPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collector for `slide`, building one through `slide_type` on first use
    /// or after a configuration change.
    ///
    /// "No collector" is remembered too, so descriptors are not asked again
    /// until the configuration changes.
    pub fn resolve(
        &self,
        slide: &SlideConfig,
        slide_type: &dyn SlideType,
        ctx: &CollectorContext,
    ) -> Option<Arc<Collector>> {
        let fingerprint = format!("{}#{}", slide.fingerprint(), ctx.fingerprint());
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());

        if let Some(entry) = entries.get(&slide.id) {
            if entry.fingerprint == fingerprint {
                return entry.collector.clone();
            }
            debug!("Configuration of slide {} changed, rebuilding collector", slide.id);
        }

        let collector = slide_type.create_collector(slide, ctx).map(Arc::new);
        entries.insert(
            slide.id,
            PoolEntry {
                fingerprint,
                collector: collector.clone(),
            },
        );
        collector
    }

    /// Drop collectors of slides that are no longer in the rotation
    pub fn retain_slides(&self, ids: &HashSet<u32>) {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        entries.retain(|id, _| {
            let keep = ids.contains(id);
            if !keep {
                debug!("Dropping collector of removed slide {}", id);
            }
            keep
        });
    }

    /// Snapshot of (slide id, collector) pairs, sorted by id
    pub fn collectors(&self) -> Vec<(u32, Arc<Collector>)> {
        let entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        let mut list: Vec<(u32, Arc<Collector>)> = entries
            .iter()
            .filter_map(|(id, entry)| entry.collector.clone().map(|c| (*id, c)))
            .collect();
        list.sort_by_key(|(id, _)| *id);
        list
    }

    /// Diagnostics for every pooled collector.
    ///
    /// The pool lock is released before any collector lock is taken.
    pub async fn statuses(&self) -> Vec<(u32, CollectorStatus)> {
        let mut out = Vec::new();
        for (id, collector) in self.collectors() {
            out.push((id, collector.status().await));
        }
        out
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::DataCollector;
    use crate::error::CollectorError;
    use async_trait::async_trait;
    use homelab_hud_types::SlideData;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct Nothing;

    #[async_trait]
    impl DataCollector for Nothing {
        fn name(&self) -> &str {
            "nothing"
        }

        fn poll_interval(&self) -> Duration {
            Duration::from_secs(5)
        }

        async fn fetch(&self) -> Result<Option<SlideData>, CollectorError> {
            Ok(None)
        }
    }

    #[derive(Default)]
    struct Counting {
        built: AtomicUsize,
    }

    impl SlideType for Counting {
        fn type_name(&self) -> &str {
            "counting"
        }

        fn display_name(&self) -> &str {
            "Counting"
        }

        fn create_collector(&self, slide: &SlideConfig, _ctx: &CollectorContext) -> Option<Collector> {
            self.built.fetch_add(1, Ordering::SeqCst);
            slide.city.as_ref().map(|_| Collector::new(Box::new(Nothing)))
        }
    }

    fn slide(id: u32, city: Option<&str>) -> SlideConfig {
        let mut slide = SlideConfig::new(id, "counting", "c");
        slide.city = city.map(str::to_string);
        slide
    }

    #[test]
    fn test_reuses_until_config_changes() {
        let pool = CollectorPool::new();
        let kind = Counting::default();
        let ctx = CollectorContext::default();

        let first = pool.resolve(&slide(1, Some("Oslo")), &kind, &ctx).unwrap();
        let again = pool.resolve(&slide(1, Some("Oslo")), &kind, &ctx).unwrap();
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(kind.built.load(Ordering::SeqCst), 1);

        let changed = pool.resolve(&slide(1, Some("Lima")), &kind, &ctx).unwrap();
        assert!(!Arc::ptr_eq(&first, &changed));
        assert_eq!(kind.built.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_slides_never_share_collectors() {
        let pool = CollectorPool::new();
        let kind = Counting::default();
        let ctx = CollectorContext::default();

        let a = pool.resolve(&slide(1, Some("Oslo")), &kind, &ctx).unwrap();
        let b = pool.resolve(&slide(2, Some("Oslo")), &kind, &ctx).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_missing_collector_is_remembered() {
        let pool = CollectorPool::new();
        let kind = Counting::default();
        let ctx = CollectorContext::default();

        assert!(pool.resolve(&slide(1, None), &kind, &ctx).is_none());
        assert!(pool.resolve(&slide(1, None), &kind, &ctx).is_none());
        assert_eq!(kind.built.load(Ordering::SeqCst), 1);
        assert!(pool.collectors().is_empty());
    }

    #[test]
    fn test_context_change_rebuilds_and_retain_drops() {
        let pool = CollectorPool::new();
        let kind = Counting::default();

        pool.resolve(&slide(1, Some("Oslo")), &kind, &CollectorContext::default());
        pool.resolve(&slide(2, Some("Rome")), &kind, &CollectorContext::default());
        let mock = CollectorContext {
            use_mocks: true,
            ..Default::default()
        };
        pool.resolve(&slide(1, Some("Oslo")), &kind, &mock);
        assert_eq!(kind.built.load(Ordering::SeqCst), 3);

        pool.retain_slides(&HashSet::from([1]));
        let ids: Vec<u32> = pool.collectors().iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![1]);
    }
}
