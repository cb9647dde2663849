//! Slide scheduler
//!
//! Drives the display rotation. Every pass re-reads the slide list, then for
//! each enabled slide in `order`:
//!
//! 1. looks up the slide type descriptor (unknown types are skipped),
//! 2. resolves the slide's collector from the pool and fetches once,
//! 3. applies the conditional-display policy (hidden slides publish `None`),
//! 4. renders, publishes the snapshot and hands the frame to the sinks,
//! 5. holds the slide for `duration`, refreshing every `refresh_duration`
//!    and touching the snapshot once a second.
//!
//! The hold loop runs on a fixed tick so a stop request is honoured within
//! one tick. Refresh deadlines are measured from the slide start and advance
//! by exactly one interval each time, so tick jitter never accumulates.

use crate::config::ConfigProvider;
use crate::constants::{
    EMPTY_CONFIG_BACKOFF, IDLE_PASS_BACKOFF, LIVENESS_INTERVAL, PASS_ERROR_BACKOFF, SCHEDULER_TICK,
};
use crate::current_slide::{CurrentSlide, CurrentSlidePublisher};
use crate::collector::Collector;
use crate::frame::{Frame, OutputSink, SlideRenderer};
use crate::pool::CollectorPool;
use crate::registry::SlideTypeRegistry;
use crate::slide_type::{CollectorContext, SlideType};
use anyhow::{Context, Result};
use futures::FutureExt;
use homelab_hud_types::{SlideConfig, SlideData};
use log::{debug, error, info, trace, warn};
use std::any::Any;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Tick and backoff settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulerTiming {
    pub tick: Duration,
    pub liveness: Duration,
    pub empty_backoff: Duration,
    pub pass_error_backoff: Duration,
    pub idle_backoff: Duration,
}

impl Default for SchedulerTiming {
    fn default() -> Self {
        Self {
            tick: SCHEDULER_TICK,
            liveness: LIVENESS_INTERVAL,
            empty_backoff: EMPTY_CONFIG_BACKOFF,
            pass_error_backoff: PASS_ERROR_BACKOFF,
            idle_backoff: IDLE_PASS_BACKOFF,
        }
    }
}

/// What happened to each slide during one pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Enabled slides in the rotation
    pub slide_count: usize,
    pub shown: Vec<u32>,
    /// Conditional slides with nothing to show
    pub hidden: Vec<u32>,
    /// Slides whose type is not registered
    pub unknown: Vec<u32>,
    /// Slides abandoned after an error or panic
    pub failed: Vec<u32>,
}

enum SlideOutcome {
    Shown,
    Hidden,
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// The display loop
pub struct SlideScheduler {
    config: Arc<dyn ConfigProvider>,
    registry: Arc<SlideTypeRegistry>,
    renderer: Arc<dyn SlideRenderer>,
    sinks: Vec<Arc<dyn OutputSink>>,
    publisher: CurrentSlidePublisher,
    pool: CollectorPool,
    running: Arc<AtomicBool>,
    timing: SchedulerTiming,
    use_mocks: bool,
}

impl SlideScheduler {
    pub fn new(
        config: Arc<dyn ConfigProvider>,
        registry: Arc<SlideTypeRegistry>,
        renderer: Arc<dyn SlideRenderer>,
    ) -> Self {
        Self {
            config,
            registry,
            renderer,
            sinks: Vec::new(),
            publisher: CurrentSlidePublisher::new(),
            pool: CollectorPool::new(),
            running: Arc::new(AtomicBool::new(true)),
            timing: SchedulerTiming::default(),
            use_mocks: false,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn OutputSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Share a publisher with the status API
    pub fn with_publisher(mut self, publisher: CurrentSlidePublisher) -> Self {
        self.publisher = publisher;
        self
    }

    pub fn with_pool(mut self, pool: CollectorPool) -> Self {
        self.pool = pool;
        self
    }

    pub fn with_timing(mut self, timing: SchedulerTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_mocks(mut self, use_mocks: bool) -> Self {
        self.use_mocks = use_mocks;
        self
    }

    pub fn publisher(&self) -> &CurrentSlidePublisher {
        &self.publisher
    }

    pub fn collectors(&self) -> &CollectorPool {
        &self.pool
    }

    /// Flag checked at every tick; clearing it stops the loop
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn stop(&self) {
        info!("Stopping slide scheduler");
        self.running.store(false, Ordering::SeqCst);
    }

    /// Run passes until stopped
    pub async fn run(&self) {
        info!("Slide scheduler started");
        while self.is_running() {
            let started = Instant::now();
            match self.run_pass().await {
                Ok(report) if report.slide_count == 0 => {
                    info!("No slides configured, waiting {:?}", self.timing.empty_backoff);
                    self.pause(self.timing.empty_backoff).await;
                }
                Ok(report) => {
                    debug!(
                        "Pass complete: {} shown, {} hidden, {} unknown, {} failed",
                        report.shown.len(),
                        report.hidden.len(),
                        report.unknown.len(),
                        report.failed.len()
                    );
                    if report.shown.is_empty() {
                        self.pause(self.timing.idle_backoff).await;
                    }
                }
                Err(e) => {
                    error!("Slide pass failed: {:#}", e);
                    self.pause(self.timing.pass_error_backoff).await;
                }
            }

            // Zero-length holds still cost at least one tick per pass
            let spent = started.elapsed();
            if spent < self.timing.tick {
                self.pause(self.timing.tick - spent).await;
            }
        }
        info!("Slide scheduler stopped");
    }

    /// One pass over the current rotation
    pub async fn run_pass(&self) -> Result<PassReport> {
        let slides = self
            .config
            .get_slides_config()
            .context("Failed to load slide configuration")?;
        let api_config = self
            .config
            .get_api_config()
            .context("Failed to load API configuration")?;
        let ctx = CollectorContext::new(api_config, self.use_mocks);

        let rotation = slides.rotation();
        let ids: HashSet<u32> = rotation.iter().map(|s| s.id).collect();
        self.pool.retain_slides(&ids);

        let mut report = PassReport {
            slide_count: rotation.len(),
            ..Default::default()
        };

        for slide in &rotation {
            if !self.is_running() {
                break;
            }

            let Some(slide_type) = self.registry.lookup(&slide.slide_type) else {
                warn!("Skipping slide {}: unknown slide type '{}'", slide.id, slide.slide_type);
                report.unknown.push(slide.id);
                continue;
            };

            let outcome = AssertUnwindSafe(self.process_slide(slide, slide_type.as_ref(), &ctx))
                .catch_unwind()
                .await;

            match outcome {
                Ok(Ok(SlideOutcome::Shown)) => report.shown.push(slide.id),
                Ok(Ok(SlideOutcome::Hidden)) => report.hidden.push(slide.id),
                Ok(Err(e)) => {
                    error!("Error processing slide {} ({}): {:#}", slide.id, slide.slide_type, e);
                    self.publisher.clear();
                    report.failed.push(slide.id);
                }
                Err(payload) => {
                    error!(
                        "Slide {} ({}) panicked: {}",
                        slide.id,
                        slide.slide_type,
                        panic_message(payload.as_ref())
                    );
                    self.publisher.clear();
                    report.failed.push(slide.id);
                }
            }
        }

        Ok(report)
    }

    async fn process_slide(
        &self,
        slide: &SlideConfig,
        slide_type: &dyn SlideType,
        ctx: &CollectorContext,
    ) -> Result<SlideOutcome> {
        let collector = self.pool.resolve(slide, slide_type, ctx);
        let data = match &collector {
            Some(collector) => collector.get_data().await,
            None => None,
        };

        if !slide_type.should_display(collector.as_deref(), data.as_ref(), slide) {
            debug!("Hiding slide {} '{}': nothing to show", slide.id, slide.title);
            self.publisher.clear();
            return Ok(SlideOutcome::Hidden);
        }

        let frame = slide_type
            .render(self.renderer.as_ref(), data.as_ref(), slide)
            .with_context(|| format!("Failed to render slide {}", slide.id))?;

        info!(
            "Showing slide {} '{}' ({}) for {:?}",
            slide.id,
            slide.title,
            slide.slide_type,
            slide.hold_duration()
        );
        self.present(slide, data, frame);
        self.hold(slide, slide_type, collector.as_deref()).await;
        Ok(SlideOutcome::Shown)
    }

    /// Publish a snapshot, then push its frame to every sink
    fn present(&self, slide: &SlideConfig, data: Option<SlideData>, frame: Frame) {
        let snapshot = CurrentSlide::new(slide.clone(), data, frame);
        let frame = snapshot.frame.clone();
        self.publisher.publish(snapshot);

        for sink in &self.sinks {
            if !sink.display_frame(&frame, slide.id) {
                warn!("Output sink '{}' failed to show slide {}", sink.name(), slide.id);
            }
        }
    }

    async fn hold(&self, slide: &SlideConfig, slide_type: &dyn SlideType, collector: Option<&Collector>) {
        let duration = slide.hold_duration();
        let interval = slide.refresh_interval();
        let start = Instant::now();
        let mut next_refresh = interval;
        let mut last_touch = Duration::ZERO;

        loop {
            if !self.is_running() {
                return;
            }
            let elapsed = start.elapsed();
            if elapsed >= duration {
                break;
            }

            let mut refreshed = false;
            if let (Some(interval), Some(due)) = (interval, next_refresh.as_mut()) {
                if elapsed >= *due {
                    // Coalesce boundaries missed under load into one refresh
                    while *due <= elapsed {
                        *due = due.saturating_add(interval);
                    }
                    refreshed = self.refresh(slide, slide_type, collector).await;
                }
            }

            if refreshed {
                last_touch = elapsed;
            } else if elapsed.saturating_sub(last_touch) >= self.timing.liveness {
                trace!("Touching slide {}", slide.id);
                self.publisher.touch(slide.id);
                last_touch = elapsed;
            }

            let remaining = duration.saturating_sub(start.elapsed());
            tokio::time::sleep(remaining.min(self.timing.tick)).await;
        }

        debug!("Slide {} hold complete after {:?}", slide.id, start.elapsed());
    }

    /// Re-fetch bypassing the cache and re-render in place.
    ///
    /// Does not re-check the conditional policy; a slide stays up for its
    /// whole hold even if the data goes away. A render failure keeps the
    /// previous frame.
    async fn refresh(&self, slide: &SlideConfig, slide_type: &dyn SlideType, collector: Option<&Collector>) -> bool {
        let data = match collector {
            Some(collector) => {
                collector.clear_cache().await;
                collector.get_data().await
            }
            None => None,
        };

        match slide_type.render(self.renderer.as_ref(), data.as_ref(), slide) {
            Ok(frame) => {
                debug!("Refreshed slide {}", slide.id);
                self.present(slide, data, frame);
                true
            }
            Err(e) => {
                warn!("Refresh of slide {} failed, keeping previous frame: {:#}", slide.id, e);
                false
            }
        }
    }

    /// Sleep in ticks; returns false if stopped early
    async fn pause(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        while self.is_running() {
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            tokio::time::sleep((deadline - now).min(self.timing.tick)).await;
        }
        false
    }
}
