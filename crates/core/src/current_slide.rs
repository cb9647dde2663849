//! Shared snapshot of what is currently on screen
//!
//! The scheduler is the only writer; the status API and preview endpoints
//! read. A snapshot is immutable once published and is replaced wholesale,
//! so readers always see one slide's title, data and frame together.

use crate::frame::Frame;
use chrono::{DateTime, Utc};
use homelab_hud_types::{SlideConfig, SlideData};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tokio::time::Instant;

/// Everything known about the slide being held
#[derive(Debug, Clone)]
pub struct CurrentSlide {
    pub slide: SlideConfig,
    pub slide_type: String,
    pub title: String,
    pub data: Option<SlideData>,
    pub frame: Arc<Frame>,
    /// Wall-clock time of the last publish or liveness touch
    pub timestamp: DateTime<Utc>,
    /// Monotonic counterpart of `timestamp`
    pub refreshed_at: Instant,
}

impl CurrentSlide {
    pub fn new(slide: SlideConfig, data: Option<SlideData>, frame: Frame) -> Self {
        Self {
            slide_type: slide.slide_type.clone(),
            title: slide.title.clone(),
            slide,
            data,
            frame: Arc::new(frame),
            timestamp: Utc::now(),
            refreshed_at: Instant::now(),
        }
    }

    pub fn status(&self) -> SlideStatus {
        SlideStatus {
            id: self.slide.id,
            title: self.title.clone(),
            slide_type: self.slide_type.clone(),
            timestamp: self.timestamp.timestamp_millis() as f64 / 1000.0,
            has_data: self.data.is_some(),
            conditional: self.slide.conditional,
        }
    }
}

/// JSON view of the current slide for the status API
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SlideStatus {
    pub id: u32,
    pub title: String,
    #[serde(rename = "type")]
    pub slide_type: String,
    /// Seconds since the Unix epoch
    pub timestamp: f64,
    pub has_data: bool,
    pub conditional: bool,
}

/// Latest-wins holder of the current snapshot
#[derive(Clone, Default)]
pub struct CurrentSlidePublisher {
    inner: Arc<Mutex<Option<Arc<CurrentSlide>>>>,
}

impl CurrentSlidePublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, slide: CurrentSlide) {
        let slide = Arc::new(slide);
        *self.inner.lock().unwrap_or_else(|p| p.into_inner()) = Some(slide);
    }

    /// Report that nothing is showing
    pub fn clear(&self) {
        *self.inner.lock().unwrap_or_else(|p| p.into_inner()) = None;
    }

    /// Refresh the timestamp of the current snapshot without changing content.
    ///
    /// Only touches a snapshot for `slide_id`, so a late touch cannot revive
    /// a slide that has already been replaced.
    pub fn touch(&self, slide_id: u32) -> bool {
        let mut guard = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        match guard.as_ref() {
            Some(current) if current.slide.id == slide_id => {
                let mut next = CurrentSlide::clone(current);
                next.timestamp = Utc::now();
                next.refreshed_at = Instant::now();
                *guard = Some(Arc::new(next));
                true
            }
            _ => false,
        }
    }

    /// Cheap copy of the current snapshot; the lock is released on return
    pub fn current(&self) -> Option<Arc<CurrentSlide>> {
        self.inner.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}
