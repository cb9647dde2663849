//! Slide configuration.
//!
//! One [`SlideConfig`] per panel in the rotation. The list is re-read from
//! disk at the start of every scheduler pass, so nothing here is cached.

use crate::service::{GenericApiConfig, ServiceConfig};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

fn default_duration() -> f64 {
    10.0
}

fn default_refresh_duration() -> f64 {
    5.0
}

fn default_enabled() -> bool {
    true
}

/// Declarative configuration for one slide
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlideConfig {
    /// Stable unique identifier
    pub id: u32,
    /// Slide kind, selects the slide type descriptor (e.g. "pihole_summary")
    #[serde(rename = "type")]
    pub slide_type: String,
    #[serde(default)]
    pub title: String,
    /// Sort key; ties keep file order
    #[serde(default)]
    pub order: i64,
    /// Seconds the slide is held on screen
    #[serde(default = "default_duration")]
    pub duration: f64,
    /// Seconds between data refreshes while held
    #[serde(default = "default_refresh_duration")]
    pub refresh_duration: f64,
    /// Hide the slide entirely when its data is absent
    #[serde(default)]
    pub conditional: bool,
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_config: Option<ServiceConfig>,
    /// Request description for custom slides
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_config: Option<GenericApiConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    /// Widget layout for custom slides
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub widgets: Vec<Value>,

    /// Display options and other type-specific keys we do not interpret
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

fn seconds(value: f64) -> Duration {
    if value.is_finite() && value > 0.0 {
        Duration::try_from_secs_f64(value).unwrap_or(Duration::MAX)
    } else {
        Duration::ZERO
    }
}

impl SlideConfig {
    /// Minimal slide of the given type, mostly useful for defaults and tests
    pub fn new(id: u32, slide_type: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id,
            slide_type: slide_type.into(),
            title: title.into(),
            order: 0,
            duration: default_duration(),
            refresh_duration: default_refresh_duration(),
            conditional: false,
            enabled: true,
            service_config: None,
            api_config: None,
            city: None,
            temp_unit: None,
            text: None,
            image_path: None,
            widgets: Vec::new(),
            extra: BTreeMap::new(),
        }
    }

    /// How long the slide stays on screen. Invalid values collapse to zero.
    pub fn hold_duration(&self) -> Duration {
        seconds(self.duration)
    }

    /// Interval between in-place refreshes, `None` when refreshing is off.
    ///
    /// Values larger than the hold duration are allowed; they simply never fire.
    pub fn refresh_interval(&self) -> Option<Duration> {
        let interval = seconds(self.refresh_duration);
        if interval.is_zero() {
            None
        } else {
            Some(interval)
        }
    }

    /// Stable fingerprint of everything that affects data collection.
    ///
    /// Extra keys live in a `BTreeMap`, so serialisation order is stable.
    pub fn fingerprint(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{}:{}", self.id, self.slide_type))
    }
}

/// The whole slide list as stored on disk
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlidesConfig {
    #[serde(default)]
    pub slides: Vec<SlideConfig>,
}

impl SlidesConfig {
    /// Enabled slides sorted by `order`; equal keys keep their file order.
    pub fn rotation(&self) -> Vec<SlideConfig> {
        let mut slides: Vec<SlideConfig> = self.slides.iter().filter(|s| s.enabled).cloned().collect();
        // sort_by_key is stable
        slides.sort_by_key(|s| s.order);
        slides
    }
}

impl Default for SlidesConfig {
    fn default() -> Self {
        let slide = |id, slide_type: &str, title: &str, duration, refresh, order, conditional| SlideConfig {
            order,
            duration,
            refresh_duration: refresh,
            conditional,
            ..SlideConfig::new(id, slide_type, title)
        };
        Self {
            slides: vec![
                slide(1, "pihole_summary", "Pi-hole Stats", 10.0, 5.0, 0, false),
                slide(2, "plex_now_playing", "Now Playing", 15.0, 1.0, 1, true),
                slide(3, "arm_rip_progress", "ARM Rip Progress", 15.0, 2.0, 2, true),
                slide(4, "system_stats", "System Stats", 10.0, 5.0, 3, false),
            ],
        }
    }
}
