//! Slide type descriptor trait
//!
//! One descriptor per slide kind. It decides how a slide gets its data,
//! whether the slide should appear at all, and how it is drawn.

use crate::collector::Collector;
use crate::frame::{Frame, SlideRenderer};
use anyhow::Result;
use homelab_hud_types::{ApiConfig, SlideConfig, SlideData};

/// Process-wide inputs to collector construction
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectorContext {
    /// Global per-service defaults, merged under each slide's own settings
    pub api_config: ApiConfig,
    /// Return fixture payloads instead of calling real services
    pub use_mocks: bool,
}

impl CollectorContext {
    pub fn new(api_config: ApiConfig, use_mocks: bool) -> Self {
        Self { api_config, use_mocks }
    }

    /// Changes here invalidate every pooled collector
    pub fn fingerprint(&self) -> String {
        format!(
            "{}|{}",
            self.use_mocks,
            serde_json::to_string(&self.api_config).unwrap_or_default()
        )
    }
}

/// Descriptor for one slide kind
pub trait SlideType: Send + Sync {
    /// Type tag as stored in the slide configuration (e.g. "pihole_summary")
    fn type_name(&self) -> &str;

    /// Human readable name
    fn display_name(&self) -> &str;

    /// Build the collector for a slide of this kind.
    ///
    /// `None` means the slide has no data source: either the kind needs none,
    /// or required connection settings are missing. Neither is an error.
    fn create_collector(&self, slide: &SlideConfig, ctx: &CollectorContext) -> Option<Collector>;

    /// Type-specific "is there anything worth showing" predicate.
    ///
    /// Only consulted for conditional slides. The default treats the presence
    /// of a collector and of data as the activity signal.
    fn has_content(&self, collector: Option<&Collector>, data: Option<&SlideData>, slide: &SlideConfig) -> bool {
        let _ = slide;
        collector.is_some() && data.is_some()
    }

    /// Conditional-display policy. Non-conditional slides always show.
    fn should_display(&self, collector: Option<&Collector>, data: Option<&SlideData>, slide: &SlideConfig) -> bool {
        if !slide.conditional {
            return true;
        }
        self.has_content(collector, data, slide)
    }

    fn render(&self, renderer: &dyn SlideRenderer, data: Option<&SlideData>, slide: &SlideConfig) -> Result<Frame> {
        renderer.render(self.type_name(), data, slide)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use homelab_hud_types::into_slide_data;
    use serde_json::json;

    struct Plain;

    impl SlideType for Plain {
        fn type_name(&self) -> &str {
            "plain"
        }

        fn display_name(&self) -> &str {
            "Plain"
        }

        fn create_collector(&self, _slide: &SlideConfig, _ctx: &CollectorContext) -> Option<Collector> {
            None
        }
    }

    #[test]
    fn test_non_conditional_always_displays() {
        let slide = SlideConfig::new(1, "plain", "Plain");
        assert!(Plain.should_display(None, None, &slide));
        let empty = SlideData::new();
        assert!(Plain.should_display(None, Some(&empty), &slide));
    }

    #[test]
    fn test_conditional_without_collector_hides() {
        let mut slide = SlideConfig::new(1, "plain", "Plain");
        slide.conditional = true;
        let data = into_slide_data(json!({"x": 1}));
        assert!(!Plain.should_display(None, Some(&data), &slide));
        assert!(!Plain.should_display(None, None, &slide));
    }

    #[test]
    fn test_context_fingerprint_tracks_mock_mode() {
        let live = CollectorContext::new(ApiConfig::default(), false);
        let mock = CollectorContext::new(ApiConfig::default(), true);
        assert_ne!(live.fingerprint(), mock.fingerprint());
        assert_eq!(live.fingerprint(), live.clone().fingerprint());
    }
}
