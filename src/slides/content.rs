//! Slides that carry their own content

use super::cached;
use homelab_hud_collectors::GenericCollector;
use homelab_hud_core::{Collector, CollectorContext, SlideType};
use homelab_hud_types::{SlideConfig, SlideData};
use log::warn;

fn non_empty(value: Option<&String>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

/// User-defined widgets fed by an arbitrary HTTP endpoint
pub struct CustomSlide;

impl SlideType for CustomSlide {
    fn type_name(&self) -> &str {
        "custom"
    }

    fn display_name(&self) -> &str {
        "Custom"
    }

    fn create_collector(&self, slide: &SlideConfig, _ctx: &CollectorContext) -> Option<Collector> {
        let api = slide.api_config.as_ref()?;
        if api.endpoint.trim().is_empty() {
            return None;
        }
        match GenericCollector::new(api.clone()) {
            Ok(source) => cached(source),
            Err(e) => {
                warn!("Custom slide {} has an unusable API config: {}", slide.id, e);
                None
            }
        }
    }

    fn has_content(&self, _collector: Option<&Collector>, _data: Option<&SlideData>, slide: &SlideConfig) -> bool {
        !slide.widgets.is_empty()
    }
}

pub struct StaticTextSlide;

impl SlideType for StaticTextSlide {
    fn type_name(&self) -> &str {
        "static_text"
    }

    fn display_name(&self) -> &str {
        "Static Text"
    }

    fn create_collector(&self, _slide: &SlideConfig, _ctx: &CollectorContext) -> Option<Collector> {
        None
    }

    fn has_content(&self, _collector: Option<&Collector>, _data: Option<&SlideData>, slide: &SlideConfig) -> bool {
        non_empty(slide.text.as_ref())
    }
}

pub struct ImageSlide;

impl SlideType for ImageSlide {
    fn type_name(&self) -> &str {
        "image"
    }

    fn display_name(&self) -> &str {
        "Image"
    }

    fn create_collector(&self, _slide: &SlideConfig, _ctx: &CollectorContext) -> Option<Collector> {
        None
    }

    fn has_content(&self, _collector: Option<&Collector>, _data: Option<&SlideData>, slide: &SlideConfig) -> bool {
        non_empty(slide.image_path.as_ref())
    }
}

pub struct ClockSlide;

impl SlideType for ClockSlide {
    fn type_name(&self) -> &str {
        "clock"
    }

    fn display_name(&self) -> &str {
        "Clock"
    }

    fn create_collector(&self, _slide: &SlideConfig, _ctx: &CollectorContext) -> Option<Collector> {
        None
    }

    fn has_content(&self, _collector: Option<&Collector>, _data: Option<&SlideData>, _slide: &SlideConfig) -> bool {
        true
    }
}
