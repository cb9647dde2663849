//! Built-in slide types
//!
//! One descriptor per slide kind. Descriptors for networked services build
//! their collector from the slide's `service_config`, with blanks filled in
//! from the global API config; a disabled or unconfigured service simply
//! yields no collector.

mod content;
mod local;
mod services;

pub use content::{ClockSlide, CustomSlide, ImageSlide, StaticTextSlide};
pub use local::{SystemSlide, WeatherSlide};
pub use services::{ArmSlide, OctoPrintSlide, PiholeSlide, PlexSlide};

use homelab_hud_core::{Collector, CollectorContext, DataCollector, SlideTypeRegistry};
use homelab_hud_types::{ServiceConfig, SlideConfig};
use log::debug;
use std::sync::Arc;

/// Registry holding every built-in slide type
pub fn builtin_registry() -> SlideTypeRegistry {
    SlideTypeRegistry::new()
        .with(Arc::new(PiholeSlide))
        .with(Arc::new(PlexSlide))
        .with(Arc::new(ArmSlide))
        .with(Arc::new(OctoPrintSlide))
        .with(Arc::new(SystemSlide))
        .with(Arc::new(WeatherSlide))
        .with(Arc::new(CustomSlide))
        .with(Arc::new(StaticTextSlide))
        .with(Arc::new(ImageSlide))
        .with(Arc::new(ClockSlide))
}

/// Effective settings for `service`, or `None` when it is switched off
pub(crate) fn enabled_service(slide: &SlideConfig, ctx: &CollectorContext, service: &str) -> Option<ServiceConfig> {
    let resolved = ctx.api_config.resolve(service, slide.service_config.as_ref());
    if resolved.enabled {
        Some(resolved)
    } else {
        debug!("Service '{}' is disabled, slide {} gets no collector", service, slide.id);
        None
    }
}

pub(crate) fn cached<C: DataCollector + 'static>(source: C) -> Option<Collector> {
    Some(Collector::new(Box::new(source)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_covers_every_kind() {
        let registry = builtin_registry();
        assert_eq!(
            registry.list(),
            vec![
                "arm_rip_progress",
                "clock",
                "custom",
                "image",
                "octopi_print",
                "pihole_summary",
                "plex_now_playing",
                "static_text",
                "system_stats",
                "weather",
            ]
        );
        assert!(registry.lookup("pihole").is_none());
    }

    #[test]
    fn test_disabled_service_yields_no_collector() {
        let mut ctx = CollectorContext::default();
        ctx.api_config.services.get_mut("pihole").unwrap().enabled = false;
        let slide = SlideConfig::new(1, "pihole_summary", "Pi-hole");
        assert!(enabled_service(&slide, &ctx, "pihole").is_none());
        assert!(enabled_service(&slide, &ctx, "plex").is_some());
    }
}
