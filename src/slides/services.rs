//! Slides backed by LAN services

use super::{cached, enabled_service};
use homelab_hud_collectors::{ArmCollector, OctoPrintCollector, PiholeCollector, PlexCollector};
use homelab_hud_core::{Collector, CollectorContext, SlideType};
use homelab_hud_types::{SlideConfig, SlideData};
use serde_json::Value;

/// Pi-hole blocking summary
pub struct PiholeSlide;

impl SlideType for PiholeSlide {
    fn type_name(&self) -> &str {
        "pihole_summary"
    }

    fn display_name(&self) -> &str {
        "Pi-hole Summary"
    }

    fn create_collector(&self, slide: &SlideConfig, ctx: &CollectorContext) -> Option<Collector> {
        let service = enabled_service(slide, ctx, "pihole")?;
        let url = service.base_url()?;
        cached(PiholeCollector::new(
            url,
            &service.api_token,
            service.poll_interval_or(10),
            ctx.use_mocks,
        ))
    }
}

/// Plex streams currently playing
pub struct PlexSlide;

impl SlideType for PlexSlide {
    fn type_name(&self) -> &str {
        "plex_now_playing"
    }

    fn display_name(&self) -> &str {
        "Plex Now Playing"
    }

    fn create_collector(&self, slide: &SlideConfig, ctx: &CollectorContext) -> Option<Collector> {
        let service = enabled_service(slide, ctx, "plex")?;
        let url = service.base_url()?;
        if service.api_token.trim().is_empty() {
            return None;
        }
        cached(PlexCollector::new(
            url,
            &service.api_token,
            service.poll_interval_or(5),
            ctx.use_mocks,
        ))
    }

    fn has_content(&self, _collector: Option<&Collector>, data: Option<&SlideData>, _slide: &SlideConfig) -> bool {
        data.and_then(|d| d.get("session_count"))
            .and_then(Value::as_u64)
            .is_some_and(|count| count > 0)
    }
}

/// Automatic Ripping Machine progress
pub struct ArmSlide;

impl SlideType for ArmSlide {
    fn type_name(&self) -> &str {
        "arm_rip_progress"
    }

    fn display_name(&self) -> &str {
        "ARM Rip Progress"
    }

    fn create_collector(&self, slide: &SlideConfig, ctx: &CollectorContext) -> Option<Collector> {
        let service = enabled_service(slide, ctx, "arm")?;
        let url = service.base_url()?;
        cached(ArmCollector::new(
            url,
            &service.api_key,
            service.endpoint.as_deref(),
            service.poll_interval_or(30),
            ctx.use_mocks,
        ))
    }

    // The collector reports nothing while the drive is idle
    fn has_content(&self, _collector: Option<&Collector>, data: Option<&SlideData>, _slide: &SlideConfig) -> bool {
        data.is_some()
    }
}

/// OctoPrint job progress and temperatures
pub struct OctoPrintSlide;

impl SlideType for OctoPrintSlide {
    fn type_name(&self) -> &str {
        "octopi_print"
    }

    fn display_name(&self) -> &str {
        "OctoPrint Status"
    }

    fn create_collector(&self, slide: &SlideConfig, ctx: &CollectorContext) -> Option<Collector> {
        let service = enabled_service(slide, ctx, "octopi")?;
        let url = service.base_url()?;
        cached(OctoPrintCollector::new(
            url,
            &service.api_key,
            service.poll_interval_or(5),
            ctx.use_mocks,
        ))
    }

    fn has_content(&self, _collector: Option<&Collector>, data: Option<&SlideData>, _slide: &SlideConfig) -> bool {
        data.and_then(|d| d.get("is_printing"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use homelab_hud_types::{into_slide_data, ApiConfig, ServiceConfig};
    use serde_json::json;

    fn conditional(slide_type: &str) -> SlideConfig {
        let mut slide = SlideConfig::new(1, slide_type, "t");
        slide.conditional = true;
        slide
    }

    #[test]
    fn test_plex_needs_url_and_token() {
        let ctx = CollectorContext::default();
        let mut slide = SlideConfig::new(2, "plex_now_playing", "Now Playing");
        assert!(PlexSlide.create_collector(&slide, &ctx).is_none());

        slide.service_config = Some(ServiceConfig {
            api_token: "token".to_string(),
            ..Default::default()
        });
        let collector = PlexSlide.create_collector(&slide, &ctx).unwrap();
        assert_eq!(collector.name(), "plex");
    }

    #[test]
    fn test_missing_url_yields_no_collector() {
        let ctx = CollectorContext::new(ApiConfig { services: Default::default() }, false);
        let slide = SlideConfig::new(1, "pihole_summary", "Pi-hole");
        assert!(PiholeSlide.create_collector(&slide, &ctx).is_none());
        assert!(ArmSlide.create_collector(&slide, &ctx).is_none());
        assert!(OctoPrintSlide.create_collector(&slide, &ctx).is_none());
    }

    #[test]
    fn test_plex_shows_only_with_sessions() {
        let slide = conditional("plex_now_playing");
        let idle = into_slide_data(json!({"session_count": 0, "sessions": []}));
        let busy = into_slide_data(json!({"session_count": 2, "sessions": []}));
        assert!(!PlexSlide.should_display(None, Some(&idle), &slide));
        assert!(PlexSlide.should_display(None, Some(&busy), &slide));
        assert!(!PlexSlide.should_display(None, None, &slide));

        let always = SlideConfig::new(1, "plex_now_playing", "t");
        assert!(PlexSlide.should_display(None, None, &always));
    }

    #[test]
    fn test_octoprint_shows_only_while_printing() {
        let slide = conditional("octopi_print");
        let idle = into_slide_data(json!({"is_printing": false, "state": "operational"}));
        let printing = into_slide_data(json!({"is_printing": true}));
        assert!(!OctoPrintSlide.should_display(None, Some(&idle), &slide));
        assert!(OctoPrintSlide.should_display(None, Some(&printing), &slide));
    }

    #[test]
    fn test_arm_shows_while_ripping() {
        let slide = conditional("arm_rip_progress");
        let rip = into_slide_data(json!({"stage": "ripping"}));
        assert!(ArmSlide.should_display(None, Some(&rip), &slide));
        assert!(!ArmSlide.should_display(None, None, &slide));
    }

    #[tokio::test]
    async fn test_mock_mode_feeds_pihole() {
        let ctx = CollectorContext::new(ApiConfig::default(), true);
        let slide = SlideConfig::new(1, "pihole_summary", "Pi-hole");
        let collector = PiholeSlide.create_collector(&slide, &ctx).unwrap();
        let data = collector.get_data().await.unwrap();
        assert_eq!(data["status"], json!("enabled"));
    }
}
