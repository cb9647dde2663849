//! System statistics and weather slides

use super::{cached, enabled_service};
use homelab_hud_collectors::{SystemCollector, WeatherCollector, DEFAULT_CITY};
use homelab_hud_core::{Collector, CollectorContext, SlideType};
use homelab_hud_types::SlideConfig;

/// CPU, memory and NAS usage of the HUD host
pub struct SystemSlide;

impl SlideType for SystemSlide {
    fn type_name(&self) -> &str {
        "system_stats"
    }

    fn display_name(&self) -> &str {
        "System Stats"
    }

    fn create_collector(&self, slide: &SlideConfig, ctx: &CollectorContext) -> Option<Collector> {
        let service = enabled_service(slide, ctx, "system")?;
        let mounts = service.nas_mounts.as_ref().map(|m| m.paths()).unwrap_or_default();
        cached(SystemCollector::new(mounts, service.poll_interval_or(5)))
    }
}

/// Current conditions and a short forecast for one city
pub struct WeatherSlide;

impl WeatherSlide {
    /// Slide city first, then the weather service default
    fn city(slide: &SlideConfig, service_city: Option<&str>) -> String {
        [slide.city.as_deref(), service_city]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CITY)
            .to_string()
    }
}

impl SlideType for WeatherSlide {
    fn type_name(&self) -> &str {
        "weather"
    }

    fn display_name(&self) -> &str {
        "Weather"
    }

    fn create_collector(&self, slide: &SlideConfig, ctx: &CollectorContext) -> Option<Collector> {
        let service = enabled_service(slide, ctx, "weather")?;
        let city = Self::city(slide, service.city.as_deref());
        cached(WeatherCollector::new(&city, service.poll_interval_or(600), ctx.use_mocks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use homelab_hud_types::{ApiConfig, MountList, ServiceConfig};
    use serde_json::json;

    #[test]
    fn test_weather_city_precedence() {
        let mut slide = SlideConfig::new(5, "weather", "Weather");
        assert_eq!(WeatherSlide::city(&slide, None), DEFAULT_CITY);
        assert_eq!(WeatherSlide::city(&slide, Some("Berlin")), "Berlin");

        slide.city = Some("Oslo".to_string());
        assert_eq!(WeatherSlide::city(&slide, Some("Berlin")), "Oslo");

        slide.city = Some("   ".to_string());
        assert_eq!(WeatherSlide::city(&slide, Some("Berlin")), "Berlin");
    }

    #[test]
    fn test_system_always_has_collector() {
        let ctx = CollectorContext::new(ApiConfig { services: Default::default() }, false);
        let mut slide = SlideConfig::new(4, "system_stats", "System");
        slide.service_config = Some(ServiceConfig {
            nas_mounts: Some(MountList::Text("/mnt/a, /mnt/b".to_string())),
            ..Default::default()
        });
        let collector = SystemSlide.create_collector(&slide, &ctx).unwrap();
        assert_eq!(collector.name(), "system");
    }

    #[test]
    fn test_weather_disabled_globally() {
        let mut ctx = CollectorContext::default();
        ctx.api_config.services.get_mut("weather").unwrap().enabled = false;
        let slide = SlideConfig::new(5, "weather", "Weather");
        assert!(WeatherSlide.create_collector(&slide, &ctx).is_none());
    }

    #[tokio::test]
    async fn test_weather_mock_payload() {
        let ctx = CollectorContext::new(ApiConfig::default(), true);
        let slide = SlideConfig::new(5, "weather", "Weather");
        let collector = WeatherSlide.create_collector(&slide, &ctx).unwrap();
        let data = collector.get_data().await.unwrap();
        assert_eq!(data["current"]["condition"], json!("Partly Cloudy"));
    }
}
