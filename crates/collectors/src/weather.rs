//! Weather collector backed by wttr.in

use crate::http::{fetch_json, number, text, HTTP_CLIENT};
use crate::{mock, to_slide_data};
use async_trait::async_trait;
use homelab_hud_core::{CollectorError, DataCollector};
use homelab_hud_types::SlideData;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// City used when a weather slide does not name one
pub const DEFAULT_CITY: &str = "New York";

const FORECAST_DAYS: usize = 3;

#[derive(Debug, Serialize)]
struct Current {
    temp_c: f64,
    condition: String,
    humidity: i64,
    wind_kph: f64,
    feelslike_c: f64,
}

#[derive(Debug, Serialize)]
struct ForecastDay {
    date: String,
    maxtemp_c: f64,
    mintemp_c: f64,
    condition: String,
    daily_chance_of_rain: i64,
}

#[derive(Debug, Serialize)]
struct Weather {
    current: Current,
    forecast: Vec<ForecastDay>,
}

/// `weatherDesc: [{"value": "..."}]`
fn description(value: &Value) -> String {
    text(
        value
            .get("weatherDesc")
            .and_then(|d| d.get(0))
            .and_then(|d| d.get("value")),
        "Unknown",
    )
}

fn forecast_day(day: &Value) -> ForecastDay {
    let first_hour = day.get("hourly").and_then(|h| h.get(0)).cloned().unwrap_or(Value::Null);
    let hourly_temp = number(first_hour.get("tempC"));
    let or_hourly = |key: &str| {
        if day.get(key).is_some() {
            number(day.get(key))
        } else {
            hourly_temp
        }
    };
    ForecastDay {
        date: text(day.get("date"), ""),
        maxtemp_c: or_hourly("maxtempC"),
        mintemp_c: or_hourly("mintempC"),
        condition: description(&first_hour),
        daily_chance_of_rain: number(first_hour.get("chanceofrain")) as i64,
    }
}

/// Parse a `?format=j1` response; `None` without current conditions
pub(crate) fn parse_wttr(response: &Value) -> Result<Option<SlideData>, CollectorError> {
    let current = match response.get("current_condition").and_then(|c| c.get(0)) {
        Some(Value::Object(map)) if !map.is_empty() => Value::Object(map.clone()),
        _ => return Ok(None),
    };

    let forecast = response
        .get("weather")
        .and_then(Value::as_array)
        .map(|days| days.iter().take(FORECAST_DAYS).map(forecast_day).collect())
        .unwrap_or_default();

    let weather = Weather {
        current: Current {
            temp_c: number(current.get("temp_C")),
            condition: description(&current),
            humidity: number(current.get("humidity")) as i64,
            wind_kph: number(current.get("windspeedKmph")),
            feelslike_c: number(current.get("FeelsLikeC")),
        },
        forecast,
    };
    Ok(Some(to_slide_data(&weather)?))
}

/// Collector for one city's conditions and short forecast
pub struct WeatherCollector {
    city: String,
    poll_interval: Duration,
    use_mocks: bool,
}

impl WeatherCollector {
    pub fn new(city: &str, poll_interval_secs: u64, use_mocks: bool) -> Self {
        let city = city.trim();
        Self {
            city: if city.is_empty() { DEFAULT_CITY } else { city }.to_string(),
            poll_interval: Duration::from_secs(poll_interval_secs),
            use_mocks,
        }
    }

    pub fn city(&self) -> &str {
        &self.city
    }
}

#[async_trait]
impl DataCollector for WeatherCollector {
    fn name(&self) -> &str {
        "weather"
    }

    fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    async fn fetch(&self) -> Result<Option<SlideData>, CollectorError> {
        if self.use_mocks {
            return Ok(Some(mock::weather()));
        }

        // City goes in as a percent-encoded path segment
        let mut url = reqwest::Url::parse("https://wttr.in/")
            .map_err(|e| CollectorError::Config(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| CollectorError::Config("wttr.in URL cannot take a path".to_string()))?
            .pop_if_empty()
            .push(&self.city);
        let display_url = url.to_string();

        let response = fetch_json(HTTP_CLIENT.get(url).query(&[("format", "j1")]), &display_url).await?;
        parse_wttr(&response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_current_and_three_days() {
        let day = |date: &str, max: &str, min: &str| {
            json!({
                "date": date,
                "maxtempC": max,
                "mintempC": min,
                "hourly": [{"tempC": "15", "chanceofrain": "40", "weatherDesc": [{"value": "Light rain"}]}]
            })
        };
        let response = json!({
            "current_condition": [{
                "temp_C": "18",
                "FeelsLikeC": "17",
                "humidity": "81",
                "windspeedKmph": "11",
                "weatherDesc": [{"value": "Overcast"}]
            }],
            "weather": [
                day("2024-05-01", "20", "12"),
                day("2024-05-02", "22", "13"),
                day("2024-05-03", "19", "11"),
                day("2024-05-04", "25", "15")
            ]
        });

        let data = parse_wttr(&response).unwrap().unwrap();
        assert_eq!(data["current"]["temp_c"], json!(18.0));
        assert_eq!(data["current"]["humidity"], json!(81));
        assert_eq!(data["current"]["condition"], json!("Overcast"));
        let forecast = data["forecast"].as_array().unwrap();
        assert_eq!(forecast.len(), 3);
        assert_eq!(forecast[1]["maxtemp_c"], json!(22.0));
        assert_eq!(forecast[0]["daily_chance_of_rain"], json!(40));
        assert_eq!(forecast[0]["condition"], json!("Light rain"));
    }

    #[test]
    fn test_forecast_falls_back_to_hourly_temp() {
        let response = json!({
            "current_condition": [{"temp_C": "5"}],
            "weather": [{"date": "2024-01-01", "hourly": [{"tempC": "3"}]}]
        });
        let data = parse_wttr(&response).unwrap().unwrap();
        assert_eq!(data["forecast"][0]["maxtemp_c"], json!(3.0));
        assert_eq!(data["forecast"][0]["condition"], json!("Unknown"));
    }

    #[test]
    fn test_missing_current_conditions_is_none() {
        assert!(parse_wttr(&json!({"weather": []})).unwrap().is_none());
        assert!(parse_wttr(&json!({"current_condition": [{}]})).unwrap().is_none());
    }

    #[test]
    fn test_blank_city_uses_default() {
        assert_eq!(WeatherCollector::new("  ", 600, false).city(), DEFAULT_CITY);
        assert_eq!(WeatherCollector::new("Oslo", 600, false).city(), "Oslo");
    }
}
