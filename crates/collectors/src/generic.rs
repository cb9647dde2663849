//! Generic HTTP collector for custom slides

use crate::http::{request_error, status_error, HTTP_CLIENT};
use async_trait::async_trait;
use homelab_hud_core::{CollectorError, DataCollector};
use homelab_hud_types::{extract_path, into_slide_data, GenericApiConfig, SlideData};
use log::trace;
use reqwest::Method;
use serde_json::{json, Value};
use std::time::Duration;

/// Turn a response body into slide data.
///
/// Non-JSON bodies are kept as `raw_response`. With a data path other than
/// `$`, only the extracted part is returned; a path that matches nothing
/// yields no data.
pub(crate) fn shape_response(body: &str, data_path: &str) -> Option<SlideData> {
    let parsed: Value = serde_json::from_str(body).unwrap_or_else(|_| json!({ "raw_response": body }));

    let path = data_path.trim();
    if path.is_empty() || path == "$" {
        return Some(into_slide_data(parsed));
    }
    extract_path(&parsed, path).cloned().map(into_slide_data)
}

fn parse_method(method: &str) -> Result<Method, CollectorError> {
    match method.trim().to_uppercase().as_str() {
        "" | "GET" => Ok(Method::GET),
        "POST" => Ok(Method::POST),
        "PUT" => Ok(Method::PUT),
        "DELETE" => Ok(Method::DELETE),
        other => Err(CollectorError::Config(format!("unsupported HTTP method '{}'", other))),
    }
}

/// Collector for an arbitrary user-configured endpoint
pub struct GenericCollector {
    config: GenericApiConfig,
    method: Method,
    headers: Vec<(String, String)>,
}

impl GenericCollector {
    pub fn new(config: GenericApiConfig) -> Result<Self, CollectorError> {
        if config.endpoint.trim().is_empty() {
            return Err(CollectorError::Config("no endpoint configured".to_string()));
        }
        let method = parse_method(&config.method)?;
        let headers = config.headers.pairs();
        Ok(Self {
            config,
            method,
            headers,
        })
    }

    fn has_header(&self, name: &str) -> bool {
        self.headers.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
    }
}

#[async_trait]
impl DataCollector for GenericCollector {
    fn name(&self) -> &str {
        "custom"
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.config.refresh_interval.max(1))
    }

    async fn fetch(&self) -> Result<Option<SlideData>, CollectorError> {
        let url = self.config.endpoint.trim();
        let mut request = HTTP_CLIENT
            .request(self.method.clone(), url)
            .timeout(Duration::from_secs(self.config.timeout.max(1)));

        for (name, value) in &self.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        if self.method == Method::POST || self.method == Method::PUT {
            match &self.config.body {
                Some(Value::String(text)) => {
                    if !self.has_header("Content-Type") {
                        request = request.header("Content-Type", "text/plain");
                    }
                    request = request.body(text.clone());
                }
                Some(body) => request = request.json(body),
                None => {}
            }
        }

        let response = request.send().await.map_err(|e| request_error(url, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_error(url, status));
        }
        let body = response.text().await.map_err(|e| request_error(url, e))?;
        trace!("Custom endpoint {} returned {} bytes", url, body.len());

        Ok(shape_response(&body, &self.config.data_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_path_returns_whole_object() {
        let data = shape_response(r#"{"cpu": {"percent": 12}}"#, "$").unwrap();
        assert_eq!(data["cpu"]["percent"], json!(12));
    }

    #[test]
    fn test_extracted_scalars_are_wrapped() {
        let body = r#"{"items": [{"name": "a"}, {"name": "b"}]}"#;
        let data = shape_response(body, "items[1].name").unwrap();
        assert_eq!(data["value"], json!("b"));

        let data = shape_response(body, "$.items[0]").unwrap();
        assert_eq!(data["name"], json!("a"));

        assert!(shape_response(body, "items[5]").is_none());
    }

    #[test]
    fn test_non_json_body_is_kept_raw() {
        let data = shape_response("OK all good", "$").unwrap();
        assert_eq!(data["raw_response"], json!("OK all good"));

        let data = shape_response("[1, 2]", "").unwrap();
        assert_eq!(data["value"], json!([1, 2]));
    }

    #[test]
    fn test_method_and_endpoint_validation() {
        let config = GenericApiConfig {
            endpoint: "http://localhost:9000/stats".to_string(),
            method: "patch".to_string(),
            ..Default::default()
        };
        assert!(matches!(GenericCollector::new(config), Err(CollectorError::Config(_))));

        let config = GenericApiConfig {
            endpoint: "  ".to_string(),
            ..Default::default()
        };
        assert!(GenericCollector::new(config).is_err());

        let config = GenericApiConfig {
            endpoint: "http://localhost:9000/stats".to_string(),
            method: "post".to_string(),
            ..Default::default()
        };
        let collector = GenericCollector::new(config).unwrap();
        assert_eq!(collector.method, Method::POST);
        assert_eq!(collector.poll_interval(), Duration::from_secs(30));
    }
}
