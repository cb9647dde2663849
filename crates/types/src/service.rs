//! Service connection settings.
//!
//! A slide may carry its own `service_config`; anything it leaves blank is
//! filled from the matching entry of the global [`ApiConfig`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

fn default_enabled() -> bool {
    true
}

/// NAS mount list, stored either as a comma-separated string (slide editor)
/// or as a JSON list (global service config).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MountList {
    Text(String),
    List(Vec<String>),
}

impl MountList {
    /// Normalised list of non-empty mount paths
    pub fn paths(&self) -> Vec<String> {
        match self {
            MountList::Text(text) => text
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            MountList::List(list) => list
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

/// Connection settings for one upstream service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Base URL of the service
    #[serde(default)]
    pub api_url: String,
    /// Token style credential (Pi-hole, Plex)
    #[serde(default)]
    pub api_token: String,
    /// Key style credential (ARM, OctoPrint)
    #[serde(default)]
    pub api_key: String,
    /// Endpoint path appended to `api_url` (ARM)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Nominal poll interval in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_interval: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nas_mounts: Option<MountList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// Unknown keys are preserved so hand-edited files round-trip
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_url: String::new(),
            api_token: String::new(),
            api_key: String::new(),
            endpoint: None,
            poll_interval: None,
            nas_mounts: None,
            city: None,
            extra: BTreeMap::new(),
        }
    }
}

fn pick(primary: &str, fallback: &str) -> String {
    if primary.trim().is_empty() {
        fallback.to_string()
    } else {
        primary.to_string()
    }
}

impl ServiceConfig {
    /// Fill blank fields of `self` from `fallback`.
    ///
    /// A service disabled in either place stays disabled.
    pub fn merged_with(&self, fallback: &ServiceConfig) -> ServiceConfig {
        let mut extra = fallback.extra.clone();
        extra.extend(self.extra.clone());
        ServiceConfig {
            enabled: self.enabled && fallback.enabled,
            api_url: pick(&self.api_url, &fallback.api_url),
            api_token: pick(&self.api_token, &fallback.api_token),
            api_key: pick(&self.api_key, &fallback.api_key),
            endpoint: self.endpoint.clone().or_else(|| fallback.endpoint.clone()),
            poll_interval: self.poll_interval.or(fallback.poll_interval),
            nas_mounts: self.nas_mounts.clone().or_else(|| fallback.nas_mounts.clone()),
            city: self.city.clone().or_else(|| fallback.city.clone()),
            extra,
        }
    }

    /// Base URL without a trailing slash, `None` when not configured
    pub fn base_url(&self) -> Option<&str> {
        let url = self.api_url.trim().trim_end_matches('/');
        if url.is_empty() {
            None
        } else {
            Some(url)
        }
    }

    pub fn poll_interval_or(&self, default_secs: u64) -> u64 {
        self.poll_interval.filter(|v| *v > 0).unwrap_or(default_secs)
    }
}

/// Global per-service defaults, keyed by service name (`pihole`, `plex`, ...)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct ApiConfig {
    pub services: BTreeMap<String, ServiceConfig>,
}

impl ApiConfig {
    pub fn service(&self, name: &str) -> Option<&ServiceConfig> {
        self.services.get(name)
    }

    /// Resolve the effective settings for a slide's service.
    ///
    /// The slide's own settings win; blanks come from the global entry.
    pub fn resolve(&self, name: &str, slide: Option<&ServiceConfig>) -> ServiceConfig {
        match (slide, self.service(name)) {
            (Some(own), Some(global)) => own.merged_with(global),
            (Some(own), None) => own.clone(),
            (None, Some(global)) => global.clone(),
            (None, None) => ServiceConfig::default(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        let mut services = BTreeMap::new();
        services.insert(
            "arm".to_string(),
            ServiceConfig {
                api_url: "http://localhost:8080".to_string(),
                endpoint: Some("/json?mode=joblist".to_string()),
                poll_interval: Some(30),
                ..Default::default()
            },
        );
        services.insert(
            "octopi".to_string(),
            ServiceConfig {
                api_url: "http://octopi.local".to_string(),
                poll_interval: Some(5),
                ..Default::default()
            },
        );
        services.insert(
            "pihole".to_string(),
            ServiceConfig {
                api_url: "http://localhost/admin".to_string(),
                poll_interval: Some(10),
                ..Default::default()
            },
        );
        services.insert(
            "plex".to_string(),
            ServiceConfig {
                api_url: "http://localhost:32400".to_string(),
                poll_interval: Some(5),
                ..Default::default()
            },
        );
        services.insert(
            "system".to_string(),
            ServiceConfig {
                poll_interval: Some(5),
                nas_mounts: Some(MountList::List(vec![
                    "/mnt/nas".to_string(),
                    "/media/nas".to_string(),
                ])),
                ..Default::default()
            },
        );
        services.insert(
            "weather".to_string(),
            ServiceConfig {
                poll_interval: Some(600),
                city: Some("New York".to_string()),
                ..Default::default()
            },
        );
        Self { services }
    }
}

/// HTTP headers for the generic collector.
///
/// The slide editor stores them as a JSON string, hand-written configs
/// usually as an object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum HeaderSpec {
    Map(BTreeMap<String, Value>),
    Json(String),
}

impl Default for HeaderSpec {
    fn default() -> Self {
        HeaderSpec::Map(BTreeMap::new())
    }
}

fn header_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl HeaderSpec {
    /// Resolve to header pairs. A malformed JSON string yields no headers.
    pub fn pairs(&self) -> Vec<(String, String)> {
        match self {
            HeaderSpec::Map(map) => map
                .iter()
                .map(|(k, v)| (k.clone(), header_value(v)))
                .collect(),
            HeaderSpec::Json(text) => {
                if text.trim().is_empty() {
                    return Vec::new();
                }
                match serde_json::from_str::<Map<String, Value>>(text) {
                    Ok(map) => map.iter().map(|(k, v)| (k.clone(), header_value(v))).collect(),
                    Err(e) => {
                        log::warn!("Ignoring malformed header JSON: {}", e);
                        Vec::new()
                    }
                }
            }
        }
    }
}

fn default_method() -> String {
    "GET".to_string()
}

fn default_data_path() -> String {
    "$".to_string()
}

fn default_refresh_interval() -> u64 {
    30
}

fn default_timeout() -> u64 {
    10
}

/// Request description for the custom slide's generic collector
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenericApiConfig {
    #[serde(default)]
    pub endpoint: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub headers: HeaderSpec,
    /// JSON object bodies are sent as JSON, strings as plain text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(default = "default_data_path")]
    pub data_path: String,
    /// Nominal poll interval in seconds
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: u64,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for GenericApiConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            method: default_method(),
            headers: HeaderSpec::default(),
            body: None,
            data_path: default_data_path(),
            refresh_interval: default_refresh_interval(),
            timeout: default_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mount_list_accepts_both_forms() {
        let text: MountList = serde_json::from_value(json!("/mnt/a, ,/mnt/b")).unwrap();
        assert_eq!(text.paths(), vec!["/mnt/a", "/mnt/b"]);

        let list: MountList = serde_json::from_value(json!(["/mnt/c", ""])).unwrap();
        assert_eq!(list.paths(), vec!["/mnt/c"]);
    }

    #[test]
    fn test_slide_settings_override_global_defaults() {
        let global = ApiConfig::default();
        let own = ServiceConfig {
            api_token: "secret".to_string(),
            ..Default::default()
        };
        let resolved = global.resolve("plex", Some(&own));
        assert_eq!(resolved.api_url, "http://localhost:32400");
        assert_eq!(resolved.api_token, "secret");
        assert_eq!(resolved.poll_interval, Some(5));
    }

    #[test]
    fn test_disabled_global_service_stays_disabled() {
        let mut global = ApiConfig::default();
        global.services.get_mut("pihole").unwrap().enabled = false;
        let own = ServiceConfig {
            api_url: "http://pi.hole/admin/".to_string(),
            ..Default::default()
        };
        let resolved = global.resolve("pihole", Some(&own));
        assert!(!resolved.enabled);
        assert_eq!(resolved.base_url(), Some("http://pi.hole/admin"));
    }

    #[test]
    fn test_api_config_round_trips_unknown_keys() {
        let raw = json!({"pihole": {"api_url": "http://x", "conditional": false}});
        let config: ApiConfig = serde_json::from_value(raw).unwrap();
        let pihole = config.service("pihole").unwrap();
        assert!(pihole.enabled);
        assert_eq!(pihole.extra.get("conditional"), Some(&json!(false)));
    }

    #[test]
    fn test_header_spec_from_json_string() {
        let headers = HeaderSpec::Json(r#"{"Authorization": "Bearer t", "X-Num": 3}"#.to_string());
        let mut pairs = headers.pairs();
        pairs.sort();
        assert_eq!(
            pairs,
            vec![
                ("Authorization".to_string(), "Bearer t".to_string()),
                ("X-Num".to_string(), "3".to_string()),
            ]
        );
        assert!(HeaderSpec::Json("not json".to_string()).pairs().is_empty());
    }

    #[test]
    fn test_generic_api_defaults() {
        let config: GenericApiConfig =
            serde_json::from_value(json!({"endpoint": "https://example.com"})).unwrap();
        assert_eq!(config.method, "GET");
        assert_eq!(config.data_path, "$");
        assert_eq!(config.timeout, 10);
    }
}
