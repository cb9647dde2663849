//! Pi-hole statistics collector

use crate::http::{fetch_json, HTTP_CLIENT};
use crate::{mock, to_slide_data};
use async_trait::async_trait;
use homelab_hud_core::{CollectorError, DataCollector};
use homelab_hud_types::SlideData;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

const TOP_LIST_LEN: usize = 5;

#[derive(Debug, Serialize)]
struct PiholeSummary {
    domains_being_blocked: Value,
    dns_queries_today: Value,
    ads_blocked_today: Value,
    ads_percentage_today: Value,
    unique_clients: Value,
    status: Value,
    top_clients: Vec<Value>,
    top_blocked: Vec<Value>,
}

fn field(summary: &Value, key: &str, default: Value) -> Value {
    summary.get(key).cloned().unwrap_or(default)
}

fn top_list(response: &Value, key: &str) -> Vec<Value> {
    match response.get(key) {
        Some(Value::Array(items)) => items.iter().take(TOP_LIST_LEN).cloned().collect(),
        _ => Vec::new(),
    }
}

/// Combine the three `api.php` responses into slide data
pub(crate) fn summarize(summary: &Value, clients: &Value, blocked: &Value) -> Result<SlideData, CollectorError> {
    let data = PiholeSummary {
        domains_being_blocked: field(summary, "domains_being_blocked", Value::from(0)),
        dns_queries_today: field(summary, "dns_queries_today", Value::from(0)),
        ads_blocked_today: field(summary, "ads_blocked_today", Value::from(0)),
        ads_percentage_today: field(summary, "ads_percentage_today", Value::from(0.0)),
        unique_clients: field(summary, "unique_clients", Value::from(0)),
        status: field(summary, "status", Value::from("unknown")),
        top_clients: top_list(clients, "topClients"),
        top_blocked: top_list(blocked, "topBlocked"),
    };
    Ok(to_slide_data(&data)?)
}

/// Collector for the Pi-hole admin API
pub struct PiholeCollector {
    api_url: String,
    api_token: String,
    poll_interval: Duration,
    use_mocks: bool,
}

impl PiholeCollector {
    pub fn new(api_url: &str, api_token: &str, poll_interval_secs: u64, use_mocks: bool) -> Self {
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            api_token: api_token.to_string(),
            poll_interval: Duration::from_secs(poll_interval_secs),
            use_mocks,
        }
    }

    async fn query(&self, url: &str, param: (&str, &str)) -> Result<Value, CollectorError> {
        let mut request = HTTP_CLIENT.get(url).query(&[param]);
        if !self.api_token.is_empty() {
            request = request.query(&[("auth", self.api_token.as_str())]);
        }
        fetch_json(request, url).await
    }
}

#[async_trait]
impl DataCollector for PiholeCollector {
    fn name(&self) -> &str {
        "pihole"
    }

    fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    async fn fetch(&self) -> Result<Option<SlideData>, CollectorError> {
        if self.use_mocks {
            return Ok(Some(mock::pihole()));
        }

        let url = format!("{}/api.php", self.api_url);
        let summary = self.query(&url, ("summary", "")).await?;
        let clients = self.query(&url, ("topClients", "10")).await?;
        let blocked = self.query(&url, ("topBlocked", "10")).await?;
        summarize(&summary, &clients, &blocked).map(Some)
    }
}
