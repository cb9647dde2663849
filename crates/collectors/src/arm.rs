//! Automatic Ripping Machine (ARM) collector

use crate::http::{fetch_json, text, HTTP_CLIENT};
use crate::{mock, to_slide_data};
use async_trait::async_trait;
use homelab_hud_core::{CollectorError, DataCollector};
use homelab_hud_types::SlideData;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "/json?mode=joblist";

#[derive(Debug, Serialize)]
struct RipJob {
    job_id: Value,
    title: String,
    disctype: String,
    video_type: String,
    start_time: String,
    no_of_titles: String,
    year: String,
    pid: String,
    stage: String,
    label: String,
    mountpoint: String,
}

/// First active job of a joblist response.
///
/// `None` when the API reports failure or nothing is ripping; the slide is
/// conditional on exactly that.
pub(crate) fn parse_joblist(response: &Value) -> Result<Option<SlideData>, CollectorError> {
    if !response.get("success").and_then(Value::as_bool).unwrap_or(false) {
        return Ok(None);
    }

    let active = response
        .get("results")
        .and_then(Value::as_object)
        .and_then(|jobs| {
            jobs.values()
                .find(|job| job.get("status").and_then(Value::as_str) == Some("active"))
        });

    let Some(job) = active else {
        return Ok(None);
    };

    let field = |key: &str| text(job.get(key), "");
    let data = RipJob {
        job_id: job.get("job_id").cloned().unwrap_or(Value::Null),
        title: text(job.get("title"), "Unknown"),
        disctype: field("disctype"),
        video_type: field("video_type"),
        start_time: field("start_time"),
        no_of_titles: text(job.get("no_of_titles"), "0"),
        year: field("year"),
        pid: field("pid"),
        stage: field("stage"),
        label: field("label"),
        mountpoint: field("mountpoint"),
    };
    Ok(Some(to_slide_data(&data)?))
}

/// Collector for ARM's JSON job list
pub struct ArmCollector {
    api_url: String,
    api_key: String,
    endpoint: String,
    poll_interval: Duration,
    use_mocks: bool,
}

impl ArmCollector {
    pub fn new(api_url: &str, api_key: &str, endpoint: Option<&str>, poll_interval_secs: u64, use_mocks: bool) -> Self {
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            endpoint: endpoint
                .filter(|e| !e.trim().is_empty())
                .unwrap_or(DEFAULT_ENDPOINT)
                .to_string(),
            poll_interval: Duration::from_secs(poll_interval_secs),
            use_mocks,
        }
    }
}

#[async_trait]
impl DataCollector for ArmCollector {
    fn name(&self) -> &str {
        "arm"
    }

    fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    async fn fetch(&self) -> Result<Option<SlideData>, CollectorError> {
        if self.use_mocks {
            return parse_joblist(&mock::arm_joblist());
        }

        let url = format!("{}{}", self.api_url, self.endpoint);
        let mut request = HTTP_CLIENT.get(&url);
        if !self.api_key.is_empty() {
            request = request.query(&[("api_key", self.api_key.as_str())]);
        }
        let response = fetch_json(request, &url).await?;
        parse_joblist(&response)
    }
}
