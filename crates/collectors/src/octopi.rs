//! OctoPrint / OctoPi print status collector

use crate::http::{number, request_error, status_error, text, LAN_CLIENT};
use crate::{mock, to_slide_data};
use async_trait::async_trait;
use homelab_hud_core::{CollectorError, DataCollector};
use homelab_hud_types::SlideData;
use log::debug;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct Idle {
    is_printing: bool,
    state: String,
}

#[derive(Debug, Serialize)]
struct PrintStatus {
    is_printing: bool,
    state: String,
    filename: String,
    progress: f64,
    print_time: f64,
    print_time_left: Option<f64>,
    tool0_actual: f64,
    tool0_target: f64,
    bed_actual: f64,
    bed_target: f64,
}

/// Lower-cased printer state from `/api/connection`
pub(crate) fn connection_state(connection: &Value) -> String {
    text(connection.get("current").and_then(|c| c.get("state")), "").to_lowercase()
}

pub(crate) fn idle_status(state: &str) -> Result<SlideData, CollectorError> {
    Ok(to_slide_data(&Idle {
        is_printing: false,
        state: state.to_string(),
    })?)
}

/// Combine `/api/job` and `/api/printer` into an active print status
pub(crate) fn print_status(state: &str, job: &Value, printer: &Value) -> Result<SlideData, CollectorError> {
    let progress = job.get("progress");
    let temperature = printer.get("temperature");
    let temp = |tool: &str, key: &str| number(temperature.and_then(|t| t.get(tool)).and_then(|t| t.get(key)));

    let data = PrintStatus {
        is_printing: true,
        state: state.to_string(),
        filename: text(
            job.get("job").and_then(|j| j.get("file")).and_then(|f| f.get("name")),
            "Unknown",
        ),
        progress: number(progress.and_then(|p| p.get("completion"))),
        print_time: number(progress.and_then(|p| p.get("printTime"))),
        print_time_left: progress
            .and_then(|p| p.get("printTimeLeft"))
            .and_then(Value::as_f64),
        tool0_actual: temp("tool0", "actual"),
        tool0_target: temp("tool0", "target"),
        bed_actual: temp("bed", "actual"),
        bed_target: temp("bed", "target"),
    };
    Ok(to_slide_data(&data)?)
}

/// Collector for the OctoPrint REST API
pub struct OctoPrintCollector {
    api_url: String,
    api_key: String,
    poll_interval: Duration,
    use_mocks: bool,
}

impl OctoPrintCollector {
    pub fn new(api_url: &str, api_key: &str, poll_interval_secs: u64, use_mocks: bool) -> Self {
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            poll_interval: Duration::from_secs(poll_interval_secs),
            use_mocks,
        }
    }

    fn forbidden_hint(&self) -> String {
        if self.api_key.is_empty() {
            "configure an API key in the slide settings; none is set".to_string()
        } else {
            "the configured API key may be invalid".to_string()
        }
    }

    async fn get(&self, path: &str) -> Result<Value, CollectorError> {
        let url = format!("{}{}", self.api_url, path);
        let mut request = LAN_CLIENT.get(&url);
        if !self.api_key.is_empty() {
            request = request.header("X-Api-Key", &self.api_key);
        }
        let response = request.send().await.map_err(|e| request_error(&url, e))?;

        let status = response.status();
        if status == StatusCode::FORBIDDEN {
            return Err(CollectorError::Unauthorized {
                url,
                hint: self.forbidden_hint(),
            });
        }
        if !status.is_success() {
            return Err(status_error(&url, status));
        }
        response
            .json()
            .await
            .map_err(|e| CollectorError::Parse(format!("{}: {}", url, e.without_url())))
    }
}

#[async_trait]
impl DataCollector for OctoPrintCollector {
    fn name(&self) -> &str {
        "octopi"
    }

    fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    async fn fetch(&self) -> Result<Option<SlideData>, CollectorError> {
        if self.use_mocks {
            return Ok(Some(mock::octoprint()));
        }

        let connection = self.get("/api/connection").await?;
        let state = connection_state(&connection);
        if state != "printing" {
            debug!("OctoPrint is {}, not printing", if state.is_empty() { "unknown" } else { state.as_str() });
            return idle_status(&state).map(Some);
        }

        let job = self.get("/api/job").await?;
        let printer = self.get("/api/printer").await?;
        print_status(&state, &job, &printer).map(Some)
    }
}
