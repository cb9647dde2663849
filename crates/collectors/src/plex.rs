//! Plex "now playing" collector

use crate::http::{number, request_error, status_error, text, LAN_CLIENT};
use crate::{mock, to_slide_data};
use async_trait::async_trait;
use homelab_hud_core::{CollectorError, DataCollector};
use homelab_hud_types::SlideData;
use log::trace;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub(crate) struct PlexSession {
    user: String,
    title: String,
    #[serde(rename = "type")]
    media_type: String,
    progress: f64,
    view_offset: i64,
    duration: i64,
    transcoding: bool,
}

#[derive(Debug, Serialize)]
struct NowPlaying {
    session_count: usize,
    sessions: Vec<PlexSession>,
}

/// "Artist - Album - Track" for music, "Series - Episode" for TV
fn display_title(session: &Value, media_type: &str) -> String {
    let base = text(session.get("title"), "Unknown");
    let grandparent = text(session.get("grandparentTitle"), "");
    let parent = text(session.get("parentTitle"), "");

    match media_type {
        "track" => match (grandparent.is_empty(), parent.is_empty()) {
            (false, false) => format!("{} - {} - {}", grandparent, parent, base),
            (false, true) => format!("{} - {}", grandparent, base),
            (true, false) => format!("{} - {}", parent, base),
            (true, true) => base,
        },
        "episode" if !grandparent.is_empty() => format!("{} - {}", grandparent, base),
        _ => base,
    }
}

/// Sessions explicitly reported as paused, buffering etc. are skipped;
/// a missing player or state counts as playing.
fn is_playing(session: &Value) -> bool {
    match session.get("Player").and_then(|p| p.get("state")) {
        Some(state) => {
            let state = text(Some(state), "");
            let state = state.trim();
            state.is_empty() || state.eq_ignore_ascii_case("playing")
        }
        None => true,
    }
}

fn parse_session(session: &Value) -> PlexSession {
    let media_type = text(session.get("type"), "unknown");
    let view_offset = number(session.get("viewOffset")) as i64;
    let duration = number(session.get("duration")) as i64;
    let progress = if duration > 0 {
        view_offset as f64 / duration as f64 * 100.0
    } else {
        0.0
    };
    PlexSession {
        user: session
            .get("User")
            .map(|u| text(u.get("title"), "Unknown"))
            .unwrap_or_else(|| "Unknown".to_string()),
        title: display_title(session, &media_type),
        media_type,
        progress,
        view_offset,
        duration,
        transcoding: session.get("TranscodeSession").is_some(),
    }
}

/// Parse a `/status/sessions` response.
///
/// Accepts both the `MediaContainer`-wrapped format and a bare container.
/// No active streams yields an empty session list rather than no data, so
/// the slide can say "no streams".
pub(crate) fn parse_sessions(response: &Value) -> Result<SlideData, CollectorError> {
    let container = match response.get("MediaContainer") {
        Some(mc) if mc.get("size").is_some() || mc.get("Metadata").is_some() => mc,
        _ => response,
    };

    let size = number(container.get("size"));
    let metadata: Vec<&Value> = match container.get("Metadata") {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(single @ Value::Object(_)) => vec![single],
        _ => Vec::new(),
    };

    let sessions: Vec<PlexSession> = if size == 0.0 {
        Vec::new()
    } else {
        metadata.into_iter().filter(|s| is_playing(s)).map(parse_session).collect()
    };

    Ok(to_slide_data(&NowPlaying {
        session_count: sessions.len(),
        sessions,
    })?)
}

/// Collector for Plex Media Server sessions
pub struct PlexCollector {
    api_url: String,
    api_token: String,
    poll_interval: Duration,
    use_mocks: bool,
}

impl PlexCollector {
    pub fn new(api_url: &str, api_token: &str, poll_interval_secs: u64, use_mocks: bool) -> Self {
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            api_token: api_token.to_string(),
            poll_interval: Duration::from_secs(poll_interval_secs),
            use_mocks,
        }
    }
}

#[async_trait]
impl DataCollector for PlexCollector {
    fn name(&self) -> &str {
        "plex"
    }

    fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    async fn fetch(&self) -> Result<Option<SlideData>, CollectorError> {
        if self.use_mocks {
            return parse_sessions(&mock::plex_sessions()).map(Some);
        }

        let url = format!("{}/status/sessions", self.api_url);
        let response = LAN_CLIENT
            .get(&url)
            .header("Accept", "application/json")
            .query(&[
                ("X-Plex-Token", self.api_token.as_str()),
                ("X-Plex-Product", "homelab-hud"),
                ("X-Plex-Version", env!("CARGO_PKG_VERSION")),
                ("X-Plex-Client-Identifier", "homelab-hud-plex-collector"),
            ])
            .send()
            .await
            .map_err(|e| request_error(&url, e))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(CollectorError::Unauthorized {
                url,
                hint: "check the Plex token".to_string(),
            });
        }
        if !status.is_success() {
            return Err(status_error(&url, status));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| CollectorError::Parse(format!("{}: {}", url, e.without_url())))?;
        trace!("Plex sessions response: {}", body);
        parse_sessions(&body).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wrapped_response_with_music_and_tv() {
        let response = json!({
            "MediaContainer": {
                "size": 3,
                "Metadata": [
                    {
                        "type": "track",
                        "title": "Song",
                        "parentTitle": "Album",
                        "grandparentTitle": "Artist",
                        "viewOffset": 30000,
                        "duration": 120000,
                        "User": {"title": "alice"},
                        "Player": {"state": "playing"}
                    },
                    {
                        "type": "episode",
                        "title": "Pilot",
                        "grandparentTitle": "Show",
                        "viewOffset": "0",
                        "duration": "0",
                        "Player": {"state": "Playing "}
                    },
                    {
                        "type": "movie",
                        "title": "Paused Film",
                        "Player": {"state": "paused"}
                    }
                ]
            }
        });

        let data = parse_sessions(&response).unwrap();
        assert_eq!(data["session_count"], json!(2));
        let sessions = data["sessions"].as_array().unwrap();
        assert_eq!(sessions[0]["title"], json!("Artist - Album - Song"));
        assert_eq!(sessions[0]["user"], json!("alice"));
        assert_eq!(sessions[0]["progress"], json!(25.0));
        assert_eq!(sessions[1]["title"], json!("Show - Pilot"));
        assert_eq!(sessions[1]["user"], json!("Unknown"));
        assert_eq!(sessions[1]["progress"], json!(0.0));
    }

    #[test]
    fn test_bare_container_with_single_session_object() {
        let response = json!({
            "size": 1,
            "Metadata": {"type": "movie", "title": "Film", "duration": 1000, "viewOffset": 500}
        });
        let data = parse_sessions(&response).unwrap();
        assert_eq!(data["session_count"], json!(1));
        assert_eq!(data["sessions"][0]["type"], json!("movie"));
        assert_eq!(data["sessions"][0]["progress"], json!(50.0));
    }

    #[test]
    fn test_idle_server_reports_zero_sessions() {
        let data = parse_sessions(&json!({"MediaContainer": {"size": 0}})).unwrap();
        assert_eq!(data["session_count"], json!(0));
        assert_eq!(data["sessions"], json!([]));
    }
}
