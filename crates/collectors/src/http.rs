//! Shared HTTP plumbing

use homelab_hud_core::CollectorError;
use log::{info, warn};
use once_cell::sync::Lazy;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use std::time::Duration;

pub(crate) const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for public services with normal certificate checks
pub(crate) static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| build_client(false));

/// Client for LAN appliances (Plex, OctoPi) that commonly use self-signed certificates
pub(crate) static LAN_CLIENT: Lazy<Client> = Lazy::new(|| build_client(true));

fn build_client(accept_invalid_certs: bool) -> Client {
    info!("Creating shared HTTP client (accept_invalid_certs={})", accept_invalid_certs);
    Client::builder()
        .timeout(HTTP_TIMEOUT)
        .danger_accept_invalid_certs(accept_invalid_certs)
        .user_agent(concat!("homelab-hud/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|e| {
            warn!("Failed to configure HTTP client, using defaults: {}", e);
            Client::new()
        })
}

/// Map a transport error, dropping the URL so credentials in query strings
/// never end up in logs
pub(crate) fn request_error(url: &str, e: reqwest::Error) -> CollectorError {
    if e.is_timeout() {
        return CollectorError::Timeout(HTTP_TIMEOUT);
    }
    CollectorError::Request {
        url: url.to_string(),
        message: e.without_url().to_string(),
    }
}

pub(crate) fn status_error(url: &str, status: StatusCode) -> CollectorError {
    CollectorError::Status {
        url: url.to_string(),
        status: status.as_u16(),
    }
}

/// Send a request and decode a JSON body, failing on non-2xx statuses
pub(crate) async fn fetch_json(request: RequestBuilder, url: &str) -> Result<Value, CollectorError> {
    let response = request.send().await.map_err(|e| request_error(url, e))?;
    let status = response.status();
    if !status.is_success() {
        return Err(status_error(url, status));
    }
    response
        .json::<Value>()
        .await
        .map_err(|e| CollectorError::Parse(format!("{}: {}", url, e.without_url())))
}

/// Numeric field that services send either as a number or a numeric string
pub(crate) fn number(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// String field, stringifying numbers
pub(crate) fn text(value: Option<&Value>, default: &str) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => default.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_accepts_strings() {
        assert_eq!(number(Some(&json!("21"))), 21.0);
        assert_eq!(number(Some(&json!(3.5))), 3.5);
        assert_eq!(number(Some(&json!("n/a"))), 0.0);
        assert_eq!(number(None), 0.0);
    }

    #[test]
    fn test_text_stringifies_scalars() {
        assert_eq!(text(Some(&json!(42)), ""), "42");
        assert_eq!(text(Some(&json!("x")), ""), "x");
        assert_eq!(text(None, "Unknown"), "Unknown");
    }
}
