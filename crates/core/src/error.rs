//! Error types for data collection

use std::time::Duration;
use thiserror::Error;

/// Why a collector fetch failed.
///
/// These never escape [`crate::Collector::get_data`]; they are recorded as the
/// collector's last error and show up in diagnostics.
#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("authentication rejected by {url}: {hint}")]
    Unauthorized { url: String, hint: String },

    #[error("unexpected response: {0}")]
    Parse(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("misconfigured collector: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for CollectorError {
    fn from(e: serde_json::Error) -> Self {
        CollectorError::Parse(e.to_string())
    }
}
