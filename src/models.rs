/// Inbound and outbound bodies of the relay's own HTTP API.
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::ChatError;

/// Body of `POST /api/chat`.
///
/// A missing `message` field decodes as an empty message and is rejected the
/// same way as an explicit empty string.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the trimmed message, or `EmptyMessage` if nothing is left.
    pub fn validated_message(&self) -> Result<&str, ChatError> {
        match self.message.trim() {
            "" => Err(ChatError::EmptyMessage),
            message => Ok(message),
        }
    }
}

/// Reply of `POST /api/chat`. Exactly one of `response` and `error` is set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: String,
}

impl From<Result<String, ChatError>> for ChatResult {
    fn from(outcome: Result<String, ChatError>) -> Self {
        let (response, error) = match outcome {
            Ok(text) => (Some(text), None),
            Err(e) => (None, Some(e.to_string())),
        };
        Self {
            response,
            error,
            timestamp: now_rfc3339(),
        }
    }
}

/// Reply of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub timestamp: String,
    pub version: String,
    pub uptime: String,
    /// Whether an upstream credential was configured at startup
    pub upstream_auth: bool,
}

impl HealthResponse {
    pub fn healthy(uptime: Duration, upstream_auth: bool) -> Self {
        Self {
            status: "healthy".into(),
            service: env!("CARGO_PKG_NAME").into(),
            timestamp: now_rfc3339(),
            version: env!("CARGO_PKG_VERSION").into(),
            uptime: format_uptime(uptime),
            upstream_auth,
        }
    }
}

pub(crate) fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Renders whole seconds as e.g. `1h2m3s`, dropping leading zero units.
pub(crate) fn format_uptime(uptime: Duration) -> String {
    let secs = uptime.as_secs();
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}
