//! The chat relay: one user message in, one upstream converse call, one answer out.
//!
//! [`ChatRelay::handle_chat`] validates the message, wraps it in a converse
//! envelope, calls the upstream with a bounded timeout and pulls the first text
//! block out of the reply. Every failure is mapped onto a [`ChatError`]; the
//! caller decides which of those become HTTP-level failures.
use crate::auth::BearerToken;
use crate::client::HttpClient;
use crate::errors::ChatError;
use crate::models::ChatRequest;
use crate::schemas::converse::{ConverseRequest, ConverseResponse};
use axum::body::{Body, Bytes};
use axum::http::{Method, Request, StatusCode, header};
use bon::Builder;
use http_body_util::BodyExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// Bedrock converse endpoint for Claude 3 Haiku in us-east-1.
pub const DEFAULT_UPSTREAM_URL: &str = "https://bedrock-runtime.us-east-1.amazonaws.com/model/anthropic.claude-3-haiku-20240307-v1:0/converse";

pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// Returned in place of an answer when the upstream reply carries no text.
pub const EMPTY_REPLY_PLACEHOLDER: &str = "Sorry, I could not generate a response.";

/// Everything the relay needs to reach the upstream. Built once at startup.
#[derive(Debug, Clone, Builder)]
pub struct RelayConfig {
    #[builder(default = default_upstream_url())]
    pub upstream_url: Url,

    /// Absent when no credential was configured; chat calls then fail in-band.
    pub bearer_token: Option<BearerToken>,

    /// Bound on the whole upstream exchange, response body included.
    #[builder(default = DEFAULT_UPSTREAM_TIMEOUT)]
    pub timeout: Duration,

    #[builder(default = 100)]
    pub pool_max_idle_per_host: usize,

    #[builder(default = Duration::from_secs(90))]
    pub pool_idle_timeout: Duration,
}

fn default_upstream_url() -> Url {
    DEFAULT_UPSTREAM_URL
        .parse()
        .expect("default upstream URL should be valid")
}

#[derive(Debug)]
pub struct ChatRelay<T: HttpClient> {
    http_client: T,
    config: Arc<RelayConfig>,
}

impl<T: HttpClient> ChatRelay<T> {
    pub fn new(config: Arc<RelayConfig>, http_client: T) -> Self {
        Self {
            http_client,
            config,
        }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Relays a single message to the upstream model and returns its answer.
    #[instrument(skip_all)]
    pub async fn handle_chat(&self, request: &ChatRequest) -> Result<String, ChatError> {
        let message = request.validated_message()?;

        let Some(token) = self.config.bearer_token.as_ref() else {
            error!("Upstream credential is not configured");
            return Err(ChatError::MissingCredential);
        };

        let envelope = ConverseRequest::user_text(message);
        let body = serde_json::to_vec(&envelope).map_err(|e| {
            error!(error = %e, "Failed to serialize converse request");
            ChatError::Encoding(e.to_string())
        })?;

        let upstream_request = Request::builder()
            .method(Method::POST)
            .uri(self.config.upstream_url.as_str())
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, token.header_value())
            .body(Body::from(body))
            .map_err(|e| {
                error!(error = %e, "Failed to build upstream request");
                ChatError::Encoding(e.to_string())
            })?;

        debug!(url = %self.config.upstream_url, "Calling upstream");

        let (status, body) =
            match tokio::time::timeout(self.config.timeout, self.exchange(upstream_request)).await
            {
                Ok(result) => result?,
                Err(_) => {
                    error!(timeout = ?self.config.timeout, "Upstream call timed out");
                    return Err(ChatError::UpstreamUnreachable(format!(
                        "no response within {:?}",
                        self.config.timeout
                    )));
                }
            };

        if !status.is_success() {
            let body = String::from_utf8_lossy(&body).into_owned();
            error!(status = status.as_u16(), body = %body, "Upstream API error");
            return Err(ChatError::UpstreamError {
                status: status.as_u16(),
                body,
            });
        }

        let reply: ConverseResponse = serde_json::from_slice(&body).map_err(|e| {
            error!(error = %e, "Failed to decode upstream response");
            ChatError::ResponseDecode(e.to_string())
        })?;

        info!(
            input_tokens = reply.usage.map(|u| u.input_tokens),
            output_tokens = reply.usage.map(|u| u.output_tokens),
            stop_reason = reply.stop_reason.as_deref(),
            "Upstream call successful"
        );

        Ok(reply_text(&reply))
    }

    /// Sends the request and reads the full response body.
    async fn exchange(&self, request: Request<Body>) -> Result<(StatusCode, Bytes), ChatError> {
        let response = self.http_client.request(request).await.map_err(|e| {
            error!(error = %e, url = %self.config.upstream_url, "Failed to call upstream API");
            ChatError::UpstreamUnreachable(e.to_string())
        })?;

        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to read upstream response body");
                ChatError::UpstreamUnreachable(e.to_string())
            })?
            .to_bytes();

        Ok((status, body))
    }
}

fn reply_text(reply: &ConverseResponse) -> String {
    match reply.first_text().map(str::trim) {
        Some(text) if !text.is_empty() => text.to_owned(),
        _ => {
            warn!("Upstream reply contained no text");
            EMPTY_REPLY_PLACEHOLDER.to_owned()
        }
    }
}
