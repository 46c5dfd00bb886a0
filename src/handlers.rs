/// Axum handlers and middleware for the relay server
use crate::AppState;
use crate::client::HttpClient;
use crate::errors::ChatError;
use crate::models::{ChatRequest, ChatResult, HealthResponse};
use axum::{
    Extension, Json,
    extract::{Request, State, rejection::JsonRejection},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// How a chat call ended, attached to the response so the request log can carry it.
///
/// Holds `"ok"` on success, otherwise [`ChatError::kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatOutcome(pub &'static str);

/// Handler for POST /api/chat
///
/// Boundary errors (undecodable body, blank message) are answered with 400. Every
/// other outcome is a 200 whose body says whether it succeeded.
#[instrument(skip_all)]
pub async fn chat_handler<T: HttpClient + Clone + Send + Sync + 'static>(
    State(state): State<AppState<T>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> (StatusCode, Extension<ChatOutcome>, Json<ChatResult>) {
    let outcome = match payload {
        Ok(Json(request)) => state.relay.handle_chat(&request).await,
        Err(rejection) => Err(ChatError::MalformedRequest(rejection.body_text())),
    };

    let kind = outcome.as_ref().err().map_or("ok", ChatError::kind);
    let status = match &outcome {
        Ok(_) => StatusCode::OK,
        Err(e) if e.is_boundary() => {
            debug!(kind = e.kind(), error = ?e, "Rejected chat request");
            StatusCode::BAD_REQUEST
        }
        Err(e) => {
            warn!(kind = e.kind(), error = ?e, "Chat request failed");
            StatusCode::OK
        }
    };

    (
        status,
        Extension(ChatOutcome(kind)),
        Json(ChatResult::from(outcome)),
    )
}

/// Handler for GET /health
#[instrument(skip_all)]
pub async fn health_handler<T: HttpClient + Clone + Send + Sync + 'static>(
    State(state): State<AppState<T>>,
) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(
        state.started_at.elapsed(),
        state.relay.config().bearer_token.is_some(),
    ))
}

/// Emits one log record per request once the response is ready.
pub async fn log_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let start = Instant::now();

    let response = next.run(req).await;
    let outcome = response.extensions().get::<ChatOutcome>().map(|o| o.0);

    info!(
        %method,
        %path,
        status = response.status().as_u16(),
        outcome,
        duration_ms = start.elapsed().as_millis() as u64,
        "Request processed"
    );
    response
}
