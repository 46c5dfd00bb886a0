//! chatrelay - a one-shot chat relay for the Bedrock converse API
//!
//! This library accepts a plain `{"message": ...}` chat request, forwards it to the
//! upstream model as a converse envelope and hands back the model's answer in a
//! uniform `{"response" | "error", "timestamp"}` shape.

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use axum_prometheus::{
    GenericMetricLayer, Handle, PrometheusMetricLayerBuilder,
    metrics_exporter_prometheus::PrometheusHandle,
};
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};

pub mod auth;
pub mod client;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod relay;
pub mod schemas;

use client::{HttpClient, HyperClient};
use handlers::{chat_handler, health_handler, log_requests};
use relay::{ChatRelay, RelayConfig};

/// The main application state containing the relay and the process start time
#[derive(Clone, Debug)]
pub struct AppState<T: HttpClient> {
    pub relay: Arc<ChatRelay<T>>,
    pub started_at: Instant,
}

impl AppState<HyperClient> {
    /// Create a new AppState with the default Hyper client
    pub fn new(config: RelayConfig) -> Self {
        let http_client =
            client::create_hyper_client(config.pool_max_idle_per_host, config.pool_idle_timeout);
        Self::with_client(config, http_client)
    }
}

impl<T: HttpClient> AppState<T> {
    /// Create a new AppState with a custom HTTP client (useful for testing)
    pub fn with_client(config: RelayConfig, http_client: T) -> Self {
        Self {
            relay: Arc::new(ChatRelay::new(Arc::new(config), http_client)),
            started_at: Instant::now(),
        }
    }
}

/// Build the main router
/// This creates routes for:
/// - `POST /api/chat` - Relays a single message to the upstream model
/// - `GET /health` - Liveness and credential status
#[instrument(skip(state))]
pub fn build_router<T: HttpClient + Clone + Send + Sync + 'static>(state: AppState<T>) -> Router {
    info!("Building router");
    Router::new()
        .route("/api/chat", post(chat_handler::<T>))
        .route("/health", get(health_handler::<T>))
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

/// Builds a router for the metrics endpoint.
#[instrument(skip(handle))]
pub fn build_metrics_router(handle: PrometheusHandle) -> Router {
    info!("Building metrics router");
    Router::new().route(
        "/metrics",
        axum::routing::get(move || async move { handle.render() }),
    )
}

type MetricsLayerAndHandle = (
    GenericMetricLayer<'static, PrometheusHandle, Handle>,
    PrometheusHandle,
);

/// Builds a layer and handle for prometheus metrics collection.
///
/// Installs the global metrics recorder, so call it at most once per process.
pub fn build_metrics_layer_and_handle(
    prefix: impl Into<Cow<'static, str>>,
) -> MetricsLayerAndHandle {
    info!("Building metrics layer");
    PrometheusMetricLayerBuilder::new()
        .with_prefix(prefix)
        .with_endpoint_label_type(axum_prometheus::EndpointLabel::Exact)
        .with_default_metrics()
        .build_pair()
}

#[cfg(test)]
pub mod test_utils {
    use super::*;
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// What the mock does once it has recorded a request.
    #[derive(Debug)]
    enum MockBehavior {
        Respond { status: StatusCode, body: String },
        Hang,
        Fail(String),
    }

    pub struct MockHttpClient {
        pub requests: Arc<Mutex<Vec<MockRequest>>>,
        behavior: Arc<MockBehavior>,
        in_flight: Arc<AtomicUsize>,
    }

    #[derive(Debug, Clone)]
    pub struct MockRequest {
        pub method: String,
        pub uri: String,
        pub headers: Vec<(String, String)>,
        pub body: Vec<u8>,
    }

    impl MockRequest {
        pub fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str())
        }
    }

    /// Counts requests the mock is still working on; decremented when the request
    /// future completes or is dropped.
    struct InFlight(Arc<AtomicUsize>);

    impl InFlight {
        fn enter(counter: &Arc<AtomicUsize>) -> Self {
            counter.fetch_add(1, Ordering::SeqCst);
            Self(Arc::clone(counter))
        }
    }

    impl Drop for InFlight {
        fn drop(&mut self) {
            self.0.fetch_sub(1, Ordering::SeqCst);
        }
    }

    impl MockHttpClient {
        fn with_behavior(behavior: MockBehavior) -> Self {
            Self {
                requests: Arc::new(Mutex::new(Vec::new())),
                behavior: Arc::new(behavior),
                in_flight: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub fn new(status: StatusCode, body: &str) -> Self {
            Self::with_behavior(MockBehavior::Respond {
                status,
                body: body.to_string(),
            })
        }

        /// A client whose requests never complete.
        pub fn hanging() -> Self {
            Self::with_behavior(MockBehavior::Hang)
        }

        /// A client that fails every request at the transport level.
        pub fn failing(message: &str) -> Self {
            Self::with_behavior(MockBehavior::Fail(message.to_string()))
        }

        pub fn get_requests(&self) -> Vec<MockRequest> {
            self.requests.lock().unwrap().clone()
        }

        pub fn in_flight(&self) -> usize {
            self.in_flight.load(Ordering::SeqCst)
        }
    }

    impl std::fmt::Debug for MockHttpClient {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("MockHttpClient")
                .field("requests", &self.requests)
                .field("behavior", &self.behavior)
                .finish()
        }
    }

    impl Clone for MockHttpClient {
        fn clone(&self) -> Self {
            Self {
                requests: Arc::clone(&self.requests),
                behavior: Arc::clone(&self.behavior),
                in_flight: Arc::clone(&self.in_flight),
            }
        }
    }

    #[async_trait]
    impl HttpClient for MockHttpClient {
        async fn request(
            &self,
            req: axum::extract::Request,
        ) -> Result<axum::response::Response, Box<dyn std::error::Error + Send + Sync>> {
            let _in_flight = InFlight::enter(&self.in_flight);

            // Extract request details
            let method = req.method().to_string();
            let uri = req.uri().to_string();
            let headers = req
                .headers()
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
                .collect();

            // Read body
            let body = axum::body::to_bytes(req.into_body(), usize::MAX)
                .await
                .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)?
                .to_vec();

            self.requests.lock().unwrap().push(MockRequest {
                method,
                uri,
                headers,
                body,
            });

            match self.behavior.as_ref() {
                MockBehavior::Respond { status, body } => Ok(axum::response::Response::builder()
                    .status(*status)
                    .header("content-type", "application/json")
                    .body(axum::body::Body::from(body.clone()))
                    .unwrap()),
                MockBehavior::Hang => std::future::pending().await,
                MockBehavior::Fail(message) => Err(message.clone().into()),
            }
        }
    }
}
