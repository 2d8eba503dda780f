//! Health probes and Prometheus metrics
//!
//! Provides HTTP endpoints for:
//! - `/healthz` - Liveness probe (is the process alive?)
//! - `/readyz` - Readiness probe (is the server accepting requests?)
//! - `/metrics` - Prometheus metrics

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::histogram::{Histogram, exponential_buckets};
use prometheus_client::registry::Registry;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Labels for request counters
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct RequestLabels {
    pub operation: String,
    pub outcome: String,
}

impl prometheus_client::encoding::EncodeLabelSet for RequestLabels {
    fn encode(
        &self,
        mut encoder: prometheus_client::encoding::LabelSetEncoder<'_>,
    ) -> Result<(), std::fmt::Error> {
        use prometheus_client::encoding::EncodeLabel;
        ("operation", self.operation.as_str()).encode(encoder.encode_label())?;
        ("outcome", self.outcome.as_str()).encode(encoder.encode_label())?;
        Ok(())
    }
}

/// Single-label set used by the remaining families
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct NameLabel {
    pub key: &'static str,
    pub value: String,
}

impl prometheus_client::encoding::EncodeLabelSet for NameLabel {
    fn encode(
        &self,
        mut encoder: prometheus_client::encoding::LabelSetEncoder<'_>,
    ) -> Result<(), std::fmt::Error> {
        use prometheus_client::encoding::EncodeLabel;
        (self.key, self.value.as_str()).encode(encoder.encode_label())?;
        Ok(())
    }
}

/// Shared metrics state
pub struct Metrics {
    /// Requests by operation and outcome
    pub requests_total: Family<RequestLabels, Counter>,
    /// Request duration by operation
    pub request_duration_seconds: Family<NameLabel, Histogram>,
    /// Polls that ran out of attempts, by condition
    pub poll_exhausted_total: Family<NameLabel, Counter>,
    /// Leftover objects deleted after cluster deletion, by kind
    pub sweep_deleted_total: Family<NameLabel, Counter>,

    /// Prometheus registry
    registry: Registry,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let requests_total = Family::<RequestLabels, Counter>::default();
        registry.register(
            "pgcluster_api_requests",
            "Total number of API requests",
            requests_total.clone(),
        );

        // Create and delete can poll for up to ~30s
        let request_duration_seconds = Family::<NameLabel, Histogram>::new_with_constructor(|| {
            Histogram::new(exponential_buckets(0.01, 2.0, 14))
        });
        registry.register(
            "pgcluster_api_request_duration_seconds",
            "Duration of API requests in seconds",
            request_duration_seconds.clone(),
        );

        let poll_exhausted_total = Family::<NameLabel, Counter>::default();
        registry.register(
            "pgcluster_api_poll_exhausted",
            "Number of polls that exhausted their attempt budget",
            poll_exhausted_total.clone(),
        );

        let sweep_deleted_total = Family::<NameLabel, Counter>::default();
        registry.register(
            "pgcluster_api_sweep_deleted",
            "Number of leftover objects deleted after cluster deletion",
            sweep_deleted_total.clone(),
        );

        Self {
            requests_total,
            request_duration_seconds,
            poll_exhausted_total,
            sweep_deleted_total,
            registry,
        }
    }

    /// Record a finished request
    pub fn record_request(&self, operation: &str, outcome: &str, duration_secs: f64) {
        self.requests_total
            .get_or_create(&RequestLabels {
                operation: operation.to_string(),
                outcome: outcome.to_string(),
            })
            .inc();
        self.request_duration_seconds
            .get_or_create(&NameLabel {
                key: "operation",
                value: operation.to_string(),
            })
            .observe(duration_secs);
    }

    /// Record a poll that ran out of attempts
    pub fn record_poll_exhausted(&self, condition: &str) {
        self.poll_exhausted_total
            .get_or_create(&NameLabel {
                key: "condition",
                value: condition.to_string(),
            })
            .inc();
    }

    /// Record a leftover deleted by the sweep
    pub fn record_sweep_deleted(&self, kind: &str) {
        self.sweep_deleted_total
            .get_or_create(&NameLabel {
                key: "kind",
                value: kind.to_string(),
            })
            .inc();
    }

    /// Encode metrics to Prometheus text format
    ///
    /// Returns an empty string if encoding fails (should never happen with valid metrics).
    fn encode(&self) -> String {
        let mut buffer = String::new();
        if let Err(e) = encode(&mut buffer, &self.registry) {
            tracing::error!("Failed to encode metrics: {}", e);
            return String::new();
        }
        buffer
    }
}

/// Shared state for the probe endpoints
pub struct HealthState {
    /// Whether the server accepts requests
    pub ready: RwLock<bool>,
    /// Metrics registry
    pub metrics: Metrics,
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthState {
    pub fn new() -> Self {
        Self {
            ready: RwLock::new(false),
            metrics: Metrics::new(),
        }
    }

    /// Mark the server as ready
    pub async fn set_ready(&self, ready: bool) {
        *self.ready.write().await = ready;
    }

    /// Check if the server is ready
    pub async fn is_ready(&self) -> bool {
        *self.ready.read().await
    }
}

/// Liveness probe handler
///
/// Returns 200 OK if the process is alive.
async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Readiness probe handler
///
/// Returns 200 OK if the server is ready, 503 Service Unavailable otherwise.
async fn readyz(State(state): State<Arc<HealthState>>) -> Response {
    if state.is_ready().await {
        (StatusCode::OK, "ready").into_response()
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not ready").into_response()
    }
}

/// Metrics handler
async fn metrics(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    let body = state.metrics.encode();
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}

/// Create the probe and metrics router
pub fn create_router(state: Arc<HealthState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}
