//! HTTP API for the scaling signal, health checks and Prometheus metrics

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use scaler_lib::{
    health::{ComponentStatus, HealthRegistry},
    MetricScaler, MetricSourceConfig, ScalerError,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub health_registry: HealthRegistry,
    pub scaler: MetricScaler,
    pub source: MetricSourceConfig,
}

impl AppState {
    pub fn new(
        health_registry: HealthRegistry,
        scaler: MetricScaler,
        source: MetricSourceConfig,
    ) -> Self {
        Self {
            health_registry,
            scaler,
            source,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    code: &'static str,
}

/// Status code for a failed signal computation
fn error_status(error: &ScalerError) -> StatusCode {
    match error {
        e if e.is_config_error() => StatusCode::BAD_REQUEST,
        ScalerError::SignalOutOfRange { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::BAD_GATEWAY,
    }
}

/// Compute the scaling signal - one query per request, nothing cached
async fn signal(State(state): State<Arc<AppState>>) -> Response {
    match state.scaler.evaluate(&state.source).await {
        Ok(report) => {
            state.health_registry.record_success().await;
            (StatusCode::OK, Json(report)).into_response()
        }
        Err(e) => {
            state.health_registry.record_error(&e).await;
            let body = ErrorResponse {
                error: e.to_string(),
                code: e.kind(),
            };
            (error_status(&e), Json(body)).into_response()
        }
    }
}

/// Health check response - returns 200 if healthy, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Degraded => StatusCode::OK, // Still serving
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/signal", get(signal))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::{body::Body, http::Request};
    use scaler_lib::azure::{MetricsQuerier, MetricsRequest};
    use scaler_lib::health::components;
    use scaler_lib::response::{DataPoint, Metric, MetricResponse, TimeSeries};
    use scaler_lib::{NoopEvents, QueryClientError, ScalerMetrics};
    use tower::ServiceExt;

    enum Canned {
        Average(f64),
        Throttled,
    }

    struct CannedQuerier(Canned);

    #[async_trait]
    impl MetricsQuerier for CannedQuerier {
        async fn query(
            &self,
            _request: &MetricsRequest<'_>,
        ) -> Result<MetricResponse, QueryClientError> {
            match self.0 {
                Canned::Average(value) => Ok(MetricResponse {
                    value: Some(vec![Metric {
                        timeseries: Some(vec![TimeSeries {
                            data: Some(vec![DataPoint {
                                average: Some(value),
                                ..Default::default()
                            }]),
                        }]),
                        ..Default::default()
                    }]),
                    ..Default::default()
                }),
                Canned::Throttled => Err(QueryClientError::Status {
                    status: 429,
                    body: "TooManyRequests".into(),
                }),
            }
        }
    }

    fn queue_source() -> MetricSourceConfig {
        MetricSourceConfig {
            metric_name: "Length".into(),
            subscription_id: "s1".into(),
            resource_group_name: "g1".into(),
            resource_uri: "Microsoft.Storage/queueServices/q1".into(),
            aggregation_type: "Average".into(),
            aggregation_interval: None,
            filter: None,
        }
    }

    async fn setup_test_app(canned: Canned, source: MetricSourceConfig) -> (Router, Arc<AppState>) {
        let health_registry = HealthRegistry::new();
        health_registry.register(components::QUERY_CLIENT).await;
        health_registry.register(components::CREDENTIALS).await;

        let scaler = MetricScaler::new(Arc::new(CannedQuerier(canned)), Arc::new(NoopEvents))
            .with_metrics(ScalerMetrics::new());
        let state = Arc::new(AppState::new(health_registry, scaler, source));

        (create_router(state.clone()), state)
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_signal_endpoint() {
        let (app, _) = setup_test_app(Canned::Average(12.6), queue_source()).await;

        let (status, json) = get_json(app, "/api/v1/signal").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["value"], 13);
        assert_eq!(json["metric"], "Length");
        assert_eq!(json["aggregation"], "Average");
        assert_eq!(
            json["resource_uri"],
            "/subscriptions/s1/resourceGroups/g1/providers/Microsoft.Storage/queueServices/q1"
        );
    }

    #[tokio::test]
    async fn test_signal_config_error_is_bad_request() {
        let mut source = queue_source();
        source.metric_name.clear();
        let (app, _) = setup_test_app(Canned::Average(1.0), source).await;

        let (status, json) = get_json(app, "/api/v1/signal").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "validation");
        assert_eq!(json["error"], "metricName is required");
    }

    #[tokio::test]
    async fn test_signal_unknown_aggregation_is_bad_request() {
        let mut source = queue_source();
        source.aggregation_type = "Avg".into();
        let (app, state) = setup_test_app(Canned::Average(1.0), source).await;

        let (status, json) = get_json(app, "/api/v1/signal").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "unsupported_aggregation_type");
        assert!(json["error"]
            .as_str()
            .unwrap()
            .starts_with("unsupported aggregation type AVG"));

        // A local configuration mistake says nothing about the API
        let health = state.health_registry.health().await;
        assert_eq!(health.status, ComponentStatus::Healthy);
    }

    #[tokio::test]
    async fn test_signal_query_error_degrades_health() {
        let (app, state) = setup_test_app(Canned::Throttled, queue_source()).await;

        let (status, json) = get_json(app.clone(), "/api/v1/signal").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(json["code"], "query");

        let health = state.health_registry.health().await;
        assert_eq!(health.status, ComponentStatus::Degraded);

        // Degraded still answers liveness probes
        let (status, json) = get_json(app, "/healthz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "degraded");
    }

    #[tokio::test]
    async fn test_readyz_follows_registry() {
        let (app, state) = setup_test_app(Canned::Average(1.0), queue_source()).await;

        let (status, _) = get_json(app.clone(), "/readyz").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        state.health_registry.set_ready(true).await;
        let (status, json) = get_json(app, "/readyz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["ready"], true);
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let (app, _) = setup_test_app(Canned::Average(4.0), queue_source()).await;
        let _ = get_json(app.clone(), "/api/v1/signal").await;

        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("metric_scaler_queries_total"));
    }
}
