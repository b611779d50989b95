//! # Prometheus Metrics
//!
//! Exposes operational metrics for the booking node. Scraped by Prometheus
//! at the `/metrics` HTTP endpoint on the configured metrics port.
//!
//! All metrics are registered in a dedicated [`prometheus::Registry`] so they
//! do not collide with any default global registry consumers.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder};
use std::sync::Arc;

/// Holds all Prometheus metric handles for the node.
///
/// Clone-friendly (wraps `Arc` internally via prometheus handles) so it can
/// be shared across request handlers and background tasks.
#[derive(Clone)]
pub struct NodeMetrics {
    /// Prometheus registry that owns all metrics below.
    registry: Registry,
    /// Total number of JSON-RPC requests received.
    pub rpc_requests_total: IntCounter,
    /// Total number of bookings opened (renter bookings accepted).
    pub bookings_created_total: IntCounter,
    /// Total number of bookings closed by mutual cancellation.
    pub bookings_cancelled_total: IntCounter,
    /// Total number of bookings closed by forced termination.
    pub force_ends_total: IntCounter,
    /// Total number of lifecycle operations the engine rejected.
    pub operations_rejected_total: IntCounter,
    /// Current number of registered renters.
    pub registered_renters: IntGauge,
    /// Current number of registered cars.
    pub registered_cars: IntGauge,
    /// Current number of live bookings.
    pub active_bookings: IntGauge,
    /// Histogram of lifecycle operation latency in seconds.
    pub operation_latency_seconds: Histogram,
}

impl NodeMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Self {
        let registry = Registry::new_custom(Some("dpace".into()), None)
            .expect("failed to create prometheus registry");

        let rpc_requests_total = IntCounter::new(
            "rpc_requests_total",
            "Total number of JSON-RPC requests received",
        )
        .expect("metric creation");
        registry
            .register(Box::new(rpc_requests_total.clone()))
            .expect("metric registration");

        let bookings_created_total = IntCounter::new(
            "bookings_created_total",
            "Total number of bookings opened by renters",
        )
        .expect("metric creation");
        registry
            .register(Box::new(bookings_created_total.clone()))
            .expect("metric registration");

        let bookings_cancelled_total = IntCounter::new(
            "bookings_cancelled_total",
            "Total number of bookings closed by mutual cancellation",
        )
        .expect("metric creation");
        registry
            .register(Box::new(bookings_cancelled_total.clone()))
            .expect("metric registration");

        let force_ends_total = IntCounter::new(
            "force_ends_total",
            "Total number of bookings closed by forced termination",
        )
        .expect("metric creation");
        registry
            .register(Box::new(force_ends_total.clone()))
            .expect("metric registration");

        let operations_rejected_total = IntCounter::new(
            "operations_rejected_total",
            "Total number of lifecycle operations rejected by the engine",
        )
        .expect("metric creation");
        registry
            .register(Box::new(operations_rejected_total.clone()))
            .expect("metric registration");

        let registered_renters =
            IntGauge::new("registered_renters", "Number of registered renters")
                .expect("metric creation");
        registry
            .register(Box::new(registered_renters.clone()))
            .expect("metric registration");

        let registered_cars = IntGauge::new("registered_cars", "Number of registered cars")
            .expect("metric creation");
        registry
            .register(Box::new(registered_cars.clone()))
            .expect("metric registration");

        let active_bookings = IntGauge::new("active_bookings", "Number of live bookings")
            .expect("metric creation");
        registry
            .register(Box::new(active_bookings.clone()))
            .expect("metric registration");

        let operation_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "operation_latency_seconds",
                "End-to-end lifecycle operation latency in seconds",
            )
            .buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
            ]),
        )
        .expect("metric creation");
        registry
            .register(Box::new(operation_latency_seconds.clone()))
            .expect("metric registration");

        Self {
            registry,
            rpc_requests_total,
            bookings_created_total,
            bookings_cancelled_total,
            force_ends_total,
            operations_rejected_total,
            registered_renters,
            registered_cars,
            active_bookings,
            operation_latency_seconds,
        }
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer).expect("prometheus output is valid utf-8"))
    }
}

impl Default for NodeMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared metrics state passed to axum handlers via extension.
pub type SharedMetrics = Arc<NodeMetrics>;

/// Axum handler that renders `/metrics` in Prometheus text format.
///
/// Returns HTTP 500 if encoding fails (should never happen in practice).
pub async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<SharedMetrics>,
) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}
