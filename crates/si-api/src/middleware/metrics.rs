//! # Prometheus Metrics
//!
//! HTTP-level metrics (request counts, latency, errors) are recorded in
//! middleware. Resource-level counters (writes by kind, deletes, precondition
//! failures by reason) are recorded by the resource handlers. Everything is
//! exposed in text format at `/metrics`.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use prometheus::core::Collector;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use si_core::{PathPrefix, WriteKind};

/// Label for paths that are neither resources nor fixed routes.
const UNMATCHED: &str = "{unmatched}";

/// Fixed routes kept verbatim in the `path` label.
const FIXED_ROUTES: &[&str] = &[
    "/health/liveness",
    "/health/readiness",
    "/metrics",
    "/openapi.json",
];

/// Why a conditional update was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreconditionReason {
    /// `If-Match` absent on an update.
    Missing,
    /// `If-Match` did not equal the current tag.
    Mismatch,
}

impl PreconditionReason {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Mismatch => "mismatch",
        }
    }
}

/// Shared metrics state backed by a Prometheus registry.
#[derive(Clone)]
pub struct ApiMetrics {
    inner: Arc<Inner>,
}

struct Inner {
    registry: Registry,
    prefix: PathPrefix,

    http_requests_total: IntCounterVec,
    http_request_duration_seconds: HistogramVec,
    http_errors_total: IntCounterVec,

    resource_writes_total: IntCounterVec,
    resource_deletes_total: IntCounter,
    precondition_failures_total: IntCounterVec,
}

impl std::fmt::Debug for ApiMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiMetrics")
            .field("requests", &self.requests())
            .field("errors", &self.errors())
            .finish()
    }
}

impl ApiMetrics {
    /// Create a fresh registry. `prefix` is used to collapse resource paths.
    pub fn new(prefix: PathPrefix) -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new("si_http_requests_total", "Total HTTP requests"),
            &["method", "path", "status"],
        )?;

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "si_http_request_duration_seconds",
                "HTTP request duration in seconds",
            )
            .buckets(vec![
                0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ]),
            &["method", "path"],
        )?;

        let http_errors_total = IntCounterVec::new(
            Opts::new("si_http_errors_total", "Total HTTP errors (4xx and 5xx)"),
            &["method", "path", "status"],
        )?;

        let resource_writes_total = IntCounterVec::new(
            Opts::new("si_resource_writes_total", "Successful PUTs by outcome"),
            &["kind"],
        )?;

        let resource_deletes_total =
            IntCounter::new("si_resource_deletes_total", "Successful DELETEs")?;

        let precondition_failures_total = IntCounterVec::new(
            Opts::new(
                "si_precondition_failures_total",
                "Updates refused for a missing or stale If-Match",
            ),
            &["reason"],
        )?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(http_errors_total.clone()))?;
        registry.register(Box::new(resource_writes_total.clone()))?;
        registry.register(Box::new(resource_deletes_total.clone()))?;
        registry.register(Box::new(precondition_failures_total.clone()))?;

        Ok(Self {
            inner: Arc::new(Inner {
                registry,
                prefix,
                http_requests_total,
                http_request_duration_seconds,
                http_errors_total,
                resource_writes_total,
                resource_deletes_total,
                precondition_failures_total,
            }),
        })
    }

    /// Return current total request count (sum across all labels).
    pub fn requests(&self) -> u64 {
        sum_counters(&self.inner.http_requests_total)
    }

    /// Return current total error count (sum across all labels).
    pub fn errors(&self) -> u64 {
        sum_counters(&self.inner.http_errors_total)
    }

    /// Record a successful PUT.
    pub fn record_write(&self, kind: WriteKind) {
        self.inner
            .resource_writes_total
            .with_label_values(&[kind.as_str()])
            .inc();
    }

    /// Record a successful DELETE.
    pub fn record_delete(&self) {
        self.inner.resource_deletes_total.inc();
    }

    /// Record a refused conditional update.
    pub fn record_precondition_failure(&self, reason: PreconditionReason) {
        self.inner
            .precondition_failures_total
            .with_label_values(&[reason.as_str()])
            .inc();
    }

    /// Record an HTTP request (called by the middleware).
    fn record_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status_str = status.to_string();
        self.inner
            .http_requests_total
            .with_label_values(&[method, path, &status_str])
            .inc();

        self.inner
            .http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);

        if status >= 400 {
            self.inner
                .http_errors_total
                .with_label_values(&[method, path, &status_str])
                .inc();
        }
    }

    /// Collapse a request path into a bounded-cardinality label.
    ///
    /// Resource identifiers become `{id}`; unknown paths become `{unmatched}`.
    fn normalize_path(&self, path: &str) -> String {
        let prefix = &self.inner.prefix;
        match prefix.strip(path) {
            Some("") => prefix.as_str().to_string(),
            Some(_) => format!("{prefix}{{id}}"),
            None if FIXED_ROUTES.contains(&path) => path.to_string(),
            None => UNMATCHED.to_string(),
        }
    }

    /// Gather all metrics and encode to Prometheus text format.
    pub fn gather_and_encode(&self) -> Result<String, String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| format!("failed to encode metrics: {e}"))?;
        String::from_utf8(buffer)
            .map_err(|e| format!("metrics encoding produced invalid UTF-8: {e}"))
    }
}

fn sum_counters(counter: &IntCounterVec) -> u64 {
    counter
        .collect()
        .iter()
        .flat_map(|mf| mf.get_metric())
        .map(|m| m.get_counter().get_value() as u64)
        .sum()
}

/// Middleware that records HTTP request metrics via Prometheus.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let metrics = request.extensions().get::<ApiMetrics>().cloned();
    let method = request.method().to_string();
    let path = metrics
        .as_ref()
        .map(|m| m.normalize_path(request.uri().path()))
        .unwrap_or_default();
    let start = Instant::now();

    let response = next.run(request).await;

    if let Some(m) = metrics {
        let duration = start.elapsed().as_secs_f64();
        let status = response.status().as_u16();
        m.record_request(&method, &path, status, duration);
    }

    response
}
