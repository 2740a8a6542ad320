use std::sync::OnceLock;
use std::time::Instant;

use axum::body::Body;
use axum::extract::MatchedPath;
use axum::http::Request;
use axum::http::{HeaderValue, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts as PromOpts,
    Registry, TextEncoder,
};

struct Metrics {
    registry: Registry,
    http_requests_total: IntCounterVec,
    http_request_duration_seconds: HistogramVec,
    http_in_flight_requests: IntGauge,
    segments_aligned_total: IntCounter,
    matches_total: IntCounter,
}

static METRICS: OnceLock<Metrics> = OnceLock::new();

fn build() -> prometheus::Result<Metrics> {
    let registry = Registry::new();

    let http_requests_total = IntCounterVec::new(
        PromOpts::new(
            "tartil_http_requests_total",
            "Total HTTP requests served by tartil-server.",
        ),
        &["route", "status"],
    )?;

    let http_request_duration_seconds = HistogramVec::new(
        HistogramOpts::new(
            "tartil_http_request_duration_seconds",
            "HTTP request latency in seconds.",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 15.0, 60.0, 300.0]),
        &["route", "status"],
    )?;

    let http_in_flight_requests = IntGauge::new(
        "tartil_http_in_flight_requests",
        "Current number of in-flight HTTP requests.",
    )?;

    let segments_aligned_total = IntCounter::new(
        "tartil_segments_aligned_total",
        "Transcript segments submitted for alignment.",
    )?;

    let matches_total = IntCounter::new(
        "tartil_matches_total",
        "Segments confidently matched to an ayah.",
    )?;

    registry.register(Box::new(http_requests_total.clone()))?;
    registry.register(Box::new(http_request_duration_seconds.clone()))?;
    registry.register(Box::new(http_in_flight_requests.clone()))?;
    registry.register(Box::new(segments_aligned_total.clone()))?;
    registry.register(Box::new(matches_total.clone()))?;

    Ok(Metrics {
        registry,
        http_requests_total,
        http_request_duration_seconds,
        http_in_flight_requests,
        segments_aligned_total,
        matches_total,
    })
}

/// Register all metrics. Must be called before the router starts serving.
pub fn init() -> prometheus::Result<()> {
    if METRICS.get().is_none() {
        let _ = METRICS.set(build()?);
    }
    Ok(())
}

fn metrics() -> Option<&'static Metrics> {
    METRICS.get()
}

/// Record one alignment run.
pub fn record_alignment(segments: usize, matches: usize) {
    if let Some(m) = metrics() {
        m.segments_aligned_total.inc_by(segments as u64);
        m.matches_total.inc_by(matches as u64);
    }
}

/// Record matches produced by a `/process` run, whose segment count is not surfaced.
pub fn record_matches(matches: usize) {
    if let Some(m) = metrics() {
        m.matches_total.inc_by(matches as u64);
    }
}

pub async fn prometheus_metrics() -> Response {
    let Some(m) = metrics() else {
        return (StatusCode::SERVICE_UNAVAILABLE, "metrics disabled").into_response();
    };

    let families = m.registry.gather();
    let mut buf = Vec::new();
    if TextEncoder::new().encode(&families, &mut buf).is_err() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "failed to encode metrics",
        )
            .into_response();
    }

    (
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; version=0.0.4; charset=utf-8"),
        )],
        buf,
    )
        .into_response()
}

pub async fn track_http_metrics(req: Request<Body>, next: Next) -> Response {
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str())
        .unwrap_or_else(|| req.uri().path())
        .to_owned();

    let Some(m) = metrics() else {
        return next.run(req).await;
    };
    if route == "/metrics" || route == "/healthz" {
        return next.run(req).await;
    }

    let start = Instant::now();

    m.http_in_flight_requests.inc();
    let response = next.run(req).await;
    m.http_in_flight_requests.dec();

    let status = response.status().as_u16().to_string();
    m.http_requests_total
        .with_label_values(&[&route, &status])
        .inc();
    m.http_request_duration_seconds
        .with_label_values(&[&route, &status])
        .observe(start.elapsed().as_secs_f64());

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent_and_records_alignment() -> anyhow::Result<()> {
        init()?;
        init()?;
        record_alignment(3, 2);
        let m = metrics().expect("metrics initialized");
        assert!(m.segments_aligned_total.get() >= 3);
        assert!(m.matches_total.get() >= 2);
        Ok(())
    }
}
