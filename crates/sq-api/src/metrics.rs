//! Prometheus metrics for monitoring API performance and usage.

use std::{sync::LazyLock, time::Instant};

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use regex::Regex;

static UUID_SEGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
        .unwrap()
});
static NUMBER_SEGMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/\d+(/|$)").unwrap());

/// Initialize Prometheus metrics exporter
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let builder = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            &[
                0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ],
        )?
        .set_buckets_for_metric(
            Matcher::Full("quiz_score_ratio".to_string()),
            &[0.0, 0.25, 0.5, 0.75, 0.9, 1.0],
        )?;

    let handle = builder.install_recorder()?;

    Ok(handle)
}

/// Middleware to record HTTP request metrics
pub async fn track_metrics(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = normalize_path(req.uri().path());

    let in_flight = gauge!("http_requests_in_flight", "method" => method.clone(), "path" => path.clone());
    in_flight.increment(1.0);

    let response = next.run(req).await;

    in_flight.decrement(1.0);

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    counter!(
        "http_requests_total",
        "method" => method.clone(),
        "path" => path.clone(),
        "status" => status.clone()
    )
    .increment(1);

    histogram!(
        "http_request_duration_seconds",
        "method" => method,
        "path" => path,
        "status" => status
    )
    .record(duration);

    response
}

/// Normalize URL paths to reduce cardinality in metrics
///
/// UUIDs and numeric segments become `:id`.
fn normalize_path(path: &str) -> String {
    let normalized = UUID_SEGMENT.replace_all(path, ":id");
    NUMBER_SEGMENT
        .replace_all(&normalized, "/:id$1")
        .into_owned()
}

/// Handler for the /metrics endpoint
pub async fn metrics_handler(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    (StatusCode::OK, handle.render())
}

/// Record authentication events
pub fn record_auth_event(event_type: &str, success: bool) {
    let status = if success { "success" } else { "failure" };

    counter!(
        "auth_events_total",
        "type" => event_type.to_string(),
        "status" => status
    )
    .increment(1);
}

/// Record email sending events
pub fn record_email_event(email_type: &str, success: bool) {
    let status = if success { "success" } else { "failure" };

    counter!(
        "email_events_total",
        "type" => email_type.to_string(),
        "status" => status
    )
    .increment(1);
}

/// Record an access code redemption attempt
pub fn record_code_redemption(content_kind: &str, success: bool) {
    let status = if success { "success" } else { "rejected" };

    counter!(
        "code_redemptions_total",
        "kind" => content_kind.to_string(),
        "status" => status
    )
    .increment(1);
}

pub fn record_codes_generated(content_kind: &str, count: usize) {
    counter!("codes_generated_total", "kind" => content_kind.to_string()).increment(count as u64);
}

/// Record a graded quiz submission
pub fn record_quiz_submission(score: i32, total: i32) {
    counter!("quiz_submissions_total").increment(1);
    if total > 0 {
        histogram!("quiz_score_ratio").record(f64::from(score) / f64::from(total));
    }
}

pub fn record_puzzle_generated(placed: usize, skipped: usize) {
    counter!("puzzles_generated_total").increment(1);
    if skipped > 0 {
        counter!("puzzle_words_skipped_total").increment(skipped as u64);
    }
    histogram!("puzzle_words_placed").record(placed as f64);
}

pub fn record_job_run(job: &'static str, affected: u64) {
    counter!("background_job_runs_total", "job" => job).increment(1);
    counter!("background_job_rows_total", "job" => job).increment(affected);
}
