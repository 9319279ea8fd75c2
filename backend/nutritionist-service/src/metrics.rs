//! Prometheus metrics for nutritionist-service.
//!
//! Collectors are registered on the default registry and rendered by the
//! `/metrics` endpoint.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Encoder, Histogram,
    IntCounter, IntCounterVec, TextEncoder,
};

lazy_static! {
    /// Read requests segmented by endpoint and outcome (ok, client_error, server_error).
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "nutritionist_requests_total",
        "Nutritionist read requests segmented by endpoint and outcome",
        &["endpoint", "outcome"]
    )
    .expect("failed to register nutritionist_requests_total");

    /// Candidates ranked per top-rated request (bounded by the pool cap).
    pub static ref TOP_RATED_CANDIDATE_COUNT: Histogram = register_histogram!(
        "nutritionist_top_rated_candidates",
        "Number of candidates ranked per top-rated request",
        vec![0.0, 1.0, 5.0, 10.0, 20.0, 50.0]
    )
    .expect("failed to register nutritionist_top_rated_candidates");

    /// Directory pages served to anonymous viewers without a favorite query.
    pub static ref FAVORITE_LOOKUPS_SKIPPED_TOTAL: IntCounter = register_int_counter!(
        "nutritionist_favorite_lookups_skipped_total",
        "Directory pages answered without a favorite lookup (anonymous viewer)"
    )
    .expect("failed to register nutritionist_favorite_lookups_skipped_total");
}

/// Count a finished request under its endpoint label.
pub fn record_request<T>(endpoint: &str, result: &crate::error::Result<T>) {
    use actix_web::ResponseError;

    let outcome = match result {
        Ok(_) => "ok",
        Err(e) if e.status_code().is_client_error() => "client_error",
        Err(_) => "server_error",
    };
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[endpoint, outcome])
        .inc();
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
