//! Metrics module
//!
//! Prometheus counters and histograms for uploads, listings and HTTP traffic.

pub mod server;

use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_histogram_vec, Counter, CounterVec,
    HistogramVec,
};

lazy_static! {
    // Upload metrics
    pub static ref UPLOADS_TOTAL: CounterVec = register_counter_vec!(
        "song_uploadr_uploads_total",
        "Total number of upload attempts by outcome",
        &["status"]
    ).unwrap();

    pub static ref UPLOAD_BYTES_TOTAL: Counter = register_counter!(
        "song_uploadr_upload_bytes_total",
        "Total bytes stored in the object store"
    ).unwrap();

    pub static ref UPLOAD_DURATION: HistogramVec = register_histogram_vec!(
        "song_uploadr_upload_duration_seconds",
        "Upload pipeline stage duration in seconds",
        &["stage"],
        vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0]
    ).unwrap();

    /// Objects left in storage after the record write failed
    pub static ref ORPHANED_OBJECTS_TOTAL: Counter = register_counter!(
        "song_uploadr_orphaned_objects_total",
        "Stored objects with no corresponding song record"
    ).unwrap();

    // Listing metrics
    pub static ref LISTINGS_TOTAL: CounterVec = register_counter_vec!(
        "song_uploadr_listings_total",
        "Song listing requests by outcome",
        &["status"]
    ).unwrap();

    // HTTP metrics
    pub static ref HTTP_RESPONSES_TOTAL: CounterVec = register_counter_vec!(
        "song_uploadr_http_responses_total",
        "HTTP responses by route and status code",
        &["route", "status"]
    ).unwrap();

    // Error metrics
    pub static ref ERRORS_TOTAL: CounterVec = register_counter_vec!(
        "song_uploadr_errors_total",
        "Total errors",
        &["type"]
    ).unwrap();
}

/// Record a successful upload
pub fn record_upload_success(bytes: u64) {
    UPLOADS_TOTAL.with_label_values(&["success"]).inc();
    UPLOAD_BYTES_TOTAL.inc_by(bytes as f64);
}

/// Record an upload rejected before anything was stored
pub fn record_upload_rejected() {
    UPLOADS_TOTAL.with_label_values(&["rejected"]).inc();
}

/// Record an upload that failed in storage or persistence
pub fn record_upload_failure() {
    UPLOADS_TOTAL.with_label_values(&["failure"]).inc();
}

/// Record how long a pipeline stage ("store", "persist", "total") took
pub fn record_upload_duration(stage: &str, duration_secs: f64) {
    UPLOAD_DURATION
        .with_label_values(&[stage])
        .observe(duration_secs);
}

/// Record a stored object whose record could not be written
pub fn record_orphaned_object() {
    ORPHANED_OBJECTS_TOTAL.inc();
}

/// Record a listing request
pub fn record_listing(success: bool) {
    let status = if success { "success" } else { "failure" };
    LISTINGS_TOTAL.with_label_values(&[status]).inc();
}

/// Record an HTTP response
pub fn record_http_response(route: &str, status: u16) {
    let status = status.to_string();
    HTTP_RESPONSES_TOTAL
        .with_label_values(&[route, status.as_str()])
        .inc();
}

/// Record an error
pub fn record_error(error_type: &str) {
    ERRORS_TOTAL.with_label_values(&[error_type]).inc();
}
