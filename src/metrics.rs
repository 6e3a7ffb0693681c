//! Prometheus metrics for user-removal cascade cleanup
//!
//! Tracks cleanup runs, deleted record counts per table, and duration.

use once_cell::sync::Lazy;
use prometheus::{
    register_histogram, register_int_counter_vec, Histogram, IntCounterVec,
};
use std::time::Duration;

static CASCADE_RUNS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "cascade_cleaner_runs_total",
        "Total number of user-removal cascade runs (success/error)",
        &["status"]
    )
    .expect("failed to register cascade_cleaner_runs_total")
});

static CASCADE_DELETED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "cascade_cleaner_deleted_total",
        "Total records deleted by the cascade cleaner, per record type",
        &["record_type"]
    )
    .expect("failed to register cascade_cleaner_deleted_total")
});

static CASCADE_DURATION_SECONDS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "cascade_cleaner_duration_seconds",
        "Duration of user-removal cascade transactions",
        vec![0.001, 0.01, 0.1, 0.5, 1.0, 5.0, 10.0]
    )
    .expect("failed to register cascade_cleaner_duration_seconds")
});

pub fn record_cascade_run(status: &str) {
    CASCADE_RUNS_TOTAL.with_label_values(&[status]).inc();
}

pub fn record_cascade_deleted(record_type: &str, count: u64) {
    CASCADE_DELETED_TOTAL
        .with_label_values(&[record_type])
        .inc_by(count);
}

pub fn record_cascade_duration(duration: Duration) {
    CASCADE_DURATION_SECONDS.observe(duration.as_secs_f64());
}
