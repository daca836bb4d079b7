//! Client-side Prometheus metrics.
//!
//! Collectors live in a dedicated [`REGISTRY`] so an embedding application
//! can merge them into its own exporter; [`gather_text`] renders them in the
//! Prometheus text format.

use lazy_static::lazy_static;
use prometheus::Encoder;
use prometheus::HistogramOpts;
use prometheus::HistogramVec;
use prometheus::IntCounter;
use prometheus::IntCounterVec;
use prometheus::IntGauge;
use prometheus::Opts;
use prometheus::Registry;
use tracing::error;


lazy_static! {
    pub static ref REGISTRY: Registry = {
        let registry = Registry::new();
        register_custom_metrics(&registry);
        registry
    };

    pub static ref REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("etcd_client_requests_total", "Logical operations dispatched, by operation"),
        &["op"]
    )
    .expect("metric can not be created");

    pub static ref REQUEST_ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("etcd_client_request_errors_total", "Logical operations that returned an error, by error code"),
        &["code"]
    )
    .expect("metric can not be created");

    pub static ref REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new("etcd_client_request_duration_seconds", "Latency of logical operations, failover included")
            .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0]),
        &["op"]
    )
    .expect("metric can not be created");

    pub static ref FAILOVERS_TOTAL: IntCounter = IntCounter::new(
        "etcd_client_failovers_total",
        "Times the picked member was advanced after a transport failure"
    )
    .expect("metric can not be created");

    pub static ref CLUSTER_EXHAUSTED_TOTAL: IntCounter = IntCounter::new(
        "etcd_client_cluster_exhausted_total",
        "Operations that failed on every known member"
    )
    .expect("metric can not be created");

    pub static ref WATCH_EVENTS_TOTAL: IntCounter = IntCounter::new(
        "etcd_client_watch_events_total",
        "Watch events delivered to callbacks"
    )
    .expect("metric can not be created");

    pub static ref ACTIVE_WATCHERS: IntGauge = IntGauge::new(
        "etcd_client_active_watchers",
        "Watchers with an outstanding long-poll"
    )
    .expect("metric can not be created");
}

fn register_custom_metrics(registry: &Registry) {
    registry
        .register(Box::new(REQUESTS_TOTAL.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(REQUEST_ERRORS_TOTAL.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(REQUEST_DURATION_SECONDS.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(FAILOVERS_TOTAL.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(CLUSTER_EXHAUSTED_TOTAL.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(WATCH_EVENTS_TOTAL.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(ACTIVE_WATCHERS.clone()))
        .expect("collector can be registered");
}

/// Renders every client metric in the Prometheus text exposition format
pub fn gather_text() -> String {
    let encoder = prometheus::TextEncoder::new();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        error!("could not encode client metrics: {}", e);
    };
    match String::from_utf8(buffer) {
        Ok(v) => v,
        Err(e) => {
            error!("client metrics could not be from_utf8'd: {}", e);
            String::default()
        }
    }
}
