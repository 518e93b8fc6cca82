use lazy_static::lazy_static;
use prometheus::{Counter, Gauge, Histogram, register_counter, register_gauge, register_histogram};

lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("studyai_requests_total", "Total number of AI feature requests").unwrap();
    pub static ref REQUEST_LATENCY: Histogram = register_histogram!(
        "studyai_request_latency_seconds",
        "Upstream round trip latency in seconds"
    )
    .unwrap();
    pub static ref CACHE_HITS: Counter =
        register_counter!("studyai_cache_hits_total", "Total cache hits").unwrap();
    pub static ref CACHE_MISSES: Counter =
        register_counter!("studyai_cache_misses_total", "Total cache misses").unwrap();
    pub static ref CACHE_SIZE: Gauge =
        register_gauge!("studyai_cache_size", "Current number of items in cache").unwrap();

    // Admission control
    pub static ref ADMISSIONS_ALLOWED: Counter =
        register_counter!("studyai_admissions_allowed_total", "Requests admitted").unwrap();
    pub static ref ADMISSIONS_DENIED: Counter =
        register_counter!("studyai_admissions_denied_total", "Requests denied").unwrap();
    pub static ref LOCKOUTS_TOTAL: Counter = register_counter!(
        "studyai_lockouts_total",
        "Identities that exceeded their quota and were locked out"
    )
    .unwrap();
    pub static ref TRACKED_IDENTITIES: Gauge = register_gauge!(
        "studyai_tracked_identities",
        "Identities currently holding rate state"
    )
    .unwrap();
    pub static ref SWEPT_IDENTITIES: Counter = register_counter!(
        "studyai_swept_identities_total",
        "Idle rate state records evicted"
    )
    .unwrap();
}

// Default registry in the Prometheus text format
pub fn render() -> Result<String, prometheus::Error> {
    use prometheus::{Encoder, TextEncoder};

    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&prometheus::gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
