use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, Encoder, IntCounter,
    IntCounterVec, IntGauge, TextEncoder,
};
use std::sync::LazyLock;

pub static CALLBACKS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "payrelay_callbacks_total",
        "Payment callbacks by result",
        &["result"]
    )
    .unwrap()
});

pub static STATUS_PUSHES: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "payrelay_status_pushes_total",
        "Status pushes to client channels by outcome",
        &["outcome"]
    )
    .unwrap()
});

pub static STATUS_QUERIES: LazyLock<IntCounter> = LazyLock::new(|| {
    register_int_counter!(
        "payrelay_status_queries_total",
        "Payment status polling requests"
    )
    .unwrap()
});

pub static LIVE_CHANNELS: LazyLock<IntGauge> = LazyLock::new(|| {
    register_int_gauge!(
        "payrelay_live_channels",
        "Currently connected WebSocket clients"
    )
    .unwrap()
});

pub fn metrics_output() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
