use lazy_static::lazy_static;
use prometheus::{register_int_counter_vec_with_registry, Encoder, IntCounterVec, Registry, TextEncoder};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref MANAGEMENT_CALLS_TOTAL: IntCounterVec = register_int_counter_vec_with_registry!(
        "process_management_calls_total",
        "Management attribute reads and operation invocations, by member and outcome.",
        &["member", "outcome"],
        REGISTRY
    )
    .expect("Failed to register process_management_calls_total");
}

pub fn record_invocation(member: &str, outcome: &str) {
    MANAGEMENT_CALLS_TOTAL
        .with_label_values(&[member, outcome])
        .inc();
}

/// Text exposition of everything in [`REGISTRY`].
pub fn gather_metrics() -> crate::Result<String> {
    let mut buffer = vec![];
    let encoder = TextEncoder::new();
    encoder
        .encode(&REGISTRY.gather(), &mut buffer)
        .map_err(|e| crate::Error::Internal(format!("Failed to encode metrics: {}", e)))?;
    String::from_utf8(buffer)
        .map_err(|e| crate::Error::Internal(format!("Metrics are not UTF-8: {}", e)))
}
