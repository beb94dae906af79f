use lazy_static::lazy_static;
use prometheus::{
    register_int_counter_vec_with_registry, register_int_gauge_with_registry, Encoder,
    IntCounterVec, IntGauge, Registry, TextEncoder,
};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref PASSES_TOTAL: IntCounterVec = register_int_counter_vec_with_registry!(
        "fleetalerts_passes_total",
        "Evaluation passes by outcome (ok, partial, failed).",
        &["outcome"],
        REGISTRY
    )
    .expect("metric can be registered");
    pub static ref SOURCE_FAILURES_TOTAL: IntCounterVec = register_int_counter_vec_with_registry!(
        "fleetalerts_source_failures_total",
        "Snapshot fetches that failed or timed out, by source.",
        &["source"],
        REGISTRY
    )
    .expect("metric can be registered");
    pub static ref PUBLISHED_ALERTS: IntGauge = register_int_gauge_with_registry!(
        "fleetalerts_published_alerts",
        "Alerts in the last published list.",
        REGISTRY
    )
    .expect("metric can be registered");
}

// Function to gather metrics for exposition
pub fn gather_metrics() -> String {
    let mut buffer = vec![];
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gather_includes_registered_metrics() {
        PASSES_TOTAL.with_label_values(&["ok"]).inc();
        SOURCE_FAILURES_TOTAL.with_label_values(&["drivers"]).inc();
        PUBLISHED_ALERTS.set(3);

        let text = gather_metrics();
        assert!(text.contains("fleetalerts_passes_total"));
        assert!(text.contains("fleetalerts_source_failures_total"));
        assert!(text.contains("fleetalerts_published_alerts"));
    }
}
