//! Prometheus metrics for Token-Bridge.
//!
//! All metrics follow the naming convention: `tb_<subsystem>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{Counter, CounterVec, Encoder, Opts, Registry, TextEncoder};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // EVENT CHANNEL METRICS
    // =========================================================================

    /// Events received on the event channel
    pub static ref CONNECTOR_EVENTS_RECEIVED: CounterVec = CounterVec::new(
        Opts::new("tb_connector_events_received_total", "Events received from the token connector"),
        &["kind"]
    ).expect("metric creation failed");

    /// Events dropped because required data was missing or invalid
    pub static ref CONNECTOR_EVENTS_SKIPPED: CounterVec = CounterVec::new(
        Opts::new("tb_connector_events_skipped_total", "Events dropped as incomplete"),
        &["kind"]
    ).expect("metric creation failed");

    /// Frames that could not be parsed at all
    pub static ref CONNECTOR_FRAMES_DISCARDED: Counter = Counter::new(
        "tb_connector_frames_discarded_total",
        "Inbound frames discarded as unparseable"
    ).expect("metric creation failed");

    /// Acknowledgements sent
    pub static ref CONNECTOR_ACKS_SENT: Counter = Counter::new(
        "tb_connector_acks_sent_total",
        "Acknowledgements sent to the token connector"
    ).expect("metric creation failed");

    // =========================================================================
    // COMMAND METRICS
    // =========================================================================

    /// Commands issued, by operation and outcome
    pub static ref CONNECTOR_COMMANDS: CounterVec = CounterVec::new(
        Opts::new("tb_connector_commands_total", "Commands issued to the token connector"),
        &["operation", "outcome"]  // outcome: complete/pending/accepted/failed
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(CONNECTOR_EVENTS_RECEIVED.clone()),
        Box::new(CONNECTOR_EVENTS_SKIPPED.clone()),
        Box::new(CONNECTOR_FRAMES_DISCARDED.clone()),
        Box::new(CONNECTOR_ACKS_SENT.clone()),
        Box::new(CONNECTOR_COMMANDS.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_metrics() {
        // May fail if already registered by another test, which is fine
        let _ = register_metrics();
    }

    #[test]
    fn test_counter_increment() {
        CONNECTOR_ACKS_SENT.inc();
        assert!(CONNECTOR_ACKS_SENT.get() >= 1.0);
    }

    #[test]
    fn test_labelled_counter() {
        CONNECTOR_EVENTS_RECEIVED
            .with_label_values(&["token-pool"])
            .inc();
        assert!(
            CONNECTOR_EVENTS_RECEIVED
                .with_label_values(&["token-pool"])
                .get()
                >= 1.0
        );
    }

    #[test]
    fn test_encode_after_register() {
        let _ = register_metrics();
        CONNECTOR_FRAMES_DISCARDED.inc();
        let text = encode_metrics().unwrap();
        assert!(text.contains("tb_connector_frames_discarded_total"));
    }
}
