//! # Bridge Telemetry
//!
//! Logging and metrics for Token-Bridge.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bridge_telemetry::{TelemetryConfig, init_telemetry};
//!
//! let config = TelemetryConfig::for_subsystem("01", "token-connector");
//! init_telemetry(&config).expect("Failed to init telemetry");
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `TB_SERVICE_NAME` | `token-bridge` | Service name in logs |
//! | `TB_LOG_LEVEL` | `info` | Log level filter |
//! | `TB_JSON_LOGS` | `false` | JSON log output |
//! | `TB_SUBSYSTEM_ID` | `00` | Subsystem identifier |

#![warn(missing_docs)]

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    encode_metrics, register_metrics, CONNECTOR_ACKS_SENT, CONNECTOR_COMMANDS,
    CONNECTOR_EVENTS_RECEIVED, CONNECTOR_EVENTS_SKIPPED, CONNECTOR_FRAMES_DISCARDED,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// Subscriber could not be installed.
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    /// Metrics could not be registered or encoded.
    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Initialize logging and register metrics.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    // Metrics first: logging init fails if a subscriber already exists
    register_metrics()?;
    init_logging(config)
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}
