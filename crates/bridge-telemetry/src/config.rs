//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for logging and metrics.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to log lines
    pub service_name: String,

    /// Subsystem identifier (01 = token connector)
    pub subsystem_id: String,

    /// Log level filter (trace, debug, info, warn, error)
    pub log_level: String,

    /// Whether to enable console output (for development)
    pub console_output: bool,

    /// Whether to enable JSON formatted logs
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "token-bridge".to_string(),
            subsystem_id: "00".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `TB_SERVICE_NAME`: Service name (default: token-bridge)
    /// - `TB_SUBSYSTEM_ID`: Subsystem ID (default: 00)
    /// - `TB_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `TB_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `TB_JSON_LOGS`: Enable JSON logs (default: false in dev, true in containers)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("TB_SERVICE_NAME")
                .unwrap_or_else(|_| "token-bridge".to_string()),

            subsystem_id: env::var("TB_SUBSYSTEM_ID").unwrap_or_else(|_| "00".to_string()),

            log_level: env::var("TB_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            console_output: env::var("TB_CONSOLE_OUTPUT")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),

            json_logs: env::var("TB_JSON_LOGS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(is_container),
        }
    }

    /// Create configuration for a specific subsystem.
    pub fn for_subsystem(subsystem_id: &str, subsystem_name: &str) -> Self {
        let mut config = Self::from_env();
        config.subsystem_id = subsystem_id.to_string();
        config.service_name = format!("tb-{}-{}", subsystem_id, subsystem_name);
        config
    }

    /// Get the full service name including subsystem.
    pub fn full_service_name(&self) -> String {
        if self.subsystem_id == "00" {
            self.service_name.clone()
        } else {
            format!("{}-{}", self.service_name, self.subsystem_id)
        }
    }
}
