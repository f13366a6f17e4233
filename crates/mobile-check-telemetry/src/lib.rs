//! # Mobile Check Telemetry
//!
//! Structured logging and request counters for the Mobile Check service.
//!
//! ## Features
//!
//! - **Structured Logging**: human-readable or JSON output via `tracing-subscriber`
//! - **Request Metrics**: lock-free counters reported on the status endpoint

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
pub use metrics::{MetricsSnapshot, RequestMetrics, Timer};

/// Configuration for telemetry.
#[derive(Debug, Clone, Default)]
pub struct TelemetryConfig {
    /// Service name attached to the startup log line.
    pub service_name: String,
    /// Log level.
    pub log_level: String,
    /// Enable JSON logging.
    pub json_logs: bool,
}

impl TelemetryConfig {
    /// Creates a new telemetry configuration.
    #[must_use]
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }

    /// Sets the log level.
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Enables JSON logging.
    #[must_use]
    pub fn with_json_logs(mut self) -> Self {
        self.json_logs = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_telemetry_config() {
        let config = TelemetryConfig::new("mobile-check")
            .with_log_level("debug")
            .with_json_logs();

        assert_eq!(config.service_name, "mobile-check");
        assert_eq!(config.log_level, "debug");
        assert!(config.json_logs);
    }
}
