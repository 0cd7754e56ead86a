//! Observability Configuration

use std::env;

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format for development
    #[default]
    Pretty,
    /// JSON format for production/log aggregation
    Json,
    /// Compact single-line format
    Compact,
}

impl LogFormat {
    /// Parse a format name, falling back to [`LogFormat::Pretty`]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "json" => Self::Json,
            "compact" => Self::Compact,
            _ => Self::Pretty,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Log output format
    pub log_format: LogFormat,
    /// Log level filter (e.g., "info", "vestibule=debug,tower_http=info")
    pub log_filter: String,
    /// Include source file and line in records
    pub with_source_location: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::default(),
            log_filter: "info".to_string(),
            with_source_location: true,
        }
    }
}

impl ObservabilityConfig {
    /// Create configuration from environment variables.
    ///
    /// - `LOG_FORMAT`: "pretty", "json", or "compact" (default: "pretty")
    /// - `RUST_LOG`: log filter directive (default: "info")
    /// - `LOG_SOURCE_LOCATION`: "false" or "0" to omit file/line (default: on)
    pub fn from_env() -> Self {
        let log_format = env::var("LOG_FORMAT")
            .map(|v| LogFormat::from_name(&v))
            .unwrap_or_default();

        let log_filter = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let with_source_location = env::var("LOG_SOURCE_LOCATION")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        Self {
            log_format,
            log_filter,
            with_source_location,
        }
    }

    /// Create a new configuration builder
    pub fn builder() -> ObservabilityConfigBuilder {
        ObservabilityConfigBuilder::default()
    }
}

/// Builder for ObservabilityConfig
#[derive(Debug, Default)]
pub struct ObservabilityConfigBuilder {
    config: ObservabilityConfig,
}

impl ObservabilityConfigBuilder {
    /// Set the log format
    pub fn log_format(mut self, format: LogFormat) -> Self {
        self.config.log_format = format;
        self
    }

    /// Set the log filter
    pub fn log_filter(mut self, filter: impl Into<String>) -> Self {
        self.config.log_filter = filter.into();
        self
    }

    /// Include or omit source file and line
    pub fn with_source_location(mut self, enabled: bool) -> Self {
        self.config.with_source_location = enabled;
        self
    }

    /// Build the configuration
    pub fn build(self) -> ObservabilityConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ObservabilityConfig::default();
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.log_filter, "info");
        assert!(config.with_source_location);
    }

    #[test]
    fn test_log_format_names() {
        assert_eq!(LogFormat::from_name("json"), LogFormat::Json);
        assert_eq!(LogFormat::from_name(" COMPACT "), LogFormat::Compact);
        assert_eq!(LogFormat::from_name("pretty"), LogFormat::Pretty);
        assert_eq!(LogFormat::from_name("xml"), LogFormat::Pretty);
    }

    #[test]
    fn test_builder() {
        let config = ObservabilityConfig::builder()
            .log_format(LogFormat::Json)
            .log_filter("vestibule=debug")
            .with_source_location(false)
            .build();

        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.log_filter, "vestibule=debug");
        assert!(!config.with_source_location);
    }
}
