//! Tracing Subscriber Initialization
//!
//! One JSON line per event on stdout, filtered by `RUST_LOG` when set.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{ApiError, ApiResult};

const DEFAULT_FILTER: &str = "seisgate_api=debug,info";

/// Telemetry configuration from environment variables.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to the startup event
    pub service_name: String,
    /// Service version
    pub service_version: String,
    /// Environment (production, staging, development)
    pub environment: String,
    /// Filter directives used when `RUST_LOG` is unset
    pub default_filter: String,
    /// Emit JSON lines. Plain text otherwise.
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

impl TelemetryConfig {
    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            service_name: lookup("SEISGATE_SERVICE_NAME")
                .unwrap_or_else(|| "seisgate-api".to_string()),
            service_version: lookup("SEISGATE_SERVICE_VERSION")
                .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string()),
            environment: lookup("SEISGATE_ENVIRONMENT")
                .unwrap_or_else(|| "development".to_string()),
            default_filter: DEFAULT_FILTER.to_string(),
            json: lookup("SEISGATE_LOG_FORMAT")
                .map(|s| !s.eq_ignore_ascii_case("text"))
                .unwrap_or(true),
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.default_filter))
    }
}

/// Install the global tracing subscriber.
///
/// Must be called once at startup, before any event is emitted.
pub fn init_tracing(config: &TelemetryConfig) -> ApiResult<()> {
    let registry = tracing_subscriber::registry().with(config.filter());
    let result = if config.json {
        registry.with(tracing_subscriber::fmt::layer().json()).try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };
    result.map_err(|e| ApiError::internal_error(format!("Failed to init subscriber: {}", e)))?;

    tracing::info!(
        service_name = %config.service_name,
        service_version = %config.service_version,
        environment = %config.environment,
        "Telemetry initialized"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_telemetry_config_default() {
        let config = TelemetryConfig::from_lookup(|_| None);
        assert_eq!(config.service_name, "seisgate-api");
        assert_eq!(config.environment, "development");
        assert_eq!(config.default_filter, "seisgate_api=debug,info");
        assert!(config.json);
    }

    #[test]
    fn test_text_format_switch() {
        let config = TelemetryConfig::from_lookup(|key| {
            (key == "SEISGATE_LOG_FORMAT").then(|| "TEXT".to_string())
        });
        assert!(!config.json);
    }
}
