//! API Configuration Module
//!
//! Configuration is loaded from environment variables with defaults suited
//! to local development.

use std::net::SocketAddr;

use seisgate_core::{Credential, CredentialResolver};
use seisgate_storage::CacheConfig;

use crate::error::{ApiError, ApiResult};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_METRICS_BUFFER: usize = 1024;

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    // ========================================================================
    // Server
    // ========================================================================
    pub bind_host: String,

    /// Raw port value, validated by [`ApiConfig::bind_addr`].
    pub port: String,

    // ========================================================================
    // Compute cache
    // ========================================================================
    /// Cache budget in megabytes. Zero disables caching.
    pub cache_size_mb: u64,

    // ========================================================================
    // Storage accounts
    // ========================================================================
    /// Dataset prefixes the gateway may read from.
    pub storage_accounts: Vec<String>,

    /// Credentials used for a prefix when the caller supplies none.
    pub default_credentials: Vec<(String, Credential)>,

    // ========================================================================
    // CORS Configuration
    // ========================================================================
    /// Allowed CORS origins. Empty means allow all origins.
    pub cors_origins: Vec<String>,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,

    // ========================================================================
    // Metrics
    // ========================================================================
    pub metrics_enabled: bool,

    /// Capacity of the metrics side channel. Samples are dropped when full.
    pub metrics_buffer: usize,

    // ========================================================================
    // Demo dataset
    // ========================================================================
    /// Serve the built-in in-memory volume at this locator.
    pub demo_dataset: Option<String>,

    /// Credential granted read access to the demo volume.
    pub demo_credential: Option<Credential>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT.to_string(),
            cache_size_mb: 0,
            storage_accounts: Vec::new(),
            default_credentials: Vec::new(),
            cors_origins: Vec::new(),
            cors_max_age_secs: 86400,
            metrics_enabled: true,
            metrics_buffer: DEFAULT_METRICS_BUFFER,
            demo_dataset: None,
            demo_credential: None,
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `SEISGATE_API_BIND`: bind host (default: 0.0.0.0)
    /// - `PORT` or `SEISGATE_API_PORT`: bind port (default: 8080)
    /// - `SEISGATE_CACHE_SIZE_MB`: compute cache budget (default: 0, disabled)
    /// - `SEISGATE_STORAGE_ACCOUNTS`: comma-separated allowed dataset prefixes
    /// - `SEISGATE_DEFAULT_CREDENTIALS`: comma-separated `prefix=credential` pairs
    /// - `SEISGATE_CORS_ORIGINS`: comma-separated allowed origins (empty = allow all)
    /// - `SEISGATE_METRICS_ENABLED`: "true" or "false" (default: true)
    /// - `SEISGATE_METRICS_BUFFER`: metrics side-channel capacity (default: 1024)
    /// - `SEISGATE_DEMO_DATASET`: locator to serve the demo volume at
    /// - `SEISGATE_DEMO_CREDENTIAL`: credential allowed to read the demo volume
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let bind_host = lookup("SEISGATE_API_BIND").unwrap_or(defaults.bind_host);
        let port = lookup("PORT")
            .or_else(|| lookup("SEISGATE_API_PORT"))
            .unwrap_or(defaults.port);

        let cache_size_mb = lookup("SEISGATE_CACHE_SIZE_MB")
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.cache_size_mb);

        let storage_accounts = lookup("SEISGATE_STORAGE_ACCOUNTS")
            .map(|s| split_list(&s))
            .unwrap_or_default();

        let default_credentials = lookup("SEISGATE_DEFAULT_CREDENTIALS")
            .map(|s| parse_default_credentials(&s))
            .unwrap_or_default();

        let cors_origins = lookup("SEISGATE_CORS_ORIGINS")
            .map(|s| split_list(&s))
            .unwrap_or_default();

        let cors_max_age_secs = lookup("SEISGATE_CORS_MAX_AGE_SECS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.cors_max_age_secs);

        let metrics_enabled = lookup("SEISGATE_METRICS_ENABLED")
            .map(|s| s.to_lowercase() != "false" && s != "0")
            .unwrap_or(defaults.metrics_enabled);

        let metrics_buffer = lookup("SEISGATE_METRICS_BUFFER")
            .and_then(|s| s.parse().ok())
            .filter(|capacity: &usize| *capacity > 0)
            .unwrap_or(defaults.metrics_buffer);

        let demo_dataset = lookup("SEISGATE_DEMO_DATASET")
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty());

        let demo_credential = lookup("SEISGATE_DEMO_CREDENTIAL")
            .filter(|s| !s.is_empty())
            .map(Credential::new);

        Self {
            bind_host,
            port,
            cache_size_mb,
            storage_accounts,
            default_credentials,
            cors_origins,
            cors_max_age_secs,
            metrics_enabled,
            metrics_buffer,
            demo_dataset,
            demo_credential,
        }
    }

    /// Socket address to listen on.
    pub fn bind_addr(&self) -> ApiResult<SocketAddr> {
        let port = self.port.trim().parse::<u16>().map_err(|_| {
            ApiError::invalid_argument(format!("Invalid port value: {}", self.port))
        })?;

        let addr = format!("{}:{}", self.bind_host, port);
        addr.parse::<SocketAddr>().map_err(|e| {
            ApiError::invalid_argument(format!("Invalid bind address {}: {}", addr, e))
        })
    }

    /// Credential resolver for the configured storage accounts.
    pub fn resolver(&self) -> CredentialResolver {
        let resolver = self
            .storage_accounts
            .iter()
            .fold(CredentialResolver::new(), |resolver, prefix| resolver.allow(prefix.as_str()));
        self.default_credentials
            .iter()
            .fold(resolver, |resolver, (prefix, credential)| {
                resolver.with_default_credential(prefix.as_str(), credential.clone())
            })
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::new().with_megabytes(self.cache_size_mb)
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

/// Parse `prefix=credential` pairs. The credential is everything after the
/// first `=`, so tokens that themselves contain `=` survive intact.
/// Malformed pairs are skipped; their content is never logged.
fn parse_default_credentials(raw: &str) -> Vec<(String, Credential)> {
    raw.split(',')
        .filter_map(|pair| {
            let (prefix, credential) = pair.trim().split_once('=')?;
            let prefix = prefix.trim();
            if prefix.is_empty() || credential.is_empty() {
                tracing::warn!("Skipping malformed default credential entry");
                return None;
            }
            Some((prefix.to_string(), Credential::new(credential.to_string())))
        })
        .collect()
}
